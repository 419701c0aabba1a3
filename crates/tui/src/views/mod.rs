pub mod badge;
pub mod button;
pub mod help;
pub mod history;
pub mod live;
pub mod modal;
pub mod start_modal;
pub mod timeline;
