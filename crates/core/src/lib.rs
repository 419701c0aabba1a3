pub mod category;
pub mod classify;
pub mod config;
pub mod detail;
pub mod format;
pub mod frame;
pub mod links;
pub mod pipeline;
pub mod selection;
pub mod start_form;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use classify::{ColorClass, EventRenderModel, classify, classify_event, is_minor_event, should_hide_event};
pub use config::{Features, Labels, LinkBuilders, PipelineUiConfig, UrlBuilder, UrlFn, url_template};
pub use pipeline::*;
