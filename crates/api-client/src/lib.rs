//! HTTP and WebSocket access to the pipeline backend.
//!
//! [`ApiClient`] wraps the REST endpoints. The pollers in [`poll`] and the
//! live connection in [`live`] run as tokio tasks owned by their handles.

pub mod client;
pub mod error;
pub mod live;
pub mod poll;

pub use client::ApiClient;
pub use error::ApiError;
pub use live::{
    ConnectionStatus, LiveError, LiveHandle, LiveOptions, LiveState, LiveTransport, LiveUpdate,
    TungsteniteTransport,
};
pub use poll::{
    ListPollOptions, SessionDetailHandle, SessionDetailState, SessionFetcher, SessionListHandle,
    SessionListState,
};
