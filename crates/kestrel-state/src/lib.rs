//! Kestrel Browser State
//!
//! A single immutable-snapshot state tree mutated only by dispatching
//! [`BrowserAction`]s through a [`Store`]. Middleware observe every action
//! before and after it reaches the reducer.

mod action;
mod error;
mod reducer;
mod state;
mod store;
mod tab;

pub use action::{
    BrowserAction, ContentAction, CustomTabListAction, DownloadAction, EngineAction,
    TabListAction,
};
pub use error::StateError;
pub use reducer::reduce;
pub use state::{BrowserState, DownloadState};
pub use store::{Middleware, MiddlewareContext, Next, Store};
pub use tab::{create_tab, ContentState, EngineState, LoadRequestState, SessionState};

pub type Result<T> = std::result::Result<T, StateError>;
