//! Dispatch module: subscriber fan-out and message rendering

pub mod dispatcher;
pub mod formatter;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use formatter::{render, RenderedMessage};
