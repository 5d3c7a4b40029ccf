#![doc = include_str!("../README.md")]

mod action;
mod callback;
mod consumer;
mod engine;
mod error;
mod producer;
mod stream;

pub use crate::action::*;
pub use crate::callback::*;
pub use crate::consumer::*;
pub use crate::engine::*;
pub use crate::error::*;
pub use crate::producer::*;
pub use crate::stream::Stream;

/// Re-exported so callers can build and cancel the token every worker and
/// callback observes without depending on `tokio-util` directly.
pub use tokio_util::sync::CancellationToken;
