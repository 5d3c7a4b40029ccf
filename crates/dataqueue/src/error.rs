//! Error types for the producer/consumer engine.
//!
//! Every error is a construction-time validation failure, surfaced to the
//! caller of the constructor or entry point that detected it. Nothing that
//! happens while the pipeline runs (stop signals, cancellation) is an error.
//!
//! ## Error Cases
//! - `InvalidCallback`: a pool was built without its callback.
//! - `InvalidWorkerCount`: a pool was asked to run zero workers.
//! - `InvalidProducer`: the producer pool handed to the engine cannot run.
//! - `InvalidConsumer`: the consumer pool handed to the engine cannot run.

use core::fmt;

/// A result type whose error defaults to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The side of the pipeline a worker pool belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Workers invoking the producer callback and writing the stream.
    Producer,
    /// Workers reading the stream and invoking the consumer callback.
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => f.write_str("producer"),
            Role::Consumer => f.write_str("consumer"),
        }
    }
}

/// All errors the engine can report.
#[derive(Clone, Copy, thiserror::Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The producer or consumer callback was absent.
    #[error("Invalid callback")]
    InvalidCallback,

    /// A pool needs at least one worker.
    #[error("Invalid worker count: the {role} pool needs at least one worker")]
    InvalidWorkerCount { role: Role },

    /// The producer pool could not be built or was already started.
    #[error("Invalid producer")]
    InvalidProducer,

    /// The consumer pool could not be built, was already started, or reads a
    /// stream the producer pool does not own.
    #[error("Invalid consumer")]
    InvalidConsumer,
}
