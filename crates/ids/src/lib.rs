//! Identifier generation for console entities.
//!
//! Every stored entity receives an opaque string identifier made of a collection prefix and a
//! distinguishing value:
//!
//! - [`UuidIdGenerator`]: `<prefix>-<32 lowercase hex>` (random v4 UUID, simple form)
//! - [`TimestampIdGenerator`]: `<prefix>-<YYYYMMDDTHHMMSS.mmmZ>`, strictly increasing per
//!   generator
//! - [`CounterIdGenerator`]: `<prefix>-<n>`, counting from 1
//!
//! Identifiers are unique within one process. They are not guaranteed to be unique across
//! processes (except the UUID form, in practice) and callers must not parse them.
//!
//! The strategy is chosen at startup through [`IdStrategy`].

mod generator;

pub use generator::{
    CounterIdGenerator, IdGenerator, IdStrategy, TimestampIdGenerator, UuidIdGenerator,
};

/// Error type for identifier configuration.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier configuration.
pub type IdResult<T> = Result<T, IdError>;
