//! Centralized error type for the warble umbrella crate.
//!
//! Wraps the DSP crates' error so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] warble_core::Error),

    #[error("Engine: {0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, Error>;
