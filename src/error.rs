//! Error type for the weft umbrella crate.
//!
//! Wraps core errors so `?` propagates across the crate boundary.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] weft_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
