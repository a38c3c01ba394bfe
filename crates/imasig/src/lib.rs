//! Apply IMA signature labels to installed files.
//!
//! See [`ima`] for the pipeline and its failure semantics.

pub mod error;
pub mod ima;

pub use error::{ImasigError, Result};
