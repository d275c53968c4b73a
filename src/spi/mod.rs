//! The SPI engine: gamma fitting and the probability-to-normal-score transform.

pub mod error;
pub mod fit;
pub mod transform;
