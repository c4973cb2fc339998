//! Text encoding conversion.

pub mod transcoder;
