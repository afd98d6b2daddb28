//! Offline rendering of drum note sequences to WAV files.

pub mod config;
pub use config::*;

mod sequence;
pub use sequence::*;

mod rendered;
pub use rendered::*;

pub mod builder;
pub use builder::*;

mod writer;
