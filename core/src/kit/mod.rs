//! The instrument data model of a drum kit and the loading of kits from
//! sample files.
//!
//! A kit maps MIDI notes to instruments. Each instrument holds velocity
//! layers, each layer holds round-robin variations, and each variation holds
//! one recording per microphone.

mod audio;
pub use audio::*;

mod config;
pub use config::*;

mod instrument;
pub use instrument::*;

mod loader;
pub use loader::*;

mod sample;
pub use sample::*;
