//! A layered multi-microphone drum sample engine.
//!
//! Samples are organised by MIDI note into velocity layers, round-robin
//! variations and microphone channels. A note-on blends the two nearest
//! velocity layers, rotates through their variations, silences the notes
//! of its choke group and restarts the voices of every microphone.

pub mod effects;

pub mod helpers;

pub mod kit;

pub mod params;

pub mod synth;

pub mod voice;

mod audio_pipe;
pub use audio_pipe::*;

mod audio_stream;
pub use audio_stream::*;
