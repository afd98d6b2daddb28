//! Real-time playback of a `drumkit-core` kit through cpal.

mod config;
pub use config::*;

mod realtime_synth;
pub use realtime_synth::*;

mod event_senders;
pub use event_senders::*;

pub use drumkit_core::synth::KitEvent;
