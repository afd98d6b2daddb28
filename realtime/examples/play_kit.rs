use std::{env, thread, time::Duration};

use drumkit_core::kit::{load_kit, KitDescriptor, SampleDescriptor};
use drumkit_realtime::{RealtimeConfig, RealtimeDrumSynth};

/// Plays a short pattern on a kit given as `note=path` arguments, e.g.
/// `cargo run --example play_kit -- 36=kick.wav 38=snare.wav 42=hat.wav`.
fn main() {
    let samples: Vec<_> = env::args()
        .skip(1)
        .filter_map(|arg| {
            let (note, path) = arg.split_once('=')?;
            Some(SampleDescriptor::new(path, note.parse().ok()?, 0, 0, "main"))
        })
        .collect();
    let notes: Vec<u8> = samples.iter().map(|s| s.note).collect();
    if notes.is_empty() {
        println!("Usage: play_kit <note>=<path> ...");
        return;
    }
    let descriptor = KitDescriptor::new(samples);

    let config = RealtimeConfig::default();
    let synth = RealtimeDrumSynth::open_with_default_output(config, |params| {
        load_kit(&descriptor, params, Default::default()).map(|kit| kit.synth)
    })
    .unwrap();

    let sender = synth.get_sender();
    for step in 0..32 {
        let note = notes[step % notes.len()];
        let velocity = if step % 4 == 0 { 1.0 } else { 0.6 };
        sender.note_on(10, note, velocity);
        thread::sleep(Duration::from_millis(150));
    }

    let stats = synth.get_stats();
    println!(
        "Active voices: {}, dropped events: {}",
        stats.active_voices(),
        stats.dropped_events()
    );
    thread::sleep(Duration::from_secs(1));
}
