use super::*;
use crate::{
    kit::SampleAsset,
    params::MicrophoneControls,
    voice::{EnvelopeDescriptor, EnvelopeStage},
    ChannelCount,
};

const RATE: u32 = 1000;

fn synth() -> DrumSynth {
    synth_with(KitInitOptions::default())
}

fn synth_with(options: KitInitOptions) -> DrumSynth {
    DrumSynth::new(AudioStreamParams::new(RATE, ChannelCount::Stereo), options)
}

/// A mono sample holding `value` for `frames` frames.
fn constant(note: u8, value: f32, frames: usize) -> SampleAsset {
    SampleAsset::from_vecs(format!("{note}-{value}"), vec![vec![value; frames]], RATE, note)
        .unwrap()
}

fn register(
    synth: &mut DrumSynth,
    note: u8,
    layer: usize,
    variation: usize,
    mic: &str,
    value: f32,
) -> VoiceId {
    synth
        .register_sample(
            SampleRegistration::new(constant(note, value, 64), mic)
                .velocity_index(layer)
                .variation_index(variation),
        )
        .unwrap()
}

fn is_active(synth: &DrumSynth, voice: VoiceId) -> bool {
    synth.voice(voice).unwrap().is_active()
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

fn render(synth: &mut DrumSynth, frames: usize) -> Vec<f32> {
    let mut out = vec![0.0; frames * 2];
    synth.read_samples(&mut out);
    out
}

#[test]
fn test_attack_scenario() {
    // 0.256s at 1000Hz gives a 256 sample attack
    let mut synth = synth_with(KitInitOptions {
        envelope: EnvelopeDescriptor {
            attack: 0.256,
            ..Default::default()
        },
        ..Default::default()
    });
    synth
        .register_sample(SampleRegistration::new(constant(42, 1.0, 1024), "close"))
        .unwrap();

    synth.note_on(1, 42, 1.0);
    let mut out = vec![0.0; 512 * 2];
    synth.render_next_block(&mut out, 0, 512);

    for i in 0..512 {
        let expected = if i < 256 { i as f32 / 256.0 } else { 1.0 };
        assert!(close(out[i * 2], expected), "frame {i}");
        assert!(close(out[i * 2 + 1], expected), "frame {i}");
    }
}

#[test]
fn test_unknown_note_is_ignored() {
    let mut synth = synth();
    register(&mut synth, 36, 0, 0, "kick", 1.0);
    synth.note_on(1, 37, 1.0);
    assert_eq!(synth.active_voice_count(), 0);
    assert!(render(&mut synth, 16).iter().all(|s| *s == 0.0));
}

#[test]
fn test_zero_velocity_plays_lowest_layer_only() {
    let mut synth = synth();
    let soft = register(&mut synth, 38, 0, 0, "snare", 0.25);
    let hard = register(&mut synth, 38, 1, 0, "snare", 1.0);

    synth.note_on(1, 38, 0.0);
    assert!(is_active(&synth, soft));
    assert!(!is_active(&synth, hard));
    assert_eq!(synth.voice(soft).unwrap().velocity_gain(), 1.0);
}

#[test]
fn test_velocity_blend_between_layers() {
    let mut synth = synth();
    let soft = register(&mut synth, 38, 0, 0, "snare", 0.25);
    let hard = register(&mut synth, 38, 1, 0, "snare", 1.0);

    synth.note_on(1, 38, 0.5);
    let perceived = 0.5f32.cbrt();
    assert!(close(synth.voice(soft).unwrap().velocity_gain(), perceived));
    assert!(close(synth.voice(hard).unwrap().velocity_gain(), perceived));

    let out = render(&mut synth, 1);
    assert!(close(out[0], (0.25 + 1.0) * perceived));
}

#[test]
fn test_full_velocity_plays_top_layer_only() {
    let mut synth = synth();
    let soft = register(&mut synth, 38, 0, 0, "snare", 0.25);
    let hard = register(&mut synth, 38, 1, 0, "snare", 1.0);

    synth.note_on(1, 38, 1.0);
    assert!(!is_active(&synth, soft));
    assert!(is_active(&synth, hard));
}

#[test]
fn test_round_robin_visits_every_variation() {
    let mut synth = synth();
    let voices: Vec<_> = (0..3)
        .map(|v| register(&mut synth, 40, 0, v, "snare", 0.1 * (v + 1) as f32))
        .collect();

    let mut order = vec![];
    for _ in 0..6 {
        synth.all_notes_killed();
        synth.note_on(1, 40, 0.0);
        let playing: Vec<_> = voices.iter().filter(|v| is_active(&synth, **v)).collect();
        assert_eq!(playing.len(), 1);
        order.push(playing[0].0);
    }
    assert_eq!(order, vec![0, 1, 2, 0, 1, 2]);
}

#[test]
fn test_blended_layers_rotate_independently() {
    let mut synth = synth();
    for v in 0..2 {
        register(&mut synth, 40, 0, v, "snare", 0.25);
    }
    for v in 0..3 {
        register(&mut synth, 40, 1, v, "snare", 1.0);
    }

    let mut seen = vec![];
    for _ in 0..6 {
        synth.all_notes_killed();
        synth.note_on(1, 40, 0.5);
        let playing: Vec<usize> = (0..synth.voice_count())
            .filter(|v| is_active(&synth, VoiceId(*v)))
            .collect();
        seen.push(playing);
    }
    assert_eq!(
        seen,
        vec![
            vec![0, 2],
            vec![1, 3],
            vec![0, 4],
            vec![1, 2],
            vec![0, 3],
            vec![1, 4]
        ]
    );
}

#[test]
fn test_consecutive_hits_differ_between_variations() {
    let mut synth = synth();
    register(&mut synth, 40, 0, 0, "snare", 0.2);
    register(&mut synth, 40, 0, 1, "snare", 0.6);

    synth.note_on(1, 40, 0.0);
    let first = render(&mut synth, 4);
    synth.all_notes_killed();
    synth.note_on(1, 40, 0.0);
    let second = render(&mut synth, 4);

    assert!(close(first[0], 0.2));
    assert!(close(second[0], 0.6));
}

#[test]
fn test_retrigger_restarts_voice() {
    let mut synth = synth();
    let voice = register(&mut synth, 36, 0, 0, "kick", 1.0);

    synth.note_on(1, 36, 1.0);
    render(&mut synth, 10);
    assert_eq!(synth.voice(voice).unwrap().position(), 10.0);

    synth.note_on(1, 36, 1.0);
    assert_eq!(synth.voice(voice).unwrap().position(), 0.0);
    assert!(is_active(&synth, voice));
}

#[test]
fn test_choke_silences_target_before_start() {
    let mut synth = synth();
    let open = register(&mut synth, 46, 0, 0, "hats", 0.5);
    let closed = synth
        .register_sample(
            SampleRegistration::new(constant(42, 1.0, 64), "hats").choke_targets(&[46]),
        )
        .unwrap();

    synth.note_on(10, 46, 1.0);
    render(&mut synth, 4);
    assert!(is_active(&synth, open));

    synth.note_on(10, 42, 1.0);
    assert!(!is_active(&synth, open));
    assert_eq!(
        synth.voice(open).unwrap().envelope_stage(),
        EnvelopeStage::Idle
    );
    assert!(is_active(&synth, closed));

    // Only the closed hat is heard on the next frame
    let out = render(&mut synth, 1);
    assert!(close(out[0], 1.0));
}

#[test]
fn test_choke_only_matches_same_channel() {
    let mut synth = synth();
    let open = register(&mut synth, 46, 0, 0, "hats", 0.5);
    synth
        .register_sample(
            SampleRegistration::new(constant(42, 1.0, 64), "hats").choke_targets(&[46]),
        )
        .unwrap();

    synth.note_on(10, 46, 1.0);
    synth.note_on(11, 42, 1.0);
    assert!(is_active(&synth, open));
}

#[test]
fn test_latest_registration_replaces_choke_list() {
    let mut synth = synth();
    synth
        .register_sample(SampleRegistration::new(constant(42, 1.0, 8), "hats").choke_targets(&[46]))
        .unwrap();
    synth
        .register_sample(
            SampleRegistration::new(constant(42, 1.0, 8), "hats")
                .variation_index(1)
                .choke_targets(&[44]),
        )
        .unwrap();
    assert_eq!(synth.instrument(42).unwrap().choke_targets(), &[44]);
}

#[test]
fn test_sparse_registration_and_empty_layers() {
    let mut synth = synth();
    // Layer 0 never gets a sample
    let hard = register(&mut synth, 45, 1, 2, "tom", 1.0);

    let instrument = synth.instrument(45).unwrap();
    assert_eq!(instrument.layer_count(), 2);
    assert_eq!(instrument.velocity_layers()[1].variation_count(), 3);

    // The empty layer is skipped silently
    synth.note_on(1, 45, 0.0);
    assert_eq!(synth.active_voice_count(), 0);

    // Empty variation slots rotate like any other
    synth.note_on(1, 45, 1.0);
    synth.note_on(1, 45, 1.0);
    assert!(!is_active(&synth, hard));
    synth.note_on(1, 45, 1.0);
    assert!(is_active(&synth, hard));
}

#[test]
fn test_registration_errors() {
    let mut synth = synth();

    let err = synth
        .register_sample(SampleRegistration {
            note: 38,
            ..SampleRegistration::new(constant(36, 1.0, 8), "kick")
        })
        .unwrap_err();
    assert!(matches!(err, RegisterError::NoteMismatch { note: 38, sample_note: 36, .. }));

    let wrong_rate = SampleAsset::from_vecs("wrong", vec![vec![1.0; 8]], 44100, 36).unwrap();
    let err = synth
        .register_sample(SampleRegistration::new(wrong_rate, "kick"))
        .unwrap_err();
    assert!(matches!(err, RegisterError::SampleRateMismatch { sample_rate: 44100, .. }));

    let err = synth
        .register_sample(SampleRegistration::new(constant(36, 1.0, 8), "kick").velocity_index(500))
        .unwrap_err();
    assert!(matches!(err, RegisterError::LayerIndexOutOfRange { index: 500, .. }));

    let err = synth
        .register_sample(
            SampleRegistration::new(constant(36, 1.0, 8), "kick").choke_targets(&[200]),
        )
        .unwrap_err();
    assert_eq!(err, RegisterError::ChokeTargetOutOfRange { note: 36, target: 200 });

    // Failed registrations leave nothing behind
    assert_eq!(synth.voice_count(), 0);
    assert_eq!(synth.bus_count(), 0);
    assert!(synth.midi_notes().is_empty());
}

#[test]
fn test_microphones_get_their_own_buses() {
    let mut synth = synth();
    register(&mut synth, 36, 0, 0, "kick_in", 0.5);
    register(&mut synth, 36, 0, 0, "overhead", 0.25);
    register(&mut synth, 38, 0, 0, "overhead", 0.125);

    assert_eq!(synth.bus_count(), 2);
    assert_eq!(synth.microphones(), &["kick_in".to_owned(), "overhead".to_owned()]);
    assert_eq!(synth.bus_index("overhead"), Some(1));
    assert_eq!(synth.bus_index("snare_top"), None);
    assert_eq!(synth.midi_notes(), vec![36, 38]);

    synth.note_on(1, 36, 1.0);
    synth.note_on(1, 38, 1.0);

    let mut buses = vec![vec![0.0; 8], vec![]];
    synth.render_buses(&mut buses);
    assert_eq!(buses[1].len(), 8);
    assert!(close(buses[0][0], 0.5));
    assert!(close(buses[1][0], 0.375));

    let summed = render(&mut synth, 4);
    assert!(close(summed[0], 0.875));
}

#[test]
fn test_note_on_microphone_starts_one_bus() {
    let mut synth = synth();
    let close_mic = register(&mut synth, 36, 0, 0, "kick_in", 0.5);
    let room = register(&mut synth, 36, 0, 0, "room", 0.25);

    synth.note_on_microphone(1, 36, 1.0, "room");
    assert!(!is_active(&synth, close_mic));
    assert!(is_active(&synth, room));

    synth.note_on_microphone(1, 36, 1.0, "nonexistent");
    assert_eq!(synth.active_voice_count(), 1);

    synth.send_event(KitEvent::NoteOnMicrophone {
        channel: 1,
        note: 36,
        velocity: 1.0,
        bus: 0,
    });
    assert!(is_active(&synth, close_mic));
}

#[test]
fn test_events() {
    let mut synth = synth();
    let kick = register(&mut synth, 36, 0, 0, "kick", 1.0);

    synth.send_event(KitEvent::NoteOn {
        channel: 1,
        note: 36,
        velocity: 1.0,
    });
    assert!(is_active(&synth, kick));

    synth.send_event(KitEvent::NoteOff { channel: 1, note: 36 });
    assert!(is_active(&synth, kick));

    synth.send_event(KitEvent::AllNotesKilled);
    assert!(!is_active(&synth, kick));
}

#[test]
fn test_midi_channel_mask_filters_triggers() {
    let mut synth = synth();
    let voice = synth
        .register_sample(SampleRegistration::new(
            constant(36, 1.0, 8).with_midi_channels(&[10]),
            "kick",
        ))
        .unwrap();

    synth.note_on(1, 36, 1.0);
    assert!(!is_active(&synth, voice));
    synth.note_on(10, 36, 1.0);
    assert!(is_active(&synth, voice));
}

#[test]
fn test_render_with_events_is_sample_accurate() {
    let mut synth = synth();
    register(&mut synth, 36, 0, 0, "kick", 1.0);

    let mut out = vec![0.0; 16 * 2];
    synth.render_with_events(
        &mut out,
        &[(
            5,
            KitEvent::NoteOn {
                channel: 1,
                note: 36,
                velocity: 1.0,
            },
        )],
    );

    assert!(out[..5 * 2].iter().all(|s| *s == 0.0));
    assert!(out[5 * 2..].iter().all(|s| close(*s, 1.0)));
}

#[test]
fn test_render_with_events_applies_several_events() {
    let mut synth = synth();
    register(&mut synth, 36, 0, 0, "kick", 1.0);
    register(&mut synth, 38, 0, 0, "snare", 0.5);

    let kick = KitEvent::NoteOn {
        channel: 1,
        note: 36,
        velocity: 1.0,
    };
    let snare = KitEvent::NoteOn {
        channel: 1,
        note: 38,
        velocity: 1.0,
    };

    let mut out = vec![0.0; 8 * 2];
    synth.render_with_events(
        &mut out,
        &[
            (2, kick),
            (2, snare),
            (5, KitEvent::AllNotesKilled),
            (6, kick),
        ],
    );

    let expected = [0.0, 0.0, 1.5, 1.5, 1.5, 0.0, 1.0, 1.0];
    for (i, frame) in out.chunks(2).enumerate() {
        assert!(close(frame[0], expected[i]), "frame {i}");
        assert!(close(frame[1], expected[i]), "frame {i}");
    }
}

#[test]
fn test_render_with_events_clamps_late_offsets() {
    let mut synth = synth();
    let kick = register(&mut synth, 36, 0, 0, "kick", 1.0);

    let mut out = vec![0.0; 8 * 2];
    synth.render_with_events(
        &mut out,
        &[(
            100,
            KitEvent::NoteOn {
                channel: 1,
                note: 36,
                velocity: 1.0,
            },
        )],
    );
    assert!(out.iter().all(|s| *s == 0.0));
    assert!(is_active(&synth, kick));
    assert_eq!(synth.voice(kick).unwrap().position(), 0.0);
}

#[test]
fn test_voices_go_idle_at_sample_end() {
    let mut synth = synth();
    synth
        .register_sample(SampleRegistration::new(constant(36, 1.0, 10), "kick"))
        .unwrap();

    synth.note_on(1, 36, 1.0);
    let out = render(&mut synth, 16);
    assert_eq!(synth.active_voice_count(), 0);
    assert!(out[..10 * 2].iter().all(|s| close(*s, 1.0)));
    assert!(out[10 * 2..].iter().all(|s| *s == 0.0));
}

#[test]
fn test_zero_frame_render_is_idempotent() {
    let mut synth = synth();
    let kick = register(&mut synth, 36, 0, 0, "kick", 1.0);
    synth.note_on(1, 36, 1.0);
    render(&mut synth, 3);

    let mut empty: Vec<f32> = vec![];
    synth.read_samples(&mut empty);
    synth.render_next_block(&mut empty, 0, 0);
    assert_eq!(synth.voice(kick).unwrap().position(), 3.0);
}

#[test]
fn test_phase_invert_on_one_channel() {
    let mut synth = synth();
    let controls = MicrophoneControls::default();
    synth
        .register_sample(
            SampleRegistration::new(constant(36, 0.5, 16), "kick").controls(controls.clone()),
        )
        .unwrap();

    synth.note_on(1, 36, 1.0);
    let normal = render(&mut synth, 8);

    controls.phase_invert.set(true);
    synth.note_on(1, 36, 1.0);
    let inverted = render(&mut synth, 8);

    for (a, b) in normal.iter().zip(inverted.iter()) {
        assert_eq!(*a, -*b);
    }
}

#[test]
fn test_prepare_and_multi_out_flag() {
    let mut synth = synth();
    register(&mut synth, 36, 0, 0, "kick", 1.0);
    synth.prepare(256);
    assert!(!synth.multi_out().get());
    synth.multi_out().set(true);
    assert!(synth.multi_out().get());
    assert!(synth.bus_controls(0).is_some());
    assert!(synth.bus_controls(1).is_none());
}
