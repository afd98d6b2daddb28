use std::sync::Arc;

use tracing::debug;

use crate::{
    effects::{BusControls, BusProcessor},
    helpers::{prepare_cache_vec, sum_into},
    kit::{
        BusId, Instrument, InstrumentRegistry, KitInitOptions, LayerBlend, MicrophoneChannel,
        VoiceId,
    },
    params::BoolParameter,
    voice::{EnvelopeParameters, ReleaseType, RenderingVoice},
    AudioPipe, AudioStreamParams,
};

mod events;
pub use events::*;

mod registration;
pub use registration::*;

/// A drum sample engine.
///
/// Owns the instrument registry and every voice of the kit. Voices are
/// created while samples are registered and are only ever restarted after
/// that, so triggering and rendering never allocate.
///
/// Each distinct microphone id gets its own mix bus with its own processing
/// chain. `read_samples` sums all buses into one output, `render_buses`
/// renders them separately; `multi_out` tells the host which of the two to
/// use.
pub struct DrumSynth {
    stream_params: AudioStreamParams,
    options: KitInitOptions,
    envelope: EnvelopeParameters,

    registry: InstrumentRegistry,
    voices: Vec<RenderingVoice>,
    voice_buses: Vec<BusId>,

    microphones: Vec<String>,
    buses: Vec<BusProcessor>,
    bus_cache: Vec<Vec<f32>>,
    multi_out: BoolParameter,
}

impl DrumSynth {
    /// Creates an empty engine. Samples are added with `register_sample`.
    pub fn new(stream_params: AudioStreamParams, options: KitInitOptions) -> Self {
        let envelope = options
            .envelope
            .to_envelope_params(stream_params.sample_rate, options.linear_release);

        Self {
            stream_params,
            options,
            envelope,
            registry: InstrumentRegistry::new(),
            voices: Vec::new(),
            voice_buses: Vec::new(),
            microphones: Vec::new(),
            buses: Vec::new(),
            bus_cache: Vec::new(),
            multi_out: BoolParameter::new(false),
        }
    }

    /// Adds one microphone channel to the kit and creates the voice that
    /// plays it.
    ///
    /// Layers and variations are created as needed, so registrations may
    /// arrive in any order. The choke list of the note is replaced by the one
    /// in the registration.
    pub fn register_sample(
        &mut self,
        registration: SampleRegistration,
    ) -> Result<VoiceId, RegisterError> {
        registration.validate(self.stream_params.sample_rate)?;

        let SampleRegistration {
            note,
            velocity_index,
            variation_index,
            choke_targets,
            microphone,
            sample,
            controls,
        } = registration;

        let bus = self.bus_for_microphone(&microphone);
        let sample = Arc::new(sample);
        let voice = VoiceId(self.voices.len());

        let instrument = self
            .registry
            .get_or_insert(note)
            .ok_or(RegisterError::NoteOutOfRange(note))?;
        instrument.set_choke_targets(&choke_targets);
        instrument
            .layer_mut_or_grow(velocity_index)
            .variation_mut(variation_index)
            .microphones
            .push(MicrophoneChannel {
                sample: sample.clone(),
                voice,
                bus,
            });

        debug!(
            note,
            velocity_index,
            variation_index,
            microphone = microphone.as_str(),
            sample = sample.name(),
            frames = sample.length(),
            "Registered sample"
        );

        self.voices.push(RenderingVoice::new(
            sample,
            controls,
            self.envelope,
            self.options.gain_range,
            self.options.pan_range,
        ));
        self.voice_buses.push(bus);

        Ok(voice)
    }

    fn bus_for_microphone(&mut self, microphone: &str) -> BusId {
        if let Some(bus) = self.bus_index(microphone) {
            return bus;
        }
        self.microphones.push(microphone.to_owned());
        self.buses.push(BusProcessor::new(self.stream_params));
        self.bus_cache.push(Vec::new());
        self.microphones.len() - 1
    }

    /// Reserves render buffers for blocks of up to `max_block_frames`
    /// frames, so rendering such blocks never allocates.
    pub fn prepare(&mut self, max_block_frames: usize) {
        let len = self.stream_params.frames_to_samples(max_block_frames);
        for cache in self.bus_cache.iter_mut() {
            cache.reserve(len.saturating_sub(cache.len()));
        }
    }

    /// Triggers the instrument of `note` on every microphone.
    ///
    /// Notes without an instrument are ignored.
    pub fn note_on(&mut self, channel: u8, note: u8, velocity: f32) {
        self.dispatch(channel, note, velocity, None);
    }

    /// Triggers the instrument of `note` on one microphone only. Unknown
    /// microphones are ignored.
    pub fn note_on_microphone(&mut self, channel: u8, note: u8, velocity: f32, microphone: &str) {
        if let Some(bus) = self.bus_index(microphone) {
            self.dispatch(channel, note, velocity, Some(bus));
        }
    }

    /// Drum hits play to completion, note offs are ignored.
    pub fn note_off(&mut self, _channel: u8, _note: u8) {}

    /// Silences every voice immediately.
    pub fn all_notes_killed(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.stop_note(ReleaseType::Kill);
        }
    }

    /// Sends a KitEvent to the engine.
    /// See the `KitEvent` documentation for more information.
    pub fn send_event(&mut self, event: KitEvent) {
        match event {
            KitEvent::NoteOn {
                channel,
                note,
                velocity,
            } => self.note_on(channel, note, velocity),
            KitEvent::NoteOnMicrophone {
                channel,
                note,
                velocity,
                bus,
            } => {
                if bus < self.buses.len() {
                    self.dispatch(channel, note, velocity, Some(bus));
                }
            }
            KitEvent::NoteOff { channel, note } => self.note_off(channel, note),
            KitEvent::AllNotesKilled => self.all_notes_killed(),
        }
    }

    fn dispatch(&mut self, channel: u8, note: u8, velocity: f32, bus: Option<BusId>) {
        let Some(instrument) = self.registry.get_mut(note) else {
            return;
        };

        // Chokes land before anything new starts
        for &target in instrument.choke_targets() {
            for voice in self.voices.iter_mut() {
                if voice.is_sounding(target, channel) {
                    voice.stop_note(ReleaseType::Kill);
                }
            }
        }

        let blend = LayerBlend::from_velocity(velocity, instrument.layer_count());
        let trigger = Trigger {
            channel,
            note,
            intensity: blend.perceived,
            bus,
        };

        trigger.layer(&mut self.voices, instrument, blend.lower);
        if let Some(higher) = blend.higher {
            trigger.layer(&mut self.voices, instrument, higher);
        }
    }

    /// Adds `num_frames` frames of every active voice into the interleaved
    /// `out` buffer, starting at frame `start_frame`. Bypasses the mix buses.
    pub fn render_next_block(&mut self, out: &mut [f32], start_frame: usize, num_frames: usize) {
        let channels = self.stream_params.channels;
        for voice in self.voices.iter_mut() {
            voice.render_to(out, channels, start_frame, num_frames);
        }
    }

    /// Renders every voice into its bus buffer and runs the bus chains.
    fn render_bus_cache(&mut self, frames: usize) {
        let len = self.stream_params.frames_to_samples(frames);
        let channels = self.stream_params.channels;

        for cache in self.bus_cache.iter_mut() {
            prepare_cache_vec(cache, len, 0.0);
        }

        for (voice, bus) in self.voices.iter_mut().zip(self.voice_buses.iter()) {
            if voice.is_active() {
                voice.render_to(&mut self.bus_cache[*bus], channels, 0, frames);
            }
        }

        for (processor, cache) in self.buses.iter_mut().zip(self.bus_cache.iter_mut()) {
            processor.process(cache);
        }
    }

    /// Renders every mix bus into its own interleaved buffer.
    ///
    /// The block length is taken from the first buffer, and every buffer is
    /// resized to it. Buses without a buffer are still rendered so their
    /// voices keep advancing.
    pub fn render_buses(&mut self, outputs: &mut [Vec<f32>]) {
        let len = outputs.first().map(|o| o.len()).unwrap_or(0);
        let frames = len / self.stream_params.channels.count() as usize;
        self.render_bus_cache(frames);

        for (output, cache) in outputs.iter_mut().zip(self.bus_cache.iter()) {
            prepare_cache_vec(output, cache.len(), 0.0);
            output.copy_from_slice(cache);
        }
        for output in outputs.iter_mut().skip(self.bus_cache.len()) {
            prepare_cache_vec(output, len, 0.0);
        }
    }

    /// Renders a block and applies `events` at their frame offsets.
    ///
    /// `events` must be sorted by offset. Offsets past the end of the block
    /// are applied at the end of it.
    pub fn render_with_events(&mut self, out: &mut [f32], events: &[(usize, KitEvent)]) {
        let stride = self.stream_params.channels.count() as usize;
        let frames = out.len() / stride;

        let mut cursor = 0;
        for &(offset, event) in events {
            let offset = offset.clamp(cursor, frames);
            if offset > cursor {
                self.read_samples_unchecked(&mut out[cursor * stride..offset * stride]);
                cursor = offset;
            }
            self.send_event(event);
        }
        if cursor < frames {
            self.read_samples_unchecked(&mut out[cursor * stride..frames * stride]);
        }
    }

    pub fn options(&self) -> &KitInitOptions {
        &self.options
    }

    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    pub fn instrument(&self, note: u8) -> Option<&Instrument> {
        self.registry.get(note)
    }

    /// Notes that have an instrument, ascending.
    pub fn midi_notes(&self) -> Vec<u8> {
        self.registry.midi_notes()
    }

    pub fn voice(&self, id: VoiceId) -> Option<&RenderingVoice> {
        self.voices.get(id.0)
    }

    /// Total number of voices, one per registered microphone channel.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Returns the number of voices currently producing sound.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn bus_count(&self) -> usize {
        self.buses.len()
    }

    pub fn bus_index(&self, microphone: &str) -> Option<BusId> {
        self.microphones.iter().position(|m| m == microphone)
    }

    /// Microphone ids, in bus order.
    pub fn microphones(&self) -> &[String] {
        &self.microphones
    }

    pub fn bus_controls(&self, bus: BusId) -> Option<&BusControls> {
        self.buses.get(bus).map(|b| b.controls())
    }

    /// Whether the host should use `render_buses` instead of `read_samples`.
    pub fn multi_out(&self) -> &BoolParameter {
        &self.multi_out
    }
}

impl AudioPipe for DrumSynth {
    fn stream_params(&self) -> &AudioStreamParams {
        &self.stream_params
    }

    fn read_samples_unchecked(&mut self, to: &mut [f32]) {
        let frames = to.len() / self.stream_params.channels.count() as usize;
        self.render_bus_cache(frames);

        to.fill(0.0);
        for cache in self.bus_cache.iter() {
            sum_into(cache, to);
        }
    }
}

/// The parameters of one note-on, applied to each triggered layer.
struct Trigger {
    channel: u8,
    note: u8,
    intensity: f32,
    bus: Option<BusId>,
}

impl Trigger {
    /// Restarts every matching voice of the layer's current variation and
    /// advances the layer's round-robin cursor. Missing layers and layers
    /// without variations are skipped.
    fn layer(&self, voices: &mut [RenderingVoice], instrument: &mut Instrument, index: usize) {
        let Some(layer) = instrument.layer_mut(index) else {
            return;
        };
        let Some(variation) = layer.current_variation() else {
            return;
        };

        for microphone in variation.microphones.iter() {
            if self.bus.is_some_and(|bus| bus != microphone.bus)
                || !microphone.sample.applies_to_channel(self.channel)
            {
                continue;
            }
            if let Some(voice) = voices.get_mut(microphone.voice.0) {
                voice.stop_note(ReleaseType::Kill);
                voice.start_note(self.note, self.channel, self.intensity);
            }
        }

        layer.advance();
    }
}

#[cfg(test)]
mod tests;
