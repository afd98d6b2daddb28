use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crossbeam_channel::{Sender, TrySendError};

use drumkit_core::synth::KitEvent;

/// Sends events to a running `RealtimeDrumSynth` from any thread.
///
/// Sending never blocks. When the audio thread falls behind and the queue
/// is full, the event is dropped and counted.
#[derive(Debug, Clone)]
pub struct RealtimeEventSender {
    sender: Sender<KitEvent>,
    dropped: Arc<AtomicU64>,
}

impl RealtimeEventSender {
    pub(crate) fn new(sender: Sender<KitEvent>, dropped: Arc<AtomicU64>) -> Self {
        Self { sender, dropped }
    }

    /// Queues an event for the next audio block. Returns false if it was dropped.
    pub fn send_event(&self, event: KitEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn note_on(&self, channel: u8, note: u8, velocity: f32) -> bool {
        self.send_event(KitEvent::NoteOn {
            channel,
            note,
            velocity,
        })
    }

    pub fn all_notes_killed(&self) -> bool {
        self.send_event(KitEvent::AllNotesKilled)
    }

    /// Number of events dropped so far.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_full_queue_drops_and_counts() {
        let (sender, receiver) = bounded(2);
        let sender = RealtimeEventSender::new(sender, Arc::new(AtomicU64::new(0)));

        assert!(sender.note_on(10, 36, 1.0));
        assert!(sender.note_on(10, 38, 0.5));
        assert!(!sender.note_on(10, 42, 0.5));
        assert_eq!(sender.dropped_events(), 1);

        assert_eq!(
            receiver.try_recv().unwrap(),
            KitEvent::NoteOn {
                channel: 10,
                note: 36,
                velocity: 1.0
            }
        );
        assert!(sender.all_notes_killed());
        assert_eq!(sender.dropped_events(), 1);
    }

    #[test]
    fn test_disconnected_queue_counts_drops() {
        let (sender, receiver) = bounded(4);
        let sender = RealtimeEventSender::new(sender, Arc::new(AtomicU64::new(0)));
        let clone = sender.clone();
        drop(receiver);

        assert!(!sender.all_notes_killed());
        assert!(!clone.all_notes_killed());
        assert_eq!(sender.dropped_events(), 2);
    }
}
