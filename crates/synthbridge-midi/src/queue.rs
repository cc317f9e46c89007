//! Multi-producer, single-consumer event queue.
//!
//! Producers never block and never fail: the queue is unbounded, so a burst
//! of events grows memory instead of losing events. The consumer side is
//! owned by the render thread.

use crossbeam_channel::{Receiver, Sender};

use crate::event::MidiEvent;

/// Create a connected producer/consumer pair.
pub fn event_queue() -> (EventProducer, EventConsumer) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (EventProducer { tx }, EventConsumer { rx })
}

/// Producer side -- cheap to clone, one per sending thread or receiver.
#[derive(Clone, Debug)]
pub struct EventProducer {
    tx: Sender<MidiEvent>,
}

impl EventProducer {
    /// Append an event. Never blocks.
    #[inline]
    pub fn enqueue(&self, event: MidiEvent) {
        // Only fails once every consumer is gone, in which case nobody
        // would ever render the event anyway.
        if self.tx.send(event).is_err() {
            tracing::trace!("Event queue disconnected, dropping event");
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Consumer side -- drained by the render thread.
#[derive(Clone, Debug)]
pub struct EventConsumer {
    rx: Receiver<MidiEvent>,
}

impl EventConsumer {
    /// Remove every event queued at the time of the call, in enqueue order.
    ///
    /// Events pushed while the iterator is being consumed are left for the
    /// next drain, so a busy producer cannot starve the caller.
    #[inline]
    pub fn drain(&self) -> impl Iterator<Item = MidiEvent> + '_ {
        let pending = self.rx.len();
        self.rx.try_iter().take(pending)
    }

    pub fn drain_all(&self) -> Vec<MidiEvent> {
        let mut events = Vec::with_capacity(self.rx.len());
        events.extend(self.drain());
        events
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ShortMessage, SysexMessage};
    use std::thread;

    fn note(n: u8) -> MidiEvent {
        MidiEvent::Short(ShortMessage::note_on(0, n, 100).unwrap())
    }

    #[test]
    fn test_drain_preserves_order() {
        let (producer, consumer) = event_queue();
        producer.enqueue(note(60));
        producer.enqueue(MidiEvent::Long(
            SysexMessage::new(&[0xF0, 0x41, 0xF7]).unwrap(),
        ));
        producer.enqueue(note(62));

        let events = consumer.drain_all();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], note(60));
        assert!(matches!(events[1], MidiEvent::Long(_)));
        assert_eq!(events[2], note(62));
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_drain_empty() {
        let (_producer, consumer) = event_queue();
        assert!(consumer.drain_all().is_empty());
    }

    #[test]
    fn test_drain_is_bounded_by_entry_length() {
        let (producer, consumer) = event_queue();
        producer.enqueue(note(1));
        producer.enqueue(note(2));

        let mut seen = 0;
        for _ in consumer.drain() {
            // Late arrivals wait for the next drain.
            producer.enqueue(note(3));
            seen += 1;
        }
        assert_eq!(seen, 2);
        assert_eq!(consumer.len(), 2);
    }

    #[test]
    fn test_many_producers() {
        let (producer, consumer) = event_queue();
        let handles: Vec<_> = (0..4u8)
            .map(|channel| {
                let producer = producer.clone();
                thread::spawn(move || {
                    for n in 0..100u8 {
                        let msg = ShortMessage::note_on(channel, n, 1).unwrap();
                        producer.enqueue(MidiEvent::Short(msg));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let events = consumer.drain_all();
        assert_eq!(events.len(), 400);

        // Per-producer FIFO order survives interleaving.
        for channel in 0..4u8 {
            let notes: Vec<u8> = events
                .iter()
                .filter_map(|event| match event {
                    MidiEvent::Short(msg) if msg.channel() == Some(channel) => Some(msg.data1()),
                    _ => None,
                })
                .collect();
            assert_eq!(notes, (0..100u8).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_enqueue_after_consumer_dropped() {
        let (producer, consumer) = event_queue();
        drop(consumer);
        // Must not panic or block.
        producer.enqueue(note(60));
    }
}
