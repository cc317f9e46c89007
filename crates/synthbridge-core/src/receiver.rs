//! Producer-side entry point for MIDI input.

use crate::sink::SinkControl;
use std::sync::Arc;
use synthbridge_midi::{
    EventProducer, MasterVolume, MidiEvent, MidiMessage, ShortMessage, SysexMessage, VolumeParse,
};

/// Accepts MIDI from any thread.
///
/// Every `send*` call returns immediately and never fails. Master volume
/// sysex messages are applied to the output gain right away and never
/// reach the engine; malformed input is dropped. Everything else is copied
/// into the event queue for the render thread.
///
/// Receivers are cheap to clone and stay usable while the synthesizer is
/// closed; events sent then are rendered after the next open.
#[derive(Debug, Clone)]
pub struct Receiver {
    events: EventProducer,
    control: Arc<SinkControl>,
}

impl Receiver {
    pub(crate) fn new(events: EventProducer, control: Arc<SinkControl>) -> Self {
        Self { events, control }
    }

    pub fn send(&self, message: &MidiMessage) {
        match message {
            MidiMessage::Short(short) => self.send_message(*short),
            MidiMessage::Sysex(sysex) => self.route_sysex(sysex.clone()),
        }
    }

    pub fn send_short(&self, status: u8, data1: u8, data2: u8) {
        match ShortMessage::new(status, data1, data2) {
            Ok(message) => self.send_message(message),
            Err(e) => tracing::debug!(error = %e, status, "Dropping malformed short message"),
        }
    }

    /// `bytes` is a complete sysex message, `F0` (or `F7`) included.
    pub fn send_sysex(&self, bytes: &[u8]) {
        match SysexMessage::new(bytes) {
            Ok(message) => self.route_sysex(message),
            Err(e) => tracing::debug!(error = %e, "Dropping malformed sysex message"),
        }
    }

    /// Raw wire bytes of one message of either kind.
    pub fn send_bytes(&self, bytes: &[u8]) {
        match MidiMessage::from_bytes(bytes) {
            Ok(message) => self.send(&message),
            Err(e) => tracing::debug!(error = %e, "Dropping malformed message"),
        }
    }

    fn send_message(&self, message: ShortMessage) {
        self.events.enqueue(MidiEvent::Short(message));
    }

    fn route_sysex(&self, message: SysexMessage) {
        match MasterVolume::parse_message(&message) {
            VolumeParse::Volume(volume) => {
                self.control.set_gain(volume.gain());
                tracing::debug!(value = volume.value(), "Master volume applied");
            }
            VolumeParse::Truncated => {
                tracing::debug!(len = message.len(), "Dropping truncated master volume sysex");
            }
            VolumeParse::NotVolume => self.events.enqueue(MidiEvent::Long(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use synthbridge_midi::{event_queue, EventConsumer};

    fn receiver() -> (Receiver, EventConsumer, Arc<SinkControl>) {
        let (producer, consumer) = event_queue();
        let control = Arc::new(SinkControl::new());
        (Receiver::new(producer, Arc::clone(&control)), consumer, control)
    }

    #[test]
    fn test_volume_sysex_sets_gain() {
        let (receiver, consumer, control) = receiver();
        control.set_gain(0.0);

        receiver.send_sysex(&[0xF0, 0x7F, 0x7F, 0x04, 0x01, 0x7F, 0x7F, 0xF7]);
        assert_relative_eq!(control.gain(), 1.0);

        receiver.send_sysex(&[0xF0, 0x7F, 0x10, 0x04, 0x01, 0x00, 0x00, 0xF7]);
        assert_relative_eq!(control.gain(), 0.0);

        assert!(consumer.is_empty());
    }

    #[test]
    fn test_truncated_volume_dropped() {
        let (receiver, consumer, control) = receiver();
        receiver.send_sysex(&[0xF0, 0x7F, 0x7F, 0x04, 0x01, 0x7F]);
        assert_relative_eq!(control.gain(), 1.0);
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_other_sysex_enqueued() {
        let (receiver, consumer, _) = receiver();
        let bytes = [0xF0, 0x41, 0x10, 0x42, 0x12, 0xF7];
        receiver.send_sysex(&bytes);

        let events = consumer.drain_all();
        assert_eq!(events.len(), 1);
        match &events[0] {
            MidiEvent::Long(message) => assert_eq!(message.as_bytes(), &bytes),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_malformed_input_dropped() {
        let (receiver, consumer, _) = receiver();
        receiver.send_short(0x90, 0x80, 0x10);
        receiver.send_short(0x40, 0x10, 0x10);
        receiver.send_sysex(&[]);
        receiver.send_bytes(&[0x90, 60]);
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_send_bytes_routes_both_kinds() {
        let (receiver, consumer, control) = receiver();
        receiver.send_bytes(&[0x90, 60, 100]);
        receiver.send_bytes(&[0xF0, 0x7F, 0x7F, 0x04, 0x01, 0x00, 0x20, 0xF7]);

        let events = consumer.drain_all();
        assert_eq!(
            events,
            vec![MidiEvent::Short(ShortMessage::note_on(0, 60, 100).unwrap())]
        );
        assert_relative_eq!(control.gain(), 4096.0 / 16383.0);
    }

    #[test]
    fn test_clones_share_queue() {
        let (receiver, consumer, _) = receiver();
        let other = receiver.clone();
        receiver.send_short(0x90, 60, 100);
        other.send_short(0x80, 60, 0);
        assert_eq!(consumer.len(), 2);
    }
}
