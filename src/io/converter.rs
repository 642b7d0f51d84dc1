use crate::{io::midi::MidiEvent, synth::message::SynthMessage, synth::Note};

/// Map a MIDI event to a synth message. `channel_filter` of `None` accepts
/// every channel.
pub fn midi_to_synth(midi: MidiEvent, channel_filter: Option<u8>) -> Option<SynthMessage> {
    let accepts = |channel: u8| channel_filter.map_or(true, |c| c == channel);
    match midi {
        MidiEvent::NoteOn { channel, key, .. } if accepts(channel) => {
            Some(SynthMessage::NoteOn { note: key as Note })
        }
        MidiEvent::NoteOff { channel, key, .. } if accepts(channel) => {
            Some(SynthMessage::NoteOff { note: key as Note })
        }
        _ => None,
    }
}

/// Equal-tempered frequency of a MIDI note, A4 (69) = 440 Hz.
pub fn midi_to_hz(note: Note) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn octaves_around_a4() {
        assert_relative_eq!(midi_to_hz(69), 440.0, max_relative = 1e-6);
        assert_relative_eq!(midi_to_hz(81), 880.0, max_relative = 1e-6);
        assert_relative_eq!(midi_to_hz(57), 220.0, max_relative = 1e-6);
    }

    #[test]
    fn out_of_range_notes_stay_finite() {
        assert!(midi_to_hz(-200).is_finite());
        assert!(midi_to_hz(400).is_finite());
    }

    #[test]
    fn filters_by_channel() {
        let on = MidiEvent::NoteOn {
            channel: 2,
            key: 60,
            velocity: 90,
        };
        assert_eq!(midi_to_synth(on, Some(0)), None);
        assert_eq!(
            midi_to_synth(on, Some(2)),
            Some(SynthMessage::NoteOn { note: 60 })
        );
        assert_eq!(
            midi_to_synth(on, None),
            Some(SynthMessage::NoteOn { note: 60 })
        );
    }
}
