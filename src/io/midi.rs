const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;
const PROGRAM_CHANGE: u8 = 0xC0;
const PITCH_BEND: u8 = 0xE0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// Decode one channel voice message from raw bytes.
    ///
    /// Status 0x90 (144 on channel 1) is note-on and 0x80 (128) is
    /// note-off, whatever the velocity. Unknown, system and truncated
    /// messages yield `None`.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0F;
        let data1 = data.first().map(|b| b & 0x7F);
        let data2 = data.get(1).map(|b| b & 0x7F);

        match status & 0xF0 {
            NOTE_ON => Some(MidiEvent::NoteOn {
                channel,
                key: data1?,
                velocity: data2.unwrap_or(0),
            }),
            NOTE_OFF => Some(MidiEvent::NoteOff {
                channel,
                key: data1?,
                velocity: data2.unwrap_or(0),
            }),
            CONTROL_CHANGE => Some(MidiEvent::ControlChange {
                channel,
                controller: data1?,
                value: data2?,
            }),
            PROGRAM_CHANGE => Some(MidiEvent::ProgramChange {
                channel,
                program: data1?,
            }),
            PITCH_BEND => {
                let lsb = data1? as i16;
                let msb = data2? as i16;
                Some(MidiEvent::PitchBend {
                    channel,
                    value: ((msb << 7) | lsb) - 8192,
                })
            }
            _ => None,
        }
    }
}
