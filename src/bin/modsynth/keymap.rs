//! Computer keyboard as a piano
//!
//! Two rows laid out like piano keys: `Z S X D C V ...` plays the
//! lower octave, `Q 2 W 3 E R ...` the upper one. The bottom row runs on
//! past its octave (`, L . ; /`) and overlaps the top row.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use modsynth::Note;

pub const DEFAULT_OCTAVE: i32 = 4;
const OCTAVES: std::ops::RangeInclusive<i32> = 0..=8;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Semitone offset of a key from the current octave's C.
pub fn key_offset(key: char) -> Option<i32> {
    let offset = match key.to_ascii_lowercase() {
        'z' => 0,
        's' => 1,
        'x' => 2,
        'd' => 3,
        'c' => 4,
        'v' => 5,
        'g' => 6,
        'b' => 7,
        'h' => 8,
        'n' => 9,
        'j' => 10,
        'm' => 11,
        ',' => 12,
        'l' => 13,
        '.' => 14,
        ';' => 15,
        '/' => 16,
        'q' => 12,
        '2' => 13,
        'w' => 14,
        '3' => 15,
        'e' => 16,
        'r' => 17,
        '5' => 18,
        't' => 19,
        '6' => 20,
        'y' => 21,
        '7' => 22,
        'u' => 23,
        'i' => 24,
        '9' => 25,
        'o' => 26,
        '0' => 27,
        'p' => 28,
        '[' => 29,
        '=' => 30,
        ']' => 31,
        _ => return None,
    };
    Some(offset)
}

/// "C4", "F#2". Octave numbering puts note 60 at C4.
pub fn note_name(note: Note) -> String {
    let name = NOTE_NAMES[note.rem_euclid(12) as usize];
    format!("{name}{}", note.div_euclid(12) - 1)
}

struct Held {
    note: Note,
    last_seen: Instant,
}

/// Held keys and the octave they play in.
pub struct Keymap {
    octave: i32,
    held: HashMap<char, Held>,
}

impl Keymap {
    pub fn new() -> Self {
        Self {
            octave: DEFAULT_OCTAVE,
            held: HashMap::new(),
        }
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    pub fn shift_octave(&mut self, by: i32) {
        self.octave = (self.octave + by).clamp(*OCTAVES.start(), *OCTAVES.end());
    }

    /// Lowest note the keyboard reaches at the current octave.
    pub fn base_note(&self) -> Note {
        self.octave * 12
    }

    /// A key went down (or auto-repeated). Returns the note to start, if
    /// the key was not already held.
    pub fn press(&mut self, key: char, now: Instant) -> Option<Note> {
        let key = key.to_ascii_lowercase();
        if let Some(held) = self.held.get_mut(&key) {
            held.last_seen = now;
            return None;
        }
        let note = self.base_note() + key_offset(key)?;
        self.held.insert(
            key,
            Held {
                note,
                last_seen: now,
            },
        );
        Some(note)
    }

    /// A key came up. Returns the note it started, which may belong to an
    /// earlier octave.
    pub fn release(&mut self, key: char) -> Option<Note> {
        self.held.remove(&key.to_ascii_lowercase()).map(|h| h.note)
    }

    /// For terminals that never report key release: treat a key as let go
    /// once it stops auto-repeating for `hold`.
    pub fn expire(&mut self, now: Instant, hold: Duration) -> Vec<Note> {
        let mut released = Vec::new();
        self.held.retain(|_, held| {
            let keep = now.duration_since(held.last_seen) < hold;
            if !keep {
                released.push(held.note);
            }
            keep
        });
        released
    }

    /// Forget every held key, e.g. after the synth was reset.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_map_like_a_piano() {
        let mut keys = Keymap::new();
        let now = Instant::now();
        assert_eq!(keys.press('z', now), Some(48));
        assert_eq!(keys.press('Q', now), Some(60));
        assert_eq!(keys.press(']', now), Some(79));
        assert_eq!(keys.press('a', now), None);
    }

    #[test]
    fn repeat_does_not_retrigger() {
        let mut keys = Keymap::new();
        let now = Instant::now();
        assert_eq!(keys.press('x', now), Some(50));
        assert_eq!(keys.press('x', now), None);
        assert_eq!(keys.release('x'), Some(50));
        assert_eq!(keys.release('x'), None);
    }

    #[test]
    fn release_returns_the_note_pressed_even_after_octave_shift() {
        let mut keys = Keymap::new();
        let now = Instant::now();
        keys.press('c', now);
        keys.shift_octave(1);
        assert_eq!(keys.release('c'), Some(52));
        assert_eq!(keys.press('c', now), Some(64));
    }

    #[test]
    fn octave_is_bounded() {
        let mut keys = Keymap::new();
        keys.shift_octave(-20);
        assert_eq!(keys.octave(), 0);
        keys.shift_octave(20);
        assert_eq!(keys.octave(), 8);
    }

    #[test]
    fn stale_keys_expire() {
        let mut keys = Keymap::new();
        let start = Instant::now();
        keys.press('z', start);
        keys.press('s', start + Duration::from_millis(500));
        let released = keys.expire(start + Duration::from_millis(700), Duration::from_millis(600));
        assert_eq!(released, vec![48]);
        assert_eq!(keys.release('s'), Some(49));
    }

    #[test]
    fn names_notes() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(-1), "B-2");
    }
}
