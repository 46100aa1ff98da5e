//! Pitch vocabulary: letters, accidentals, spelled note names, keys and scales.
//!
//! Values are pitch classes in semitones above C (0..12). Spelled names keep
//! their letter so that "a#" and "bb" stay distinct even though they share a
//! value.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{CompileError, Result};

pub const NUM_TONES: i32 = 12;

/// Canonical (sharp) spelling of each pitch class.
pub const CANONICAL_NOTES: [&str; 12] = [
    "c", "c#", "d", "d#", "e", "f", "f#", "g", "g#", "a", "a#", "b",
];

/// Every key signature a stave may declare.
pub const KEY_SIGNATURES: [&str; 30] = [
    "C", "Am", "F", "Dm", "Bb", "Gm", "Eb", "Cm", "Ab", "Fm", "Db", "Bbm", "Gb", "Ebm", "Cb",
    "Abm", "G", "Em", "D", "Bm", "A", "F#m", "E", "C#m", "B", "G#m", "F#", "D#m", "C#", "A#m",
];

pub fn has_key_signature(key: &str) -> bool {
    KEY_SIGNATURES.contains(&key)
}

// ─── Letters ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Position in the C-based diatonic cycle.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Semitones above C.
    pub fn value(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    pub fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_lowercase() {
            'c' => Some(Letter::C),
            'd' => Some(Letter::D),
            'e' => Some(Letter::E),
            'f' => Some(Letter::F),
            'g' => Some(Letter::G),
            'a' => Some(Letter::A),
            'b' => Some(Letter::B),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Letter::C => 'c',
            Letter::D => 'd',
            Letter::E => 'e',
            Letter::F => 'f',
            Letter::G => 'g',
            Letter::A => 'a',
            Letter::B => 'b',
        }
    }

    /// The letter `steps` diatonic steps above this one (wrapping).
    pub fn step(self, steps: usize) -> Letter {
        Letter::ALL[(self.index() + steps) % 7]
    }
}

// ─── Accidentals ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    pub fn offset(self) -> i32 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "bb",
            Accidental::Flat => "b",
            Accidental::Natural => "n",
            Accidental::Sharp => "#",
            Accidental::DoubleSharp => "##",
        }
    }

    fn from_offset(offset: i32) -> Option<Accidental> {
        match offset {
            -2 => Some(Accidental::DoubleFlat),
            -1 => Some(Accidental::Flat),
            1 => Some(Accidental::Sharp),
            2 => Some(Accidental::DoubleSharp),
            _ => None,
        }
    }
}

impl FromStr for Accidental {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bb" => Ok(Accidental::DoubleFlat),
            "b" => Ok(Accidental::Flat),
            "n" => Ok(Accidental::Natural),
            "#" => Ok(Accidental::Sharp),
            "##" => Ok(Accidental::DoubleSharp),
            other => Err(CompileError::resolution(format!(
                "Invalid accidental: '{other}'"
            ))),
        }
    }
}

impl Serialize for Accidental {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

// ─── Spelled note names ─────────────────────────────────────────────

/// A letter with an optional accidental, e.g. `c#`, `bb`, `e`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteName {
    pub letter: Letter,
    pub accidental: Option<Accidental>,
}

impl NoteName {
    pub fn natural(letter: Letter) -> Self {
        Self {
            letter,
            accidental: None,
        }
    }

    /// Pitch class, 0..12.
    pub fn value(&self) -> i32 {
        self.raw_value().rem_euclid(NUM_TONES)
    }

    /// Letter value plus accidental offset, without wrapping (`cb` is -1).
    pub fn raw_value(&self) -> i32 {
        self.letter.value() + self.accidental.map_or(0, Accidental::offset)
    }

    /// Canonical sharp spelling for a pitch class.
    pub fn canonical(value: i32) -> Self {
        let idx = value.rem_euclid(NUM_TONES) as usize;
        // CANONICAL_NOTES entries are all well-formed
        match NoteName::from_str(CANONICAL_NOTES[idx]) {
            Ok(name) => name,
            Err(_) => NoteName::natural(Letter::C),
        }
    }

    /// Same letter, with explicit naturals folded into "no accidental".
    pub fn normalized(self) -> Self {
        match self.accidental {
            Some(Accidental::Natural) => NoteName::natural(self.letter),
            _ => self,
        }
    }
}

impl FromStr for NoteName {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let mut chars = lower.chars();
        let letter = chars
            .next()
            .and_then(Letter::from_char)
            .ok_or_else(|| CompileError::resolution(format!("Invalid note name: '{s}'")))?;
        let rest = chars.as_str();
        let accidental = if rest.is_empty() {
            None
        } else {
            Some(rest.parse::<Accidental>().map_err(|_| {
                CompileError::resolution(format!("Invalid note name: '{s}'"))
            })?)
        };
        Ok(NoteName { letter, accidental })
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter.as_char())?;
        if let Some(acc) = self.accidental {
            f.write_str(acc.symbol())?;
        }
        Ok(())
    }
}

impl Serialize for NoteName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A note name placed in an octave, written `name/octave` (e.g. `c#/4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub name: NoteName,
    pub octave: i32,
}

impl Pitch {
    pub fn new(name: NoteName, octave: i32) -> Self {
        Self { name, octave }
    }

    /// Absolute semitone number used by tunings: `value + octave * 12`.
    pub fn to_integer(&self) -> i32 {
        self.octave
            .saturating_mul(NUM_TONES)
            .saturating_add(self.name.raw_value())
    }

    /// General MIDI key number (C4 = 60), if it lands in 0..=127.
    pub fn midi_key(&self) -> Option<u8> {
        let key = self
            .octave
            .checked_add(1)?
            .checked_mul(NUM_TONES)?
            .checked_add(self.name.raw_value())?;
        u8::try_from(key).ok().filter(|k| *k <= 127)
    }

    /// Diatonic step count from C0, used for vertical placement.
    pub fn diatonic_index(&self) -> i32 {
        self.octave
            .saturating_mul(7)
            .saturating_add(self.name.letter.index() as i32)
    }
}

impl FromStr for Pitch {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, octave) = s
            .split_once('/')
            .ok_or_else(|| CompileError::resolution(format!("Invalid pitch: '{s}'")))?;
        let octave = octave
            .trim()
            .parse::<i32>()
            .map_err(|_| CompileError::resolution(format!("Invalid octave in pitch: '{s}'")))?;
        Ok(Pitch::new(name.parse()?, octave))
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.octave)
    }
}

impl Serialize for Pitch {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ─── Keys and scales ────────────────────────────────────────────────

pub const MAJOR_INTERVALS: [i32; 7] = [2, 2, 1, 2, 2, 2, 1];
pub const MINOR_INTERVALS: [i32; 7] = [2, 1, 2, 2, 1, 2, 2];

/// A parsed key such as `F#m`: root letter, optional flat/sharp, mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParts {
    pub root: NoteName,
    pub minor: bool,
}

impl KeyParts {
    pub fn parse(key: &str) -> Result<Self> {
        let invalid = || CompileError::config(format!("Invalid key: '{key}'"));
        let lower = key.trim().to_ascii_lowercase();
        let mut chars = lower.chars().peekable();
        let letter = chars.next().and_then(Letter::from_char).ok_or_else(invalid)?;
        let accidental = match chars.peek() {
            Some('b') => {
                chars.next();
                Some(Accidental::Flat)
            }
            Some('#') => {
                chars.next();
                Some(Accidental::Sharp)
            }
            _ => None,
        };
        let minor = match chars.next() {
            None => false,
            Some('m') => true,
            Some(_) => return Err(invalid()),
        };
        if chars.next().is_some() {
            return Err(invalid());
        }
        Ok(KeyParts {
            root: NoteName { letter, accidental },
            minor,
        })
    }

    pub fn intervals(&self) -> &'static [i32; 7] {
        if self.minor {
            &MINOR_INTERVALS
        } else {
            &MAJOR_INTERVALS
        }
    }
}

/// The seven pitch classes of the scale starting at `root`.
pub fn scale_tones(root: i32, intervals: &[i32; 7]) -> [i32; 7] {
    let mut tones = [0; 7];
    let mut next = root;
    for (slot, interval) in tones.iter_mut().zip(intervals.iter()) {
        *slot = next.rem_euclid(NUM_TONES);
        next += interval;
    }
    tones
}

/// Spell pitch class `value` using `root`'s letter, e.g. (`f`, 6) -> `f#`.
///
/// Fails when the two are more than a whole tone apart.
pub fn relative_note_name(root: Letter, value: i32) -> Result<NoteName> {
    let mut interval = (value - root.value()).rem_euclid(NUM_TONES);
    if interval > NUM_TONES / 2 {
        interval -= NUM_TONES;
    }
    if interval.abs() > 2 {
        return Err(CompileError::resolution(format!(
            "Notes not related: {}, {}",
            root.as_char(),
            value
        )));
    }
    Ok(NoteName {
        letter: root,
        accidental: Accidental::from_offset(interval),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> NoteName {
        s.parse().unwrap()
    }

    #[test]
    fn note_values_wrap_around_the_octave() {
        assert_eq!(name("c").value(), 0);
        assert_eq!(name("c#").value(), 1);
        assert_eq!(name("cb").value(), 11);
        assert_eq!(name("cb").raw_value(), -1);
        assert_eq!(name("b#").value(), 0);
        assert_eq!(name("ebb").value(), 2);
    }

    #[test]
    fn canonical_spelling_uses_sharps() {
        assert_eq!(NoteName::canonical(10).to_string(), "a#");
        assert_eq!(NoteName::canonical(-1).to_string(), "b");
    }

    #[test]
    fn pitch_parses_and_prints() {
        let p: Pitch = "Eb/5".parse().unwrap();
        assert_eq!(p.to_string(), "eb/5");
        assert_eq!(p.to_integer(), 63);
        assert!("e5".parse::<Pitch>().is_err());
    }

    #[test]
    fn midi_keys_follow_general_midi() {
        let c4: Pitch = "c/4".parse().unwrap();
        assert_eq!(c4.midi_key(), Some(60));
        let cb4: Pitch = "cb/4".parse().unwrap();
        assert_eq!(cb4.midi_key(), Some(59));
        assert_eq!(Pitch::new(NoteName::natural(Letter::C), i32::MAX).midi_key(), None);
        assert_eq!(Pitch::new(NoteName::natural(Letter::C), 11).midi_key(), None);
    }

    #[test]
    fn key_parts_cover_every_signature() {
        for key in KEY_SIGNATURES {
            assert!(KeyParts::parse(key).is_ok(), "{key} should parse");
        }
        let fsm = KeyParts::parse("F#m").unwrap();
        assert_eq!(fsm.root, name("f#"));
        assert!(fsm.minor);
        assert!(KeyParts::parse("H").is_err());
        assert!(KeyParts::parse("Cmaj").is_err());
    }

    #[test]
    fn d_major_scale_tones() {
        assert_eq!(scale_tones(2, &MAJOR_INTERVALS), [2, 4, 6, 7, 9, 11, 1]);
    }

    #[test]
    fn relative_names_stay_within_a_whole_tone() {
        assert_eq!(relative_note_name(Letter::F, 6).unwrap(), name("f#"));
        assert_eq!(relative_note_name(Letter::B, 10).unwrap(), name("bb"));
        assert_eq!(relative_note_name(Letter::C, 11).unwrap(), name("cb"));
        assert_eq!(relative_note_name(Letter::E, 4).unwrap(), name("e"));
        assert!(relative_note_name(Letter::C, 6).is_err());
    }
}
