//! String tunings and fret → pitch transposition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CompileError, Result};
use crate::music::{NoteName, Pitch, NUM_TONES};

/// Named tunings, highest string first.
const NAMED_TUNINGS: [(&str, &str); 5] = [
    ("standard", "E/5,B/4,G/4,D/4,A/3,E/3"),
    ("dagdad", "D/5,A/4,G/4,D/4,A/3,D/3"),
    ("dropd", "E/5,B/4,G/4,D/4,A/3,D/3"),
    ("eb", "Eb/5,Bb/4,Gb/4,Db/4,Ab/3,Eb/3"),
    ("standardBanjo", "D/5,B/4,G/4,D/4,G/5"),
];

/// A fret number, or a muted/dead string (`X`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fret {
    Number(u32),
    Muted,
}

impl Fret {
    pub fn number(self) -> Option<u32> {
        match self {
            Fret::Number(n) => Some(n),
            Fret::Muted => None,
        }
    }
}

impl FromStr for Fret {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("x") {
            return Ok(Fret::Muted);
        }
        s.parse::<u32>()
            .map(Fret::Number)
            .map_err(|_| CompileError::resolution(format!("Invalid fret number: '{s}'")))
    }
}

impl fmt::Display for Fret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fret::Number(n) => write!(f, "{n}"),
            Fret::Muted => f.write_str("X"),
        }
    }
}

impl Serialize for Fret {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Fret::Number(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Open-string pitches, string 1 (highest) first, as absolute semitone numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuning {
    strings: Vec<i32>,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            strings: vec![64, 59, 55, 50, 45, 40],
        }
    }
}

impl Tuning {
    /// Parse a tuning name or a comma-separated list of `Note/octave`.
    pub fn parse(spec: &str) -> Result<Self> {
        let list = NAMED_TUNINGS
            .iter()
            .find(|(name, _)| *name == spec)
            .map_or(spec, |(_, list)| *list);

        let strings = list
            .split(',')
            .map(|s| s.parse::<Pitch>().map(|p| p.to_integer()))
            .collect::<Result<Vec<_>>>()
            .map_err(|_| CompileError::config(format!("Invalid tuning: '{spec}'")))?;

        if strings.is_empty() {
            return Err(CompileError::config(format!("Invalid tuning: '{spec}'")));
        }
        Ok(Tuning { strings })
    }

    pub fn num_strings(&self) -> usize {
        self.strings.len()
    }

    /// Absolute value of the open string (1-based).
    pub fn value_for_string(&self, string: u32) -> Result<i32> {
        let idx = usize::try_from(string).unwrap_or(usize::MAX);
        if idx < 1 || idx > self.strings.len() {
            return Err(CompileError::resolution(format!(
                "String number must be between 1 and {}: {}",
                self.strings.len(),
                string
            )));
        }
        Ok(self.strings[idx - 1])
    }

    /// Canonical pitch sounding at `fret` on `string`.
    pub fn note_for_fret(&self, fret: u32, string: u32) -> Result<Pitch> {
        let open = self.value_for_string(string)?;
        let value = i32::try_from(fret)
            .ok()
            .and_then(|f| open.checked_add(f))
            .ok_or_else(|| CompileError::resolution(format!("Invalid fret number: {fret}")))?;
        Ok(Pitch::new(
            NoteName::canonical(value),
            value.div_euclid(NUM_TONES),
        ))
    }
}
