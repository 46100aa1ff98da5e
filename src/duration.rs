//! Durations, tick arithmetic, time signatures and default beam groups.
//!
//! Ticks are exact rationals so tuplet corrections never accumulate
//! rounding error.

use std::fmt;
use std::str::FromStr;

use num_rational::Ratio;
use serde::{Serialize, Serializer};

use crate::error::{CompileError, Result};

pub type Ticks = Ratio<i64>;

/// Ticks in a whole note.
pub const RESOLUTION: i64 = 16384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteValue {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
}

impl NoteValue {
    /// How many of these fit in a whole note.
    pub fn denominator(self) -> i64 {
        match self {
            NoteValue::Whole => 1,
            NoteValue::Half => 2,
            NoteValue::Quarter => 4,
            NoteValue::Eighth => 8,
            NoteValue::Sixteenth => 16,
            NoteValue::ThirtySecond => 32,
            NoteValue::SixtyFourth => 64,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            NoteValue::Whole => "w",
            NoteValue::Half => "h",
            NoteValue::Quarter => "q",
            NoteValue::Eighth => "8",
            NoteValue::Sixteenth => "16",
            NoteValue::ThirtySecond => "32",
            NoteValue::SixtyFourth => "64",
        }
    }

    fn from_code(code: &str) -> Option<NoteValue> {
        match code {
            "w" | "1" => Some(NoteValue::Whole),
            "h" | "2" => Some(NoteValue::Half),
            "q" | "4" => Some(NoteValue::Quarter),
            "8" => Some(NoteValue::Eighth),
            "16" => Some(NoteValue::Sixteenth),
            "32" => Some(NoteValue::ThirtySecond),
            "64" => Some(NoteValue::SixtyFourth),
            _ => None,
        }
    }
}

/// A note value with its dotted and slash flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration {
    pub value: NoteValue,
    pub dotted: bool,
    /// Drawn with slash noteheads; timing is unaffected.
    pub slash: bool,
}

impl Default for Duration {
    fn default() -> Self {
        Duration {
            value: NoteValue::Quarter,
            dotted: false,
            slash: false,
        }
    }
}

impl Duration {
    /// Parse a duration code such as `8`, `q`, `:16`, `hd` or `8S`; `dot`
    /// forces the dotted form.
    pub fn parse(time: &str, dot: bool) -> Result<Duration> {
        let code = time
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .trim_start_matches(':');
        let (code, slash) = match code.strip_suffix(['S', 's']) {
            Some(base) => (base, true),
            None => (code, false),
        };
        let (code, dotted) = match code.strip_suffix('d') {
            Some(base) => (base, true),
            None => (code, dot),
        };
        let value = NoteValue::from_code(code)
            .ok_or_else(|| CompileError::syntax(format!("Invalid duration: '{time}'")))?;
        Ok(Duration {
            value,
            dotted: dotted || dot,
            slash,
        })
    }

    pub fn ticks(&self) -> Ticks {
        let base = Ticks::new(RESOLUTION, self.value.denominator());
        if self.dotted {
            base * Ticks::new(3, 2)
        } else {
            base
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value.code())?;
        if self.dotted {
            f.write_str("d")?;
        }
        if self.slash {
            f.write_str("S")?;
        }
        Ok(())
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ─── Time signatures ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSignature {
    /// `C`
    Common,
    /// `C|`
    CutCommon,
    Numeric { beats: u32, beat_value: u32 },
}

impl FromStr for TimeSignature {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CompileError::config(format!("Invalid time signature: '{s}'"));
        match s.trim() {
            "C" => Ok(TimeSignature::Common),
            "C|" => Ok(TimeSignature::CutCommon),
            other => {
                let (beats, value) = other.split_once('/').ok_or_else(invalid)?;
                let beats = beats.trim().parse::<u32>().map_err(|_| invalid())?;
                let beat_value = value.trim().parse::<u32>().map_err(|_| invalid())?;
                if beats == 0 || beat_value == 0 {
                    return Err(invalid());
                }
                Ok(TimeSignature::Numeric { beats, beat_value })
            }
        }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSignature::Common => f.write_str("C"),
            TimeSignature::CutCommon => f.write_str("C|"),
            TimeSignature::Numeric { beats, beat_value } => write!(f, "{beats}/{beat_value}"),
        }
    }
}

impl Serialize for TimeSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A beaming unit such as `2/8`: kept unreduced, since "two eighths" and
/// "one quarter" beam differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamGroup {
    pub count: u32,
    pub value: u32,
}

impl BeamGroup {
    pub fn new(count: u32, value: u32) -> Self {
        Self { count, value }
    }

    pub fn ticks(&self) -> Ticks {
        Ticks::new(RESOLUTION * i64::from(self.count), i64::from(self.value.max(1)))
    }
}

impl fmt::Display for BeamGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.count, self.value)
    }
}

impl Serialize for BeamGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Default beam grouping for a stave's time signature.
pub fn default_beam_groups(time: Option<&TimeSignature>) -> Vec<BeamGroup> {
    let (beats, value) = match time {
        Some(TimeSignature::Numeric { beats, beat_value }) => (*beats, *beat_value),
        _ => (4, 4),
    };

    let group = match (beats, value) {
        (1..=4, 2) => BeamGroup::new(1, 2),
        (1..=4, 4) => BeamGroup::new(1, 4),
        (1, 8) => BeamGroup::new(1, 8),
        (2, 8) | (4, 8) => BeamGroup::new(2, 8),
        (3, 8) => BeamGroup::new(3, 8),
        (1, 16) => BeamGroup::new(1, 16),
        (2, 16) | (4, 16) => BeamGroup::new(2, 16),
        (3, 16) => BeamGroup::new(3, 16),
        (b, v) if b % 3 == 0 => BeamGroup::new(3, v),
        (_, v) if v > 4 => BeamGroup::new(2, v),
        (_, v) => BeamGroup::new(1, v),
    };
    vec![group]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_and_dotted_ticks() {
        assert_eq!(Duration::default().ticks(), Ticks::from_integer(4096));
        let dotted_eighth = Duration::parse("8", true).unwrap();
        assert_eq!(dotted_eighth.ticks(), Ticks::from_integer(3072));
        assert_eq!(dotted_eighth.to_string(), "8d");
    }

    #[test]
    fn codes_accept_colon_prefix_and_dot_suffix() {
        let d = Duration::parse(":hd", false).unwrap();
        assert_eq!(d.value, NoteValue::Half);
        assert!(d.dotted);
        assert_eq!(Duration::parse("16", false).unwrap().value, NoteValue::Sixteenth);
        assert!(Duration::parse("7", false).is_err());
    }

    #[test]
    fn slash_suffix_keeps_timing() {
        let slash = Duration::parse(":8S", false).unwrap();
        assert!(slash.slash);
        assert_eq!(slash.value, NoteValue::Eighth);
        assert_eq!(slash.ticks(), Ticks::from_integer(2048));
        assert_eq!(slash.to_string(), "8S");

        let dotted = Duration::parse("qdS", false).unwrap();
        assert!(dotted.dotted && dotted.slash);
        assert_eq!(dotted.to_string(), "qdS");
        assert!(!Duration::parse("16", false).unwrap().slash);
    }

    #[test]
    fn time_signatures() {
        assert_eq!("C".parse::<TimeSignature>().unwrap(), TimeSignature::Common);
        assert_eq!("C|".parse::<TimeSignature>().unwrap(), TimeSignature::CutCommon);
        assert_eq!(
            "6/8".parse::<TimeSignature>().unwrap(),
            TimeSignature::Numeric { beats: 6, beat_value: 8 }
        );
        assert!("6-8".parse::<TimeSignature>().is_err());
        assert!("0/4".parse::<TimeSignature>().is_err());
    }

    fn groups(time: &str) -> String {
        let ts: TimeSignature = time.parse().unwrap();
        default_beam_groups(Some(&ts))[0].to_string()
    }

    #[test]
    fn beam_group_table() {
        assert_eq!(groups("4/4"), "1/4");
        assert_eq!(groups("3/2"), "1/2");
        assert_eq!(groups("4/8"), "2/8");
        assert_eq!(groups("3/8"), "3/8");
        assert_eq!(groups("4/16"), "2/16");
        assert_eq!(groups("6/8"), "3/8");
        assert_eq!(groups("5/8"), "2/8");
        assert_eq!(groups("5/4"), "1/4");
        assert_eq!(groups("6/4"), "3/4");
        assert_eq!(groups("C"), "1/4");
        assert_eq!(default_beam_groups(None)[0].to_string(), "1/4");
    }
}
