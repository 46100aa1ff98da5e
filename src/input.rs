//! Directive records produced by the external tablature parser.
//!
//! The parser emits a JSON array of directives. Field names follow the
//! parser's output (`_l`/`_c` carry the source line and column).

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::tuning::Fret;

/// One top-level directive: `options`, `stave`, `tabstave` or `voice`.
///
/// `element` is kept as a string so that unknown keywords surface as
/// structural errors with a location rather than as decoding failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Directive {
    pub element: String,
    /// Stave/voice options
    #[serde(default)]
    pub options: Vec<OptionEntry>,
    /// Global options (for `options` directives)
    #[serde(default)]
    pub params: Vec<OptionEntry>,
    #[serde(default)]
    pub notes: Vec<NoteElement>,
    #[serde(default)]
    pub text: Vec<TextToken>,
    #[serde(rename = "_l", default)]
    pub line: Option<u32>,
    #[serde(rename = "_c", default)]
    pub column: Option<u32>,
}

/// A `key=value` pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionEntry {
    pub key: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(rename = "_l", default)]
    pub line: Option<u32>,
    #[serde(rename = "_c", default)]
    pub column: Option<u32>,
}

impl OptionEntry {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            line: None,
            column: None,
        }
    }
}

/// A whitespace-separated token from a `text` line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextToken {
    pub text: String,
}

/// One element of a stave's note line: a duration change, a command, a
/// chord, or a single note (fret/string or pitch-letter shorthand).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteElement {
    pub time: Option<String>,
    #[serde(default)]
    pub dot: bool,
    pub command: Option<String>,
    /// Bar type for `bar` commands
    #[serde(rename = "type")]
    pub bar_type: Option<String>,
    pub params: Option<CommandParams>,
    pub chord: Option<Vec<NoteEntry>>,
    pub articulation: Option<ArticulationTag>,
    pub decorator: Option<DecoratorTag>,
    pub fret: Option<Fret>,
    pub string: Option<u32>,
    pub abc: Option<AbcPitch>,
    pub octave: Option<i32>,
    #[serde(rename = "_l", default)]
    pub line: Option<u32>,
    #[serde(rename = "_c", default)]
    pub column: Option<u32>,
}

impl NoteElement {
    /// The single-note shorthand, when this element carries one.
    pub fn single_note(&self) -> Option<NoteEntry> {
        if self.abc.is_none() && self.fret.is_none() {
            return None;
        }
        Some(NoteEntry {
            time: self.time.clone(),
            dot: self.dot,
            fret: self.fret,
            string: self.string,
            abc: self.abc.clone(),
            octave: if self.abc.is_some() { self.octave } else { None },
            articulation: self.articulation,
            decorator: self.decorator,
        })
    }
}

/// Parameters of a note-line command. The shape depends on the command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandParams {
    Tuplet { tuplet: u32, notes: Option<u32> },
    Rest { position: i32 },
    Annotations(Vec<String>),
    Line(String),
}

/// One position inside a chord (or a single note).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteEntry {
    pub time: Option<String>,
    #[serde(default)]
    pub dot: bool,
    pub fret: Option<Fret>,
    pub string: Option<u32>,
    pub abc: Option<AbcPitch>,
    pub octave: Option<i32>,
    pub articulation: Option<ArticulationTag>,
    pub decorator: Option<DecoratorTag>,
}

impl NoteEntry {
    pub fn fret(fret: u32, string: u32) -> Self {
        Self {
            fret: Some(Fret::Number(fret)),
            string: Some(string),
            ..Default::default()
        }
    }

    pub fn with_articulation(mut self, tag: ArticulationTag) -> Self {
        self.articulation = Some(tag);
        self
    }
}

/// An explicit pitch letter, e.g. `{"key": "E", "accidental": "b"}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbcPitch {
    pub key: String,
    pub accidental: Option<String>,
    /// `c` marks the accidental as cautionary
    pub accidental_type: Option<String>,
}

/// Per-position articulation tags, in the order they are linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticulationTag {
    #[serde(rename = "b")]
    Bend,
    #[serde(rename = "s")]
    Slide,
    #[serde(rename = "h")]
    HammerOn,
    #[serde(rename = "p")]
    PullOff,
    #[serde(rename = "t")]
    Tap,
    #[serde(rename = "T")]
    TapTie,
    #[serde(rename = "v")]
    Vibrato,
    #[serde(rename = "V")]
    HarshVibrato,
}

impl ArticulationTag {
    pub const ALL: [ArticulationTag; 8] = [
        ArticulationTag::Bend,
        ArticulationTag::Slide,
        ArticulationTag::HammerOn,
        ArticulationTag::PullOff,
        ArticulationTag::Tap,
        ArticulationTag::TapTie,
        ArticulationTag::Vibrato,
        ArticulationTag::HarshVibrato,
    ];
}

/// Whole-slice decorators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecoratorTag {
    #[serde(rename = "v")]
    Vibrato,
    #[serde(rename = "V")]
    HarshVibrato,
    #[serde(rename = "u")]
    UpStroke,
    #[serde(rename = "d")]
    DownStroke,
}

/// Decode a directive list from the parser's JSON output.
pub fn parse_directives(json: &str) -> Result<Vec<Directive>> {
    Ok(serde_json::from_str(json)?)
}

fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
        Raw::Bool(b) => b.to_string(),
    })
}
