//! Compiler configuration.
//!
//! [`ArtistOptions`] are fixed when the compiler is constructed.
//! [`Customizations`] is the closed set of options a score may change
//! through `options` directives. [`StaveConfig`] is the validated form of a
//! stave or voice declaration's options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::duration::TimeSignature;
use crate::error::{CompileError, Result};
use crate::input::OptionEntry;
use crate::music::has_key_signature;
use crate::tuning::Tuning;

// ─── Construction options ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtistOptions {
    /// Left edge of every stave
    pub x: f64,
    /// Top of the first stave
    pub y: f64,
    /// Total drawing width
    pub width: f64,
    pub font_face: String,
    pub font_size: u32,
    pub font_style: Option<String>,
    /// Space left below the last stave
    pub bottom_spacing: f64,
    pub tab_stave_lower_spacing: f64,
    pub note_stave_lower_spacing: f64,
    pub scale: f64,
}

impl Default for ArtistOptions {
    fn default() -> Self {
        Self {
            x: 10.0,
            y: 10.0,
            width: 800.0,
            font_face: "Arial".to_string(),
            font_size: 10,
            font_style: None,
            bottom_spacing: 30.0,
            tab_stave_lower_spacing: 10.0,
            note_stave_lower_spacing: 0.0,
            scale: 1.0,
        }
    }
}

// ─── Enumerated option values ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccidentalStrategy {
    /// Mark only changes against the measure's prevailing spelling
    Standard,
    /// Also repeat accidentals already in force, flagged as courtesy marks
    Cautionary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalJustify {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemDirection {
    Up,
    Down,
}

/// General MIDI instruments available to playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    AcousticGrandPiano,
    AcousticGuitarNylon,
    AcousticGuitarSteel,
    ElectricGuitarJazz,
    DistortionGuitar,
    ElectricBassFinger,
    ElectricBassPick,
    Trumpet,
    BrassSection,
    SopranoSax,
    AltoSax,
    TenorSax,
    BaritoneSax,
    Flute,
    SynthDrum,
}

const INSTRUMENTS: [(&str, Instrument, u8); 15] = [
    ("acoustic_grand_piano", Instrument::AcousticGrandPiano, 0),
    ("acoustic_guitar_nylon", Instrument::AcousticGuitarNylon, 24),
    ("acoustic_guitar_steel", Instrument::AcousticGuitarSteel, 25),
    ("electric_guitar_jazz", Instrument::ElectricGuitarJazz, 26),
    ("distortion_guitar", Instrument::DistortionGuitar, 30),
    ("electric_bass_finger", Instrument::ElectricBassFinger, 33),
    ("electric_bass_pick", Instrument::ElectricBassPick, 34),
    ("trumpet", Instrument::Trumpet, 56),
    ("brass_section", Instrument::BrassSection, 61),
    ("soprano_sax", Instrument::SopranoSax, 64),
    ("alto_sax", Instrument::AltoSax, 65),
    ("tenor_sax", Instrument::TenorSax, 66),
    ("baritone_sax", Instrument::BaritoneSax, 67),
    ("flute", Instrument::Flute, 73),
    ("synth_drum", Instrument::SynthDrum, 118),
];

impl Instrument {
    /// General MIDI program number.
    pub fn program(self) -> u8 {
        INSTRUMENTS
            .iter()
            .find(|(_, i, _)| *i == self)
            .map_or(0, |(_, _, p)| *p)
    }

    pub fn name(self) -> &'static str {
        INSTRUMENTS
            .iter()
            .find(|(_, i, _)| *i == self)
            .map_or("acoustic_grand_piano", |(n, _, _)| n)
    }
}

impl FromStr for Instrument {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        INSTRUMENTS
            .iter()
            .find(|(name, _, _)| *name == s)
            .map(|(_, i, _)| *i)
            .ok_or_else(|| CompileError::config(format!("Invalid instrument: {s}")))
    }
}

// ─── Global customizations ──────────────────────────────────────────

/// Score-wide options settable by `options` directives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customizations {
    pub font_face: String,
    pub font_size: u32,
    pub font_style: Option<String>,
    /// Default placement of text annotations
    pub annotation_position: VerticalJustify,
    pub scale: f64,
    pub width: f64,
    /// Extra space below each notation stave
    pub stave_distance: f64,
    /// Extra space added each time options are set
    pub space: f64,
    pub player: bool,
    pub tempo: u32,
    pub instrument: Instrument,
    pub accidentals: AccidentalStrategy,
    pub tab_stems: bool,
    pub tab_stem_direction: StemDirection,
    pub beam_rests: bool,
    pub beam_stemlets: bool,
    pub beam_middle_only: bool,
    /// Gap between the stave connector and the staves
    pub connector_space: f64,
}

impl Customizations {
    pub fn new(options: &ArtistOptions) -> Self {
        Self {
            font_face: options.font_face.clone(),
            font_size: options.font_size,
            font_style: options.font_style.clone(),
            annotation_position: VerticalJustify::Bottom,
            scale: options.scale,
            width: options.width,
            stave_distance: 0.0,
            space: 0.0,
            player: false,
            tempo: 120,
            instrument: Instrument::AcousticGrandPiano,
            accidentals: AccidentalStrategy::Standard,
            tab_stems: false,
            tab_stem_direction: StemDirection::Up,
            beam_rests: true,
            beam_stemlets: true,
            beam_middle_only: false,
            connector_space: 5.0,
        }
    }

    /// Set one option by its directive key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "font-face" => self.font_face = value.to_string(),
            "font-size" => self.font_size = parse_value(key, value)?,
            "font-style" => {
                self.font_style = match value {
                    "" | "none" => None,
                    v => Some(v.to_string()),
                }
            }
            "annotation-position" => {
                self.annotation_position = match value {
                    "top" => VerticalJustify::Top,
                    "bottom" => VerticalJustify::Bottom,
                    _ => return Err(invalid_value(key, value)),
                }
            }
            "scale" => self.scale = parse_value(key, value)?,
            "width" => self.width = parse_value(key, value)?,
            "stave-distance" => self.stave_distance = parse_value(key, value)?,
            "space" => self.space = parse_value(key, value)?,
            "player" => self.player = parse_bool(key, value)?,
            "tempo" => self.tempo = parse_value(key, value)?,
            "instrument" => self.instrument = value.parse()?,
            "accidentals" => {
                self.accidentals = match value {
                    "standard" => AccidentalStrategy::Standard,
                    "cautionary" => AccidentalStrategy::Cautionary,
                    _ => return Err(invalid_value(key, value)),
                }
            }
            "tab-stems" => self.tab_stems = parse_bool(key, value)?,
            "tab-stem-direction" => {
                self.tab_stem_direction = match value {
                    "up" => StemDirection::Up,
                    "down" => StemDirection::Down,
                    _ => return Err(invalid_value(key, value)),
                }
            }
            "beam-rests" => self.beam_rests = parse_bool(key, value)?,
            "beam-stemlets" => self.beam_stemlets = parse_bool(key, value)?,
            "beam-middle-only" => self.beam_middle_only = parse_bool(key, value)?,
            "connector-space" => self.connector_space = parse_value(key, value)?,
            _ => return Err(CompileError::config(format!("Invalid option '{key}'"))),
        }
        Ok(())
    }
}

fn invalid_value(key: &str, value: &str) -> CompileError {
    CompileError::config(format!("Invalid value for option '{key}': {value}"))
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| invalid_value(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid_value(key, value)),
    }
}

// ─── Stave declarations ─────────────────────────────────────────────

/// Which declaration opened a stave; decides the visibility defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaveKind {
    /// `stave`: notation only
    Notation,
    /// `tabstave`: tablature only
    Tablature,
    /// A voice declared before any stave: both
    Implicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    Treble,
    Bass,
    Tenor,
    Alto,
    Percussion,
}

impl fmt::Display for Clef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
            Clef::Tenor => "tenor",
            Clef::Alto => "alto",
            Clef::Percussion => "percussion",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoicePlacement {
    Top,
    Bottom,
    New,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaveConfig {
    pub notation: bool,
    pub tablature: bool,
    pub tuning: Tuning,
    /// `None` when declared as `clef=none`
    pub clef: Option<Clef>,
    pub key: String,
    pub time: Option<TimeSignature>,
    pub strings: u32,
    pub voice: Option<VoicePlacement>,
}

impl StaveConfig {
    pub fn defaults(kind: StaveKind) -> Self {
        Self {
            notation: kind != StaveKind::Tablature,
            tablature: kind != StaveKind::Notation,
            tuning: Tuning::default(),
            clef: Some(Clef::Treble),
            key: "C".to_string(),
            time: None,
            strings: 6,
            voice: None,
        }
    }

    /// Validate declaration options over the defaults for `kind`. Errors
    /// carry the offending option's location.
    pub fn from_options(kind: StaveKind, options: &[OptionEntry]) -> Result<Self> {
        let mut config = Self::defaults(kind);
        let mut visibility_option: Option<&OptionEntry> = None;

        for option in options {
            config
                .apply(option)
                .map_err(|e| e.at_opt(option.line, option.column))?;
            if option.key == "notation" || option.key == "tablature" {
                visibility_option = Some(option);
            }
        }

        if !config.notation && !config.tablature {
            let err =
                CompileError::config("Both 'notation' and 'tablature' can't be invisible");
            return Err(match visibility_option {
                Some(opt) => err.at_opt(opt.line, opt.column),
                None => err,
            });
        }
        Ok(config)
    }

    fn apply(&mut self, option: &OptionEntry) -> Result<()> {
        let value = option.value.as_str();
        match option.key.as_str() {
            "notation" | "tablature" => {
                let visible = match value {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(CompileError::config(format!(
                            "'{}' must be 'true' or 'false'",
                            option.key
                        )))
                    }
                };
                if option.key == "notation" {
                    self.notation = visible;
                } else {
                    self.tablature = visible;
                }
            }
            "key" => {
                if !has_key_signature(value) {
                    return Err(CompileError::config(format!(
                        "Invalid key signature '{value}'"
                    )));
                }
                self.key = value.to_string();
            }
            "clef" => {
                self.clef = match value {
                    "treble" => Some(Clef::Treble),
                    "bass" => Some(Clef::Bass),
                    "tenor" => Some(Clef::Tenor),
                    "alto" => Some(Clef::Alto),
                    "percussion" => Some(Clef::Percussion),
                    "none" => None,
                    _ => {
                        return Err(CompileError::config(
                            "'clef' must be one of treble, bass, tenor, alto, percussion, none",
                        ))
                    }
                };
            }
            "voice" => {
                self.voice = Some(match value {
                    "top" => VoicePlacement::Top,
                    "bottom" => VoicePlacement::Bottom,
                    "new" => VoicePlacement::New,
                    _ => {
                        return Err(CompileError::config(
                            "'voice' must be one of top, bottom, new",
                        ))
                    }
                });
            }
            "time" => {
                self.time = Some(value.parse().map_err(|_| {
                    CompileError::config(format!("Invalid time signature: '{value}'"))
                })?);
            }
            "tuning" => {
                self.tuning = Tuning::parse(value)
                    .map_err(|_| CompileError::config(format!("Invalid tuning: '{value}'")))?;
            }
            "strings" => {
                let strings = value.trim().parse::<u32>().map_err(|_| {
                    CompileError::config(format!("Invalid number of strings: {value}"))
                })?;
                if !(4..=8).contains(&strings) {
                    return Err(CompileError::config(format!(
                        "Invalid number of strings: {strings}"
                    )));
                }
                self.strings = strings;
            }
            other => return Err(CompileError::config(format!("Invalid option '{other}'"))),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Location};

    fn opt(key: &str, value: &str) -> OptionEntry {
        OptionEntry {
            key: key.to_string(),
            value: value.to_string(),
            line: Some(2),
            column: Some(11),
        }
    }

    #[test]
    fn customizations_start_from_artist_options() {
        let c = Customizations::new(&ArtistOptions::default());
        assert_eq!(c.font_face, "Arial");
        assert_eq!(c.width, 800.0);
        assert_eq!(c.accidentals, AccidentalStrategy::Standard);
        assert!(c.beam_rests);
        assert!(!c.tab_stems);
    }

    #[test]
    fn set_typed_options() {
        let mut c = Customizations::new(&ArtistOptions::default());
        c.set("tab-stems", "true").unwrap();
        c.set("tempo", "90").unwrap();
        c.set("accidentals", "cautionary").unwrap();
        c.set("instrument", "acoustic_guitar_steel").unwrap();
        assert!(c.tab_stems);
        assert_eq!(c.tempo, 90);
        assert_eq!(c.accidentals, AccidentalStrategy::Cautionary);
        assert_eq!(c.instrument.program(), 25);
    }

    #[test]
    fn unknown_option_and_bad_values_are_config_errors() {
        let mut c = Customizations::new(&ArtistOptions::default());
        let err = c.set("colour", "red").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert_eq!(err.message, "Invalid option 'colour'");
        assert!(c.set("accidentals", "loud").is_err());
        assert!(c.set("player", "yes").is_err());
        assert!(c.set("instrument", "kazoo").is_err());
    }

    #[test]
    fn stave_kind_sets_visibility_defaults() {
        let tab = StaveConfig::from_options(StaveKind::Tablature, &[]).unwrap();
        assert!(tab.tablature && !tab.notation);
        let stave = StaveConfig::from_options(StaveKind::Notation, &[]).unwrap();
        assert!(stave.notation && !stave.tablature);
        let both = StaveConfig::from_options(StaveKind::Implicit, &[]).unwrap();
        assert!(both.notation && both.tablature);
    }

    #[test]
    fn stave_options_are_validated() {
        let config = StaveConfig::from_options(
            StaveKind::Tablature,
            &[
                opt("notation", "true"),
                opt("key", "Bb"),
                opt("clef", "none"),
                opt("time", "6/8"),
                opt("strings", "4"),
                opt("tuning", "G/3,D/3,A/2,E/2"),
            ],
        )
        .unwrap();
        assert!(config.notation);
        assert_eq!(config.key, "Bb");
        assert_eq!(config.clef, None);
        assert_eq!(config.strings, 4);
        assert_eq!(config.tuning.num_strings(), 4);
    }

    #[test]
    fn invalid_stave_options_carry_their_location() {
        let err = StaveConfig::from_options(StaveKind::Tablature, &[opt("key", "H")]).unwrap_err();
        assert_eq!(err.message, "Invalid key signature 'H'");
        assert_eq!(err.location, Some(Location { line: 2, column: 11 }));

        assert!(StaveConfig::from_options(StaveKind::Tablature, &[opt("strings", "9")]).is_err());
        assert!(StaveConfig::from_options(StaveKind::Tablature, &[opt("clef", "soprano")]).is_err());
        assert!(StaveConfig::from_options(StaveKind::Tablature, &[opt("voice", "middle")]).is_err());
        assert!(StaveConfig::from_options(StaveKind::Tablature, &[opt("bogus", "1")]).is_err());
    }

    #[test]
    fn both_views_hidden_is_rejected() {
        let err = StaveConfig::from_options(
            StaveKind::Implicit,
            &[opt("notation", "false"), opt("tablature", "false")],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert_eq!(err.message, "Both 'notation' and 'tablature' can't be invisible");
    }
}
