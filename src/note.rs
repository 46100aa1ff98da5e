//! Abstract note and modifier objects handed to the layout engine.

use serde::Serialize;

use crate::config::{Clef, VerticalJustify};
use crate::duration::{Duration, Ticks};
use crate::markup::{FontSpec, Position, StrokeKind};
use crate::music::{Accidental, Pitch};
use crate::tuning::Fret;

/// A fret on a string (strings are 1-based, highest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TabPosition {
    pub fret: Fret,
    pub string: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BendDirection {
    Up,
    Down,
}

/// One transition of a bend phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BendStep {
    pub direction: BendDirection,
    /// Interval label (`1/2`, `Full`, ...); empty for releases
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub font: FontSpec,
    pub justify: VerticalJustify,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Modifier {
    /// A whole bend phrase, drawn from the anchor note
    Bend { phrase: Vec<BendStep> },
    Vibrato { harsh: bool },
    /// Glyph articulation such as `a>` or the stroke marks `a|`/`am`
    Articulation { code: String, position: Position },
    Annotation(Annotation),
    Stroke { kind: StrokeKind },
    Accidental { accidental: Accidental, cautionary: bool },
    Fingering { label: String, position: Position },
    StringNumber { label: String, position: Position },
}

/// A modifier attached to one key/position of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attached {
    pub index: usize,
    pub modifier: Modifier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabNote {
    pub positions: Vec<TabPosition>,
    pub duration: Duration,
    /// Pitches to sound, shifted by the octave shift in force
    pub play_notes: Vec<Pitch>,
    /// Drawn with a stem (`tab-stems`)
    pub stem: bool,
    /// Hidden because a bend phrase on an earlier note covers it
    pub ghost: bool,
    pub tick_multiplier: Ticks,
    pub modifiers: Vec<Attached>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaveNote {
    /// Engraved keys
    pub keys: Vec<Pitch>,
    pub duration: Duration,
    pub rest: bool,
    pub clef: Clef,
    pub auto_stem: bool,
    pub play_notes: Vec<Pitch>,
    pub tick_multiplier: Ticks,
    pub modifiers: Vec<Attached>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BarType {
    Single,
    Double,
    End,
    RepeatBegin,
    RepeatEnd,
    RepeatBoth,
}

impl BarType {
    /// Unknown or missing names fall back to a single bar.
    pub fn from_name(name: Option<&str>) -> BarType {
        match name {
            Some("double") => BarType::Double,
            Some("end") => BarType::End,
            Some("repeat-begin") => BarType::RepeatBegin,
            Some("repeat-end") => BarType::RepeatEnd,
            Some("repeat-both") => BarType::RepeatBoth,
            _ => BarType::Single,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextJustification {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextNote {
    pub text: String,
    /// Named glyph for `#name` tokens
    pub glyph: Option<String>,
    pub duration: Duration,
    pub font: FontSpec,
    /// Vertical line offset below the stave
    pub line: i32,
    pub justification: TextJustification,
    pub smooth: bool,
    pub ignore_ticks: bool,
    pub tick_multiplier: Ticks,
}

/// Anything that occupies a slot in a voice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Tickable {
    Tab(TabNote),
    Stave(StaveNote),
    Bar { bar_type: BarType },
    /// Invisible spacer taking up time
    Ghost { duration: Duration, tick_multiplier: Ticks },
    Text(TextNote),
}

impl Tickable {
    pub fn ghost(duration: Duration) -> Self {
        Tickable::Ghost {
            duration,
            tick_multiplier: Ticks::from_integer(1),
        }
    }

    pub fn ignores_ticks(&self) -> bool {
        match self {
            Tickable::Bar { .. } => true,
            Tickable::Text(t) => t.ignore_ticks,
            _ => false,
        }
    }

    pub fn ticks(&self) -> Ticks {
        match self {
            Tickable::Tab(n) => n.duration.ticks() * n.tick_multiplier,
            Tickable::Stave(n) => n.duration.ticks() * n.tick_multiplier,
            Tickable::Ghost {
                duration,
                tick_multiplier,
            } => duration.ticks() * *tick_multiplier,
            Tickable::Text(t) if !t.ignore_ticks => t.duration.ticks() * t.tick_multiplier,
            Tickable::Text(_) | Tickable::Bar { .. } => Ticks::from_integer(0),
        }
    }

    /// Scale this slot's duration (tuplets).
    pub fn apply_tick_multiplier(&mut self, factor: Ticks) {
        match self {
            Tickable::Tab(n) => n.tick_multiplier *= factor,
            Tickable::Stave(n) => n.tick_multiplier *= factor,
            Tickable::Ghost {
                tick_multiplier, ..
            } => *tick_multiplier *= factor,
            Tickable::Text(t) => t.tick_multiplier *= factor,
            Tickable::Bar { .. } => {}
        }
    }

    pub fn add_modifier(&mut self, index: usize, modifier: Modifier) {
        match self {
            Tickable::Tab(n) => n.modifiers.push(Attached { index, modifier }),
            Tickable::Stave(n) => n.modifiers.push(Attached { index, modifier }),
            _ => {}
        }
    }

    pub fn modifiers(&self) -> &[Attached] {
        match self {
            Tickable::Tab(n) => &n.modifiers,
            Tickable::Stave(n) => &n.modifiers,
            _ => &[],
        }
    }

    /// A pitched tab note that is still visible.
    pub fn is_live_tab_note(&self) -> bool {
        matches!(self, Tickable::Tab(n) if !n.ghost)
    }

    pub fn as_tab(&self) -> Option<&TabNote> {
        match self {
            Tickable::Tab(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_stave(&self) -> Option<&StaveNote> {
        match self {
            Tickable::Stave(n) => Some(n),
            _ => None,
        }
    }

    /// Number of keys or positions modifiers can be attached to.
    pub fn key_count(&self) -> usize {
        match self {
            Tickable::Tab(n) => n.positions.len(),
            Tickable::Stave(n) => n.keys.len(),
            _ => 0,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Tickable::Ghost { .. } | Tickable::Stave(StaveNote { rest: true, .. }))
    }

    pub fn play_notes(&self) -> &[Pitch] {
        match self {
            Tickable::Tab(n) => &n.play_notes,
            Tickable::Stave(n) if !n.rest => &n.play_notes,
            _ => &[],
        }
    }
}
