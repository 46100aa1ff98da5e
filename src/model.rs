//! Data model for a compiled score.
//!
//! A score is an ordered list of staves. Each stave pairs an optional
//! tablature view with an optional notation view and holds the voices
//! built for them. Links between notes (ties, slides, tuplets) live at
//! score level and refer to notes through [`NoteRef`].

use serde::Serialize;

use crate::config::{Clef, Customizations};
use crate::duration::{BeamGroup, TimeSignature};
use crate::note::{BarType, TextNote, Tickable};

/// The compiled score.
#[derive(Debug, Clone, Serialize)]
pub struct Score {
    /// Options in force at the end of compilation
    pub customizations: Customizations,
    pub staves: Vec<Stave>,
    /// Links drawn on tablature views
    pub tab_articulations: Vec<TabArticulation>,
    /// Links drawn on notation views
    pub notation_articulations: Vec<NotationArticulation>,
    /// Total height used by the staves so far
    pub height: f64,
}

impl Score {
    pub fn new(customizations: Customizations) -> Self {
        Self {
            customizations,
            staves: Vec::new(),
            tab_articulations: Vec::new(),
            notation_articulations: Vec::new(),
            height: 0.0,
        }
    }

    /// Resolve a reference into a tablature voice.
    pub fn tab_note(&self, note: &NoteRef) -> Option<&Tickable> {
        let stave = self.staves.get(note.stave)?;
        stave.tab_voice(note.voice)?.get(note.index)
    }

    /// Resolve a reference into a notation voice.
    pub fn notation_note(&self, note: &NoteRef) -> Option<&Tickable> {
        let stave = self.staves.get(note.stave)?;
        stave.note_voice(note.voice)?.get(note.index)
    }
}

/// Geometry and decorations of a tablature view.
#[derive(Debug, Clone, Serialize)]
pub struct TabStave {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub num_lines: u32,
    /// Draw the "TAB" glyph at the start
    pub tab_glyph: bool,
    /// Where notes start when there is no notation view to align with
    pub note_start_x: Option<f64>,
    pub end_bar: Option<BarType>,
}

impl TabStave {
    pub fn height(&self) -> f64 {
        (f64::from(self.num_lines) + 4.0) * TAB_LINE_SPACING
    }
}

pub const TAB_LINE_SPACING: f64 = 13.0;
pub const NOTATION_LINE_SPACING: f64 = 10.0;

/// Geometry and decorations of a notation view.
#[derive(Debug, Clone, Serialize)]
pub struct NotationStave {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub clef: Option<Clef>,
    pub key: String,
    pub time: Option<TimeSignature>,
    pub end_bar: Option<BarType>,
}

impl NotationStave {
    pub fn height(&self) -> f64 {
        (5.0 + 4.0) * NOTATION_LINE_SPACING
    }
}

/// One measure-group: tablature and/or notation plus their voices.
#[derive(Debug, Clone, Serialize)]
pub struct Stave {
    pub tab: Option<TabStave>,
    pub notation: Option<NotationStave>,
    /// Closed tablature voices
    pub tab_voices: Vec<Vec<Tickable>>,
    /// Closed notation voices
    pub note_voices: Vec<Vec<Tickable>>,
    /// Tablature voice being built. Always written, even without a
    /// tablature view: it is the timeline articulations are resolved on.
    pub tab_notes: Vec<Tickable>,
    /// Notation voice being built (only written with a notation view)
    pub note_notes: Vec<Tickable>,
    pub text_voices: Vec<Vec<TextNote>>,
    pub beam_groups: Vec<BeamGroup>,
}

impl Stave {
    pub fn new(
        tab: Option<TabStave>,
        notation: Option<NotationStave>,
        beam_groups: Vec<BeamGroup>,
    ) -> Self {
        Self {
            tab,
            notation,
            tab_voices: Vec::new(),
            note_voices: Vec::new(),
            tab_notes: Vec::new(),
            note_notes: Vec::new(),
            text_voices: Vec::new(),
            beam_groups,
        }
    }

    /// Tablature voice `voice`; the current buffer is the one past the
    /// closed voices.
    pub fn tab_voice(&self, voice: usize) -> Option<&[Tickable]> {
        match voice.cmp(&self.tab_voices.len()) {
            std::cmp::Ordering::Less => Some(&self.tab_voices[voice]),
            std::cmp::Ordering::Equal => Some(&self.tab_notes),
            std::cmp::Ordering::Greater => None,
        }
    }

    pub fn note_voice(&self, voice: usize) -> Option<&[Tickable]> {
        match voice.cmp(&self.note_voices.len()) {
            std::cmp::Ordering::Less => Some(&self.note_voices[voice]),
            std::cmp::Ordering::Equal => Some(&self.note_notes),
            std::cmp::Ordering::Greater => None,
        }
    }

    /// Close the current buffers into the voice lists (empty ones are dropped).
    pub fn close_voice(&mut self) {
        if !self.tab_notes.is_empty() {
            self.tab_voices.push(std::mem::take(&mut self.tab_notes));
        }
        if !self.note_notes.is_empty() {
            self.note_voices.push(std::mem::take(&mut self.note_notes));
        }
    }
}

/// Address of a note: stave, voice within that stave, slot within the voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NoteRef {
    pub stave: usize,
    pub voice: usize,
    pub index: usize,
}

/// Two notes connected on matching keys/positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub first: NoteRef,
    pub last: NoteRef,
    pub first_indices: Vec<usize>,
    pub last_indices: Vec<usize>,
}

/// A tuplet bracket over consecutive notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tuplet {
    pub notes: Vec<NoteRef>,
    pub num_notes: u32,
    pub notes_occupied: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TabArticulation {
    Slide(Link),
    /// Hammer-on (`H`), pull-off (`P`) or tap (blank label)
    Tie { link: Link, label: String },
    Tuplet(Tuplet),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotationArticulation {
    Tie(Link),
    Tuplet(Tuplet),
}
