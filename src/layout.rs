//! Interface to the layout engine.
//!
//! The compiler never positions glyphs itself. At render time it hands each
//! stave's voices to a [`LayoutEngine`], which formats ticks, beams and
//! draws; score-level links are handed over once every stave is done.

use crate::config::{Customizations, StemDirection};
use crate::duration::BeamGroup;
use crate::model::{NotationStave, Score, TabStave};
use crate::note::{TextNote, Tickable};

/// Beaming policy for one stave.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamConfig {
    pub beam_rests: bool,
    pub show_stemlets: bool,
    pub beam_middle_only: bool,
    pub groups: Vec<BeamGroup>,
    /// Stems (and so beams) are drawn on tablature too
    pub tab_stems: bool,
    pub tab_stem_direction: StemDirection,
}

impl BeamConfig {
    pub fn new(customizations: &Customizations, groups: &[BeamGroup]) -> Self {
        Self {
            beam_rests: customizations.beam_rests,
            show_stemlets: customizations.beam_stemlets,
            beam_middle_only: customizations.beam_middle_only,
            groups: groups.to_vec(),
            tab_stems: customizations.tab_stems,
            tab_stem_direction: customizations.tab_stem_direction,
        }
    }
}

/// The voices of one view of a stave.
#[derive(Debug, Clone)]
pub struct ViewVoices<'a, S> {
    pub stave: &'a S,
    pub voices: Vec<&'a [Tickable]>,
}

/// Everything the engine needs to format and draw one stave.
#[derive(Debug, Clone)]
pub struct StaveGroup<'a> {
    pub index: usize,
    pub tab: Option<ViewVoices<'a, TabStave>>,
    pub notation: Option<ViewVoices<'a, NotationStave>>,
    pub text_voices: &'a [Vec<TextNote>],
    pub beam: BeamConfig,
}

pub trait LayoutEngine {
    /// Size the drawing surface before any stave is drawn.
    fn prepare(&mut self, width: f64, height: f64, scale: f64);

    /// Format and draw one stave with all of its voices.
    fn format_and_draw(&mut self, group: &StaveGroup<'_>);

    /// Draw score-level links (ties, slides, tuplets) after every stave.
    fn draw_articulations(&mut self, score: &Score);
}
