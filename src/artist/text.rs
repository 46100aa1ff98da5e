//! Text voices: lyrics, chord names and free-floating labels under a stave.

use log::debug;

use super::Artist;
use crate::duration::Ticks;
use crate::error::{CompileError, Result};
use crate::markup::FontSpec;
use crate::note::{TextJustification, TextNote};

impl Artist {
    /// Start a new text voice on the active stave.
    pub fn add_text_voice(&mut self) -> Result<()> {
        self.stave_mut()?.text_voices.push(Vec::new());
        Ok(())
    }

    /// Switch the text font (`Face-Size-Style`). Specs that don't match the
    /// pattern are ignored.
    pub fn set_text_font(&mut self, spec: &str) -> Result<()> {
        if let Some(font) = FontSpec::parse(spec)? {
            debug!("text font {font:?}");
            let c = &mut self.score.customizations;
            c.font_face = font.family;
            c.font_size = font.size;
            c.font_style = font.style;
        }
        Ok(())
    }

    /// Append a text note to the last text voice. Text starting with `#`
    /// names a glyph.
    pub fn add_text_note(
        &mut self,
        text: &str,
        line: i32,
        justification: TextJustification,
        smooth: bool,
        ignore_ticks: bool,
    ) -> Result<()> {
        let note = TextNote {
            text: text.to_string(),
            glyph: text.strip_prefix('#').map(str::to_string),
            duration: self.duration,
            font: self.annotation_font(),
            line,
            justification,
            smooth,
            ignore_ticks,
            tick_multiplier: Ticks::from_integer(1),
        };

        let voice = self.stave_mut()?.text_voices.last_mut().ok_or_else(|| {
            CompileError::structural("Can't add text note without text voice")
        })?;
        voice.push(note);
        Ok(())
    }
}
