//! Flushing staves to a layout engine, and the voices handed to playback.

use log::debug;

use super::Artist;
use crate::layout::{BeamConfig, LayoutEngine, StaveGroup, ViewVoices};
use crate::model::{Score, Stave};
use crate::note::Tickable;
use crate::playback::PlayerData;

impl Artist {
    /// Finish every stave and hand it to `engine`.
    ///
    /// A trailing bar in a voice becomes the stave's end bar. The voices
    /// being built are closed, so rendering again draws the same notes.
    pub fn render(&mut self, engine: &mut dyn LayoutEngine) {
        debug!("render {} staves", self.score.staves.len());
        self.close_bends(1);

        let scale = self.score.customizations.scale;
        engine.prepare(
            self.score.customizations.width * scale,
            (self.last_y + self.options.bottom_spacing) * scale,
            scale,
        );

        let Score {
            staves,
            customizations,
            ..
        } = &mut self.score;

        for (index, stave) in staves.iter_mut().enumerate() {
            finish_stave(stave);

            let group = StaveGroup {
                index,
                tab: stave.tab.as_ref().map(|tab| ViewVoices {
                    stave: tab,
                    voices: stave.tab_voices.iter().map(Vec::as_slice).collect(),
                }),
                notation: stave.notation.as_ref().map(|notation| ViewVoices {
                    stave: notation,
                    voices: stave.note_voices.iter().map(Vec::as_slice).collect(),
                }),
                text_voices: &stave.text_voices,
                beam: BeamConfig::new(customizations, &stave.beam_groups),
            };
            engine.format_and_draw(&group);
        }

        engine.draw_articulations(&self.score);
        self.rendered = true;
    }

    /// Voices to play, per stave: notation voices where the stave has a
    /// notation view, tablature voices otherwise.
    pub fn player_data(&self) -> PlayerData<'_> {
        let voices = self
            .score
            .staves
            .iter()
            .map(|stave| {
                let (closed, current) = if stave.notation.is_some() {
                    (&stave.note_voices, &stave.note_notes)
                } else {
                    (&stave.tab_voices, &stave.tab_notes)
                };
                closed
                    .iter()
                    .map(Vec::as_slice)
                    .chain(std::iter::once(current.as_slice()))
                    .filter(|voice| !voice.is_empty())
                    .collect()
            })
            .collect();

        PlayerData {
            voices,
            scale: self.score.customizations.scale,
        }
    }
}

fn finish_stave(stave: &mut Stave) {
    if let Some(Tickable::Bar { bar_type }) = stave.tab_notes.last() {
        let bar_type = *bar_type;
        stave.tab_notes.pop();
        if let Some(tab) = stave.tab.as_mut() {
            tab.end_bar = Some(bar_type);
        }
    }
    if let Some(Tickable::Bar { bar_type }) = stave.note_notes.last() {
        let bar_type = *bar_type;
        stave.note_notes.pop();
        if let Some(notation) = stave.notation.as_mut() {
            notation.end_bar = Some(bar_type);
        }
    }
    stave.close_voice();
}
