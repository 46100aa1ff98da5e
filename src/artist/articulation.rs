//! Linking articulations between a note and the previous pitched note.

use log::{debug, warn};

use super::Artist;
use crate::config::VerticalJustify;
use crate::duration::Ticks;
use crate::error::{CompileError, Result};
use crate::input::ArticulationTag;
use crate::model::{Link, NotationArticulation, TabArticulation, Tuplet};
use crate::note::{Annotation, Modifier, TabPosition, Tickable};

/// Tuplets always fit their notes into the time of two.
const TUPLET_OCCUPIED: u32 = 2;

/// Index lists of the positions an articulation connects.
struct Span {
    prev: usize,
    prev_indices: Vec<usize>,
    current_indices: Vec<usize>,
}

impl Artist {
    /// Attach per-position articulation tags to the last written note.
    ///
    /// `tags` is aligned with the note's positions. A call without any tag
    /// closes an open bend chain; so does any call without a bend tag.
    pub fn add_articulations(&mut self, tags: &[Option<ArticulationTag>]) -> Result<()> {
        let empty = self.stave()?.tab_notes.is_empty();
        if empty || tags.iter().all(Option::is_none) {
            self.close_bends(0);
            return Ok(());
        }

        let mut has_bends = false;
        for tag in ArticulationTag::ALL {
            let indices: Vec<usize> = tags
                .iter()
                .enumerate()
                .filter(|(_, t)| **t == Some(tag))
                .map(|(i, _)| i)
                .collect();
            if indices.is_empty() {
                continue;
            }
            if tag == ArticulationTag::Bend {
                has_bends = true;
            }
            self.link(tag, &indices)?;
        }

        if !has_bends {
            self.close_bends(0);
        }
        Ok(())
    }

    fn link(&mut self, tag: ArticulationTag, indices: &[usize]) -> Result<()> {
        debug!("link {tag:?} on positions {indices:?}");
        let span = self.span(indices)?;
        let (has_tab, has_notation) = {
            let stave = self.stave()?;
            (stave.tab.is_some(), stave.notation.is_some())
        };

        match tag {
            ArticulationTag::Vibrato | ArticulationTag::HarshVibrato => {
                let harsh = tag == ArticulationTag::HarshVibrato;
                if let Some(note) = self.stave_mut()?.tab_notes.last_mut() {
                    note.add_modifier(0, Modifier::Vibrato { harsh });
                }
                return Ok(());
            }
            ArticulationTag::Tap if has_tab => {
                let font = self.annotation_font();
                if let Some(note) = self.stave_mut()?.tab_notes.last_mut() {
                    note.add_modifier(
                        0,
                        Modifier::Annotation(Annotation {
                            text: "T".to_string(),
                            font,
                            justify: VerticalJustify::Top,
                        }),
                    );
                }
            }
            _ => {}
        }

        let Some(span) = span else {
            warn!("{tag:?} has no previous note to connect to");
            return Ok(());
        };
        if span.prev_indices.is_empty() && span.current_indices.is_empty() {
            return Ok(());
        }

        if has_tab {
            self.add_tab_articulation(tag, &span)?;
        }
        if has_notation {
            let current = self.stave()?.note_notes.len().saturating_sub(1);
            if let (Some(first), Some(last)) = (self.note_ref(span.prev), self.note_ref(current)) {
                self.score
                    .notation_articulations
                    .push(NotationArticulation::Tie(Link {
                        first,
                        last,
                        first_indices: span.prev_indices.clone(),
                        last_indices: span.current_indices.clone(),
                    }));
            }
        }
        Ok(())
    }

    fn add_tab_articulation(&mut self, tag: ArticulationTag, span: &Span) -> Result<()> {
        let current = self.stave()?.tab_notes.len().saturating_sub(1);
        let (Some(first), Some(last)) = (self.tab_ref(span.prev), self.tab_ref(current)) else {
            return Ok(());
        };
        let link = Link {
            first,
            last,
            first_indices: span.prev_indices.clone(),
            last_indices: span.current_indices.clone(),
        };

        let articulation = match tag {
            ArticulationTag::Slide => TabArticulation::Slide(link),
            ArticulationTag::HammerOn => TabArticulation::Tie {
                link,
                label: "H".to_string(),
            },
            ArticulationTag::PullOff => TabArticulation::Tie {
                link,
                label: "P".to_string(),
            },
            ArticulationTag::Tap | ArticulationTag::TapTie => TabArticulation::Tie {
                link,
                label: " ".to_string(),
            },
            ArticulationTag::Bend => {
                self.open_bends(span.prev, &span.prev_indices, &span.current_indices)?;
                return Ok(());
            }
            ArticulationTag::Vibrato | ArticulationTag::HarshVibrato => return Ok(()),
        };
        self.score.tab_articulations.push(articulation);
        Ok(())
    }

    /// Positions on the last note and on the previous pitched note that
    /// share a string with the tagged positions.
    fn span(&self, indices: &[usize]) -> Result<Option<Span>> {
        let Some(prev) = self.previous_note_index() else {
            return Ok(None);
        };
        let notes = &self.stave()?.tab_notes;
        let (Some(Tickable::Tab(prev_note)), Some(Tickable::Tab(current))) =
            (notes.get(prev), notes.last())
        else {
            return Ok(None);
        };

        let tagged: Vec<u32> = current
            .positions
            .iter()
            .enumerate()
            .filter(|(i, _)| indices.contains(i))
            .map(|(_, p)| p.string)
            .collect();
        let shared: Vec<u32> = prev_note
            .positions
            .iter()
            .map(|p| p.string)
            .filter(|s| tagged.contains(s))
            .collect();
        let on_shared = |positions: &[TabPosition]| -> Vec<usize> {
            positions
                .iter()
                .enumerate()
                .filter(|(_, p)| shared.contains(&p.string))
                .map(|(i, _)| i)
                .collect()
        };

        Ok(Some(Span {
            prev,
            prev_indices: on_shared(&prev_note.positions),
            current_indices: on_shared(&current.positions),
        }))
    }

    /// Turn the last `notes` (default `tuplets`) notes into a tuplet
    /// sounding `tuplets` notes in the time of two.
    pub fn make_tuplets(&mut self, tuplets: u32, notes: Option<u32>) -> Result<()> {
        let notes = notes.unwrap_or(tuplets);
        debug!("make tuplet {tuplets} over {notes} notes");
        if tuplets == 0 || notes == 0 {
            return Err(CompileError::arity(format!("Invalid tuplet: {tuplets}")));
        }
        let count = usize::try_from(notes).unwrap_or(usize::MAX);
        let tab_stems = self.score.customizations.tab_stems;

        let stave = self.stave()?;
        let has_notation = stave.notation.is_some();
        let available = if has_notation {
            stave.note_notes.len()
        } else {
            stave.tab_notes.len()
        };
        if available < count {
            return Err(CompileError::arity("Not enough notes for tuplet"));
        }
        let tab_start = stave.tab_notes.len().saturating_sub(count);
        let note_start = stave.note_notes.len().saturating_sub(count);

        let factor = Ticks::new(i64::from(TUPLET_OCCUPIED), i64::from(tuplets));
        let stave = self.stave_mut()?;
        for note in &mut stave.tab_notes[tab_start..] {
            note.apply_tick_multiplier(factor);
        }
        for note in &mut stave.note_notes[note_start..] {
            note.apply_tick_multiplier(factor);
        }

        if has_notation {
            let refs = (note_start..note_start + count)
                .filter_map(|i| self.note_ref(i))
                .collect();
            self.score
                .notation_articulations
                .push(NotationArticulation::Tuplet(Tuplet {
                    notes: refs,
                    num_notes: tuplets,
                    notes_occupied: TUPLET_OCCUPIED,
                }));
        }
        if tab_stems {
            let refs = (tab_start..tab_start + count)
                .filter_map(|i| self.tab_ref(i))
                .collect();
            self.score.tab_articulations.push(TabArticulation::Tuplet(Tuplet {
                notes: refs,
                num_notes: tuplets,
                notes_occupied: TUPLET_OCCUPIED,
            }));
        }
        Ok(())
    }
}
