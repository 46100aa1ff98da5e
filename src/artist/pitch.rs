//! Fret/string and pitch-letter resolution into engraved and playable pitches.

use log::trace;
use serde::Serialize;

use super::Artist;
use crate::config::AccidentalStrategy;
use crate::error::{CompileError, Result};
use crate::input::{AbcPitch, NoteEntry};
use crate::key_manager::SelectedNote;
use crate::music::{Accidental, Letter, NoteName, Pitch};
use crate::tuning::Fret;

/// An accidental to draw on an engraved key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccidentalMark {
    pub accidental: Accidental,
    /// Courtesy mark that doesn't alter the pitch
    pub cautionary: bool,
}

/// One resolved chord position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchBinding {
    /// Pitch as engraved, spelled for the key
    pub key: Pitch,
    /// Pitch to sound, with the octave shift applied
    pub play_note: Pitch,
    pub accidental: Option<AccidentalMark>,
    /// Fret shown on tablature (muted for pitch-letter entries without one)
    pub fret: Fret,
}

impl Artist {
    /// Resolve one chord entry. Fret entries go through the tuning and the
    /// key manager; pitch-letter entries keep their literal spelling.
    pub(super) fn resolve_entry(&mut self, entry: &NoteEntry) -> Result<PitchBinding> {
        if let Some(abc) = &entry.abc {
            let octave = match (entry.octave, entry.string) {
                (Some(octave), _) => octave,
                (None, Some(string)) => i32::try_from(string).map_err(|_| {
                    CompileError::resolution(format!("Invalid octave: {string}"))
                })?,
                (None, None) => {
                    return Err(CompileError::resolution(format!(
                        "No octave for note '{}'",
                        abc.key
                    )))
                }
            };
            return self.resolve_abc(abc, octave, entry.fret.unwrap_or(Fret::Muted));
        }

        match (entry.fret, entry.string) {
            (Some(Fret::Number(fret)), Some(string)) => self.resolve_fret(fret, string),
            (Some(Fret::Muted), Some(_)) => Err(CompileError::resolution(
                "Muted strings need an explicit pitch",
            )),
            (Some(_), None) => Err(CompileError::resolution("No string specified")),
            (None, _) => Err(CompileError::resolution("No note specified")),
        }
    }

    /// Spell the pitch at `fret` on `string` for the current key and
    /// measure.
    pub fn resolve_fret(&mut self, fret: u32, string: u32) -> Result<PitchBinding> {
        let raw = self.tuning.note_for_fret(fret, string)?;
        let selected = self.key_manager.select_note(raw.name);
        let accidental = accidental_mark(self.score.customizations.accidentals, &selected);

        let mut octave = raw.octave;
        match (raw.name.letter, selected.note.letter) {
            (Letter::C, Letter::B) => octave -= 1,
            (Letter::B, Letter::C) => octave += 1,
            _ => {}
        }

        let binding = PitchBinding {
            key: Pitch::new(selected.note, octave),
            play_note: Pitch::new(raw.name, self.shifted(raw.octave)?),
            accidental,
            fret: Fret::Number(fret),
        };
        trace!(
            "fret {fret} string {string}: {} (plays {})",
            binding.key,
            binding.play_note
        );
        Ok(binding)
    }

    fn shifted(&self, octave: i32) -> Result<i32> {
        octave.checked_add(self.octave_shift).ok_or_else(|| {
            CompileError::resolution(format!(
                "Invalid octave: {octave} shifted by {}",
                self.octave_shift
            ))
        })
    }

    fn resolve_abc(&mut self, abc: &AbcPitch, octave: i32, fret: Fret) -> Result<PitchBinding> {
        let letter = abc
            .key
            .chars()
            .next()
            .and_then(Letter::from_char)
            .ok_or_else(|| CompileError::resolution(format!("Invalid note: '{}'", abc.key)))?;
        let accidental = match abc.accidental.as_deref() {
            None | Some("") => None,
            Some(symbol) => Some(symbol.parse::<Accidental>()?),
        };
        let name = NoteName { letter, accidental };

        // Keeps the measure's accidental memory in step with fret entries.
        self.key_manager.select_note(name);

        let played = NoteName {
            letter,
            accidental: accidental.filter(|a| *a != Accidental::Natural),
        };
        Ok(PitchBinding {
            key: Pitch::new(name.normalized(), octave),
            play_note: Pitch::new(played, self.shifted(octave)?),
            accidental: accidental.map(|accidental| AccidentalMark {
                accidental,
                cautionary: abc.accidental_type.as_deref() == Some("c"),
            }),
            fret,
        })
    }
}

fn accidental_mark(strategy: AccidentalStrategy, selected: &SelectedNote) -> Option<AccidentalMark> {
    if selected.change {
        return Some(AccidentalMark {
            accidental: selected.accidental.unwrap_or(Accidental::Natural),
            cautionary: false,
        });
    }
    match strategy {
        AccidentalStrategy::Standard => None,
        AccidentalStrategy::Cautionary => selected.accidental.map(|accidental| AccidentalMark {
            accidental,
            cautionary: true,
        }),
    }
}
