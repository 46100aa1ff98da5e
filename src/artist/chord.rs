//! Grouping chord entries into vertical positions and emitting notes.

use log::{debug, trace};

use super::pitch::AccidentalMark;
use super::Artist;
use crate::duration::{Duration, Ticks};
use crate::error::Result;
use crate::input::{ArticulationTag, DecoratorTag, NoteEntry};
use crate::markup::Position;
use crate::music::Pitch;
use crate::note::{Modifier, StaveNote, TabNote, TabPosition, Tickable};

/// Everything collected for one vertical position of a chord.
#[derive(Debug, Default)]
struct Slot {
    keys: Vec<Pitch>,
    play_notes: Vec<Pitch>,
    accidentals: Vec<Option<AccidentalMark>>,
    positions: Vec<TabPosition>,
    /// One entry per position, aligned with `positions`
    articulations: Vec<Option<ArticulationTag>>,
    decorator: Option<DecoratorTag>,
    duration: Option<Duration>,
}

impl Artist {
    /// Add a chord event.
    ///
    /// Entries on the same string as the previous entry start a new
    /// position (a melodic line on that string); entries on other strings,
    /// or with an explicit pitch letter, restart at the first position.
    pub fn add_chord(
        &mut self,
        chord: &[NoteEntry],
        articulation: Option<ArticulationTag>,
        decorator: Option<DecoratorTag>,
    ) -> Result<()> {
        let Some(first) = chord.first() else {
            return Ok(());
        };
        self.stave_index()?;
        trace!("add chord of {} entries", chord.len());

        let mut slots: Vec<Slot> = Vec::new();
        let mut current_string = first.string;
        let mut position = 0;

        for entry in chord {
            if entry.abc.is_some() || entry.string != current_string {
                position = 0;
                current_string = entry.string;
            }
            if slots.len() <= position {
                slots.push(Slot::default());
            }

            let binding = self.resolve_entry(entry)?;
            let duration = match &entry.time {
                Some(time) => Some(Duration::parse(time, entry.dot)?),
                None => None,
            };

            let slot = &mut slots[position];
            slot.keys.push(binding.key);
            slot.play_notes.push(binding.play_note);
            slot.accidentals.push(binding.accidental);
            slot.positions.push(TabPosition {
                fret: binding.fret,
                string: entry.string.unwrap_or_default(),
            });
            slot.articulations.push(entry.articulation);
            slot.duration = duration;
            if entry.decorator.is_some() {
                slot.decorator = entry.decorator;
            }

            position += 1;
        }

        for slot in slots {
            let saved = self.duration;
            if let Some(duration) = slot.duration {
                self.duration = duration;
            }
            let emitted = self.emit_slot(&slot);
            self.duration = saved;
            emitted?;
        }

        if let Some(tag) = articulation {
            let tags = vec![Some(tag); chord.len()];
            self.add_articulations(&tags)?;
        }
        if let Some(decorator) = decorator {
            self.add_decorator(decorator)?;
        }
        Ok(())
    }

    /// Add a single note; the same as a one-entry chord.
    pub fn add_note(&mut self, note: &NoteEntry) -> Result<()> {
        self.add_chord(std::slice::from_ref(note), None, None)
    }

    fn emit_slot(&mut self, slot: &Slot) -> Result<()> {
        let duration = self.duration;
        let stem = self.score.customizations.tab_stems;
        let clef = self.clef;

        let stave = self.stave_mut()?;
        stave.tab_notes.push(Tickable::Tab(TabNote {
            positions: slot.positions.clone(),
            duration,
            play_notes: slot.play_notes.clone(),
            stem,
            ghost: false,
            tick_multiplier: Ticks::from_integer(1),
            modifiers: Vec::new(),
        }));

        if stave.notation.is_some() {
            let mut note = Tickable::Stave(StaveNote {
                keys: slot.keys.clone(),
                duration,
                rest: false,
                clef,
                auto_stem: true,
                play_notes: slot.play_notes.clone(),
                tick_multiplier: Ticks::from_integer(1),
                modifiers: Vec::new(),
            });
            for (index, mark) in slot.accidentals.iter().enumerate() {
                if let Some(mark) = mark {
                    note.add_modifier(
                        index,
                        Modifier::Accidental {
                            accidental: mark.accidental,
                            cautionary: mark.cautionary,
                        },
                    );
                }
            }
            stave.note_notes.push(note);
        }

        self.add_articulations(&slot.articulations)?;
        if let Some(decorator) = slot.decorator {
            self.add_decorator(decorator)?;
        }
        Ok(())
    }

    /// Attach a decorator to the last note written.
    pub fn add_decorator(&mut self, decorator: DecoratorTag) -> Result<()> {
        debug!("add decorator {decorator:?}");
        let (tab_modifier, score_modifier) = match decorator {
            DecoratorTag::Vibrato => (Modifier::Vibrato { harsh: false }, None),
            DecoratorTag::HarshVibrato => (Modifier::Vibrato { harsh: true }, None),
            DecoratorTag::UpStroke => {
                let mark = stroke_mark("a|");
                (mark.clone(), Some(mark))
            }
            DecoratorTag::DownStroke => {
                let mark = stroke_mark("am");
                (mark.clone(), Some(mark))
            }
        };

        let stave = self.stave_mut()?;
        if let Some(note) = stave.tab_notes.last_mut() {
            note.add_modifier(0, tab_modifier);
        }
        if let (Some(modifier), Some(note)) = (score_modifier, stave.note_notes.last_mut()) {
            note.add_modifier(0, modifier);
        }
        Ok(())
    }
}

fn stroke_mark(code: &str) -> Modifier {
    Modifier::Articulation {
        code: code.to_string(),
        position: Position::Below,
    }
}
