//! The stateful compiler core.
//!
//! An [`Artist`] consumes events one at a time (stave and voice
//! declarations, chords, bars, rests, commands, text) and appends resolved
//! note objects to the active stave. Session state (duration, octave shift,
//! clef, key memory, the open bend chain) is sticky across events until it
//! is overwritten or [`Artist::reset`] is called.

mod annotation;
mod articulation;
mod bend;
mod chord;
mod pitch;
mod render;
mod text;

pub use bend::make_bend;
pub use pitch::{AccidentalMark, PitchBinding};

use log::debug;

use crate::config::{ArtistOptions, Clef, Customizations, StaveConfig, StaveKind};
use crate::duration::{default_beam_groups, Duration};
use crate::error::{CompileError, Result};
use crate::key_manager::KeyManager;
use crate::model::{NotationStave, NoteRef, Score, Stave, TabStave};
use crate::music::{Letter, NoteName, Pitch};
use crate::note::{BarType, StaveNote, Tickable};
use crate::tuning::Tuning;

use bend::BendChain;

/// Notes start this far in on a tablature stave with no notation above it.
const TAB_NOTE_START_X: f64 = 40.0;
/// Extra vertical room reserved for player controls.
const PLAYER_SPACE: f64 = 15.0;

#[derive(Debug, Clone)]
pub struct Artist {
    options: ArtistOptions,
    score: Score,
    tuning: Tuning,
    key_manager: KeyManager,
    /// Index of the active stave
    current: Option<usize>,
    /// Vertical cursor: top of the next stave
    last_y: f64,
    duration: Duration,
    octave_shift: i32,
    clef: Clef,
    bends: BendChain,
    rendered: bool,
}

impl Default for Artist {
    fn default() -> Self {
        Self::new(ArtistOptions::default())
    }
}

impl Artist {
    pub fn new(options: ArtistOptions) -> Self {
        let score = Score::new(Customizations::new(&options));
        let last_y = options.y;
        Self {
            options,
            score,
            tuning: Tuning::default(),
            key_manager: KeyManager::default(),
            current: None,
            last_y,
            duration: Duration::default(),
            octave_shift: 0,
            clef: Clef::Treble,
            bends: BendChain::default(),
            rendered: false,
        }
    }

    /// Discard everything built so far and restore the initial state.
    pub fn reset(&mut self) {
        let options = self.options.clone();
        *self = Self::new(options);
    }

    pub fn options(&self) -> &ArtistOptions {
        &self.options
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn into_score(self) -> Score {
        self.score
    }

    pub fn customizations(&self) -> &Customizations {
        &self.score.customizations
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn octave_shift(&self) -> i32 {
        self.octave_shift
    }

    pub fn current_clef(&self) -> Clef {
        self.clef
    }

    pub fn last_y(&self) -> f64 {
        self.last_y
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Apply global options. Every key must be a known customization.
    pub fn set_options<'a, I>(&mut self, options: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in options {
            debug!("set option {key}={value}");
            self.score.customizations.set(key, value)?;
        }

        self.last_y += self.score.customizations.space;
        if self.score.customizations.player {
            self.last_y += PLAYER_SPACE;
        }
        self.score.height = self.last_y;
        Ok(())
    }

    pub fn set_duration(&mut self, time: &str, dot: bool) -> Result<()> {
        self.duration = Duration::parse(time, dot)?;
        Ok(())
    }

    /// Open a new stave below the previous one and make it active.
    pub fn add_stave(&mut self, kind: StaveKind, config: StaveConfig) -> Result<()> {
        debug!(
            "add stave {:?}: notation={} tablature={} key={} strings={}",
            kind, config.notation, config.tablature, config.key, config.strings
        );
        // Any chain still open belongs to the previous stave.
        self.close_bends(1);

        let c = &self.score.customizations;
        let start_x = self.options.x + c.connector_space;
        let width = c.width - 20.0;

        let notation = if config.notation {
            let stave = NotationStave {
                x: start_x,
                y: self.last_y,
                width,
                clef: config.clef,
                key: config.key.clone(),
                time: config.time,
                end_bar: None,
            };
            self.last_y +=
                stave.height() + self.options.note_stave_lower_spacing + c.stave_distance;
            self.clef = config.clef.unwrap_or(Clef::Treble);
            Some(stave)
        } else {
            None
        };

        let tab = if config.tablature {
            let stave = TabStave {
                x: start_x,
                y: self.last_y,
                width,
                num_lines: config.strings,
                tab_glyph: config.clef.is_some(),
                note_start_x: if notation.is_none() {
                    Some(TAB_NOTE_START_X)
                } else {
                    None
                },
                end_bar: None,
            };
            self.last_y += stave.height() + self.options.tab_stave_lower_spacing;
            Some(stave)
        } else {
            None
        };

        let beam_groups = default_beam_groups(config.time.as_ref());
        self.score.staves.push(Stave::new(tab, notation, beam_groups));
        self.current = Some(self.score.staves.len() - 1);
        self.score.height = self.last_y;

        self.tuning = config.tuning;
        self.key_manager.set_key(&config.key)
    }

    /// Close the active voice and start a new one on the same stave. With
    /// no stave yet, opens one showing both views.
    pub fn add_voice(&mut self, config: StaveConfig) -> Result<()> {
        self.close_bends(1);
        let Some(idx) = self.current else {
            return self.add_stave(StaveKind::Implicit, config);
        };
        debug!("add voice to stave {idx}");
        self.score.staves[idx].close_voice();
        Ok(())
    }

    /// Append a barline; closes any bend chain and clears accidental memory.
    pub fn add_bar(&mut self, bar_type: BarType) -> Result<()> {
        debug!("add bar {bar_type:?}");
        self.close_bends(1);
        self.key_manager.reset()?;

        let stave = self.stave_mut()?;
        stave.tab_notes.push(Tickable::Bar { bar_type });
        if stave.notation.is_some() {
            stave.note_notes.push(Tickable::Bar { bar_type });
        }
        Ok(())
    }

    /// Append a rest. Position 0 is the default (middle) height; other
    /// positions move the rest vertically.
    pub fn add_rest(&mut self, position: i32) -> Result<()> {
        debug!("add rest at position {position}");
        self.close_bends(1);

        let key = if position == 0 {
            Pitch::new(NoteName::natural(Letter::B), 4)
        } else {
            let fret = position
                .checked_add(5)
                .and_then(|p| p.checked_mul(2))
                .and_then(|f| u32::try_from(f).ok())
                .ok_or_else(|| {
                    CompileError::resolution(format!("Invalid rest position: {position}"))
                })?;
            self.tuning.note_for_fret(fret, 6)?
        };
        let duration = self.duration;
        let tab_stems = self.score.customizations.tab_stems;

        let stave = self.stave_mut()?;
        if stave.notation.is_some() {
            stave.note_notes.push(rest_note(key, duration));
        }
        if tab_stems {
            stave.tab_notes.push(rest_note(key, duration));
        } else {
            stave.tab_notes.push(Tickable::ghost(duration));
        }
        Ok(())
    }

    /// Run a session command line such as `octave-shift -1`.
    pub fn run_command(&mut self, line: &str) -> Result<()> {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("octave-shift") => {
                let arg = words.next().unwrap_or_default();
                self.octave_shift = arg.parse().map_err(|_| {
                    CompileError::syntax(format!("Invalid octave shift: '{arg}'"))
                })?;
                debug!("octave shift {}", self.octave_shift);
                Ok(())
            }
            other => Err(CompileError::structural(format!(
                "Invalid command '{}'",
                other.unwrap_or_default()
            ))),
        }
    }

    // ─── Active stave helpers ───────────────────────────────────────

    fn stave_index(&self) -> Result<usize> {
        self.current
            .ok_or_else(|| CompileError::structural("No stave declared before notes"))
    }

    fn stave(&self) -> Result<&Stave> {
        let idx = self.stave_index()?;
        Ok(&self.score.staves[idx])
    }

    fn stave_mut(&mut self) -> Result<&mut Stave> {
        let idx = self.stave_index()?;
        Ok(&mut self.score.staves[idx])
    }

    /// Reference to slot `index` of the active tablature voice.
    fn tab_ref(&self, index: usize) -> Option<NoteRef> {
        let stave = self.current?;
        Some(NoteRef {
            stave,
            voice: self.score.staves[stave].tab_voices.len(),
            index,
        })
    }

    /// Reference to slot `index` of the active notation voice.
    fn note_ref(&self, index: usize) -> Option<NoteRef> {
        let stave = self.current?;
        Some(NoteRef {
            stave,
            voice: self.score.staves[stave].note_voices.len(),
            index,
        })
    }

    /// The nearest visible tab note before the one just written.
    fn previous_note_index(&self) -> Option<usize> {
        let notes = &self.stave().ok()?.tab_notes;
        let last = notes.len().checked_sub(1)?;
        notes[..last].iter().rposition(Tickable::is_live_tab_note)
    }
}

fn rest_note(key: Pitch, duration: Duration) -> Tickable {
    Tickable::Stave(StaveNote {
        keys: vec![key],
        duration,
        rest: true,
        clef: Clef::Treble,
        auto_stem: false,
        play_notes: Vec::new(),
        tick_multiplier: crate::duration::Ticks::from_integer(1),
        modifiers: Vec::new(),
    })
}
