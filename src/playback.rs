//! Playback schedule: the compiled voices flattened into groups of notes
//! that start together, with MIDI keys and wall-clock times.
//!
//! Staves play one after another. Within a stave every voice starts at the
//! stave's first tick, and the stave lasts as long as its longest voice:
//!   `time_ms = ticks / (tempo * RESOLUTION / 4) * 60000`

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::config::{Customizations, Instrument};
use crate::duration::{Ticks, RESOLUTION};
use crate::note::Tickable;

/// Voices handed to a player, grouped by stave.
#[derive(Debug, Clone)]
pub struct PlayerData<'a> {
    pub voices: Vec<Vec<&'a [Tickable]>>,
    /// Display scale of the rendered score
    pub scale: f64,
}

/// Notes of one tickable, as sounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledNote {
    /// General MIDI keys (empty for rests)
    pub midi_keys: Vec<u8>,
    pub duration_ms: f64,
    pub rest: bool,
}

/// Everything that starts on the same absolute tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickGroup {
    #[serde(serialize_with = "serialize_ticks")]
    pub tick: Ticks,
    pub time_ms: f64,
    pub notes: Vec<ScheduledNote>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    pub tempo: u32,
    pub instrument: Instrument,
    /// General MIDI program for `instrument`
    pub program: u8,
    pub events: Vec<TickGroup>,
    #[serde(serialize_with = "serialize_ticks")]
    pub total_ticks: Ticks,
    pub total_ms: f64,
}

/// Ticks per minute at `tempo` quarter notes per minute.
fn ticks_per_minute(tempo: u32) -> Ticks {
    Ticks::from_integer(i64::from(tempo.max(1)) * RESOLUTION / 4)
}

fn to_ms(ticks: Ticks, tpm: Ticks) -> f64 {
    let ms = ticks * Ticks::from_integer(60_000) / tpm;
    *ms.numer() as f64 / *ms.denom() as f64
}

/// Build the schedule for `data` using the tempo and instrument in
/// `customizations`.
pub fn build_schedule(data: &PlayerData<'_>, customizations: &Customizations) -> Schedule {
    let tpm = ticks_per_minute(customizations.tempo);
    let mut groups: BTreeMap<Ticks, Vec<ScheduledNote>> = BTreeMap::new();
    let mut total = Ticks::from_integer(0);

    for stave in &data.voices {
        let mut longest = Ticks::from_integer(0);
        for voice in stave {
            let mut elapsed = Ticks::from_integer(0);
            for note in voice.iter().filter(|n| !n.ignores_ticks()) {
                let ticks = note.ticks();
                groups
                    .entry(total + elapsed)
                    .or_default()
                    .push(ScheduledNote {
                        midi_keys: note.play_notes().iter().filter_map(|p| p.midi_key()).collect(),
                        duration_ms: to_ms(ticks, tpm),
                        rest: note.is_rest(),
                    });
                elapsed += ticks;
            }
            longest = longest.max(elapsed);
        }
        total += longest;
    }

    let events: Vec<TickGroup> = groups
        .into_iter()
        .map(|(tick, notes)| TickGroup {
            tick,
            time_ms: to_ms(tick, tpm),
            notes,
        })
        .collect();
    debug!("schedule: {} events over {} ticks", events.len(), total);

    Schedule {
        tempo: customizations.tempo,
        instrument: customizations.instrument,
        program: customizations.instrument.program(),
        events,
        total_ticks: total,
        total_ms: to_ms(total, tpm),
    }
}

/// Serialize a schedule to JSON.
pub fn schedule_to_json(schedule: &Schedule) -> String {
    serde_json::to_string(schedule).unwrap_or_else(|_| "{}".to_string())
}

fn serialize_ticks<S: serde::Serializer>(
    ticks: &Ticks,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(*ticks.numer() as f64 / *ticks.denom() as f64)
}
