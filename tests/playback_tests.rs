//! Playback schedule tests — verify tick grouping, MIDI keys and timing.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use tabscore::config::Instrument;
use tabscore::playback::{build_schedule, schedule_to_json, Schedule};
use tabscore::{compile_json, schedule_json};

fn schedule(directives: Value) -> Schedule {
    let artist = compile_json(&directives.to_string()).expect("directives should compile");
    build_schedule(&artist.player_data(), artist.customizations())
}

fn keys(schedule: &Schedule) -> Vec<Vec<Vec<u8>>> {
    schedule
        .events
        .iter()
        .map(|group| group.notes.iter().map(|n| n.midi_keys.clone()).collect())
        .collect()
}

#[test]
fn quarter_notes_at_default_tempo() {
    let s = schedule(json!([{
        "element": "tabstave",
        "notes": [{ "fret": "5", "string": 1 }, { "fret": "7", "string": 1 }]
    }]));

    assert_eq!(s.tempo, 120);
    assert_eq!(keys(&s), vec![vec![vec![81]], vec![vec![83]]]);
    let times: Vec<f64> = s.events.iter().map(|e| e.time_ms).collect();
    assert_eq!(times, vec![0.0, 500.0]);
    assert_eq!(s.events[0].notes[0].duration_ms, 500.0);
    assert_eq!(s.total_ms, 1000.0);
}

#[test]
fn chords_sound_together() {
    let s = schedule(json!([{
        "element": "tabstave",
        "notes": [{ "chord": [{ "fret": "0", "string": 6 }, { "fret": "2", "string": 5 }] }]
    }]));
    // e/3 and b/3
    assert_eq!(keys(&s), vec![vec![vec![52, 59]]]);
}

#[test]
fn voices_start_together_and_staves_follow_each_other() {
    let s = schedule(json!([
        { "element": "tabstave", "notes": [
            { "fret": "0", "string": 1 },
            { "fret": "0", "string": 1 }
        ] },
        { "element": "voice", "notes": [{ "time": "w" }, { "fret": "0", "string": 6 }] },
        { "element": "tabstave", "notes": [{ "fret": "0", "string": 2 }] }
    ]));

    // stave one lasts a whole note (its longest voice); stave two starts after it
    assert_eq!(keys(&s), vec![vec![vec![76], vec![52]], vec![vec![76]], vec![vec![71]]]);
    let times: Vec<f64> = s.events.iter().map(|e| e.time_ms).collect();
    assert_eq!(times, vec![0.0, 500.0, 2000.0]);
}

#[test]
fn rests_and_bars_in_the_schedule() {
    let s = schedule(json!([{
        "element": "tabstave",
        "notes": [
            { "command": "rest", "params": { "position": 0 } },
            { "command": "bar" },
            { "fret": "0", "string": 1 }
        ]
    }]));

    assert_eq!(s.events.len(), 2);
    assert!(s.events[0].notes[0].rest);
    assert!(s.events[0].notes[0].midi_keys.is_empty());
    assert_eq!(s.events[1].time_ms, 500.0);
}

#[test]
fn tempo_and_instrument_come_from_options() {
    let s = schedule(json!([
        { "element": "options", "params": [
            { "key": "tempo", "value": 60 },
            { "key": "instrument", "value": "acoustic_guitar_steel" }
        ] },
        { "element": "tabstave", "notes": [{ "time": "8" }, { "fret": "0", "string": 1 }] }
    ]));

    assert_eq!(s.instrument, Instrument::AcousticGuitarSteel);
    assert_eq!(s.program, 25);
    assert_eq!(s.events[0].notes[0].duration_ms, 500.0);
}

#[test]
fn octave_shift_is_heard() {
    let s = schedule(json!([{
        "element": "tabstave",
        "notes": [
            { "command": "command", "params": "octave-shift -1" },
            { "fret": "0", "string": 1 }
        ]
    }]));
    assert_eq!(keys(&s), vec![vec![vec![64]]]);
}

#[test]
fn schedule_serializes_to_json() {
    let json = json!([{ "element": "tabstave", "notes": [{ "fret": "0", "string": 1 }] }]);
    let out: Value = serde_json::from_str(&schedule_json(&json.to_string()).unwrap()).unwrap();

    assert_eq!(out["tempo"], 120);
    assert_eq!(out["events"][0]["notes"][0]["midi_keys"][0], 76);
    assert_eq!(out["total_ticks"], 4096.0);

    let s = schedule(json);
    assert_eq!(schedule_to_json(&s), serde_json::to_string(&s).unwrap());
}
