//! Compiler tests — drive whole directive lists through the compiler and
//! check the resulting stave buffers and links.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use tabscore::config::VerticalJustify;
use tabscore::error::{CompileError, ErrorKind};
use tabscore::model::{Link, NotationArticulation, NoteRef, TabArticulation};
use tabscore::music::Accidental;
use tabscore::note::{BarType, BendDirection, BendStep, Modifier, Tickable};
use tabscore::tuning::Fret;
use tabscore::{compile_json, Artist};

fn compile(directives: Value) -> Artist {
    compile_json(&directives.to_string()).expect("directives should compile")
}

fn compile_err(directives: Value) -> CompileError {
    match compile_json(&directives.to_string()) {
        Ok(_) => panic!("directives should not compile"),
        Err(e) => e,
    }
}

fn tabstave(notes: Value) -> Value {
    json!([{ "element": "tabstave", "notes": notes, "_l": 1, "_c": 1 }])
}

/// A tabstave that also shows standard notation.
fn both_views(notes: Value) -> Value {
    json!([{
        "element": "tabstave",
        "options": [{ "key": "notation", "value": "true" }],
        "notes": notes,
        "_l": 1,
        "_c": 1
    }])
}

fn fret(fret: &str, string: u32) -> Value {
    json!({ "fret": fret, "string": string })
}

fn at(index: usize) -> NoteRef {
    NoteRef {
        stave: 0,
        voice: 0,
        index,
    }
}

fn modifiers(note: &Tickable) -> Vec<Modifier> {
    note.modifiers().iter().map(|a| a.modifier.clone()).collect()
}

#[test]
fn tab_only_stave_gets_no_notation() {
    let artist = compile(tabstave(json!([fret("10", 2), fret("10", 3)])));
    let stave = &artist.score().staves[0];

    assert_eq!(stave.tab_notes.len(), 2);
    assert!(stave.note_notes.is_empty());
    assert!(stave.notation.is_none());
    assert!(stave.tab.is_some());

    let first = stave.tab_notes[0].as_tab().unwrap();
    assert_eq!(first.positions[0].fret, Fret::Number(10));
    assert_eq!(first.positions[0].string, 2);
    assert_eq!(first.play_notes[0].to_string(), "a/5");
}

#[test]
fn slide_links_only_the_tagged_string() {
    let artist = compile(tabstave(json!([
        fret("10", 3),
        { "fret": "11", "string": 3, "articulation": "s" }
    ])));

    assert_eq!(
        artist.score().tab_articulations,
        vec![TabArticulation::Slide(Link {
            first: at(0),
            last: at(1),
            first_indices: vec![0],
            last_indices: vec![0],
        })]
    );
    assert!(artist.score().notation_articulations.is_empty());
}

#[test]
fn bend_closed_by_plain_note() {
    let artist = compile(tabstave(json!([
        fret("10", 3),
        { "fret": "11", "string": 3, "articulation": "b" },
        fret("5", 1)
    ])));
    let notes = &artist.score().staves[0].tab_notes;

    assert_eq!(
        modifiers(&notes[0]),
        vec![Modifier::Bend {
            phrase: vec![BendStep {
                direction: BendDirection::Up,
                text: "1/2".to_string(),
            }]
        }]
    );
    assert!(notes[1].as_tab().unwrap().ghost);
    assert!(!notes[2].as_tab().unwrap().ghost);
    assert!(artist.score().tab_articulations.is_empty());
}

#[test]
fn bend_and_release_form_one_phrase() {
    let artist = compile(tabstave(json!([
        fret("10", 3),
        { "fret": "12", "string": 3, "articulation": "b" },
        { "fret": "10", "string": 3, "articulation": "b" },
        fret("5", 1)
    ])));
    let notes = &artist.score().staves[0].tab_notes;

    assert_eq!(
        modifiers(&notes[0]),
        vec![Modifier::Bend {
            phrase: vec![
                BendStep {
                    direction: BendDirection::Up,
                    text: "Full".to_string(),
                },
                BendStep {
                    direction: BendDirection::Down,
                    text: String::new(),
                },
            ]
        }]
    );
    assert!(notes[1].as_tab().unwrap().ghost);
    assert!(notes[2].as_tab().unwrap().ghost);
    assert!(!notes[3].as_tab().unwrap().ghost);
}

#[test]
fn bar_closes_bend_keeping_the_last_note_hidden() {
    let artist = compile(tabstave(json!([
        fret("7", 2),
        { "fret": "9", "string": 2, "articulation": "b" },
        { "command": "bar" }
    ])));
    let notes = &artist.score().staves[0].tab_notes;

    assert_eq!(notes.len(), 3);
    assert_eq!(modifiers(&notes[0]).len(), 1);
    assert!(notes[1].as_tab().unwrap().ghost);
    assert!(matches!(
        notes[2],
        Tickable::Bar {
            bar_type: BarType::Single
        }
    ));
}

#[test]
fn tuplet_needs_enough_notes() {
    let err = compile_err(tabstave(json!([
        fret("5", 1),
        fret("6", 1),
        { "command": "tuplet", "params": { "tuplet": 3 }, "_l": 1, "_c": 20 }
    ])));

    assert_eq!(err.kind, ErrorKind::Arity);
    assert_eq!(err.message, "Not enough notes for tuplet");
    assert_eq!(err.location.map(|l| (l.line, l.column)), Some((1, 20)));
}

#[test]
fn tuplet_scales_both_buffers() {
    let artist = compile(both_views(json!([
        { "time": "8" },
        fret("5", 1),
        fret("6", 1),
        fret("7", 1),
        { "command": "tuplet", "params": { "tuplet": 3 } }
    ])));
    let stave = &artist.score().staves[0];
    let third = num_rational::Ratio::new(2, 3);

    for note in stave.tab_notes.iter().chain(&stave.note_notes) {
        assert_eq!(note.ticks(), num_rational::Ratio::from_integer(2048) * third);
    }
    assert_eq!(artist.score().notation_articulations.len(), 1);
    match &artist.score().notation_articulations[0] {
        NotationArticulation::Tuplet(tuplet) => {
            assert_eq!(tuplet.notes, vec![at(0), at(1), at(2)]);
            assert_eq!(tuplet.num_notes, 3);
            assert_eq!(tuplet.notes_occupied, 2);
        }
        other => panic!("expected a tuplet, got {other:?}"),
    }
    // no tab stems, so nothing to draw on the tablature
    assert!(artist.score().tab_articulations.is_empty());
}

#[test]
fn too_many_annotations_for_a_chord() {
    let err = compile_err(tabstave(json!([
        { "chord": [fret("5", 1), fret("5", 2)] },
        { "command": "annotations", "params": ["A", "B", "C"] }
    ])));

    assert_eq!(err.kind, ErrorKind::Arity);
    assert_eq!(err.message, "More annotations than note elements");
}

#[test]
fn hammer_on_between_chords_links_the_shared_string() {
    let artist = compile(tabstave(json!([
        { "chord": [fret("5", 3), fret("7", 2)] },
        { "chord": [
            { "fret": "7", "string": 3, "articulation": "h" },
            fret("8", 2)
        ] }
    ])));

    assert_eq!(
        artist.score().tab_articulations,
        vec![TabArticulation::Tie {
            link: Link {
                first: at(0),
                last: at(1),
                first_indices: vec![0],
                last_indices: vec![0],
            },
            label: "H".to_string(),
        }]
    );
}

#[test]
fn chord_level_articulation_applies_to_every_position() {
    let artist = compile(tabstave(json!([
        { "chord": [fret("5", 3), fret("7", 2)] },
        { "chord": [fret("7", 3), fret("9", 2)], "articulation": "p" }
    ])));

    match &artist.score().tab_articulations[..] {
        [TabArticulation::Tie { link, label }] => {
            assert_eq!(label, "P");
            assert_eq!(link.first_indices, vec![0, 1]);
            assert_eq!(link.last_indices, vec![0, 1]);
        }
        other => panic!("expected one pull-off, got {other:?}"),
    }
}

#[test]
fn tap_links_with_a_blank_label_and_marks_the_tapped_note() {
    let artist = compile(both_views(json!([
        fret("5", 2),
        { "fret": "12", "string": 2, "articulation": "t" }
    ])));
    let score = artist.score();
    let link = Link {
        first: at(0),
        last: at(1),
        first_indices: vec![0],
        last_indices: vec![0],
    };

    assert_eq!(
        score.tab_articulations,
        vec![TabArticulation::Tie {
            link: link.clone(),
            label: " ".to_string(),
        }]
    );
    assert_eq!(score.notation_articulations, vec![NotationArticulation::Tie(link)]);
    match &modifiers(&score.staves[0].tab_notes[1])[..] {
        [Modifier::Annotation(mark)] => {
            assert_eq!(mark.text, "T");
            assert_eq!(mark.justify, VerticalJustify::Top);
        }
        other => panic!("expected the tap mark, got {other:?}"),
    }
    assert!(modifiers(&score.staves[0].tab_notes[0]).is_empty());
}

#[test]
fn tap_tie_links_without_a_mark() {
    let artist = compile(tabstave(json!([
        fret("5", 2),
        { "fret": "12", "string": 2, "articulation": "T" }
    ])));
    let score = artist.score();

    assert_eq!(
        score.tab_articulations,
        vec![TabArticulation::Tie {
            link: Link {
                first: at(0),
                last: at(1),
                first_indices: vec![0],
                last_indices: vec![0],
            },
            label: " ".to_string(),
        }]
    );
    assert!(modifiers(&score.staves[0].tab_notes[1]).is_empty());
}

#[test]
fn vibrato_tags_decorate_without_linking() {
    let artist = compile(both_views(json!([
        fret("5", 1),
        { "fret": "5", "string": 1, "articulation": "v" },
        { "fret": "7", "string": 1, "articulation": "V" }
    ])));
    let score = artist.score();
    let stave = &score.staves[0];

    assert!(score.tab_articulations.is_empty());
    assert!(score.notation_articulations.is_empty());
    assert!(modifiers(&stave.tab_notes[0]).is_empty());
    assert_eq!(
        modifiers(&stave.tab_notes[1]),
        vec![Modifier::Vibrato { harsh: false }]
    );
    assert_eq!(
        modifiers(&stave.tab_notes[2]),
        vec![Modifier::Vibrato { harsh: true }]
    );
}

#[test]
fn links_skip_ghosted_notes() {
    // the bar hides the note the bend reached; the slide reaches back to
    // the anchor
    let artist = compile(tabstave(json!([
        fret("5", 3),
        { "fret": "7", "string": 3, "articulation": "b" },
        { "command": "bar" },
        { "fret": "9", "string": 3, "articulation": "s" }
    ])));

    match &artist.score().tab_articulations[..] {
        [TabArticulation::Slide(link)] => {
            assert_eq!(link.first, at(0));
            assert_eq!(link.last, at(3));
        }
        other => panic!("expected one slide, got {other:?}"),
    }
}

#[test]
fn slide_from_a_bend_target_starts_at_that_note() {
    let artist = compile(tabstave(json!([
        fret("5", 3),
        { "fret": "7", "string": 3, "articulation": "b" },
        { "fret": "9", "string": 3, "articulation": "s" }
    ])));
    let notes = &artist.score().staves[0].tab_notes;

    match &artist.score().tab_articulations[..] {
        [TabArticulation::Slide(link)] => assert_eq!(link.first, at(1)),
        other => panic!("expected one slide, got {other:?}"),
    }
    // the slide ends the chain
    assert!(notes[1].as_tab().unwrap().ghost);
    assert_eq!(modifiers(&notes[0]).len(), 1);
}

#[test]
fn same_string_entries_make_a_melodic_line() {
    let artist = compile(tabstave(json!([
        { "chord": [fret("5", 1), fret("7", 1), fret("5", 2)] }
    ])));
    let notes = &artist.score().staves[0].tab_notes;

    assert_eq!(notes.len(), 2);
    let strings = |n: &Tickable| -> Vec<u32> {
        n.as_tab().unwrap().positions.iter().map(|p| p.string).collect()
    };
    assert_eq!(strings(&notes[0]), vec![1, 2]);
    assert_eq!(strings(&notes[1]), vec![1]);
}

#[test]
fn accidentals_are_remembered_until_the_bar() {
    let artist = compile(both_views(json!([
        fret("2", 1),
        fret("2", 1),
        { "command": "bar", "type": "double" },
        fret("2", 1)
    ])));
    let notes = &artist.score().staves[0].note_notes;
    let sharp = Modifier::Accidental {
        accidental: Accidental::Sharp,
        cautionary: false,
    };

    assert_eq!(notes.len(), 4);
    assert_eq!(notes[0].as_stave().unwrap().keys[0].to_string(), "f#/5");
    assert_eq!(modifiers(&notes[0]), vec![sharp.clone()]);
    assert!(modifiers(&notes[1]).is_empty());
    assert!(matches!(
        notes[2],
        Tickable::Bar {
            bar_type: BarType::Double
        }
    ));
    assert_eq!(modifiers(&notes[3]), vec![sharp]);
}

#[test]
fn return_to_natural_gets_a_mark() {
    let artist = compile(both_views(json!([fret("2", 1), fret("1", 1)])));
    let notes = &artist.score().staves[0].note_notes;

    assert_eq!(notes[1].as_stave().unwrap().keys[0].to_string(), "f/5");
    assert_eq!(
        modifiers(&notes[1]),
        vec![Modifier::Accidental {
            accidental: Accidental::Natural,
            cautionary: false,
        }]
    );
}

#[test]
fn pitch_letters_resolve_without_frets() {
    let artist = compile(json!([{
        "element": "stave",
        "notes": [
            { "abc": { "key": "E", "accidental": "b" }, "octave": 4 },
            { "abc": { "key": "G" }, "octave": 4 }
        ]
    }]));
    let stave = &artist.score().staves[0];

    assert!(stave.tab.is_none());
    assert_eq!(stave.note_notes.len(), 2);
    assert_eq!(stave.note_notes[0].as_stave().unwrap().keys[0].to_string(), "eb/4");
    assert_eq!(stave.tab_notes[0].as_tab().unwrap().positions[0].fret, Fret::Muted);
}

#[test]
fn muted_fret_without_pitch_is_rejected() {
    let err = compile_err(tabstave(json!([
        { "fret": "X", "string": 3, "_l": 1, "_c": 12 }
    ])));
    assert_eq!(err.kind, ErrorKind::Resolution);
    assert_eq!(err.location.map(|l| l.column), Some(12));
}

#[test]
fn out_of_range_numbers_are_resolution_errors() {
    let err = compile_err(tabstave(json!([fret("2147483647", 1)])));
    assert_eq!(err.kind, ErrorKind::Resolution);
    assert_eq!(err.message, "Invalid fret number: 2147483647");

    let err = compile_err(both_views(json!([
        { "command": "rest", "params": { "position": 2147483647 } }
    ])));
    assert_eq!(err.kind, ErrorKind::Resolution);
    assert_eq!(err.message, "Invalid rest position: 2147483647");

    let err = compile_err(tabstave(json!([
        { "command": "command", "params": "octave-shift 2147483647" },
        fret("0", 1)
    ])));
    assert_eq!(err.kind, ErrorKind::Resolution);
}

#[test]
fn rests_fill_time_on_tablature() {
    let artist = compile(both_views(json!([
        fret("5", 1),
        { "command": "rest", "params": { "position": 0 } }
    ])));
    let stave = &artist.score().staves[0];

    assert!(matches!(stave.tab_notes[1], Tickable::Ghost { .. }));
    let rest = stave.note_notes[1].as_stave().unwrap();
    assert!(rest.rest);
    assert_eq!(rest.keys[0].to_string(), "b/4");
}

#[test]
fn tab_stems_draw_rests_on_tablature() {
    let artist = compile(json!([
        { "element": "options", "params": [{ "key": "tab-stems", "value": "true" }] },
        { "element": "tabstave", "notes": [{ "command": "rest", "params": { "position": 0 } }] }
    ]));
    assert!(artist.score().staves[0].tab_notes[0].is_rest());
}

#[test]
fn voice_closes_the_current_buffers() {
    let artist = compile(json!([
        { "element": "tabstave", "notes": [fret("5", 1), fret("7", 1)] },
        { "element": "voice", "notes": [
            fret("5", 6),
            { "fret": "7", "string": 6, "articulation": "h" }
        ] }
    ]));
    let stave = &artist.score().staves[0];

    assert_eq!(stave.tab_voices.len(), 1);
    assert_eq!(stave.tab_voices[0].len(), 2);
    assert_eq!(stave.tab_notes.len(), 2);
    match &artist.score().tab_articulations[..] {
        [TabArticulation::Tie { link, .. }] => {
            assert_eq!(link.first.voice, 1);
            assert_eq!(link.last.index, 1);
        }
        other => panic!("expected one hammer-on, got {other:?}"),
    }
}

#[test]
fn accidentals_carry_into_the_next_voice() {
    let artist = compile(json!([
        { "element": "tabstave",
          "options": [{ "key": "notation", "value": "true" }],
          "notes": [fret("2", 1)] },
        { "element": "voice", "notes": [fret("2", 1)] }
    ]));
    let stave = &artist.score().staves[0];

    assert_eq!(
        modifiers(&stave.note_voices[0][0]),
        vec![Modifier::Accidental {
            accidental: Accidental::Sharp,
            cautionary: false,
        }]
    );
    assert_eq!(stave.note_notes[0].as_stave().unwrap().keys[0].to_string(), "f#/5");
    assert!(modifiers(&stave.note_notes[0]).is_empty());
}

#[test]
fn voice_without_stave_opens_both_views() {
    let artist = compile(json!([{ "element": "voice", "notes": [fret("5", 1)] }]));
    let stave = &artist.score().staves[0];
    assert!(stave.tab.is_some());
    assert!(stave.notation.is_some());
}

#[test]
fn annotations_attach_to_the_last_notes() {
    let artist = compile(both_views(json!([
        fret("5", 1),
        fret("7", 1),
        { "command": "annotations", "params": [".big.A", ".a>/t."] }
    ])));
    let stave = &artist.score().staves[0];

    match &modifiers(&stave.tab_notes[0])[..] {
        [Modifier::Annotation(a)] => {
            assert_eq!(a.text, "A");
            assert_eq!(a.font.size, 14);
            assert_eq!(a.font.style.as_deref(), Some("bold"));
        }
        other => panic!("expected an annotation, got {other:?}"),
    }
    let accent = |n: &Tickable| {
        modifiers(n)
            .iter()
            .any(|m| matches!(m, Modifier::Articulation { code, .. } if code == "a>"))
    };
    assert!(accent(&stave.tab_notes[1]));
    assert!(accent(&stave.note_notes[1]));
}

#[test]
fn fingering_numbers_start_at_one() {
    let ok = compile(both_views(json!([
        { "chord": [fret("5", 1), fret("5", 2)] },
        { "command": "annotations", "params": [".fingering/2:l:f:3."] }
    ])));
    let note = &ok.score().staves[0].note_notes[0];
    assert_eq!(note.modifiers()[0].index, 1);

    let err = compile_err(both_views(json!([
        fret("5", 1),
        { "command": "annotations", "params": [".fingering/0:l:f:3."] }
    ])));
    assert_eq!(err.kind, ErrorKind::Arity);
    assert_eq!(err.message, "Bad note number in fingering: .fingering/0:l:f:3.");
}

#[test]
fn decorators_mark_the_last_note() {
    let artist = compile(both_views(json!([
        { "fret": "5", "string": 1, "decorator": "v" },
        { "chord": [fret("5", 1), fret("5", 2)], "decorator": "d" }
    ])));
    let stave = &artist.score().staves[0];

    assert_eq!(
        modifiers(&stave.tab_notes[0]),
        vec![Modifier::Vibrato { harsh: false }]
    );
    assert!(modifiers(&stave.note_notes[0]).is_empty());
    assert!(matches!(
        &modifiers(&stave.note_notes[1])[..],
        [Modifier::Articulation { code, .. }] if code == "am"
    ));
}

#[test]
fn octave_shift_changes_played_pitch_only() {
    let artist = compile(tabstave(json!([
        { "command": "command", "params": "octave-shift 1" },
        fret("0", 6)
    ])));
    let note = artist.score().staves[0].tab_notes[0].as_tab().unwrap();
    assert_eq!(note.play_notes[0].to_string(), "e/4");
}

#[test]
fn durations_are_sticky() {
    let artist = compile(tabstave(json!([
        { "time": "8", "dot": true },
        fret("5", 1),
        fret("6", 1),
        { "time": "q" },
        fret("7", 1)
    ])));
    let notes = &artist.score().staves[0].tab_notes;
    let durations: Vec<String> = notes
        .iter()
        .map(|n| n.as_tab().unwrap().duration.to_string())
        .collect();
    assert_eq!(durations, vec!["8d", "8d", "q"]);
}

#[test]
fn slash_durations_compile_and_keep_their_length() {
    let artist = compile(both_views(json!([
        { "time": "qS" },
        fret("5", 1),
        { "time": "16S" },
        fret("7", 1)
    ])));
    let stave = &artist.score().staves[0];
    let tab: Vec<String> = stave
        .tab_notes
        .iter()
        .map(|n| n.as_tab().unwrap().duration.to_string())
        .collect();

    assert_eq!(tab, vec!["qS", "16S"]);
    assert!(stave.note_notes[0].as_stave().unwrap().duration.slash);
    assert_eq!(stave.tab_notes[0].ticks(), tabscore::duration::Ticks::from_integer(4096));
}

#[test]
fn chord_entry_duration_applies_to_its_position_only() {
    let artist = compile(tabstave(json!([
        { "chord": [fret("5", 1), { "fret": "7", "string": 1, "time": "8" }] },
        fret("5", 2)
    ])));
    let durations: Vec<String> = artist.score().staves[0]
        .tab_notes
        .iter()
        .map(|n| n.as_tab().unwrap().duration.to_string())
        .collect();
    assert_eq!(durations, vec!["q", "8", "q"]);
}

#[test]
fn options_advance_the_cursor() {
    let artist = compile(json!([
        { "element": "options", "params": [
            { "key": "space", "value": 20 },
            { "key": "player", "value": "true" }
        ] }
    ]));
    // y starts at 10
    assert_eq!(artist.last_y(), 45.0);
    assert!(artist.customizations().player);
}

#[test]
fn errors_carry_locations() {
    let unknown_option = compile_err(json!([
        { "element": "options", "params": [{ "key": "colour", "value": "red" }], "_l": 3, "_c": 1 }
    ]));
    assert_eq!(unknown_option.kind, ErrorKind::Config);
    assert_eq!(unknown_option.location.map(|l| l.line), Some(3));

    let unknown_command = compile_err(tabstave(json!([
        { "command": "command", "params": "transpose 2", "_l": 1, "_c": 30 }
    ])));
    assert_eq!(unknown_command.kind, ErrorKind::Structural);
    assert_eq!(unknown_command.message, "Invalid command 'transpose'");
    assert_eq!(unknown_command.location.map(|l| l.column), Some(30));

    let invisible = compile_err(json!([{
        "element": "tabstave",
        "options": [
            { "key": "notation", "value": "false" },
            { "key": "tablature", "value": "false", "_l": 1, "_c": 27 }
        ]
    }]));
    assert_eq!(invisible.kind, ErrorKind::Config);
    assert_eq!(invisible.location.map(|l| l.column), Some(27));
}

#[test]
fn bad_json_is_an_input_error() {
    let err = compile_json("[{\"element\": ").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Input);
}
