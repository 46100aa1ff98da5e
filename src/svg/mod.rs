//! Built-in preview engine: draws a compiled score as a plain SVG.
//!
//! This is not an engraver. Notes are spread across each stave in
//! proportion to their ticks, with fret numbers on tablature lines and
//! note heads on notation lines, so a compiled score can be inspected
//! without an external layout library.

mod builder;
mod constants;

use std::collections::HashMap;

use log::debug;

use builder::{empty_svg, SvgBuilder};
use constants::*;

use crate::config::{Clef, StemDirection, VerticalJustify};
use crate::duration::{NoteValue, Ticks};
use crate::layout::{BeamConfig, LayoutEngine, StaveGroup};
use crate::markup::{Position, StrokeKind};
use crate::model::{
    Link, NotationArticulation, NotationStave, NoteRef, Score, TabArticulation, TabStave, Tuplet,
    NOTATION_LINE_SPACING, TAB_LINE_SPACING,
};
use crate::music::{Accidental, Pitch};
use crate::note::{BarType, BendDirection, Modifier, StaveNote, TabNote, TextJustification, Tickable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum View {
    Tab,
    Notation,
}

/// Where a note was drawn: its x and the y of each key or position.
#[derive(Debug, Clone)]
struct Placement {
    x: f64,
    ys: Vec<f64>,
}

/// Layout engine producing an SVG document.
#[derive(Default)]
pub struct SvgEngine {
    svg: Option<SvgBuilder>,
    placements: HashMap<(View, NoteRef), Placement>,
}

impl SvgEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The document drawn so far.
    pub fn finish(&self) -> String {
        match &self.svg {
            Some(svg) => svg.build(),
            None => empty_svg("Nothing rendered"),
        }
    }
}

/// Maps accumulated ticks to x positions across one stave.
struct Timeline {
    x0: f64,
    width: f64,
    total: Ticks,
}

impl Timeline {
    fn for_group(group: &StaveGroup<'_>) -> Self {
        let (x, width, start) = match (&group.notation, &group.tab) {
            (Some(n), _) => (n.stave.x, n.stave.width, DEFAULT_NOTE_START),
            (None, Some(t)) => (
                t.stave.x,
                t.stave.width,
                t.stave.note_start_x.unwrap_or(DEFAULT_NOTE_START),
            ),
            (None, None) => (0.0, 0.0, 0.0),
        };

        let tickables = group
            .notation
            .iter()
            .flat_map(|v| v.voices.iter().map(|voice| voice_ticks(voice)))
            .chain(
                group
                    .tab
                    .iter()
                    .flat_map(|v| v.voices.iter().map(|voice| voice_ticks(voice))),
            );
        let text = group.text_voices.iter().map(|voice| {
            voice
                .iter()
                .filter(|n| !n.ignore_ticks)
                .map(|n| n.duration.ticks() * n.tick_multiplier)
                .fold(Ticks::from_integer(0), |a, b| a + b)
        });
        let total = tickables
            .chain(text)
            .max()
            .unwrap_or_else(|| Ticks::from_integer(0));

        Timeline {
            x0: x + start,
            width: (width - start - RIGHT_PADDING).max(0.0),
            total,
        }
    }

    fn x_at(&self, ticks: Ticks) -> f64 {
        if *self.total.numer() == 0 {
            return self.x0;
        }
        let share = ticks / self.total;
        self.x0 + *share.numer() as f64 / *share.denom() as f64 * self.width
    }

    /// Each tickable of `voice` with the x of its left edge.
    fn place<'v>(&self, voice: &'v [Tickable]) -> Vec<(usize, f64, &'v Tickable)> {
        let mut elapsed = Ticks::from_integer(0);
        voice
            .iter()
            .enumerate()
            .map(|(i, note)| {
                let x = self.x_at(elapsed);
                if !note.ignores_ticks() {
                    elapsed += note.ticks();
                }
                (i, x, note)
            })
            .collect()
    }
}

fn voice_ticks(voice: &[Tickable]) -> Ticks {
    voice
        .iter()
        .filter(|n| !n.ignores_ticks())
        .map(Tickable::ticks)
        .fold(Ticks::from_integer(0), |a, b| a + b)
}

impl LayoutEngine for SvgEngine {
    fn prepare(&mut self, width: f64, height: f64, scale: f64) {
        debug!("svg surface {width}x{height} at scale {scale}");
        self.svg = Some(SvgBuilder::new(width, height, scale));
        self.placements.clear();
    }

    fn format_and_draw(&mut self, group: &StaveGroup<'_>) {
        let Self { svg, placements } = self;
        let Some(svg) = svg.as_mut() else {
            return;
        };
        let timeline = Timeline::for_group(group);
        let mut bottom: f64 = 0.0;

        if let Some(view) = &group.notation {
            let stave = view.stave;
            let top = stave.y + NOTATION_TOP_OFFSET;
            let lines_bottom = top + 4.0 * NOTATION_LINE_SPACING;
            draw_notation_stave(svg, stave, top);

            for (voice, notes) in view.voices.iter().enumerate() {
                for (index, x, note) in timeline.place(notes) {
                    let x = x + NOTEHEAD_RX * 2.0;
                    match note {
                        Tickable::Stave(n) => {
                            let ys = draw_stave_note(svg, n, x, top, stave.clef);
                            let at = NoteRef {
                                stave: group.index,
                                voice,
                                index,
                            };
                            placements.insert((View::Notation, at), Placement { x, ys });
                        }
                        Tickable::Bar { .. } => {
                            draw_barline(svg, BarType::Single, x - NOTEHEAD_RX * 2.0, top, lines_bottom)
                        }
                        _ => {}
                    }
                }
            }
            if let Some(bar) = stave.end_bar {
                draw_barline(svg, bar, stave.x + stave.width, top, lines_bottom);
            }
            bottom = bottom.max(stave.y + stave.height());
        }

        if let Some(view) = &group.tab {
            let stave = view.stave;
            let first = stave.y + TAB_TOP_OFFSET;
            let last = first + f64::from(stave.num_lines.saturating_sub(1)) * TAB_LINE_SPACING;
            draw_tab_stave(svg, stave, first, last);

            for (voice, notes) in view.voices.iter().enumerate() {
                for (index, x, note) in timeline.place(notes) {
                    let x = x + NOTEHEAD_RX * 2.0;
                    match note {
                        Tickable::Tab(n) => {
                            let ys = draw_tab_note(svg, n, x, first, last, &group.beam);
                            let at = NoteRef {
                                stave: group.index,
                                voice,
                                index,
                            };
                            placements.insert((View::Tab, at), Placement { x, ys });
                        }
                        Tickable::Bar { .. } => {
                            draw_barline(svg, BarType::Single, x - NOTEHEAD_RX * 2.0, first, last)
                        }
                        _ => {}
                    }
                }
            }
            if let Some(bar) = stave.end_bar {
                draw_barline(svg, bar, stave.x + stave.width, first, last);
            }
            bottom = bottom.max(stave.y + stave.height());
        }

        for (line_offset, voice) in group.text_voices.iter().enumerate() {
            let mut elapsed = Ticks::from_integer(0);
            for note in voice {
                let x = timeline.x_at(elapsed) + NOTEHEAD_RX * 2.0;
                if !note.ignore_ticks {
                    elapsed += note.duration.ticks() * note.tick_multiplier;
                }
                if note.text.is_empty() {
                    continue;
                }
                let y = bottom
                    + f64::from(note.line) * NOTATION_LINE_SPACING
                    + line_offset as f64 * LABEL_FONT_SIZE * 1.5;
                let anchor = match note.justification {
                    TextJustification::Left => "start",
                    TextJustification::Center => "middle",
                    TextJustification::Right => "end",
                };
                let content = note.glyph.as_deref().unwrap_or(&note.text);
                svg.styled_text(
                    x,
                    y,
                    content,
                    &note.font.family,
                    f64::from(note.font.size),
                    note.font.style.as_deref(),
                    anchor,
                );
            }
        }
    }

    fn draw_articulations(&mut self, score: &Score) {
        let Self { svg, placements } = self;
        let Some(svg) = svg.as_mut() else {
            return;
        };

        for articulation in &score.tab_articulations {
            match articulation {
                TabArticulation::Slide(link) => {
                    for (a, b) in link_points(placements, View::Tab, link) {
                        svg.line(a.0 + 6.0, a.1 + 3.0, b.0 - 6.0, b.1 - 3.0, NOTE_COLOR, LINK_WIDTH);
                    }
                }
                TabArticulation::Tie { link, label } => {
                    for (a, b) in link_points(placements, View::Tab, link) {
                        let lift = a.1.min(b.1) - 16.0;
                        draw_curve(svg, (a.0, a.1 - 7.0), (b.0, b.1 - 7.0), lift);
                        if !label.trim().is_empty() {
                            svg.text((a.0 + b.0) / 2.0, lift, label, LABEL_FONT_SIZE, "normal", "middle");
                        }
                    }
                }
                TabArticulation::Tuplet(tuplet) => draw_tuplet(svg, placements, View::Tab, tuplet),
            }
        }

        for articulation in &score.notation_articulations {
            match articulation {
                NotationArticulation::Tie(link) => {
                    for (a, b) in link_points(placements, View::Notation, link) {
                        let dip = a.1.max(b.1) + 12.0;
                        draw_curve(svg, (a.0 + 4.0, a.1 + 5.0), (b.0 - 4.0, b.1 + 5.0), dip);
                    }
                }
                NotationArticulation::Tuplet(tuplet) => {
                    draw_tuplet(svg, placements, View::Notation, tuplet)
                }
            }
        }
    }
}

// ─── Staves ─────────────────────────────────────────────────────────

fn draw_notation_stave(svg: &mut SvgBuilder, stave: &NotationStave, top: f64) {
    for i in 0..5 {
        let y = top + f64::from(i) * NOTATION_LINE_SPACING;
        svg.line(stave.x, y, stave.x + stave.width, y, STAFF_COLOR, STAFF_LINE_WIDTH);
    }
    match stave.clef {
        Some(Clef::Treble) => svg.clef(stave.x + 14.0, top + 32.0, '\u{1D11E}', 40.0),
        Some(Clef::Bass) => svg.clef(stave.x + 14.0, top + 30.0, '\u{1D122}', 30.0),
        Some(clef) => svg.text(
            stave.x + 12.0,
            top + 24.0,
            &clef.to_string()[..1].to_uppercase(),
            20.0,
            "bold",
            "middle",
        ),
        None => {}
    }
    if let Some(time) = &stave.time {
        svg.text(stave.x + 42.0, top + 24.0, &time.to_string(), 14.0, "bold", "middle");
    }
}

fn draw_tab_stave(svg: &mut SvgBuilder, stave: &TabStave, first: f64, last: f64) {
    for i in 0..stave.num_lines {
        let y = first + f64::from(i) * TAB_LINE_SPACING;
        svg.line(stave.x, y, stave.x + stave.width, y, STAFF_COLOR, STAFF_LINE_WIDTH);
    }
    if stave.tab_glyph {
        let step = (last - first) / 3.0;
        for (i, letter) in ["T", "A", "B"].iter().enumerate() {
            let y = first + step * (i as f64 + 0.5) + 5.0;
            svg.text(stave.x + 15.0, y, letter, 14.0, "bold", "middle");
        }
    }
}

fn draw_barline(svg: &mut SvgBuilder, bar: BarType, x: f64, top: f64, bottom: f64) {
    let thin = |svg: &mut SvgBuilder, x: f64| {
        svg.line(x, top, x, bottom, BARLINE_COLOR, BARLINE_WIDTH);
    };
    let thick = |svg: &mut SvgBuilder, x: f64| {
        svg.line(x, top, x, bottom, BARLINE_COLOR, THICK_BARLINE_WIDTH);
    };
    let dots = |svg: &mut SvgBuilder, x: f64| {
        let mid = (top + bottom) / 2.0;
        svg.rect(x - 1.5, mid - 6.0, 3.0, 3.0, BARLINE_COLOR);
        svg.rect(x - 1.5, mid + 3.0, 3.0, 3.0, BARLINE_COLOR);
    };

    match bar {
        BarType::Single => thin(&mut *svg, x),
        BarType::Double => {
            thin(&mut *svg, x - 4.0);
            thin(&mut *svg, x);
        }
        BarType::End => {
            thin(&mut *svg, x - 5.0);
            thick(&mut *svg, x);
        }
        BarType::RepeatBegin => {
            thick(&mut *svg, x);
            thin(&mut *svg, x + 5.0);
            dots(&mut *svg, x + 10.0);
        }
        BarType::RepeatEnd => {
            dots(&mut *svg, x - 10.0);
            thin(&mut *svg, x - 5.0);
            thick(&mut *svg, x);
        }
        BarType::RepeatBoth => {
            dots(&mut *svg, x - 10.0);
            thin(&mut *svg, x - 5.0);
            thick(&mut *svg, x);
            thin(&mut *svg, x + 5.0);
            dots(&mut *svg, x + 10.0);
        }
    }
}

// ─── Notes ──────────────────────────────────────────────────────────

/// Diatonic index of the middle line for `clef`.
fn middle_line(clef: Option<Clef>) -> i32 {
    let pitch = match clef.unwrap_or(Clef::Treble) {
        Clef::Treble | Clef::Percussion => (4, 6),
        Clef::Bass => (3, 1),
        Clef::Tenor => (3, 5),
        Clef::Alto => (4, 0),
    };
    pitch.0 * 7 + pitch.1
}

fn key_y(key: &Pitch, top: f64, clef: Option<Clef>) -> f64 {
    let middle = top + 2.0 * NOTATION_LINE_SPACING;
    middle - f64::from(key.diatonic_index() - middle_line(clef)) * STEP_HEIGHT
}

fn draw_stave_note(
    svg: &mut SvgBuilder,
    note: &StaveNote,
    x: f64,
    top: f64,
    clef: Option<Clef>,
) -> Vec<f64> {
    let middle = top + 2.0 * NOTATION_LINE_SPACING;
    if note.rest {
        let h = if matches!(note.duration.value, NoteValue::Whole | NoteValue::Half) {
            5.0
        } else {
            12.0
        };
        svg.rect(x - 4.0, middle - h / 2.0, 8.0, h, NOTE_COLOR);
        return vec![middle];
    }

    let ys: Vec<f64> = note.keys.iter().map(|k| key_y(k, top, clef)).collect();
    let bottom_line = top + 4.0 * NOTATION_LINE_SPACING;
    for y in &ys {
        let mut ledger = top - NOTATION_LINE_SPACING;
        while ledger >= *y - 1.0 {
            svg.line(x - 9.0, ledger, x + 9.0, ledger, STAFF_COLOR, STAFF_LINE_WIDTH);
            ledger -= NOTATION_LINE_SPACING;
        }
        let mut ledger = bottom_line + NOTATION_LINE_SPACING;
        while ledger <= *y + 1.0 {
            svg.line(x - 9.0, ledger, x + 9.0, ledger, STAFF_COLOR, STAFF_LINE_WIDTH);
            ledger += NOTATION_LINE_SPACING;
        }
        if note.duration.slash {
            svg.line(x - NOTEHEAD_RX, *y + NOTEHEAD_RY, x + NOTEHEAD_RX, *y - NOTEHEAD_RY, NOTE_COLOR, 2.5);
        } else {
            svg.notehead(x, *y, !matches!(note.duration.value, NoteValue::Whole | NoteValue::Half));
        }
    }
    if note.duration.dotted {
        for y in &ys {
            svg.rect(x + 8.0, y - 1.5, 3.0, 3.0, NOTE_COLOR);
        }
    }

    if note.duration.value != NoteValue::Whole && !ys.is_empty() {
        let high = ys.iter().cloned().fold(f64::INFINITY, f64::min);
        let low = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if (high + low) / 2.0 >= middle {
            let sx = x + NOTEHEAD_RX - 0.5;
            svg.line(sx, low, sx, high - STEM_LENGTH, NOTE_COLOR, STEM_WIDTH);
        } else {
            let sx = x - NOTEHEAD_RX + 0.5;
            svg.line(sx, high, sx, low + STEM_LENGTH, NOTE_COLOR, STEM_WIDTH);
        }
    }

    for attached in &note.modifiers {
        let y = ys.get(attached.index).copied().unwrap_or(middle);
        match &attached.modifier {
            Modifier::Accidental {
                accidental,
                cautionary,
            } => {
                let glyph = accidental_glyph(*accidental);
                let text = if *cautionary {
                    format!("({glyph})")
                } else {
                    glyph.to_string()
                };
                svg.text(x - 10.0, y + 4.0, &text, 13.0, "normal", "end");
            }
            Modifier::Fingering { label, position } | Modifier::StringNumber { label, position } => {
                let (dx, dy) = offset_for(*position);
                svg.text(x + dx, y + dy, label, LABEL_FONT_SIZE, "normal", "middle");
            }
            other => draw_note_mark(svg, other, x, top - 12.0, bottom_line + 20.0),
        }
    }
    ys
}

fn draw_tab_note(
    svg: &mut SvgBuilder,
    note: &TabNote,
    x: f64,
    first: f64,
    last: f64,
    beam: &BeamConfig,
) -> Vec<f64> {
    let ys: Vec<f64> = note
        .positions
        .iter()
        .map(|p| first + f64::from(p.string.saturating_sub(1)) * TAB_LINE_SPACING)
        .collect();
    if note.ghost {
        return ys;
    }

    for (position, y) in note.positions.iter().zip(&ys) {
        svg.rect(x - 6.0, y - 6.0, 12.0, 12.0, BACKGROUND);
        svg.text(x, y + 4.0, &position.fret.to_string(), FRET_FONT_SIZE, "normal", "middle");
    }

    if beam.tab_stems && note.stem && note.duration.value != NoteValue::Whole {
        match beam.tab_stem_direction {
            StemDirection::Up => {
                svg.line(x, first - 6.0, x, first - 6.0 - STEM_LENGTH / 2.0, NOTE_COLOR, STEM_WIDTH)
            }
            StemDirection::Down => {
                svg.line(x, last + 6.0, x, last + 6.0 + STEM_LENGTH / 2.0, NOTE_COLOR, STEM_WIDTH)
            }
        }
    }

    for attached in &note.modifiers {
        match &attached.modifier {
            Modifier::Bend { phrase } => {
                let y = ys.get(attached.index).copied().unwrap_or(first);
                svg.path(
                    &format!("M{:.1},{:.1} Q{:.1},{:.1} {:.1},{:.1}", x + 6.0, y, x + 14.0, y, x + 14.0, first - 14.0),
                    NOTE_COLOR,
                    LINK_WIDTH,
                );
                let label: Vec<String> = phrase
                    .iter()
                    .map(|step| match step.direction {
                        BendDirection::Up => step.text.clone(),
                        BendDirection::Down => "release".to_string(),
                    })
                    .collect();
                svg.text(x + 14.0, first - 18.0, &label.join(" / "), LABEL_FONT_SIZE, "normal", "middle");
            }
            other => draw_note_mark(svg, other, x, first - 14.0, last + 22.0),
        }
    }
    ys
}

/// Marks drawn the same way on both views, above or below the note.
fn draw_note_mark(svg: &mut SvgBuilder, modifier: &Modifier, x: f64, above: f64, below: f64) {
    match modifier {
        Modifier::Vibrato { harsh } => {
            let wave = if *harsh { "≈≈≈" } else { "~~~" };
            svg.text(x + 6.0, above, wave, 12.0, "normal", "start");
        }
        Modifier::Articulation { code, position } => {
            let y = if *position == Position::Below { below } else { above };
            svg.text(x, y, articulation_glyph(code), 12.0, "bold", "middle");
        }
        Modifier::Annotation(annotation) => {
            let y = match annotation.justify {
                VerticalJustify::Top => above,
                VerticalJustify::Bottom => below,
            };
            svg.styled_text(
                x,
                y,
                &annotation.text,
                &annotation.font.family,
                f64::from(annotation.font.size),
                annotation.font.style.as_deref(),
                "middle",
            );
        }
        Modifier::Stroke { kind } => {
            let arrow = match kind {
                StrokeKind::BrushUp | StrokeKind::RollUp | StrokeKind::RasquedoUp => "↑",
                StrokeKind::BrushDown | StrokeKind::RollDown | StrokeKind::RasquedoDown => "↓",
            };
            svg.text(x - 12.0, (above + below) / 2.0, arrow, 14.0, "normal", "middle");
        }
        Modifier::Bend { .. }
        | Modifier::Accidental { .. }
        | Modifier::Fingering { .. }
        | Modifier::StringNumber { .. } => {}
    }
}

fn accidental_glyph(accidental: Accidental) -> &'static str {
    match accidental {
        Accidental::DoubleFlat => "𝄫",
        Accidental::Flat => "♭",
        Accidental::Natural => "♮",
        Accidental::Sharp => "♯",
        Accidental::DoubleSharp => "𝄪",
    }
}

fn articulation_glyph(code: &str) -> &str {
    match code {
        "a>" => ">",
        "a." => "·",
        "a-" => "–",
        "a^" => "^",
        "a|" => "∨",
        "am" => "⊓",
        "a@a" | "a@u" => "𝄐",
        "a+" => "+",
        other => other,
    }
}

fn offset_for(position: Position) -> (f64, f64) {
    match position {
        Position::Left => (-14.0, 4.0),
        Position::Right => (14.0, 4.0),
        Position::Above => (0.0, -10.0),
        Position::Below => (0.0, 16.0),
    }
}

// ─── Links ──────────────────────────────────────────────────────────

type Point = (f64, f64);

fn link_points(
    placements: &HashMap<(View, NoteRef), Placement>,
    view: View,
    link: &Link,
) -> Vec<(Point, Point)> {
    let (Some(first), Some(last)) = (
        placements.get(&(view, link.first)),
        placements.get(&(view, link.last)),
    ) else {
        return Vec::new();
    };
    link.first_indices
        .iter()
        .zip(&link.last_indices)
        .filter_map(|(a, b)| Some(((first.x, *first.ys.get(*a)?), (last.x, *last.ys.get(*b)?))))
        .collect()
}

fn draw_curve(svg: &mut SvgBuilder, from: Point, to: Point, control_y: f64) {
    let mid = (from.0 + to.0) / 2.0;
    svg.path(
        &format!(
            "M{:.1},{:.1} Q{:.1},{:.1} {:.1},{:.1}",
            from.0, from.1, mid, control_y, to.0, to.1
        ),
        NOTE_COLOR,
        LINK_WIDTH,
    );
}

fn draw_tuplet(
    svg: &mut SvgBuilder,
    placements: &HashMap<(View, NoteRef), Placement>,
    view: View,
    tuplet: &Tuplet,
) {
    let placed: Vec<&Placement> = tuplet
        .notes
        .iter()
        .filter_map(|n| placements.get(&(view, *n)))
        .collect();
    let (Some(first), Some(last)) = (placed.first(), placed.last()) else {
        return;
    };
    let top = placed
        .iter()
        .flat_map(|p| p.ys.iter().copied())
        .fold(f64::INFINITY, f64::min)
        - STEM_LENGTH
        - 8.0;
    svg.line(first.x - 4.0, top, last.x + 4.0, top, NOTE_COLOR, LINK_WIDTH);
    svg.line(first.x - 4.0, top, first.x - 4.0, top + 5.0, NOTE_COLOR, LINK_WIDTH);
    svg.line(last.x + 4.0, top, last.x + 4.0, top + 5.0, NOTE_COLOR, LINK_WIDTH);
    let label = tuplet.num_notes.to_string();
    let mid = (first.x + last.x) / 2.0;
    svg.rect(mid - 6.0, top - 6.0, 12.0, 12.0, BACKGROUND);
    svg.text(mid, top + 4.0, &label, LABEL_FONT_SIZE, "italic", "middle");
}
