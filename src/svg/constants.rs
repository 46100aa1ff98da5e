//! Shared constants for the preview engine (all in SVG user units).

// ── Staves ──────────────────────────────────────────────────────────
/// Notation staves draw their top line this far below the stave's y.
pub(super) const NOTATION_TOP_OFFSET: f64 = 40.0;
/// Tablature staves draw their first string this far below the stave's y.
pub(super) const TAB_TOP_OFFSET: f64 = 26.0;
/// Notes start this far in when the stave doesn't say otherwise.
pub(super) const DEFAULT_NOTE_START: f64 = 60.0;
pub(super) const RIGHT_PADDING: f64 = 20.0;
/// Vertical distance of one diatonic step on a notation stave.
pub(super) const STEP_HEIGHT: f64 = 5.0;

// ── Notes ───────────────────────────────────────────────────────────
pub(super) const NOTEHEAD_RX: f64 = 5.5;
pub(super) const NOTEHEAD_RY: f64 = 4.0;
pub(super) const STEM_LENGTH: f64 = 30.0;
pub(super) const STEM_WIDTH: f64 = 1.2;
pub(super) const FRET_FONT_SIZE: f64 = 11.0;
pub(super) const LABEL_FONT_SIZE: f64 = 10.0;

// ── Lines ───────────────────────────────────────────────────────────
pub(super) const STAFF_LINE_WIDTH: f64 = 0.8;
pub(super) const BARLINE_WIDTH: f64 = 1.0;
pub(super) const THICK_BARLINE_WIDTH: f64 = 3.0;
pub(super) const LINK_WIDTH: f64 = 1.2;

// ── Colors ──────────────────────────────────────────────────────────
pub(super) const NOTE_COLOR: &str = "#1a1a1a";
pub(super) const STAFF_COLOR: &str = "#555555";
pub(super) const BARLINE_COLOR: &str = "#333333";
pub(super) const BACKGROUND: &str = "#ffffff";
