//! Annotation mini-language.
//!
//! Annotation tokens are plain text unless they start with a dot directive:
//!
//! | Token                      | Meaning                                   |
//! |----------------------------|-------------------------------------------|
//! | `.a>/t.`                   | score articulation `a>` above (`b` below) |
//! | `.stroke/bu.`              | stroke: `bu bd ru rd qu qd`               |
//! | `.fingering/1:l:f:2-2:r:s:3.` | fingerings / string numbers            |
//! | `.Face-Size-Style.text`    | text with a font override                 |
//! | `.big.text`, `.italic.text`, `.medium.text` | styled text              |
//! | `.top.text`, `.bottom.text` | text with a (sticky) vertical position   |
//!
//! Parsing is isolated from the compiler state; applying a [`Markup`] to
//! notes is the compiler's job.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::{CompileError, Result};

lazy_static! {
    static ref FINGERING: Regex = Regex::new(r"^\.fingering/([^.]+)\.").unwrap();
    static ref FINGER_PIECE: Regex = Regex::new(r"^(\d+):([ablr]):([fs]):([^-.]+)$").unwrap();
    static ref STROKE: Regex = Regex::new(r"^\.stroke/([^.]+)\.").unwrap();
    static ref SCORE_ARTICULATION: Regex = Regex::new(r"^\.(a[^/]*)/(t|b)[^.]*\.").unwrap();
    static ref FONT_OVERRIDE: Regex = Regex::new(r"^\.([^-]*)-([^-]*)-([^.]*)\.(.*)$").unwrap();
    static ref SHORTCUT: Regex = Regex::new(r"^\.([^.]*)\.(.*)$").unwrap();
    static ref FONT_SPEC: Regex = Regex::new(r"^([^-]*)-([^-]*)-([^.]*)").unwrap();
}

/// Where a modifier sits relative to its note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeKind {
    BrushUp,
    BrushDown,
    RollUp,
    RollDown,
    RasquedoUp,
    RasquedoDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerKind {
    /// Fretting-hand finger
    Finger,
    /// Circled string number
    StringNumber,
}

/// One `note:position:kind:label` entry of a fingering token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerSpec {
    /// 1-based key index within the chord, as written
    pub note: usize,
    pub position: Position,
    pub kind: FingerKind,
    pub label: String,
}

/// A font given as `Face-Size-Style`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontSpec {
    pub family: String,
    pub size: u32,
    pub style: Option<String>,
}

impl FontSpec {
    /// Parse `Face-Size-Style` (as used by `.font=` text directives).
    pub fn parse(spec: &str) -> Result<Option<FontSpec>> {
        match FONT_SPEC.captures(spec) {
            Some(caps) => Ok(Some(font_from_parts(&caps[1], &caps[2], &caps[3])?)),
            None => Ok(None),
        }
    }
}

fn font_from_parts(family: &str, size: &str, style: &str) -> Result<FontSpec> {
    let size = size
        .trim()
        .parse::<u32>()
        .map_err(|_| CompileError::syntax(format!("Invalid font size: '{size}'")))?;
    Ok(FontSpec {
        family: family.to_string(),
        size,
        style: if style.is_empty() {
            None
        } else {
            Some(style.to_string())
        },
    })
}

/// Style shortcut given as `.name.` before annotation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortcut {
    Big,
    Italic,
    Medium,
    Top,
    Bottom,
    /// Unrecognized shortcuts style nothing
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMarkup {
    Plain(String),
    Font { font: FontSpec, text: String },
    Styled { shortcut: Shortcut, text: String },
}

impl TextMarkup {
    pub fn text(&self) -> &str {
        match self {
            TextMarkup::Plain(text) => text,
            TextMarkup::Font { text, .. } => text,
            TextMarkup::Styled { text, .. } => text,
        }
    }
}

/// A classified annotation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    ScoreArticulation { code: String, position: Position },
    Stroke(StrokeKind),
    Fingering(Vec<FingerSpec>),
    Text(TextMarkup),
}

impl Markup {
    pub fn parse(token: &str) -> Result<Markup> {
        if let Some(caps) = SCORE_ARTICULATION.captures(token) {
            let position = if &caps[2] == "t" {
                Position::Above
            } else {
                Position::Below
            };
            return Ok(Markup::ScoreArticulation {
                code: caps[1].to_string(),
                position,
            });
        }

        if let Some(caps) = STROKE.captures(token) {
            return parse_stroke(&caps[1]).map(Markup::Stroke);
        }

        if let Some(caps) = FINGERING.captures(token) {
            return parse_fingering(&caps[1]).map(Markup::Fingering);
        }

        parse_text(token).map(Markup::Text)
    }
}

fn parse_stroke(kind: &str) -> Result<StrokeKind> {
    match kind {
        "bu" => Ok(StrokeKind::BrushUp),
        "bd" => Ok(StrokeKind::BrushDown),
        "ru" => Ok(StrokeKind::RollUp),
        "rd" => Ok(StrokeKind::RollDown),
        "qu" => Ok(StrokeKind::RasquedoUp),
        "qd" => Ok(StrokeKind::RasquedoDown),
        other => Err(CompileError::syntax(format!("Invalid stroke type: {other}"))),
    }
}

fn parse_fingering(body: &str) -> Result<Vec<FingerSpec>> {
    let bad = || CompileError::syntax(format!("Bad fingering: {body}"));
    body.split('-')
        .map(str::trim)
        .map(|piece| {
            let caps = FINGER_PIECE.captures(piece).ok_or_else(bad)?;
            let note = caps[1].parse::<usize>().map_err(|_| bad())?;
            let position = match &caps[2] {
                "l" => Position::Left,
                "a" => Position::Above,
                "b" => Position::Below,
                _ => Position::Right,
            };
            let kind = if &caps[3] == "s" {
                FingerKind::StringNumber
            } else {
                FingerKind::Finger
            };
            Ok(FingerSpec {
                note,
                position,
                kind,
                label: caps[4].to_string(),
            })
        })
        .collect()
}

fn parse_text(token: &str) -> Result<TextMarkup> {
    if let Some(caps) = FONT_OVERRIDE.captures(token) {
        return Ok(TextMarkup::Font {
            font: font_from_parts(&caps[1], &caps[2], &caps[3])?,
            text: caps[4].to_string(),
        });
    }

    if let Some(caps) = SHORTCUT.captures(token) {
        let shortcut = match &caps[1] {
            "big" => Shortcut::Big,
            "italic" | "italics" => Shortcut::Italic,
            "medium" => Shortcut::Medium,
            "top" => Shortcut::Top,
            "bottom" => Shortcut::Bottom,
            other => Shortcut::Other(other.to_string()),
        };
        return Ok(TextMarkup::Styled {
            shortcut,
            text: caps[2].to_string(),
        });
    }

    Ok(TextMarkup::Plain(token.to_string()))
}
