//! Annotation tokens applied to the most recent notes.

use log::{debug, warn};

use super::Artist;
use crate::config::VerticalJustify;
use crate::error::{CompileError, Result};
use crate::markup::{FingerKind, FontSpec, Markup, Shortcut, TextMarkup};
use crate::note::{Annotation, Modifier};

impl Artist {
    /// Apply one token per note, ending at the last note written.
    pub fn add_annotations(&mut self, tokens: &[String]) -> Result<()> {
        debug!("add annotations {tokens:?}");
        let parsed = tokens
            .iter()
            .map(|t| Markup::parse(t))
            .collect::<Result<Vec<_>>>()?;

        let (has_tab, has_notation, tab_len, note_len) = {
            let stave = self.stave()?;
            (
                stave.tab.is_some(),
                stave.notation.is_some(),
                stave.tab_notes.len(),
                stave.note_notes.len(),
            )
        };
        if parsed.len() > tab_len {
            return Err(CompileError::arity("More annotations than note elements"));
        }

        if has_tab {
            let start = tab_len - parsed.len();
            for (i, markup) in parsed.iter().enumerate() {
                let modifier = match markup {
                    Markup::ScoreArticulation { code, position } => Some(Modifier::Articulation {
                        code: code.clone(),
                        position: *position,
                    }),
                    Markup::Stroke(kind) => Some(Modifier::Stroke { kind: *kind }),
                    Markup::Text(text) => self.make_annotation(text).map(Modifier::Annotation),
                    Markup::Fingering(_) => None,
                };
                if let Some(modifier) = modifier {
                    self.stave_mut()?.tab_notes[start + i].add_modifier(0, modifier);
                }
            }
        } else {
            let start = note_start(note_len, parsed.len())?;
            for (i, markup) in parsed.iter().enumerate() {
                if let Markup::Text(text) = markup {
                    if let Some(annotation) = self.make_annotation(text) {
                        self.stave_mut()?.note_notes[start + i]
                            .add_modifier(0, Modifier::Annotation(annotation));
                    }
                }
            }
        }

        if has_notation {
            let start = note_start(note_len, parsed.len())?;
            let stave = self.stave_mut()?;
            for (i, (markup, token)) in parsed.iter().zip(tokens).enumerate() {
                let note = &mut stave.note_notes[start + i];
                match markup {
                    Markup::ScoreArticulation { code, position } => note.add_modifier(
                        0,
                        Modifier::Articulation {
                            code: code.clone(),
                            position: *position,
                        },
                    ),
                    Markup::Stroke(kind) => note.add_modifier(0, Modifier::Stroke { kind: *kind }),
                    Markup::Fingering(fingers) => {
                        let keys = note.key_count();
                        for finger in fingers {
                            if finger.note == 0 || finger.note > keys {
                                return Err(CompileError::arity(format!(
                                    "Bad note number in fingering: {token}"
                                )));
                            }
                            let label = finger.label.clone();
                            let position = finger.position;
                            let modifier = match finger.kind {
                                FingerKind::Finger => Modifier::Fingering { label, position },
                                FingerKind::StringNumber => {
                                    Modifier::StringNumber { label, position }
                                }
                            };
                            note.add_modifier(finger.note - 1, modifier);
                        }
                    }
                    Markup::Text(_) => {}
                }
            }
        }
        Ok(())
    }

    /// Build a text annotation in the current font. `.top.`/`.bottom.`
    /// also change the default position for later annotations.
    fn make_annotation(&mut self, markup: &TextMarkup) -> Option<Annotation> {
        let mut font = self.annotation_font();
        let mut justify = self.score.customizations.annotation_position;

        match markup {
            TextMarkup::Plain(_) => {}
            TextMarkup::Font { font: over, .. } => font = over.clone(),
            TextMarkup::Styled { shortcut, .. } => match shortcut {
                Shortcut::Big => {
                    font.style = Some("bold".to_string());
                    font.size = 14;
                }
                Shortcut::Italic => {
                    font.family = "Times".to_string();
                    font.style = Some("italic".to_string());
                }
                Shortcut::Medium => font.size = 12,
                Shortcut::Top => {
                    justify = VerticalJustify::Top;
                    self.score.customizations.annotation_position = justify;
                }
                Shortcut::Bottom => {
                    justify = VerticalJustify::Bottom;
                    self.score.customizations.annotation_position = justify;
                }
                Shortcut::Other(_) => {}
            },
        }

        let text = markup.text();
        if text.is_empty() && !matches!(markup, TextMarkup::Plain(_)) {
            warn!("skipping empty annotation {markup:?}");
            return None;
        }
        Some(Annotation {
            text: text.to_string(),
            font,
            justify,
        })
    }

    /// The annotation font currently in force.
    pub(super) fn annotation_font(&self) -> FontSpec {
        let c = &self.score.customizations;
        FontSpec {
            family: c.font_face.clone(),
            size: c.font_size,
            style: c.font_style.clone(),
        }
    }
}

fn note_start(len: usize, count: usize) -> Result<usize> {
    len.checked_sub(count)
        .ok_or_else(|| CompileError::arity("More annotations than note elements"))
}
