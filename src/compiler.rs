//! Directive front-end.
//!
//! Walks the directive list produced by the external tab parser and drives
//! the [`Artist`]. Errors raised while handling a note element or option
//! are stamped with that record's source location, falling back to the
//! enclosing directive's.

use log::{debug, trace};

use crate::artist::Artist;
use crate::config::{ArtistOptions, StaveConfig, StaveKind};
use crate::error::{CompileError, Result};
use crate::input::{parse_directives, CommandParams, Directive, NoteElement, TextToken};
use crate::note::{BarType, TextJustification};

pub struct Compiler {
    artist: Artist,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(ArtistOptions::default())
    }
}

impl Compiler {
    pub fn new(options: ArtistOptions) -> Self {
        Self {
            artist: Artist::new(options),
        }
    }

    pub fn artist(&self) -> &Artist {
        &self.artist
    }

    pub fn artist_mut(&mut self) -> &mut Artist {
        &mut self.artist
    }

    pub fn into_artist(self) -> Artist {
        self.artist
    }

    /// Discard everything compiled so far.
    pub fn reset(&mut self) {
        self.artist.reset();
    }

    /// Compile `directives` in order. The first error aborts the pass.
    pub fn compile(&mut self, directives: &[Directive]) -> Result<()> {
        debug!("compiling {} directives", directives.len());
        for directive in directives {
            self.directive(directive)
                .map_err(|e| e.at_opt(directive.line, directive.column))?;
        }
        Ok(())
    }

    fn directive(&mut self, directive: &Directive) -> Result<()> {
        match directive.element.as_str() {
            "options" => self.artist.set_options(
                directive
                    .params
                    .iter()
                    .map(|o| (o.key.as_str(), o.value.as_str())),
            ),
            "stave" | "tabstave" => {
                let kind = if directive.element == "stave" {
                    StaveKind::Notation
                } else {
                    StaveKind::Tablature
                };
                let config = StaveConfig::from_options(kind, &directive.options)?;
                self.artist.add_stave(kind, config)?;
                self.body(directive)
            }
            "voice" => {
                let config = StaveConfig::from_options(StaveKind::Implicit, &directive.options)?;
                self.artist.add_voice(config)?;
                self.body(directive)
            }
            other => Err(CompileError::structural(format!(
                "Invalid keyword '{other}'"
            ))),
        }
    }

    /// Notes, then text, of a stave or voice directive.
    fn body(&mut self, directive: &Directive) -> Result<()> {
        for element in &directive.notes {
            self.element(element)
                .map_err(|e| e.at_opt(element.line, element.column))?;
        }
        if !directive.text.is_empty() {
            self.text_line(&directive.text)?;
        }
        Ok(())
    }

    fn element(&mut self, element: &NoteElement) -> Result<()> {
        trace!("element {element:?}");
        if let Some(time) = &element.time {
            self.artist.set_duration(time, element.dot)?;
        }
        if let Some(command) = &element.command {
            self.command(command, element)?;
        }
        if let Some(chord) = &element.chord {
            self.artist
                .add_chord(chord, element.articulation, element.decorator)?;
        }
        if let Some(note) = element.single_note() {
            self.artist.add_note(&note)?;
        }
        Ok(())
    }

    fn command(&mut self, command: &str, element: &NoteElement) -> Result<()> {
        let bad_params = || CompileError::structural(format!("Invalid parameters for '{command}'"));

        match (command, &element.params) {
            ("bar", _) => self
                .artist
                .add_bar(BarType::from_name(element.bar_type.as_deref())),
            ("tuplet", Some(CommandParams::Tuplet { tuplet, notes })) => {
                self.artist.make_tuplets(*tuplet, *notes)
            }
            ("annotations", Some(CommandParams::Annotations(tokens))) => {
                self.artist.add_annotations(tokens)
            }
            // A single token may come through as a bare string.
            ("annotations", Some(CommandParams::Line(token))) => {
                self.artist.add_annotations(std::slice::from_ref(token))
            }
            ("rest", Some(CommandParams::Rest { position })) => self.artist.add_rest(*position),
            ("command", Some(CommandParams::Line(line))) => self.artist.run_command(line),
            ("tuplet" | "annotations" | "rest" | "command", _) => Err(bad_params()),
            (other, _) => Err(CompileError::structural(format!(
                "Invalid command '{other}'"
            ))),
        }
    }

    /// Walk a text line: settings tokens change how later text notes are
    /// made, everything else becomes a text note.
    fn text_line(&mut self, tokens: &[TextToken]) -> Result<()> {
        self.artist.add_text_voice()?;

        let mut position = 0;
        let mut justification = TextJustification::Center;
        let mut smooth = true;

        for token in tokens {
            let text = token.text.trim();
            if let Some(font) = text.strip_prefix(".font=") {
                self.artist.set_text_font(font)?;
            } else if text.starts_with(':') {
                self.artist.set_duration(text, false)?;
            } else if let Some(setting) = text.strip_prefix('.') {
                match setting {
                    "center" => justification = TextJustification::Center,
                    "left" => justification = TextJustification::Left,
                    "right" => justification = TextJustification::Right,
                    "strict" => smooth = false,
                    "smooth" => smooth = true,
                    "bar" | "|" => self.bar_text(justification)?,
                    line => {
                        position = line.parse().map_err(|_| {
                            CompileError::syntax(format!("Invalid text setting: '{text}'"))
                        })?;
                    }
                }
            } else if text == "|" {
                self.bar_text(justification)?;
            } else if text.starts_with("++") {
                self.artist.add_text_voice()?;
            } else {
                let (text, ignore_ticks) = match text.strip_prefix('|') {
                    Some(rest) => (rest, true),
                    None => (text, false),
                };
                self.artist
                    .add_text_note(text, position, justification, smooth, ignore_ticks)?;
            }
        }
        Ok(())
    }

    /// Empty, zero-tick text note standing in for a bar line.
    fn bar_text(&mut self, justification: TextJustification) -> Result<()> {
        self.artist.add_text_note("", 0, justification, false, true)
    }
}

/// Compile a JSON directive list with default options.
pub fn compile_json(json: &str) -> Result<Artist> {
    compile_json_with(json, ArtistOptions::default())
}

/// Compile a JSON directive list with the given construction options.
pub fn compile_json_with(json: &str, options: ArtistOptions) -> Result<Artist> {
    let directives = parse_directives(json)?;
    let mut compiler = Compiler::new(options);
    compiler.compile(&directives)?;
    Ok(compiler.into_artist())
}
