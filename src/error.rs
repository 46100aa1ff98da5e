//! Error types for tab compilation.
//!
//! Every failure aborts the current compilation pass. Errors raised deep in
//! the compiler carry no location; the directive front-end stamps the source
//! line/column of the directive or note element being processed.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// What class of problem stopped compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Unknown option key or invalid option value
    Config,
    /// Unknown directive kind, unknown session command, misplaced element
    Structural,
    /// A note position that cannot be turned into a pitch
    Resolution,
    /// Counts that don't line up (tuplets, annotations, fingerings)
    Arity,
    /// Malformed annotation mini-language or duration token
    Syntax,
    /// The directive stream itself could not be decoded
    Input,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Config => "Config",
            ErrorKind::Structural => "Structural",
            ErrorKind::Resolution => "Resolution",
            ErrorKind::Arity => "Arity",
            ErrorKind::Syntax => "Syntax",
            ErrorKind::Input => "Input",
        };
        f.write_str(name)
    }
}

/// Source position reported by the external parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} error: {message}{}", describe_location(.location))]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Location>,
}

fn describe_location(location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!(" at line {} column {}", loc.line, loc.column),
        None => String::new(),
    }
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, message)
    }

    pub fn resolution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resolution, message)
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Input, message)
    }

    /// Attach a source location unless one is already set; the innermost
    /// location wins.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        if self.location.is_none() {
            self.location = Some(Location { line, column });
        }
        self
    }

    /// Like [`CompileError::at`], for positions the parser may have omitted.
    pub fn at_opt(self, line: Option<u32>, column: Option<u32>) -> Self {
        match (line, column) {
            (Some(l), c) => self.at(l, c.unwrap_or(0)),
            (None, _) => self,
        }
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(err: serde_json::Error) -> Self {
        let line = u32::try_from(err.line()).unwrap_or(u32::MAX);
        let column = u32::try_from(err.column()).unwrap_or(u32::MAX);
        CompileError::input(err.to_string()).at(line, column)
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_location() {
        let err = CompileError::arity("Not enough notes for tuplet").at(3, 7);
        assert_eq!(
            err.to_string(),
            "Arity error: Not enough notes for tuplet at line 3 column 7"
        );
    }

    #[test]
    fn innermost_location_is_kept() {
        let err = CompileError::syntax("Bad fingering").at(2, 4).at(1, 1);
        assert_eq!(err.location, Some(Location { line: 2, column: 4 }));
    }

    #[test]
    fn missing_line_leaves_error_unlocated() {
        let err = CompileError::config("Invalid option 'x'").at_opt(None, Some(3));
        assert_eq!(err.location, None);
        assert_eq!(err.to_string(), "Config error: Invalid option 'x'");
    }

    #[test]
    fn json_errors_become_input_errors() {
        let err: CompileError = serde_json::from_str::<Vec<u32>>("[1, oops]")
            .unwrap_err()
            .into();
        assert_eq!(err.kind, ErrorKind::Input);
        assert_eq!(err.location.map(|l| l.line), Some(1));
    }
}
