use std::fmt;

use super::ErrorCode;

/// How a fatal error reads to the person compiling.
///
/// Built from a [`CompileError`](crate::CompileError) by
/// [`to_diagnostic`](crate::CompileError::to_diagnostic); the driver may
/// attach the module the error came from with [`in_module`](Self::in_module).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    /// Dotted path of the module being compiled, `None` for the root.
    pub module: Option<String>,
    pub notes: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            message: message.into(),
            module: None,
            notes: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    #[must_use]
    pub fn in_module(mut self, dotted: impl Into<String>) -> Self {
        self.module = Some(dotted.into());
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// A compiler bug rather than a fault in the program.
    pub fn is_internal(&self) -> bool {
        self.code.is_internal()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error [{}]", self.code)?;
        if let Some(module) = &self.module {
            write!(f, " in '{module}'")?;
        }
        write!(f, ": {}", self.message)?;
        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }
        for suggestion in &self.suggestions {
            write!(f, "\n  = help: {suggestion}")?;
        }
        Ok(())
    }
}
