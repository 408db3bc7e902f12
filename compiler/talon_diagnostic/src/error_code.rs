use std::fmt;

/// Stable codes for compiler diagnostics.
///
/// The first digit names the phase:
/// - E2xxx: type calculation and call checking
/// - E3xxx: imports
/// - E9xxx: internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Type mismatch
    E2001,
    /// Unknown identifier
    E2003,
    /// Wrong number of arguments
    E2004,
    /// Bad named/positional argument usage
    E2005,
    /// Unknown operation or method on a type
    E2006,
    /// Import not found
    E3001,
    /// Import cycle
    E3002,
    /// Internal compiler error
    E9001,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// One-line description of the code.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E2001 => "type mismatch",
            ErrorCode::E2003 => "unknown identifier",
            ErrorCode::E2004 => "wrong number of arguments",
            ErrorCode::E2005 => "invalid argument list",
            ErrorCode::E2006 => "unknown operation",
            ErrorCode::E3001 => "import not found",
            ErrorCode::E3002 => "import cycle",
            ErrorCode::E9001 => "internal compiler error",
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
