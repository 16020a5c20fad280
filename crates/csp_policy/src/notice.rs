//! Diagnostic notices.
//!
//! Parsing never fails outright; everything the parser has to say about its
//! input arrives here. Callers that need strict behaviour scan the sink for
//! [`NoticeKind::Error`] entries after the parse returns.

use crate::token::Location;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    /// Informational, no action needed.
    Info,
    /// Deprecated, experimental, or inadvisable construct; still parsed.
    Warning,
    /// Malformed construct; its directive was dropped from the result.
    Error,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One diagnostic record produced during a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Human-readable message.
    pub message: String,
    /// Where in the header text the notice applies, when known.
    pub location: Option<Location>,
}

impl Notice {
    /// Creates a notice with the given severity.
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    /// Creates an informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, message)
    }

    /// Creates a warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Warning, message)
    }

    /// Creates an error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    /// Attaches a source location.
    #[must_use]
    pub const fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Returns true for error-severity notices.
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, NoticeKind::Error)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{}: {} ({location})", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_constructor_is_error() {
        let notice = Notice::error("bad token");
        assert!(notice.is_error());
        assert_eq!(notice.kind, NoticeKind::Error);
    }

    #[test]
    fn warning_is_not_error() {
        assert!(!Notice::warning("deprecated").is_error());
        assert!(!Notice::info("note").is_error());
    }

    #[test]
    fn display_includes_location_when_present() {
        let notice = Notice::error("bad token").at(Location {
            line: 1,
            column: 4,
            offset: 4,
        });
        assert_eq!(notice.to_string(), "ERROR: bad token (line 1, column 4)");
    }

    #[test]
    fn display_without_location() {
        assert_eq!(Notice::warning("deprecated").to_string(), "WARNING: deprecated");
    }
}
