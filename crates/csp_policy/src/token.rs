//! Token stream model.
//!
//! The lexer classifies raw header text into these tokens; the parser reads
//! them left to right through a monotonic cursor and never mutates them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the header text.
///
/// `line` is 1-based. `column` and `offset` are byte counts; header text is
/// printable ASCII wherever a location is attached, so byte and character
/// positions coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// Byte column within the line, starting at 0.
    pub column: usize,
    /// Byte offset from the start of the input.
    pub offset: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Tag identifying what a token's text represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// `,` — boundary between policies in a policy list.
    PolicySeparator,
    /// `;` — boundary between directives within one policy.
    DirectiveSeparator,
    /// A directive name, tagged with its recognised kind.
    DirectiveName(DirectiveKind),
    /// The raw value text following a directive name.
    DirectiveValue,
    /// Text the lexer could not classify (non-ASCII or non-printable bytes).
    Unknown,
}

/// One classified span of header text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// What the span represents.
    pub kind: TokenKind,
    /// The raw text of the span.
    pub value: String,
    /// Position of the first byte, when known.
    pub start: Option<Location>,
    /// Position one past the last byte, when known.
    pub end: Option<Location>,
}

impl Token {
    /// Creates an unlocated token.
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            start: None,
            end: None,
        }
    }
}

/// The closed set of directive names the parser understands.
///
/// `Allow` and `Options` are pre-specification legacy names that are always
/// rejected; `Unrecognised` covers everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectiveKind {
    /// `base-uri`.
    BaseUri,
    /// `block-all-mixed-content`.
    BlockAllMixedContent,
    /// `child-src`.
    ChildSrc,
    /// `connect-src`.
    ConnectSrc,
    /// `default-src`.
    DefaultSrc,
    /// `font-src`.
    FontSrc,
    /// `form-action`.
    FormAction,
    /// `frame-ancestors`.
    FrameAncestors,
    /// `frame-src` (deprecated in favour of `child-src`).
    FrameSrc,
    /// `img-src`.
    ImgSrc,
    /// `manifest-src`.
    ManifestSrc,
    /// `media-src`.
    MediaSrc,
    /// `object-src`.
    ObjectSrc,
    /// `plugin-types`.
    PluginTypes,
    /// `referrer`.
    Referrer,
    /// `report-uri`.
    ReportUri,
    /// `sandbox`.
    Sandbox,
    /// `script-src`.
    ScriptSrc,
    /// `style-src`.
    StyleSrc,
    /// `upgrade-insecure-requests`.
    UpgradeInsecureRequests,
    /// `allow` (replaced by `default-src`).
    Allow,
    /// `options` (replaced by `'unsafe-inline'` and `'unsafe-eval'`).
    Options,
    /// Any name not in this enumeration.
    Unrecognised,
}

impl DirectiveKind {
    /// Looks up a directive name, case-insensitively.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "base-uri" => Self::BaseUri,
            "block-all-mixed-content" => Self::BlockAllMixedContent,
            "child-src" => Self::ChildSrc,
            "connect-src" => Self::ConnectSrc,
            "default-src" => Self::DefaultSrc,
            "font-src" => Self::FontSrc,
            "form-action" => Self::FormAction,
            "frame-ancestors" => Self::FrameAncestors,
            "frame-src" => Self::FrameSrc,
            "img-src" => Self::ImgSrc,
            "manifest-src" => Self::ManifestSrc,
            "media-src" => Self::MediaSrc,
            "object-src" => Self::ObjectSrc,
            "plugin-types" => Self::PluginTypes,
            "referrer" => Self::Referrer,
            "report-uri" => Self::ReportUri,
            "sandbox" => Self::Sandbox,
            "script-src" => Self::ScriptSrc,
            "style-src" => Self::StyleSrc,
            "upgrade-insecure-requests" => Self::UpgradeInsecureRequests,
            "allow" => Self::Allow,
            "options" => Self::Options,
            _ => Self::Unrecognised,
        }
    }

    /// Canonical header spelling of this directive name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::BaseUri => "base-uri",
            Self::BlockAllMixedContent => "block-all-mixed-content",
            Self::ChildSrc => "child-src",
            Self::ConnectSrc => "connect-src",
            Self::DefaultSrc => "default-src",
            Self::FontSrc => "font-src",
            Self::FormAction => "form-action",
            Self::FrameAncestors => "frame-ancestors",
            Self::FrameSrc => "frame-src",
            Self::ImgSrc => "img-src",
            Self::ManifestSrc => "manifest-src",
            Self::MediaSrc => "media-src",
            Self::ObjectSrc => "object-src",
            Self::PluginTypes => "plugin-types",
            Self::Referrer => "referrer",
            Self::ReportUri => "report-uri",
            Self::Sandbox => "sandbox",
            Self::ScriptSrc => "script-src",
            Self::StyleSrc => "style-src",
            Self::UpgradeInsecureRequests => "upgrade-insecure-requests",
            Self::Allow => "allow",
            Self::Options => "options",
            Self::Unrecognised => "unrecognised",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(DirectiveKind::from_name("default-src"), DirectiveKind::DefaultSrc);
        assert_eq!(DirectiveKind::from_name("Default-SRC"), DirectiveKind::DefaultSrc);
        assert_eq!(DirectiveKind::from_name("SANDBOX"), DirectiveKind::Sandbox);
    }

    #[test]
    fn unknown_names_map_to_unrecognised() {
        assert_eq!(DirectiveKind::from_name("worker-src"), DirectiveKind::Unrecognised);
        assert_eq!(DirectiveKind::from_name(""), DirectiveKind::Unrecognised);
    }

    #[test]
    fn name_round_trips() {
        for kind in [
            DirectiveKind::BaseUri,
            DirectiveKind::FrameAncestors,
            DirectiveKind::UpgradeInsecureRequests,
            DirectiveKind::PluginTypes,
        ] {
            assert_eq!(DirectiveKind::from_name(kind.name()), kind);
        }
    }

    #[test]
    fn location_displays_line_and_column() {
        let location = Location {
            line: 1,
            column: 12,
            offset: 12,
        };
        assert_eq!(location.to_string(), "line 1, column 12");
    }
}
