//! Typed directive-value model.
//!
//! Closed sum types for everything that can appear in a directive value,
//! plus the token-grammar checks the classifiers run against sub-tokens.
//! A value of one of these types is always well-formed by construction.

use crate::uri;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Digest algorithm of a hash-source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-256, 32-byte digests.
    Sha256,
    /// SHA-384, 48-byte digests.
    Sha384,
    /// SHA-512, 64-byte digests.
    Sha512,
}

impl HashAlgorithm {
    /// Expected decoded digest length in bytes.
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// The label used in header text.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Port constraint of a host-source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Port {
    /// No port given and no scheme default applies.
    Unspecified,
    /// No port given; the scheme's default applies.
    Default(u16),
    /// `:*` — any port.
    Wildcard,
    /// A literal port number.
    Explicit(u16),
}

/// The host form of a source-expression: optional scheme, host pattern,
/// port constraint, optional path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSource {
    /// Scheme, stored without its `://` separator.
    pub scheme: Option<String>,
    /// Host pattern: `*`, `*.`-prefixed, or dotted labels.
    pub host: String,
    /// Port constraint.
    pub port: Port,
    /// Path, when present.
    pub path: Option<String>,
}

/// One permitted-source token inside a source-list directive value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceExpression {
    /// `'none'` — the empty source set.
    None,
    /// `'self'` — the protected resource's own origin.
    #[serde(rename = "self")]
    Self_,
    /// `'unsafe-inline'`.
    UnsafeInline,
    /// `'unsafe-eval'`.
    UnsafeEval,
    /// `'unsafe-redirect'` (removed as of CSP 2).
    UnsafeRedirect,
    /// `'nonce-…'` with its raw payload.
    Nonce(String),
    /// `'sha256-…'`, `'sha384-…'` or `'sha512-…'` with the decoded digest.
    Hash {
        /// Digest algorithm.
        algorithm: HashAlgorithm,
        /// Decoded digest bytes.
        digest: Vec<u8>,
    },
    /// Bare `scheme:`.
    Scheme(String),
    /// Host pattern.
    Host(HostSource),
}

/// A source restricted to the narrower `frame-ancestors` grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AncestorSource {
    /// `'none'`.
    None,
    /// `'self'`.
    #[serde(rename = "self")]
    Self_,
    /// Bare `scheme:`.
    Scheme(String),
    /// Host pattern.
    Host(HostSource),
}

/// A `type/subtype` media type from a `plugin-types` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaType {
    /// Top-level type, e.g. `application`.
    pub kind: String,
    /// Subtype, e.g. `pdf`.
    pub subtype: String,
}

impl MediaType {
    /// Parses `type/subtype`; both sides must match the token grammar.
    pub fn parse(value: &str) -> Option<Self> {
        let (kind, subtype) = value.split_once('/')?;
        if is_media_token(kind) && is_media_token(subtype) {
            Some(Self {
                kind: kind.to_string(),
                subtype: subtype.to_string(),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}

/// A validated referrer policy token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerValue(String);

const REFERRER_TOKENS: [&str; 5] = [
    "no-referrer",
    "no-referrer-when-downgrade",
    "origin",
    "origin-when-cross-origin",
    "unsafe-url",
];

impl ReferrerValue {
    /// Parses a referrer token, case-insensitively; the raw spelling is kept.
    pub fn parse(value: &str) -> Option<Self> {
        let lower = value.to_ascii_lowercase();
        if REFERRER_TOKENS.contains(&lower.as_str()) {
            Some(Self(value.to_string()))
        } else {
            None
        }
    }

    /// The raw token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A validated sandbox token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxValue(String);

/// The enumerated sandbox keywords; matching is case-sensitive.
pub const SANDBOX_KEYWORDS: [&str; 8] = [
    "allow-forms",
    "allow-modals",
    "allow-pointer-lock",
    "allow-popups",
    "allow-popups-to-escape-sandbox",
    "allow-same-origin",
    "allow-scripts",
    "allow-top-navigation",
];

impl SandboxValue {
    pub(crate) fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    /// True when the token is one of the enumerated sandbox keywords.
    pub fn is_enumerated(value: &str) -> bool {
        SANDBOX_KEYWORDS.contains(&value)
    }

    /// Generic token-character grammar for non-enumerated sandbox tokens.
    pub fn is_token(value: &str) -> bool {
        !value.is_empty() && value.chars().all(is_sandbox_token_char)
    }

    /// The raw token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parses the host form of a source-expression.
pub(crate) fn parse_host_source(value: &str) -> Option<HostSource> {
    let (scheme, rest) = match value.split_once("://") {
        Some((scheme, rest)) if uri::is_scheme_name(scheme) => (Some(scheme), rest),
        Some(_) => return None,
        None => (None, value),
    };
    let (host, rest) = scan_host(rest)?;
    let (port, rest) = scan_port(rest, scheme)?;
    let path = scan_path(rest)?;
    Some(HostSource {
        scheme: scheme.map(str::to_string),
        host: host.to_string(),
        port,
        path,
    })
}

fn scan_host(input: &str) -> Option<(&str, &str)> {
    if let Some(rest) = input.strip_prefix('*') {
        if rest.is_empty() || rest.starts_with(':') || rest.starts_with('/') {
            return Some(input.split_at(1));
        }
        if let Some(labels) = rest.strip_prefix('.') {
            let len = scan_labels(labels)?;
            return Some(input.split_at(2 + len));
        }
        return None;
    }
    let len = scan_labels(input)?;
    Some(input.split_at(len))
}

fn scan_labels(input: &str) -> Option<usize> {
    let mut len = label_len(input)?;
    while let Some(rest) = input[len..].strip_prefix('.') {
        match label_len(rest) {
            Some(next) => len += 1 + next,
            None => break,
        }
    }
    Some(len)
}

fn label_len(input: &str) -> Option<usize> {
    let len = input
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .count();
    if len == 0 {
        None
    } else {
        Some(len)
    }
}

fn scan_port<'a>(input: &'a str, scheme: Option<&str>) -> Option<(Port, &'a str)> {
    let Some(rest) = input.strip_prefix(':') else {
        let port = scheme
            .and_then(uri::default_port)
            .map_or(Port::Unspecified, Port::Default);
        return Some((port, input));
    };
    if let Some(rest) = rest.strip_prefix('*') {
        return Some((Port::Wildcard, rest));
    }
    let len = rest.chars().take_while(char::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    let port = rest[..len].parse::<u16>().ok()?;
    Some((Port::Explicit(port), &rest[len..]))
}

fn scan_path(input: &str) -> Option<Option<String>> {
    if input.is_empty() {
        return Some(None);
    }
    if input.starts_with('/') && input.chars().all(is_path_char) {
        return Some(Some(input.to_string()));
    }
    None
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '/' | '-'
                | '.'
                | '_'
                | '~'
                | '%'
                | '!'
                | '$'
                | '&'
                | '\''
                | '('
                | ')'
                | '*'
                | '+'
                | ','
                | ';'
                | '='
                | ':'
                | '@'
        )
}

fn is_media_token(value: &str) -> bool {
    !value.is_empty() && value.chars().all(is_media_token_char)
}

fn is_media_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}

fn is_sandbox_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}
