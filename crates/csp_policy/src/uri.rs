//! Origin and URI references.
//!
//! A minimal scheme/host/port/path model: enough to carry `report-uri`
//! values and to resolve relative references against the origin a policy is
//! evaluated for. Not a general RFC 3986 implementation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing origins and URI references.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UriError {
    /// The origin string is not `scheme://host[:port]`.
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),
    /// The value is neither an absolute URI nor resolvable against the origin.
    #[error("invalid uri-reference: {0}")]
    InvalidReference(String),
}

/// The origin a policy is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Lowercased scheme.
    pub scheme: String,
    /// Lowercased host.
    pub host: String,
    /// Explicit port, or the scheme default when one is known.
    pub port: Option<u16>,
}

impl Origin {
    /// Parses `scheme://host[:port]`; a missing port falls back to the
    /// scheme's default when one is known.
    ///
    /// # Errors
    ///
    /// Returns [`UriError::InvalidOrigin`] when the input does not have the
    /// `scheme://host[:port]` shape.
    pub fn parse(input: &str) -> Result<Self, UriError> {
        let invalid = || UriError::InvalidOrigin(input.to_string());
        let (scheme, rest) = input.split_once("://").ok_or_else(invalid)?;
        if !is_scheme_name(scheme) {
            return Err(invalid());
        }
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        let (host, port) = split_host_port(rest).ok_or_else(invalid)?;
        let scheme = scheme.to_ascii_lowercase();
        let port = port.or_else(|| default_port(&scheme));
        Ok(Self {
            scheme,
            host: host.to_ascii_lowercase(),
            port,
        })
    }
}

impl FromStr for Origin {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

/// An absolute or origin-resolved URI reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uri {
    /// Scheme without its separator.
    pub scheme: String,
    /// Host.
    pub host: String,
    /// Explicit port, or the scheme default when one is known.
    pub port: Option<u16>,
    /// Path and any trailing query, possibly empty.
    pub path: String,
}

impl Uri {
    /// Parses an absolute reference `scheme://host[:port][/path]`.
    ///
    /// # Errors
    ///
    /// Returns [`UriError::InvalidReference`] when the input is not an
    /// absolute reference of that shape.
    pub fn parse(input: &str) -> Result<Self, UriError> {
        let invalid = || UriError::InvalidReference(input.to_string());
        let (scheme, rest) = input.split_once("://").ok_or_else(invalid)?;
        if !is_scheme_name(scheme) {
            return Err(invalid());
        }
        let (authority, path) = match rest.find('/') {
            Some(index) => (&rest[..index], &rest[index..]),
            None => (rest, ""),
        };
        if !path.chars().all(is_reference_char) {
            return Err(invalid());
        }
        let (host, port) = split_host_port(authority).ok_or_else(invalid)?;
        let scheme = scheme.to_ascii_lowercase();
        let port = port.or_else(|| default_port(&scheme));
        Ok(Self {
            scheme,
            host: host.to_ascii_lowercase(),
            port,
            path: path.to_string(),
        })
    }

    /// Parses a reference, resolving scheme-relative (`//host/…`),
    /// origin-absolute (`/path`) and bare relative forms against `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`UriError::InvalidReference`] when the value is empty,
    /// contains characters outside the printable ASCII range, or is an
    /// absolute reference that fails to parse.
    pub fn parse_with_origin(origin: &Origin, value: &str) -> Result<Self, UriError> {
        if value.is_empty() || !value.chars().all(is_reference_char) {
            return Err(UriError::InvalidReference(value.to_string()));
        }
        if value.contains("://") {
            return Self::parse(value);
        }
        if let Some(rest) = value.strip_prefix("//") {
            return Self::parse(&format!("{}://{rest}", origin.scheme));
        }
        let path = if value.starts_with('/') {
            value.to_string()
        } else {
            format!("/{value}")
        };
        Ok(Self {
            scheme: origin.scheme.clone(),
            host: origin.host.clone(),
            port: origin.port,
            path,
        })
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "{}", self.path)
    }
}

/// The well-known default port for a scheme, if any.
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        "ftp" => Some(21),
        _ => None,
    }
}

/// Scheme-name grammar: ALPHA followed by ALPHA / DIGIT / `+` / `-` / `.`.
pub(crate) fn is_scheme_name(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn split_host_port(authority: &str) -> Option<(&str, Option<u16>)> {
    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, Some(port.parse::<u16>().ok()?)),
        None => (authority, None),
    };
    if host.is_empty() || !host.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-')) {
        return None;
    }
    Some((host, port))
}

fn is_reference_char(c: char) -> bool {
    c.is_ascii_graphic()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_parse_with_explicit_port() {
        let origin = Origin::parse("https://example.com:8443").unwrap();
        assert_eq!(origin.scheme, "https");
        assert_eq!(origin.host, "example.com");
        assert_eq!(origin.port, Some(8443));
    }

    #[test]
    fn origin_parse_fills_default_port() {
        let origin = Origin::parse("https://example.com").unwrap();
        assert_eq!(origin.port, Some(443));
        let origin = Origin::parse("http://example.com").unwrap();
        assert_eq!(origin.port, Some(80));
    }

    #[test]
    fn origin_unknown_scheme_has_no_port() {
        let origin = Origin::parse("gopher://example.com").unwrap();
        assert_eq!(origin.port, None);
    }

    #[test]
    fn origin_lowercases_scheme_and_host() {
        let origin = Origin::parse("HTTPS://Example.COM").unwrap();
        assert_eq!(origin.scheme, "https");
        assert_eq!(origin.host, "example.com");
    }

    #[test]
    fn origin_rejects_malformed_input() {
        assert!(Origin::parse("example.com").is_err());
        assert!(Origin::parse("https://").is_err());
        assert!(Origin::parse("https://host:notaport").is_err());
        assert!(Origin::parse("1bad://host").is_err());
    }

    #[test]
    fn uri_parse_absolute() {
        let uri = Uri::parse("https://cdn.example.com/assets/app.js").unwrap();
        assert_eq!(uri.host, "cdn.example.com");
        assert_eq!(uri.port, Some(443));
        assert_eq!(uri.path, "/assets/app.js");
    }

    #[test]
    fn uri_resolves_origin_absolute_path() {
        let origin = Origin::parse("https://example.com").unwrap();
        let uri = Uri::parse_with_origin(&origin, "/csp-report").unwrap();
        assert_eq!(uri.scheme, "https");
        assert_eq!(uri.host, "example.com");
        assert_eq!(uri.path, "/csp-report");
    }

    #[test]
    fn uri_resolves_bare_relative_reference() {
        let origin = Origin::parse("https://example.com").unwrap();
        let uri = Uri::parse_with_origin(&origin, "report.cgi?p=1").unwrap();
        assert_eq!(uri.path, "/report.cgi?p=1");
    }

    #[test]
    fn uri_resolves_scheme_relative_reference() {
        let origin = Origin::parse("https://example.com").unwrap();
        let uri = Uri::parse_with_origin(&origin, "//logs.example.com/r").unwrap();
        assert_eq!(uri.scheme, "https");
        assert_eq!(uri.host, "logs.example.com");
        assert_eq!(uri.path, "/r");
    }

    #[test]
    fn uri_rejects_empty_and_malformed_values() {
        let origin = Origin::parse("https://example.com").unwrap();
        assert!(Uri::parse_with_origin(&origin, "").is_err());
        assert!(Uri::parse_with_origin(&origin, "http://").is_err());
        assert!(Uri::parse_with_origin(&origin, "http://host:99999999/x").is_err());
    }

    #[test]
    fn uri_display_round_trip() {
        let uri = Uri::parse("http://example.com:8080/x").unwrap();
        assert_eq!(uri.to_string(), "http://example.com:8080/x");
    }
}
