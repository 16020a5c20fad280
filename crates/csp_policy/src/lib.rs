//! Content-Security-Policy header parsing and validation.
//!
//! This crate provides:
//! - A tokeniser and recursive-descent parser for the CSP header grammar
//! - A typed, immutable-after-parse policy model
//! - Directive-granular failure isolation: one malformed directive or token
//!   never aborts parsing of the rest of the header
//! - A diagnostic notice stream carrying errors, warnings and infos
//!
//! Parsing never fails: malformed input yields a structurally valid,
//! possibly partial policy, and everything worth knowing about the input is
//! reported through the notice sink.
//!
//! # Example
//!
//! ```rust
//! use csp_policy::{parse_with_notices, DirectiveKind, Origin};
//!
//! let origin: Origin = "https://example.com".parse().unwrap();
//! let mut notices = Vec::new();
//! let policy = parse_with_notices("default-src 'self'; img-src *", &origin, &mut notices);
//!
//! assert_eq!(policy.directives().len(), 2);
//! assert!(policy.directive(DirectiveKind::ImgSrc).is_some());
//! assert!(notices.is_empty());
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod encoding;
pub mod lexer;
pub mod model;
pub mod notice;
pub mod parser;
pub mod token;
pub mod uri;
pub mod values;

pub use lexer::tokenise;
pub use model::{Directive, Policy};
pub use notice::{Notice, NoticeKind};
pub use parser::{parse, parse_multi, parse_multi_with_notices, parse_with_notices};
pub use token::{DirectiveKind, Location, Token, TokenKind};
pub use uri::{Origin, Uri, UriError};
pub use values::{
    AncestorSource, HashAlgorithm, HostSource, MediaType, Port, ReferrerValue, SandboxValue,
    SourceExpression,
};
