//! Recursive-descent parser for Content-Security-Policy headers.
//!
//! The parser walks the token stream once, left to right. Failures are
//! isolated at two granularities: a malformed sub-token rejects its value
//! list, and a malformed directive is dropped from its policy — nothing ever
//! aborts the parse as a whole. Every internal failure is preceded by an
//! error notice; the returned policy is always structurally valid.

use crate::lexer;
use crate::model::{Directive, Policy};
use crate::notice::{Notice, NoticeKind};
use crate::token::{DirectiveKind, Location, Token, TokenKind};
use crate::uri::{Origin, Uri};
use crate::values::{
    self, AncestorSource, HashAlgorithm, MediaType, ReferrerValue, SandboxValue, SourceExpression,
};
use crate::{encoding, uri};
use thiserror::Error;
use tracing::debug;

/// Parses one policy, discarding diagnostics.
pub fn parse(source: &str, origin: &Origin) -> Policy {
    Parser::new(lexer::tokenise(source), origin, None).parse_policy_to_eof()
}

/// Parses one policy, appending diagnostics to `notices`.
pub fn parse_with_notices(source: &str, origin: &Origin, notices: &mut Vec<Notice>) -> Policy {
    let policy = Parser::new(lexer::tokenise(source), origin, Some(notices)).parse_policy_to_eof();
    debug!(directives = policy.directives().len(), "parsed policy");
    policy
}

/// Parses a comma-separated policy list, discarding diagnostics. The result
/// always contains at least one policy.
pub fn parse_multi(source: &str, origin: &Origin) -> Vec<Policy> {
    Parser::new(lexer::tokenise(source), origin, None).parse_policy_list_to_eof()
}

/// Parses a comma-separated policy list, appending diagnostics to `notices`.
/// The result always contains at least one policy.
pub fn parse_multi_with_notices(
    source: &str,
    origin: &Origin,
    notices: &mut Vec<Notice>,
) -> Vec<Policy> {
    let policies =
        Parser::new(lexer::tokenise(source), origin, Some(notices)).parse_policy_list_to_eof();
    debug!(policies = policies.len(), "parsed policy list");
    policies
}

/// Internal marker: the current directive was dropped. The matching error
/// notice has already been recorded.
#[derive(Debug, Error)]
#[error("directive dropped")]
struct DirectiveDropped;

/// Internal marker: one sub-token's contribution was rejected. The matching
/// error notice has already been recorded.
#[derive(Debug, Error)]
#[error("value rejected")]
struct ValueRejected;

type DirectiveResult<T> = Result<T, DirectiveDropped>;
type ValueResult<T> = Result<T, ValueRejected>;

/// Which value grammar a directive's value is parsed with.
#[derive(Debug, Clone, Copy)]
enum ValueGrammar {
    SourceList,
    AncestorSourceList,
    MediaTypeList,
    ReferrerTokenList,
    SandboxTokenList,
    UriReferenceList,
    NoValue,
}

/// Per-directive-kind parsing policy, kept as data.
struct DirectiveProfile {
    grammar: ValueGrammar,
    deprecation: Option<&'static str>,
    empty_error: Option<&'static str>,
}

impl DirectiveProfile {
    const fn plain(grammar: ValueGrammar) -> Self {
        Self {
            grammar,
            deprecation: None,
            empty_error: None,
        }
    }

    const fn deprecated(grammar: ValueGrammar, message: &'static str) -> Self {
        Self {
            grammar,
            deprecation: Some(message),
            empty_error: None,
        }
    }

    const fn non_empty(grammar: ValueGrammar, message: &'static str) -> Self {
        Self {
            grammar,
            deprecation: None,
            empty_error: Some(message),
        }
    }
}

/// Returns the profile for a dispatchable directive kind, or `None` for the
/// legacy and unrecognised kinds that are rejected outright.
fn directive_profile(kind: DirectiveKind) -> Option<DirectiveProfile> {
    let profile = match kind {
        DirectiveKind::BaseUri
        | DirectiveKind::ChildSrc
        | DirectiveKind::ConnectSrc
        | DirectiveKind::DefaultSrc
        | DirectiveKind::FontSrc
        | DirectiveKind::FormAction
        | DirectiveKind::ImgSrc
        | DirectiveKind::MediaSrc
        | DirectiveKind::ObjectSrc
        | DirectiveKind::ScriptSrc
        | DirectiveKind::StyleSrc => DirectiveProfile::plain(ValueGrammar::SourceList),
        DirectiveKind::ManifestSrc => DirectiveProfile::deprecated(
            ValueGrammar::SourceList,
            "the manifest-src directive is experimental and not yet part of the CSP specification",
        ),
        DirectiveKind::FrameSrc => DirectiveProfile::deprecated(
            ValueGrammar::SourceList,
            "the frame-src directive is deprecated as of CSP 1.1; use the child-src directive to govern nested browsing contexts",
        ),
        DirectiveKind::FrameAncestors => DirectiveProfile::plain(ValueGrammar::AncestorSourceList),
        DirectiveKind::PluginTypes => DirectiveProfile::non_empty(
            ValueGrammar::MediaTypeList,
            "the media-type-list must contain at least one media-type",
        ),
        DirectiveKind::Referrer => DirectiveProfile {
            grammar: ValueGrammar::ReferrerTokenList,
            deprecation: Some(
                "the referrer directive is experimental and not yet part of the CSP specification",
            ),
            empty_error: Some("the referrer directive must contain exactly one referrer-token"),
        },
        DirectiveKind::ReportUri => DirectiveProfile::non_empty(
            ValueGrammar::UriReferenceList,
            "the report-uri directive must contain at least one uri-reference",
        ),
        DirectiveKind::Sandbox => DirectiveProfile::plain(ValueGrammar::SandboxTokenList),
        DirectiveKind::BlockAllMixedContent => DirectiveProfile::deprecated(
            ValueGrammar::NoValue,
            "the block-all-mixed-content directive is experimental and not yet part of the CSP specification",
        ),
        DirectiveKind::UpgradeInsecureRequests => DirectiveProfile::plain(ValueGrammar::NoValue),
        DirectiveKind::Allow | DirectiveKind::Options | DirectiveKind::Unrecognised => return None,
    };
    Some(profile)
}

/// Single-use parser over one token stream.
struct Parser<'a> {
    tokens: Vec<Token>,
    index: usize,
    origin: &'a Origin,
    notices: Option<&'a mut Vec<Notice>>,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token>, origin: &'a Origin, notices: Option<&'a mut Vec<Notice>>) -> Self {
        Self {
            tokens,
            index: 0,
            origin,
            notices,
        }
    }

    // ---- cursor -----------------------------------------------------------

    const fn has_next(&self) -> bool {
        self.index < self.tokens.len()
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn next_is_policy_separator(&self) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::PolicySeparator))
    }

    fn next_is_directive_name(&self) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::DirectiveName(_)))
    }

    fn next_is_directive_value(&self) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::DirectiveValue))
    }

    fn next_is_unknown(&self) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Unknown))
    }

    fn eat_policy_separator(&mut self) -> bool {
        let found = self.next_is_policy_separator();
        if found {
            self.index += 1;
        }
        found
    }

    fn eat_directive_separator(&mut self) -> bool {
        let found = matches!(self.peek_kind(), Some(TokenKind::DirectiveSeparator));
        if found {
            self.index += 1;
        }
        found
    }

    fn eat_directive_value(&mut self) -> Option<Token> {
        if self.next_is_directive_value() {
            self.advance()
        } else {
            None
        }
    }

    // ---- notices ----------------------------------------------------------

    fn emit(&mut self, kind: NoticeKind, location: Option<Location>, message: impl Into<String>) {
        if let Some(sink) = self.notices.as_deref_mut() {
            let notice = Notice::new(kind, message);
            sink.push(match location {
                Some(l) => notice.at(l),
                None => notice,
            });
        }
    }

    fn error(&mut self, location: Option<Location>, message: impl Into<String>) {
        self.emit(NoticeKind::Error, location, message);
    }

    fn warn(&mut self, location: Option<Location>, message: impl Into<String>) {
        self.emit(NoticeKind::Warning, location, message);
    }

    // ---- policy loops -----------------------------------------------------

    fn parse_policy(&mut self) -> Policy {
        let mut policy = Policy::new(self.origin.clone());
        while self.has_next() {
            if self.next_is_policy_separator() {
                break;
            }
            if self.eat_directive_separator() {
                continue;
            }
            if let Ok(directive) = self.parse_directive() {
                policy.add_directive(directive);
            }
        }
        policy
    }

    fn parse_policy_to_eof(mut self) -> Policy {
        let policy = self.parse_policy();
        if let Some(token) = self.advance() {
            self.error(
                token.start,
                format!("expecting end of policy but found {}", token.value),
            );
        }
        policy
    }

    fn parse_policy_list(&mut self) -> Vec<Policy> {
        let mut policies = vec![self.parse_policy()];
        while self.next_is_policy_separator() {
            while self.eat_policy_separator() {}
            policies.push(self.parse_policy());
        }
        policies
    }

    fn parse_policy_list_to_eof(mut self) -> Vec<Policy> {
        let policies = self.parse_policy_list();
        if let Some(token) = self.advance() {
            self.error(
                token.start,
                format!("expecting end of policy list but found {}", token.value),
            );
        }
        policies
    }

    // ---- directives -------------------------------------------------------

    fn parse_directive(&mut self) -> DirectiveResult<Directive> {
        if !self.next_is_directive_name() {
            if let Some(token) = self.advance() {
                let found = token.value.split([' ', '\t']).next().unwrap_or_default();
                self.error(
                    token.start,
                    format!("expecting directive-name but found {found}"),
                );
            }
            return Err(DirectiveDropped);
        }
        let Some(name) = self.advance() else {
            return Err(DirectiveDropped);
        };
        let result = self.parse_directive_value(&name);
        if self.next_is_unknown() {
            if let Some(unknown) = self.advance() {
                let c = unknown.value.chars().next().unwrap_or('\u{fffd}');
                self.error(
                    unknown.start,
                    format!(
                        "expecting directive-value but found U+{:04X} ({c}); non-ASCII and non-printable characters must be percent-encoded",
                        u32::from(c)
                    ),
                );
            }
            return Err(DirectiveDropped);
        }
        result
    }

    fn parse_directive_value(&mut self, name: &Token) -> DirectiveResult<Directive> {
        let TokenKind::DirectiveName(kind) = name.kind else {
            return Err(DirectiveDropped);
        };
        let Some(profile) = directive_profile(kind) else {
            return self.reject_directive_name(name, kind);
        };
        if let Some(message) = profile.deprecation {
            self.warn(name.start, message);
        }
        let directive = match profile.grammar {
            ValueGrammar::NoValue => {
                self.require_no_value(name)?;
                if kind == DirectiveKind::BlockAllMixedContent {
                    Directive::BlockAllMixedContent
                } else {
                    Directive::UpgradeInsecureRequests
                }
            }
            ValueGrammar::SourceList => {
                let sources = self.parse_source_list()?;
                match kind {
                    DirectiveKind::BaseUri => Directive::BaseUri(sources),
                    DirectiveKind::ChildSrc => Directive::ChildSrc(sources),
                    DirectiveKind::ConnectSrc => Directive::ConnectSrc(sources),
                    DirectiveKind::DefaultSrc => Directive::DefaultSrc(sources),
                    DirectiveKind::FontSrc => Directive::FontSrc(sources),
                    DirectiveKind::FormAction => Directive::FormAction(sources),
                    DirectiveKind::FrameSrc => Directive::FrameSrc(sources),
                    DirectiveKind::ImgSrc => Directive::ImgSrc(sources),
                    DirectiveKind::ManifestSrc => Directive::ManifestSrc(sources),
                    DirectiveKind::MediaSrc => Directive::MediaSrc(sources),
                    DirectiveKind::ObjectSrc => Directive::ObjectSrc(sources),
                    DirectiveKind::ScriptSrc => Directive::ScriptSrc(sources),
                    _ => Directive::StyleSrc(sources),
                }
            }
            ValueGrammar::AncestorSourceList => {
                Directive::FrameAncestors(self.parse_ancestor_source_list()?)
            }
            ValueGrammar::MediaTypeList => {
                Directive::PluginTypes(self.parse_value_list(Self::parse_media_type)?)
            }
            ValueGrammar::ReferrerTokenList => {
                Directive::Referrer(self.parse_referrer_token_list()?)
            }
            ValueGrammar::SandboxTokenList => {
                Directive::Sandbox(self.parse_value_list(Self::parse_sandbox_token)?)
            }
            ValueGrammar::UriReferenceList => {
                Directive::ReportUri(self.parse_value_list(Self::parse_uri_reference)?)
            }
        };
        if let Some(message) = profile.empty_error {
            if directive.value_count() == 0 {
                self.error(name.start, message);
                return Err(DirectiveDropped);
            }
        }
        Ok(directive)
    }

    fn reject_directive_name(
        &mut self,
        name: &Token,
        kind: DirectiveKind,
    ) -> DirectiveResult<Directive> {
        let message = match kind {
            DirectiveKind::Allow => {
                "the allow directive has been replaced by default-src and is not part of the CSP specification"
                    .to_string()
            }
            DirectiveKind::Options => {
                "the options directive has been replaced by 'unsafe-inline' and 'unsafe-eval' and is not part of the CSP specification"
                    .to_string()
            }
            _ => format!("unrecognised directive-name: {}", name.value),
        };
        self.error(name.start, message);
        self.eat_directive_value();
        Err(DirectiveDropped)
    }

    fn require_no_value(&mut self, name: &Token) -> DirectiveResult<()> {
        if self.eat_directive_value().is_some() {
            self.error(
                name.start,
                format!("the {} directive must not contain a value", name.value),
            );
            return Err(DirectiveDropped);
        }
        Ok(())
    }

    // ---- value lists ------------------------------------------------------

    fn parse_source_list(&mut self) -> DirectiveResult<Vec<SourceExpression>> {
        let mut sources: Vec<SourceExpression> = Vec::new();
        let Some(value) = self.eat_directive_value() else {
            return Ok(sources);
        };
        let mut rejected = false;
        let mut seen_none = false;
        for sub in split_sub_tokens(&value) {
            match self.parse_source_expression(&sub) {
                Ok(source) => {
                    if seen_none || (source == SourceExpression::None && !sources.is_empty()) {
                        self.error(
                            sub.start,
                            "'none' must not be combined with any other source-expression",
                        );
                        rejected = true;
                        continue;
                    }
                    if source == SourceExpression::None {
                        seen_none = true;
                    }
                    if !sources.contains(&source) {
                        sources.push(source);
                    }
                }
                Err(ValueRejected) => rejected = true,
            }
        }
        if rejected {
            return Err(DirectiveDropped);
        }
        Ok(sources)
    }

    fn parse_ancestor_source_list(&mut self) -> DirectiveResult<Vec<AncestorSource>> {
        let mut sources: Vec<AncestorSource> = Vec::new();
        let Some(value) = self.eat_directive_value() else {
            return Ok(sources);
        };
        let mut rejected = false;
        let mut seen_none = false;
        for sub in split_sub_tokens(&value) {
            match self.parse_ancestor_source(&sub) {
                Ok(source) => {
                    if seen_none || (source == AncestorSource::None && !sources.is_empty()) {
                        self.error(
                            sub.start,
                            "the 'none' keyword must not be combined with any other ancestor-source",
                        );
                        rejected = true;
                        continue;
                    }
                    if source == AncestorSource::None {
                        seen_none = true;
                    }
                    if !sources.contains(&source) {
                        sources.push(source);
                    }
                }
                Err(ValueRejected) => rejected = true,
            }
        }
        if rejected {
            return Err(DirectiveDropped);
        }
        Ok(sources)
    }

    fn parse_referrer_token_list(&mut self) -> DirectiveResult<Vec<ReferrerValue>> {
        let mut tokens: Vec<ReferrerValue> = Vec::new();
        let Some(value) = self.eat_directive_value() else {
            return Ok(tokens);
        };
        let mut rejected = false;
        for sub in split_sub_tokens(&value) {
            match self.parse_referrer_token(&sub) {
                Ok(token) => {
                    if tokens.is_empty() {
                        tokens.push(token);
                    } else {
                        self.error(
                            sub.start,
                            "the referrer directive must contain exactly one referrer-token",
                        );
                        rejected = true;
                    }
                }
                Err(ValueRejected) => rejected = true,
            }
        }
        if rejected {
            return Err(DirectiveDropped);
        }
        Ok(tokens)
    }

    /// Shared shape of the remaining list grammars: split, classify each
    /// sub-token independently, fold into a deduplicated set, and reject the
    /// whole list if any sub-token failed.
    fn parse_value_list<T, F>(&mut self, mut classify: F) -> DirectiveResult<Vec<T>>
    where
        T: PartialEq,
        F: FnMut(&mut Self, &SubToken) -> ValueResult<T>,
    {
        let mut items: Vec<T> = Vec::new();
        let Some(value) = self.eat_directive_value() else {
            return Ok(items);
        };
        let mut rejected = false;
        for sub in split_sub_tokens(&value) {
            match classify(self, &sub) {
                Ok(item) => {
                    if !items.contains(&item) {
                        items.push(item);
                    }
                }
                Err(ValueRejected) => rejected = true,
            }
        }
        if rejected {
            return Err(DirectiveDropped);
        }
        Ok(items)
    }

    // ---- classifiers ------------------------------------------------------

    fn parse_source_expression(&mut self, sub: &SubToken) -> ValueResult<SourceExpression> {
        let value = sub.value.as_str();
        let lower = value.to_ascii_lowercase();
        match lower.as_str() {
            "'none'" => return Ok(SourceExpression::None),
            "'self'" => return Ok(SourceExpression::Self_),
            "'unsafe-inline'" => return Ok(SourceExpression::UnsafeInline),
            "'unsafe-eval'" => return Ok(SourceExpression::UnsafeEval),
            "'unsafe-redirect'" => {
                self.warn(
                    sub.start,
                    "'unsafe-redirect' has been removed from CSP as of version 2.0",
                );
                return Ok(SourceExpression::UnsafeRedirect);
            }
            "none" | "self" | "unsafe-inline" | "unsafe-eval" | "unsafe-redirect" => {
                self.warn(
                    sub.start,
                    format!(
                        "this host name is unusual, and likely meant to be a keyword that is missing the required quotes: '{lower}'"
                    ),
                );
            }
            _ => {}
        }
        if let Some(payload) = value
            .strip_prefix("'nonce-")
            .and_then(|rest| rest.strip_suffix('\''))
        {
            for complaint in encoding::nonce_warnings(payload) {
                self.warn(sub.start, complaint);
            }
            return Ok(SourceExpression::Nonce(payload.to_string()));
        }
        if lower.starts_with("'sha") {
            return self.parse_hash_source(sub);
        }
        if let Some(scheme) = value.strip_suffix(':') {
            if uri::is_scheme_name(scheme) {
                return Ok(SourceExpression::Scheme(scheme.to_string()));
            }
        }
        if let Some(host) = values::parse_host_source(value) {
            return Ok(SourceExpression::Host(host));
        }
        self.error(
            sub.start,
            format!("expecting source-expression but found {value}"),
        );
        Err(ValueRejected)
    }

    fn parse_hash_source(&mut self, sub: &SubToken) -> ValueResult<SourceExpression> {
        let value = sub.value.as_str();
        let algorithm = match value.get(4..7) {
            Some("256") => HashAlgorithm::Sha256,
            Some("384") => HashAlgorithm::Sha384,
            Some("512") => HashAlgorithm::Sha512,
            _ => {
                let label = value.get(1..7).or_else(|| value.get(1..)).unwrap_or(value);
                self.error(sub.start, format!("unrecognised hash algorithm {label}"));
                return Err(ValueRejected);
            }
        };
        let Some(body) = value
            .get(7..)
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|rest| rest.strip_suffix('\''))
        else {
            self.error(
                sub.start,
                format!("expecting source-expression but found {value}"),
            );
            return Err(ValueRejected);
        };
        let standard = body.replace('-', "+").replace('_', "/");
        let digest = match encoding::decode_base64(&standard) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.error(sub.start, err.to_string());
                return Err(ValueRejected);
            }
        };
        if body.contains('-') || body.contains('_') {
            self.warn(
                sub.start,
                "invalid base64-value characters; use an RFC 4648 compliant base64 encoding implementation",
            );
        }
        if let Err(err) = encoding::validate_digest(algorithm, &digest) {
            self.error(sub.start, err.to_string());
            return Err(ValueRejected);
        }
        Ok(SourceExpression::Hash { algorithm, digest })
    }

    fn parse_ancestor_source(&mut self, sub: &SubToken) -> ValueResult<AncestorSource> {
        let value = sub.value.as_str();
        if value.eq_ignore_ascii_case("'none'") {
            return Ok(AncestorSource::None);
        }
        if value.eq_ignore_ascii_case("'self'") {
            return Ok(AncestorSource::Self_);
        }
        if let Some(scheme) = value.strip_suffix(':') {
            if uri::is_scheme_name(scheme) {
                return Ok(AncestorSource::Scheme(scheme.to_string()));
            }
        }
        if let Some(host) = values::parse_host_source(value) {
            return Ok(AncestorSource::Host(host));
        }
        self.error(
            sub.start,
            format!("expecting ancestor-source but found {value}"),
        );
        Err(ValueRejected)
    }

    fn parse_media_type(&mut self, sub: &SubToken) -> ValueResult<MediaType> {
        if let Some(media_type) = MediaType::parse(&sub.value) {
            return Ok(media_type);
        }
        self.error(
            sub.start,
            format!("expecting media-type but found {}", sub.value),
        );
        Err(ValueRejected)
    }

    fn parse_referrer_token(&mut self, sub: &SubToken) -> ValueResult<ReferrerValue> {
        if let Some(token) = ReferrerValue::parse(&sub.value) {
            return Ok(token);
        }
        self.error(
            sub.start,
            format!("expecting referrer-token but found {}", sub.value),
        );
        Err(ValueRejected)
    }

    fn parse_sandbox_token(&mut self, sub: &SubToken) -> ValueResult<SandboxValue> {
        if SandboxValue::is_enumerated(&sub.value) {
            return Ok(SandboxValue::new(&sub.value));
        }
        self.warn(
            sub.start,
            "the sandbox directive should contain only allow-forms, allow-modals, allow-pointer-lock, allow-popups, allow-popups-to-escape-sandbox, allow-same-origin, allow-scripts, or allow-top-navigation",
        );
        if SandboxValue::is_token(&sub.value) {
            return Ok(SandboxValue::new(&sub.value));
        }
        self.error(
            sub.start,
            format!("expecting sandbox-token but found {}", sub.value),
        );
        Err(ValueRejected)
    }

    fn parse_uri_reference(&mut self, sub: &SubToken) -> ValueResult<Uri> {
        if let Ok(reference) = Uri::parse_with_origin(self.origin, &sub.value) {
            return Ok(reference);
        }
        self.error(
            sub.start,
            format!("expecting uri-reference but found {}", sub.value),
        );
        Err(ValueRejected)
    }
}

/// A whitespace-delimited slice of a directive-value token. Its location is
/// derived from the parent token's start by byte offset.
struct SubToken {
    value: String,
    start: Option<Location>,
}

fn split_sub_tokens(token: &Token) -> Vec<SubToken> {
    let mut subs = Vec::new();
    let mut run_start: Option<usize> = None;
    for (i, c) in token.value.char_indices() {
        if c == ' ' || c == '\t' {
            if let Some(from) = run_start.take() {
                subs.push(make_sub_token(token, from, i));
            }
        } else if run_start.is_none() {
            run_start = Some(i);
        }
    }
    if let Some(from) = run_start {
        subs.push(make_sub_token(token, from, token.value.len()));
    }
    subs
}

fn make_sub_token(token: &Token, from: usize, to: usize) -> SubToken {
    SubToken {
        value: token.value[from..to].to_string(),
        start: token.start.map(|loc| Location {
            line: loc.line,
            column: loc.column + from,
            offset: loc.offset + from,
        }),
    }
}
