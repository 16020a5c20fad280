//! Typed policy model.
//!
//! A [`Policy`] is assembled incrementally during one parse and is not
//! mutated afterwards. Directives hold already-validated value sets.

use crate::token::DirectiveKind;
use crate::uri::{Origin, Uri};
use crate::values::{AncestorSource, MediaType, ReferrerValue, SandboxValue, SourceExpression};
use serde::{Deserialize, Serialize};

/// A parsed Content-Security-Policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Origin the policy is evaluated against.
    pub origin: Origin,
    directives: Vec<Directive>,
}

impl Policy {
    /// Creates an empty policy for the given origin.
    pub const fn new(origin: Origin) -> Self {
        Self {
            origin,
            directives: Vec::new(),
        }
    }

    /// Adds a directive. The first directive of each kind wins; later
    /// duplicates are ignored.
    pub fn add_directive(&mut self, directive: Directive) {
        if self.directive(directive.kind()).is_none() {
            self.directives.push(directive);
        }
    }

    /// The directives in insertion order.
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Returns the directive of the given kind, if present.
    pub fn directive(&self, kind: DirectiveKind) -> Option<&Directive> {
        self.directives.iter().find(|d| d.kind() == kind)
    }
}

/// One parsed directive with its validated value set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// `base-uri` source list.
    BaseUri(Vec<SourceExpression>),
    /// `block-all-mixed-content` (no value).
    BlockAllMixedContent,
    /// `child-src` source list.
    ChildSrc(Vec<SourceExpression>),
    /// `connect-src` source list.
    ConnectSrc(Vec<SourceExpression>),
    /// `default-src` source list.
    DefaultSrc(Vec<SourceExpression>),
    /// `font-src` source list.
    FontSrc(Vec<SourceExpression>),
    /// `form-action` source list.
    FormAction(Vec<SourceExpression>),
    /// `frame-ancestors` ancestor-source list.
    FrameAncestors(Vec<AncestorSource>),
    /// `frame-src` source list.
    FrameSrc(Vec<SourceExpression>),
    /// `img-src` source list.
    ImgSrc(Vec<SourceExpression>),
    /// `manifest-src` source list.
    ManifestSrc(Vec<SourceExpression>),
    /// `media-src` source list.
    MediaSrc(Vec<SourceExpression>),
    /// `object-src` source list.
    ObjectSrc(Vec<SourceExpression>),
    /// `plugin-types` media-type list.
    PluginTypes(Vec<MediaType>),
    /// `referrer` token.
    Referrer(Vec<ReferrerValue>),
    /// `report-uri` URI list.
    ReportUri(Vec<Uri>),
    /// `sandbox` token list.
    Sandbox(Vec<SandboxValue>),
    /// `script-src` source list.
    ScriptSrc(Vec<SourceExpression>),
    /// `style-src` source list.
    StyleSrc(Vec<SourceExpression>),
    /// `upgrade-insecure-requests` (no value).
    UpgradeInsecureRequests,
}

impl Directive {
    /// The kind tag for this directive.
    pub const fn kind(&self) -> DirectiveKind {
        match self {
            Self::BaseUri(_) => DirectiveKind::BaseUri,
            Self::BlockAllMixedContent => DirectiveKind::BlockAllMixedContent,
            Self::ChildSrc(_) => DirectiveKind::ChildSrc,
            Self::ConnectSrc(_) => DirectiveKind::ConnectSrc,
            Self::DefaultSrc(_) => DirectiveKind::DefaultSrc,
            Self::FontSrc(_) => DirectiveKind::FontSrc,
            Self::FormAction(_) => DirectiveKind::FormAction,
            Self::FrameAncestors(_) => DirectiveKind::FrameAncestors,
            Self::FrameSrc(_) => DirectiveKind::FrameSrc,
            Self::ImgSrc(_) => DirectiveKind::ImgSrc,
            Self::ManifestSrc(_) => DirectiveKind::ManifestSrc,
            Self::MediaSrc(_) => DirectiveKind::MediaSrc,
            Self::ObjectSrc(_) => DirectiveKind::ObjectSrc,
            Self::PluginTypes(_) => DirectiveKind::PluginTypes,
            Self::Referrer(_) => DirectiveKind::Referrer,
            Self::ReportUri(_) => DirectiveKind::ReportUri,
            Self::Sandbox(_) => DirectiveKind::Sandbox,
            Self::ScriptSrc(_) => DirectiveKind::ScriptSrc,
            Self::StyleSrc(_) => DirectiveKind::StyleSrc,
            Self::UpgradeInsecureRequests => DirectiveKind::UpgradeInsecureRequests,
        }
    }

    /// The directive name as written in a header.
    pub const fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Number of values in the directive's value set.
    pub fn value_count(&self) -> usize {
        match self {
            Self::BaseUri(v)
            | Self::ChildSrc(v)
            | Self::ConnectSrc(v)
            | Self::DefaultSrc(v)
            | Self::FontSrc(v)
            | Self::FormAction(v)
            | Self::FrameSrc(v)
            | Self::ImgSrc(v)
            | Self::ManifestSrc(v)
            | Self::MediaSrc(v)
            | Self::ObjectSrc(v)
            | Self::ScriptSrc(v)
            | Self::StyleSrc(v) => v.len(),
            Self::FrameAncestors(v) => v.len(),
            Self::PluginTypes(v) => v.len(),
            Self::Referrer(v) => v.len(),
            Self::ReportUri(v) => v.len(),
            Self::Sandbox(v) => v.len(),
            Self::BlockAllMixedContent | Self::UpgradeInsecureRequests => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::parse("https://example.com").unwrap()
    }

    #[test]
    fn first_directive_of_a_kind_wins() {
        let mut policy = Policy::new(origin());
        policy.add_directive(Directive::DefaultSrc(vec![SourceExpression::Self_]));
        policy.add_directive(Directive::DefaultSrc(vec![SourceExpression::None]));
        assert_eq!(policy.directives().len(), 1);
        assert_eq!(
            policy.directive(DirectiveKind::DefaultSrc),
            Some(&Directive::DefaultSrc(vec![SourceExpression::Self_]))
        );
    }

    #[test]
    fn directives_keep_insertion_order() {
        let mut policy = Policy::new(origin());
        policy.add_directive(Directive::ScriptSrc(Vec::new()));
        policy.add_directive(Directive::DefaultSrc(Vec::new()));
        policy.add_directive(Directive::ImgSrc(Vec::new()));
        let kinds: Vec<_> = policy.directives().iter().map(Directive::kind).collect();
        assert_eq!(
            kinds,
            [
                DirectiveKind::ScriptSrc,
                DirectiveKind::DefaultSrc,
                DirectiveKind::ImgSrc
            ]
        );
    }

    #[test]
    fn value_counts() {
        assert_eq!(Directive::BlockAllMixedContent.value_count(), 0);
        assert_eq!(
            Directive::ScriptSrc(vec![SourceExpression::Self_, SourceExpression::UnsafeEval])
                .value_count(),
            2
        );
    }

    #[test]
    fn directive_names() {
        assert_eq!(Directive::BaseUri(Vec::new()).name(), "base-uri");
        assert_eq!(Directive::UpgradeInsecureRequests.name(), "upgrade-insecure-requests");
    }

    #[test]
    fn policy_round_trips_through_json() {
        let mut policy = Policy::new(origin());
        policy.add_directive(Directive::ScriptSrc(vec![SourceExpression::Self_]));
        policy.add_directive(Directive::UpgradeInsecureRequests);
        let json = serde_json::to_string(&policy).unwrap();
        let back: Policy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
