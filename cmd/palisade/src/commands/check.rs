//! Check command implementation.

use anyhow::{Context, Result};
use csp_policy::{Notice, NoticeKind, Origin};
use tracing::{error, info, warn};

/// Runs the check command.
///
/// # Errors
///
/// Fails when the origin cannot be parsed, when the header produced error
/// notices, or (with `strict`) when it produced warnings.
pub fn run(header: &str, origin: &str, multi: bool, strict: bool) -> Result<()> {
    let origin: Origin = origin
        .parse()
        .with_context(|| format!("invalid origin: {origin}"))?;

    let mut notices = Vec::new();
    if multi {
        let policies = csp_policy::parse_multi_with_notices(header, &origin, &mut notices);
        info!("parsed {} policies", policies.len());
    } else {
        let policy = csp_policy::parse_with_notices(header, &origin, &mut notices);
        info!("parsed {} directives", policy.directives().len());
    }

    report(&notices);

    let errors = notices.iter().filter(|n| n.is_error()).count();
    let warnings = notices
        .iter()
        .filter(|n| n.kind == NoticeKind::Warning)
        .count();

    if errors > 0 {
        anyhow::bail!("header is invalid: {errors} error(s), {warnings} warning(s)");
    }
    if strict && warnings > 0 {
        anyhow::bail!("header has {warnings} warning(s) (strict mode)");
    }

    info!("header is valid ({warnings} warning(s))");
    Ok(())
}

fn report(notices: &[Notice]) {
    for notice in notices {
        match notice.kind {
            NoticeKind::Error => error!("{notice}"),
            NoticeKind::Warning => warn!("{notice}"),
            NoticeKind::Info => info!("{notice}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_header_passes() {
        assert!(run("default-src 'self'", "https://example.com", false, false).is_ok());
    }

    #[test]
    fn invalid_header_fails() {
        assert!(run("default-src 'none' 'self'", "https://example.com", false, false).is_err());
    }

    #[test]
    fn strict_mode_rejects_warnings() {
        let header = "frame-src 'self'";
        assert!(run(header, "https://example.com", false, false).is_ok());
        assert!(run(header, "https://example.com", false, true).is_err());
    }

    #[test]
    fn policy_lists_are_supported() {
        assert!(run("img-src *, font-src 'self'", "https://example.com", true, false).is_ok());
    }

    #[test]
    fn bad_origin_is_rejected() {
        assert!(run("img-src *", "not an origin", false, false).is_err());
    }
}
