//! Inspect command implementation.

use anyhow::{Context, Result};
use csp_policy::{Origin, Policy};
use tracing::info;

/// Runs the inspect command.
///
/// # Errors
///
/// Fails when the origin cannot be parsed or the output format is unknown.
pub fn run(header: &str, origin: &str, multi: bool, format: &str) -> Result<()> {
    let origin: Origin = origin
        .parse()
        .with_context(|| format!("invalid origin: {origin}"))?;

    let mut notices = Vec::new();
    let policies = if multi {
        csp_policy::parse_multi_with_notices(header, &origin, &mut notices)
    } else {
        vec![csp_policy::parse_with_notices(header, &origin, &mut notices)]
    };

    match format {
        "json" => {
            let output = serde_json::to_string_pretty(&policies)
                .with_context(|| "failed to serialize policies")?;
            println!("{output}");
        }
        "text" => print_text(&policies),
        _ => anyhow::bail!("unknown output format: {format}. Use 'text' or 'json'."),
    }

    info!("{} notice(s) recorded", notices.len());
    Ok(())
}

fn print_text(policies: &[Policy]) {
    for policy in policies {
        println!("policy for {}:", policy.origin);
        if policy.directives().is_empty() {
            println!("  (no directives)");
        }
        for directive in policy.directives() {
            println!("  {} ({} value(s))", directive.name(), directive.value_count());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_output_succeeds() {
        assert!(run("default-src 'self'", "https://example.com", false, "text").is_ok());
    }

    #[test]
    fn json_output_succeeds() {
        assert!(run("default-src 'self'; sandbox", "https://example.com", false, "json").is_ok());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(run("default-src 'self'", "https://example.com", false, "yaml").is_err());
    }

    #[test]
    fn multi_inspects_each_policy() {
        assert!(run("img-src *, font-src 'self'", "https://example.com", true, "text").is_ok());
    }
}
