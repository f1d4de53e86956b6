use node_semver::Version;
use std::cmp::Ordering;

/// Strips leading range operators and whitespace from a declared range.
///
/// `"^4.17.21"` becomes `"4.17.21"`, `">= 1.2.0"` becomes `"1.2.0"`.
pub fn strip_range(range: &str) -> String {
    range
        .trim_start_matches(|c: char| matches!(c, '^' | '~' | '>' | '<' | '=') || c.is_whitespace())
        .trim_end()
        .to_string()
}

/// Compares two npm versions by semver precedence.
///
/// Pre-release identifiers compare field by field, numerically where both are
/// numeric, so `1.0.0-beta.10` sorts after `1.0.0-beta.2`. Build metadata is
/// ignored. Returns `None` when either side is not a parseable version.
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    let a = parse(a)?;
    let b = parse(b)?;
    Some(a.cmp(&b))
}

fn parse(version: &str) -> Option<Version> {
    let version = version.trim().trim_start_matches('v');
    let version = version.split('+').next().unwrap_or(version);
    Version::parse(version).ok()
}
