/// Licenses whose copyleft or non-commercial terms need legal review before
/// shipping a dependency under them
pub const RESTRICTIVE_LICENSES: &[&str] = &[
    "GPL-2.0",
    "GPL-3.0",
    "AGPL-3.0",
    "LGPL-2.1",
    "LGPL-3.0",
    "CC-BY-SA-4.0",
    "CC-BY-NC-4.0",
];

/// LicensePolicy decides which license text to report and whether it is restrictive
///
/// Selection order:
/// 1. `license` field (if non-empty and not "UNKNOWN"/"UNLICENSED")
/// 2. first entry of the legacy `licenses` array
pub struct LicensePolicy;

impl LicensePolicy {
    pub fn select_license(license: Option<String>, legacy: &[String]) -> Option<String> {
        license
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("UNKNOWN"))
            .or_else(|| {
                legacy
                    .iter()
                    .map(|l| l.trim())
                    .find(|l| !l.is_empty())
                    .map(str::to_string)
            })
    }

    /// True when the license is on the restrictive list.
    ///
    /// SPDX suffixes (`-only`, `-or-later`, `+`) are ignored. For an `OR`
    /// expression the license is restrictive only when every alternative is;
    /// for `AND` any restrictive term taints the whole expression.
    pub fn is_problematic(license: &str) -> bool {
        let expression = license.trim().trim_start_matches('(').trim_end_matches(')');
        if expression.is_empty() {
            return false;
        }

        if expression.contains(" OR ") {
            return expression.split(" OR ").all(Self::is_problematic);
        }
        if expression.contains(" AND ") {
            return expression.split(" AND ").any(Self::is_problematic);
        }

        let base = normalize_identifier(expression);
        RESTRICTIVE_LICENSES
            .iter()
            .any(|denied| denied.eq_ignore_ascii_case(base))
    }
}

fn normalize_identifier(identifier: &str) -> &str {
    let identifier = identifier.trim();
    identifier
        .strip_suffix("-only")
        .or_else(|| identifier.strip_suffix("-or-later"))
        .or_else(|| identifier.strip_suffix('+'))
        .unwrap_or(identifier)
}
