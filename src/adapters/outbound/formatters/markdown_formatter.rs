use super::document_helpers::unique_records;
use crate::ports::outbound::SbomFormatter;
use crate::sbom_generation::domain::{
    ControlStatus, DependencyRecord, PackageAnalysis, SbomAggregate,
};
use crate::shared::Result;

/// Markdown table header for dependency rows
const DEPENDENCY_TABLE_HEADER: &str =
    "| Package | Version | Latest | License | Risk | Security | Description |\n";

/// Markdown table separator line for dependency rows
const DEPENDENCY_TABLE_SEPARATOR: &str =
    "|---------|---------|--------|---------|------|----------|-------------|\n";

/// Markdown table header for vulnerability information
const VULN_TABLE_HEADER: &str =
    "| Package | Current Version | Fixed Version | CVSS | Severity | ID | Status |\n";

/// Markdown table separator line for vulnerability table
const VULN_TABLE_SEPARATOR: &str =
    "|---------|-----------------|---------------|------|----------|----|--------|\n";

/// MarkdownFormatter adapter for generating a human-readable dependency report
///
/// This adapter implements the SbomFormatter port for Markdown format: an
/// executive summary, the insight lists, per-package dependency tables,
/// known unknowns and the compliance result.
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self
    }

    /// HTML-entity escaping for anything that lands in a table cell. Pipes
    /// would split the cell and newlines would end the row.
    fn escape(text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&#39;"),
                '|' => escaped.push_str("&#124;"),
                '\r' => {}
                '\n' => escaped.push(' '),
                c => escaped.push(c),
            }
        }
        escaped
    }

    /// An advisory URL safe to use as a link target: only http(s), with every
    /// character that could close the link or the cell percent-encoded
    fn link_target(url: &str) -> Option<String> {
        let url = url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return None;
        }
        let mut safe = String::with_capacity(url.len());
        for c in url.chars() {
            match c {
                '(' => safe.push_str("%28"),
                ')' => safe.push_str("%29"),
                '|' => safe.push_str("%7C"),
                '<' => safe.push_str("%3C"),
                '>' => safe.push_str("%3E"),
                '"' => safe.push_str("%22"),
                '\'' => safe.push_str("%27"),
                '`' => safe.push_str("%60"),
                ' ' => safe.push_str("%20"),
                c if c.is_control() => {}
                c => safe.push(c),
            }
        }
        Some(safe)
    }

    /// Link to the package's npm page
    fn package_link(name: &str) -> String {
        format!(
            "[{}](https://www.npmjs.com/package/{})",
            Self::escape(name),
            urlencoding::encode(name).replace("%2F", "/").replace("%40", "@")
        )
    }

    fn kilobytes(value: f64) -> String {
        if value.is_finite() {
            format!("{:.2} KB", value)
        } else {
            "N/A".to_string()
        }
    }

    fn percentage(part: usize, whole: usize) -> String {
        if whole == 0 {
            return "N/A".to_string();
        }
        format!("{:.1}%", part as f64 * 100.0 / whole as f64)
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SbomFormatter for MarkdownFormatter {
    fn format(&self, aggregate: &SbomAggregate) -> Result<String> {
        let mut output = String::new();

        self.render_header(&mut output, aggregate);
        self.render_summary(&mut output, aggregate);
        self.render_top_risks(&mut output, aggregate);
        self.render_quick_wins(&mut output, aggregate);
        self.render_heaviest(&mut output, aggregate);
        self.render_license_issues(&mut output, aggregate);
        self.render_maintenance(&mut output, aggregate);
        self.render_vulnerabilities(&mut output, aggregate);

        for package in &aggregate.packages {
            self.render_package(&mut output, package, aggregate.is_monorepo);
        }

        self.render_known_unknowns(&mut output, aggregate);
        self.render_compliance(&mut output, aggregate);

        Ok(output)
    }
}

/// Helper methods for rendering sections
impl MarkdownFormatter {
    fn render_header(&self, output: &mut String, aggregate: &SbomAggregate) {
        output.push_str("# Software Bill of Materials (SBOM)\n\n");
        if !aggregate.project.name.is_empty() {
            output.push_str(&format!(
                "**Project:** {} {}\n\n",
                Self::escape(&aggregate.project.name),
                Self::escape(&aggregate.project.version)
            ));
        }
        output.push_str(&format!("- **Generated:** {}\n", aggregate.metadata.timestamp()));
        output.push_str(&format!(
            "- **Tool:** {} {}\n",
            aggregate.metadata.tool_name(),
            aggregate.metadata.tool_version()
        ));
        output.push_str(&format!("- **Serial Number:** {}\n", aggregate.metadata.serial_number()));
        output.push_str(&format!("- **Coverage Depth:** {}\n", aggregate.coverage.depth.as_str()));
        if let Some(hash) = &aggregate.integrity_hash {
            output.push_str(&format!("- **Integrity Hash:** `{}`\n", hash));
        }
        output.push('\n');
    }

    fn render_summary(&self, output: &mut String, aggregate: &SbomAggregate) {
        let insights = &aggregate.insights;
        let metrics = &insights.metrics;

        output.push_str("## Executive Summary\n\n");
        output.push_str("| Metric | Value |\n|--------|-------|\n");
        output.push_str(&format!("| Total Dependencies | {} |\n", metrics.total_dependencies));
        output.push_str(&format!("| Production | {} |\n", metrics.production_dependencies));
        output.push_str(&format!("| Development | {} |\n", metrics.dev_dependencies));
        let average = if metrics.average_security_score.is_finite() {
            format!("{:.1}/100", metrics.average_security_score)
        } else {
            "N/A".to_string()
        };
        output.push_str(&format!("| Average Security Score | {} |\n", average));
        output.push_str(&format!(
            "| Outdated | {} ({}) |\n",
            metrics.outdated_count,
            Self::percentage(metrics.outdated_count, metrics.total_dependencies)
        ));
        output.push_str(&format!("| Vulnerable | {} |\n", metrics.vulnerable_count));
        output.push_str(&format!(
            "| Total Bundle Size | {} |\n",
            Self::kilobytes(insights.total_bundle_size_kb)
        ));
        output.push_str(&format!("| Known Unknowns | {} |\n", aggregate.known_unknowns.len()));
        if let Some(compliance) = &aggregate.compliance {
            output.push_str(&format!("| Compliance | {} |\n", compliance.overall));
        }
        output.push('\n');
    }

    fn render_top_risks(&self, output: &mut String, aggregate: &SbomAggregate) {
        let risks = &aggregate.insights.top_risks;
        if risks.is_empty() {
            return;
        }

        output.push_str("## Top Risks\n\n");
        output.push_str("| Package | Version | Score | Level | Factors |\n");
        output.push_str("|---------|---------|-------|-------|---------|\n");
        for risk in risks {
            let factors = risk
                .factors
                .iter()
                .map(|f| Self::escape(f))
                .collect::<Vec<_>>()
                .join("; ");
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                Self::package_link(&risk.name),
                Self::escape(&risk.version),
                risk.score,
                risk.risk_level,
                factors
            ));
        }
        output.push('\n');
    }

    fn render_quick_wins(&self, output: &mut String, aggregate: &SbomAggregate) {
        let wins = &aggregate.insights.quick_wins;
        if wins.is_empty() {
            return;
        }

        output.push_str("## Quick Wins\n\n");
        output.push_str("Outdated packages with a low security score. Updating them is cheap and effective.\n\n");
        output.push_str("| Package | Current | Latest | Security Score |\n");
        output.push_str("|---------|---------|--------|----------------|\n");
        for win in wins {
            output.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                Self::package_link(&win.name),
                Self::escape(&win.current),
                Self::escape(&win.latest),
                win.security_score
            ));
        }
        output.push('\n');
    }

    fn render_heaviest(&self, output: &mut String, aggregate: &SbomAggregate) {
        let heaviest = &aggregate.insights.heaviest_dependencies;
        if heaviest.is_empty() {
            return;
        }

        output.push_str("## Heaviest Dependencies\n\n");
        output.push_str("| Package | Version | Minified | Gzipped |\n");
        output.push_str("|---------|---------|----------|---------|\n");
        for entry in heaviest {
            output.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                Self::package_link(&entry.name),
                Self::escape(&entry.version),
                Self::kilobytes(entry.minified_kb),
                Self::kilobytes(entry.gzipped_kb)
            ));
        }
        output.push('\n');
    }

    fn render_license_issues(&self, output: &mut String, aggregate: &SbomAggregate) {
        let issues = &aggregate.insights.license_issues;
        if issues.is_empty() {
            return;
        }

        output.push_str("## License Issues\n\n");
        output.push_str("| Package | Version | License | Scope |\n");
        output.push_str("|---------|---------|---------|-------|\n");
        for issue in issues {
            output.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                Self::package_link(&issue.name),
                Self::escape(&issue.version),
                Self::escape(&issue.license),
                if issue.is_dev { "development" } else { "production" }
            ));
        }
        output.push('\n');
    }

    fn render_maintenance(&self, output: &mut String, aggregate: &SbomAggregate) {
        let insights = &aggregate.insights;
        if insights.abandoned_packages.is_empty() && insights.deprecated_packages.is_empty() {
            return;
        }

        output.push_str("## Abandoned and Deprecated Packages\n\n");
        if !insights.abandoned_packages.is_empty() {
            output.push_str("| Package | Version | Days Since Update |\n");
            output.push_str("|---------|---------|-------------------|\n");
            for entry in &insights.abandoned_packages {
                output.push_str(&format!(
                    "| {} | {} | {} |\n",
                    Self::package_link(&entry.name),
                    Self::escape(&entry.version),
                    entry.days_since_update
                ));
            }
            output.push('\n');
        }
        if !insights.deprecated_packages.is_empty() {
            output.push_str("| Package | Version | Deprecation Notice |\n");
            output.push_str("|---------|---------|--------------------|\n");
            for entry in &insights.deprecated_packages {
                output.push_str(&format!(
                    "| {} | {} | {} |\n",
                    Self::package_link(&entry.name),
                    Self::escape(&entry.version),
                    Self::escape(&entry.message)
                ));
            }
            output.push('\n');
        }
    }

    fn render_vulnerabilities(&self, output: &mut String, aggregate: &SbomAggregate) {
        let summary = &aggregate.insights.vulnerability_summary;

        output.push_str("## Vulnerability Summary\n\n");
        if summary.total == 0 {
            output.push_str("No known vulnerabilities found.\n\n");
            return;
        }

        output.push_str(&format!(
            "**{} vulnerabilities** in {} packages: {} critical, {} high, {} moderate, {} low, {} unrated.\n\n",
            summary.total,
            summary.packages_affected,
            summary.critical,
            summary.high,
            summary.moderate,
            summary.low,
            summary.none + summary.unknown
        ));

        if let Some(audit) = &aggregate.audit {
            output.push_str(&format!(
                "npm audit reported {} findings ({} critical, {} high, {} moderate, {} low, {} info).\n\n",
                audit.total, audit.critical, audit.high, audit.moderate, audit.low, audit.info
            ));
        }

        output.push_str(VULN_TABLE_HEADER);
        output.push_str(VULN_TABLE_SEPARATOR);

        let mut affected: Vec<&DependencyRecord> =
            unique_records(aggregate, DependencyRecord::purl)
                .into_iter()
                .filter(|r| r.has_vulnerabilities())
                .collect();
        affected.sort_by(|a, b| {
            let rank = |r: &DependencyRecord| r.highest_severity().map(|s| s.rank()).unwrap_or(0);
            rank(b).cmp(&rank(a)).then_with(|| a.name.cmp(&b.name))
        });

        for record in affected {
            for vuln in &record.vulnerabilities {
                let id = match vuln.url.as_deref().and_then(Self::link_target) {
                    Some(url) => format!("[{}]({})", Self::escape(&vuln.id), url),
                    None => Self::escape(&vuln.id),
                };
                output.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {} | {} |\n",
                    Self::package_link(&record.name),
                    Self::escape(&record.current_version),
                    vuln.fixed_in.as_deref().map(Self::escape).unwrap_or_else(|| "N/A".to_string()),
                    vuln.cvss_score
                        .map(|s| format!("{:.1}", s.value()))
                        .unwrap_or_else(|| "N/A".to_string()),
                    vuln.severity,
                    id,
                    vuln.vex_status.map(|s| s.as_str()).unwrap_or("-")
                ));
            }
        }
        output.push('\n');
    }

    fn render_package(&self, output: &mut String, package: &PackageAnalysis, is_monorepo: bool) {
        let level = if is_monorepo {
            output.push_str(&format!("## Package: {}\n\n", Self::escape(&package.display_name())));
            if let Some(path) = &package.path {
                output.push_str(&format!("Path: {}\n\n", Self::escape(path)));
            }
            "###"
        } else {
            "##"
        };

        output.push_str(&format!("{} Production Dependencies\n\n", level));
        self.render_dependency_table(output, &package.dependencies);

        if !package.dev_dependencies.is_empty() {
            output.push_str(&format!("{} Development Dependencies\n\n", level));
            self.render_dependency_table(output, &package.dev_dependencies);
        }
    }

    fn render_dependency_table(&self, output: &mut String, records: &[DependencyRecord]) {
        if records.is_empty() {
            output.push_str("*None*\n\n");
            return;
        }

        output.push_str(DEPENDENCY_TABLE_HEADER);
        output.push_str(DEPENDENCY_TABLE_SEPARATOR);
        for record in records {
            let security = Option::<u8>::from(record.security_score)
                .map(|s| s.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} ({}) | {} | {} |\n",
                Self::package_link(&record.name),
                Self::escape(&record.current_version),
                Self::escape(&record.latest_version),
                Self::escape(record.license.as_deref().unwrap_or("N/A")),
                record.risk.score,
                record.risk.risk_level,
                security,
                Self::escape(&record.description)
            ));
        }
        output.push('\n');
    }

    fn render_known_unknowns(&self, output: &mut String, aggregate: &SbomAggregate) {
        if aggregate.known_unknowns.is_empty() {
            return;
        }

        output.push_str("## Known Unknowns\n\n");
        output.push_str("Declared dependencies that could not be fully analyzed.\n\n");
        output.push_str("| Package | Version | Category | Reason |\n");
        output.push_str("|---------|---------|----------|--------|\n");
        for unknown in &aggregate.known_unknowns {
            output.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                Self::escape(&unknown.name),
                Self::escape(&unknown.version),
                unknown.category,
                Self::escape(&unknown.reason)
            ));
        }
        output.push('\n');
    }

    fn render_compliance(&self, output: &mut String, aggregate: &SbomAggregate) {
        let Some(report) = &aggregate.compliance else {
            return;
        };

        output.push_str(&format!("## Compliance ({})\n\n", report.standard));
        output.push_str(&format!(
            "**Overall:** {} ({} passed, {} warnings, {} failed)\n\n",
            report.overall, report.passed, report.warnings, report.failed
        ));
        output.push_str("| Control | Name | Status | Findings |\n");
        output.push_str("|---------|------|--------|----------|\n");
        for control in &report.controls {
            let status = match control.status {
                ControlStatus::Pass => "✅ pass",
                ControlStatus::Warning => "⚠️ warning",
                ControlStatus::Fail => "❌ fail",
            };
            let findings = if control.findings.is_empty() {
                "-".to_string()
            } else {
                control
                    .findings
                    .iter()
                    .map(|f| Self::escape(f))
                    .collect::<Vec<_>>()
                    .join("<br>")
            };
            output.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                control.id,
                Self::escape(&control.name),
                status,
                findings
            ));
        }
        output.push('\n');
    }
}
