//! Markdown and JSON report generation.
//!
//! This module renders a [`Report`] for people (Markdown) or for
//! other tools (JSON).

use crate::calculator::HistoryEntry;
use crate::models::{Aggregation, AggregationSection, Report, ReportMetadata, Summary};
use crate::scenario::ScenarioOutcome;
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.metadata.title));

    output.push_str(&generate_metadata_section(&report.metadata));

    if let Some(ref section) = report.aggregation {
        output.push_str(&generate_aggregation_section(section, report.metadata.precision));
    }

    output.push_str(&generate_history_section(&report.history));

    output.push_str(&generate_scenarios_section(&report.scenarios));

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Version:** {}\n", metadata.tool_version));
    section.push_str(&format!("- **Precision:** {} decimal places\n", metadata.precision));
    section.push_str(&format!("- **Zero-total policy:** `{}`\n", metadata.zero_total));
    section.push('\n');

    section
}

/// Generate the aggregation section.
fn generate_aggregation_section(section: &AggregationSection, precision: u32) -> String {
    let mut out = String::new();

    out.push_str("## Aggregation\n\n");

    match section.result {
        Aggregation::Empty => {
            out.push_str("No values were provided; nothing to aggregate.\n\n");
        }
        Aggregation::Summary(ref summary) => {
            out.push_str(&generate_summary_table(summary));
            out.push_str(&generate_contributions_table(
                &section.values,
                summary,
                precision,
            ));
        }
    }

    out
}

/// Generate the totals table for a summary.
fn generate_summary_table(summary: &Summary) -> String {
    let mut table = String::new();

    table.push_str("| Count | Total | Mean | Std Dev | Shares |\n");
    table.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    table.push_str(&format!(
        "| {} | {} | {} | {:.4} | {} |\n\n",
        summary.count,
        summary.total,
        summary.mean,
        summary.std_dev,
        if summary.shares.is_defined() {
            "defined"
        } else {
            "**total is zero**"
        }
    ));

    table
}

/// Generate the per-value contributions table.
fn generate_contributions_table(values: &[f64], summary: &Summary, precision: u32) -> String {
    let mut table = String::new();

    table.push_str("### Contributions\n\n");
    table.push_str("| # | Value | Share of Total |\n");
    table.push_str("|:---:|---:|---:|\n");

    for (i, (value, share)) in values.iter().zip(&summary.contributions).enumerate() {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            i + 1,
            value,
            format_share(*share, precision)
        ));
    }
    table.push('\n');

    if summary.shares.is_defined() {
        table.push_str(&format!(
            "*Contributions sum to {}%.*\n\n",
            format_number(summary.contribution_sum(), precision)
        ));
    }

    table
}

/// Generate the calculator history section.
fn generate_history_section(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Calculator History\n\n");
    section.push_str("| # | Operation | Expression | Result |\n");
    section.push_str("|:---:|:---|:---|---:|\n");

    for (i, entry) in history.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} {} {} | {} |\n",
            i + 1,
            entry.operator,
            entry.lhs,
            entry.operator.symbol(),
            entry.rhs,
            entry.result
        ));
    }
    section.push('\n');

    section
}

/// Generate the scenario outcomes section.
fn generate_scenarios_section(scenarios: &[ScenarioOutcome]) -> String {
    if scenarios.is_empty() {
        return String::new();
    }

    let failed = scenarios.iter().filter(|s| !s.is_success()).count();
    let mut section = String::new();

    section.push_str("## Scenarios\n\n");
    section.push_str(&format!(
        "{} scenarios run: {} succeeded, {} failed.\n\n",
        scenarios.len(),
        scenarios.len() - failed,
        failed
    ));
    section.push_str("| Scenario | Status | Detail |\n");
    section.push_str("|:---|:---:|:---|\n");

    for outcome in scenarios {
        let (status, detail) = match outcome {
            ScenarioOutcome::Succeeded {
                expression, result, ..
            } => ("✅ ok", format!("{} = {}", expression, result)),
            ScenarioOutcome::Failed { kind, message, .. } => {
                ("❌ failed", format!("{}: {}", kind, message))
            }
        };
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            outcome.description(),
            status,
            detail
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by tally*\n".to_string()
}

/// Format a contribution, marking undefined shares.
fn format_share(share: f64, precision: u32) -> String {
    if share.is_nan() {
        "undefined".to_string()
    } else {
        format!("{}%", format_number(share, precision))
    }
}

fn format_number(value: f64, precision: u32) -> String {
    format!("{:.*}", precision as usize, value)
}

/// Write a Markdown report to a file.
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let content = generate_markdown_report(report);

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a JSON report to a file.
pub fn write_json_report(report: &Report, path: &Path) -> Result<()> {
    let content = generate_json_report(report)?;

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::Operator;
    use crate::models::{ShareStatus, ZeroTotalPolicy};
    use crate::scenario::FailureKind;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_metadata() -> ReportMetadata {
        ReportMetadata {
            title: "Test Report".to_string(),
            generated_at: Utc::now(),
            tool_version: "1.0.0".to_string(),
            precision: 2,
            zero_total: ZeroTotalPolicy::Error,
        }
    }

    fn create_summary(contributions: Vec<f64>, shares: ShareStatus) -> Summary {
        Summary {
            count: contributions.len(),
            total: 60.0,
            mean: 20.0,
            std_dev: 8.1650,
            contributions,
            shares,
        }
    }

    fn create_test_report() -> Report {
        let mut report = Report::new(create_metadata());
        report.aggregation = Some(AggregationSection {
            values: vec![10.0, 20.0, 30.0],
            result: Aggregation::Summary(create_summary(
                vec![16.67, 33.33, 50.0],
                ShareStatus::Defined,
            )),
        });
        report.history = vec![HistoryEntry {
            operator: Operator::Add,
            lhs: 10.0,
            rhs: 5.0,
            result: 15.0,
        }];
        report.scenarios = vec![
            ScenarioOutcome::Succeeded {
                description: "Valid input".to_string(),
                expression: "50 / 5".to_string(),
                result: 10.0,
            },
            ScenarioOutcome::Failed {
                description: "Division by zero".to_string(),
                kind: FailureKind::DivisionByZero,
                message: "division by zero is not allowed".to_string(),
            },
        ];
        report
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.starts_with("# Test Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Aggregation"));
        assert!(markdown.contains("| 1 | 10 | 16.67% |"));
        assert!(markdown.contains("| 3 | 30 | 50.00% |"));
        assert!(markdown.contains("## Calculator History"));
        assert!(markdown.contains("| 1 | add | 10 + 5 | 15 |"));
        assert!(markdown.contains("## Scenarios"));
        assert!(markdown.contains("2 scenarios run: 1 succeeded, 1 failed."));
    }

    #[test]
    fn test_sections_omitted_when_empty() {
        let report = Report::new(create_metadata());
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("## Metadata"));
        assert!(!markdown.contains("## Aggregation"));
        assert!(!markdown.contains("## Calculator History"));
        assert!(!markdown.contains("## Scenarios"));
    }

    #[test]
    fn test_empty_aggregation_section() {
        let section = AggregationSection {
            values: Vec::new(),
            result: Aggregation::Empty,
        };
        let out = generate_aggregation_section(&section, 2);
        assert!(out.contains("No values were provided"));
        assert!(!out.contains("### Contributions"));
    }

    #[test]
    fn test_undefined_shares_rendering() {
        let section = AggregationSection {
            values: vec![0.0, 0.0],
            result: Aggregation::Summary(create_summary(
                vec![f64::NAN, f64::NAN],
                ShareStatus::Undefined,
            )),
        };
        let out = generate_aggregation_section(&section, 2);
        assert!(out.contains("| 1 | 0 | undefined |"));
        assert!(out.contains("**total is zero**"));
        assert!(!out.contains("Contributions sum to"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let section = generate_metadata_section(&create_metadata());
        assert!(section.contains("**Version:** 1.0.0"));
        assert!(section.contains("2 decimal places"));
        assert!(section.contains("`error`"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"contributions\""));
        assert!(json.contains("\"kind\": \"summary\""));
        assert!(json.contains("\"status\": \"failed\""));
        assert!(json.contains("\"division_by_zero\""));
    }

    #[test]
    fn test_write_reports_to_files() {
        let dir = TempDir::new().unwrap();
        let report = create_test_report();

        let md_path = dir.path().join("report.md");
        write_report(&report, &md_path).unwrap();
        let md = std::fs::read_to_string(&md_path).unwrap();
        assert!(md.contains("# Test Report"));

        let json_path = dir.path().join("report.json");
        write_json_report(&report, &json_path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["metadata"]["precision"], 2);
        assert_eq!(json["history"][0]["result"], 15.0);
    }
}
