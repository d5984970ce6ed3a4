//! Output formatting for the CLI.

use crate::commands::LoadTestReport;
use crate::error::Result;
use archivist_domain::{AnalyzeDocumentResponse, PrepareDocumentsResponse, Resolution, SoftResult};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text and tables
    Table,
    /// One JSON document per result
    Json,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the outcome of one `AnalyzeDocument` call.
    pub fn format_analysis(
        &self,
        name: &str,
        outcome: &Resolution<AnalyzeDocumentResponse>,
    ) -> Result<String> {
        match (self.format, outcome) {
            (OutputFormat::Json, Resolution::Success(response)) => Ok(serde_json::to_string_pretty(
                &serde_json::json!({ "document": name, "analysis": response.analysis }),
            )?),
            (OutputFormat::Json, Resolution::Soft(soft)) => self.soft_json(name, soft),
            (OutputFormat::Table, Resolution::Success(response)) => Ok(format!(
                "{}\n\n{}",
                self.success(&format!("Analyzed {}", name)),
                response.analysis
            )),
            (OutputFormat::Table, Resolution::Soft(soft)) => Ok(self.soft_text(soft)),
        }
    }

    /// Format the outcome of one `PrepareDocuments` call.
    pub fn format_prepare(
        &self,
        archive_url: &str,
        outcome: &Resolution<PrepareDocumentsResponse>,
    ) -> Result<String> {
        match (self.format, outcome) {
            (OutputFormat::Json, Resolution::Success(response)) => Ok(serde_json::to_string_pretty(
                &serde_json::json!({ "archive": archive_url, "fileCount": response.file_count }),
            )?),
            (OutputFormat::Json, Resolution::Soft(soft)) => self.soft_json(archive_url, soft),
            (OutputFormat::Table, Resolution::Success(response)) => Ok(self.success(&format!(
                "Prepared {} file(s) from {}",
                response.file_count, archive_url
            ))),
            (OutputFormat::Table, Resolution::Soft(soft)) => Ok(self.soft_text(soft)),
        }
    }

    /// Format a load-test report.
    pub fn format_load_test(&self, report: &LoadTestReport) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(report)?);
        }

        let mut builder = Builder::default();
        builder.push_record(["Calls", "Success", "Soft", "Failure", "Elapsed"]);
        builder.push_record([
            report.total().to_string(),
            report.successes.to_string(),
            report.soft_results.to_string(),
            report.failures.to_string(),
            format!("{:.2}s", report.elapsed.as_secs_f64()),
        ]);

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let summary = format!("Success: {}, Failure: {}", report.successes, report.failures);
        let summary = if report.failures == 0 {
            self.success(&summary)
        } else {
            self.warning(&summary)
        };
        Ok(format!("{}\n{}", table, summary))
    }

    fn soft_json(&self, subject: &str, soft: &SoftResult) -> Result<String> {
        Ok(serde_json::to_string_pretty(&serde_json::json!({
            "subject": subject,
            "message": soft.message,
            "analysis": soft.analysis,
            "result": soft.detail,
            "error": soft.tag,
        }))?)
    }

    fn soft_text(&self, soft: &SoftResult) -> String {
        format!("{}\n  {}", self.warning(&soft.message), soft.detail)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
