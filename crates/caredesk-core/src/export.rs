use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::schema::{ListConfig, Record};
use crate::stats::StatsSnapshot;
use crate::view::ListView;
use crate::{Error, Result};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "md" | "markdown" => Some(ExportFormat::Markdown),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }
}

/// Writes the rows a list view currently shows
pub struct Exporter;

impl Exporter {
    /// Export what `view` shows, picking the format from the extension
    pub fn export_view<R: Record, P: AsRef<Path>>(view: &ListView<R>, path: P) -> Result<usize> {
        let rows = view.rows();
        Self::export_to_file(&rows, view.config(), view.stats(), path)?;
        Ok(rows.len())
    }

    pub fn export_to_file<R: Record, P: AsRef<Path>>(
        rows: &[&R],
        config: &ListConfig<R>,
        stats: Option<&StatsSnapshot>,
        path: P,
    ) -> Result<()> {
        let path = path.as_ref();
        let format = ExportFormat::from_path(path).ok_or_else(|| {
            Error::Config(
                "Could not determine export format from extension. Use .json, .csv, or .md"
                    .to_string(),
            )
        })?;

        Self::export_to_file_with_format(rows, config, stats, path, format)
    }

    pub fn export_to_file_with_format<R: Record, P: AsRef<Path>>(
        rows: &[&R],
        config: &ListConfig<R>,
        stats: Option<&StatsSnapshot>,
        path: P,
        format: ExportFormat,
    ) -> Result<()> {
        let content = match format {
            ExportFormat::Json => Self::to_json(rows)?,
            ExportFormat::Csv => Self::to_csv(rows, config),
            ExportFormat::Markdown => Self::to_markdown(rows, config, stats),
        };

        let mut file = File::create(path.as_ref())?;
        file.write_all(content.as_bytes())?;
        info!(
            "Exported {} {} to {}",
            rows.len(),
            R::COLLECTION,
            path.as_ref().display()
        );
        Ok(())
    }

    /// Full records, not just the visible columns
    pub fn to_json<R: Record>(rows: &[&R]) -> Result<String> {
        Ok(serde_json::to_string_pretty(rows)?)
    }

    /// One column per configured column, headed by its title
    pub fn to_csv<R>(rows: &[&R], config: &ListConfig<R>) -> String {
        let mut output = String::new();

        let header: Vec<String> = config
            .columns
            .iter()
            .map(|c| Self::escape_csv(c.title))
            .collect();
        output.push_str(&header.join(","));
        output.push('\n');

        for row in rows {
            let cells: Vec<String> = config
                .columns
                .iter()
                .map(|c| Self::escape_csv(&c.value(row).as_text()))
                .collect();
            output.push_str(&cells.join(","));
            output.push('\n');
        }

        output
    }

    pub fn to_markdown<R: Record>(
        rows: &[&R],
        config: &ListConfig<R>,
        stats: Option<&StatsSnapshot>,
    ) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", R::KIND.label()));
        output.push_str(&format!("Rows: {}\n\n", rows.len()));

        let titles: Vec<&str> = config.columns.iter().map(|c| c.title).collect();
        output.push_str(&format!("| {} |\n", titles.join(" | ")));
        let rule: Vec<&str> = config.columns.iter().map(|_| "---").collect();
        output.push_str(&format!("|{}|\n", rule.join("|")));

        for row in rows {
            let cells: Vec<String> = config
                .columns
                .iter()
                .map(|c| Self::escape_markdown(&c.value(row).as_text()))
                .collect();
            output.push_str(&format!("| {} |\n", cells.join(" | ")));
        }

        // Summary counts describe the whole collection
        if let Some(stats) = stats {
            output.push_str("\n## Summary\n\n");
            output.push_str(&format!("- Total: {}\n", stats.total));
            for category in &stats.categories {
                output.push_str(&format!("- {}: {}\n", category.label, category.count));
            }
        }

        output
    }

    /// Escape CSV special characters
    fn escape_csv(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }

    fn escape_markdown(s: &str) -> String {
        s.replace('|', "\\|").replace('\n', " ")
    }
}
