//! Table formatting utilities for CLI list output
//!
//! # Text Wrapping
//!
//! The table formatter supports text wrapping for narrow terminals:
//! - Use `TableConfig::with_wrap(width)` to enable word-wrapped multi-line rows
//! - CSV and ID formats remain single-line for pipability

use chrono::NaiveDate;
use console::style;

use crate::cli::helpers::{escape_csv, format_amount, truncate_str};
use crate::cli::OutputFormat;
use crate::core::claim::{ClaimStatus, SentimentLabel};

/// Configuration for table output
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Maximum width for text columns before wrapping (None = truncate instead)
    pub wrap_width: Option<usize>,
    /// Show summary line after table (e.g., "5 claim(s) found")
    pub show_summary: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            wrap_width: None,
            show_summary: true,
        }
    }
}

impl TableConfig {
    /// Create config with text wrapping enabled at the specified width
    pub fn with_wrap(width: usize) -> Self {
        Self {
            wrap_width: Some(width),
            show_summary: true,
        }
    }

    /// Create config optimized for piping (no wrapping, no summary)
    pub fn for_pipe() -> Self {
        Self {
            wrap_width: None,
            show_summary: false,
        }
    }
}

/// Wrap text to fit within a maximum width, breaking at word boundaries
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.chars().count() <= max_width || max_width < 5 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current_line.chars().count();

        if !current_line.is_empty() && current_len + 1 + word_len <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
            continue;
        }

        if !current_line.is_empty() {
            lines.push(std::mem::take(&mut current_line));
        }

        // Word longer than the line: hard break
        let chars: Vec<char> = word.chars().collect();
        let mut chunks = chars.chunks(max_width).peekable();
        while let Some(chunk) = chunks.next() {
            let piece: String = chunk.iter().collect();
            if chunks.peek().is_some() {
                lines.push(piece);
            } else {
                current_line = piece;
            }
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Claim ID (cyan)
    Id(String),
    /// Plain text, truncated or wrapped
    Text(String),
    /// Claim status with color coding
    Status(ClaimStatus),
    /// Sentiment label with color coding
    Sentiment(SentimentLabel),
    /// Sentiment score, three decimals, colored by sign
    Score(f64),
    /// Currency amount
    Amount(f64),
    Date(NaiveDate),
    Number(u64),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(id).cyan(), width = width),
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Status(status) => {
                let s = status.to_string();
                let styled = match status {
                    ClaimStatus::Approved => style(s).green(),
                    ClaimStatus::Denied => style(s).red(),
                    ClaimStatus::Pending => style(s).yellow(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Sentiment(label) => {
                let s = label.to_string();
                let styled = match label {
                    SentimentLabel::Positive => style(s).green(),
                    SentimentLabel::Negative => style(s).red(),
                    SentimentLabel::Neutral => style(s).yellow(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Score(score) => {
                let s = format!("{:.3}", score);
                let styled = if *score > 0.0 {
                    style(s).green()
                } else if *score < 0.0 {
                    style(s).red()
                } else {
                    style(s).dim()
                };
                format!("{:>width$}", styled, width = width)
            }
            CellValue::Amount(amount) => {
                format!("{:>width$}", format_amount(*amount), width = width)
            }
            CellValue::Date(date) => {
                format!("{:<width$}", date.format("%Y-%m-%d"), width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Empty => format!("{:<width$}", "-", width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => escape_csv(s),
            // plain number so spreadsheets can sum it
            CellValue::Amount(amount) => format!("{:.2}", amount),
            other => escape_csv(&other.raw()),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Empty => "-".to_string(),
            CellValue::Status(ClaimStatus::Denied) => "**DENIED**".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|").replace('\n', " ")
    }

    /// Get raw string value (no formatting)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => s.clone(),
            CellValue::Status(status) => status.to_string(),
            CellValue::Sentiment(label) => label.to_string(),
            CellValue::Score(score) => format!("{:.3}", score),
            CellValue::Amount(amount) => format_amount(*amount),
            CellValue::Date(date) => date.format("%Y-%m-%d").to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Get the display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Date(_) => 10,
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    item_name: &'static str,
    config: TableConfig,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], item_name: &'static str) -> Self {
        Self {
            columns,
            item_name,
            config: TableConfig::default(),
        }
    }

    /// Configure the formatter with custom settings
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Render rows in the specified format
    ///
    /// JSON and YAML are handled by callers with serde; they fall back to TSV here.
    pub fn render<I>(&self, rows: I, format: OutputFormat) -> String
    where
        I: IntoIterator<Item = TableRow>,
    {
        let rows: Vec<TableRow> = rows.into_iter().collect();

        match format {
            OutputFormat::Csv => self.render_csv(&rows),
            OutputFormat::Md => self.render_md(&rows),
            OutputFormat::Id => self.render_ids(&rows),
            _ => self.render_tsv(&rows),
        }
    }

    /// Calculate dynamic column widths based on actual content
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(0);

                // +2 for the truncation buffer; capped at the column's width
                let natural_width = col.header.len().max(max_content.saturating_add(2));
                natural_width.min(col.width)
            })
            .collect()
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.calculate_widths(rows);
        let mut out = String::new();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            match self.config.wrap_width {
                Some(wrap_width) => self.render_tsv_row_wrapped(&mut out, row, &widths, wrap_width),
                None => self.render_tsv_row_truncated(&mut out, row, &widths),
            }
        }

        if self.config.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} {}(s) found.\n",
                style(rows.len()).cyan(),
                self.item_name
            ));
        }

        out
    }

    fn render_tsv_row_truncated(&self, out: &mut String, row: &TableRow, widths: &[usize]) {
        let parts: Vec<String> = self
            .columns
            .iter()
            .zip(widths)
            .map(|(col, w)| match row.get(col.key) {
                Some(value) => value.format_tsv(*w),
                None => format!("{:<width$}", "-", width = *w),
            })
            .collect();
        out.push_str(parts.join(" ").trim_end());
        out.push('\n');
    }

    fn render_tsv_row_wrapped(
        &self,
        out: &mut String,
        row: &TableRow,
        widths: &[usize],
        wrap_width: usize,
    ) {
        let wrapped_cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|col| match row.get(col.key) {
                Some(value @ CellValue::Text(_)) => wrap_text(&value.raw(), wrap_width),
                Some(value) => vec![value.raw()],
                None => vec!["-".to_string()],
            })
            .collect();

        let max_lines = wrapped_cells.iter().map(|c| c.len()).max().unwrap_or(1);

        for line_idx in 0..max_lines {
            let parts: Vec<String> = wrapped_cells
                .iter()
                .enumerate()
                .map(|(col_idx, lines)| {
                    let is_text = matches!(
                        row.get(self.columns[col_idx].key),
                        Some(CellValue::Text(_))
                    );
                    let width = if is_text {
                        wrap_width
                    } else {
                        widths.get(col_idx).copied().unwrap_or(10)
                    };
                    let content = lines.get(line_idx).map(|s| s.as_str()).unwrap_or("");
                    if col_idx == 0 && line_idx == 0 {
                        format!("{:<width$}", style(content).cyan(), width = width)
                    } else {
                        format!("{:<width$}", content, width = width)
                    }
                })
                .collect();
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }

        // Blank line between multi-line rows for readability
        if max_lines > 1 {
            out.push('\n');
        }
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let headers: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        out.push_str(&headers.join(","));
        out.push('\n');

        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| row.get(col.key).map(|v| v.format_csv()).unwrap_or_default())
                .collect();
            out.push_str(&values.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let headers: Vec<&str> = self.columns.iter().map(|c| c.header).collect();
        out.push_str(&format!("| {} |\n", headers.join(" | ")));

        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        out.push_str(&format!("|{}|\n", separators.join("|")));

        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| {
                    row.get(col.key)
                        .map(|v| v.format_md())
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect();
            out.push_str(&format!("| {} |\n", values.join(" | ")));
        }
        out
    }

    fn render_ids(&self, rows: &[TableRow]) -> String {
        rows.iter().map(|row| format!("{}\n", row.id)).collect()
    }
}
