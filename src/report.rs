//! Rendering of query results and failures for the operator.

use crate::error::ClinicError;
use crate::model::{ExaminationReportRow, Record, Value};
use serde_json::json;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

/// Rows ready for display, with their column headers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn from_rows<T: Tabular>(rows: &[T]) -> Self {
        Self {
            columns: T::headers().iter().map(|c| c.to_string()).collect(),
            rows: rows.iter().map(Tabular::cells).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|v| json!(v)))
                    .collect::<serde_json::Map<_, _>>()
            })
            .collect::<Vec<_>>();
        json!(rows)
    }

    /// Column-aligned text, one line per row, like a dataframe printout.
    fn to_table(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(Value::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, header)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |fields: &[String]| {
            fields
                .iter()
                .zip(&widths)
                .map(|(f, w)| format!("{:<width$}", f, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = vec![line(&self.columns)];
        out.extend(cells.iter().map(|row| line(row)));
        out.join("\n")
    }
}

/// Types that can be shown as result rows.
pub trait Tabular {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<Value>;
}

impl<R: Record> Tabular for R {
    fn headers() -> &'static [&'static str] {
        R::COLUMNS
    }

    fn cells(&self) -> Vec<Value> {
        self.values()
    }
}

impl Tabular for ExaminationReportRow {
    fn headers() -> &'static [&'static str] {
        ExaminationReportRow::COLUMNS
    }

    fn cells(&self) -> Vec<Value> {
        self.values()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}' (expected table or json)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => f.write_str("table"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

/// Writes results and failures to an output stream. Never touches the store.
pub struct Reporter<W: Write> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn section(&mut self, title: &str) -> io::Result<()> {
        match self.format {
            OutputFormat::Table => writeln!(self.out, "\n--- {} ---", title),
            OutputFormat::Json => writeln!(self.out, "{}", json!({ "section": title })),
        }
    }

    pub fn message(&mut self, text: &str) -> io::Result<()> {
        match self.format {
            OutputFormat::Table => writeln!(self.out, "{}", text),
            OutputFormat::Json => writeln!(self.out, "{}", json!({ "message": text })),
        }
    }

    pub fn table(&mut self, title: &str, results: &ResultSet) -> io::Result<()> {
        match self.format {
            OutputFormat::Table => {
                writeln!(self.out, "\n--- {} ---", title)?;
                if results.is_empty() {
                    writeln!(self.out, "No data found.")
                } else {
                    writeln!(self.out, "{}", results.to_table())
                }
            }
            OutputFormat::Json => writeln!(
                self.out,
                "{}",
                json!({ "title": title, "rows": results.to_json() })
            ),
        }
    }

    pub fn failure(&mut self, context: &str, error: &ClinicError) -> io::Result<()> {
        match self.format {
            OutputFormat::Table => writeln!(self.out, "{}: {}", context, describe(error)),
            OutputFormat::Json => {
                let mut doc = json!({ "context": context, "error": error.to_string() });
                if let ClinicError::ConstraintViolation {
                    table,
                    constraint,
                    category,
                    ..
                } = error
                {
                    doc["table"] = json!(table);
                    doc["constraint"] = json!(constraint);
                    doc["category"] = json!(category);
                }
                writeln!(self.out, "{}", doc)
            }
        }
    }
}

/// Human-readable explanation of a failed transaction.
pub fn describe(error: &ClinicError) -> String {
    match error {
        ClinicError::ConstraintViolation {
            table,
            constraint,
            category,
            detail,
        } => format!(
            "rejected by {} constraint '{}' on {} ({})",
            category, constraint, table, detail
        ),
        ClinicError::NotFoundNoop { table, key } => {
            format!("no {} row with key {}, nothing was changed", table, key)
        }
        other => other.to_string(),
    }
}
