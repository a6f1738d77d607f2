//! Compact report (`aliases.toon`)
//!
//! Token-oriented text meant for people and language models to read: an
//! indented metadata block, comma-delimited tables with a
//! `name[rows]{columns}:` header, and a summary block. The file is a log;
//! each run appends one section and earlier sections are never rewritten.

use chrono::{DateTime, SecondsFormat, Utc};

use shared::{AliasRecord, BatchId, CredentialPair};

/// Separator line written between sections
pub const SECTION_SEPARATOR: &str = "---";

/// What produced a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Create,
    Passwords,
    Delete,
    Convert,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Create => "create",
            ReportKind::Passwords => "passwords",
            ReportKind::Delete => "delete",
            ReportKind::Convert => "convert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub address: String,
    pub rule_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFailure {
    pub address: String,
    pub error: String,
}

/// One dated section of the report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub kind: ReportKind,
    pub batch_id: BatchId,
    pub generated_at: DateTime<Utc>,
    pub domain: String,
    pub theme: Option<String>,
    pub seed: Option<u32>,
    pub rows: Vec<ReportRow>,
    pub failures: Vec<ReportFailure>,
}

impl ReportSection {
    pub fn new(kind: ReportKind, batch_id: BatchId, domain: impl Into<String>) -> Self {
        Self {
            kind,
            batch_id,
            generated_at: Utc::now(),
            domain: domain.into(),
            theme: None,
            seed: None,
            rows: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn with_theme(mut self, theme: Option<&str>, seed: Option<u32>) -> Self {
        self.theme = theme.map(str::to_string);
        self.seed = seed;
        self
    }

    /// Successful records become rows (secret taken from `credentials` when
    /// present), failed records become failures
    pub fn with_records(mut self, records: &[AliasRecord], credentials: &[CredentialPair]) -> Self {
        for record in records {
            if record.is_success() {
                let password = credentials
                    .iter()
                    .rev()
                    .find(|pair| pair.address.eq_ignore_ascii_case(&record.address))
                    .map(|pair| pair.password.clone())
                    .or_else(|| record.password.clone());
                self.rows.push(ReportRow {
                    address: record.address.clone(),
                    rule_id: record.rule_id.clone(),
                    created_at: record.created_at,
                    password,
                });
            } else if record.status.is_terminal() {
                self.failures.push(ReportFailure {
                    address: record.address.clone(),
                    error: record.error.clone().unwrap_or_else(|| "unknown error".to_string()),
                });
            }
        }
        self
    }

    pub fn total(&self) -> usize {
        self.rows.len() + self.failures.len()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("metadata:\n");
        push_field(&mut out, "kind", self.kind.as_str());
        push_field(&mut out, "batch_id", &self.batch_id.to_string());
        push_field(
            &mut out,
            "generated_at",
            &self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        push_field(&mut out, "domain", &self.domain);
        if let Some(theme) = &self.theme {
            push_field(&mut out, "theme", theme);
        }
        if let Some(seed) = self.seed {
            push_field(&mut out, "seed", &seed.to_string());
        }

        out.push_str(&format!(
            "aliases[{}]{{address,rule_id,created_at,password}}:\n",
            self.rows.len()
        ));
        for row in &self.rows {
            let cells = [
                quote(&row.address),
                quote(row.rule_id.as_deref().unwrap_or("")),
                quote(&row.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
                quote(row.password.as_deref().unwrap_or("")),
            ];
            out.push_str("  ");
            out.push_str(&cells.join(","));
            out.push('\n');
        }

        if !self.failures.is_empty() {
            out.push_str(&format!("failed[{}]{{address,error}}:\n", self.failures.len()));
            for failure in &self.failures {
                out.push_str(&format!("  {},{}\n", quote(&failure.address), quote(&failure.error)));
            }
        }

        out.push_str("summary:\n");
        push_field(&mut out, "total", &self.total().to_string());
        push_field(&mut out, "succeeded", &self.rows.len().to_string());
        push_field(&mut out, "failed", &self.failures.len().to_string());
        out
    }
}

fn push_field(out: &mut String, key: &str, value: &str) {
    out.push_str("  ");
    out.push_str(key);
    out.push_str(": ");
    out.push_str(&quote(value));
    out.push('\n');
}

/// Quote a cell when it would otherwise be ambiguous
fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value != value.trim()
        || value.contains([',', ':', '"', '\\', '\n', '\r', '#'])
        || value.starts_with('-');
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{escaped}\"")
}

/// Text to append to an existing report: a separator when the report
/// already has content, then the section
pub fn append_text(existing: &str, section: &ReportSection) -> String {
    let mut out = String::new();
    if !existing.trim().is_empty() {
        if !existing.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(SECTION_SEPARATOR);
        out.push('\n');
    }
    out.push_str(&section.render());
    out
}

/// Number of sections in a report
pub fn count_sections(text: &str) -> usize {
    text.lines().filter(|line| *line == "metadata:").count()
}
