//! Structured list (`aliases.json`) codec and merge
//!
//! Older files are either a bare array of records or an object carrying a
//! `results` / `aliases` array next to some metadata. Both shapes are
//! normalized into [`AliasRecord`] on read; the metadata-wrapped shape is the
//! only one ever written.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared::{AliasRecord, AliasStatus, CredentialPair};

/// Canonical on-disk document
#[derive(Debug, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub metadata: SnapshotMetadata,
    pub aliases: Vec<AliasRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub domain: String,
    pub updated_at: DateTime<Utc>,
    pub count: usize,
}

/// Record shape as found in older files; every field is optional
#[derive(Debug, Deserialize)]
struct LegacyRecord {
    #[serde(alias = "email", alias = "alias")]
    address: String,
    #[serde(default, alias = "id", alias = "tag", alias = "ruleId")]
    rule_id: Option<String>,
    #[serde(default, alias = "created", alias = "createdAt")]
    created_at: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default, alias = "secret")]
    password: Option<String>,
}

impl LegacyRecord {
    fn normalize(self) -> Result<AliasRecord, String> {
        let address = self.address.trim().to_string();
        if !address.contains('@') {
            return Err(format!("'{address}' is not an email address"));
        }

        let created_at = match self.created_at.as_deref() {
            None | Some("") => Utc::now(),
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| format!("bad created_at '{raw}' for {address}: {e}"))?,
        };

        let status = match self.status.as_deref().map(str::to_lowercase).as_deref() {
            Some("success") | Some("created") | Some("active") => AliasStatus::Success,
            Some("failed") | Some("error") => AliasStatus::Failed,
            Some("pending") => AliasStatus::Pending,
            Some(other) => return Err(format!("unknown status '{other}' for {address}")),
            None if self.error.is_some() && self.rule_id.is_none() => AliasStatus::Failed,
            None => AliasStatus::Success,
        };

        Ok(AliasRecord {
            address,
            rule_id: self.rule_id.filter(|id| !id.is_empty()),
            created_at,
            status,
            error: self.error,
            theme: self.theme,
            password: self.password.filter(|p| !p.is_empty()),
        })
    }
}

/// Parse either structured-list shape. Blank text means "no records yet".
pub fn parse_structured(text: &str) -> Result<Vec<AliasRecord>, String> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("aliases").or_else(|| object.remove("results")) {
            Some(Value::Array(items)) => items,
            Some(_) => return Err("'aliases'/'results' is not an array".to_string()),
            None => return Err("object has neither an 'aliases' nor a 'results' array".to_string()),
        },
        _ => return Err("top level must be an array or an object".to_string()),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let legacy = match item {
                // bare address strings from the oldest exports
                Value::String(address) => LegacyRecord {
                    address,
                    rule_id: None,
                    created_at: None,
                    status: None,
                    error: None,
                    theme: None,
                    password: None,
                },
                other => serde_json::from_value::<LegacyRecord>(other).map_err(|e| format!("entry {index}: {e}"))?,
            };
            legacy.normalize().map_err(|e| format!("entry {index}: {e}"))
        })
        .collect()
}

/// Render the canonical metadata-wrapped document
pub fn render_structured(domain: &str, records: &[AliasRecord]) -> serde_json::Result<String> {
    let document = StructuredDocument {
        metadata: SnapshotMetadata {
            domain: domain.to_string(),
            updated_at: Utc::now(),
            count: records.len(),
        },
        aliases: records.to_vec(),
    };
    let mut text = serde_json::to_string_pretty(&document)?;
    text.push('\n');
    Ok(text)
}

/// Counters describing one structured merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructuredMerge {
    pub added: usize,
    pub updated: usize,
    pub passwords_set: usize,
    pub unmatched_credentials: usize,
}

fn key(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Union of `prior` and `incoming`, keyed by address, prior order first.
///
/// A new success replaces the prior entry (keeping its secret when the new
/// record has none); a new failure never replaces a prior success. Pending
/// records are ignored. Credentials then overwrite secrets of matching
/// records.
pub fn merge_records(
    prior: Vec<AliasRecord>,
    incoming: &[AliasRecord],
    credentials: &[CredentialPair],
) -> (Vec<AliasRecord>, StructuredMerge) {
    let mut merged = prior;
    let mut stats = StructuredMerge::default();
    let mut index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, record)| (key(&record.address), i))
        .collect();

    for record in incoming.iter().filter(|r| r.status.is_terminal()) {
        match index.get(&key(&record.address)) {
            Some(&i) => {
                let existing = &mut merged[i];
                if !record.is_success() && existing.is_success() {
                    continue;
                }
                let kept_password = existing.password.take();
                *existing = record.clone();
                if existing.password.is_none() {
                    existing.password = kept_password;
                }
                stats.updated += 1;
            }
            None => {
                index.insert(key(&record.address), merged.len());
                merged.push(record.clone());
                stats.added += 1;
            }
        }
    }

    for pair in credentials {
        match index.get(&key(&pair.address)) {
            Some(&i) => {
                merged[i].password = Some(pair.password.clone());
                stats.passwords_set += 1;
            }
            None => stats.unmatched_credentials += 1,
        }
    }

    (merged, stats)
}

/// Drop every record whose address is in `addresses`; returns how many went
pub fn remove_records(records: &mut Vec<AliasRecord>, addresses: &[String]) -> usize {
    let doomed: std::collections::HashSet<String> = addresses.iter().map(|a| key(a)).collect();
    let before = records.len();
    records.retain(|record| !doomed.contains(&key(&record.address)));
    before - records.len()
}
