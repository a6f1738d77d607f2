//! Snapshot store backed by the local file system
//!
//! Reconciled files are written to a sibling temp file and renamed into
//! place; the report is opened in append mode. A prior file that does not
//! parse stops the merge with `SnapshotCorrupt` and is left untouched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use shared::{AliasRecord, CredentialPair};

use super::compact::{self, ReportSection};
use super::flat::{self, FlatEntry};
use super::structured;
use super::{COMPACT_FILE, FLAT_FILE, MergeSummary, STRUCTURED_FILE};
use crate::error::{AliasctlError, AliasctlResult};
use crate::traits::{SnapshotStore, SnapshotUpdate};

pub struct RealSnapshotStore {
    base_dir: PathBuf,
}

impl RealSnapshotStore {
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Directory for one domain; anything outside `[a-z0-9.-]` becomes `_`
    pub fn domain_dir(&self, domain: &str) -> PathBuf {
        let name: String = domain
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        let name = name.trim_matches('.');
        self.base_dir.join(if name.is_empty() { "default" } else { name })
    }

    pub fn structured_path(&self, domain: &str) -> PathBuf {
        self.domain_dir(domain).join(STRUCTURED_FILE)
    }

    pub fn flat_path(&self, domain: &str) -> PathBuf {
        self.domain_dir(domain).join(FLAT_FILE)
    }

    pub fn compact_path(&self, domain: &str) -> PathBuf {
        self.domain_dir(domain).join(COMPACT_FILE)
    }

    async fn read_optional(path: &Path) -> AliasctlResult<Option<String>> {
        match fs::read_to_string(path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_structured(&self, domain: &str) -> AliasctlResult<Vec<AliasRecord>> {
        let path = self.structured_path(domain);
        match Self::read_optional(&path).await? {
            Some(text) => structured::parse_structured(&text).map_err(|reason| AliasctlError::corrupt(path, reason)),
            None => Ok(Vec::new()),
        }
    }

    async fn read_flat(&self, domain: &str) -> AliasctlResult<Vec<FlatEntry>> {
        let path = self.flat_path(domain);
        match Self::read_optional(&path).await? {
            Some(text) => flat::parse_flat(&text).map_err(|reason| AliasctlError::corrupt(path, reason)),
            None => Ok(Vec::new()),
        }
    }

    /// Write via a temp file in the same directory, then rename over `path`
    async fn write_atomic(path: &Path, contents: &str) -> AliasctlResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, contents).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn append_report(&self, domain: &str, section: &ReportSection) -> AliasctlResult<()> {
        let path = self.compact_path(domain);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let existing = Self::read_optional(&path).await?.unwrap_or_default();
        let text = compact::append_text(&existing, section);

        let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for RealSnapshotStore {
    async fn load_records(&self, domain: &str) -> AliasctlResult<Vec<AliasRecord>> {
        self.read_structured(domain).await
    }

    async fn merge(&self, domain: &str, update: SnapshotUpdate) -> AliasctlResult<MergeSummary> {
        // parse both priors before writing anything
        let prior_records = self.read_structured(domain).await?;
        let prior_flat = self.read_flat(domain).await?;

        let (records, stats) = structured::merge_records(prior_records, &update.records, &update.credentials);

        let known: HashSet<String> = records.iter().map(|r| r.address.to_lowercase()).collect();
        let credentials: Vec<CredentialPair> = update
            .credentials
            .iter()
            .filter(|pair| known.contains(&pair.address.to_lowercase()))
            .cloned()
            .collect();
        let entries = flat::merge_flat(prior_flat, &update.records, &credentials);

        Self::write_atomic(&self.structured_path(domain), &structured::render_structured(domain, &records)?).await?;
        Self::write_atomic(&self.flat_path(domain), &flat::render_flat(&entries)).await?;
        if let Some(section) = &update.report {
            self.append_report(domain, section).await?;
        }

        tracing::debug!(
            "merged {} records into {} (+{} added, {} updated, {} secrets)",
            update.records.len(),
            self.domain_dir(domain).display(),
            stats.added,
            stats.updated,
            stats.passwords_set
        );

        Ok(MergeSummary {
            structured_total: records.len(),
            added: stats.added,
            updated: stats.updated,
            passwords_set: stats.passwords_set,
            flat_total: entries.len(),
            unmatched_credentials: stats.unmatched_credentials,
        })
    }

    async fn remove(&self, domain: &str, addresses: Vec<String>, report: Option<ReportSection>) -> AliasctlResult<usize> {
        let mut records = self.read_structured(domain).await?;
        let mut entries = self.read_flat(domain).await?;

        let removed = structured::remove_records(&mut records, &addresses);
        let removed_lines = flat::remove_entries(&mut entries, &addresses);

        if removed > 0 {
            Self::write_atomic(&self.structured_path(domain), &structured::render_structured(domain, &records)?)
                .await?;
        }
        if removed_lines > 0 {
            Self::write_atomic(&self.flat_path(domain), &flat::render_flat(&entries)).await?;
        }
        if let Some(section) = &report {
            self.append_report(domain, section).await?;
        }
        Ok(removed.max(removed_lines))
    }

    async fn convert_to_flat(&self, domain: &str) -> AliasctlResult<usize> {
        let records = self.read_structured(domain).await?;
        let prior = self.read_flat(domain).await?;

        // recorded secrets are carried over as credentials
        let credentials: Vec<CredentialPair> = records
            .iter()
            .filter(|r| r.is_success())
            .filter_map(|r| r.password.as_ref().map(|p| CredentialPair::new(r.address.clone(), p.clone())))
            .collect();
        let entries = flat::merge_flat(prior, &records, &credentials);
        Self::write_atomic(&self.flat_path(domain), &flat::render_flat(&entries)).await?;
        Ok(entries.len())
    }
}
