//! Flat list (`aliases.txt`): one `address` or `address:secret` per line

use std::collections::HashMap;

use shared::{AliasRecord, CredentialPair};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    pub address: String,
    pub password: Option<String>,
}

impl FlatEntry {
    pub fn new(address: impl Into<String>, password: Option<String>) -> Self {
        Self {
            address: address.into(),
            password: password.filter(|p| !p.is_empty()),
        }
    }

    pub fn render(&self) -> String {
        match &self.password {
            Some(password) => format!("{}:{}", self.address, password),
            None => self.address.clone(),
        }
    }
}

/// Parse a flat list. Blank lines and `#` comments are skipped; any other
/// line without an `@` in its address part is an error.
pub fn parse_flat(text: &str) -> Result<Vec<FlatEntry>, String> {
    let mut entries = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // secrets never contain ':', addresses never do either
        let (address, password) = match line.split_once(':') {
            Some((address, password)) => (address.trim(), Some(password.to_string())),
            None => (line, None),
        };
        if !address.contains('@') || address.contains(char::is_whitespace) {
            return Err(format!("line {}: '{}' is not an address", number + 1, address));
        }
        entries.push(FlatEntry::new(address, password));
    }
    Ok(entries)
}

pub fn render_flat(entries: &[FlatEntry]) -> String {
    let mut text = String::new();
    for entry in entries {
        text.push_str(&entry.render());
        text.push('\n');
    }
    text
}

/// Union of prior lines, successful records and credentials, keyed by address.
///
/// Prior order is kept and new addresses are appended in batch order. A
/// credential overwrites the secret on its line (adding the line if it is
/// missing); lines without a new credential keep whatever they had.
pub fn merge_flat(prior: Vec<FlatEntry>, records: &[AliasRecord], credentials: &[CredentialPair]) -> Vec<FlatEntry> {
    let mut merged = prior;
    let mut index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry.address.to_lowercase(), i))
        .collect();

    for record in records.iter().filter(|r| r.is_success()) {
        let key = record.address.to_lowercase();
        match index.get(&key) {
            Some(&i) => {
                if merged[i].password.is_none() && record.has_password() {
                    merged[i].password = record.password.clone();
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(FlatEntry::new(record.address.clone(), record.password.clone()));
            }
        }
    }

    for pair in credentials {
        let key = pair.address.to_lowercase();
        match index.get(&key) {
            Some(&i) => merged[i].password = Some(pair.password.clone()),
            None => {
                index.insert(key, merged.len());
                merged.push(FlatEntry::new(pair.address.clone(), Some(pair.password.clone())));
            }
        }
    }

    merged
}

pub fn remove_entries(entries: &mut Vec<FlatEntry>, addresses: &[String]) -> usize {
    let doomed: std::collections::HashSet<String> = addresses.iter().map(|a| a.to_lowercase()).collect();
    let before = entries.len();
    entries.retain(|entry| !doomed.contains(&entry.address.to_lowercase()));
    before - entries.len()
}
