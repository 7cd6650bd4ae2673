//! Password entries kept inside a vault
//!
//! An entry vault's plaintext is a JSON document holding a list of entries.
//! Entries and their password history are wiped from memory when dropped.
//! Turning an `EntryStore` into bytes and back is all this module does with
//! the vault; sealing goes through [`crate::record::VaultRecord`].

use crate::error::{ErrorCategory, ErrorKind, PasslockError, Result};
use crate::random;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Previous passwords remembered per entry.
pub const HISTORY_LIMIT: usize = 5;

const ID_BYTES: usize = 16;

/// A password an entry used before it was changed.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PasswordHistory {
    pub password: String,
    pub changed_at: u64,
}

#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Oldest first, at most [`HISTORY_LIMIT`] long.
    #[serde(default)]
    pub history: Vec<PasswordHistory>,
    pub created_at: u64,
    pub modified_at: u64,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("url", &self.url)
            .field("tags", &self.tags)
            .field("history_len", &self.history.len())
            .finish()
    }
}

/// Fields of a new entry.
#[derive(Default)]
pub struct EntryFields {
    pub name: String,
    pub username: String,
    pub password: Zeroizing<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

/// Changes to an existing entry; `None` leaves a field as it is. An empty
/// url or notes value clears that field.
#[derive(Default)]
pub struct EntryChanges {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<Zeroizing<String>>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EntryStore {
    entries: Vec<Entry>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the plaintext of an entry vault.
    pub fn from_json(plaintext: &[u8]) -> Result<Self> {
        serde_json::from_slice(plaintext).map_err(|e| {
            PasslockError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::EntryFormat,
                "vault does not hold password entries",
                e,
            )
        })
    }

    /// Serialize into vault plaintext. The bytes are wiped when dropped.
    pub fn to_json(&self) -> Result<Zeroizing<Vec<u8>>> {
        serde_json::to_vec(self).map(Zeroizing::new).map_err(|e| {
            PasslockError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::EntryFormat,
                "failed to serialize entries",
                e,
            )
        })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a new entry. Name, username and password are required.
    ///
    /// Requires [`crate::init`] to have run (the id is random).
    pub fn add(&mut self, mut fields: EntryFields) -> Result<&Entry> {
        require(&fields.name, &fields.username, &fields.password)?;

        let now = now();
        let entry = Entry {
            id: new_id()?,
            name: fields.name,
            username: fields.username,
            password: std::mem::take(&mut *fields.password),
            url: non_blank(fields.url),
            notes: non_blank(fields.notes),
            tags: normalize_tags(fields.tags),
            history: Vec::new(),
            created_at: now,
            modified_at: now,
        };

        let index = self.entries.len();
        self.entries.push(entry);
        Ok(&self.entries[index])
    }

    /// Look up an entry by id, or by name if exactly one entry has it.
    pub fn get(&self, selector: &str) -> Result<&Entry> {
        let index = self.position(selector)?;
        Ok(&self.entries[index])
    }

    /// Apply `changes` to the selected entry. A changed password pushes the
    /// previous one onto the entry's history.
    pub fn edit(&mut self, selector: &str, mut changes: EntryChanges) -> Result<&Entry> {
        let index = self.position(selector)?;
        let current = &self.entries[index];
        require(
            changes.name.as_deref().unwrap_or(&current.name),
            changes.username.as_deref().unwrap_or(&current.username),
            changes
                .password
                .as_deref()
                .map(String::as_str)
                .unwrap_or(&current.password),
        )?;

        let now = now();
        let entry = &mut self.entries[index];
        if let Some(name) = changes.name.take() {
            entry.name = name;
        }
        if let Some(username) = changes.username.take() {
            entry.username = username;
        }
        if let Some(mut password) = changes.password.take() {
            if *password != entry.password {
                let previous =
                    std::mem::replace(&mut entry.password, std::mem::take(&mut *password));
                if entry.history.len() >= HISTORY_LIMIT {
                    entry.history.remove(0);
                }
                entry.history.push(PasswordHistory {
                    password: previous,
                    changed_at: now,
                });
            }
        }
        if let Some(url) = changes.url.take() {
            entry.url = non_blank(Some(url));
        }
        if let Some(notes) = changes.notes.take() {
            entry.notes = non_blank(Some(notes));
        }
        if let Some(tags) = changes.tags.take() {
            entry.tags = normalize_tags(tags);
        }
        entry.modified_at = now;

        Ok(&self.entries[index])
    }

    /// Remove the selected entry and return it.
    pub fn remove(&mut self, selector: &str) -> Result<Entry> {
        let index = self.position(selector)?;
        Ok(self.entries.remove(index))
    }

    /// Entries whose name, username, url or tags contain `query`, ignoring
    /// case. An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                query.is_empty()
                    || e.name.to_lowercase().contains(&query)
                    || e.username.to_lowercase().contains(&query)
                    || e.url
                        .as_ref()
                        .is_some_and(|u| u.to_lowercase().contains(&query))
                    || e.tags.iter().any(|t| t.contains(&query))
            })
            .collect()
    }

    pub fn with_tag(&self, tag: &str) -> Vec<&Entry> {
        let tag = tag.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.tags.contains(&tag))
            .collect()
    }

    /// Every tag in use with its number of entries, most used first.
    pub fn tag_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for tag in self.entries.iter().flat_map(|e| e.tags.iter()) {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(tag, count)| (tag.to_owned(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    fn position(&self, selector: &str) -> Result<usize> {
        if let Some(index) = self.entries.iter().position(|e| e.id == selector) {
            return Ok(index);
        }

        let name = selector.to_lowercase();
        let mut matches = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.name.to_lowercase() == name)
            .map(|(index, _)| index);

        match (matches.next(), matches.next()) {
            (Some(index), None) => Ok(index),
            (Some(_), Some(_)) => Err(PasslockError::invalid_input(format!(
                "more than one entry is named '{}', select it by id",
                selector
            ))),
            (None, _) => Err(PasslockError::with_kind(
                ErrorCategory::User,
                ErrorKind::EntryNotFound,
                format!("no entry with id or name '{}'", selector),
            )),
        }
    }
}

fn require(name: &str, username: &str, password: &str) -> Result<()> {
    if name.is_empty() || username.is_empty() || password.is_empty() {
        return Err(PasslockError::invalid_input(
            "name, username and password are required",
        ));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

fn new_id() -> Result<String> {
    let mut bytes = [0u8; ID_BYTES];
    random::random_bytes(&mut bytes)?;
    Ok(bytes.iter().map(|b| format!("{:02x}", b)).collect())
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, username: &str, password: &str) -> EntryFields {
        EntryFields {
            name: name.to_owned(),
            username: username.to_owned(),
            password: Zeroizing::new(password.to_owned()),
            ..Default::default()
        }
    }

    fn sample_store() -> EntryStore {
        crate::init().unwrap();
        let mut store = EntryStore::new();
        store
            .add(EntryFields {
                url: Some("https://mail.example.com".to_owned()),
                tags: vec!["Work".to_owned(), " email ".to_owned(), "work".to_owned()],
                ..fields("Mail", "alice", "hunter2")
            })
            .unwrap();
        store
            .add(EntryFields {
                tags: vec!["personal".to_owned()],
                ..fields("Bank", "alice@bank", "s3cret")
            })
            .unwrap();
        store
    }

    #[test]
    fn test_add_normalizes_fields() {
        let store = sample_store();
        let mail = store.get("mail").unwrap();

        assert_eq!(mail.id.len(), 2 * ID_BYTES);
        assert_eq!(mail.tags, vec!["work", "email"]);
        assert_eq!(mail.url.as_deref(), Some("https://mail.example.com"));
        assert_eq!(mail.notes, None);
        assert!(mail.history.is_empty());
        assert_eq!(mail.created_at, mail.modified_at);
    }

    #[test]
    fn test_add_requires_fields() {
        crate::init().unwrap();
        let mut store = EntryStore::new();

        for (name, username, password) in [("", "u", "p"), ("n", "", "p"), ("n", "u", "")] {
            let err = store
                .add(fields(name, username, password))
                .expect_err("expected missing field rejection");
            assert_eq!(err.kind, Some(ErrorKind::InvalidInput));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let store = sample_store();
        assert_ne!(store.entries()[0].id, store.entries()[1].id);
    }

    #[test]
    fn test_get_by_id_or_name() {
        let store = sample_store();
        let id = store.entries()[1].id.clone();

        assert_eq!(store.get(&id).unwrap().name, "Bank");
        assert_eq!(store.get("BANK").unwrap().id, id);

        let err = store.get("nothing").expect_err("expected missing entry");
        assert_eq!(err.kind, Some(ErrorKind::EntryNotFound));
    }

    #[test]
    fn test_ambiguous_name() {
        let mut store = sample_store();
        store.add(fields("mail", "bob", "pw")).unwrap();

        let err = store.get("Mail").expect_err("expected ambiguous name");
        assert_eq!(err.kind, Some(ErrorKind::InvalidInput));

        let id = store.entries()[2].id.clone();
        assert_eq!(store.get(&id).unwrap().username, "bob");
    }

    #[test]
    fn test_search() {
        let store = sample_store();

        let names = |hits: Vec<&Entry>| hits.iter().map(|e| e.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(store.search("")), vec!["Mail", "Bank"]);
        assert_eq!(names(store.search("EXAMPLE")), vec!["Mail"]);
        assert_eq!(names(store.search("alice")), vec!["Mail", "Bank"]);
        assert_eq!(names(store.search("person")), vec!["Bank"]);
        assert!(store.search("hunter2").is_empty());
    }

    #[test]
    fn test_tags() {
        let mut store = sample_store();
        store
            .add(EntryFields {
                tags: vec!["work".to_owned()],
                ..fields("VPN", "alice", "pw")
            })
            .unwrap();

        assert_eq!(store.with_tag(" WORK").len(), 2);
        assert_eq!(
            store.tag_counts(),
            vec![
                ("work".to_owned(), 2),
                ("email".to_owned(), 1),
                ("personal".to_owned(), 1)
            ]
        );
    }

    #[test]
    fn test_edit_keeps_password_history() {
        let mut store = sample_store();

        for i in 0..HISTORY_LIMIT + 2 {
            let changes = EntryChanges {
                password: Some(Zeroizing::new(format!("pw{}", i))),
                ..Default::default()
            };
            store.edit("mail", changes).unwrap();
        }

        let mail = store.get("mail").unwrap();
        assert_eq!(mail.password, format!("pw{}", HISTORY_LIMIT + 1));
        assert_eq!(mail.history.len(), HISTORY_LIMIT);
        // The original password and pw0 fell off the front.
        assert_eq!(mail.history[0].password, "pw1");
        assert_eq!(mail.history[HISTORY_LIMIT - 1].password, format!("pw{}", HISTORY_LIMIT));
    }

    #[test]
    fn test_edit_same_password_adds_no_history() {
        let mut store = sample_store();
        let changes = EntryChanges {
            password: Some(Zeroizing::new("hunter2".to_owned())),
            username: Some("alice2".to_owned()),
            url: Some(String::new()),
            ..Default::default()
        };

        let mail = store.edit("mail", changes).unwrap();
        assert!(mail.history.is_empty());
        assert_eq!(mail.username, "alice2");
        assert_eq!(mail.url, None);
    }

    #[test]
    fn test_edit_rejects_emptied_required_field() {
        let mut store = sample_store();
        let changes = EntryChanges {
            name: Some(String::new()),
            username: Some("mallory".to_owned()),
            ..Default::default()
        };

        let err = store.edit("mail", changes).expect_err("expected invalid input");
        assert_eq!(err.kind, Some(ErrorKind::InvalidInput));
        // Nothing was applied.
        assert_eq!(store.get("mail").unwrap().username, "alice");
    }

    #[test]
    fn test_remove() {
        let mut store = sample_store();

        let removed = store.remove("bank").unwrap();
        assert_eq!(removed.name, "Bank");
        assert_eq!(store.len(), 1);

        let err = store.remove("bank").expect_err("expected missing entry");
        assert_eq!(err.kind, Some(ErrorKind::EntryNotFound));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut store = sample_store();
        let changes = EntryChanges {
            password: Some(Zeroizing::new("new".to_owned())),
            ..Default::default()
        };
        store.edit("bank", changes).unwrap();

        let json = store.to_json().unwrap();
        let parsed = EntryStore::from_json(&json).unwrap();

        assert_eq!(parsed.len(), 2);
        let bank = parsed.get("bank").unwrap();
        assert_eq!(bank.password, "new");
        assert_eq!(bank.history[0].password, "s3cret");
        assert_eq!(bank.tags, vec!["personal"]);
    }

    #[test]
    fn test_from_json_rejects_other_contents() {
        for plaintext in [&b"hello vault"[..], b"", b"{\"entries\": 3}"] {
            let err = EntryStore::from_json(plaintext).expect_err("expected format error");
            assert_eq!(err.kind, Some(ErrorKind::EntryFormat));
        }
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let json = br#"{"entries":[{"id":"1","name":"n","username":"u","password":"p","created_at":1,"modified_at":2}]}"#;
        let store = EntryStore::from_json(json).unwrap();

        let entry = store.get("1").unwrap();
        assert!(entry.tags.is_empty());
        assert!(entry.history.is_empty());
        assert_eq!(entry.url, None);
    }

    #[test]
    fn test_debug_redacts_password() {
        let store = sample_store();
        let rendered = format!("{:?}", store);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
