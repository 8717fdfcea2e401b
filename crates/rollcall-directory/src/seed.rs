//! JSON seed loading for [`InMemoryDirectory`].
//!
//! A seed is a directory export of the form:
//!
//! ```json
//! {
//!   "entries": [
//!     { "token": "qr_011", "kind": "student", "entity_id": 11 },
//!     { "token": "nfc_042", "kind": "teacher", "entity_id": 42, "status": "revoked" }
//!   ]
//! }
//! ```
//!
//! `status` defaults to `active`. Tokens are validated like scanned tokens
//! and must be unique within a seed.

use crate::error::{DirectoryError, DirectoryResult};
use crate::memory::InMemoryDirectory;
use rollcall_core::{CredentialStatus, DirectoryEntry, EntityId, EntityKind, Token};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// One credential in a seed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRecord {
    pub token: String,
    pub kind: EntityKind,
    pub entity_id: u64,
    #[serde(default = "default_status")]
    pub status: CredentialStatus,
}

fn default_status() -> CredentialStatus {
    CredentialStatus::Active
}

impl SeedRecord {
    fn into_entry(self, index: usize) -> DirectoryResult<DirectoryEntry> {
        let token = Token::new(&self.token).map_err(|e| DirectoryError::InvalidSeed {
            index,
            reason: e.to_string(),
        })?;

        let entry = DirectoryEntry::active(token, self.kind, EntityId::new(self.entity_id));
        Ok(match self.status {
            CredentialStatus::Active => entry,
            CredentialStatus::Revoked => entry.revoked(),
        })
    }
}

/// Top-level seed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub entries: Vec<SeedRecord>,
}

impl SeedFile {
    /// Parse a seed document.
    pub fn from_json(json: &str) -> DirectoryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate every record and convert it into a directory entry.
    ///
    /// # Errors
    ///
    /// - `InvalidSeed` if a token fails validation
    /// - `DuplicateToken` if two records share a token
    pub fn into_entries(self) -> DirectoryResult<Vec<DirectoryEntry>> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        let mut entries = Vec::with_capacity(self.entries.len());

        for (index, record) in self.entries.into_iter().enumerate() {
            let entry = record.into_entry(index)?;
            if !seen.insert(entry.token.clone()) {
                return Err(DirectoryError::DuplicateToken(entry.token.to_string()));
            }
            entries.push(entry);
        }

        Ok(entries)
    }
}

impl InMemoryDirectory {
    /// Build a directory from a JSON seed document.
    pub fn from_json_str(json: &str) -> DirectoryResult<Self> {
        let entries = SeedFile::from_json(json)?.into_entries()?;
        Ok(Self::from_entries(entries))
    }

    /// Build a directory from a JSON seed file.
    pub async fn from_json_file(path: impl AsRef<Path>) -> DirectoryResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let directory = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            entries = directory.len(),
            "Directory seeded from file"
        );
        Ok(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SEED: &str = r#"{
        "entries": [
            { "token": "qr_011", "kind": "student", "entity_id": 11 },
            { "token": "nfc_042", "kind": "teacher", "entity_id": 42, "status": "revoked" }
        ]
    }"#;

    #[test]
    fn test_seed_parses_with_default_status() {
        let directory = InMemoryDirectory::from_json_str(SEED).unwrap();
        assert_eq!(directory.len(), 2);

        let student = directory.get(&Token::new("qr_011").unwrap()).unwrap();
        assert!(student.is_active());
        assert_eq!(student.kind, EntityKind::Student);

        let teacher = directory.get(&Token::new("nfc_042").unwrap()).unwrap();
        assert_eq!(teacher.status, CredentialStatus::Revoked);
    }

    #[test]
    fn test_empty_seed() {
        let directory = InMemoryDirectory::from_json_str("{}").unwrap();
        assert!(directory.is_empty());
    }

    #[rstest]
    #[case(r#"{"entries":[{"token":"   ","kind":"student","entity_id":1}]}"#)]
    #[case(r#"{"entries":[{"token":"qr_1","kind":"janitor","entity_id":1}]}"#)]
    #[case(r#"{"entries":[{"token":"qr_1","kind":"student","entity_id":1},{"token":"qr_1","kind":"teacher","entity_id":2}]}"#)]
    #[case("not json")]
    fn test_invalid_seed_rejected(#[case] json: &str) {
        assert!(InMemoryDirectory::from_json_str(json).is_err());
    }

    #[test]
    fn test_duplicate_token_error() {
        let json = r#"{"entries":[
            {"token":"qr_1","kind":"student","entity_id":1},
            {"token":" qr_1 ","kind":"student","entity_id":2}
        ]}"#;
        assert!(matches!(
            InMemoryDirectory::from_json_str(json),
            Err(DirectoryError::DuplicateToken(token)) if token == "qr_1"
        ));
    }

    #[test]
    fn test_invalid_token_reports_index() {
        let json = r#"{"entries":[
            {"token":"qr_1","kind":"student","entity_id":1},
            {"token":"","kind":"student","entity_id":2}
        ]}"#;
        assert!(matches!(
            InMemoryDirectory::from_json_str(json),
            Err(DirectoryError::InvalidSeed { index: 1, .. })
        ));
    }
}
