//! Cookie-jar persistence — named JSON documents with an expiry.
//!
//! Mirrors the browser-cookie contract of the web client: each logical
//! document (`userOffers`, `userConversations`) is one JSON file wrapped in
//! an envelope carrying its expiry. Reads never fail: absent, expired or
//! corrupt documents read back as `None`.
//!
//! Storage file: `{store_dir}/{name}.json`

pub mod conversations;
pub mod user_offers;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::COOKIE_TTL_DAYS;
use crate::error::MarketResult;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    expires_at: DateTime<Utc>,
    value: T,
}

/// File-backed cookie store.
#[derive(Debug, Clone)]
pub struct CookieJar {
    dir: PathBuf,
}

impl CookieJar {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Read a document, or `None` when absent, expired or unparseable.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.document_path(name);
        let content = std::fs::read_to_string(&path).ok()?;
        let envelope: Envelope<T> = match serde_json::from_str(&content) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(name, error = %e, "Corrupt cookie document — treating as absent");
                return None;
            }
        };
        if envelope.expires_at <= Utc::now() {
            tracing::debug!(name, "Cookie document expired");
            return None;
        }
        Some(envelope.value)
    }

    /// Write a document with the default 30-day expiry.
    pub fn set<T: Serialize>(&self, name: &str, value: &T) -> MarketResult<()> {
        self.set_with_ttl(name, value, COOKIE_TTL_DAYS)
    }

    /// Write a document expiring `days` from now.
    pub fn set_with_ttl<T: Serialize>(&self, name: &str, value: &T, days: i64) -> MarketResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let envelope = Envelope {
            expires_at: Utc::now() + Duration::days(days),
            value,
        };
        let json = serde_json::to_string_pretty(&envelope)?;
        std::fs::write(self.document_path(name), json)?;
        Ok(())
    }

    /// Delete a document. Missing files are not an error.
    pub fn remove(&self, name: &str) -> MarketResult<()> {
        match std::fs::remove_file(self.document_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar() -> (tempfile::TempDir, CookieJar) {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::new(dir.path());
        (dir, jar)
    }

    #[test]
    fn test_roundtrip() {
        let (_dir, jar) = jar();
        jar.set("doc", &vec!["a".to_string(), "b".to_string()]).unwrap();
        let value: Vec<String> = jar.get("doc").unwrap();
        assert_eq!(value, vec!["a", "b"]);
    }

    #[test]
    fn test_absent_document_is_none() {
        let (_dir, jar) = jar();
        assert!(jar.get::<Vec<String>>("missing").is_none());
    }

    #[test]
    fn test_corrupt_document_is_none() {
        let (_dir, jar) = jar();
        std::fs::create_dir_all(jar.dir()).unwrap();
        std::fs::write(jar.dir().join("doc.json"), "not json {{{").unwrap();
        assert!(jar.get::<Vec<String>>("doc").is_none());
    }

    #[test]
    fn test_expired_document_is_none() {
        let (_dir, jar) = jar();
        jar.set_with_ttl("doc", &"value".to_string(), -1).unwrap();
        assert!(jar.get::<String>("doc").is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_dir, jar) = jar();
        jar.set("doc", &"value".to_string()).unwrap();
        jar.remove("doc").unwrap();
        jar.remove("doc").unwrap();
        assert!(jar.get::<String>("doc").is_none());
    }
}
