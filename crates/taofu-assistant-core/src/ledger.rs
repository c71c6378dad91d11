//! Reply ledger
//!
//! The set of mention ids that reached a terminal outcome (skipped as a
//! non-question, or replied to). It is the only thing that stops the bot from
//! answering the same mention twice across restarts.
//!
//! [`FileLedgerStore`] keeps the ledger as a JSON Lines journal: single ids
//! are appended, full snapshots are written to a temp file and renamed over
//! the journal.

use async_trait::async_trait;
use std::collections::HashSet;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

/// Errors that can occur while loading or persisting the ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization or deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Store refused the write
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Set of handled mention ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyLedger {
    handled: HashSet<String>,
}

impl ReplyLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` was already handled
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.handled.contains(id)
    }

    /// Mark `id` as handled. Returns `false` if it already was.
    pub fn mark_handled(&mut self, id: impl Into<String>) -> bool {
        self.handled.insert(id.into())
    }

    /// Number of handled ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.handled.len()
    }

    /// Whether no id was handled yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handled.is_empty()
    }

    /// Iterate over handled ids in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.handled.iter().map(String::as_str)
    }

    fn sorted_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.iter().collect();
        ids.sort_unstable();
        ids
    }
}

impl<S: Into<String>> FromIterator<S> for ReplyLedger {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            handled: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Durable storage for the reply ledger
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the persisted ledger; a store that was never written loads empty
    async fn load(&self) -> Result<ReplyLedger, LedgerError>;

    /// Persist the whole ledger atomically
    async fn save(&self, ledger: &ReplyLedger) -> Result<(), LedgerError>;

    /// Durably add `id`, which is already present in `ledger`
    async fn record(&self, _id: &str, ledger: &ReplyLedger) -> Result<(), LedgerError> {
        self.save(ledger).await
    }
}

/// JSON Lines journal on the local filesystem
#[derive(Debug, Clone)]
pub struct FileLedgerStore {
    path: PathBuf,
}

impl FileLedgerStore {
    /// Store backed by the journal at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Journal location
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn ensure_parent_dir(&self) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}

/// Parse journal contents. Older deployments stored a single JSON array.
fn parse_journal(content: &str, path: &Path) -> ReplyLedger {
    if content.trim_start().starts_with('[') {
        return parse_legacy_array(content, path);
    }

    let mut ledger = ReplyLedger::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(line)
            .ok()
            .as_ref()
            .and_then(id_from_value)
        {
            Some(id) => {
                ledger.mark_handled(id);
            }
            // A crash mid-append leaves a torn last line.
            None => warn!(
                path = %path.display(),
                line = line_no + 1,
                "Skipping unreadable ledger line"
            ),
        }
    }
    ledger
}

/// Legacy arrays were rewritten in place, so a crash could cut one short.
/// A damaged array keeps every element that still parses; without the
/// closing bracket the last element may be cut mid-value and is dropped.
fn parse_legacy_array(content: &str, path: &Path) -> ReplyLedger {
    if let Ok(ids) = serde_json::from_str::<Vec<serde_json::Value>>(content) {
        return ids.iter().filter_map(id_from_value).collect();
    }

    let body = content.trim().trim_start_matches('[');
    let (body, closed) = match body.strip_suffix(']') {
        Some(inner) => (inner, true),
        None => (body, false),
    };
    let mut elements: Vec<&str> = body.split(',').collect();
    if !closed {
        elements.pop();
    }

    let ledger: ReplyLedger = elements
        .iter()
        .filter_map(|e| serde_json::from_str::<serde_json::Value>(e.trim()).ok())
        .filter_map(|v| id_from_value(&v))
        .collect();
    warn!(
        path = %path.display(),
        salvaged = ledger.len(),
        "Legacy ledger array is damaged, keeping the ids that parse"
    );
    ledger
}

/// Ids may be numbers in legacy files.
fn id_from_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn journal_line(id: &str) -> Result<String, LedgerError> {
    Ok(format!("{}\n", serde_json::to_string(id)?))
}

#[async_trait]
impl LedgerStore for FileLedgerStore {
    async fn load(&self) -> Result<ReplyLedger, LedgerError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let ledger = parse_journal(&content, &self.path);
                debug!(path = %self.path.display(), ids = ledger.len(), "Ledger loaded");
                Ok(ledger)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ReplyLedger::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, ledger: &ReplyLedger) -> Result<(), LedgerError> {
        self.ensure_parent_dir().await?;

        let mut body = String::new();
        for id in ledger.sorted_ids() {
            body.push_str(&journal_line(id)?);
        }

        let temp_path = self.temp_path();
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(body.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp_path, &self.path).await?;
        debug!(path = %self.path.display(), ids = ledger.len(), "Ledger snapshot written");
        Ok(())
    }

    async fn record(&self, id: &str, ledger: &ReplyLedger) -> Result<(), LedgerError> {
        let mut line = journal_line(id)?;
        match inspect_journal(&self.path).await? {
            // A legacy array cannot be appended to; rewrite it as a journal.
            JournalState::LegacyArray => return self.save(ledger).await,
            JournalState::TornTail => {
                warn!(path = %self.path.display(), "Ledger ends mid-line, starting a new line");
                line.insert(0, '\n');
            }
            JournalState::Missing | JournalState::Clean => {}
        }

        self.ensure_parent_dir().await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await?;
        Ok(())
    }
}

/// What an append has to deal with at the end of the journal
#[derive(Debug, PartialEq, Eq)]
enum JournalState {
    Missing,
    LegacyArray,
    Clean,
    TornTail,
}

async fn inspect_journal(path: &Path) -> Result<JournalState, LedgerError> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(JournalState::Missing),
        Err(e) => return Err(e.into()),
    };

    let mut head = [0u8; 64];
    let read = file.read(&mut head).await?;
    if head[..read]
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'[')
    {
        return Ok(JournalState::LegacyArray);
    }

    if file.metadata().await?.len() == 0 {
        return Ok(JournalState::Clean);
    }
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(if last[0] == b'\n' {
        JournalState::Clean
    } else {
        JournalState::TornTail
    })
}

/// Process-local ledger store
///
/// Useful for dry runs and tests; saves can be made to fail on demand.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    persisted: Mutex<ReplyLedger>,
    fail_writes: AtomicBool,
}

impl InMemoryLedgerStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds `ledger`
    #[must_use]
    pub fn with_ledger(ledger: ReplyLedger) -> Self {
        Self {
            persisted: Mutex::new(ledger),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of what was persisted so far
    #[must_use]
    pub fn persisted(&self) -> ReplyLedger {
        self.persisted
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn load(&self) -> Result<ReplyLedger, LedgerError> {
        self.persisted
            .lock()
            .map(|guard| guard.clone())
            .map_err(|e| LedgerError::Unavailable(e.to_string()))
    }

    async fn save(&self, ledger: &ReplyLedger) -> Result<(), LedgerError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("writes disabled".to_string()));
        }
        let mut guard = self
            .persisted
            .lock()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        *guard = ledger.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mark_handled_is_idempotent() {
        let mut ledger = ReplyLedger::new();
        assert!(ledger.mark_handled("a"));
        assert!(!ledger.mark_handled("a"));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains("a"));
        assert!(!ledger.contains("b"));
    }

    #[tokio::test]
    async fn test_file_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let store = FileLedgerStore::new(dir.path().join("ledger.jsonl"));
        let ledger = ReplyLedger::from_iter(["a", "b"]);

        store.save(&ledger).await?;
        assert_eq!(store.load().await?, ledger);
        assert!(!store.temp_path().exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() -> Result<(), LedgerError> {
        let store = FileLedgerStore::new("/nonexistent/dir/ledger.jsonl");
        assert!(store.load().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_record_appends_and_creates_dirs() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let store = FileLedgerStore::new(dir.path().join("nested/data/ledger.jsonl"));

        let mut ledger = ReplyLedger::new();
        ledger.mark_handled("1");
        store.record("1", &ledger).await?;
        ledger.mark_handled("2");
        store.record("2", &ledger).await?;

        let content = tokio::fs::read_to_string(store.path()).await?;
        assert_eq!(content, "\"1\"\n\"2\"\n");
        assert_eq!(store.load().await?, ledger);
        Ok(())
    }

    #[tokio::test]
    async fn test_torn_last_line_is_skipped() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join("ledger.jsonl");
        tokio::fs::write(&path, "\"a\"\n\"b\"\n\"c").await?;

        let ledger = FileLedgerStore::new(&path).load().await?;
        assert_eq!(ledger, ReplyLedger::from_iter(["a", "b"]));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_after_torn_line_survives_reload() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join("ledger.jsonl");
        tokio::fs::write(&path, "\"a\"\n\"b\"\n\"c").await?;

        let store = FileLedgerStore::new(&path);
        let mut ledger = store.load().await?;
        assert_eq!(inspect_journal(&path).await?, JournalState::TornTail);

        ledger.mark_handled("t9");
        store.record("t9", &ledger).await?;

        let reloaded = store.load().await?;
        assert!(reloaded.contains("t9"));
        assert_eq!(reloaded, ReplyLedger::from_iter(["a", "b", "t9"]));
        assert_eq!(inspect_journal(&path).await?, JournalState::Clean);
        Ok(())
    }

    #[tokio::test]
    async fn test_torn_legacy_array_keeps_complete_ids() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join("replied_tweets.json");
        tokio::fs::write(&path, "[1790000000000000001, 17900000").await?;

        let store = FileLedgerStore::new(&path);
        let mut ledger = store.load().await?;
        assert_eq!(ledger, ReplyLedger::from_iter(["1790000000000000001"]));

        // The next write replaces the damaged array with a clean journal.
        ledger.mark_handled("t1");
        store.record("t1", &ledger).await?;
        assert_eq!(store.load().await?, ledger);
        assert!(!tokio::fs::read_to_string(&path).await?.starts_with('['));
        Ok(())
    }

    #[test]
    fn test_closed_but_damaged_legacy_array_keeps_last_id() {
        let ledger = parse_legacy_array("[\"a\", oops, \"b\"]", Path::new("ledger.json"));
        assert_eq!(ledger, ReplyLedger::from_iter(["a", "b"]));
    }

    #[tokio::test]
    async fn test_legacy_array_is_read_and_migrated() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join("replied_tweets.json");
        tokio::fs::write(&path, "[1790000000000000001, \"abc\"]").await?;

        let store = FileLedgerStore::new(&path);
        let mut ledger = store.load().await?;
        assert!(ledger.contains("1790000000000000001"));
        assert!(ledger.contains("abc"));

        ledger.mark_handled("new");
        store.record("new", &ledger).await?;

        let content = tokio::fs::read_to_string(&path).await?;
        assert!(!content.starts_with('['));
        assert_eq!(store.load().await?, ledger);
        Ok(())
    }

    #[tokio::test]
    async fn test_in_memory_store_failures() -> Result<(), LedgerError> {
        let store = InMemoryLedgerStore::new();
        let ledger = ReplyLedger::from_iter(["x"]);

        store.set_fail_writes(true);
        assert!(store.save(&ledger).await.is_err());
        assert!(store.record("x", &ledger).await.is_err());
        assert!(store.load().await?.is_empty());

        store.set_fail_writes(false);
        store.record("x", &ledger).await?;
        assert_eq!(store.persisted(), ledger);
        Ok(())
    }
}
