//! Corpus sync progress reporting.
//!
//! Reports what the loader is doing during `folio sync` (and at startup of
//! every other command) so users see which repository is being synced and how
//! many are left. Progress goes to **stderr** so stdout remains parseable.

use std::io::Write;

/// A single progress event.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncProgressEvent {
    /// Querying the discovery source. Total unknown.
    Discovering { owner: String, topic: String },
    /// Discovery failed; reading whatever is already in the clone directory.
    FallingBack { reason: String },
    /// Repository `n` of `total` is being cloned or pulled.
    Syncing { repo: String, n: u64, total: u64 },
    /// A cached checkout that was not synced this run (no longer tagged, or
    /// its sync failed). It is left on disk.
    Stale { repo: String },
    /// Documents are being chunked and embedded.
    Indexing { documents: u64 },
}

/// Reports sync progress. Implementations write to stderr (human or JSON).
pub trait SyncProgressReporter: Send + Sync {
    fn report(&self, event: SyncProgressEvent);
}

/// Human-friendly progress on stderr: "sync  rocket  2 / 7 repos".
pub struct StderrProgress;

impl SyncProgressReporter for StderrProgress {
    fn report(&self, event: SyncProgressEvent) {
        let line = match &event {
            SyncProgressEvent::Discovering { owner, topic } => {
                format!("sync  discovering {}'s repos tagged '{}'...\n", owner, topic)
            }
            SyncProgressEvent::FallingBack { reason } => {
                format!("sync  discovery failed ({}), using local cache\n", reason)
            }
            SyncProgressEvent::Syncing { repo, n, total } => format!(
                "sync  {}  {} / {} repos\n",
                repo,
                format_number(*n),
                format_number(*total)
            ),
            SyncProgressEvent::Stale { repo } => {
                format!("sync  {}  not synced this run, kept in cache\n", repo)
            }
            SyncProgressEvent::Indexing { documents } => {
                format!("index  embedding {} documents\n", format_number(*documents))
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl JsonProgress {
    fn to_json(event: &SyncProgressEvent) -> serde_json::Value {
        match event {
            SyncProgressEvent::Discovering { owner, topic } => serde_json::json!({
                "event": "progress",
                "phase": "discovering",
                "owner": owner,
                "topic": topic
            }),
            SyncProgressEvent::FallingBack { reason } => serde_json::json!({
                "event": "progress",
                "phase": "fallback",
                "reason": reason
            }),
            SyncProgressEvent::Syncing { repo, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "syncing",
                "repo": repo,
                "n": n,
                "total": total
            }),
            SyncProgressEvent::Stale { repo } => serde_json::json!({
                "event": "progress",
                "phase": "stale",
                "repo": repo
            }),
            SyncProgressEvent::Indexing { documents } => serde_json::json!({
                "event": "progress",
                "phase": "indexing",
                "documents": documents
            }),
        }
    }
}

impl SyncProgressReporter for JsonProgress {
    fn report(&self, event: SyncProgressEvent) {
        if let Ok(line) = serde_json::to_string(&Self::to_json(&event)) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl SyncProgressReporter for NoProgress {
    fn report(&self, _event: SyncProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn SyncProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
