//! Corpus loader: discover, sync, and read one document per repository.
//!
//! # Workflow
//!
//! 1. Ask [`RepoDiscovery`] for the owner's clone URLs tagged with the topic.
//! 2. For each URL, derive the local directory (`<clone_dir>/<repo name>`)
//!    and clone or pull it through [`RepoSync`].
//! 3. Read `<dir>/<document_file>` into a [`Document`] named after the
//!    directory, with the clone URL as its source.
//!
//! Failures are contained. A repository that fails to sync or has no
//! document file is skipped. A failed discovery falls back to whatever is
//! already in the clone directory. Only invalid input (empty owner or topic)
//! or an unusable clone directory is an error.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use folio_core::models::{Corpus, Document};

use crate::config::CorpusConfig;
use crate::connector_git::{repo_name_from_url, RepoSync};
use crate::discovery::RepoDiscovery;
use crate::progress::{SyncProgressEvent, SyncProgressReporter};

/// Build the corpus for `owner` from the repositories tagged `config.topic`.
pub async fn load_corpus(
    owner: &str,
    config: &CorpusConfig,
    discovery: &dyn RepoDiscovery,
    sync: &dyn RepoSync,
    progress: &dyn SyncProgressReporter,
) -> Result<Corpus> {
    let owner = owner.trim();
    let topic = config.topic.trim();
    if owner.is_empty() {
        bail!("owner identity must not be empty");
    }
    if topic.is_empty() {
        bail!("topic must not be empty");
    }

    std::fs::create_dir_all(&config.clone_dir).with_context(|| {
        format!(
            "Failed to create clone directory: {}",
            config.clone_dir.display()
        )
    })?;

    info!(owner, topic, "fetching portfolio repositories");
    progress.report(SyncProgressEvent::Discovering {
        owner: owner.to_string(),
        topic: topic.to_string(),
    });

    let urls = match discovery.discover(owner, topic).await {
        Ok(urls) => urls,
        Err(e) => {
            warn!(error = %e, "repository discovery failed, falling back to local cache");
            progress.report(SyncProgressEvent::FallingBack {
                reason: e.to_string(),
            });
            let corpus = load_local_cache(config, sync)?;
            log_loaded(&corpus);
            return Ok(corpus);
        }
    };

    if urls.is_empty() {
        warn!(topic, "no repositories found with this topic");
    } else {
        info!(count = urls.len(), "found portfolio repositories");
    }

    let mut corpus = Corpus::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut synced: HashSet<String> = HashSet::new();
    let total = urls.len() as u64;

    for (i, url) in urls.iter().enumerate() {
        let Some(name) = repo_name_from_url(url) else {
            warn!(url = %url, "cannot derive a directory name from clone URL, skipping");
            continue;
        };
        if !seen.insert(name.clone()) {
            warn!(url = %url, name = %name, "duplicate repository name, keeping the first");
            continue;
        }

        progress.report(SyncProgressEvent::Syncing {
            repo: name.clone(),
            n: i as u64 + 1,
            total,
        });

        let dir = config.clone_dir.join(&name);
        if let Err(e) = sync.sync(url, &dir) {
            warn!(url = %url, error = %e, "failed to sync repository, skipping");
            continue;
        }
        synced.insert(name.clone());

        match read_document(&dir, &config.document_file) {
            Ok(Some(content)) => {
                corpus.push(Document::new(name, url.clone(), content));
            }
            Ok(None) => {
                warn!(repo = %name, file = %config.document_file, "document file not found, skipping");
            }
            Err(e) => {
                warn!(repo = %name, error = %e, "failed to read document file, skipping");
            }
        }
    }

    for stale in stale_dirs(&config.clone_dir, &synced)? {
        info!(repo = %stale, "local repo not synced this run, still in cache");
        progress.report(SyncProgressEvent::Stale { repo: stale });
    }

    log_loaded(&corpus);
    Ok(corpus)
}

/// Every directory under the clone directory that holds the document file,
/// sorted by name.
pub fn load_local_cache(config: &CorpusConfig, sync: &dyn RepoSync) -> Result<Corpus> {
    let mut corpus = Corpus::new();
    if !config.clone_dir.exists() {
        return Ok(corpus);
    }

    let mut dirs: Vec<(String, std::path::PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(&config.clone_dir).with_context(|| {
        format!(
            "Failed to read clone directory: {}",
            config.clone_dir.display()
        )
    })? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().to_string(), entry.path()));
        }
    }
    dirs.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, dir) in dirs {
        match read_document(&dir, &config.document_file) {
            Ok(Some(content)) => {
                let source = sync
                    .remote_url(&dir)
                    .unwrap_or_else(|| dir.display().to_string());
                corpus.push(Document::new(name, source, content));
            }
            Ok(None) => {}
            Err(e) => warn!(repo = %name, error = %e, "failed to read cached document, skipping"),
        }
    }

    Ok(corpus)
}

fn read_document(dir: &Path, file: &str) -> Result<Option<String>> {
    let path = dir.join(file);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Some(content))
}

fn stale_dirs(clone_dir: &Path, current: &HashSet<String>) -> Result<Vec<String>> {
    let mut stale = Vec::new();
    for entry in std::fs::read_dir(clone_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !current.contains(&name) {
            stale.push(name);
        }
    }
    stale.sort();
    Ok(stale)
}

fn log_loaded(corpus: &Corpus) {
    info!(
        documents = corpus.len(),
        fingerprint = %corpus.fingerprint(),
        "corpus loaded"
    );
}
