//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use folio::config::Config;
use folio::connector_git::RepoSync;
use folio::discovery::RepoDiscovery;
use folio::progress::{SyncProgressEvent, SyncProgressReporter};
use folio::folio_core::embedding::EmbeddingProvider;
use folio::folio_core::models::{Message, Role, ToolCall};
use folio::folio_core::router::ReasoningModel;
use folio::folio_core::tools::ToolDescriptor;

// ============ Config ============

/// A valid configuration rooted at `clone_dir`.
pub fn test_config(clone_dir: &Path) -> Config {
    let mut config = Config::default();
    config.owner.name = "Dana".to_string();
    config.owner.github_username = Some("dana".to_string());
    config.corpus.clone_dir = clone_dir.to_path_buf();
    config.model.api_key = Some("test-key".to_string());
    config
}

pub fn url(name: &str) -> String {
    format!("https://github.com/dana/{}.git", name)
}

// ============ Discovery ============

pub struct StaticDiscovery {
    pub urls: Vec<String>,
    pub calls: AtomicUsize,
}

impl StaticDiscovery {
    pub fn new(names: &[&str]) -> Self {
        Self {
            urls: names.iter().map(|n| url(n)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepoDiscovery for StaticDiscovery {
    async fn discover(&self, _owner: &str, _topic: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.urls.clone())
    }
}

pub struct FailingDiscovery;

#[async_trait]
impl RepoDiscovery for FailingDiscovery {
    async fn discover(&self, _owner: &str, _topic: &str) -> Result<Vec<String>> {
        bail!("GitHub API error 503 Service Unavailable: try later")
    }
}

// ============ Sync ============

/// Writes a README per "repository" instead of running git.
///
/// Repositories without content get a directory but no README. Repositories
/// listed in `failing` return an error.
#[derive(Default)]
pub struct FakeSync {
    pub readmes: HashMap<String, String>,
    pub failing: Vec<String>,
    pub synced: Mutex<Vec<PathBuf>>,
}

impl FakeSync {
    pub fn with_readmes(pairs: &[(&str, &str)]) -> Self {
        Self {
            readmes: pairs
                .iter()
                .map(|(name, body)| (url(name), body.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failing.push(url(name));
        self
    }
}

impl RepoSync for FakeSync {
    fn sync(&self, url: &str, dest: &Path) -> Result<()> {
        if self.failing.iter().any(|u| u == url) {
            bail!("git clone failed: repository not found");
        }
        std::fs::create_dir_all(dest)?;
        std::fs::write(dest.join(".origin"), url)?;
        if let Some(body) = self.readmes.get(url) {
            std::fs::write(dest.join("README.md"), body)?;
        }
        self.synced.lock().unwrap().push(dest.to_path_buf());
        Ok(())
    }

    fn remote_url(&self, repo_dir: &Path) -> Option<String> {
        std::fs::read_to_string(repo_dir.join(".origin")).ok()
    }
}

// ============ Progress ============

/// Keeps every reported event.
#[derive(Default)]
pub struct RecordingProgress {
    pub events: Mutex<Vec<SyncProgressEvent>>,
}

impl RecordingProgress {
    pub fn stale(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                SyncProgressEvent::Stale { repo } => Some(repo.clone()),
                _ => None,
            })
            .collect()
    }
}

impl SyncProgressReporter for RecordingProgress {
    fn report(&self, event: SyncProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ============ Embeddings ============

pub use folio::folio_core::test_support::WordHashEmbedder;

pub fn embedder() -> Option<Arc<dyn EmbeddingProvider>> {
    Some(Arc::new(WordHashEmbedder))
}

// ============ Reasoning model ============

/// Picks tools by keyword and answers from their results.
///
/// - Questions mentioning LinkedIn, resume, or scheduling call the matching
///   fact tool.
/// - "list all" / "all your projects" calls `get_all_project_contexts`.
/// - "tell me about" calls `project_retriever` with the question as query.
/// - Anything else is answered directly without tools.
///
/// After tool results arrive, the answer lists the project names found in
/// `=== PROJECT: <name> ===` headers, or echoes the tool output.
#[derive(Default)]
pub struct ScriptedModel {
    pub calls: Mutex<Vec<ToolCall>>,
    pub offered: Mutex<Vec<Vec<String>>>,
}

impl ScriptedModel {
    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().unwrap().clone()
    }

    fn choose(question: &str, offered: &[String]) -> Option<(String, serde_json::Value)> {
        let q = question.to_lowercase();
        let has = |name: &str| offered.iter().any(|o| o == name);
        let pick = if q.contains("linkedin") {
            Some(("get_linkedin_link", json!({})))
        } else if q.contains("resume") || q.contains("cv") {
            Some(("get_resume_link", json!({ "query": question })))
        } else if q.contains("schedule") || q.contains("calendly") || q.contains("meeting") {
            Some(("get_scheduling_link", json!({})))
        } else if q.contains("list all") || q.contains("all your projects") {
            Some(("get_all_project_contexts", json!({})))
        } else if q.contains("tell me about") {
            if has("project_retriever") {
                Some(("project_retriever", json!({ "query": question })))
            } else {
                Some(("get_all_project_contexts", json!({})))
            }
        } else {
            None
        };
        pick.map(|(name, args)| (name.to_string(), args))
    }
}

pub fn project_names(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|l| l.strip_prefix("=== PROJECT: "))
        .filter_map(|l| l.strip_suffix(" ==="))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl ReasoningModel for ScriptedModel {
    async fn complete(&self, messages: &[Message], tools: &[ToolDescriptor]) -> Result<Message> {
        let offered: Vec<String> = tools.iter().map(|t| t.name.clone()).collect();
        self.offered.lock().unwrap().push(offered.clone());

        let last = messages.last().ok_or_else(|| anyhow::anyhow!("no messages"))?;
        match last.role {
            Role::User => match Self::choose(&last.content, &offered) {
                Some((name, arguments)) => {
                    let call = ToolCall {
                        id: format!("call_{}", self.calls.lock().unwrap().len()),
                        name,
                        arguments,
                    };
                    self.calls.lock().unwrap().push(call.clone());
                    Ok(Message::assistant_tool_calls("", vec![call]))
                }
                None => Ok(Message::assistant(
                    "Hello! I can tell you about Dana's projects and contact details.",
                )),
            },
            Role::Tool => {
                let results: Vec<&str> = messages
                    .iter()
                    .rev()
                    .take_while(|m| m.role == Role::Tool)
                    .map(|m| m.content.as_str())
                    .collect();
                let names: Vec<String> = results.iter().flat_map(|r| project_names(r)).collect();
                if names.is_empty() {
                    Ok(Message::assistant(format!(
                        "Here is what I found: {}",
                        results.join("\n")
                    )))
                } else {
                    Ok(Message::assistant(format!("Projects: {}", names.join(", "))))
                }
            }
            _ => bail!("unexpected last message role"),
        }
    }
}

/// A reasoning service that is always down.
pub struct FailingModel;

#[async_trait]
impl ReasoningModel for FailingModel {
    async fn complete(&self, _messages: &[Message], _tools: &[ToolDescriptor]) -> Result<Message> {
        bail!("chat completion failed: 500 Internal Server Error")
    }
}
