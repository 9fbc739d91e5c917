//! Core data models used throughout folio.
//!
//! These types represent the project documents, their fragments, and the
//! messages that flow between the caller, the conversation loop and the
//! reasoning model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One project document (a repository README) loaded for this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Full text of the document.
    pub content: String,
    /// Unique identifier within the corpus (the repository directory name).
    pub name: String,
    /// Origin the document was synchronized from (a clone URL or a local path).
    pub source: String,
}

impl Document {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            name: name.into(),
            source: source.into(),
        }
    }
}

/// The ordered set of documents loaded at startup.
///
/// Uniqueness by [`Document::name`] is enforced on insertion; the first
/// document with a given name wins.
#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<Document>,
    loaded_at: DateTime<Utc>,
}

impl Corpus {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            loaded_at: Utc::now(),
        }
    }

    /// Build a corpus from documents, dropping later duplicates by name.
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut corpus = Self::new();
        for doc in documents {
            corpus.push(doc);
        }
        corpus
    }

    /// Append a document. Returns `false` (and leaves the corpus unchanged)
    /// when a document with the same name is already present.
    pub fn push(&mut self, doc: Document) -> bool {
        if self.contains(&doc.name) {
            return false;
        }
        self.documents.push(doc);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.documents.iter().any(|d| d.name == name)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn names(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// SHA-256 over every document's name and content, in corpus order.
    ///
    /// Two loads that produced the same documents have the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for doc in &self.documents {
            hasher.update(doc.name.as_bytes());
            hasher.update([0u8]);
            hasher.update(doc.content.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new()
    }
}

/// A fragment of a document's content, the unit of retrieval.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// `"<document>#<index>"`, stable across loads of the same content.
    pub id: String,
    /// Name of the parent document.
    pub document: String,
    pub chunk_index: i64,
    pub text: String,
}

/// Message author in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A structured tool invocation requested by the reasoning model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id; echoed back on the tool-result message.
    pub id: String,
    pub name: String,
    /// Arguments as sent by the model. Normally a JSON object.
    pub arguments: serde_json::Value,
}

/// One entry of conversation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    /// Tool invocations (assistant messages only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// The call this message answers (tool messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// An assistant message that requests tool invocations.
    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::plain(Role::Tool, content)
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
