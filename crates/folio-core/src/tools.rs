//! The portfolio tool set exposed to the reasoning model.
//!
//! Tools are identified by [`ToolId`], a closed enum mapped to typed
//! handlers. The model refers to tools by name; [`ToolId::from_name`] is the
//! only place a name string is interpreted, and an unrecognised name becomes
//! [`ToolError::UnknownTool`] instead of reaching a handler.
//!
//! | Tool | Arguments | Source |
//! |------|-----------|--------|
//! | `get_personal_info` | `query?` | [`FactStore::personal_info`] |
//! | `get_scheduling_link` | `query?` | [`FactStore::scheduling_link`] |
//! | `get_linkedin_link` | `query?` | [`FactStore::linkedin_link`] |
//! | `get_resume_link` | `query?` | [`FactStore::resume_link`] |
//! | `get_all_project_contexts` | `query?` | [`corpus_context`] |
//! | `project_retriever` | `query` | [`RetrievalIndex::query`] |
//!
//! `project_retriever` is offered only when a retrieval index exists.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::context::{corpus_context, section_header};
use crate::facts::FactStore;
use crate::index::{RetrievalIndex, RetrievedFragment};
use crate::models::{Corpus, ToolCall};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    PersonalInfo,
    SchedulingLink,
    LinkedinLink,
    ResumeLink,
    AllProjectContexts,
    ProjectRetriever,
}

impl ToolId {
    /// Every tool, in the order they are offered to the model.
    pub const ALL: [ToolId; 6] = [
        ToolId::PersonalInfo,
        ToolId::SchedulingLink,
        ToolId::LinkedinLink,
        ToolId::ResumeLink,
        ToolId::AllProjectContexts,
        ToolId::ProjectRetriever,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolId::PersonalInfo => "get_personal_info",
            ToolId::SchedulingLink => "get_scheduling_link",
            ToolId::LinkedinLink => "get_linkedin_link",
            ToolId::ResumeLink => "get_resume_link",
            ToolId::AllProjectContexts => "get_all_project_contexts",
            ToolId::ProjectRetriever => "project_retriever",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolId::PersonalInfo => {
                "Get general contact information including all available links (LinkedIn, Calendly, Resume)."
            }
            ToolId::SchedulingLink => {
                "Get the Calendly/scheduling link to book a meeting or call. Use this when user asks to schedule, book, or wants a meeting."
            }
            ToolId::LinkedinLink => "Get the LinkedIn profile link.",
            ToolId::ResumeLink => "Get the resume/CV link.",
            ToolId::AllProjectContexts => {
                "Returns ALL project README files at once for synthesis and general questions. \
                 Use this tool when asked to 'list all projects', 'what projects do you have', \
                 'what technologies/tech stacks do you know', 'what are your skills', \
                 'tell me about your work', or any general question about the portfolio. \
                 This gives you ALL project data so you can synthesize answers like extracting \
                 project names, combining tech stacks, or summarizing all work."
            }
            ToolId::ProjectRetriever => {
                "Searches your project README files for details. \
                 Use this tool whenever a recruiter asks about a specific project, \
                 your tech stack, or your role in a project."
            }
        }
    }

    /// OpenAI function-calling JSON Schema for the tool's arguments.
    pub fn parameters_schema(self) -> Value {
        match self {
            ToolId::ProjectRetriever => json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "What to search the project READMEs for" }
                },
                "required": ["query"]
            }),
            _ => json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Optional context for the request" }
                }
            }),
        }
    }

    pub fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// What the reasoning model sees for one tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("no tool registered with name: {0}")]
    UnknownTool(String),
    #[error("tool '{0}' is not available in this session")]
    Unavailable(String),
    #[error("invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },
    #[error("tool '{tool}' failed: {message}")]
    Failed { tool: String, message: String },
}

impl ToolError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::Unavailable(_) => "tool_unavailable",
            ToolError::InvalidArguments { .. } => "bad_request",
            ToolError::Failed { .. } => "tool_error",
        }
    }

    /// Tool-result payload: `{"error":{"code":..,"message":..}}`.
    pub fn to_payload(&self) -> String {
        json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        })
        .to_string()
    }
}

/// Arguments after validation against the tool's schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArgs {
    None,
    Query(String),
}

/// Validate raw model arguments for `id`.
///
/// `null` counts as an empty object. Fact and synthesis tools accept an
/// optional string `query` that they ignore; the retriever requires a
/// non-empty one.
pub fn parse_args(id: ToolId, raw: &Value) -> Result<ToolArgs, ToolError> {
    let invalid = |message: String| ToolError::InvalidArguments {
        tool: id.name().to_string(),
        message,
    };

    let empty = serde_json::Map::new();
    let obj = match raw {
        Value::Null => &empty,
        Value::Object(map) => map,
        other => {
            return Err(invalid(format!(
                "arguments must be a JSON object, got {}",
                json_type_name(other)
            )))
        }
    };

    let query = match obj.get("query") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(other) => {
            return Err(invalid(format!(
                "parameter 'query' must be of type 'string', got {}",
                json_type_name(other)
            )))
        }
    };

    match (id, query) {
        (ToolId::ProjectRetriever, Some(q)) if !q.is_empty() => Ok(ToolArgs::Query(q)),
        (ToolId::ProjectRetriever, Some(_)) => Err(invalid("query must not be empty".into())),
        (ToolId::ProjectRetriever, None) => {
            Err(invalid("missing required parameter: query".into()))
        }
        _ => Ok(ToolArgs::None),
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Render retriever hits as labelled sections, best first.
pub fn format_fragments(query: &str, hits: &[RetrievedFragment]) -> String {
    if hits.is_empty() {
        return format!("No project README matched \"{}\".", query);
    }
    let sections: Vec<String> = hits
        .iter()
        .map(|h| {
            format!(
                "{}\nSource: {}\nRelevance: {:.3}\n{}\n",
                section_header(&h.document),
                h.source,
                h.score,
                h.text
            )
        })
        .collect();
    format!(
        "Top {} matching project excerpts for \"{}\":\n\n{}",
        hits.len(),
        query,
        sections.join("\n")
    )
}

/// The handlers behind every [`ToolId`], bound to one corpus and config.
pub struct PortfolioTools {
    facts: FactStore,
    corpus: Arc<Corpus>,
    index: Option<Arc<RetrievalIndex>>,
    top_k: usize,
}

impl PortfolioTools {
    pub fn new(
        facts: FactStore,
        corpus: Arc<Corpus>,
        index: Option<Arc<RetrievalIndex>>,
        top_k: usize,
    ) -> Self {
        Self {
            facts,
            corpus,
            index,
            top_k: top_k.max(1),
        }
    }

    pub fn facts(&self) -> &FactStore {
        &self.facts
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn is_available(&self, id: ToolId) -> bool {
        match id {
            ToolId::ProjectRetriever => self.index.is_some(),
            _ => true,
        }
    }

    /// Tools offered this session, in [`ToolId::ALL`] order.
    pub fn available(&self) -> Vec<ToolId> {
        ToolId::ALL
            .into_iter()
            .filter(|id| self.is_available(*id))
            .collect()
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.available().into_iter().map(ToolId::descriptor).collect()
    }

    /// Resolve, validate and run a model-requested call.
    pub async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let id = ToolId::from_name(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
        if !self.is_available(id) {
            return Err(ToolError::Unavailable(call.name.clone()));
        }
        let args = parse_args(id, &call.arguments)?;
        self.dispatch(id, args).await
    }

    pub async fn dispatch(&self, id: ToolId, args: ToolArgs) -> Result<String, ToolError> {
        match (id, args) {
            (ToolId::PersonalInfo, _) => Ok(self.facts.personal_info()),
            (ToolId::SchedulingLink, _) => Ok(self.facts.scheduling_link()),
            (ToolId::LinkedinLink, _) => Ok(self.facts.linkedin_link()),
            (ToolId::ResumeLink, _) => Ok(self.facts.resume_link()),
            (ToolId::AllProjectContexts, _) => {
                Ok(corpus_context(&self.facts.name, self.corpus.documents()))
            }
            (ToolId::ProjectRetriever, ToolArgs::Query(query)) => {
                let index = self
                    .index
                    .as_ref()
                    .ok_or_else(|| ToolError::Unavailable(id.name().to_string()))?;
                let hits = index
                    .query(&query, self.top_k)
                    .await
                    .map_err(|e| ToolError::Failed {
                        tool: id.name().to_string(),
                        message: e.to_string(),
                    })?;
                Ok(format_fragments(&query, &hits))
            }
            (ToolId::ProjectRetriever, ToolArgs::None) => Err(ToolError::InvalidArguments {
                tool: id.name().to_string(),
                message: "missing required parameter: query".to_string(),
            }),
        }
    }
}
