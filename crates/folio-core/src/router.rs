//! Tool router and conversation loop.
//!
//! One turn alternates between two states:
//!
//! - **Reasoning**: the message list and the tool descriptors are sent to the
//!   [`ReasoningModel`]. A reply without tool calls ends the turn.
//! - **Acting**: every requested tool runs in order and its output (or a
//!   structured error payload) is appended as a tool-result message bound to
//!   the call id. Control then returns to Reasoning.
//!
//! The loop is capped at `max_iterations` model calls. Model errors are not
//! recovered and propagate to the caller.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::{Message, Role};
use crate::tools::{PortfolioTools, ToolDescriptor};

/// Answer returned when the iteration cap is reached.
pub const GIVE_UP_ANSWER: &str =
    "Sorry, I couldn't finish answering that question. Please try rephrasing it.";

/// A chat-completion service that may request tool calls.
#[async_trait]
pub trait ReasoningModel: Send + Sync {
    /// Produce the next assistant message for `messages`.
    ///
    /// The returned message has role `assistant` and either a final answer in
    /// `content` or one or more `tool_calls`.
    async fn complete(&self, messages: &[Message], tools: &[ToolDescriptor]) -> Result<Message>;
}

/// Result of one conversation turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub answer: String,
    /// Every message of the turn, including the system instruction.
    #[serde(skip)]
    pub messages: Vec<Message>,
    /// Number of model calls made.
    pub iterations: usize,
    /// Tool names in invocation order.
    pub tools_used: Vec<String>,
    /// `true` when the iteration cap stopped the loop.
    pub exhausted: bool,
}

enum LoopState {
    Reasoning,
    Acting(Message),
}

/// The system instruction for an assistant speaking for `owner`.
pub fn system_prompt(owner: &str) -> String {
    format!(
        "You are an AI assistant representing {owner}'s portfolio.\n\
         Your role is to help recruiters and visitors learn about {owner}'s projects, skills, and contact information.\n\
         \n\
         IMPORTANT: You MUST use the provided tools to answer questions. Never make up or hallucinate information.\n\
         - For project questions: Use get_all_project_contexts or project_retriever tools\n\
         - For scheduling/Calendly links: Use get_scheduling_link tool\n\
         - For LinkedIn: Use get_linkedin_link tool\n\
         - For resume: Use get_resume_link tool\n\
         - For general contact info: Use get_personal_info tool\n\
         \n\
         Be professional, concise, and helpful. Always refer to {owner} in the third person when discussing their work.",
        owner = owner
    )
}

pub struct Router {
    model: Arc<dyn ReasoningModel>,
    tools: Arc<PortfolioTools>,
    system_prompt: String,
    max_iterations: usize,
}

impl Router {
    pub fn new(
        model: Arc<dyn ReasoningModel>,
        tools: Arc<PortfolioTools>,
        system_prompt: impl Into<String>,
        max_iterations: usize,
    ) -> Self {
        Self {
            model,
            tools,
            system_prompt: system_prompt.into(),
            max_iterations: max_iterations.max(1),
        }
    }

    pub fn tools(&self) -> &PortfolioTools {
        &self.tools
    }

    /// Seed the turn: system instruction (once), caller history, question.
    fn seed(&self, history: &[Message], question: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if history.first().map(|m| m.role) != Some(Role::System) {
            messages.push(Message::system(self.system_prompt.clone()));
        }
        messages.extend_from_slice(history);
        messages.push(Message::user(question));
        messages
    }

    /// Run one turn for `question` on top of `history`.
    pub async fn run(&self, history: &[Message], question: &str) -> Result<TurnOutcome> {
        let descriptors = self.tools.descriptors();
        let mut messages = self.seed(history, question);
        let mut tools_used = Vec::new();
        let mut iterations = 0usize;
        let mut state = LoopState::Reasoning;

        loop {
            state = match state {
                LoopState::Reasoning => {
                    if iterations >= self.max_iterations {
                        warn!(
                            max_iterations = self.max_iterations,
                            "iteration cap reached, giving up on this turn"
                        );
                        messages.push(Message::assistant(GIVE_UP_ANSWER));
                        return Ok(TurnOutcome {
                            answer: GIVE_UP_ANSWER.to_string(),
                            messages,
                            iterations,
                            tools_used,
                            exhausted: true,
                        });
                    }
                    iterations += 1;
                    debug!(iteration = iterations, "calling reasoning model");

                    let reply = self.model.complete(&messages, &descriptors).await?;
                    if reply.has_tool_calls() {
                        LoopState::Acting(reply)
                    } else {
                        let answer = reply.content.clone();
                        messages.push(reply);
                        return Ok(TurnOutcome {
                            answer,
                            messages,
                            iterations,
                            tools_used,
                            exhausted: false,
                        });
                    }
                }
                LoopState::Acting(reply) => {
                    let calls = reply.tool_calls.clone();
                    messages.push(reply);
                    for call in &calls {
                        tools_used.push(call.name.clone());
                        let content = match self.tools.execute(call).await {
                            Ok(output) => {
                                info!(tool = %call.name, "tool call succeeded");
                                output
                            }
                            Err(e) => {
                                warn!(tool = %call.name, code = e.code(), error = %e, "tool call failed");
                                e.to_payload()
                            }
                        };
                        messages.push(Message::tool_result(call.id.clone(), content));
                    }
                    LoopState::Reasoning
                }
            };
        }
    }
}
