//! The assistant context: everything one portfolio conversation needs.
//!
//! An [`Assistant`] is built once per process (or per test) from a validated
//! [`Config`]. It owns the corpus, the optional retrieval index, the tool set
//! and the router, all immutable after construction. Handles are cheap to
//! share behind `Arc`, and independent assistants can coexist.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use folio_core::embedding::EmbeddingProvider;
use folio_core::facts::FactStore;
use folio_core::index::{IndexError, IndexOptions, RetrievalIndex};
use folio_core::models::{Corpus, Message};
use folio_core::router::{system_prompt, ReasoningModel, Router, TurnOutcome};
use folio_core::tools::{PortfolioTools, ToolDescriptor};

use crate::config::Config;
use crate::connector_git::{GitCli, RepoSync};
use crate::discovery::{GitHubDiscovery, RepoDiscovery};
use crate::embedding::create_provider;
use crate::llm::ChatCompletionsModel;
use crate::loader::load_corpus;
use crate::progress::{SyncProgressEvent, SyncProgressReporter};

/// Owner details for front-ends (chat sidebar, greeting).
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub name: String,
    pub github_username: Option<String>,
    pub linkedin_url: Option<String>,
    pub resume_url: Option<String>,
    pub scheduling_url: Option<String>,
    pub profile_pic_url: String,
    pub greeting: String,
    pub projects: Vec<String>,
}

pub fn greeting(owner: &str) -> String {
    format!(
        "👋 Hi! I'm {}'s AI assistant. I can help you learn about projects, technical skills, and experience. What would you like to know?",
        owner
    )
}

pub struct Assistant {
    router: Router,
    corpus: Arc<Corpus>,
    index: Option<Arc<RetrievalIndex>>,
    profile: Profile,
}

impl Assistant {
    /// Validate `config`, then load, index and wire the production services.
    pub async fn start(config: &Config, progress: &dyn SyncProgressReporter) -> Result<Self> {
        config.validate()?;
        let discovery = GitHubDiscovery::new(&config.corpus)?;
        let embedder = create_provider(&config.embedding)?;
        let model: Arc<dyn ReasoningModel> = Arc::new(ChatCompletionsModel::new(&config.model)?);
        Self::start_with(config, &discovery, &GitCli, embedder, model, progress).await
    }

    /// Like [`Assistant::start`] with caller-supplied services.
    pub async fn start_with(
        config: &Config,
        discovery: &dyn RepoDiscovery,
        sync: &dyn RepoSync,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        model: Arc<dyn ReasoningModel>,
        progress: &dyn SyncProgressReporter,
    ) -> Result<Self> {
        config.validate()?;
        let owner = config.owner.github_username.clone().unwrap_or_default();

        let corpus = Arc::new(load_corpus(&owner, &config.corpus, discovery, sync, progress).await?);
        let index = build_index(&corpus, embedder, config, progress).await;
        Ok(Self::from_parts(config, corpus, index, model))
    }

    /// Assemble an assistant from an already loaded corpus and index.
    pub fn from_parts(
        config: &Config,
        corpus: Arc<Corpus>,
        index: Option<Arc<RetrievalIndex>>,
        model: Arc<dyn ReasoningModel>,
    ) -> Self {
        let owner = &config.owner;
        let mut facts = FactStore::new(owner.name.clone());
        facts.linkedin_url = owner.linkedin_url.clone();
        facts.resume_url = owner.resume_url.clone();
        facts.scheduling_url = owner.scheduling_url.clone();

        let tools = Arc::new(PortfolioTools::new(
            facts,
            Arc::clone(&corpus),
            index.clone(),
            config.retrieval.top_k,
        ));
        if index.is_none() {
            warn!("project retriever unavailable; answering from full-corpus context and facts only");
        }

        let router = Router::new(
            model,
            tools,
            system_prompt(&owner.name),
            config.model.max_iterations,
        );

        let profile = Profile {
            name: owner.name.clone(),
            github_username: owner.github_username.clone(),
            linkedin_url: owner.linkedin_url.clone(),
            resume_url: owner.resume_url.clone(),
            scheduling_url: owner.scheduling_url.clone(),
            profile_pic_url: owner.profile_pic_url.clone(),
            greeting: greeting(&owner.name),
            projects: corpus.names().into_iter().map(str::to_string).collect(),
        };

        Self {
            router,
            corpus,
            index,
            profile,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn index(&self) -> Option<&RetrievalIndex> {
        self.index.as_deref()
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn tools(&self) -> &PortfolioTools {
        self.router.tools()
    }

    pub fn tool_descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools().descriptors()
    }

    /// Run one turn and return the full outcome.
    pub async fn turn(&self, question: &str, history: &[Message]) -> Result<TurnOutcome> {
        let outcome = self.router.run(history, question).await?;
        info!(
            iterations = outcome.iterations,
            tools = ?outcome.tools_used,
            exhausted = outcome.exhausted,
            "turn finished"
        );
        Ok(outcome)
    }

    /// Answer `question` given prior `history`.
    pub async fn ask(&self, question: &str, history: &[Message]) -> Result<String> {
        Ok(self.turn(question, history).await?.answer)
    }
}

/// Chunk and embed the corpus, or `None` when retrieval is unavailable
/// (embeddings disabled, empty corpus, or an embedding failure).
pub async fn build_index(
    corpus: &Corpus,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    config: &Config,
    progress: &dyn SyncProgressReporter,
) -> Option<Arc<RetrievalIndex>> {
    let Some(embedder) = embedder else {
        info!("embeddings disabled, project retriever not created");
        return None;
    };

    let options = IndexOptions {
        max_tokens: config.chunking.max_tokens,
        batch_size: config.embedding.batch_size,
    };

    progress.report(SyncProgressEvent::Indexing {
        documents: corpus.len() as u64,
    });

    match RetrievalIndex::build(corpus.documents(), embedder, &options).await {
        Ok(index) => {
            info!(
                fragments = index.len(),
                model = index.model_name(),
                "project retriever created"
            );
            Some(Arc::new(index))
        }
        Err(IndexError::EmptyCorpus) => {
            warn!("no project documents were loaded, project retriever not created");
            None
        }
        Err(e) => {
            warn!(error = %e, "failed to build retrieval index, project retriever not created");
            None
        }
    }
}
