//! Implementations of the `folio` subcommands.
//!
//! Each `run_*` function takes an already loaded [`Config`] and validates
//! only what its command needs: `sync`, `search` and `tools` never touch the
//! reasoning model, so they work without an API key.

use anyhow::{bail, Result};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use folio_core::models::{Corpus, Message};
use folio_core::tools::ToolId;

use crate::assistant::{build_index, greeting, Assistant};
use crate::config::Config;
use crate::connector_git::GitCli;
use crate::discovery::GitHubDiscovery;
use crate::embedding::create_provider;
use crate::loader::load_corpus;
use crate::progress::SyncProgressReporter;
use crate::server::run_server;

/// Reply printed when a chat turn fails.
pub const TURN_FAILED: &str = "Sorry, I ran into an error.";

async fn load(cfg: &Config, progress: &dyn SyncProgressReporter) -> Result<Corpus> {
    cfg.validate_corpus()?;
    let discovery = GitHubDiscovery::new(&cfg.corpus)?;
    let owner = cfg.owner.github_username.clone().unwrap_or_default();
    load_corpus(&owner, &cfg.corpus, &discovery, &GitCli, progress).await
}

/// `folio sync`: load the corpus and print what was loaded.
pub async fn run_sync(cfg: &Config, progress: &dyn SyncProgressReporter) -> Result<()> {
    let corpus = load(cfg, progress).await?;

    if corpus.is_empty() {
        println!("No documents loaded.");
        return Ok(());
    }

    for doc in corpus.documents() {
        println!("{:<32} {:>8} bytes  {}", doc.name, doc.content.len(), doc.source);
    }
    println!();
    println!("documents:   {}", corpus.len());
    println!("fingerprint: {}", corpus.fingerprint());
    println!("loaded at:   {}", corpus.loaded_at().to_rfc3339());
    Ok(())
}

/// `folio search`: load, index, and print the top `k` fragments.
pub async fn run_search(
    cfg: &Config,
    query: &str,
    k: Option<usize>,
    progress: &dyn SyncProgressReporter,
) -> Result<()> {
    if query.trim().is_empty() {
        bail!("query must not be empty");
    }
    let k = k.unwrap_or(cfg.retrieval.top_k);
    if k == 0 {
        bail!("k must be at least 1");
    }

    let corpus = load(cfg, progress).await?;
    let Some(embedder) = create_provider(&cfg.embedding)? else {
        bail!("search requires embeddings; set [embedding] provider to local, openai, or ollama");
    };
    let Some(index) = build_index(&corpus, Some(embedder), cfg, progress).await else {
        bail!("no retrieval index available (corpus is empty or embedding failed)");
    };

    let hits = index.query(query, k).await?;
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} #{}  ({})",
            rank + 1,
            hit.score,
            hit.document,
            hit.chunk_index,
            hit.source
        );
        for line in hit.text.lines().take(6) {
            println!("    {}", line);
        }
        println!();
    }
    Ok(())
}

/// `folio tools`: print the tools a turn exposes under this configuration.
pub fn run_tools(cfg: &Config) -> Result<()> {
    for id in ToolId::ALL {
        let note = match id {
            ToolId::ProjectRetriever if !cfg.embedding.is_enabled() => {
                "  (unavailable: embeddings disabled)"
            }
            ToolId::ProjectRetriever => "  (requires a non-empty corpus)",
            _ => "",
        };
        println!("{}{}", id.name(), note);
        println!("    {}", id.description());
        if id == ToolId::ProjectRetriever {
            println!("    top_k = {}", cfg.retrieval.top_k);
        }
    }
    Ok(())
}

/// `folio ask`: one turn with empty history.
pub async fn run_ask(
    cfg: &Config,
    question: &str,
    progress: &dyn SyncProgressReporter,
) -> Result<()> {
    let assistant = Assistant::start(cfg, progress).await?;
    let answer = assistant.ask(question, &[]).await?;
    println!("{}", answer);
    Ok(())
}

/// `folio chat`: interactive loop on stdin.
pub async fn run_chat(cfg: &Config, progress: &dyn SyncProgressReporter) -> Result<()> {
    let assistant = Assistant::start(cfg, progress).await?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    chat_loop(&assistant, stdin, &mut stdout).await
}

/// Read questions line by line until EOF, `exit`, or `quit`.
///
/// Successful turns are appended to the history. A failed turn prints
/// [`TURN_FAILED`] and leaves the history as it was.
pub async fn chat_loop<R, W>(assistant: &Assistant, reader: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{}", greeting(&assistant.profile().name))?;
    let mut history: Vec<Message> = Vec::new();
    let mut lines = reader.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        match assistant.ask(question, &history).await {
            Ok(answer) => {
                writeln!(out, "{}\n", answer)?;
                history.push(Message::user(question));
                history.push(Message::assistant(answer));
            }
            Err(e) => {
                tracing::error!(error = ?e, "chat turn failed");
                writeln!(out, "{}\n", TURN_FAILED)?;
            }
        }
    }

    Ok(())
}

/// `folio serve`: start the HTTP API.
pub async fn run_serve(cfg: &Config, progress: &dyn SyncProgressReporter) -> Result<()> {
    let assistant = Arc::new(Assistant::start(cfg, progress).await?);
    run_server(assistant, &cfg.server.bind).await
}
