//! # folio
//!
//! A conversational assistant for a developer's software portfolio.
//!
//! folio discovers the owner's repositories tagged with a topic, syncs local
//! clones, reads one README per repository, and builds an in-memory
//! retrieval index over them. A hosted reasoning model then answers each
//! question through a fixed tool set: owner contact facts, the whole corpus
//! at once for synthesis questions, or a similarity search for specific ones.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌──────────────┐
//! │ Discovery  │──▶│   Loader   │──▶│  Retrieval   │
//! │ GitHub API │   │ clone/pull │   │    Index     │
//! └────────────┘   └────────────┘   └──────┬───────┘
//!                                          │
//!                              ┌───────────┤
//!                              ▼           ▼
//!                        ┌──────────┐ ┌──────────┐
//!                        │  Tools   │◀│  Router  │◀── reasoning model
//!                        └──────────┘ └──────────┘
//! ```
//!
//! Pure logic (models, chunking, index, tools, router) lives in the
//! `folio-core` crate; this crate adds configuration, I/O, providers, the
//! CLI and the HTTP server.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration plus environment overlay |
//! | [`discovery`] | Repository discovery (GitHub search) |
//! | [`connector_git`] | Clone/pull via the `git` executable |
//! | [`loader`] | Corpus loading with local-cache fallback |
//! | [`embedding`] | Embedding providers (fastembed, OpenAI, Ollama) |
//! | [`llm`] | OpenAI-compatible chat-completions client |
//! | [`assistant`] | The assembled assistant context |
//! | [`progress`] | Sync progress reporting |
//! | [`commands`] | CLI subcommands |
//! | [`server`] | HTTP API |

pub mod assistant;
pub mod commands;
pub mod config;
pub mod connector_git;
pub mod discovery;
pub mod embedding;
pub mod llm;
pub mod loader;
pub mod progress;
pub mod server;

pub use folio_core;
