//! # People Finder
//!
//! Find colleagues by describing what you need. Employee profiles live in a
//! CSV table; every profile is mirrored into a vector index, and a search
//! retrieves the closest profiles and asks a language model to explain which
//! people fit the request and why.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  upsert   ┌──────────────┐  rebuild  ┌──────────────┐
//! │ profiles.csv│◀─────────▶│ PeopleFinder │──────────▶│ VectorIndex  │
//! └─────────────┘           └──────┬───────┘           │ memory/sqlite│
//!                                  │ search            └──────┬───────┘
//!                                  ▼                          │ top-k
//!                           ┌──────────────┐◀─────────────────┘
//!                           │  Explainer   │──▶ Reasoner (Anthropic/OpenAI)
//!                           └──────┬───────┘
//!                      ┌───────────┴───────────┐
//!                      ▼                       ▼
//!                 ┌──────────┐           ┌──────────┐
//!                 │   CLI    │           │   HTTP   │
//!                 │  (pf)    │           │  (axum)  │
//!                 └──────────┘           └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pf profile upsert --email jane@x.com --name "Jane Doe" --skills "Go, Kubernetes"
//! pf profile list
//! pf search "who knows kubernetes?"
//! pf serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Profile rows, index documents, matches |
//! | [`profiles`] | Profile table, upsert merge rules, CSV persistence |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`http`] | Retrying JSON POST shared by the hosted providers |
//! | [`index`] | Vector index trait with in-memory and SQLite backends |
//! | [`sync`] | Full index rebuild from the table |
//! | [`reasoning`] | Language model completion providers |
//! | [`explain`] | Prompt building and strict parsing of explained matches |
//! | [`search`] | Retrieve → explain → format |
//! | [`finder`] | Lock-guarded facade tying everything together |
//! | [`orgchart`] | Org chart CSV loader |
//! | [`server`] | HTTP API |
//! | [`error`] | Error taxonomy |
//! | [`migrate`] | Index schema |

pub mod config;
pub mod embedding;
pub mod error;
pub mod explain;
pub mod finder;
pub mod http;
pub mod index;
pub mod migrate;
pub mod models;
pub mod orgchart;
pub mod profiles;
pub mod reasoning;
pub mod search;
pub mod server;
pub mod sync;
