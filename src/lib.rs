//! # EUtils Proxy
//!
//! A backend proxy that forwards academic-literature search and retrieval
//! requests to the NCBI EUtils service and normalizes its two XML schemas
//! (PubMed `PubmedArticle` and PMC `article`) into one uniform paper record.
//!
//! ## Features
//!
//! - **Paginated search**: NCBI's two-step history protocol (`usehistory=y`)
//!   resolves a free-text term into a stable, pageable ID list
//! - **Record normalization**: one shared extraction engine for both source
//!   schemas, with fallback chains for abstract, authors, date, and PDF link
//! - **PMC enrichment**: PubMed results carrying a PMC cross-reference are
//!   backfilled from PMC in a single batched follow-up fetch
//! - **Stateless**: records live for one response; no caching, no retries
//!
//! ## Quick Start
//!
//! ```no_run
//! use eutils_proxy::config::AppConfig;
//! use eutils_proxy::server::build_router;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env();
//!     let listener = TcpListener::bind(config.effective_bind_addr()).await?;
//!     axum::serve(listener, build_router(&config)).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod enrich;
pub mod error;
pub mod eutils;
pub mod ids;
pub mod normalize;
pub mod paper;
pub mod server;

// Re-export main types for convenience
pub use config::AppConfig;
pub use error::{ProxyError, Result};
pub use eutils::{EUtilsClient, SearchPage};
pub use paper::{PaperRecord, SourceDb};
