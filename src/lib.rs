//! Coursemate - course material question answering
//!
//! An assistant that answers questions about course material. The model
//! decides per question whether to search the course catalog, may search up
//! to twice, and the answer comes back with the sources that backed it.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `llm` - Model service abstraction and the OpenAI backend
//! - `index` - Course index abstraction and the in-memory catalog index
//! - `tools` - Tool trait, registry and course search tool
//! - `agent` - Bounded tool calling loop
//! - `session` - Conversation history
//! - `orchestrator` - Query coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use coursemate::config::Settings;
//! use coursemate::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let result = orchestrator.query("What does lesson 2 of the MCP course cover?", None).await?;
//!     println!("{}", result.answer);
//!     for source in &result.sources {
//!         println!("  {}", source.label);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod session;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{CoursemateError, Result};
