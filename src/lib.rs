//! parley — turn orchestration for tool-using agents.
//!
//! A [`engine::Router`] answers a conversation by reasoning, calling local
//! tools, or delegating to a peer agent, and stamps every message with the
//! agent that produced it.
//!
//! # Quick Start
//!
//! ```no_run
//! use parley::prelude::*;
//!
//! # async fn example() -> parley::error::Result<()> {
//! let config = ParleyConfig::from_env()?;
//! let router = Router::from_config(&config)?;
//! let outcome = router.run_turn(vec![Message::user("Hello!")]).await?;
//! println!("{}", outcome.messages.last().map(Message::text).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod delegation;
pub mod engine;
pub mod error;
pub mod prelude;
pub mod provenance;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "server")]
pub mod cli;

#[cfg(feature = "server")]
pub mod server;
