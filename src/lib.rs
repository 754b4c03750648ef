//! Voice Router - push-to-talk voice command router for a desktop assistant
//!
//! This library provides the core of the assistant:
//! - Turn taking around a single microphone and speaker
//! - Longest-keyword command resolution against a JSON catalogue
//! - Action handlers for time, memory, files, apps, web and macros
//! - A content-addressed cache of synthesized phrases
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Push-to-talk key (rdev)                 │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Assistant                          │
//! │  Turn state │ Listen │ STT │ Resolver │ Dispatch    │
//! └──────┬──────────────────────────────────┬───────────┘
//!        │                                  │
//! ┌──────▼──────────────┐   ┌───────────────▼───────────┐
//! │ Speech cache + TTS  │   │ Actions + JSON stores     │
//! └─────────────────────┘   └───────────────────────────┘
//! ```

pub mod actions;
pub mod assistant;
pub mod catalogue;
pub mod config;
pub mod daemon;
pub mod error;
pub mod resolver;
pub mod speech;
pub mod store;
pub mod turn;
pub mod voice;
pub mod watchdog;

pub use actions::{ActionHandler, ActionRegistry, Invocation};
pub use assistant::{Assistant, Dispatch, Services};
pub use catalogue::{Catalogue, CommandSpec};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
