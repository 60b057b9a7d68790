//! taskdrive: scripted end-to-end conversations against a gRPC agent backend.
//!
//! A run pushes settings, starts a task, and then reacts to the backend's
//! event stream: each inbound message is classified into an [`event::Event`],
//! appended to the [`message_log::MessageLog`], and fed to the
//! [`conversation::StageMachine`], which sends scripted follow-ups, approves
//! tool asks and records checkpoints in a [`validation::ValidationSet`].
//!
//! ```no_run
//! use taskdrive::config::{HarnessConfig, Script};
//! use taskdrive::harness::{Harness, Phase};
//! use taskdrive::provision::ExternalEnvironment;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let mut harness = Harness::new(ExternalEnvironment, HarnessConfig::from_env(), Script::default());
//! let report = harness.run(Phase::Conversation, &CancellationToken::new()).await;
//! println!("{}", report.render_summary());
//! # }
//! ```

pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
pub mod harness;
pub mod message_log;
pub mod proto;
pub mod provision;
pub mod roster;
pub mod transport;
pub mod util;
pub mod validation;

#[cfg(feature = "cli")]
pub mod cli;
