// crates/network/src/lib.rs
//! Network actions: single request/response exchanges with a task lifecycle
//!
//! A [`NetAction`] borrows a shared [`Transport`], owns the [`Reply`] stream
//! of the one request it issues, and reports exactly one terminal outcome.
//!
//! # Example
//!
//! ```no_run
//! use netaction::{Fetch, HttpTransport, SharedTransport, TaskStatus};
//! use std::sync::Arc;
//!
//! # async fn demo() -> netaction::NetworkResult<()> {
//! let transport: SharedTransport = Arc::new(HttpTransport::new()?);
//! let mut action = Fetch::action("https://www.rust-lang.org/robots.txt")?;
//! action.start(transport)?;
//!
//! if action.run().await == TaskStatus::Succeeded {
//!     println!("{}", action.behavior().text()?);
//! }
//! # Ok(())
//! # }
//! ```

mod action;
mod client;
mod error;
mod fetch;
mod progress;
pub mod reply;
pub mod size;
mod task;
mod transport;

pub use action::{ActionBehavior, CancelHandle, NetAction};
pub use client::{ClientConfig, HttpTransport};
pub use error::{FailureReason, NetworkError, NetworkResult, TransportError};
pub use fetch::Fetch;
pub use progress::TransferProgress;
pub use reply::{Reply, ReplyBody, ReplyEvent, ReplySender, Request};
pub use size::{format_size, human_readable_size, UnitSystem};
pub use task::{Task, TaskEvent, TaskListener, TaskReporter, TaskStatus};
pub use transport::{SharedTransport, Transport};
