// crates/network/src/transport.rs
//! Transport boundary: anything that can turn a request into a reply stream

use crate::reply::{Reply, Request};
use std::sync::Arc;

/// A long-lived object that issues requests.
///
/// One transport serves many actions at once. `send` must return without
/// blocking. Events for the returned reply arrive later through its
/// `ReplySender`, ending with `Finished` unless the reply is aborted first.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> Reply;
}

/// Shared transport handle; actions borrow it and never control its lifetime
pub type SharedTransport = Arc<dyn Transport>;
