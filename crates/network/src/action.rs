// crates/network/src/action.rs
//! Network action: one exchange bound to a task lifecycle
//!
//! A [`NetAction`] issues a single request when started, owns the resulting
//! [`Reply`] until it reaches a terminal state, and turns the reply's events
//! into exactly one of `Succeeded`, `Failed` or `Cancelled`.
//!
//! Events are processed on whichever task drives the action, either one at a
//! time through [`NetAction::dispatch`], in batches through
//! [`NetAction::pump`], or until completion with [`NetAction::run`].
//! Cancellation wins over any event that has not been processed yet.

use crate::error::{FailureReason, NetworkError, NetworkResult, TransportError};
use crate::progress::TransferProgress;
use crate::reply::{Poll, Reply, ReplyBody, ReplyEvent, Request};
use crate::task::{Task, TaskEvent, TaskListener, TaskReporter, TaskStatus};
use crate::transport::SharedTransport;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

/// Request-specific half of an action: what to ask for and what to do with
/// the answer.
pub trait ActionBehavior: Send {
    /// Builds the request for `url`. Defaults to a plain GET.
    fn build_request(&mut self, url: &Url) -> Request {
        Request::get(url.clone())
    }

    /// Counters after the action applied its monotonic clamp
    fn on_progress(&mut self, received: u64, total: Option<u64>);

    /// Body bytes are buffered in `body`. Drain them now or leave them for
    /// `on_finished`.
    fn on_ready_read(&mut self, body: &mut ReplyBody);

    /// The transport reported a failure. Called once, for the first error.
    fn on_error(&mut self, error: &TransportError);

    /// Last call for a completed exchange, before the reply is released
    fn on_finished(&mut self, body: &mut ReplyBody, error: Option<&TransportError>);

    /// The action was cancelled; no further callbacks follow
    fn on_cancelled(&mut self) {}
}

/// Cloneable handle that cancels an action from another task
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Requests cancellation. The action becomes `Cancelled` the next time it
    /// is driven, ahead of any queued reply events.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

enum Step {
    Cancel,
    Event(ReplyEvent),
    Closed,
}

/// One network exchange and its lifecycle
pub struct NetAction<B> {
    url: Url,
    transport: Option<SharedTransport>,
    reply: Option<Reply>,
    status: TaskStatus,
    progress: TransferProgress,
    pending_error: Option<TransportError>,
    behavior: B,
    reporter: TaskReporter,
    cancel_token: CancellationToken,
}

impl<B: ActionBehavior> NetAction<B> {
    /// Creates an idle action for `url`
    pub fn new(url: Url, behavior: B) -> Self {
        Self {
            url,
            transport: None,
            reply: None,
            status: TaskStatus::Idle,
            progress: TransferProgress::new(),
            pending_error: None,
            behavior,
            reporter: TaskReporter::new(),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Parses `url` and creates an idle action for it
    pub fn parse(url: &str, behavior: B) -> NetworkResult<Self> {
        let url = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self::new(url, behavior))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Replaces the target; only allowed before start
    pub fn set_url(&mut self, url: Url) -> NetworkResult<()> {
        self.ensure_idle("change the URL of")?;
        self.url = url;
        Ok(())
    }

    /// Stores the transport to use at start; only allowed before start
    pub fn set_transport(&mut self, transport: SharedTransport) -> NetworkResult<()> {
        self.ensure_idle("change the transport of")?;
        self.transport = Some(transport);
        Ok(())
    }

    pub fn transport(&self) -> Option<&SharedTransport> {
        self.transport.as_ref()
    }

    /// Sets the transport and starts the action
    pub fn start(&mut self, transport: SharedTransport) -> NetworkResult<()> {
        self.set_transport(transport)?;
        self.execute()
    }

    /// Registers a listener for this action's task events
    pub fn subscribe(&mut self, listener: TaskListener) {
        self.reporter.subscribe(listener);
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.cancel_token.clone(),
        }
    }

    pub fn bytes_received(&self) -> u64 {
        self.progress.received()
    }

    /// Total size, once the transport reported one
    pub fn bytes_total(&self) -> Option<u64> {
        self.progress.total()
    }

    pub fn progress(&self) -> &TransferProgress {
        &self.progress
    }

    /// Returns true while the action owns a reply
    pub fn has_live_reply(&self) -> bool {
        self.reply.is_some()
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    pub fn behavior_mut(&mut self) -> &mut B {
        &mut self.behavior
    }

    /// Consumes the action, returning its behavior. A live reply is aborted.
    pub fn into_behavior(self) -> B {
        self.behavior
    }

    /// Applies one reply event. Events outside the running state are dropped.
    pub fn dispatch(&mut self, event: ReplyEvent) {
        if self.cancel_token.is_cancelled() && !self.status.is_terminal() {
            log::debug!("{}: cancel pending, dropping {:?}", self.url, event);
            self.cancel();
            return;
        }
        if self.status != TaskStatus::Running || self.reply.is_none() {
            log::warn!(
                "Ignoring {:?} for {}: action is {}",
                event,
                self.url,
                self.status
            );
            return;
        }

        match event {
            ReplyEvent::Progress { received, total } => {
                self.progress.record(received, total);
                let (received, total) = (self.progress.received(), self.progress.total());
                self.behavior.on_progress(received, total);
                self.reporter.emit(TaskEvent::Progress { received, total });
            }
            ReplyEvent::ReadyRead(chunk) => {
                if let Some(reply) = self.reply.as_mut() {
                    reply.body_mut().append(&chunk);
                    self.behavior.on_ready_read(reply.body_mut());
                }
            }
            ReplyEvent::Error(error) => {
                if let Some(first) = &self.pending_error {
                    log::debug!("{}: keeping first error {}, ignoring {}", self.url, first, error);
                } else {
                    log::debug!("{}: transport reported {}", self.url, error);
                    self.behavior.on_error(&error);
                    self.pending_error = Some(error);
                }
            }
            ReplyEvent::Finished => self.finish(),
        }
    }

    /// Applies every event already queued on the reply without waiting.
    ///
    /// Returns the number of events applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.poll_step() {
                Some(step) => {
                    self.apply(step);
                    applied += 1;
                }
                None => break,
            }
        }
        applied
    }

    /// Drives the action until it is terminal and returns the final status.
    ///
    /// Returns immediately for an action that was never started. A pending
    /// cancel request still applies, so such an action ends `Cancelled`.
    pub async fn run(&mut self) -> TaskStatus {
        let cancel = self.cancel_token.clone();
        loop {
            if cancel.is_cancelled() && !self.status.is_terminal() {
                self.cancel();
            }
            let Some(reply) = self.reply.as_mut() else {
                break;
            };

            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => Step::Cancel,
                event = reply.next() => match event {
                    Some(event) => Step::Event(event),
                    None => Step::Closed,
                },
            };
            self.apply(step);
        }
        self.status.clone()
    }

    fn poll_step(&mut self) -> Option<Step> {
        if self.cancel_token.is_cancelled() && !self.status.is_terminal() {
            return Some(Step::Cancel);
        }
        match self.reply.as_mut()?.try_next() {
            Poll::Event(event) => Some(Step::Event(event)),
            Poll::Empty => None,
            Poll::Closed => Some(Step::Closed),
        }
    }

    fn apply(&mut self, step: Step) {
        match step {
            Step::Cancel => {
                self.cancel();
            }
            Step::Event(event) => self.dispatch(event),
            Step::Closed => {
                log::warn!("Transport closed the reply for {} without finishing", self.url);
                self.dispatch(ReplyEvent::Error(TransportError::RemoteClosed));
                self.dispatch(ReplyEvent::Finished);
            }
        }
    }

    fn finish(&mut self) {
        let error = self.pending_error.take();
        if let Some(mut reply) = self.reply.take() {
            self.behavior.on_finished(reply.body_mut(), error.as_ref());
        }

        let status = match error {
            Some(error) => TaskStatus::Failed(FailureReason::Transport(error)),
            None => TaskStatus::Succeeded,
        };
        self.conclude(status);
    }

    fn conclude(&mut self, status: TaskStatus) {
        log::debug!("{}: {} -> {}", self.url, self.status, status);
        self.status = status;
        if let Some(event) = self.status.terminal_event() {
            self.reporter.emit(event);
        }
    }

    fn ensure_idle(&self, what: &str) -> NetworkResult<()> {
        if self.status == TaskStatus::Idle {
            Ok(())
        } else {
            Err(NetworkError::Configuration(format!(
                "cannot {} an action that is {}",
                what, self.status
            )))
        }
    }
}

impl<B: ActionBehavior> Task for NetAction<B> {
    fn execute(&mut self) -> NetworkResult<()> {
        self.ensure_idle("start")?;

        if self.cancel_token.is_cancelled() {
            log::debug!("{}: cancelled before start", self.url);
            self.cancel();
            return Ok(());
        }

        let Some(transport) = self.transport.clone() else {
            let message = format!("no transport set for {}", self.url);
            self.conclude(TaskStatus::Failed(FailureReason::Configuration(message.clone())));
            return Err(NetworkError::Configuration(message));
        };

        let request = self.behavior.build_request(&self.url);
        self.reply = Some(transport.send(request));
        self.progress.start();
        self.status = TaskStatus::Running;
        self.reporter.emit(TaskEvent::Started);
        Ok(())
    }

    fn status(&self) -> &TaskStatus {
        &self.status
    }

    fn cancel(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.cancel_token.cancel();
        if let Some(mut reply) = self.reply.take() {
            reply.abort();
        }
        self.pending_error = None;
        self.behavior.on_cancelled();
        self.conclude(TaskStatus::Cancelled);
        true
    }
}
