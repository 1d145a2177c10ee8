//! Debounced, last-input-wins rendering.
//!
//! A [`RenderHandle`] accepts a stream of markdown snapshots and publishes a single current
//! [`RenderState`]. One worker task drives every render cycle:
//!
//! - **Idle**: waiting for input.
//! - **Scheduled**: input arrived; the worker waits until no new edit has arrived for the
//!   debounce window, then takes the latest snapshot. Intermediate snapshots are never rendered.
//! - **Rendering**: `is_rendering` is set and the pipeline runs against that one snapshot.
//! - **Committing**: the result is published only if no newer request was issued meanwhile.
//!   Otherwise it is dropped and the worker goes back to Scheduled for the newer input.
//!
//! In-flight work is never interrupted; superseded results are simply discarded.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use log::debug;
use log::error;
use log::trace;
use markpane_markdown::FALLBACK_ERROR_HTML;
use markpane_markdown::MarkdownPipeline;
use markpane_markdown::RenderError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::DEFAULT_DEBOUNCE_MS;
use crate::config::RenderConfig;

/// Text a consumer shows while there is nothing to preview.
pub const FALLBACK_EMPTY_HTML: &str = "Start typing to see a formatted preview.";

/// Renders one markdown snapshot to HTML.
pub trait PreviewRenderer: Send + Sync {
    fn render_preview<'a>(&'a self, markdown: &'a str) -> BoxFuture<'a, Result<String, RenderError>>;
}

impl PreviewRenderer for MarkdownPipeline {
    fn render_preview<'a>(&'a self, markdown: &'a str) -> BoxFuture<'a, Result<String, RenderError>> {
        Box::pin(self.render(markdown))
    }
}

/// What the preview currently shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderState {
    /// HTML of the last committed render. Never a partial result.
    pub html: String,
    pub is_rendering: bool,
    /// Sequence number of the request `html` was rendered from; `0` before the first commit.
    pub revision: u64,
}

impl RenderState {
    /// `html`, or [`FALLBACK_EMPTY_HTML`] when there is nothing to show.
    pub fn display_html(&self) -> &str {
        if self.html.is_empty() {
            FALLBACK_EMPTY_HTML
        } else {
            &self.html
        }
    }
}

/// Latest markdown snapshot. Each request gets a strictly larger `seq`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderRequest {
    pub seq: u64,
    pub text: String,
}

impl RenderRequest {
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub struct RenderScheduler {
    renderer: Arc<dyn PreviewRenderer>,
    debounce: Duration,
}

impl RenderScheduler {
    pub fn new(renderer: Arc<dyn PreviewRenderer>) -> Self {
        Self {
            renderer,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }

    pub fn from_config(renderer: Arc<dyn PreviewRenderer>, config: &RenderConfig) -> Self {
        Self::new(renderer).with_debounce(config.debounce())
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Starts the worker task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(self) -> RenderHandle {
        let (input, input_rx) = watch::channel(RenderRequest::default());
        let (state, _) = watch::channel(RenderState::default());
        let state = Arc::new(state);

        let worker = Worker {
            renderer: self.renderer,
            debounce: self.debounce,
            input: input_rx,
            state: Arc::clone(&state),
        };
        let task = tokio::spawn(worker.run());

        RenderHandle { input, state, task }
    }
}

/// Input side and observable state of a running scheduler. Dropping it stops the worker.
pub struct RenderHandle {
    input: watch::Sender<RenderRequest>,
    state: Arc<watch::Sender<RenderState>>,
    task: JoinHandle<()>,
}

impl RenderHandle {
    /// Records `markdown` as the latest input and returns its sequence number.
    ///
    /// Never waits for rendering. Blank input is committed as `""` right away, without running
    /// the pipeline.
    pub fn render(&self, markdown: impl Into<String>) -> u64 {
        let text = markdown.into();
        let mut seq = 0;
        self.input.send_modify(|request| {
            request.seq += 1;
            request.text = text;
            seq = request.seq;
            if request.is_blank() {
                self.state.send_if_modified(|state| commit(state, String::new(), seq));
            }
        });
        seq
    }

    pub fn state(&self) -> RenderState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.state.subscribe()
    }

    /// Stops the worker. Any render in flight is abandoned.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Worker {
    renderer: Arc<dyn PreviewRenderer>,
    debounce: Duration,
    input: watch::Receiver<RenderRequest>,
    state: Arc<watch::Sender<RenderState>>,
}

impl Worker {
    async fn run(mut self) {
        while self.input.changed().await.is_ok() {
            if self.cycle().await.is_err() {
                break;
            }
        }
        debug!("Render worker stopped");
    }

    /// Runs Scheduled → Rendering → Committing until a result is committed or the newest
    /// request turns out to be blank. `Err` means the input side is gone.
    async fn cycle(&mut self) -> Result<(), watch::error::RecvError> {
        loop {
            self.settle().await?;

            // Flag under the input lock so a blank commit can't land between the read and the flag.
            let request = {
                let input = self.input.borrow_and_update();
                if input.is_blank() {
                    return Ok(());
                }
                self.state.send_if_modified(|state| set_rendering(state, true));
                input.clone()
            };
            debug!(seq = request.seq, bytes = request.text.len(); "Rendering preview");
            let html = self.render(&request).await;

            // Compare and commit under the input lock so no request can slip in between.
            let superseded_by = {
                let input = self.input.borrow();
                if input.seq == request.seq {
                    self.state
                        .send_if_modified(|state| commit(state, html, request.seq));
                    None
                } else {
                    Some(input.seq)
                }
            };
            match superseded_by {
                None => {
                    debug!(seq = request.seq; "Preview committed");
                    return Ok(());
                }
                Some(latest) => {
                    trace!(stale = request.seq, latest; "Discarding stale render");
                }
            }
        }
    }

    /// Waits until the input has been quiet for the debounce window.
    async fn settle(&mut self) -> Result<(), watch::error::RecvError> {
        loop {
            match time::timeout(self.debounce, self.input.changed()).await {
                Ok(changed) => changed?,
                Err(_) => return Ok(()),
            }
        }
    }

    async fn render(&self, request: &RenderRequest) -> String {
        let result = AssertUnwindSafe(self.renderer.render_preview(&request.text))
            .catch_unwind()
            .await;
        match result {
            Ok(Ok(html)) => html,
            Ok(Err(err)) => {
                error!(seq = request.seq, error:% = err; "Preview render failed");
                FALLBACK_ERROR_HTML.to_string()
            }
            Err(_) => {
                error!(seq = request.seq; "Preview render panicked");
                FALLBACK_ERROR_HTML.to_string()
            }
        }
    }
}

fn set_rendering(state: &mut RenderState, rendering: bool) -> bool {
    if state.is_rendering == rendering {
        return false;
    }
    state.is_rendering = rendering;
    true
}

fn commit(state: &mut RenderState, html: String, revision: u64) -> bool {
    let next = RenderState {
        html,
        is_rendering: false,
        revision,
    };
    if *state == next {
        return false;
    }
    *state = next;
    true
}
