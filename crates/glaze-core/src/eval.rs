//! Script evaluation as an id-correlated request/response pair.
//!
//! A native-side evaluation request registers a one-shot callback in
//! [`PendingEvaluations`] under a fresh id and submits a wrapped script
//! to the page. The page-side glue runs the script, catches exceptions,
//! and posts an `evalResult` message back; the bridge dispatcher then
//! resolves the pending entry. Each request yields at most one delivery:
//! callbacks are `FnOnce` and removed from the map before they run.
//!
//! A request the page never answers (page not loaded, bridge glue
//! missing) simply never invokes its callback. There is no timeout or
//! cancellation; this mirrors the behavior of the underlying platform
//! evaluation APIs, which give no completion guarantee either.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Failure categories for a script evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationErrorKind {
    /// The submitted script threw.
    Exception,
    /// The page reported a failure it could not classify.
    Unknown,
}

/// Error descriptor delivered when an evaluation fails.
///
/// Only failures the page-side glue can observe are reported this way;
/// see the module docs for failures that produce no delivery at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationError {
    /// Failure category.
    pub kind: EvaluationErrorKind,
    /// Human-readable message from the page.
    pub message: String,
}

/// Outcome of one script evaluation.
pub type EvaluationResult = Result<serde_json::Value, EvaluationError>;

/// One-shot completion callback for an evaluation request.
pub type EvaluationCallback = Box<dyn FnOnce(EvaluationResult)>;

/// Outstanding evaluation requests, keyed by id.
///
/// Single-threaded: lives on the native event loop, interior mutability
/// via `RefCell`.
#[derive(Default)]
pub struct PendingEvaluations {
    next_id: Cell<u64>,
    pending: RefCell<HashMap<u64, EvaluationCallback>>,
}

impl PendingEvaluations {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a completion callback and return the fresh request id.
    pub fn register(&self, callback: EvaluationCallback) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.pending.borrow_mut().insert(id, callback);
        id
    }

    /// Deliver a result to the request with the given id.
    ///
    /// Returns `false` if the id is unknown or was already resolved;
    /// the result is dropped in that case. The callback is removed from
    /// the map before it runs, so a callback may itself register new
    /// requests.
    pub fn resolve(&self, id: u64, result: EvaluationResult) -> bool {
        let callback = self.pending.borrow_mut().remove(&id);
        match callback {
            Some(callback) => {
                callback(result);
                true
            }
            None => false,
        }
    }

    /// Number of requests still awaiting a result.
    pub fn outstanding(&self) -> usize {
        self.pending.borrow().len()
    }
}

/// Build the page-side request for one evaluation.
///
/// The script source travels JSON-escaped; the glue evaluates it and
/// reports the outcome under `id`.
pub fn eval_request_script(id: u64, script: &str) -> String {
    let escaped = serde_json::to_string(script).unwrap_or_else(|_| "\"\"".into());
    format!("window.__GLAZE__._evalAndReport({id},{escaped})")
}
