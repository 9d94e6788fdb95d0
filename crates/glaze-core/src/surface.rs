//! The web surface seam.
//!
//! View-host logic talks to the embedded web engine through this trait
//! only, so it does not hard-code a particular platform component. The
//! platform crates provide the real implementations; tests provide fakes.

use serde_json::Value;

use crate::eval::EvaluationCallback;
use crate::geometry::Rect;

/// An embedded web-rendering surface.
///
/// All methods are invoked from the native event loop. Implementations
/// internally own the page and its engine; only the bridge-facing
/// operations are exposed here.
pub trait WebSurface {
    /// Whether the surface is currently visible on screen.
    fn is_visible(&self) -> bool;

    /// Push a named event with a payload into the page.
    ///
    /// Delivery is asynchronous and fire-and-forget. Callers gate on
    /// [`is_visible`](Self::is_visible) when an event should be dropped,
    /// not queued, while the surface is hidden.
    fn emit_event(&self, name: &str, payload: &Value);

    /// Submit a script for evaluation in the page's context.
    ///
    /// The callback receives the result or error descriptor at most
    /// once. If the page never answers (not loaded, bridge disabled),
    /// the callback is never invoked.
    fn evaluate(&self, script: &str, callback: EvaluationCallback);

    /// Place the surface within its parent window.
    fn set_bounds(&mut self, bounds: Rect);
}
