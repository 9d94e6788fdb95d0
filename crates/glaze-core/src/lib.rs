//! Core abstractions for the Glaze webview GUI layer.
//!
//! Platform-independent pieces of the web/native bridge: resource types,
//! bridge message routing, evaluation bookkeeping, configuration, and the
//! [`WebSurface`] seam the platform crates implement. Everything here
//! builds and tests on any target; the platform-specific embedding lives
//! in `glaze-webview`.

pub mod bridge;
pub mod error;
pub mod eval;
pub mod geometry;
pub mod mime;
pub mod options;
pub mod resource;
pub mod surface;

pub use bridge::{
    dispatch_message, BridgeRegistry, Completion, EventListener, NativeFunction, ScriptSink,
};
pub use error::{Result, WebViewError};
pub use eval::{
    eval_request_script, EvaluationCallback, EvaluationError, EvaluationErrorKind,
    EvaluationResult, PendingEvaluations,
};
pub use geometry::{Rect, Size};
pub use mime::mime_for_path;
pub use options::WebViewOptions;
pub use resource::{resource_provider_root, Resource, ResourceProvider, PROVIDER_SCHEME};
pub use surface::WebSurface;
