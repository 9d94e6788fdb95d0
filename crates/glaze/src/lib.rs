//! # Glaze
//!
//! WebView GUI layer for audio plugin editors.
//!
//! Glaze embeds a platform web surface inside a native plugin window and
//! bridges it to native code: a resource provider answers the page's
//! load requests, named native functions and events cross the bridge in
//! both directions, and script evaluation results come back as
//! id-correlated responses.
//!
//! ## Architecture
//!
//! ```text
//! Your editor (owns counters, labels, layout)
//!        ↓ WebSurface trait
//! PlatformWebView (WKWebView / WebView2)
//!        ↓
//! window.__GLAZE__ page glue
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use glaze::prelude::*;
//!
//! let options = WebViewOptions::new()
//!     .with_native_integration()
//!     .with_native_function("nativeFunc", |args, complete| {
//!         let v = args.first().and_then(|v| v.as_i64()).unwrap_or(0);
//!         complete(Ok(serde_json::json!(v + 1)));
//!     })
//!     .with_resource_provider(|path| { /* answer with bytes + MIME */ None });
//!
//! // SAFETY: parent is the host-provided platform view, main thread.
//! let surface = unsafe {
//!     PlatformWebView::attach_to_parent(parent, options, &WebViewSource::ResourceProvider)
//! }?;
//! ```

// Re-export sub-crates
pub use glaze_core as core;
pub use glaze_webview as webview;

/// Prelude module for convenient imports.
///
/// Import everything you need to build a webview editor:
/// ```rust,ignore
/// use glaze::prelude::*;
/// ```
pub mod prelude {
    // Core traits and types
    pub use glaze_core::{
        // Bridge
        dispatch_message, BridgeRegistry, Completion, EventListener, NativeFunction, ScriptSink,
        // Evaluation
        eval_request_script, EvaluationCallback, EvaluationError, EvaluationErrorKind,
        EvaluationResult, PendingEvaluations,
        // Geometry
        Rect, Size,
        // Resources
        mime_for_path, resource_provider_root, Resource, ResourceProvider, PROVIDER_SCHEME,
        // Configuration and the surface seam
        WebSurface, WebViewOptions,
        // Error types
        Result, WebViewError,
    };

    // Platform layer
    pub use glaze_webview::WebViewSource;

    #[cfg(any(target_os = "macos", target_os = "windows"))]
    pub use glaze_webview::platform::PlatformWebView;
}
