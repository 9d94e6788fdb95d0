//! Platform-native WebView embedding for Glaze GUIs.
//!
//! This crate turns a [`WebViewOptions`] configuration into a live web
//! surface inside a native plugin window: WKWebView on macOS, WebView2 on
//! Windows (placeholder). The platform-independent bridge and resource
//! machinery lives in `glaze-core`; this crate only supplies the engine
//! wiring.

pub mod platform;

pub use glaze_core::{resource_provider_root, Resource, WebSurface, WebViewOptions};
pub use glaze_core::{Result, WebViewError};

/// Content source for a web surface.
pub enum WebViewSource<'a> {
    /// Serve everything through the registered resource provider,
    /// navigating to [`resource_provider_root`].
    ResourceProvider,
    /// Navigate to a URL (dev server).
    Url(&'a str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_root_shape() {
        // The page glue concatenates paths directly onto the root.
        assert!(resource_provider_root().ends_with('/'));
        assert!(resource_provider_root().starts_with("glaze://"));
    }
}
