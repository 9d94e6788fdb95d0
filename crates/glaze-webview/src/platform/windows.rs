//! Windows WebView2 implementation.

use glaze_core::{Result, WebViewError, WebViewOptions};

use crate::WebViewSource;

/// Windows WebView backed by WebView2.
pub struct WindowsWebView {
    _private: (),
}

impl WindowsWebView {
    /// Attach a WebView2 to the given parent HWND.
    ///
    /// # Safety
    ///
    /// `parent` must be a valid `HWND` provided by the plugin host.
    pub unsafe fn attach_to_parent(
        _parent: *mut std::ffi::c_void,
        _options: WebViewOptions,
        _source: &WebViewSource<'_>,
    ) -> Result<Self> {
        Err(WebViewError::PlatformNotSupported)
    }

    /// Remove the WebView from its parent.
    pub fn detach(&mut self) {}
}
