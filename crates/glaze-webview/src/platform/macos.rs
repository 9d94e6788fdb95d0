//! macOS WKWebView implementation.

use std::cell::Cell;
use std::ffi::c_void;
use std::ptr;
use std::rc::Rc;

use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2::{msg_send, AnyThread, ClassType, MainThreadMarker};
use objc2_app_kit::NSView;
use objc2_foundation::{NSPoint, NSRect, NSSize, NSString, NSURL, NSURLRequest};
use objc2_web_kit::{
    WKUserContentController, WKUserScript, WKUserScriptInjectionTime, WKWebView,
    WKWebViewConfiguration,
};

use glaze_core::{
    dispatch_message, eval_request_script, resource_provider_root, EvaluationCallback,
    PendingEvaluations, Rect, Result, ScriptSink, WebSurface, WebViewError, WebViewOptions,
    PROVIDER_SCHEME,
};

use super::{macos_ipc, macos_scheme};
use crate::WebViewSource;

/// Name of the script message channel the page glue posts to
/// (`window.webkit.messageHandlers.<name>`).
const MESSAGE_HANDLER_NAME: &str = "glaze";

/// State shared with the WebKit callback classes.
///
/// Heap-allocated behind a `Box` so the ivar pointers stay stable for
/// the surface's lifetime. Everything here is touched only from the main
/// thread.
struct SurfaceState {
    options: WebViewOptions,
    pending: PendingEvaluations,
    /// Back-pointer for evaluating reply scripts from message dispatch.
    /// Null until the WKWebView exists, nulled again on detach.
    webview: Cell<*const WKWebView>,
}

/// macOS WebView backed by WKWebView.
pub struct MacosWebView {
    webview: Retained<WKWebView>,
    state: Box<SurfaceState>,
    scheme_handler: Option<Retained<AnyObject>>,
    message_handler: Option<Retained<AnyObject>>,
    detached: bool,
}

impl MacosWebView {
    /// Attach a WKWebView to the given parent NSView and navigate it to
    /// the configured source.
    ///
    /// # Safety
    ///
    /// `parent` must be a valid `NSView` pointer provided by the plugin
    /// host. Must be called from the main thread.
    pub unsafe fn attach_to_parent(
        parent: *mut c_void,
        options: WebViewOptions,
        source: &WebViewSource<'_>,
    ) -> Result<Self> {
        if parent.is_null() {
            return Err(WebViewError::CreationFailed("null parent view".into()));
        }

        let mtm = MainThreadMarker::new().ok_or_else(|| {
            WebViewError::CreationFailed("must be called from the main thread".into())
        })?;

        // SAFETY: caller guarantees `parent` is a valid NSView pointer.
        let parent_view: &NSView = unsafe { &*(parent as *const NSView) };
        let frame = parent_view.frame();

        let state = Box::new(SurfaceState {
            options,
            pending: PendingEvaluations::new(),
            webview: Cell::new(ptr::null()),
        });

        // SAFETY: WKWebViewConfiguration::new is safe when called on the main thread.
        let wk_config = unsafe { WKWebViewConfiguration::new(mtm) };

        // Resource provider: route glaze:// requests through the options.
        let scheme_handler = if state.options.has_resource_provider() {
            // SAFETY: the options live in the boxed state, which outlives
            // the handler's context (cleared in detach before the box drops).
            let handler = unsafe {
                macos_scheme::new_scheme_handler(&state.options as *const WebViewOptions, mtm)
            };
            let scheme = NSString::from_str(PROVIDER_SCHEME);
            // SAFETY: handler conforms to WKURLSchemeHandler; scheme is a
            // valid custom (non-WebKit-reserved) scheme name.
            unsafe {
                let _: () = msg_send![
                    &*wk_config,
                    setURLSchemeHandler: &*handler,
                    forURLScheme: &*scheme
                ];
            }
            Some(handler)
        } else {
            None
        };

        // Bridge glue: document-start bootstrap plus the message channel.
        let message_handler = match state.options.bootstrap_script() {
            Some(bootstrap) => {
                // SAFETY: userContentController on a fresh configuration is valid.
                let controller: Retained<WKUserContentController> =
                    unsafe { msg_send![&*wk_config, userContentController] };

                let source_str = NSString::from_str(&bootstrap);
                // SAFETY: standard WKUserScript construction; document-start,
                // main frame only.
                let user_script = unsafe {
                    WKUserScript::initWithSource_injectionTime_forMainFrameOnly(
                        WKUserScript::alloc(),
                        &source_str,
                        WKUserScriptInjectionTime::AtDocumentStart,
                        true,
                    )
                };
                // SAFETY: controller and script are valid.
                unsafe { controller.addUserScript(&user_script) };

                let state_ptr = &*state as *const SurfaceState as *mut c_void;
                // SAFETY: callback and context stay valid until detach
                // clears the context.
                let handler =
                    unsafe { macos_ipc::new_message_handler(on_script_message, state_ptr, mtm) };
                let name = NSString::from_str(MESSAGE_HANDLER_NAME);
                // SAFETY: handler conforms to WKScriptMessageHandler.
                unsafe {
                    let _: () = msg_send![
                        &*controller,
                        addScriptMessageHandler: &*handler,
                        name: &*name
                    ];
                }
                Some(handler)
            }
            None => None,
        };

        // SAFETY: frame and wk_config are valid; we are on the main thread.
        let webview =
            unsafe { WKWebView::initWithFrame_configuration(mtm.alloc(), frame, &wk_config) };

        if state.options.dev_tools() {
            // SAFETY: setInspectable is safe to call on a valid WKWebView.
            unsafe { webview.setInspectable(true) };
        }

        let url_string = match source {
            WebViewSource::ResourceProvider => {
                if scheme_handler.is_none() {
                    return Err(WebViewError::CreationFailed(
                        "resource-provider source without a resource provider".into(),
                    ));
                }
                resource_provider_root()
            }
            WebViewSource::Url(url) => url,
        };
        let Some(ns_url) = NSURL::URLWithString(&NSString::from_str(url_string)) else {
            return Err(WebViewError::CreationFailed(format!(
                "invalid URL: {url_string}"
            )));
        };
        // SAFETY: ns_url is a valid NSURL; the request is consumed by
        // loadRequest on the main thread.
        unsafe {
            let request: Retained<NSURLRequest> =
                msg_send![NSURLRequest::class(), requestWithURL: &*ns_url];
            let _: *mut AnyObject = msg_send![&*webview, loadRequest: &*request];
        }

        parent_view.addSubview(&webview);

        state.webview.set(&*webview as *const WKWebView);

        Ok(Self {
            webview,
            state,
            scheme_handler,
            message_handler,
            detached: false,
        })
    }

    /// Remove the WebView from its parent and disconnect the WebKit
    /// callbacks from the surface state.
    ///
    /// Idempotent; also runs on drop.
    pub fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;

        // Disconnect callbacks before anything is freed. Late scheme
        // tasks 404, late messages are dropped.
        self.state.webview.set(ptr::null());
        if let Some(handler) = &self.scheme_handler {
            // SAFETY: handler was created by new_scheme_handler; main thread.
            unsafe { macos_scheme::clear_context(handler) };
        }
        if let Some(handler) = &self.message_handler {
            // SAFETY: handler was created by new_message_handler; main thread.
            unsafe { macos_ipc::clear_context(handler) };

            // Break the content controller's retain on the handler.
            // SAFETY: configuration and controller are valid for a live webview.
            unsafe {
                let config: Retained<WKWebViewConfiguration> =
                    msg_send![&*self.webview, configuration];
                let controller: Retained<WKUserContentController> =
                    msg_send![&*config, userContentController];
                let name = NSString::from_str(MESSAGE_HANDLER_NAME);
                let _: () = msg_send![&*controller, removeScriptMessageHandlerForName: &*name];
            }
        }

        self.webview.removeFromSuperview();
    }
}

impl Drop for MacosWebView {
    fn drop(&mut self) {
        self.detach();
    }
}

impl WebSurface for MacosWebView {
    fn is_visible(&self) -> bool {
        self.webview.window().is_some() && !self.webview.isHiddenOrHasHiddenAncestor()
    }

    fn emit_event(&self, name: &str, payload: &serde_json::Value) {
        let name_json = serde_json::to_string(name).unwrap_or_default();
        let payload_json = serde_json::to_string(payload).unwrap_or_else(|_| "null".into());
        evaluate_in_page(
            &self.webview,
            &format!("window.__GLAZE__._onEvent({name_json},{payload_json})"),
        );
    }

    fn evaluate(&self, script: &str, callback: EvaluationCallback) {
        let id = self.state.pending.register(callback);
        evaluate_in_page(&self.webview, &eval_request_script(id, script));
    }

    fn set_bounds(&mut self, bounds: Rect) {
        let frame = NSRect::new(
            NSPoint::new(bounds.x as f64, bounds.y as f64),
            NSSize::new(bounds.width as f64, bounds.height as f64),
        );
        self.webview.setFrame(frame);
    }
}

/// Fire-and-forget script evaluation in the page's context.
///
/// Results and errors travel back over the message channel (see
/// `glaze_core::eval`), so no completion handler is installed here.
fn evaluate_in_page(webview: &WKWebView, script: &str) {
    let source = NSString::from_str(script);
    // SAFETY: webview is valid; nil completion handler is allowed.
    unsafe {
        let _: () = msg_send![
            webview,
            evaluateJavaScript: &*source,
            completionHandler: ptr::null_mut::<AnyObject>()
        ];
    }
}

/// Message callback: routes JSON posted by the page glue.
unsafe extern "C-unwind" fn on_script_message(context: *mut c_void, json: *const u8, len: usize) {
    if context.is_null() || json.is_null() {
        return;
    }

    // SAFETY: context is the SurfaceState pointer set in attach_to_parent;
    // it stays valid until detach nulls the handler context.
    let state = unsafe { &*(context as *const SurfaceState) };
    // SAFETY: json/len describe the UTF-8 buffer of the message NSString.
    let bytes = unsafe { std::slice::from_raw_parts(json, len) };
    let Ok(raw) = std::str::from_utf8(bytes) else {
        log::warn!("non-UTF-8 bridge message dropped");
        return;
    };

    let webview = state.webview.get();
    if webview.is_null() {
        return;
    }

    // Replies evaluate back into the page. The raw pointer stays valid
    // while the handler context is set; detach clears both together.
    let sink: ScriptSink = Rc::new(move |script: String| {
        // SAFETY: see above.
        let webview = unsafe { &*webview };
        evaluate_in_page(webview, &script);
    });

    dispatch_message(state.options.registry(), &state.pending, raw, &sink);
}
