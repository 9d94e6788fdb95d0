//! Custom URL scheme handler answering through the resource provider.
//!
//! WebKit intercepts every `glaze://` request and hands it to an
//! instance of this class, which forwards the request path to the
//! [`WebViewOptions`] resource provider and streams the resolved bytes
//! back. The ObjC class uses a fixed name (`GlazeSchemeHandler`): the
//! method implementations are identical for every instance and only
//! forward through a per-instance options pointer stored in an ivar, so
//! sharing the class between surfaces (or between plugins built with
//! different Glaze versions) is benign.
//!
//! Path interpretation (root-document defaulting, separator stripping)
//! belongs to the resource provider, not this handler: the provider
//! receives the URL path verbatim.

use std::ffi::{c_void, CStr};

use objc2::rc::Retained;
use objc2::runtime::{AnyClass, AnyObject, AnyProtocol, ClassBuilder, Sel};
use objc2::{msg_send, sel, AnyThread, ClassType, MainThreadMarker};
use objc2_foundation::{
    NSData, NSDictionary, NSHTTPURLResponse, NSInteger, NSObject, NSString, NSURL, NSURLRequest,
};

use glaze_core::WebViewOptions;

/// Ivar name for the `*const WebViewOptions` pointer on each handler instance.
const OPTIONS_IVAR: &CStr = c"_glazeOptions";

/// Get or register the GlazeSchemeHandler ObjC class.
///
/// Must be called from the main thread (class registration is not thread-safe).
fn scheme_handler_class() -> &'static AnyClass {
    let c_name = c"GlazeSchemeHandler";

    if let Some(existing) = AnyClass::get(c_name) {
        return existing;
    }

    let superclass = NSObject::class();
    let mut builder = match ClassBuilder::new(c_name, superclass) {
        Some(b) => b,
        // Another thread (or re-entrant call) registered the class between
        // our AnyClass::get check and this point. Look it up again.
        None => {
            return AnyClass::get(c_name)
                .expect("class must exist after ClassBuilder::new returned None");
        }
    };

    // Ivar: raw pointer to the surface's options (resource provider).
    builder.add_ivar::<*const c_void>(OPTIONS_IVAR);

    // Declare WKURLSchemeHandler protocol conformance.
    let proto = AnyProtocol::get(c"WKURLSchemeHandler")
        .expect("WKURLSchemeHandler protocol must be available");
    builder.add_protocol(proto);

    // SAFETY: the method signatures match the WKURLSchemeHandler protocol.
    // Raw pointers are used for the receiver to satisfy HRTB requirements.
    unsafe {
        builder.add_method(
            sel!(webView:startURLSchemeTask:),
            start_url_scheme_task
                as unsafe extern "C-unwind" fn(*mut AnyObject, Sel, *const AnyObject, *const AnyObject),
        );
        builder.add_method(
            sel!(webView:stopURLSchemeTask:),
            stop_url_scheme_task
                as unsafe extern "C-unwind" fn(*mut AnyObject, Sel, *const AnyObject, *const AnyObject),
        );
    }

    builder.register()
}

/// Allocate a scheme handler instance serving the given options'
/// resource provider.
///
/// # Safety
///
/// Must be called from the main thread. `options` must remain valid
/// until [`clear_context`] is called on the returned handler.
pub unsafe fn new_scheme_handler(
    options: *const WebViewOptions,
    _mtm: MainThreadMarker,
) -> Retained<AnyObject> {
    let cls = scheme_handler_class();

    // SAFETY: standard ObjC alloc + init pattern.
    let obj: *mut AnyObject = unsafe { msg_send![cls, alloc] };
    // SAFETY: init on a freshly allocated object.
    let obj: *mut AnyObject = unsafe { msg_send![obj, init] };
    assert!(!obj.is_null(), "alloc+init returned nil");

    let ivar = cls
        .instance_variable(OPTIONS_IVAR)
        .expect("_glazeOptions ivar must exist");
    // SAFETY: obj is a freshly init'd instance of cls, which declares this
    // ivar. No Retained/shared reference exists yet, so the *mut write is sound.
    unsafe {
        let ptr: *mut *const c_void = ivar.load_ptr(&*obj);
        *ptr = options as *const c_void;
    }

    // SAFETY: alloc+init returned a +1 retained, non-null object.
    unsafe { Retained::from_raw(obj) }.unwrap()
}

/// Null out the handler's options pointer so late tasks get a 404.
///
/// # Safety
///
/// `handler` must be an instance created by [`new_scheme_handler`].
/// Must be called from the main thread.
pub unsafe fn clear_context(handler: &AnyObject) {
    let Some(ivar) = handler.class().instance_variable(OPTIONS_IVAR) else {
        return;
    };
    // SAFETY: caller guarantees `handler` is one of ours; the ivar holds
    // a *const c_void and no other thread touches it (main thread only).
    unsafe {
        let ptr: *mut *const c_void = ivar.load_ptr(handler);
        *ptr = std::ptr::null();
    }
}

// ---------------------------------------------------------------------------
// ObjC method implementations
// ---------------------------------------------------------------------------

/// Read the `_glazeOptions` ivar from a handler instance.
///
/// # Safety
///
/// `this` must be a valid instance of the scheme handler class.
unsafe fn load_options(this: &AnyObject) -> Option<&WebViewOptions> {
    let ivar = this.class().instance_variable(OPTIONS_IVAR)?;
    // SAFETY: the ivar was written in `new_scheme_handler` or nulled in
    // `clear_context`.
    let raw: *const c_void = unsafe { *ivar.load_ptr::<*const c_void>(this) };
    if raw.is_null() {
        return None;
    }
    // SAFETY: raw was set from a WebViewOptions pointer that the surface
    // keeps alive until clear_context.
    Some(unsafe { &*(raw as *const WebViewOptions) })
}

/// `webView:startURLSchemeTask:` implementation.
unsafe extern "C-unwind" fn start_url_scheme_task(
    this: *mut AnyObject,
    _cmd: Sel,
    _webview: *const AnyObject,
    task: *const AnyObject,
) {
    // SAFETY: WebKit provides a valid receiver pointer.
    let this: &AnyObject = unsafe { &*this };
    // SAFETY: WebKit provides a valid task pointer.
    let task: &AnyObject = unsafe { &*task };

    // SAFETY: task conforms to WKURLSchemeTask; request returns a valid object.
    let request: *const NSURLRequest = unsafe { msg_send![task, request] };
    // SAFETY: request is a valid NSURLRequest.
    let url_opt: Option<Retained<NSURL>> = unsafe { msg_send![request, URL] };
    let Some(url) = url_opt else { return };

    // NSURL::path() returns the decoded path component, stripping query
    // strings, fragments and percent-encoding. The provider receives it
    // verbatim (normalization is its contract).
    let path = url.path().map(|p| p.to_string()).unwrap_or_default();

    // Keep absoluteString for the HTTP response URL.
    let url_string = url.absoluteString().map(|s| s.to_string());
    let response_url = url_string.as_deref().unwrap_or("glaze://localhost/");

    // SAFETY: this is a valid scheme handler instance with an options ivar.
    let options = unsafe { load_options(this) };
    let resource = options.and_then(|options| options.resolve_resource(&path));
    // Dev-server pages fetch provider resources cross-origin.
    let allowed_origin = options.and_then(|options| options.allowed_origin());

    match resource {
        Some(resource) => respond(
            task,
            response_url,
            200,
            &resource.mime,
            &resource.data,
            allowed_origin,
        ),
        // The provider already logged the miss.
        None => respond(task, response_url, 404, "text/plain", b"Not Found", allowed_origin),
    }
}

/// `webView:stopURLSchemeTask:` implementation.
///
/// No-op: our `start` handler is fully synchronous and never yields the run
/// loop, so `stop` can only be called after `didFinish` has already been sent.
unsafe extern "C-unwind" fn stop_url_scheme_task(
    _this: *mut AnyObject,
    _cmd: Sel,
    _webview: *const AnyObject,
    _task: *const AnyObject,
) {
}

/// Send an HTTP response back to the scheme task.
fn respond(
    task: &AnyObject,
    url_string: &str,
    status: i32,
    mime: &str,
    body: &[u8],
    allowed_origin: Option<&str>,
) {
    let Some(ns_url) = NSURL::URLWithString(&NSString::from_str(url_string)) else {
        log::error!("failed to construct response URL: {url_string}");
        return;
    };

    let content_type_key = NSString::from_str("Content-Type");
    let content_type_val = NSString::from_str(mime);
    let cors_key = NSString::from_str("Access-Control-Allow-Origin");
    let cors_val = allowed_origin.map(NSString::from_str);

    let mut keys: Vec<&NSString> = vec![&content_type_key];
    let mut vals: Vec<&NSString> = vec![&content_type_val];
    if let Some(origin) = &cors_val {
        keys.push(&cors_key);
        vals.push(origin);
    }
    let headers: Retained<NSDictionary<NSString, NSString>> =
        NSDictionary::from_slices(&keys, &vals);

    let Some(response) = NSHTTPURLResponse::initWithURL_statusCode_HTTPVersion_headerFields(
        NSHTTPURLResponse::alloc(),
        &ns_url,
        status as NSInteger,
        None,
        Some(&headers),
    ) else {
        log::error!("failed to construct HTTP response for: {url_string}");
        return;
    };

    let ns_data = NSData::with_bytes(body);

    // SAFETY: response and data are valid; task has not been stopped.
    unsafe {
        let _: () = msg_send![task, didReceiveResponse: &*response];
        let _: () = msg_send![task, didReceiveData: &*ns_data];
        let _: () = msg_send![task, didFinish];
    }
}
