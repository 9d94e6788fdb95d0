//! Script-message plumbing: the WKScriptMessageHandler class.
//!
//! The ObjC class uses a fixed name (`GlazeMessageHandler`) shared across
//! all Glaze surfaces in a process. This is safe because the method
//! implementation is identical for every instance - it simply forwards
//! the message body to a per-instance callback function pointer stored
//! in ivars. If two plugins built with different Glaze versions load in
//! the same host process, the first-registered class wins, but since the
//! signatures and forwarding behavior are the same, this is benign.

use std::ffi::{c_void, CStr};

use objc2::rc::Retained;
use objc2::runtime::{AnyClass, AnyObject, ClassBuilder, Sel};
use objc2::{msg_send, sel, ClassType, MainThreadMarker};
use objc2_foundation::NSObject;

/// Callback invoked with the UTF-8 JSON body of a script message.
pub type MessageCallback = unsafe extern "C-unwind" fn(context: *mut c_void, json: *const u8, len: usize);

const MSG_CALLBACK_IVAR: &CStr = c"_glazeMsgCallback";
const MSG_CONTEXT_IVAR: &CStr = c"_glazeMsgContext";

/// Get or register the GlazeMessageHandler ObjC class.
fn message_handler_class() -> &'static AnyClass {
    let c_name = c"GlazeMessageHandler";

    if let Some(existing) = AnyClass::get(c_name) {
        return existing;
    }

    let superclass = NSObject::class();
    let mut builder = match ClassBuilder::new(c_name, superclass) {
        Some(b) => b,
        None => {
            return AnyClass::get(c_name)
                .expect("class must exist after ClassBuilder::new returned None");
        }
    };

    // Ivars for callback function pointer and context.
    builder.add_ivar::<*const c_void>(MSG_CALLBACK_IVAR);
    builder.add_ivar::<*mut c_void>(MSG_CONTEXT_IVAR);

    // SAFETY: method signature matches the WKScriptMessageHandler protocol.
    unsafe {
        builder.add_method(
            sel!(userContentController:didReceiveScriptMessage:),
            did_receive_script_message
                as unsafe extern "C-unwind" fn(*mut AnyObject, Sel, *const AnyObject, *const AnyObject),
        );
    }

    builder.register()
}

/// `userContentController:didReceiveScriptMessage:` implementation.
unsafe extern "C-unwind" fn did_receive_script_message(
    this: *mut AnyObject,
    _cmd: Sel,
    _controller: *const AnyObject,
    message: *const AnyObject,
) {
    // SAFETY: WebKit provides a valid receiver pointer.
    let this: &AnyObject = unsafe { &*this };
    // SAFETY: WebKit provides a valid message pointer.
    let message: &AnyObject = unsafe { &*message };

    // SAFETY: WKScriptMessage has a `body` property.
    let body: *const AnyObject = unsafe { msg_send![message, body] };
    if body.is_null() {
        return;
    }

    // SAFETY: body is a valid NSString from postMessage(JSON.stringify(...)).
    let utf8: *const u8 = unsafe { msg_send![body, UTF8String] };
    if utf8.is_null() {
        return;
    }
    // SAFETY: NSUTF8StringEncoding = 4; body is a valid NSString.
    let len: usize = unsafe { msg_send![body, lengthOfBytesUsingEncoding: 4u64] };

    let callback_ivar = this.class().instance_variable(MSG_CALLBACK_IVAR);
    let context_ivar = this.class().instance_variable(MSG_CONTEXT_IVAR);

    let (Some(cb_ivar), Some(ctx_ivar)) = (callback_ivar, context_ivar) else {
        return;
    };

    // SAFETY: ivar was written in new_message_handler or cleared in
    // clear_context; both store a valid value of this type.
    let cb_ptr: *const c_void = unsafe { *cb_ivar.load_ptr::<*const c_void>(this) };
    // SAFETY: same as above.
    let ctx: *mut c_void = unsafe { *ctx_ivar.load_ptr::<*mut c_void>(this) };

    if cb_ptr.is_null() || ctx.is_null() {
        return;
    }

    // SAFETY: cb_ptr was set from a valid MessageCallback function pointer.
    let callback: MessageCallback = unsafe { std::mem::transmute(cb_ptr) };
    // SAFETY: callback and context are valid per new_message_handler contract.
    unsafe { callback(ctx, utf8, len) };
}

/// Allocate a GlazeMessageHandler instance.
///
/// # Safety
///
/// Must be called from the main thread. `callback` and `context` must
/// remain valid until [`clear_context`] is called or the handler is
/// removed from the content controller.
pub unsafe fn new_message_handler(
    callback: MessageCallback,
    context: *mut c_void,
    _mtm: MainThreadMarker,
) -> Retained<AnyObject> {
    let cls = message_handler_class();

    // SAFETY: standard ObjC alloc pattern on a class we just built.
    let obj: *mut AnyObject = unsafe { msg_send![cls, alloc] };
    // SAFETY: init on a freshly allocated object.
    let obj: *mut AnyObject = unsafe { msg_send![obj, init] };
    assert!(!obj.is_null(), "alloc+init returned nil");

    let cb_ivar = cls
        .instance_variable(MSG_CALLBACK_IVAR)
        .expect("callback ivar must exist");
    let ctx_ivar = cls
        .instance_variable(MSG_CONTEXT_IVAR)
        .expect("context ivar must exist");

    // SAFETY: obj is a freshly init'd instance; no Retained/shared ref exists yet.
    unsafe {
        let ptr: *mut *const c_void = cb_ivar.load_ptr(&*obj);
        *ptr = callback as *const c_void;
        let ptr: *mut *mut c_void = ctx_ivar.load_ptr(&*obj);
        *ptr = context;
    }

    // SAFETY: alloc+init returned a +1 retained, non-null object.
    unsafe { Retained::from_raw(obj) }.unwrap()
}

/// Null out the handler's context so late messages are dropped.
///
/// Called during surface teardown, before the context is freed. WebKit
/// may still hold the handler afterwards; with a null context the
/// forwarding method becomes a no-op.
///
/// # Safety
///
/// `handler` must be an instance created by [`new_message_handler`].
/// Must be called from the main thread.
pub unsafe fn clear_context(handler: &AnyObject) {
    let Some(ctx_ivar) = handler.class().instance_variable(MSG_CONTEXT_IVAR) else {
        return;
    };
    // SAFETY: caller guarantees `handler` is one of ours; the ivar holds
    // a *mut c_void and no other thread touches it (main thread only).
    unsafe {
        let ptr: *mut *mut c_void = ctx_ivar.load_ptr(handler);
        *ptr = std::ptr::null_mut();
    }
}
