//! Native side of the web/native bridge.
//!
//! The bridge carries named messages in both directions:
//!
//! - web → native: JSON over the platform script-message channel, parsed
//!   and routed by [`dispatch_message`] — `invoke` calls a registered
//!   [`NativeFunction`] and resolves the page-side Promise, `event`
//!   notifies a registered [`EventListener`], `evalResult` completes an
//!   outstanding evaluation.
//! - native → web: script strings evaluated in the page through a
//!   [`ScriptSink`].
//!
//! Everything here runs on the native event loop; callbacks are plain
//! boxed closures with no `Send` bound.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::eval::{EvaluationError, EvaluationErrorKind, PendingEvaluations};

/// One-shot completion for a native function call.
///
/// `Ok(value)` resolves the page-side Promise, `Err(message)` rejects it.
pub type Completion = Box<dyn FnOnce(Result<Value, String>)>;

/// A native function callable from the page.
///
/// Receives the loosely-typed argument list and a completion to deliver
/// the asynchronous result through. The completion may be invoked after
/// the function returns.
pub type NativeFunction = Box<dyn Fn(&[Value], Completion)>;

/// A native listener for a named web-originated event.
pub type EventListener = Box<dyn Fn(&Value)>;

/// Channel for pushing script strings into the page.
///
/// Cloneable so deferred completions can outlive a single dispatch.
pub type ScriptSink = Rc<dyn Fn(String)>;

/// Named native functions and event listeners, registered at
/// configuration time and immutable afterwards.
#[derive(Default)]
pub struct BridgeRegistry {
    functions: HashMap<String, NativeFunction>,
    listeners: HashMap<String, EventListener>,
}

impl BridgeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function callable from the page as
    /// `window.__GLAZE__.invoke(name, args...)`.
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        function: impl Fn(&[Value], Completion) + 'static,
    ) {
        self.functions.insert(name.into(), Box::new(function));
    }

    /// Register a listener for events emitted from the page as
    /// `window.__GLAZE__.emitEvent(name, payload)`.
    pub fn register_listener(
        &mut self,
        name: impl Into<String>,
        listener: impl Fn(&Value) + 'static,
    ) {
        self.listeners.insert(name.into(), Box::new(listener));
    }

    /// Whether any function or listener is registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.listeners.is_empty()
    }
}

/// Route one incoming script message.
///
/// `raw` is the JSON text posted by the page glue. Replies (Promise
/// resolution, rejection) are pushed through `sink`. Malformed messages
/// are logged and dropped; nothing here panics on bad input.
pub fn dispatch_message(
    registry: &BridgeRegistry,
    pending: &PendingEvaluations,
    raw: &str,
    sink: &ScriptSink,
) {
    let Ok(msg) = serde_json::from_str::<Value>(raw) else {
        log::warn!("invalid bridge message JSON: {raw}");
        return;
    };

    let Some(msg_type) = msg.get("type").and_then(|t| t.as_str()) else {
        log::warn!("bridge message without type field");
        return;
    };

    match msg_type {
        "invoke" => {
            let Some(name) = msg.get("name").and_then(|v| v.as_str()) else {
                return;
            };
            let args = msg
                .get("args")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            let call_id = msg.get("callId").and_then(|v| v.as_u64()).unwrap_or(0);

            let reply = Rc::clone(sink);
            let completion: Completion = Box::new(move |outcome| {
                reply(result_script(call_id, outcome));
            });

            match registry.functions.get(name) {
                Some(function) => function(&args, completion),
                None => completion(Err(format!("unknown native function: {name}"))),
            }
        }
        "event" => {
            let Some(name) = msg.get("name").and_then(|v| v.as_str()) else {
                return;
            };
            let payload = msg.get("payload").cloned().unwrap_or(Value::Null);

            match registry.listeners.get(name) {
                Some(listener) => listener(&payload),
                None => log::debug!("no listener for event: {name}"),
            }
        }
        "evalResult" => {
            let Some(id) = msg.get("id").and_then(|v| v.as_u64()) else {
                return;
            };
            let result = match msg.get("err") {
                Some(err) => Err(evaluation_error(err)),
                None => Ok(msg.get("ok").cloned().unwrap_or(Value::Null)),
            };
            if !pending.resolve(id, result) {
                log::debug!("evalResult for unknown or completed request: {id}");
            }
        }
        _ => {
            log::debug!("unknown bridge message type: {msg_type}");
        }
    }
}

/// Build the Promise-settling reply for an `invoke` call.
fn result_script(call_id: u64, outcome: Result<Value, String>) -> String {
    match outcome {
        Ok(value) => {
            let json = serde_json::to_string(&value).unwrap_or_else(|_| "null".into());
            format!("window.__GLAZE__._onResult({call_id},{{\"ok\":{json}}})")
        }
        Err(message) => {
            let escaped = serde_json::to_string(&message).unwrap_or_default();
            format!("window.__GLAZE__._onResult({call_id},{{\"err\":{escaped}}})")
        }
    }
}

/// Decode the error descriptor of an `evalResult` message.
fn evaluation_error(err: &Value) -> EvaluationError {
    let kind = match err.get("kind").and_then(|v| v.as_str()) {
        Some("exception") => EvaluationErrorKind::Exception,
        _ => EvaluationErrorKind::Unknown,
    };
    let message = err
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    EvaluationError { kind, message }
}
