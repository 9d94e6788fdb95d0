//! WebView configuration.
//!
//! [`WebViewOptions`] collects everything a platform web surface needs at
//! creation time: the bridge registrations, the resource provider, the
//! initialisation data made available to the page before any script runs,
//! and a handful of behavior flags. Options are built once, moved into
//! the surface, and never change afterwards.

use serde_json::Value;

use crate::bridge::{BridgeRegistry, Completion};
use crate::resource::{resource_provider_root, Resource, ResourceProvider};

/// Page-side bridge glue, injected at document start.
///
/// Defines `window.__GLAZE__` with the Promise-based `invoke`, event
/// emission and subscription, resource address lookup, and the private
/// hooks the native side drives (`_onEvent`, `_onResult`,
/// `_evalAndReport`). `postMessage` transport differs per web engine, so
/// both known carriers are probed.
const BOOTSTRAP_TEMPLATE: &str = r#"(function () {
  if (window.__GLAZE__) { return; }
  var pending = {};
  var nextCallId = 1;
  var listeners = {};
  function post(message) {
    var text = JSON.stringify(message);
    if (window.webkit && window.webkit.messageHandlers && window.webkit.messageHandlers.glaze) {
      window.webkit.messageHandlers.glaze.postMessage(text);
    } else if (window.chrome && window.chrome.webview) {
      window.chrome.webview.postMessage(text);
    }
  }
  window.__GLAZE__ = {
    initialisationData: __INIT_DATA__,
    invoke: function (name) {
      var args = Array.prototype.slice.call(arguments, 1);
      var callId = nextCallId++;
      return new Promise(function (resolve, reject) {
        pending[callId] = { resolve: resolve, reject: reject };
        post({ type: 'invoke', name: name, args: args, callId: callId });
      });
    },
    emitEvent: function (name, payload) {
      post({ type: 'event', name: name, payload: payload });
    },
    addEventListener: function (name, handler) {
      (listeners[name] = listeners[name] || []).push(handler);
    },
    getResourceAddress: function (path) {
      return '__RESOURCE_ROOT__' + path;
    },
    _onEvent: function (name, payload) {
      (listeners[name] || []).forEach(function (handler) { handler(payload); });
    },
    _onResult: function (callId, outcome) {
      var entry = pending[callId];
      if (!entry) { return; }
      delete pending[callId];
      if (outcome && 'err' in outcome) { entry.reject(outcome.err); }
      else { entry.resolve(outcome ? outcome.ok : undefined); }
    },
    _evalAndReport: function (id, source) {
      try {
        post({ type: 'evalResult', id: id, ok: window.eval(source) });
      } catch (e) {
        post({ type: 'evalResult', id: id, err: { kind: 'exception', message: String(e) } });
      }
    }
  };
})();"#;

/// Configuration for a web surface.
#[derive(Default)]
pub struct WebViewOptions {
    native_integration: bool,
    keep_page_loaded_when_hidden: bool,
    dev_tools: bool,
    user_scripts: Vec<String>,
    initialisation_data: serde_json::Map<String, Value>,
    registry: BridgeRegistry,
    resource_provider: Option<ResourceProvider>,
    allowed_origin: Option<String>,
}

impl WebViewOptions {
    /// Create empty options. Native integration is off until
    /// [`with_native_integration`](Self::with_native_integration) enables
    /// it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the web/native bridge. Without this, no glue script is
    /// injected and registered functions and listeners are unreachable.
    pub fn with_native_integration(mut self) -> Self {
        self.native_integration = true;
        self
    }

    /// Keep the page loaded while the surface is hidden instead of
    /// showing a blank page.
    pub fn with_keep_page_loaded_when_hidden(mut self) -> Self {
        self.keep_page_loaded_when_hidden = true;
        self
    }

    /// Allow opening developer tools on the surface.
    pub fn with_dev_tools(mut self) -> Self {
        self.dev_tools = true;
        self
    }

    /// Append a script to run before any page resource loads, after the
    /// bridge glue. `window.__GLAZE__` is available to it.
    pub fn with_user_script(mut self, source: impl Into<String>) -> Self {
        self.user_scripts.push(source.into());
        self
    }

    /// Add one key/value pair to `window.__GLAZE__.initialisationData`,
    /// readable by the page before its first script executes.
    pub fn with_initialisation_data<T: serde::Serialize>(mut self, key: &str, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.initialisation_data.insert(key.to_string(), value);
            }
            Err(e) => log::error!("unserializable initialisation data for {key}: {e}"),
        }
        self
    }

    /// Register a native function callable from the page.
    pub fn with_native_function(
        mut self,
        name: impl Into<String>,
        function: impl Fn(&[Value], Completion) + 'static,
    ) -> Self {
        self.registry.register_function(name, function);
        self
    }

    /// Register a native listener for a named web-originated event.
    pub fn with_event_listener(
        mut self,
        name: impl Into<String>,
        listener: impl Fn(&Value) + 'static,
    ) -> Self {
        self.registry.register_listener(name, listener);
        self
    }

    /// Install the resource provider answering the surface's internal
    /// loader.
    pub fn with_resource_provider(
        mut self,
        provider: impl Fn(&str) -> Option<Resource> + 'static,
    ) -> Self {
        self.resource_provider = Some(Box::new(provider));
        self
    }

    /// Additionally allow pages served from `origin` to fetch provider
    /// resources. Used in dev-server mode so the externally served page
    /// can still reach `getResourceAddress` URLs.
    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = Some(origin.into());
        self
    }

    /// Whether the bridge is enabled.
    pub fn native_integration(&self) -> bool {
        self.native_integration
    }

    /// Whether the page stays loaded while hidden.
    pub fn keep_page_loaded_when_hidden(&self) -> bool {
        self.keep_page_loaded_when_hidden
    }

    /// Whether developer tools are allowed.
    pub fn dev_tools(&self) -> bool {
        self.dev_tools
    }

    /// The bridge registrations.
    pub fn registry(&self) -> &BridgeRegistry {
        &self.registry
    }

    /// Answer a resource request through the installed provider.
    ///
    /// `None` when no provider is installed or the provider reports the
    /// path unknown.
    pub fn resolve_resource(&self, path: &str) -> Option<Resource> {
        self.resource_provider.as_ref()?(path)
    }

    /// Whether a resource provider is installed.
    pub fn has_resource_provider(&self) -> bool {
        self.resource_provider.is_some()
    }

    /// The extra origin allowed to fetch provider resources, if any.
    pub fn allowed_origin(&self) -> Option<&str> {
        self.allowed_origin.as_deref()
    }

    /// Build the document-start script: bridge glue with the
    /// initialisation data baked in, followed by the user scripts.
    ///
    /// `None` when native integration is disabled; nothing is injected
    /// then and the page sees no `window.__GLAZE__`.
    pub fn bootstrap_script(&self) -> Option<String> {
        if !self.native_integration {
            return None;
        }

        let init = serde_json::to_string(&self.initialisation_data)
            .unwrap_or_else(|_| "{}".into());
        let mut script = BOOTSTRAP_TEMPLATE
            .replace("__INIT_DATA__", &init)
            .replace("__RESOURCE_ROOT__", resource_provider_root());

        for user_script in &self.user_scripts {
            script.push_str("\n;\n");
            script.push_str(user_script);
        }
        Some(script)
    }
}
