//! The demo editor: web surface plus two trigger buttons and two status
//! labels.
//!
//! The editor owns the counters and all display text. Bridge callbacks
//! write display state through a shared handle; the host toolkit mirrors
//! it into its widgets and forwards button activations and resizes to
//! the methods here. Everything runs on the native event loop.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use glaze::prelude::{Rect, Result, Size, WebSurface, WebViewOptions, WebViewSource};
use serde_json::Value;

use crate::resources::ResourceRegistry;

/// Height of each native control strip.
const CONTROL_ROW_HEIGHT: i32 = 32;

/// Initial window size.
pub const INITIAL_SIZE: Size = Size::new(400, 300);

/// Dev server address for hot-reload builds. The embedded surface does
/// not connect to `localhost`; the loopback IP is required.
#[cfg(feature = "hot-reload")]
pub const DEV_SERVER_URL: &str = "http://127.0.0.1:5500/";

/// Content source selected at compile time.
pub fn content_source() -> WebViewSource<'static> {
    #[cfg(feature = "hot-reload")]
    return WebViewSource::Url(DEV_SERVER_URL);

    #[cfg(not(feature = "hot-reload"))]
    WebViewSource::ResourceProvider
}

/// Display state shared between the editor and the bridge callbacks.
#[derive(Debug)]
pub struct EditorShared {
    /// Text of the label fed by the `clickOnFrontend` listener.
    pub listener_label: String,
    /// Text of the label fed by `nativeFunc` calls.
    pub native_func_label: String,
    /// Caption of the evaluate button, updated with each result.
    pub evaluate_button_label: String,
}

impl Default for EditorShared {
    fn default() -> Self {
        Self {
            listener_label: String::new(),
            native_func_label: String::new(),
            evaluate_button_label: "call 'evaluate()'".into(),
        }
    }
}

/// Control regions computed for one window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorLayout {
    /// Area left for the web surface.
    pub web_surface: Rect,
    /// Left half of the button row.
    pub emit_button: Rect,
    /// Right half of the button row.
    pub evaluate_button: Rect,
    /// Listener status label strip.
    pub listener_label: Rect,
    /// Native-function status label strip.
    pub native_func_label: Rect,
}

/// Carve a window into the control strips and the web surface area.
///
/// From the bottom up: native-function label, listener label, button row
/// split into halves. The web surface fills whatever remains.
pub fn layout(size: Size) -> EditorLayout {
    let mut area = Rect::from_size(size);
    let native_func_label = area.remove_from_bottom(CONTROL_ROW_HEIGHT);
    let listener_label = area.remove_from_bottom(CONTROL_ROW_HEIGHT);
    let mut button_row = area.remove_from_bottom(CONTROL_ROW_HEIGHT);
    let emit_button = button_row.remove_from_left(button_row.width / 2);

    EditorLayout {
        web_surface: area,
        emit_button,
        evaluate_button: button_row,
        listener_label,
        native_func_label,
    }
}

/// The demo editor.
pub struct BridgeDemoEditor<S: WebSurface> {
    surface: S,
    shared: Rc<RefCell<EditorShared>>,
    /// Payload counter for `clickOnBackend` emissions.
    emit_clicks: u64,
    /// Sequence number baked into each evaluated script.
    evaluate_calls: u64,
    size: Size,
}

impl<S: WebSurface> BridgeDemoEditor<S> {
    /// Build the bridge configuration and create the web surface through
    /// `create_surface`.
    pub fn new(
        registry: ResourceRegistry,
        create_surface: impl FnOnce(WebViewOptions) -> Result<S>,
    ) -> Result<Self> {
        let shared = Rc::new(RefCell::new(EditorShared::default()));
        let options = build_options(&shared, registry);
        let mut surface = create_surface(options)?;
        surface.set_bounds(layout(INITIAL_SIZE).web_surface);

        Ok(Self {
            surface,
            shared,
            emit_clicks: 0,
            evaluate_calls: 0,
            size: INITIAL_SIZE,
        })
    }

    /// Native emit-button activation.
    ///
    /// While the surface is visible, increments the click counter and
    /// pushes `clickOnBackend` with the new value. While hidden this is
    /// a no-op: nothing is queued and the counter does not move.
    pub fn emit_button_clicked(&mut self) {
        if !self.surface.is_visible() {
            return;
        }
        self.emit_clicks += 1;
        self.surface
            .emit_event("clickOnBackend", &Value::from(self.emit_clicks));
    }

    /// Native evaluate-button activation.
    ///
    /// Runs a script in the page and, when the result arrives, shows the
    /// numeric tail of the result text on the evaluate button. Failures
    /// are logged and leave the caption untouched.
    pub fn evaluate_button_clicked(&mut self) {
        self.evaluate_calls += 1;
        let script = format!(
            "document.getElementById('changedByBackendText').textContent = \
             'called by backend: ' + {}",
            self.evaluate_calls
        );

        let shared = Rc::clone(&self.shared);
        self.surface.evaluate(
            &script,
            Box::new(move |result| match result {
                Ok(value) => {
                    let count = trailing_int_value(&value_text(&value));
                    shared.borrow_mut().evaluate_button_label =
                        format!("call 'evaluate()': {count}");
                }
                Err(error) => {
                    log::debug!("evaluation failed ({:?}): {}", error.kind, error.message);
                }
            }),
        );
    }

    /// Window resize: recompute the layout and re-place the web surface.
    pub fn resized(&mut self, size: Size) {
        self.size = size;
        self.surface.set_bounds(layout(size).web_surface);
    }

    /// Current window size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Number of `clickOnBackend` events emitted so far.
    pub fn emit_clicks(&self) -> u64 {
        self.emit_clicks
    }

    /// Current display state for the host toolkit to mirror.
    pub fn display(&self) -> Ref<'_, EditorShared> {
        self.shared.borrow()
    }

    /// The underlying web surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }
}

/// Assemble the webview configuration: bridge registrations, resource
/// provider, initialisation data.
fn build_options(shared: &Rc<RefCell<EditorShared>>, registry: ResourceRegistry) -> WebViewOptions {
    let func_shared = Rc::clone(shared);
    let listener_shared = Rc::clone(shared);

    let options = WebViewOptions::new()
        .with_native_integration()
        .with_keep_page_loaded_when_hidden()
        .with_initialisation_data("h1", &"BridgeDemo")
        .with_native_function("nativeFunc", move |args, complete| {
            // Arguments are not validated; anything non-numeric counts as zero.
            let v = args.first().and_then(Value::as_i64).unwrap_or(0) + 1;
            func_shared.borrow_mut().native_func_label = format!("called by frontend: {v}");
            complete(Ok(Value::from(v)));
        })
        .with_event_listener("clickOnFrontend", move |payload| {
            listener_shared.borrow_mut().listener_label =
                format!("listen 'clickOnFrontend': {}", value_text(payload));
        })
        .with_resource_provider(move |path| registry.resolve(path));

    #[cfg(feature = "hot-reload")]
    let options = options.with_allowed_origin("http://127.0.0.1:5500");

    options
}

/// Render a bridge value as display text: strings verbatim, everything
/// else as JSON.
fn value_text(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

/// Extract the integer suffix of a string: trailing decimal digits with
/// an optional sign, 0 when there are none.
fn trailing_int_value(text: &str) -> i64 {
    let bytes = text.as_bytes();
    let mut start = bytes.len();
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    if start == bytes.len() {
        return 0;
    }

    let value: i64 = text[start..].parse().unwrap_or(0);
    if start > 0 && bytes[start - 1] == b'-' {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glaze::prelude::{
        dispatch_message, eval_request_script, EvaluationCallback, PendingEvaluations, ScriptSink,
    };
    use std::collections::VecDeque;

    /// Observable side of the fake surface, kept by the test.
    #[derive(Default)]
    struct FakeState {
        visible: bool,
        emitted: Vec<(String, Value)>,
        evaluated: Vec<String>,
        bounds: Option<Rect>,
    }

    /// Test double standing in for the platform web surface.
    struct FakeSurface {
        options: WebViewOptions,
        pending: PendingEvaluations,
        eval_ids: RefCell<VecDeque<u64>>,
        state: Rc<RefCell<FakeState>>,
    }

    impl FakeSurface {
        fn create(options: WebViewOptions, state: Rc<RefCell<FakeState>>) -> Result<Self> {
            Ok(Self {
                options,
                pending: PendingEvaluations::new(),
                eval_ids: RefCell::new(VecDeque::new()),
                state,
            })
        }

        /// Deliver a page-originated message to the bridge, as the
        /// platform message handler would.
        fn deliver(&self, raw: &str) {
            let state = Rc::clone(&self.state);
            let sink: ScriptSink = Rc::new(move |script| {
                state.borrow_mut().evaluated.push(script);
            });
            dispatch_message(self.options.registry(), &self.pending, raw, &sink);
        }

        /// Id of the oldest evaluation still awaiting its result.
        fn next_eval_id(&self) -> u64 {
            *self.eval_ids.borrow().front().expect("an evaluation is outstanding")
        }

        /// Answer the oldest outstanding evaluation via the message
        /// channel, as the page glue would.
        fn answer_eval(&self, body: &str) {
            let id = self.eval_ids.borrow_mut().pop_front().expect("an evaluation is outstanding");
            self.deliver(&format!(r#"{{"type":"evalResult","id":{id},{body}}}"#));
        }
    }

    impl WebSurface for FakeSurface {
        fn is_visible(&self) -> bool {
            self.state.borrow().visible
        }

        fn emit_event(&self, name: &str, payload: &Value) {
            self.state
                .borrow_mut()
                .emitted
                .push((name.to_string(), payload.clone()));
        }

        fn evaluate(&self, script: &str, callback: EvaluationCallback) {
            let id = self.pending.register(callback);
            self.eval_ids.borrow_mut().push_back(id);
            self.state
                .borrow_mut()
                .evaluated
                .push(eval_request_script(id, script));
        }

        fn set_bounds(&mut self, bounds: Rect) {
            self.state.borrow_mut().bounds = Some(bounds);
        }
    }

    fn editor_with_fake(visible: bool) -> (BridgeDemoEditor<FakeSurface>, Rc<RefCell<FakeState>>) {
        let state = Rc::new(RefCell::new(FakeState {
            visible,
            ..FakeState::default()
        }));
        let handle = Rc::clone(&state);
        let editor = BridgeDemoEditor::new(ResourceRegistry::new("web"), move |options| {
            FakeSurface::create(options, handle)
        })
        .unwrap();
        (editor, state)
    }

    #[test]
    fn test_emit_sequence_while_visible() {
        let (mut editor, state) = editor_with_fake(true);

        editor.emit_button_clicked();
        editor.emit_button_clicked();
        editor.emit_button_clicked();

        let state = state.borrow();
        let payloads: Vec<&Value> = state.emitted.iter().map(|(_, p)| p).collect();
        assert_eq!(
            payloads,
            vec![&Value::from(1u64), &Value::from(2u64), &Value::from(3u64)]
        );
        assert!(state.emitted.iter().all(|(name, _)| name == "clickOnBackend"));
        assert_eq!(editor.emit_clicks(), 3);
    }

    #[test]
    fn test_emit_while_hidden_is_dropped() {
        let (mut editor, state) = editor_with_fake(false);

        editor.emit_button_clicked();
        assert!(state.borrow().emitted.is_empty());
        assert_eq!(editor.emit_clicks(), 0);

        // Once visible again the sequence starts at 1, nothing was queued.
        state.borrow_mut().visible = true;
        editor.emit_button_clicked();
        assert_eq!(state.borrow().emitted, vec![("clickOnBackend".to_string(), Value::from(1u64))]);
    }

    #[test]
    fn test_evaluate_submits_wrapped_script() {
        let (mut editor, state) = editor_with_fake(true);

        editor.evaluate_button_clicked();

        let state = state.borrow();
        assert_eq!(state.evaluated.len(), 1);
        assert!(state.evaluated[0].contains("_evalAndReport(1,"));
        assert!(state.evaluated[0].contains("called by backend: "));
    }

    #[test]
    fn test_evaluate_result_updates_button_caption() {
        let (mut editor, _state) = editor_with_fake(true);

        editor.evaluate_button_clicked();
        editor
            .surface()
            .answer_eval(r#""ok":"called by backend: 1""#);

        assert_eq!(editor.display().evaluate_button_label, "call 'evaluate()': 1");
    }

    #[test]
    fn test_duplicate_eval_result_is_ignored() {
        let (mut editor, _state) = editor_with_fake(true);

        editor.evaluate_button_clicked();
        let id = editor.surface().next_eval_id();
        editor.surface().answer_eval(r#""ok":"called by backend: 1""#);
        // A second answer for the same id must not reach the callback.
        editor
            .surface()
            .deliver(&format!(r#"{{"type":"evalResult","id":{id},"ok":"called by backend: 99"}}"#));

        assert_eq!(editor.display().evaluate_button_label, "call 'evaluate()': 1");
    }

    #[test]
    fn test_evaluate_error_leaves_caption() {
        let (mut editor, _state) = editor_with_fake(true);

        editor.evaluate_button_clicked();
        editor
            .surface()
            .answer_eval(r#""err":{"kind":"exception","message":"ReferenceError"}"#);

        assert_eq!(editor.display().evaluate_button_label, "call 'evaluate()'");
    }

    #[test]
    fn test_native_func_roundtrip() {
        let (editor, state) = editor_with_fake(true);

        editor
            .surface()
            .deliver(r#"{"type":"invoke","name":"nativeFunc","args":[5],"callId":7}"#);

        assert_eq!(editor.display().native_func_label, "called by frontend: 6");
        let state = state.borrow();
        assert_eq!(
            state.evaluated,
            vec!["window.__GLAZE__._onResult(7,{\"ok\":6})".to_string()]
        );
    }

    #[test]
    fn test_native_func_without_argument_counts_from_zero() {
        let (editor, _state) = editor_with_fake(true);

        editor
            .surface()
            .deliver(r#"{"type":"invoke","name":"nativeFunc","callId":1}"#);

        assert_eq!(editor.display().native_func_label, "called by frontend: 1");
    }

    #[test]
    fn test_click_on_frontend_updates_listener_label() {
        let (editor, _state) = editor_with_fake(true);

        editor
            .surface()
            .deliver(r#"{"type":"event","name":"clickOnFrontend","payload":"hello"}"#);

        assert_eq!(editor.display().listener_label, "listen 'clickOnFrontend': hello");
    }

    #[test]
    fn test_initialisation_data_in_bootstrap() {
        let (editor, _state) = editor_with_fake(true);

        let bootstrap = editor.surface().options.bootstrap_script().unwrap();
        assert!(bootstrap.contains(r#"{"h1":"BridgeDemo"}"#));
    }

    #[test]
    fn test_layout_carves_control_rows() {
        let layout = layout(Size::new(400, 300));

        assert_eq!(layout.native_func_label, Rect::new(0, 268, 400, 32));
        assert_eq!(layout.listener_label, Rect::new(0, 236, 400, 32));
        assert_eq!(layout.emit_button, Rect::new(0, 204, 200, 32));
        assert_eq!(layout.evaluate_button, Rect::new(200, 204, 200, 32));
        assert_eq!(layout.web_surface, Rect::new(0, 0, 400, 204));
    }

    #[test]
    fn test_resize_re_places_web_surface() {
        let (mut editor, state) = editor_with_fake(true);

        editor.resized(Size::new(800, 600));

        assert_eq!(editor.size(), Size::new(800, 600));
        assert_eq!(state.borrow().bounds, Some(Rect::new(0, 0, 800, 504)));
    }

    #[test]
    fn test_trailing_int_value() {
        assert_eq!(trailing_int_value("called by backend: 12"), 12);
        assert_eq!(trailing_int_value("123"), 123);
        assert_eq!(trailing_int_value("temp -5"), -5);
        assert_eq!(trailing_int_value("no digits"), 0);
        assert_eq!(trailing_int_value(""), 0);
    }
}
