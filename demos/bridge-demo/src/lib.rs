//! Bridge demo editor.
//!
//! An example editor demonstrating the Glaze web/native bridge inside a
//! plugin window: a web surface served by a resource provider, one
//! native function and one event listener registered for the page, and
//! two native buttons driving event emission and script evaluation. The
//! front-end lives under `web/`.
//!
//! Build with the `hot-reload` feature to load the page from a local
//! dev server instead of the built-in resource provider.

pub mod editor;
pub mod resources;

pub use editor::{
    content_source, layout, BridgeDemoEditor, EditorLayout, EditorShared, INITIAL_SIZE,
};
pub use resources::ResourceRegistry;

#[cfg(target_os = "macos")]
use glaze::prelude::{PlatformWebView, Result};

/// Attach the demo editor to a host-provided parent view, serving the
/// front-end from `resource_dir`.
///
/// # Safety
///
/// `parent` must be a valid platform view pointer (`NSView*`). Must be
/// called from the main thread.
#[cfg(target_os = "macos")]
pub unsafe fn attach_editor(
    parent: *mut std::ffi::c_void,
    resource_dir: impl Into<std::path::PathBuf>,
) -> Result<BridgeDemoEditor<PlatformWebView>> {
    let registry = ResourceRegistry::new(resource_dir);
    BridgeDemoEditor::new(registry, |options| {
        // SAFETY: forwarded caller contract.
        unsafe { PlatformWebView::attach_to_parent(parent, options, &content_source()) }
    })
}
