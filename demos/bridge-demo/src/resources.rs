//! The demo's resource registry.
//!
//! A fixed table of known resource names backed by the `web/` directory,
//! plus one synthetic JSON resource carrying the current time. Lookups
//! are pure: every file-backed request re-reads from disk, nothing is
//! cached, and the only side effect anywhere is a diagnostic log entry
//! for misses.

use std::path::PathBuf;

use chrono::Local;
use glaze::prelude::Resource;
use serde::Serialize;

/// Name resolved for empty and root requests.
const ROOT_DOCUMENT: &str = "index.html";

/// File-backed resources the registry knows about.
const KNOWN_FILES: &[&str] = &[ROOT_DOCUMENT, "js/index.js"];

/// The synthetic resource name.
const INFO_RESOURCE: &str = "infoResource.json";

/// Body of the synthetic resource.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoResource {
    update_time: String,
}

/// Registry answering the web surface's resource requests.
pub struct ResourceRegistry {
    root_dir: PathBuf,
}

impl ResourceRegistry {
    /// Create a registry serving files from `root_dir`.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Answer one resource request.
    ///
    /// Empty and `"/"` requests resolve to the root document; any other
    /// request resolves to the remainder of the path after its first
    /// separator. Unknown names yield `None` with one diagnostic.
    pub fn resolve(&self, path: &str) -> Option<Resource> {
        let name = resolve_name(path);

        if name == INFO_RESOURCE {
            return info_resource();
        }

        if KNOWN_FILES.contains(&name) {
            return match Resource::from_file(&self.root_dir.join(name)) {
                Ok(resource) => Some(resource),
                Err(e) => {
                    log::warn!("failed to read resource {name}: {e}");
                    None
                }
            };
        }

        log::warn!("no resource for request {path:?} (resolved {name:?})");
        None
    }
}

/// Map a request path onto a registry name: everything up to and
/// including the first separator is dropped; a bare name stands for
/// itself.
fn resolve_name(path: &str) -> &str {
    if path.is_empty() || path == "/" {
        ROOT_DOCUMENT
    } else {
        match path.split_once('/') {
            Some((_, rest)) => rest,
            None => path,
        }
    }
}

/// Build the synthetic current-time resource.
fn info_resource() -> Option<Resource> {
    let info = InfoResource {
        update_time: Local::now().format("%d %b %Y %H:%M:%S").to_string(),
    };
    match Resource::json(&info) {
        Ok(resource) => Some(resource),
        Err(e) => {
            log::warn!("failed to encode {INFO_RESOURCE}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Once;

    /// Path used by the diagnostic-counting test; nothing else logs it.
    const PROBE_PATH: &str = "/definitely-missing.xyz";

    static PROBE_DIAGNOSTICS: AtomicUsize = AtomicUsize::new(0);

    struct CountingLogger;

    impl log::Log for CountingLogger {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            if record.args().to_string().contains(PROBE_PATH) {
                PROBE_DIAGNOSTICS.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: CountingLogger = CountingLogger;

    fn install_logger() {
        static INSTALL: Once = Once::new();
        INSTALL.call_once(|| {
            log::set_logger(&LOGGER).ok();
            log::set_max_level(log::LevelFilter::Warn);
        });
    }

    fn registry_with_files() -> (tempfile::TempDir, ResourceRegistry) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("js")).unwrap();
        write_file(&dir, "index.html", b"<html>demo</html>");
        write_file(&dir, "js/index.js", b"console.log('demo')");
        let registry = ResourceRegistry::new(dir.path());
        (dir, registry)
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) {
        std::fs::File::create(dir.path().join(name))
            .unwrap()
            .write_all(contents)
            .unwrap();
    }

    #[test]
    fn test_root_requests_resolve_to_root_document() {
        let (_dir, registry) = registry_with_files();

        for request in ["", "/"] {
            let resource = registry.resolve(request).unwrap();
            assert_eq!(resource.mime, "text/html");
            assert_eq!(resource.data, b"<html>demo</html>");
        }
    }

    #[test]
    fn test_script_request_resolves_file_bytes() {
        let (_dir, registry) = registry_with_files();

        let resource = registry.resolve("/js/index.js").unwrap();
        assert_eq!(resource.mime, "text/javascript");
        assert_eq!(resource.data, b"console.log('demo')");
    }

    #[test]
    fn test_document_request_with_leading_separator() {
        let (_dir, registry) = registry_with_files();

        let resource = registry.resolve("/index.html").unwrap();
        assert_eq!(resource.mime, "text/html");
    }

    #[test]
    fn test_info_resource_is_json_with_update_time() {
        let (_dir, registry) = registry_with_files();

        let resource = registry.resolve("/infoResource.json").unwrap();
        assert_eq!(resource.mime, "application/json");

        let body: serde_json::Value = serde_json::from_slice(&resource.data).unwrap();
        let update_time = body.get("updateTime").and_then(|v| v.as_str()).unwrap();
        assert!(!update_time.is_empty());
    }

    #[test]
    fn test_unknown_path_produces_one_diagnostic() {
        install_logger();
        let (_dir, registry) = registry_with_files();

        let before = PROBE_DIAGNOSTICS.load(Ordering::SeqCst);
        assert!(registry.resolve(PROBE_PATH).is_none());
        assert_eq!(PROBE_DIAGNOSTICS.load(Ordering::SeqCst) - before, 1);
    }

    #[test]
    fn test_files_are_reread_per_request() {
        let (dir, registry) = registry_with_files();

        let first = registry.resolve("/index.html").unwrap();
        write_file(&dir, "index.html", b"<html>edited</html>");
        let second = registry.resolve("/index.html").unwrap();

        assert_eq!(first.data, b"<html>demo</html>");
        assert_eq!(second.data, b"<html>edited</html>");
    }

    #[test]
    fn test_bare_name_request_resolves() {
        let (_dir, registry) = registry_with_files();

        let resource = registry.resolve("infoResource.json").unwrap();
        assert_eq!(resource.mime, "application/json");
    }

    #[test]
    fn test_nested_bare_name_drops_leading_segment() {
        let (_dir, registry) = registry_with_files();
        // "js/index.js" without a leading separator resolves to
        // "index.js", which the registry does not know.
        assert!(registry.resolve("js/index.js").is_none());
    }

    #[test]
    fn test_missing_backing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ResourceRegistry::new(dir.path());
        assert!(registry.resolve("/index.html").is_none());
    }
}
