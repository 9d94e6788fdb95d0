//! Resources served to the web surface.
//!
//! A [`Resource`] is one byte payload plus its MIME type, produced fresh
//! for every request and discarded after the transfer completes. The
//! [`ResourceProvider`] callback answers the web surface's internal
//! loader; it is a pure function of the requested path.

use std::path::Path;

use crate::mime::mime_for_path;

/// URL scheme under which provider-served resources are reachable.
pub const PROVIDER_SCHEME: &str = "glaze";

/// Root URL of the built-in resource provider.
///
/// Navigating the web surface here makes it request every resource
/// through the registered [`ResourceProvider`].
pub fn resource_provider_root() -> &'static str {
    "glaze://localhost/"
}

/// A byte payload with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// The payload.
    pub data: Vec<u8>,
    /// MIME type string, e.g. `"text/html"`.
    pub mime: String,
}

impl Resource {
    /// Create a resource from a payload and MIME type.
    pub fn new(data: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            data,
            mime: mime.into(),
        }
    }

    /// Read a file fully into memory, tagging it with a MIME type
    /// selected by its extension.
    ///
    /// The file is read on every call; nothing is cached.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let mime = mime_for_path(&path.to_string_lossy());
        Ok(Self::new(data, mime))
    }

    /// Encode a value as a UTF-8 JSON resource.
    pub fn json<T: serde::Serialize>(value: &T) -> serde_json::Result<Self> {
        let data = serde_json::to_vec(value)?;
        Ok(Self::new(data, "application/json"))
    }
}

/// Callback answering resource requests from the web surface.
///
/// Returns `None` for unknown paths. Invoked on the native event loop.
pub type ResourceProvider = Box<dyn Fn(&str) -> Option<Resource>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file_reads_bytes_and_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"<html></html>")
            .unwrap();

        let resource = Resource::from_file(&path).unwrap();
        assert_eq!(resource.data, b"<html></html>");
        assert_eq!(resource.mime, "text/html");
    }

    #[test]
    fn test_from_file_missing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Resource::from_file(&dir.path().join("absent.js")).is_err());
    }

    #[test]
    fn test_json_resource() {
        let resource = Resource::json(&serde_json::json!({ "a": 1 })).unwrap();
        assert_eq!(resource.mime, "application/json");
        assert_eq!(resource.data, br#"{"a":1}"#);
    }
}
