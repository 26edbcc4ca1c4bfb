//! Options for opening bundles and scanning directories.

use std::time::Duration;

/// Behavior options for [`crate::Bundle::open_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    /// Time budget for scans outside the bundle; `None` scans without limit.
    pub scan_timeout: Option<Duration>,
    /// Fail with `NotABundle` when `contents.json` is missing.
    pub require_manifest: bool,
    /// Parse XLIFF documents on first access instead of while opening.
    pub lazy_documents: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            scan_timeout: None,
            require_manifest: false,
            lazy_documents: true,
        }
    }
}

impl OpenOptions {
    /// Creates default open options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scan time budget.
    pub fn with_scan_timeout(mut self, scan_timeout: Option<Duration>) -> Self {
        self.scan_timeout = scan_timeout;
        self
    }

    /// Requires `contents.json` to be present.
    pub fn with_require_manifest(mut self, require_manifest: bool) -> Self {
        self.require_manifest = require_manifest;
        self
    }

    /// Enables/disables lazy document parsing.
    pub fn with_lazy_documents(mut self, lazy_documents: bool) -> Self {
        self.lazy_documents = lazy_documents;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = OpenOptions::new();
        assert_eq!(options.scan_timeout, None);
        assert!(!options.require_manifest);
        assert!(options.lazy_documents);
    }

    #[test]
    fn test_builder_chain() {
        let options = OpenOptions::new()
            .with_scan_timeout(Some(Duration::from_millis(250)))
            .with_require_manifest(true)
            .with_lazy_documents(false);
        assert_eq!(options.scan_timeout, Some(Duration::from_millis(250)));
        assert!(options.require_manifest);
        assert!(!options.lazy_documents);
    }
}
