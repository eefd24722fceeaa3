//! Collapsible display of a failed import.

/// Failure view with a raw traceback that is collapsed until the user asks
/// for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDisplay {
    mets_url: Option<String>,
    traceback: String,
    expanded: bool,
}

impl ErrorDisplay {
    pub fn new(mets_url: Option<String>, traceback: impl Into<String>) -> Self {
        Self {
            mets_url,
            traceback: traceback.into(),
            expanded: false,
        }
    }

    /// The source document the import was attempted for.
    pub fn mets_url(&self) -> Option<&str> {
        self.mets_url.as_deref()
    }

    pub fn traceback(&self) -> &str {
        &self.traceback
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Flip between collapsed and expanded. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    /// Traceback text, only while expanded.
    pub fn visible_traceback(&self) -> Option<&str> {
        self.expanded.then_some(self.traceback.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsed_by_default() {
        let display = ErrorDisplay::new(Some("https://example.org/mets.xml".into()), "Traceback ...");
        assert!(!display.is_expanded());
        assert_eq!(display.visible_traceback(), None);
        assert_eq!(display.mets_url(), Some("https://example.org/mets.xml"));
    }

    #[test]
    fn test_toggle() {
        let mut display = ErrorDisplay::new(None, "Traceback ...");
        assert!(display.toggle());
        assert_eq!(display.visible_traceback(), Some("Traceback ..."));
        assert!(!display.toggle());
        assert_eq!(display.visible_traceback(), None);
    }
}
