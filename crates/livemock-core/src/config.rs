//! Simulator configuration.

/// Site marker used when no other is configured.
pub const DEFAULT_SITE_MARKER: &str = "NO_SITE";

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConfig {
    /// Report unmet expectations at scope exit even when the scope already
    /// failed with another error
    pub report_multiple: bool,
    /// Expect the status probe as first query when a scope is entered with
    /// `enter()`
    pub expect_status_query: bool,
    /// Prefix every data row with `site_marker`
    pub prepend_site: bool,
    /// Marker prefixed to rows when `prepend_site` is on
    pub site_marker: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            report_multiple: false,
            expect_status_query: true,
            prepend_site: false,
            site_marker: DEFAULT_SITE_MARKER.to_string(),
        }
    }
}
