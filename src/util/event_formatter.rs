//! Event name formatting for the broadcasting facade.
//!
//! Follows the laravel-echo convention: a configured namespace is
//! prepended to bare event names, dots become backslashes (PHP class
//! separators), and a leading `.` or `\` opts out of namespacing.

// ============================================================================
// EventFormatter
// ============================================================================

/// Formats broadcast event names.
#[derive(Debug, Clone, Default)]
pub struct EventFormatter {
    namespace: Option<String>,
}

impl EventFormatter {
    /// Creates a formatter with an optional namespace, e.g.
    /// `App.Events`.
    #[inline]
    #[must_use]
    pub const fn new(namespace: Option<String>) -> Self {
        Self { namespace }
    }

    /// Formats an event name.
    ///
    /// A leading `.` or `\` strips the prefix and skips namespacing;
    /// otherwise the namespace (when configured) is prepended and all
    /// dots are replaced with backslashes.
    #[must_use]
    pub fn format(&self, event: &str) -> String {
        if let Some(stripped) = event.strip_prefix('.').or_else(|| event.strip_prefix('\\')) {
            return stripped.to_string();
        }

        let event = match &self.namespace {
            Some(namespace) => format!("{namespace}.{event}"),
            None => event.to_string(),
        };

        event.replace('.', "\\")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_event() {
        let formatter = EventFormatter::new(Some("App.Events".to_string()));
        assert_eq!(formatter.format("OrderShipped"), "App\\Events\\OrderShipped");
    }

    #[test]
    fn test_no_namespace() {
        let formatter = EventFormatter::new(None);
        assert_eq!(formatter.format("OrderShipped"), "OrderShipped");
    }

    #[test]
    fn test_dot_prefix_opts_out() {
        let formatter = EventFormatter::new(Some("App.Events".to_string()));
        assert_eq!(formatter.format(".order.shipped"), "order.shipped");
    }

    #[test]
    fn test_backslash_prefix_opts_out() {
        let formatter = EventFormatter::new(Some("App.Events".to_string()));
        assert_eq!(formatter.format("\\App\\Other\\Event"), "App\\Other\\Event");
    }
}
