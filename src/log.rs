//! Logger handle injected into components

use tracing::Span;

/// A logging holder that can be placed inside an implementation struct.
///
/// The runtime assigns a child of the root logger to it when the component
/// is constructed: a `component` span carrying the dependency's name.
/// Until then it wraps a disabled span.
///
/// # Example
/// ```ignore
/// impl Store for FileStore {
///     fn put(&self, key: &str) {
///         self.log.in_scope(|| tracing::debug!(key, "put"));
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Logger {
    span: Span
}

impl Default for Logger {
    #[inline]
    fn default() -> Self {
        Self { span: Span::none() }
    }
}

impl From<Span> for Logger {
    #[inline]
    fn from(span: Span) -> Self {
        Self::new(span)
    }
}

impl Logger {
    /// Creates a logger that records into `span`
    #[inline]
    pub fn new(span: Span) -> Self {
        Self { span }
    }

    /// Creates a logger over the current span of the calling thread
    #[inline]
    pub fn current() -> Self {
        Self::new(Span::current())
    }

    /// Returns the underlying span
    #[inline]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Runs `f` inside the logger's span
    #[inline]
    pub fn in_scope<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.span.in_scope(f)
    }

    /// Derives the logger of a single component
    #[inline]
    pub(crate) fn for_component(&self, name: &str) -> Self {
        Self::new(tracing::info_span!(parent: &self.span, "component", name = %name))
    }
}

#[cfg(test)]
mod tests {
    use super::Logger;

    #[test]
    fn it_defaults_to_disabled_span() {
        let logger = Logger::default();

        assert!(logger.span().is_disabled());
        assert_eq!(logger.in_scope(|| 42), 42);
    }
}
