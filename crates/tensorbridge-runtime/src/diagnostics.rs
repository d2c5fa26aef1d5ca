/// The host's user-facing error channel.
pub trait ErrorReporter: Send + Sync {
    fn error(&self, message: &str);
    fn warning(&self, message: &str);
}

/// Reports through `tracing`; the default when the host supplies no channel.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }
}
