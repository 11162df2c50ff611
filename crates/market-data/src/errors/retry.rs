/// Classification for retry policy.
///
/// Used by queue workers to decide whether a failed fetch job should be
/// made available again or dropped.
///
/// | Class | Re-queue the job? |
/// |-------|-------------------|
/// | `Never` | No |
/// | `WithBackoff` | Yes, after the configured backoff |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad symbol, malformed data, or terminal failure.
    /// The request is fundamentally invalid and retrying won't help.
    Never,

    /// Transient failure (rate limit, timeout, network). Retry later.
    WithBackoff,
}

impl RetryClass {
    pub fn is_retryable(self) -> bool {
        matches!(self, RetryClass::WithBackoff)
    }
}
