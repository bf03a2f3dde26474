use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRACE: AtomicU64 = AtomicU64::new(1);

/// Correlation id that follows a request / batch / shutdown across log lines.
#[derive(Clone, Debug)]
pub struct TraceId(String);

impl TraceId {
    pub fn new(v: impl Into<String>) -> Self {
        Self(v.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        let n = NEXT_TRACE.fetch_add(1, Ordering::Relaxed);
        Self(format!("trace-{n}"))
    }
}
