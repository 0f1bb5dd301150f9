use std::sync::atomic::{AtomicUsize, Ordering};

pub mod assets;
pub mod persistence;
pub mod version;

static SESSION_SEQ: AtomicUsize = AtomicUsize::new(1);

/// Process-local id for session-scoped records (wizard sessions, rows).
/// Persisted documents use real UUIDs instead.
pub fn generate_id(prefix: &str) -> String {
    let seq = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{seq}")
}
