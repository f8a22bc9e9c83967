use std::sync::OnceLock;

static WORKER_ID: OnceLock<String> = OnceLock::new();

/// Get platform (OS family).
#[inline]
pub fn platform() -> &'static str {
    std::env::consts::OS
}

/// Worker id used when the config does not name one.
///
/// Hostname when it is valid UTF-8, otherwise a random v4 UUID; stable for the process lifetime.
pub fn default_worker_id() -> &'static str {
    WORKER_ID.get_or_init(|| {
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    })
}
