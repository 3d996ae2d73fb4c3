use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Poll `connect` until it succeeds or `shutdown` is raised.
///
/// Returns `None` only when shutdown was requested before the resource came up.
pub fn wait_for_resource<F, T, E>(
    mut connect: F,
    poll_interval_ms: u64,
    resource_name: &str,
    shutdown: &AtomicBool,
) -> Option<T>
where
    F: FnMut() -> Result<T, E>,
    E: std::fmt::Display,
{
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("Stopped waiting for {}", resource_name);
            return None;
        }

        match connect() {
            Ok(resource) => {
                tracing::info!("{} connected", resource_name);
                return Some(resource);
            }
            Err(e) => {
                tracing::debug!("Waiting for {} ({})", resource_name, e);
                std::thread::sleep(Duration::from_millis(poll_interval_ms));
            }
        }
    }
}
