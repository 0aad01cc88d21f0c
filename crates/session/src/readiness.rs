//! Bounded polling for a signalled process to open its inspector port

use std::{future::Future, time::Duration};

use tokio::{net::TcpStream, time::Instant};

/// Poll `probe` every `interval` until it succeeds or `timeout` elapses.
///
/// Returns the elapsed time on failure. The probe runs at least once, and a
/// probe still pending at the deadline is cancelled.
pub(crate) async fn wait_until<F, Fut>(
    mut probe: F,
    timeout: Duration,
    interval: Duration,
) -> Result<Duration, Duration>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let remaining = timeout.saturating_sub(start.elapsed());
        let ready = tokio::time::timeout(remaining, probe())
            .await
            .unwrap_or(false);
        if ready {
            tracing::debug!(attempts, elapsed = ?start.elapsed(), "ready");
            return Ok(start.elapsed());
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            tracing::debug!(attempts, ?elapsed, "gave up waiting");
            return Err(elapsed);
        }
        tokio::time::sleep(interval.min(timeout - elapsed)).await;
    }
}

pub(crate) async fn wait_for_port(
    host: &str,
    port: u16,
    timeout: Duration,
    interval: Duration,
) -> Result<Duration, Duration> {
    wait_until(
        move || async move {
            match TcpStream::connect((host, port)).await {
                Ok(_) => true,
                Err(e) => {
                    tracing::trace!(error = %e, %port, "inspector port not open yet");
                    false
                }
            }
        },
        timeout,
        interval,
    )
    .await
}
