//! Port availability polling
//!
//! The inspector can only bind the requested port once whatever previously
//! held it has let go, so launches are gated on the port becoming free.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::sleep;

use crate::error::{LaunchError, Result};

/// Delay between connect probes
const RETRY_DELAY: Duration = Duration::from_millis(150);

/// Default overall deadline for [`wait_until_free`]
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Wait until `host:port` stops accepting connections.
///
/// A refused connection means the port is free. A successful connection means
/// something still holds it; the probe socket is dropped and the check retried
/// after [`RETRY_DELAY`]. Any other connect error is treated as transient.
/// Port 0 means the child will bind an ephemeral port, so there is nothing to
/// check.
pub async fn wait_until_free(host: &str, port: u16, timeout: Duration) -> Result<()> {
    if port == 0 {
        return Ok(());
    }

    let probe = async {
        loop {
            match TcpStream::connect((host, port)).await {
                Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return,
                Ok(stream) => {
                    // Still occupied.
                    drop(stream);
                }
                Err(e) => {
                    tracing::debug!(host, port, error = %e, "port probe failed, retrying");
                }
            }
            sleep(RETRY_DELAY).await;
        }
    };

    // Dropping the probe future on timeout closes any in-flight socket.
    tokio::time::timeout(timeout, probe)
        .await
        .map_err(|_| LaunchError::StartupTimeout {
            host: host.to_string(),
            port,
            timeout,
        })
}
