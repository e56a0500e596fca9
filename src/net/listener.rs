//! TCP listener binding.
//!
//! A replacement process started by `/restart` comes up while its parent
//! still holds the ports, so binds retry on `AddrInUse` with capped
//! exponential backoff until the parent is gone.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("invalid bind address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Backoff schedule for binding an address that is still in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindRetry {
    /// Total bind attempts, including the first.
    pub attempts: u32,
    pub base: Duration,
    pub max: Duration,
}

impl Default for BindRetry {
    /// About 3.5 s in total, well past the restart grace period.
    fn default() -> Self {
        Self {
            attempts: 8,
            base: Duration::from_millis(50),
            max: Duration::from_secs(1),
        }
    }
}

impl BindRetry {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        self.base.saturating_mul(factor).min(self.max)
    }
}

/// Parse `host:port`.
pub fn parse_address(address: &str) -> Result<SocketAddr, ListenerError> {
    address.parse().map_err(|source| ListenerError::Address {
        address: address.to_string(),
        source,
    })
}

/// Bind a listener on `address` with the default retry schedule.
pub async fn bind(address: &str) -> Result<TcpListener, ListenerError> {
    bind_with_retry(address, BindRetry::default()).await
}

/// Bind a listener on `address`, retrying while the address is in use.
/// Any other bind error fails immediately.
pub async fn bind_with_retry(
    address: &str,
    retry: BindRetry,
) -> Result<TcpListener, ListenerError> {
    let addr = parse_address(address)?;
    let mut attempt = 0;

    loop {
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::debug!(address = %addr, attempts = attempt + 1, "Listener bound");
                return Ok(listener);
            }
            Err(source)
                if source.kind() == std::io::ErrorKind::AddrInUse
                    && attempt + 1 < retry.attempts =>
            {
                attempt += 1;
                let delay = retry.delay(attempt);
                tracing::info!(
                    address = %addr,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Address in use, retrying bind"
                );
                tokio::time::sleep(delay).await;
            }
            Err(source) => return Err(ListenerError::Bind { address: addr, source }),
        }
    }
}
