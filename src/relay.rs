//! Bidirectional byte relay between a client and its upstream target
//!
//! The upstream -> client direction runs on its own task while the calling
//! task copies client -> upstream. Whichever direction ends first (EOF or
//! error) tears down the other, so there is no half-close continuation.

use tokio::io::{self, AsyncRead, AsyncWrite};
use tracing::{debug, warn};

/// Side names the direction whose source finished first
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Side {
    /// The client stopped sending, or client -> upstream failed
    Client,
    /// The target stopped sending, or upstream -> client failed
    Upstream,
}

/// relay copies bytes both ways until one direction ends. Both streams are
/// dropped before it returns
pub async fn relay<A, B>(client: A, upstream: B) -> Side
where
    A: AsyncRead + AsyncWrite + Send + 'static,
    B: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut client_read, mut client_write) = io::split(client);
    let (mut upstream_read, mut upstream_write) = io::split(upstream);

    let mut downstream =
        tokio::spawn(async move { io::copy(&mut upstream_read, &mut client_write).await });

    let closed_by = tokio::select! {
        result = io::copy(&mut client_read, &mut upstream_write) => {
            match result {
                Ok(bytes) => debug!("client -> upstream finished: {} bytes", bytes),
                Err(e) => debug!("client -> upstream error: {}", e),
            }
            Side::Client
        }
        joined = &mut downstream => {
            match joined {
                Ok(Ok(bytes)) => debug!("upstream -> client finished: {} bytes", bytes),
                Ok(Err(e)) => debug!("upstream -> client error: {}", e),
                Err(e) => warn!("upstream -> client task failed: {}", e),
            }
            Side::Upstream
        }
    };

    if closed_by == Side::Client {
        // Wait for the aborted task so its halves are released before returning
        downstream.abort();
        let _ = downstream.await;
    }

    closed_by
}
