use crate::{
    auth,
    commands::{self, Connect},
    config::ServerConfig,
    error::Socks5Error,
    protocol::{AuthMethod, Version},
    wire,
};
use anyhow::{Context, Result, anyhow, bail};
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream},
};
use tracing::{debug, error, info, warn};

/// Socks5Server represents a SOCKS5 server and houses related
/// configuration data
pub struct Socks5Server {
    pub config: Arc<ServerConfig>,
    listener: Option<TcpListener>,
}

impl Socks5Server {
    /// new is a constructor for the Socks5Server type
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            listener: None,
        }
    }

    /// bind to the configured address and return the local address
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        if self.listener.is_some() {
            bail!("listener already bound");
        }

        let listen_addr = self.config.listen_addr();
        let listener = TcpListener::bind(&listen_addr)
            .await
            .with_context(|| format!("failed to bind {listen_addr}"))?;
        let addr = listener.local_addr()?;

        info!("SOCKS5 proxy listening on {}", addr);

        self.listener = Some(listener);
        Ok(addr)
    }

    /// run accepts clients forever, one task per connection
    pub async fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind().await?;
        }
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow!("listener not bound"))?;

        loop {
            let (inbound, peer_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("accept failed: {}", e);
                    continue;
                }
            };

            let config = Arc::clone(&self.config);

            tokio::spawn(async move {
                info!("new client: {}", peer_addr);

                match handle(inbound, config).await {
                    Ok(()) => debug!("client {} done", peer_addr),
                    Err(Socks5Error::AuthFailed) => {
                        warn!("client {}: authentication failed", peer_addr)
                    }
                    Err(e) => error!("client {}: connection error: {}", peer_addr, e),
                }
            });
        }
    }
}

/// handle runs the full SOCKS5 flow for one client connection: version
/// probe, method negotiation, optional authentication, request, upstream
/// dial and relay
pub async fn handle<S>(mut stream: S, config: Arc<ServerConfig>) -> Result<(), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let outbound = match config.handshake_timeout {
        Some(limit) => tokio::time::timeout(limit, handshake(&mut stream, &config))
            .await
            .map_err(|_| Socks5Error::HandshakeTimeout)??,
        None => handshake(&mut stream, &config).await?,
    };

    // Silent close: zero first byte or the client hung up immediately
    let Some(outbound) = outbound else {
        return Ok(());
    };

    Connect {
        inbound: stream,
        outbound,
    }
    .run()
    .await;

    Ok(())
}

/// handshake drives the connection from the first byte up to an open
/// upstream. `None` means the connection is closed without a response
async fn handshake<S>(
    stream: &mut S,
    config: &ServerConfig,
) -> Result<Option<TcpStream>, Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match wire::read_byte_or_eof(stream).await? {
        Some(v) if v == Version::SOCKS5 as u8 => {}
        None | Some(0x00) => return Ok(None),
        Some(v) => return Err(Socks5Error::UnsupportedVersion(v)),
    }

    let method = auth::negotiate_method(stream, config).await?;

    if let (AuthMethod::UserPass, Some(account)) = (method, config.credentials()) {
        auth::authenticate(stream, account).await?;
    }

    let outbound = commands::handle_socks_request(stream).await?;
    Ok(Some(outbound))
}
