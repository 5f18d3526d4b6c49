use crate::config::ServerConfig;
use crate::error::Socks5Error;
use crate::protocol::{AuthMethod, AuthStatus, Version};
use crate::wire;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// negotiate_method handles the method selection exchange. The caller has
/// already consumed the version byte.
///
/// The methods offered by the client are read and discarded: the server
/// picks username/password when credentials are configured and no
/// authentication otherwise.
pub async fn negotiate_method<S>(
    stream: &mut S,
    config: &ServerConfig,
) -> Result<AuthMethod, Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // ClientHello format
    // +----+----------+----------+
    // |VER | NMETHODS | METHODS  |
    // +----+----------+----------+
    // | 1  |    1     | 1 to 255 |
    // +----+----------+----------+

    let n_methods = wire::read_u8(stream, "method count").await?;
    let methods = wire::read_exact_bytes(stream, n_methods as usize, "methods").await?;
    debug!("client offered methods {:?}", methods);

    let method = select_auth_method(config);

    // ServerChoice method selection reply format
    // +----+--------+
    // |VER | METHOD |
    // +----+--------+
    // | 1  |   1    |
    // +----+--------+
    stream.write_all(&[Version::SOCKS5 as u8, method as u8]).await?;
    stream.flush().await?;

    Ok(method)
}

/// select_auth_method chooses the method from server configuration alone
fn select_auth_method(config: &ServerConfig) -> AuthMethod {
    match config.credentials() {
        Some(_) => AuthMethod::UserPass,
        None => AuthMethod::NoAuth,
    }
}

/// authenticate runs the username/password sub-negotiation and checks
/// `username:password` against the configured account string
pub async fn authenticate<S>(stream: &mut S, account: &str) -> Result<(), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // Client Username/Password Request
    // +----+------+----------+------+----------+
    // |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
    // +----+------+----------+------+----------+
    // | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
    // +----+------+----------+------+----------+

    // Sub-negotiation version is not checked
    let _ver = wire::read_u8(stream, "auth version").await?;
    let username = wire::read_len_prefixed(stream, "username").await?;
    let password = wire::read_len_prefixed(stream, "password").await?;

    let status = if credentials_match(&username, &password, account) {
        AuthStatus::Success
    } else {
        AuthStatus::Failure
    };

    // Username/Password Server response
    // +----+--------+
    // |VER | STATUS |
    // +----+--------+
    // | 1  |   1    |
    // +----+--------+
    stream.write_all(&[Version::SOCKS5 as u8, status as u8]).await?;
    stream.flush().await?;

    match status {
        AuthStatus::Success => Ok(()),
        AuthStatus::Failure => Err(Socks5Error::AuthFailed),
    }
}

/// credentials_match compares `username:password` byte-for-byte with the
/// configured account
fn credentials_match(username: &[u8], password: &[u8], account: &str) -> bool {
    let mut received = Vec::with_capacity(username.len() + 1 + password.len());
    received.extend_from_slice(username);
    received.push(b':');
    received.extend_from_slice(password);
    received == account.as_bytes()
}
