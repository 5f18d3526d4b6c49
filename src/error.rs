//! Error types for the SOCKS5 connection handler
//!
//! Every variant is local to a single client connection; none of them ends
//! the listener.

use crate::protocol::ReplyCode;
use std::io;
use thiserror::Error;

/// Socks5Error covers everything that can abort a client connection
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// The stream ended before a required field was complete
    #[error("truncated frame while reading {0}")]
    Truncated(&'static str),

    /// IO error on the client stream
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Version byte other than 0x05
    #[error("unsupported SOCKS version: {0:#04x}")]
    UnsupportedVersion(u8),

    /// Username/password mismatch
    #[error("authentication failed")]
    AuthFailed,

    /// A text field was not valid UTF-8
    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    /// Unknown command byte, or a command this server does not serve
    #[error("command not supported: {0:#04x}")]
    UnsupportedCommand(u8),

    /// Unknown address type byte
    #[error("address type not supported: {0:#04x}")]
    UnsupportedAddressType(u8),

    /// Dialing the target failed
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    /// The handshake did not finish within the configured deadline
    #[error("handshake timed out")]
    HandshakeTimeout,
}

impl Socks5Error {
    /// reply_code maps the error onto the SOCKS5 reply code reported to the
    /// client in the command response
    pub fn reply_code(&self) -> ReplyCode {
        match self {
            Socks5Error::UnsupportedCommand(_) => ReplyCode::CommandNotSupported,
            Socks5Error::UnsupportedAddressType(_) => ReplyCode::AddrTypeUnsupported,
            Socks5Error::Connect { source, .. } => io_error_to_reply_code(source),
            _ => ReplyCode::ServerFailure,
        }
    }

    /// expects_reply reports whether the client is still waiting for a
    /// command response. Truncated frames and IO errors mean the client is
    /// gone or the stream is unusable
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            Socks5Error::UnsupportedCommand(_)
                | Socks5Error::UnsupportedAddressType(_)
                | Socks5Error::InvalidUtf8(_)
                | Socks5Error::Connect { .. }
        )
    }
}

/// io_error_to_reply_code converts a dial error into a SOCKS5 reply code
pub fn io_error_to_reply_code(error: &io::Error) -> ReplyCode {
    match error.kind() {
        io::ErrorKind::ConnectionRefused => ReplyCode::ConnectionRefused,
        io::ErrorKind::HostUnreachable | io::ErrorKind::TimedOut => ReplyCode::HostUnreachable,
        io::ErrorKind::NetworkUnreachable => ReplyCode::NetworkUnreachable,
        io::ErrorKind::PermissionDenied => ReplyCode::ConnectionNotAllowed,
        _ => ReplyCode::ServerFailure,
    }
}
