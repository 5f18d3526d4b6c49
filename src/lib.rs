//! A small SOCKS5 proxy server library
//!
//! ## SOCKS5 Implementation
//!
//! - Features:
//!     - CONNECT
//!     - No Authentication
//!     - Username/Password Authentication against a single `user:pass` account
//!     - Async using tokio, one task per client and one extra task per relay
//!     - Failure replies for unsupported commands, address types and dial errors
//!     - Optional handshake deadline
//! - [SOCKS5 (RFC 1928)](https://datatracker.ietf.org/doc/html/rfc1928)
//! - [Username/Password Authentication (RFC 1929)](https://datatracker.ietf.org/doc/html/rfc1929)
//!
//! The server always selects its own method: username/password when an
//! account is configured, no authentication otherwise.
//!
//! # Example
//! ```no_run
//! use socksd::{ServerConfig, Socks5Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::new("127.0.0.1", 1080)
//!         .with_credentials(Some("user:pass".into()));
//!     let mut server = Socks5Server::new(config);
//!     server.run().await
//! }
//! ```

pub mod address;
pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod server;
pub mod wire;

// Re-export main types at crate root for convenience
pub use address::TargetAddr;
pub use config::ServerConfig;
pub use error::Socks5Error;
pub use protocol::{AuthMethod, Command, ReplyCode, Version};
pub use server::{Socks5Server, handle};
