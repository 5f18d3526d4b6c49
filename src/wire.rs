//! Primitive field readers for the SOCKS5 wire format
//!
//! All readers use `read_exact`, so a field split over several TCP segments
//! is reassembled. A stream that ends early yields [`Socks5Error::Truncated`]
//! naming the field being read.

use crate::error::Socks5Error;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Map a failed `read_exact` onto a connection error
fn read_err(field: &'static str, e: io::Error) -> Socks5Error {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => Socks5Error::Truncated(field),
        _ => Socks5Error::Io(e),
    }
}

/// read_array reads exactly `N` bytes into a fixed array
pub async fn read_array<R, const N: usize>(
    r: &mut R,
    field: &'static str,
) -> Result<[u8; N], Socks5Error>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)
        .await
        .map_err(|e| read_err(field, e))?;
    Ok(buf)
}

/// read_exact_bytes reads exactly `n` bytes
pub async fn read_exact_bytes<R>(
    r: &mut R,
    n: usize,
    field: &'static str,
) -> Result<Vec<u8>, Socks5Error>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; n];
    r.read_exact(&mut buf)
        .await
        .map_err(|e| read_err(field, e))?;
    Ok(buf)
}

/// read_u8 reads a single unsigned byte
pub async fn read_u8<R>(r: &mut R, field: &'static str) -> Result<u8, Socks5Error>
where
    R: AsyncRead + Unpin,
{
    let [b] = read_array::<R, 1>(r, field).await?;
    Ok(b)
}

/// read_i8 reads a single byte as a two's complement signed quantity
pub async fn read_i8<R>(r: &mut R, field: &'static str) -> Result<i8, Socks5Error>
where
    R: AsyncRead + Unpin,
{
    Ok(read_u8(r, field).await? as i8)
}

/// read_u16_be reads a big-endian (network order) u16, used for ports
pub async fn read_u16_be<R>(r: &mut R, field: &'static str) -> Result<u16, Socks5Error>
where
    R: AsyncRead + Unpin,
{
    Ok(u16::from_be_bytes(read_array(r, field).await?))
}

/// read_len_prefixed reads a 1-byte length followed by that many bytes
pub async fn read_len_prefixed<R>(r: &mut R, field: &'static str) -> Result<Vec<u8>, Socks5Error>
where
    R: AsyncRead + Unpin,
{
    let len = read_u8(r, field).await?;
    read_exact_bytes(r, len as usize, field).await
}

/// read_string_by_len reads `n` bytes and decodes them as UTF-8
pub async fn read_string_by_len<R>(
    r: &mut R,
    n: usize,
    field: &'static str,
) -> Result<String, Socks5Error>
where
    R: AsyncRead + Unpin,
{
    let bytes = read_exact_bytes(r, n, field).await?;
    String::from_utf8(bytes).map_err(|_| Socks5Error::InvalidUtf8(field))
}

/// read_byte_or_eof reads one byte, returning `None` when the peer has
/// already closed the stream
pub async fn read_byte_or_eof<R>(r: &mut R) -> Result<Option<u8>, Socks5Error>
where
    R: AsyncRead + Unpin,
{
    let mut one = [0u8; 1];
    match r.read(&mut one).await? {
        0 => Ok(None),
        _ => Ok(Some(one[0])),
    }
}
