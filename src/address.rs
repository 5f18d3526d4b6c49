use crate::error::Socks5Error;
use crate::protocol::AddressType;
use crate::wire;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::io::AsyncRead;

/// TargetAddr is the destination named in a client command request
#[derive(Debug, Clone, PartialEq)]
pub enum TargetAddr {
    Ipv4(Ipv4Addr, u16),
    Ipv6(Ipv6Addr, u16),
    Domain(String, u16),
}

impl TargetAddr {
    /// host renders the address part as text: dotted decimal, canonical
    /// IPv6 or the domain name as received
    pub fn host(&self) -> String {
        match self {
            TargetAddr::Ipv4(ip, _) => ip.to_string(),
            TargetAddr::Ipv6(ip, _) => ip.to_string(),
            TargetAddr::Domain(domain, _) => domain.clone(),
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ipv4(_, port) | TargetAddr::Ipv6(_, port) | TargetAddr::Domain(_, port) => {
                *port
            }
        }
    }
}

/// Display joins host and port, bracketing IPv6 literals
impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ipv4(ip, port) => write!(f, "{ip}:{port}"),
            TargetAddr::Ipv6(ip, port) => write!(f, "[{ip}]:{port}"),
            TargetAddr::Domain(domain, port) => write!(f, "{domain}:{port}"),
        }
    }
}

/// parse_address_from_stream reads DST.ADDR and DST.PORT for the given
/// address type byte
///
/// ```text
/// +------+----------+----------+
/// | ATYP | DST.ADDR | DST.PORT |
/// +------+----------+----------+
/// |  1   | Variable |    2     |
/// +------+----------+----------+
/// ```
pub async fn parse_address_from_stream<R>(
    stream: &mut R,
    atyp: u8,
) -> Result<TargetAddr, Socks5Error>
where
    R: AsyncRead + Unpin,
{
    let addr_type =
        AddressType::from_byte(atyp).ok_or(Socks5Error::UnsupportedAddressType(atyp))?;

    let target = match addr_type {
        AddressType::IPv4 => {
            let octets: [u8; 4] = wire::read_array(stream, "ipv4 address").await?;
            let port = wire::read_u16_be(stream, "port").await?;
            TargetAddr::Ipv4(Ipv4Addr::from(octets), port)
        }
        AddressType::DomainName => {
            // First octet in DomainName contains the number of
            // octets to follow
            let len = wire::read_u8(stream, "domain length").await?;
            let domain = wire::read_string_by_len(stream, len as usize, "domain").await?;
            let port = wire::read_u16_be(stream, "port").await?;
            TargetAddr::Domain(domain, port)
        }
        AddressType::IPv6 => {
            let octets: [u8; 16] = wire::read_array(stream, "ipv6 address").await?;
            let port = wire::read_u16_be(stream, "port").await?;
            TargetAddr::Ipv6(Ipv6Addr::from(octets), port)
        }
    };

    Ok(target)
}
