use crate::address::{TargetAddr, parse_address_from_stream};
use crate::error::Socks5Error;
use crate::protocol::{AddressType, Command, RSV, ReplyCode, Version};
use crate::relay::{self, Side};
use crate::wire;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};
use tracing::{debug, error, info, warn};

/// CommandRequest is the decoded client request
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub version: u8,
    pub command: u8,
    pub reserved: u8,
    pub target: TargetAddr,
}

/// Connect holds the two ends of an established CONNECT session
pub struct Connect<S> {
    pub inbound: S,
    pub outbound: TcpStream,
}

impl<S> Connect<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// run relays between client and target until either side stops
    pub async fn run(self) -> Side {
        let closed_by = relay::relay(self.inbound, self.outbound).await;
        info!("connection closed by {:?}", closed_by);
        closed_by
    }
}

/// handle_socks_request reads the client request, dials the target for
/// CONNECT and writes the command response. Requests that fail after the
/// client started waiting for a response are answered with the matching
/// reply code before the error is returned
pub async fn handle_socks_request<S>(stream: &mut S) -> Result<TcpStream, Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = match read_request(stream).await {
        Ok(request) => request,
        Err(e) => {
            reply_error(stream, &e).await;
            return Err(e);
        }
    };

    if request.version != Version::SOCKS5 as u8 {
        warn!("request carries version {:#04x}, continuing", request.version);
    }

    match Command::from_byte(request.command) {
        Some(Command::Connect) => {
            info!("SOCKS5 CONNECT request to {}", request.target);
            connect_upstream(stream, &request.target).await
        }
        other => {
            match other {
                Some(cmd) => warn!("{} not supported", cmd),
                None => warn!("unknown command {:#04x}", request.command),
            }
            let e = Socks5Error::UnsupportedCommand(request.command);
            reply_error(stream, &e).await;
            Err(e)
        }
    }
}

/// read_request decodes a SOCKS5 request
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
pub async fn read_request<S>(stream: &mut S) -> Result<CommandRequest, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    let [version, command, reserved, atyp] = wire::read_array(stream, "request header").await?;
    let target = parse_address_from_stream(stream, atyp).await?;

    Ok(CommandRequest {
        version,
        command,
        reserved,
        target,
    })
}

/// connect_upstream dials the target and reports the outcome to the client
pub async fn connect_upstream<S>(
    stream: &mut S,
    target: &TargetAddr,
) -> Result<TcpStream, Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    let dialed = match target {
        TargetAddr::Ipv4(ip, port) => TcpStream::connect((*ip, *port)).await,
        TargetAddr::Ipv6(ip, port) => TcpStream::connect((*ip, *port)).await,
        TargetAddr::Domain(domain, port) => TcpStream::connect((domain.as_str(), *port)).await,
    };

    match dialed {
        Ok(outbound) => {
            send_reply(stream, ReplyCode::Succeeded).await?;
            debug!("upstream {} connected", target);
            Ok(outbound)
        }
        Err(source) => {
            error!("failed to connect to {}: {}", target, source);
            let e = Socks5Error::Connect {
                target: target.to_string(),
                source,
            };
            send_reply(stream, e.reply_code()).await?;
            Err(e)
        }
    }
}

/// reply_error answers a failed request when the client still expects a
/// response. Write failures are only logged: the connection is closing anyway
async fn reply_error<S>(stream: &mut S, e: &Socks5Error)
where
    S: AsyncWrite + Unpin,
{
    if !e.expects_reply() {
        return;
    }
    if let Err(write_err) = send_reply(stream, e.reply_code()).await {
        debug!("could not send failure reply: {}", write_err);
    }
}

/// reply_bytes builds the command response. The bound address is always
/// reported as 0.0.0.0:0
pub fn reply_bytes(reply_code: ReplyCode) -> [u8; 10] {
    // SOCKS5 reply format
    // +----+-----+-------+------+----------+----------+
    // |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
    // +----+-----+-------+------+----------+----------+
    // | 1  |  1  | X'00' |  1   | Variable |    2     |
    // +----+-----+-------+------+----------+----------+
    [
        Version::SOCKS5 as u8,
        reply_code as u8,
        RSV,
        AddressType::IPv4 as u8,
        0,
        0,
        0,
        0,
        0,
        0,
    ]
}

/// send_reply writes the command response to the client
pub async fn send_reply<S>(stream: &mut S, reply_code: ReplyCode) -> Result<(), Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&reply_bytes(reply_code)).await?;
    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::{AsyncReadExt, duplex};
    use tokio::net::TcpListener;

    fn connect_request_ipv4(cmd: u8, ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut request = vec![0x05, cmd, 0x00, 0x01];
        request.extend_from_slice(&ip);
        request.extend_from_slice(&port.to_be_bytes());
        request
    }

    #[test]
    fn test_reply_bytes_success() {
        assert_eq!(
            reply_bytes(ReplyCode::Succeeded),
            [0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_reply_bytes_carries_code() {
        assert_eq!(reply_bytes(ReplyCode::ConnectionRefused)[1], 0x05);
        assert_eq!(reply_bytes(ReplyCode::AddrTypeUnsupported)[1], 0x08);
    }

    #[tokio::test]
    async fn test_send_reply() {
        let mut buffer = Vec::new();
        send_reply(&mut buffer, ReplyCode::CommandNotSupported).await.unwrap();
        assert_eq!(buffer, reply_bytes(ReplyCode::CommandNotSupported));
    }

    #[tokio::test]
    async fn test_read_request_ipv4() {
        let mut cursor = Cursor::new(connect_request_ipv4(0x01, [192, 168, 1, 1], 8080));
        let request = read_request(&mut cursor).await.unwrap();

        assert_eq!(request.version, 0x05);
        assert_eq!(request.command, 0x01);
        assert_eq!(request.reserved, 0x00);
        assert_eq!(request.target.to_string(), "192.168.1.1:8080");
    }

    #[tokio::test]
    async fn test_read_request_keeps_bind_command() {
        let mut cursor = Cursor::new(connect_request_ipv4(0x02, [10, 0, 0, 1], 21));
        let request = read_request(&mut cursor).await.unwrap();
        assert_eq!(request.command, 0x02);
    }

    #[tokio::test]
    async fn test_read_request_truncated_header() {
        let mut cursor = Cursor::new(vec![0x05, 0x01]);
        let err = read_request(&mut cursor).await.unwrap_err();
        assert!(matches!(err, Socks5Error::Truncated("request header")));
    }

    #[tokio::test]
    async fn test_unsupported_address_type_is_answered() {
        let (mut client, mut server) = duplex(1024);
        client.write_all(&[0x05, 0x01, 0x00, 0x09]).await.unwrap();

        let err = handle_socks_request(&mut server).await.unwrap_err();
        assert!(matches!(err, Socks5Error::UnsupportedAddressType(0x09)));

        let mut reply = [0u8; 10];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, reply_bytes(ReplyCode::AddrTypeUnsupported));
    }

    #[tokio::test]
    async fn test_bind_is_answered_not_supported() {
        let (mut client, mut server) = duplex(1024);
        client
            .write_all(&connect_request_ipv4(0x02, [127, 0, 0, 1], 80))
            .await
            .unwrap();

        let err = handle_socks_request(&mut server).await.unwrap_err();
        assert!(matches!(err, Socks5Error::UnsupportedCommand(0x02)));

        let mut reply = [0u8; 10];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply[1], ReplyCode::CommandNotSupported as u8);
    }

    #[tokio::test]
    async fn test_truncated_request_is_not_answered() {
        let (mut client, mut server) = duplex(1024);
        client.write_all(&[0x05, 0x01, 0x00, 0x01, 127]).await.unwrap();
        client.shutdown().await.unwrap();

        let err = handle_socks_request(&mut server).await.unwrap_err();
        assert!(matches!(err, Socks5Error::Truncated("ipv4 address")));

        drop(server);
        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_connect_upstream_success() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let target = TargetAddr::Ipv4("127.0.0.1".parse().unwrap(), addr.port());

        let mut buffer = Vec::new();
        let outbound = connect_upstream(&mut buffer, &target).await.unwrap();

        assert_eq!(buffer, reply_bytes(ReplyCode::Succeeded));
        assert_eq!(outbound.peer_addr().unwrap(), addr);
    }

    #[tokio::test]
    async fn test_connect_upstream_refused() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let target = TargetAddr::Ipv4("127.0.0.1".parse().unwrap(), port);
        let mut buffer = Vec::new();
        let err = connect_upstream(&mut buffer, &target).await.unwrap_err();

        assert!(matches!(err, Socks5Error::Connect { .. }));
        assert_eq!(buffer, reply_bytes(ReplyCode::ConnectionRefused));
    }
}
