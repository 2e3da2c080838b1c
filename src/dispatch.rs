use std::{
    future::Future,
    io,
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

use bstr::ByteSlice;
use rustls::pki_types::ServerName;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::{TcpStream, UdpSocket},
    time::timeout,
};
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

use crate::{
    error::RelayError,
    filter::{self, FilterKind, PolledSource},
    request::RequestState,
    sink::{LINE_ENDING, PacedSink},
    tls,
};

const HTTP_SCHEME: &str = "http://";
const HTTPS_SCHEME: &str = "https://";
const RESPONSE_TERMINATOR: u8 = 0;
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const ROUTE_PROBE: (Ipv4Addr, u16) = (Ipv4Addr::new(8, 8, 8, 8), 80);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub secure: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Target {
    /// # Errors
    /// `UnsupportedScheme` for anything but `http://`/`https://`, `InvalidPort`
    /// when an explicit port is not a number.
    pub fn parse(url: &str) -> Result<Self, RelayError> {
        let (secure, rest) = if let Some(rest) = url.strip_prefix(HTTPS_SCHEME) {
            (true, rest)
        } else if let Some(rest) = url.strip_prefix(HTTP_SCHEME) {
            (false, rest)
        } else {
            return Err(RelayError::UnsupportedScheme);
        };

        let (authority, path) = match rest.find('/') {
            Some(index) => (&rest[..index], &rest[index..]),
            None => (rest, "/"),
        };

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => (
                host,
                port.parse()
                    .map_err(|_| RelayError::InvalidPort(port.to_string()))?,
            ),
            None => (authority, if secure { 443 } else { 80 }),
        };

        Ok(Self {
            secure,
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }
}

#[must_use]
pub fn build_request(request: &RequestState, target: &Target, body: &str) -> Vec<u8> {
    let mut lines = vec![
        format!("{} {} HTTP/1.1", request.method, target.path),
        format!("Host: {}", target.host),
    ];
    lines.extend(
        request
            .headers
            .iter()
            .map(|header| format!("{}: {}", header.key, header.value)),
    );
    if request.method.sends_body() {
        lines.push(format!("Content-Length: {}", body.len()));
    }
    lines.push("Connection: close".to_string());
    lines.push(String::new());

    let mut wire = lines.join(LINE_ENDING);
    wire.push_str(LINE_ENDING);
    if request.method.sends_body() {
        wire.push_str(body);
    }
    wire.into_bytes()
}

pub trait Connection: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Connection for T {}

pub trait Connector {
    fn connect(
        &self,
        target: &Target,
    ) -> impl Future<Output = io::Result<Box<dyn Connection>>> + Send;

    fn local_address(&self) -> impl Future<Output = io::Result<IpAddr>> + Send;
}

#[derive(Clone)]
pub struct TcpConnector {
    connect_timeout: Duration,
    tls: TlsConnector,
}

impl TcpConnector {
    /// # Errors
    /// Propagates TLS configuration failures.
    pub fn new(connect_timeout: Duration) -> Result<Self, RelayError> {
        Ok(Self {
            connect_timeout,
            tls: tls::insecure_connector()?,
        })
    }

    async fn open(&self, target: &Target) -> io::Result<Box<dyn Connection>> {
        let stream = TcpStream::connect((target.host.as_str(), target.port)).await?;
        stream.set_nodelay(true)?;
        if !target.secure {
            return Ok(Box::new(stream));
        }
        let server_name = ServerName::try_from(target.host.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let stream = self.tls.connect(server_name, stream).await?;
        Ok(Box::new(stream))
    }
}

impl Connector for TcpConnector {
    fn connect(
        &self,
        target: &Target,
    ) -> impl Future<Output = io::Result<Box<dyn Connection>>> + Send {
        async move {
            info!(
                "Connecting to {}:{} (tls: {})",
                target.host, target.port, target.secure
            );
            timeout(self.connect_timeout, self.open(target))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))?
        }
    }

    // Connecting a UDP socket only selects a route; nothing is sent.
    fn local_address(&self) -> impl Future<Output = io::Result<IpAddr>> + Send {
        async move {
            let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
            socket.connect(ROUTE_PROBE).await?;
            Ok(socket.local_addr()?.ip())
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExchangeOptions {
    pub markers: bool,
    pub response_timeout: Duration,
    pub drain_grace: Duration,
}

/// Writes `wire` to `connection` and relays the response through `kind`.
///
/// The status line and header block are read ahead (waiting up to
/// `response_timeout` for the blank line) so the status can be announced with
/// `>STATUS`, then replayed so the filter still sees the response from its
/// first byte. Only the body is subject to the non-blocking drain.
///
/// # Errors
/// `Send` when the request cannot be written; sink failures as `Io`.
pub async fn exchange<S, W>(
    mut connection: S,
    wire: &[u8],
    kind: FilterKind,
    sink: &mut PacedSink<W>,
    options: ExchangeOptions,
) -> Result<(), RelayError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    W: AsyncWrite + Unpin,
{
    connection.write_all(wire).await.map_err(RelayError::Send)?;
    connection.flush().await.map_err(RelayError::Send)?;
    debug!("Request written ({} bytes)", wire.len());

    let mut reader = BufReader::new(&mut connection);
    let mut head = Vec::new();
    let read_head = async {
        loop {
            let read = reader.read_until(b'\n', &mut head).await?;
            if read == 0 || head.ends_with(HEADER_TERMINATOR) {
                return Ok::<_, io::Error>(());
            }
        }
    };
    match timeout(options.response_timeout, read_head).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Failed to read response head: {e}"),
        Err(_) => warn!("Timed out waiting for response head"),
    }
    let status_line = head
        .split(|&byte| byte == b'\n')
        .next()
        .unwrap_or_default()
        .trim()
        .to_str_lossy()
        .into_owned();
    info!("Response status: {status_line}");

    if options.markers {
        sink.println(&format!(">STATUS {status_line}")).await?;
        sink.println(">DATA").await?;
    }

    let mut source = PolledSource::new(head.as_slice().chain(&mut reader))
        .with_grace(options.drain_grace);
    filter::run(kind, &mut source, sink).await?;

    sink.println("").await?;
    sink.write_byte(RESPONSE_TERMINATOR).await?;
    if options.markers {
        sink.println(">END").await?;
    }
    sink.flush().await?;

    drop(source);
    if let Err(e) = connection.shutdown().await {
        debug!("Connection shutdown failed: {e}");
    }
    Ok(())
}
