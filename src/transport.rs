use futures_util::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;

use crate::dns_parser::{self, Message};

/// Largest reply accepted from an upstream server
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// Why an upstream exchange didn't produce an answer
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("couldn't parse reply: {0}")]
    Parse(#[from] dns_parser::Error),
    #[error("exchange with {server} failed: {source}")]
    UpstreamFailure {
        server: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("no reply from {0} in time")]
    UpstreamTimeout(SocketAddr),
    #[error("reply from {0} doesn't match the query")]
    Mismatch(SocketAddr),
    #[error("no upstream server configured")]
    NoUpstream,
}

/// Sends one query to one server and waits for its reply
pub trait Transport: Send + Sync {
    fn exchange<'a>(
        &'a self,
        query: &'a [u8],
        server: SocketAddr,
    ) -> BoxFuture<'a, Result<Message, ResolveError>>;
}

/// Plain DNS over UDP, one socket per exchange
#[derive(Debug, Clone)]
pub struct UdpTransport {
    timeout: Duration,
}

impl UdpTransport {
    pub fn new(timeout: Duration) -> UdpTransport {
        UdpTransport { timeout }
    }

    /// Sends `query` to `server` and parses the first datagram that comes back
    ///
    /// The socket lives for this single exchange and is closed on every
    /// path out of here.
    pub async fn send_datagram(
        &self,
        query: &[u8],
        server: SocketAddr,
    ) -> Result<Message, ResolveError> {
        let failure = |source| ResolveError::UpstreamFailure { server, source };

        let bind_addr = match server.ip() {
            IpAddr::V4(_) => SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0),
            IpAddr::V6(_) => SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), 0),
        };
        let socket = UdpSocket::bind(bind_addr).await.map_err(failure)?;
        socket.connect(server).await.map_err(failure)?;

        let sent = socket.send(query).await.map_err(failure)?;
        debug!("sent {} bytes to {}", sent, server);

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let received = tokio::time::timeout(self.timeout, socket.recv(&mut recv_buf))
            .await
            .map_err(|_| ResolveError::UpstreamTimeout(server))?
            .map_err(failure)?;
        recv_buf.truncate(received);
        debug!("received {} bytes from {}", received, server);

        let reply = Message::parse_lenient(&recv_buf)?;
        if reply.header.query {
            warn!("{} answered with a query", server);
        }
        Ok(reply)
    }
}

impl Transport for UdpTransport {
    fn exchange<'a>(
        &'a self,
        query: &'a [u8],
        server: SocketAddr,
    ) -> BoxFuture<'a, Result<Message, ResolveError>> {
        self.send_datagram(query, server).boxed()
    }
}
