use std::future::Future;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::trace;

use crate::TransportError;

/// One request datagram out, one reply datagram back.
pub trait Transport {
    fn exchange(
        &self,
        server: SocketAddrV4,
        query: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

#[derive(Debug, Clone)]
pub struct UdpTransport {
    read_timeout: Duration,
    buffer_size: usize,
}

impl UdpTransport {
    pub fn new(read_timeout: Duration, buffer_size: usize) -> Self {
        Self {
            read_timeout,
            buffer_size,
        }
    }
}

impl Transport for UdpTransport {
    async fn exchange(&self, server: SocketAddrV4, query: &[u8]) -> Result<Vec<u8>, TransportError> {
        let sock = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(TransportError::Bind)?;

        sock.connect(server)
            .await
            .map_err(|source| TransportError::Connect { server, source })?;

        sock.send(query)
            .await
            .map_err(|source| TransportError::Send { server, source })?;

        let mut buf = vec![0; self.buffer_size];
        let len = timeout(self.read_timeout, sock.recv(&mut buf))
            .await
            .map_err(|_| TransportError::Timeout {
                server,
                after: self.read_timeout,
            })?
            .map_err(|source| TransportError::Recv { server, source })?;

        trace!(%server, len, "received reply");
        buf.truncate(len);

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exchanges_one_datagram() {
        let server = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let std::net::SocketAddr::V4(addr) = server.local_addr().unwrap() else {
            unreachable!()
        };

        tokio::spawn(async move {
            let mut buf = [0; 512];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            buf[..len].reverse();
            server.send_to(&buf[..len], peer).await.unwrap();
        });

        let transport = UdpTransport::new(Duration::from_secs(2), 512);
        let reply = transport.exchange(addr, &[1, 2, 3]).await.unwrap();
        assert_eq!(reply, [3, 2, 1]);
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let server = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let std::net::SocketAddr::V4(addr) = server.local_addr().unwrap() else {
            unreachable!()
        };

        let transport = UdpTransport::new(Duration::from_millis(50), 512);
        let err = transport.exchange(addr, &[0]).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout { .. }));
        assert!(err.is_transient());
        drop(server);
    }
}
