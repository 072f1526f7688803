use log::{debug, error, trace, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::UdpSocket, sync::mpsc};

use crate::resolver::Resolver;

/// Largest datagram read off the listening socket
const MAX_DATAGRAM_SIZE: usize = 65536;

#[derive(Clone, Debug)]
pub enum Command {
    Shutdown,
}

/// The UDP listener: every datagram is resolved on its own task
pub struct Server {
    socket: Arc<UdpSocket>,
    resolver: Arc<Resolver>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl Server {
    // Will panic if called from outside the context of a runtime
    pub fn new(
        socket: std::net::UdpSocket,
        resolver: Arc<Resolver>,
    ) -> io::Result<(Server, mpsc::UnboundedSender<Command>)> {
        let socket = UdpSocket::from_std(socket)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let server = Server {
            socket: Arc::new(socket),
            resolver,
            commands: rx,
        };

        Ok((server, tx))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serves until told to shut down or every command sender is gone
    pub async fn run(mut self) {
        let mut recv_buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Shutdown) => {
                        debug!("server shutting down");
                        return;
                    }
                    None => {
                        warn!("server disconnected without shutdown");
                        return;
                    }
                },
                received = self.socket.recv_from(&mut recv_buf) => match received {
                    Ok((len, addr)) => self.handle_packet(recv_buf[..len].to_vec(), addr),
                    Err(err) => error!("couldn't receive packet: {:?}", err),
                },
            }
        }
    }

    fn handle_packet(&self, packet: Vec<u8>, addr: SocketAddr) {
        trace!("received {} bytes from {:?}", packet.len(), addr);

        let socket = self.socket.clone();
        let resolver = self.resolver.clone();
        tokio::spawn(async move {
            let response = match resolver.handle_datagram(&packet).await {
                Some(response) => response,
                None => return,
            };

            trace!("sending packet to {:?}", addr);
            match socket.send_to(&response, addr).await {
                Ok(sent) if sent == response.len() => (),
                Ok(_) => warn!("failed to send entire packet"),
                Err(err) => warn!("error sending packet {:?}", err),
            }
        });
    }
}
