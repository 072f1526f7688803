use log::debug;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;

pub mod cache;
pub mod config;
pub mod dns_parser;
mod net;
pub mod resolver;
mod server;
pub mod transport;
pub mod zone;

pub use crate::cache::Cache;
pub use crate::config::{Config, ConfigError, ForwardingConfig, RecursionConfig};
pub use crate::net::bind_udp;
pub use crate::resolver::Resolver;
pub use crate::transport::{ResolveError, Transport, UdpTransport};
pub use crate::zone::{NoZones, StaticZone, ZoneLookup};

use crate::server::Command;

/// A resolver listening on UDP, served from a thread of its own
///
/// The listener stops when the handle is dropped.
pub struct Server {
    handle: Option<thread::JoinHandle<()>>,
    commands: mpsc::UnboundedSender<Command>,
    local_addr: SocketAddr,
    resolver: Arc<Resolver>,
}

impl Server {
    /// Serves `config` without any zone data
    pub fn new(config: Config) -> io::Result<Server> {
        Server::with_zones(config, Arc::new(NoZones))
    }

    pub fn with_zones(config: Config, zones: Arc<dyn ZoneLookup>) -> io::Result<Server> {
        let listen_addr = config.listen_addr();
        let resolver = Resolver::new(config, zones)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let resolver = Arc::new(resolver);
        let socket = net::bind_udp(listen_addr)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (server, commands) = {
            let _guard = runtime.enter();
            server::Server::new(socket, resolver.clone())?
        };
        let local_addr = server.local_addr()?;

        let handle = thread::Builder::new()
            .name("dns-resolver".to_owned())
            .spawn(move || runtime.block_on(server.run()))?;
        debug!("listening on {}", local_addr);

        Ok(Server {
            handle: Some(handle),
            commands,
            local_addr,
            resolver,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if self.commands.send(Command::Shutdown).is_err() {
            debug!("server already stopped");
        }
        self.handle.take().map(|h| h.join());
    }
}
