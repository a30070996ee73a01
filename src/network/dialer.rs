//! Dialer
//!
//! Opens connections to the API endpoint. Injected into the client so calls
//! can be exercised without a live network.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::Connection;
use crate::context::Context;

/// Opens connections; shared between concurrent calls
pub trait Dialer: Send + Sync {
    type Conn: Connection;

    /// Connect to `address`, giving up when `ctx` is cancelled or expires
    fn dial_context(&self, ctx: &Context, network: &str, address: &str) -> io::Result<Self::Conn>;

    /// Connect to `address` with no cancellation
    fn dial(&self, network: &str, address: &str) -> io::Result<Self::Conn> {
        self.dial_context(&Context::background(), network, address)
    }
}

/// Plain TCP dialer with a per-attempt connect timeout
#[derive(Debug, Clone)]
pub struct TcpDialer {
    timeout: Duration,
}

impl TcpDialer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connect timeout for the next attempt: ours, capped by the context
    fn attempt_timeout(&self, ctx: &Context) -> io::Result<Duration> {
        ctx.check()?;
        let timeout = match ctx.remaining() {
            Some(left) => left.min(self.timeout),
            None => self.timeout,
        };
        if timeout.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "dial timeout is zero"));
        }
        Ok(timeout)
    }
}

/// Resolve `address`, keeping only the families `network` allows
fn resolve(network: &str, address: &str) -> io::Result<Vec<SocketAddr>> {
    let family: fn(&SocketAddr) -> bool = match network {
        "tcp" => |_| true,
        "tcp4" => SocketAddr::is_ipv4,
        "tcp6" => SocketAddr::is_ipv6,
        other => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported network {:?}", other),
            ))
        }
    };

    let addrs: Vec<SocketAddr> = address.to_socket_addrs()?.filter(family).collect();
    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no {} addresses found for {}", network, address),
        ));
    }
    Ok(addrs)
}

impl Dialer for TcpDialer {
    type Conn = TcpStream;

    fn dial_context(&self, ctx: &Context, network: &str, address: &str) -> io::Result<TcpStream> {
        ctx.check()?;
        let addrs = resolve(network, address)?;

        let mut last_err = None;
        for addr in addrs {
            let timeout = self.attempt_timeout(ctx)?;
            tracing::debug!("Dialing {} (timeout {:?})", addr, timeout);

            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    // Disable Nagle's algorithm; requests are a single small write
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!("Connection to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("could not dial {}", address))
        }))
    }
}
