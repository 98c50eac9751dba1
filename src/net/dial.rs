//! Dial primitive.
//!
//! The dialer treats establishing a transport connection as a black box:
//! `dial(network, address) → connection or error`.

use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::net::TcpStream;

/// Address family restriction for a dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    /// Any address family.
    #[default]
    Tcp,
    /// IPv4 only.
    Tcp4,
    /// IPv6 only.
    Tcp6,
}

impl Network {
    pub fn accepts(&self, addr: &SocketAddr) -> bool {
        match self {
            Self::Tcp => true,
            Self::Tcp4 => addr.is_ipv4(),
            Self::Tcp6 => addr.is_ipv6(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Tcp4 => write!(f, "tcp4"),
            Self::Tcp6 => write!(f, "tcp6"),
        }
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "tcp4" => Ok(Self::Tcp4),
            "tcp6" => Ok(Self::Tcp6),
            other => Err(format!("unsupported network: {}", other)),
        }
    }
}

/// Establishes a connection to one address.
pub trait Dial: Send + Sync {
    type Conn: Send;

    fn dial(
        &self,
        network: Network,
        address: &str,
    ) -> impl Future<Output = io::Result<Self::Conn>> + Send;
}

/// Plain TCP dialing through Tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDial {
    /// Set `TCP_NODELAY` on established streams.
    pub nodelay: bool,
}

impl Dial for TcpDial {
    type Conn = TcpStream;

    async fn dial(&self, network: Network, address: &str) -> io::Result<TcpStream> {
        let mut last_error = None;
        for addr in tokio::net::lookup_host(address).await? {
            if !network.accepts(&addr) {
                continue;
            }
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    if self.nodelay {
                        stream.set_nodelay(true)?;
                    }
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no {} address for {}", network, address),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_network_parse() {
        assert_eq!("tcp".parse::<Network>().unwrap(), Network::Tcp);
        assert_eq!("tcp6".parse::<Network>().unwrap(), Network::Tcp6);
        assert!("udp".parse::<Network>().is_err());
        assert!(Network::Tcp4.accepts(&"127.0.0.1:80".parse().unwrap()));
        assert!(!Network::Tcp6.accepts(&"127.0.0.1:80".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_tcp_dial() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let dial = TcpDial { nodelay: true };
        assert!(dial.dial(Network::Tcp, &addr).await.is_ok());
        assert_eq!(
            dial.dial(Network::Tcp6, &addr).await.unwrap_err().kind(),
            io::ErrorKind::AddrNotAvailable
        );
    }
}
