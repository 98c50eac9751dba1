//! HTTP client transport.
//!
//! Lets a hyper-util client dial through a [`Dialer`]: the request URI's
//! authority is ignored and the upstream comes from the rotation.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use hyper::Uri;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::error::DialError;
use crate::load_balancer::Dialer;
use crate::net::dial::{Network, TcpDial};

/// `tower::Service<Uri>` connector backed by a round-robin dialer.
#[derive(Debug, Clone)]
pub struct DialerConnector {
    dialer: Arc<Dialer<TcpDial>>,
    timeout: Option<Duration>,
}

impl DialerConnector {
    pub fn new(dialer: Arc<Dialer<TcpDial>>) -> Self {
        Self { dialer, timeout: None }
    }

    /// Bound every dial attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl tower::Service<Uri> for DialerConnector {
    type Response = TokioIo<TcpStream>;
    type Error = DialError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let dialer = Arc::clone(&self.dialer);
        let timeout = self.timeout;
        async move {
            let stream = match timeout {
                Some(timeout) => dialer.connect_timeout(Network::Tcp, timeout).await?,
                None => dialer.connect(Network::Tcp).await?,
            };
            tracing::trace!(uri = %dst, peer = ?stream.peer_addr().ok(), "Dialed upstream");
            Ok(TokioIo::new(stream))
        }
        .boxed()
    }
}
