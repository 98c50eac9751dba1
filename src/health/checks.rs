//! Health check probes.
//!
//! A probe is any `(cancel, address) → Result<(), ProbeError>` async function.
//! `Ok(())` means the upstream is healthy. Probes should return promptly once
//! the token is cancelled; the health loop additionally bounds every probe with
//! its configured timeout.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::{BoxFuture, FutureExt};
use http_body_util::{BodyExt, Empty};
use hyper::header::{HOST, USER_AGENT};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;

/// Boxed future returned by a probe.
pub type CheckFuture = BoxFuture<'static, Result<(), ProbeError>>;

/// Pluggable health check function.
pub type CheckFn = Arc<dyn Fn(CancellationToken, String) -> CheckFuture + Send + Sync>;

/// Wrap an async closure into a [`CheckFn`].
pub fn check_fn<F, Fut>(f: F) -> CheckFn
where
    F: Fn(CancellationToken, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ProbeError>> + Send + 'static,
{
    Arc::new(move |cancel: CancellationToken, addr: String| -> CheckFuture {
        f(cancel, addr).boxed()
    })
}

/// Probe for a general TCP server: connect, then close.
pub fn tcp_check() -> CheckFn {
    check_fn(|cancel: CancellationToken, addr: String| async move {
        let stream = tokio::select! {
            res = TcpStream::connect(addr.as_str()) => res?,
            _ = cancel.cancelled() => return Err(ProbeError::Failed("cancelled".to_string())),
        };
        drop(stream);
        Ok(())
    })
}

/// Probe for an HTTP server.
///
/// Sends `GET path` over a connection dialed to the upstream address itself.
/// A status code of 400 or above is a failure.
pub fn http_check(path: impl Into<String>) -> CheckFn {
    let path: String = path.into();
    check_fn(move |cancel: CancellationToken, addr: String| {
        let path = path.clone();
        async move {
            let status = tokio::select! {
                res = http_get_status(&addr, &path) => res?,
                _ = cancel.cancelled() => return Err(ProbeError::Failed("cancelled".to_string())),
            };
            if status >= 400 {
                return Err(ProbeError::Status(status));
            }
            Ok(())
        }
    })
}

async fn http_get_status(addr: &str, path: &str) -> Result<u16, ProbeError> {
    let stream = TcpStream::connect(addr).await?;
    let (mut sender, conn) =
        hyper::client::conn::http1::handshake::<_, Empty<Bytes>>(TokioIo::new(stream)).await?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!(error = %e, "Health check connection closed with error");
        }
    });

    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(HOST, addr)
        .header(USER_AGENT, "rrdialer-health-check")
        .body(Empty::<Bytes>::new())
        .map_err(|e| ProbeError::Failed(format!("invalid health check request: {}", e)))?;

    let response = sender.send_request(request).await?;
    let status = response.status().as_u16();
    // Drain so the connection shuts down cleanly.
    let _ = response.into_body().collect().await;

    Ok(status)
}
