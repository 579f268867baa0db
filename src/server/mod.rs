//! HTTP request proxy.
//!
//! Every request is `POST /<path>` (or `GET`) with a JSON object of named
//! arguments. The path selects exactly one registered handler; the handler
//! runs on the host loop and the result comes back as a `{data, error}`
//! envelope.

pub mod dispatch;
pub mod registry;
pub mod requests;
pub mod routes;

pub use dispatch::{DispatchOutcome, Dispatcher, RequestEnvelope, ResponseEnvelope};
pub use registry::{Access, Arguments, Handler, HandlerInfo, HandlerRegistry, RegistryError};
pub use routes::default_registry;

use crate::error::HandlerError;
use crate::host::worker::HostWorker;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::http::{Method, Request, Response};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Largest request body read before answering 413.
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Accepts HTTP connections and forwards each request to the host loop.
pub struct ProxyServer {
    worker: HostWorker,
    cancel: CancellationToken,
}

impl ProxyServer {
    pub fn new(worker: HostWorker, cancel: CancellationToken) -> Self {
        Self { worker, cancel }
    }

    /// Serve until the cancellation token fires.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let local: SocketAddr = listener.local_addr()?;
        info!("Request proxy listening on http://{local}");
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Request proxy shutting down");
                    break;
                }
                res = listener.accept() => {
                    let (stream, peer) = res.map_err(|e| anyhow::anyhow!("accept failed: {e}"))?;
                    debug!(peer = %peer, "Accepted connection");
                    let worker = self.worker.clone();
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let svc = service_fn(move |req| handle_request(worker.clone(), req));
                        if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                            error!("http connection error: {err}");
                        }
                    });
                }
            }
        }
        Ok(())
    }
}

async fn handle_request(
    worker: HostWorker,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();
    debug!(method = %method, path = %path, "Request");

    let outcome = if method != Method::POST && method != Method::GET {
        DispatchOutcome::from(HandlerError::MethodNotAllowed(method.to_string()))
    } else {
        match Limited::new(req.into_body(), MAX_REQUEST_BODY_BYTES).collect().await {
            Ok(body) => match worker.dispatch(&path, body.to_bytes()).await {
                Ok(outcome) => outcome,
                Err(e) => DispatchOutcome::from(e),
            },
            Err(e) if e.is::<LengthLimitError>() => {
                DispatchOutcome::from(HandlerError::PayloadTooLarge(MAX_REQUEST_BODY_BYTES))
            }
            Err(e) => DispatchOutcome::from(HandlerError::InvalidParams(format!(
                "failed to read request body: {e}"
            ))),
        }
    };
    Ok(json_response(outcome))
}

fn json_response(outcome: DispatchOutcome) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(&outcome.envelope)
        .unwrap_or_else(|e| format!(r#"{{"data":null,"error":"{e}"}}"#).into_bytes());
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = outcome.status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, hyper::header::HeaderValue::from_static("application/json"));
    response
}
