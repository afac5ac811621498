//! REST API Server
//!
//! Exposes the resolution pipeline over HTTP/1.1 on the node's hyper
//! infrastructure. Item routes are read-only; each request gets a
//! generated ID that travels through the logs and the response envelope.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::registry::RegistryService;

use super::items;
use super::status;
use super::types::{error_response, success_response};

/// REST API Server
#[derive(Clone)]
pub struct RestApiServer {
    addr: SocketAddr,
    service: Arc<RegistryService>,
    started_at: Instant,
}

impl RestApiServer {
    /// Create a new REST API server
    pub fn new(addr: SocketAddr, service: Arc<RegistryService>) -> Self {
        Self {
            addr,
            service,
            started_at: Instant::now(),
        }
    }

    /// Start the REST API server
    pub async fn start(&self) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("REST API server listening on {}", self.addr);

        let server = Arc::new(self.clone());

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("New REST API connection from {}", addr);
                    let server_clone = Arc::clone(&server);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service =
                            service_fn(move |req| Self::handle_request(server_clone.clone(), req));
                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            debug!("REST API connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept REST API connection: {}", e);
                }
            }
        }
    }

    /// Handle HTTP request
    async fn handle_request(
        server: Arc<Self>,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let method = req.method().clone();
        let uri = req.uri().clone();
        let path = uri.path();

        // Generate request ID for tracing
        let request_id = Uuid::new_v4().to_string();

        debug!(
            "REST API {} {} (request_id: {})",
            method,
            path,
            &request_id[..8]
        );

        // Item routes are read-only
        if method != Method::GET {
            return Ok(error_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                "Only GET is supported",
                None,
                request_id,
            ));
        }

        let response = if path.starts_with("/api/v1/items") {
            items::handle_item_request(&server.service, path, uri.query(), request_id).await
        } else if path == "/api/v1/status" {
            success_response(
                status::node_status(&server.service, server.started_at),
                request_id,
            )
        } else {
            error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Endpoint not found: {}", path),
                None,
                request_id,
            )
        };

        Ok(response)
    }
}
