// Examples are allowed to use expect/unwrap for simplicity
#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Fantasma One-Shot Exchange Example
//!
//! Drives a single ping/pong HTTP exchange through the harness with byte
//! tracing enabled. No socket is opened at any point.
//!
//! # Usage
//!
//! ```bash
//! # Run the exchange with traced reads and writes
//! cargo run --example run_once
//!
//! # Include the call stack of each transport operation
//! RUST_LOG=trace cargo run --example run_once
//! ```

use std::time::Duration;

use bytes::Bytes;
use fantasma::prelude::*;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let (client_io, server_io) = tokio::io::duplex(4096);

    let outcome = Exchange::new(
        move |done: CompletionGuard| async move {
            tokio::spawn(async move {
                let (mut sender, conn) =
                    hyper::client::conn::http1::handshake(TokioIo::new(client_io))
                        .await
                        .expect("client handshake");
                tokio::spawn(conn);

                let req = Request::builder()
                    .method(Method::POST)
                    .uri("/hello")
                    .header(hyper::header::HOST, "demo.server")
                    .body(Full::new(Bytes::from_static(b"ping")))
                    .expect("request");
                let response = sender.send_request(req).await.expect("response");

                let status = response.status();
                let body = response
                    .into_body()
                    .collect()
                    .await
                    .expect("response body")
                    .to_bytes();
                tracing::info!(status = %status, body = %String::from_utf8_lossy(&body), "client finished");
                done.done();
            });
            Ok(Box::new(server_io) as BoxConn)
        },
        |req: ExchangeRequest| async move {
            let body = req
                .into_body()
                .collect()
                .await
                .expect("request body")
                .to_bytes();
            tracing::info!(body = %String::from_utf8_lossy(&body), "handler invoked");
            Response::new(Full::new(Bytes::from_static(b"pong")))
        },
    )
    .with_trace(TraceLevel::On)
    .with_timeout(Duration::from_secs(1))
    .run_once()
    .await;

    match outcome {
        Ok(()) => tracing::info!("exchange completed cleanly"),
        Err(err) => tracing::error!(error = %err, "exchange failed"),
    }
}
