//! Request handlers.
//!
//! `Service` is an `async_trait` object with variants for plain,
//! chunked-streaming, SSE-streaming, pre-request, and after-response
//! handlers — each handler just `await`s.

use async_trait::async_trait;

use crate::channel::{self, Receiver};
use crate::error::Result;
use crate::message::HttpChunk;

use super::request::Request;
use super::response::{OutgoingResponse, ResponseBuilder};

#[async_trait]
pub trait Service: Send + Sync {
    async fn handle(&self, request: Request) -> Result<OutgoingResponse>;
}

/// Wraps a plain async function into a [`Service`], mirroring
/// `function_service`.
pub struct FunctionService<F>(pub F);

#[async_trait]
impl<F, Fut> Service for FunctionService<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<OutgoingResponse>> + Send,
{
    async fn handle(&self, request: Request) -> Result<OutgoingResponse> {
        (self.0)(request).await
    }
}

/// A service that streams its body through a [`Receiver<HttpChunk>`] it
/// hands to a spawned producer, mirroring `chunked_service`: the caller's
/// closure gets the request and a sender, and returns once the header is
/// ready to go out (the body keeps streaming after that).
pub struct StreamingService<F>(pub F);

#[async_trait]
impl<F, Fut> Service for StreamingService<F>
where
    F: Fn(Request, channel::Sender<HttpChunk>) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<ResponseBuilder>> + Send,
{
    async fn handle(&self, request: Request) -> Result<OutgoingResponse> {
        let (tx, rx) = channel::channel();
        let builder = (self.0)(request, tx).await?;
        if builder.current_status().is_success() {
            Ok(builder.streaming(rx))
        } else {
            Ok(builder.empty())
        }
    }
}

/// Same as [`StreamingService`] but the producer sends
/// [`crate::message::ServerSentEvent`]s, which this wraps into
/// [`HttpChunk`]s and tags `Content-Type: text/event-stream`, mirroring
/// `sse_service`.
pub struct SseService<F>(pub F);

#[async_trait]
impl<F, Fut> Service for SseService<F>
where
    F: Fn(Request, channel::Sender<crate::message::ServerSentEvent>) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<ResponseBuilder>> + Send,
{
    async fn handle(&self, request: Request) -> Result<OutgoingResponse> {
        let (sse_tx, mut sse_rx) = channel::channel::<crate::message::ServerSentEvent>();
        let (chunk_tx, chunk_rx) = channel::channel::<HttpChunk>();

        tokio::spawn(async move {
            loop {
                match sse_rx.receive().await {
                    Ok(Some(event)) => {
                        if !event.valid() {
                            continue;
                        }
                        if chunk_tx.send(event.to_chunk()).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(_) => break,
                }
            }
        });

        let builder = (self.0)(request, sse_tx).await?;
        if builder.current_status().is_success() {
            Ok(builder.sse(chunk_rx))
        } else {
            Ok(builder.empty())
        }
    }
}

/// Rewrites the incoming request before handing it to `inner`, mirroring
/// `pre_request_service`.
pub struct PreRequestService<F> {
    pub handler: F,
    pub inner: Box<dyn Service>,
}

#[async_trait]
impl<F, Fut> Service for PreRequestService<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Request> + Send,
{
    async fn handle(&self, request: Request) -> Result<OutgoingResponse> {
        let request = (self.handler)(request).await;
        self.inner.handle(request).await
    }
}

/// Rewrites the outcome of `inner`, mirroring `after_response_service`.
pub struct AfterResponseService<F> {
    pub handler: F,
    pub inner: Box<dyn Service>,
}

#[async_trait]
impl<F, Fut> Service for AfterResponseService<F>
where
    F: Fn(Result<OutgoingResponse>) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<OutgoingResponse>> + Send,
{
    async fn handle(&self, request: Request) -> Result<OutgoingResponse> {
        let response = self.inner.handle(request).await;
        (self.handler)(response).await
    }
}
