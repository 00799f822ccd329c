//! Middleware: wraps a [`Service`] in another `Service`.
//!
//! Provides `Stacked`, `FunctionMiddleware`, `PreRequestMiddleware`, and
//! `AfterResponseMiddleware` implementations, composed via
//! [`ServiceBuilder`].

use std::future::Future;

use super::service::{AfterResponseService, PreRequestService, Service};
use crate::error::Result;
use crate::server::request::Request;
use crate::server::response::OutgoingResponse;

pub trait Middleware: Send + Sync {
    fn layer(&self, service: Box<dyn Service>) -> Box<dyn Service>;
}

/// Composes `inner` then `outer`: `outer.layer(inner.layer(service))`.
pub struct Stacked {
    pub inner: Box<dyn Middleware>,
    pub outer: Box<dyn Middleware>,
}

impl Middleware for Stacked {
    fn layer(&self, service: Box<dyn Service>) -> Box<dyn Service> {
        self.outer.layer(self.inner.layer(service))
    }
}

/// Wraps a plain closure as a [`Middleware`], mirroring
/// `function_middleware`.
pub struct FunctionMiddleware<F>(pub F);

impl<F> Middleware for FunctionMiddleware<F>
where
    F: Fn(Box<dyn Service>) -> Box<dyn Service> + Send + Sync,
{
    fn layer(&self, service: Box<dyn Service>) -> Box<dyn Service> {
        (self.0)(service)
    }
}

/// Builds a [`PreRequestService`] wrapping `inner`, mirroring
/// `pre_request_middleware`.
pub struct PreRequestMiddleware<F>(pub F);

impl<F, Fut> Middleware for PreRequestMiddleware<F>
where
    F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = Request> + Send + 'static,
{
    fn layer(&self, service: Box<dyn Service>) -> Box<dyn Service> {
        Box::new(PreRequestService { handler: self.0.clone(), inner: service })
    }
}

/// Builds an [`AfterResponseService`] wrapping `inner`, mirroring
/// `after_response_middleware`.
pub struct AfterResponseMiddleware<F>(pub F);

impl<F, Fut> Middleware for AfterResponseMiddleware<F>
where
    F: Fn(Result<OutgoingResponse>) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = Result<OutgoingResponse>> + Send + 'static,
{
    fn layer(&self, service: Box<dyn Service>) -> Box<dyn Service> {
        Box::new(AfterResponseService { handler: self.0.clone(), inner: service })
    }
}

/// Composes a stack of middleware and applies it to a base service.
#[derive(Default)]
pub struct ServiceBuilder {
    layers: Vec<Box<dyn Middleware>>,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer; layers apply outermost-last, i.e. the first one added
    /// wraps the base service first and ends up innermost.
    pub fn layer(mut self, middleware: impl Middleware + 'static) -> Self {
        self.layers.push(Box::new(middleware));
        self
    }

    pub fn build(self, service: impl Service + 'static) -> Box<dyn Service> {
        self.layers.into_iter().fold(Box::new(service) as Box<dyn Service>, |svc, layer| layer.layer(svc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::response::ResponseBuilder;
    use crate::server::service::FunctionService;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Service for Echo {
        async fn handle(&self, request: Request) -> Result<OutgoingResponse> {
            Ok(ResponseBuilder::new().ok().body(request.path().to_string()))
        }
    }

    #[tokio::test]
    async fn pre_request_middleware_rewrites_request() {
        let service = ServiceBuilder::new()
            .layer(PreRequestMiddleware(|mut req: Request| async move {
                req.path = "/rewritten".to_string();
                req
            }))
            .build(Echo);

        let req = Request::new(
            http::Method::GET,
            http::Version::HTTP_11,
            "/original",
            http::HeaderMap::new(),
            String::new(),
        );
        let response = service.handle(req).await.unwrap();
        match response {
            OutgoingResponse::Buffered { body, .. } => assert_eq!(body, "/rewritten"),
            _ => panic!("expected buffered response"),
        }
    }

    #[tokio::test]
    async fn function_service_handles_directly() {
        let service = FunctionService(|req: Request| async move {
            Ok(ResponseBuilder::new().ok().body(req.path().to_string()))
        });
        let req = Request::new(
            http::Method::GET,
            http::Version::HTTP_11,
            "/hi",
            http::HeaderMap::new(),
            String::new(),
        );
        let response = service.handle(req).await.unwrap();
        match response {
            OutgoingResponse::Buffered { body, .. } => assert_eq!(body, "/hi"),
            _ => panic!("expected buffered response"),
        }
    }
}
