//! End-to-end scenarios run against a loopback server spawned per test,
//! covering the request/response and streaming paths scenario-style.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use fluxhttp::channel;
use fluxhttp::client::{Client, RequestBuilder};
use fluxhttp::server::request::Request;
use fluxhttp::server::response::ResponseBuilder;
use fluxhttp::server::service::{FunctionService, SseService, StreamingService};
use fluxhttp::server::{Router, Server};
use fluxhttp::{HttpChunk, ServerSentEvent, StatusCode};

async fn spawn_server(router: Router) -> SocketAddr {
    let server = Server::builder()
        .router(router)
        .bind("127.0.0.1:0".parse::<SocketAddr>().unwrap())
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.serve());
    addr
}

#[tokio::test]
async fn hello_world_route_returns_its_body() {
    let router = Router::new().get(
        "/hello",
        FunctionService(|_req: Request| async move {
            Ok(ResponseBuilder::new().ok().content_type("text/plain").body("Hello, World!"))
        }),
    );
    let addr = spawn_server(router).await;

    let client = Client::new().unwrap();
    let request = RequestBuilder::new(&format!("http://{addr}/hello")).unwrap().build();
    let response = client.send(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("server").unwrap(), "fluxhttp/server");
    assert_eq!(response.read_full().await.unwrap(), "Hello, World!");
}

#[tokio::test]
async fn path_param_route_binds_the_segment() {
    let router = Router::new().get(
        "/users/:id/posts",
        FunctionService(|req: Request| async move {
            let id = req.path_param("id").unwrap_or_default().to_string();
            Ok(ResponseBuilder::new().ok().body(id))
        }),
    );
    let addr = spawn_server(router).await;

    let client = Client::new().unwrap();
    let request = RequestBuilder::new(&format!("http://{addr}/users/42/posts")).unwrap().build();
    let response = client.send(request).await.unwrap();

    assert_eq!(response.read_full().await.unwrap(), "42");
}

#[tokio::test]
async fn sse_route_streams_three_events_then_ends() {
    let router = Router::new().get(
        "/sse",
        SseService(|_req: Request, tx: channel::Sender<ServerSentEvent>| async move {
            tx.send(ServerSentEvent {
                event: Some("message".into()),
                id: Some("0".into()),
                data: Some("hello".into()),
                retry: None,
            })
            .await
            .unwrap();
            tx.send(ServerSentEvent { id: Some("1".into()), data: Some("world".into()), ..Default::default() })
                .await
                .unwrap();
            tx.send(ServerSentEvent { event: Some("end".into()), ..Default::default() }).await.unwrap();
            Ok(ResponseBuilder::new().ok())
        }),
    );
    let addr = spawn_server(router).await;

    let client = Client::new().unwrap();
    let request = RequestBuilder::new(&format!("http://{addr}/sse")).unwrap().build();
    let response = client.send(request).await.unwrap();
    assert_eq!(response.headers().get("content-type").unwrap(), "text/event-stream");

    let mut rx = response.read_sse().unwrap();
    let mut events = Vec::new();
    while let Ok(Some(event)) = rx.receive().await {
        events.push(event);
    }

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].event.as_deref(), Some("message"));
    assert_eq!(events[0].id.as_deref(), Some("0"));
    assert_eq!(events[0].data.as_deref(), Some("hello"));
    assert_eq!(events[1].id.as_deref(), Some("1"));
    assert_eq!(events[1].data.as_deref(), Some("world"));
    assert_eq!(events[2].event.as_deref(), Some("end"));
}

#[tokio::test]
async fn chunked_route_streams_two_chunks_then_ends() {
    let router = Router::new().get(
        "/chunk",
        StreamingService(|_req: Request, tx: channel::Sender<HttpChunk>| async move {
            tx.send(HttpChunk::new("abc")).await.unwrap();
            tx.send(HttpChunk::new("defg")).await.unwrap();
            Ok(ResponseBuilder::new().ok())
        }),
    );
    let addr = spawn_server(router).await;

    let client = Client::new().unwrap();
    let request = RequestBuilder::new(&format!("http://{addr}/chunk")).unwrap().build();
    let response = client.send(request).await.unwrap();

    let mut rx = response.read_chunks().unwrap();
    let mut chunks = Vec::new();
    while let Ok(Some(chunk)) = rx.receive().await {
        chunks.push(String::from_utf8(chunk.body).unwrap());
    }

    assert_eq!(chunks, vec!["abc".to_string(), "defg".to_string()]);
}

#[tokio::test]
async fn unmatched_route_returns_404_as_plain_text() {
    let router =
        Router::new().get("/hello", FunctionService(|_req: Request| async move { Ok(ResponseBuilder::new().ok().empty()) }));
    let addr = spawn_server(router).await;

    let client = Client::new().unwrap();
    let request = RequestBuilder::new(&format!("http://{addr}/missing")).unwrap().build();
    let response = client.send(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/plain");
}

#[tokio::test]
async fn non_success_status_from_streaming_handler_falls_back_to_empty_body() {
    let router = Router::new().get(
        "/chunk",
        StreamingService(|_req: Request, tx: channel::Sender<HttpChunk>| async move {
            tx.send(HttpChunk::new("never sent")).await.ok();
            Ok(ResponseBuilder::new().bad_request())
        }),
    );
    let addr = spawn_server(router).await;

    let client = Client::new().unwrap();
    let request = RequestBuilder::new(&format!("http://{addr}/chunk")).unwrap().build();
    let response = client.send(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get("transfer-encoding").is_none());
    assert_eq!(response.read_full().await.unwrap(), "");
}

#[tokio::test]
async fn custom_reason_phrase_is_readable_on_the_client() {
    let router = Router::new().get(
        "/teapot",
        FunctionService(|_req: Request| async move {
            Ok(ResponseBuilder::new().status(StatusCode::IM_A_TEAPOT).reason("I'm a little teapot").empty())
        }),
    );
    let addr = spawn_server(router).await;

    let client = Client::new().unwrap();
    let request = RequestBuilder::new(&format!("http://{addr}/teapot")).unwrap().build();
    let response = client.send(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.reason(), "I'm a little teapot");
}

#[tokio::test]
async fn client_follows_a_redirect_chain() {
    let router = Router::new()
        .get(
            "/a",
            FunctionService(|_req: Request| async move {
                Ok(ResponseBuilder::new().status(StatusCode::FOUND).header("location", "/b").empty())
            }),
        )
        .get("/b", FunctionService(|_req: Request| async move { Ok(ResponseBuilder::new().ok().body("done")) }));
    let addr = spawn_server(router).await;

    let client = Client::new().unwrap();
    let request = RequestBuilder::new(&format!("http://{addr}/a")).unwrap().max_redirects(5).build();
    let response = client.send(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.read_full().await.unwrap(), "done");
}

#[tokio::test]
async fn client_times_out_against_a_silent_peer() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = listener.accept().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let client = Client::new().unwrap();
    let request =
        RequestBuilder::new(&format!("http://{addr}/never")).unwrap().timeout(Duration::from_millis(50)).build();

    let started = Instant::now();
    let result = client.send(request).await;

    assert!(result.is_err());
    assert!(result.unwrap_err().is_timeout());
    assert!(started.elapsed() < Duration::from_millis(500));
}
