//! Local HTTP fixture for client tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A canned response.
#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Write the body in this many pieces with a pause between them.
    pub chunks: usize,
}

impl Route {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
            chunks: 1,
        }
    }

    pub fn json(status: u16, body: &str) -> Self {
        Self::new(status, "application/json", body)
    }

    pub fn chunked(mut self, chunks: usize) -> Self {
        self.chunks = chunks.max(1);
        self
    }
}

/// Serve `routes` (keyed by request path, query excluded) on a random local
/// port and return the base URL. Unknown paths get a 404.
pub async fn serve(routes: Vec<(&'static str, Route)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes: Arc<HashMap<&'static str, Route>> = Arc::new(routes.into_iter().collect());

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let _ = respond(stream, &routes).await;
            });
        }
    });

    format!("http://{}", addr)
}

async fn respond(
    mut stream: TcpStream,
    routes: &HashMap<&'static str, Route>,
) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);
    }

    let head = String::from_utf8_lossy(&request);
    let target = head.split_whitespace().nth(1).unwrap_or("/");
    let path = target.split('?').next().unwrap_or("/");

    let route = routes
        .get(path)
        .cloned()
        .unwrap_or_else(|| Route::new(404, "text/plain", "not found"));

    let header = format!(
        "HTTP/1.1 {} Fixture\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.status,
        route.content_type,
        route.body.len()
    );
    stream.write_all(header.as_bytes()).await?;

    let piece = route.body.len().div_ceil(route.chunks).max(1);
    for chunk in route.body.chunks(piece) {
        stream.write_all(chunk).await?;
        stream.flush().await?;
        if route.chunks > 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
    stream.shutdown().await
}
