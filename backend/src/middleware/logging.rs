use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header::CONTENT_LENGTH, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::middleware::request_id::RequestId;

const MAX_BUFFERED_BODY_BYTES: usize = 64 * 1024;
const MAX_LOGGED_BODY_BYTES: usize = 2048;

/// Logs every 4xx/5xx response with a bounded preview of its body. 5xx goes
/// out at `error`, 4xx at `warn`. The buffered body is forwarded unchanged.
pub async fn log_error_responses(req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let uri = req.uri().to_string();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let latency_ms = start.elapsed().as_millis() as u64;
    let (mut parts, body) = response.into_parts();
    let (body, preview) = match to_bytes(body, MAX_BUFFERED_BODY_BYTES).await {
        Ok(bytes) => {
            let preview = preview(&bytes);
            (Body::from(bytes), preview)
        }
        Err(err) => {
            parts.headers.remove(CONTENT_LENGTH);
            (Body::empty(), format!("<unreadable body: {err}>"))
        }
    };

    let status = status.as_u16();
    if status >= 500 {
        tracing::error!(
            status,
            method,
            uri,
            request_id,
            latency_ms,
            body = %preview,
            "request failed"
        );
    } else {
        tracing::warn!(
            status,
            method,
            uri,
            request_id,
            latency_ms,
            body = %preview,
            "request rejected"
        );
    }

    Response::from_parts(parts, body)
}

fn preview(bytes: &Bytes) -> String {
    if bytes.len() > MAX_LOGGED_BODY_BYTES {
        format!(
            "{}... (truncated, {} bytes total)",
            String::from_utf8_lossy(&bytes[..MAX_LOGGED_BODY_BYTES]),
            bytes.len()
        )
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_truncated_in_the_preview() {
        let bytes = Bytes::from(vec![b'a'; MAX_LOGGED_BODY_BYTES + 10]);
        let text = preview(&bytes);
        assert!(text.ends_with(&format!("(truncated, {} bytes total)", MAX_LOGGED_BODY_BYTES + 10)));
    }

    #[test]
    fn short_bodies_are_logged_whole() {
        let bytes = Bytes::from_static(br#"{"code":"CONFLICT"}"#);
        assert_eq!(preview(&bytes), r#"{"code":"CONFLICT"}"#);
    }
}
