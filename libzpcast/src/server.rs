//! HTTP endpoint serving the last cached post

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::cache::{CachedPost, PostCache};

pub const EMPTY_BODY: &str = "There is nothing here.";

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

#[derive(Clone)]
struct ServerState {
    cache: Arc<dyn PostCache>,
}

/// Routes: `/`, `/last.json`, `/last.txt`, `/health`
pub fn router(cache: Arc<dyn PostCache>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/last.json", get(last_json))
        .route("/last.txt", get(last_text))
        .route("/health", get(health))
        .with_state(ServerState { cache })
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve<F>(addr: &str, cache: Arc<dyn PostCache>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = bind(addr).await?;
    serve_listener(listener, cache, shutdown).await
}

pub async fn bind(addr: &str) -> std::io::Result<TcpListener> {
    TcpListener::bind(addr).await
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve_listener<F>(
    listener: TcpListener,
    cache: Arc<dyn PostCache>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;

    tracing::info!("Serving last post on http://{local_addr}");
    axum::serve(listener, router(cache))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

async fn index(State(state): State<ServerState>) -> Response {
    match load(&state).await {
        Ok(Some(cached)) => Html(render_page(&cached)).into_response(),
        Ok(None) => plain(StatusCode::OK, EMPTY_BODY.to_string()),
        Err(response) => response,
    }
}

async fn last_json(State(state): State<ServerState>) -> Response {
    match load(&state).await {
        Ok(Some(cached)) => Json(cached.post).into_response(),
        Ok(None) => plain(StatusCode::NOT_FOUND, EMPTY_BODY.to_string()),
        Err(response) => response,
    }
}

async fn last_text(State(state): State<ServerState>) -> Response {
    match load(&state).await {
        Ok(Some(cached)) => plain(
            StatusCode::OK,
            format!("{}\n\n{}", cached.post.formatted_str, cached.post.link),
        ),
        Ok(None) => plain(StatusCode::NOT_FOUND, EMPTY_BODY.to_string()),
        Err(response) => response,
    }
}

async fn load(state: &ServerState) -> Result<Option<CachedPost>, Response> {
    state.cache.load().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read cached post");
        plain(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to read the last post.".to_string(),
        )
    })
}

fn plain(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, PLAIN_TEXT)], body).into_response()
}

/// Standalone page with the post text and a link to the entry
pub fn render_page(cached: &CachedPost) -> String {
    let post = &cached.post;
    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{entry}</title>
<style>
body {{ font-family: sans-serif; max-width: 40rem; margin: 2rem auto; padding: 0 1rem; }}
.post {{ white-space: pre-wrap; line-height: 1.6; }}
footer {{ color: #666; font-size: 0.85rem; }}
</style>
</head>
<body>
<main>
<p class="post">{text}</p>
<p><a href="{link}">{link_text}</a></p>
</main>
<footer>Posted at <time datetime="{stored_at}">{stored_at}</time></footer>
</body>
</html>
"#,
        entry = escape_html(&post.entry),
        text = escape_html(&post.formatted_str),
        link = escape_html(&post.link),
        link_text = escape_html(&post.link),
        stored_at = cached.stored_at.to_rfc3339(),
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FormattedPost;
    use chrono::Utc;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_page_escapes_post() {
        let cached = CachedPost {
            post: FormattedPost {
                entry: "<fel>".to_string(),
                link: "https://zpdic.ziphil.com/dictionary/633?kind=exact&number=42".to_string(),
                formatted_str: "fel /fɛl/\n\n1. 【en】 <stone>".to_string(),
            },
            stored_at: Utc::now(),
        };

        let page = render_page(&cached);
        assert!(page.contains("<title>&lt;fel&gt;</title>"));
        assert!(page.contains("1. 【en】 &lt;stone&gt;"));
        assert!(page.contains("kind=exact&amp;number=42"));
        assert!(!page.contains("<stone>"));
    }
}
