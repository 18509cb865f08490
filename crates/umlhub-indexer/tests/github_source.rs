//! `GitHubSource` against a local stub of the contents API.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::runtime::Runtime;
use umlhub_indexer::{ContentSource, GitHubSource, SourceError};

#[derive(Clone, Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

struct StubServer {
    _runtime: Runtime,
    addr: SocketAddr,
}

impl StubServer {
    fn start(router: Router) -> Self {
        let runtime = Runtime::new().unwrap();
        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let addr = listener.local_addr().unwrap();
        runtime.spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self {
            _runtime: runtime,
            addr,
        }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

#[derive(serde::Deserialize)]
struct RefQuery {
    #[serde(rename = "ref")]
    git_ref: String,
}

async fn contents(
    State(rec): State<Recorder>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    Query(query): Query<RefQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .map(|v| v.to_str().unwrap().to_owned());
    rec.requests.lock().unwrap().push((
        format!("{owner}/{repo}/{path}@{}", query.git_ref),
        auth,
    ));

    if path == "missing.md" {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"})));
    }
    if path == "garbage.md" {
        return (StatusCode::OK, Json(json!({"name": "garbage.md"})));
    }

    // "@startuml\nA -> B\n@enduml" wrapped the way the API wraps content
    (
        StatusCode::OK,
        Json(json!({
            "encoding": "base64",
            "content": "QHN0YXJ0dW1s\nCkEgLT4gQgpA\nZW5kdW1s\n",
        })),
    )
}

fn start(rec: &Recorder) -> StubServer {
    let router = Router::new()
        .route("/repos/{owner}/{repo}/contents/{*path}", get(contents))
        .with_state(rec.clone());
    StubServer::start(router)
}

#[test]
fn test_fetch_decodes_content_and_sends_token() {
    let rec = Recorder::default();
    let server = start(&rec);
    let source = GitHubSource::new(
        server.url(),
        Some("secret".to_owned()),
        Duration::from_secs(5),
    );

    let doc = source
        .fetch("https://github.com/acme/docs/blob/main/design/flows.md")
        .unwrap();

    assert_eq!(doc.text, "@startuml\nA -> B\n@enduml");
    assert_eq!(
        doc.origin_url,
        "https://github.com/acme/docs/blob/main/design/flows.md"
    );
    assert_eq!(
        rec.requests.lock().unwrap().clone(),
        vec![(
            "acme/docs/design/flows.md@main".to_owned(),
            Some("token secret".to_owned())
        )]
    );
}

#[test]
fn test_fetch_without_token_sends_no_authorization() {
    let rec = Recorder::default();
    let server = start(&rec);
    let source = GitHubSource::new(server.url(), None, Duration::from_secs(5));

    source
        .fetch("https://github.com/acme/docs/blob/v2/README.md")
        .unwrap();

    assert_eq!(rec.requests.lock().unwrap()[0].1, None);
}

#[test]
fn test_fetch_status_error() {
    let rec = Recorder::default();
    let server = start(&rec);
    let source = GitHubSource::new(server.url(), None, Duration::from_secs(5));

    let err = source
        .fetch("https://github.com/acme/docs/blob/main/missing.md")
        .unwrap_err();

    assert!(matches!(err, SourceError::Status { status: 404, .. }));
}

#[test]
fn test_fetch_response_without_content() {
    let rec = Recorder::default();
    let server = start(&rec);
    let source = GitHubSource::new(server.url(), None, Duration::from_secs(5));

    let err = source
        .fetch("https://github.com/acme/docs/blob/main/garbage.md")
        .unwrap_err();

    assert!(matches!(err, SourceError::Malformed(_)));
}

#[test]
fn test_unrecognized_url_makes_no_request() {
    let rec = Recorder::default();
    let server = start(&rec);
    let source = GitHubSource::new(server.url(), None, Duration::from_secs(5));

    let err = source.fetch("https://example.com/a.md").unwrap_err();

    assert!(err.is_input_error());
    assert!(rec.requests.lock().unwrap().is_empty());
}

#[test]
fn test_transport_failure() {
    let source = GitHubSource::new("http://127.0.0.1:1", None, Duration::from_secs(2));

    let err = source
        .fetch("https://github.com/acme/docs/blob/main/README.md")
        .unwrap_err();

    assert!(matches!(err, SourceError::Http(_)));
}
