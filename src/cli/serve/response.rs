//! HTTP response handlers for the in-memory artifact server.

use anyhow::Result;
use tiny_http::{Header, Method, Request, Response};

use crate::build::BuiltArtifact;
use crate::utils::mime;

fn header(field: &str, value: &str) -> Header {
    Header::from_bytes(field.as_bytes(), value.as_bytes()).expect("static header")
}

fn is_head_request(request: &Request) -> bool {
    *request.method() == Method::Head
}

/// Base headers for every response.
///
/// Artifacts are served under both the logical and the fingerprinted name
/// and mutate on every rebuild, so the development server always opts out
/// of caching; fingerprint-based immutable caching is a production
/// concern handled by whatever fronts the written output directory.
fn base_headers(content_type: &str, cors: bool) -> Vec<Header> {
    let mut headers = vec![
        header("Content-Type", content_type),
        header("Cache-Control", "no-cache"),
    ];
    if cors {
        headers.push(header("Access-Control-Allow-Origin", "*"));
    }
    headers
}

fn send(request: Request, status: u16, content_type: &str, cors: bool, body: Vec<u8>) -> Result<()> {
    let headers = base_headers(content_type, cors);

    if is_head_request(&request) {
        let mut response = Response::empty(status);
        for h in headers {
            response.add_header(h);
        }
        request.respond(response)?;
        return Ok(());
    }

    let mut response = Response::from_data(body).with_status_code(status);
    for h in headers {
        response.add_header(h);
    }
    request.respond(response)?;
    Ok(())
}

/// Respond with a cached artifact from memory.
pub fn respond_artifact(request: Request, artifact: &BuiltArtifact, cors: bool) -> Result<()> {
    let content_type = mime::from_extension(Some(artifact.artifact.kind.output_ext()));
    send(
        request,
        200,
        content_type,
        cors,
        artifact.artifact.bytes.clone(),
    )
}

/// Respond with a JSON body (manifest, status endpoint).
pub fn respond_json(request: Request, json: String, cors: bool) -> Result<()> {
    send(request, 200, mime::types::JSON, cors, json.into_bytes())
}

/// Respond with 404 for filenames no cached artifact answers to.
pub fn respond_not_found(request: Request, cors: bool) -> Result<()> {
    send(
        request,
        404,
        mime::types::PLAIN,
        cors,
        b"404 Not Found".to_vec(),
    )
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send(
        request,
        503,
        mime::types::PLAIN,
        false,
        b"503 Service Unavailable".to_vec(),
    )
}
