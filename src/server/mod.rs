//! Static site serving for the dev and production phases
//!
//! Both phases serve a directory plus a default document at `/`. The dev
//! server speaks plain HTTP; the production server terminates TLS with the
//! provisioned certificate pair.

mod port;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use percent_encoding::percent_decode_str;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::tls::CertificateBundle;

pub use port::{allocate_port_on, host_address};

/// A directory served with a default document
#[derive(Debug, Clone)]
pub struct StaticSite {
    /// Directory every non-root path is resolved in
    pub root: PathBuf,

    /// File served at `/`
    pub default_document: PathBuf,

    /// Top-level subdirectories that are never served
    pub hidden: Vec<String>,
}

impl StaticSite {
    pub fn new(root: impl Into<PathBuf>, default_document: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_document: default_document.into(),
            hidden: Vec::new(),
        }
    }

    /// Refuse every path under `/<dir>`
    pub fn hiding(mut self, dir: impl Into<String>) -> Self {
        self.hidden.push(dir.into());
        self
    }

    /// Build the router: `/` is the default document, everything else comes
    /// from the root directory, misses are 404.
    pub fn router(&self) -> Router {
        let hidden: Arc<[String]> = self.hidden.clone().into();
        Router::new()
            .route_service("/", ServeFile::new(&self.default_document))
            .fallback_service(ServeDir::new(&self.root))
            .layer(middleware::from_fn_with_state(hidden, refuse_hidden))
            .layer(TraceLayer::new_for_http())
    }
}

async fn refuse_hidden(State(hidden): State<Arc<[String]>>, request: Request, next: Next) -> Response {
    if is_hidden(request.uri().path(), &hidden) {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

/// Whether `path` lands inside one of the `hidden` top-level directories.
///
/// The path is judged the way the file service will resolve it: percent
/// escapes decoded, empty and `.` segments dropped, `..` applied.
fn is_hidden(path: &str, hidden: &[String]) -> bool {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments
        .first()
        .is_some_and(|first| hidden.iter().any(|dir| first.eq_ignore_ascii_case(dir)))
}

/// Serve `app` over plain HTTP until the process ends
pub async fn serve_http(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Serve `app` over HTTPS with the given key/certificate pair
pub async fn serve_https(addr: SocketAddr, app: Router, certs: &CertificateBundle) -> Result<()> {
    let tls = RustlsConfig::from_pem_file(&certs.cert_path, &certs.key_path)
        .await
        .with_context(|| format!("Failed to load TLS material from {}", certs.cert_path.display()))?;
    info!("Server listening on https://{}", addr);

    axum_server::bind_rustls(addr, tls)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn site() -> (TempDir, StaticSite) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("app.js"), "console.log('app');").unwrap();
        fs::write(dir.path().join("static/logo.png"), "png").unwrap();
        fs::create_dir_all(dir.path().join("ssl")).unwrap();
        fs::write(dir.path().join("ssl/server.key"), "secret").unwrap();
        let site = StaticSite::new(dir.path(), dir.path().join("app.js")).hiding("ssl");
        (dir, site)
    }

    async fn get(site: &StaticSite, uri: &str) -> (StatusCode, String) {
        let response = site
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn test_root_serves_default_document() {
        let (_dir, site) = site();
        let (status, body) = get(&site, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "console.log('app');");
    }

    #[tokio::test]
    async fn test_nested_static_files() {
        let (_dir, site) = site();
        let (status, body) = get(&site, "/static/logo.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "png");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let (_dir, site) = site();
        let (status, _) = get(&site, "/missing.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_hidden_directory_is_not_served() {
        let (_dir, site) = site();
        let (status, body) = get(&site, "/ssl/server.key").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("secret"));
    }

    #[tokio::test]
    async fn test_hidden_directory_survives_path_tricks() {
        let (_dir, site) = site();
        for uri in [
            "/ssl%2Fserver.key",
            "/ssl%2fserver.key",
            "/./ssl/server.key",
            "/%73sl/server.key",
            "/static/../ssl/server.key",
            "/SSL/server.key",
        ] {
            let (status, body) = get(&site, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert!(!body.contains("secret"), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_similarly_named_files_are_served() {
        let (dir, site) = site();
        fs::write(dir.path().join("ssl-notes.txt"), "notes").unwrap();
        let (status, body) = get(&site, "/ssl-notes.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "notes");
    }

    #[test]
    fn test_is_hidden_normalizes_before_matching() {
        let hidden = vec!["ssl".to_string()];
        assert!(is_hidden("/ssl", &hidden));
        assert!(is_hidden("/a/../ssl/x", &hidden));
        assert!(is_hidden("/ssl%5Cserver.key", &hidden));
        assert!(!is_hidden("/", &hidden));
        assert!(!is_hidden("/static/ssl/x", &hidden));
        assert!(!is_hidden("/ssl.js", &hidden));
    }
}
