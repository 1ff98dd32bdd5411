//! Static asset delivery
//!
//! `Filer` turns a request into a response using any [`AssetSource`]: it
//! derives the logical path, falls back to the directory index, infers the
//! content type and streams the asset. It is the only place where resolution
//! outcomes become HTTP status codes.

use crate::asset::{Asset, AssetError, AssetSource, FileSystemSource};
use crate::http::{self, mime, AssetBody, DEFAULT_CHUNK_SIZE};
use hyper::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use std::io;
use std::path::Path;

/// Default directory index file name
pub const DEFAULT_INDEX_FILE: &str = "index.html";

/// Serves assets from a single source
#[derive(Debug, Clone)]
pub struct Filer<S> {
    source: S,
    index_file: String,
    chunk_size: usize,
}

impl Filer<FileSystemSource> {
    /// Serve files from `dir`, relative to the current working directory
    pub fn from_dir(dir: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(FileSystemSource::new(dir)?))
    }
}

impl<S: AssetSource> Filer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            index_file: DEFAULT_INDEX_FILE.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the file served when a directory is requested
    #[must_use]
    pub fn with_index_file(mut self, index_file: impl Into<String>) -> Self {
        self.index_file = index_file.into();
        self
    }

    /// Set the maximum size of each streamed body chunk
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Handle a request: `GET` streams the asset, `HEAD` sends headers only
    pub async fn handle<B>(&self, req: &Request<B>) -> Response<AssetBody> {
        let method = req.method();
        if method != Method::GET && method != Method::HEAD {
            log::warn!("Method not allowed: {method}");
            return http::build_405_response();
        }

        let mut response = self.serve(req.uri().path(), HeaderMap::new()).await;
        if method == Method::HEAD {
            // Dropping the streaming body releases the asset
            *response.body_mut() = AssetBody::empty();
        }
        response
    }

    /// Serve the asset at `raw_path`, keeping any headers the caller already set
    ///
    /// A `Content-Type` in `headers` is never overwritten.
    pub async fn serve(&self, raw_path: &str, headers: HeaderMap) -> Response<AssetBody> {
        let Ok(path) = urlencoding::decode(raw_path) else {
            return error_response(&AssetError::InvalidPath, raw_path);
        };

        match self.locate(&path).await {
            Ok(asset) => self.asset_response(asset, headers),
            Err(err) => error_response(&err, &path),
        }
    }

    /// Resolve `path`, retrying once with the index file if it is a directory
    async fn locate(&self, path: &str) -> Result<Asset, AssetError> {
        if self.source.is_directory(path).await? {
            return self.resolve_index(path).await;
        }

        match self.source.resolve(path).await {
            Err(AssetError::IsDirectory) => self.resolve_index(path).await,
            result => result,
        }
    }

    async fn resolve_index(&self, dir: &str) -> Result<Asset, AssetError> {
        let index = format!("{}/{}", dir.trim_end_matches('/'), self.index_file);
        match self.source.resolve(&index).await {
            // A directory without an index is reported as the directory itself
            Err(AssetError::NotFound | AssetError::IsDirectory) => {
                log::debug!("No {} in directory {dir}", self.index_file);
                Err(AssetError::IsDirectory)
            }
            result => result,
        }
    }

    fn asset_response(&self, asset: Asset, mut headers: HeaderMap) -> Response<AssetBody> {
        if !headers.contains_key(CONTENT_TYPE) {
            if let Some(content_type) = mime::content_type(asset.extension()) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }
        if let Some(len) = asset.len {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
        }

        let mut response = Response::new(AssetBody::stream(asset.reader, self.chunk_size));
        *response.headers_mut() = headers;
        response
    }
}

/// Map a resolution failure to its HTTP status
pub const fn status_for(err: &AssetError) -> StatusCode {
    match err {
        AssetError::NotFound | AssetError::IsDirectory => StatusCode::NOT_FOUND,
        AssetError::Forbidden => StatusCode::FORBIDDEN,
        AssetError::InvalidPath => StatusCode::BAD_REQUEST,
        AssetError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &AssetError, path: &str) -> Response<AssetBody> {
    if let AssetError::Io(cause) = err {
        log::error!("Failed to resolve '{path}': {cause}");
    }
    http::build_error_response(status_for(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemorySource;
    use async_trait::async_trait;
    use http_body_util::BodyExt;

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata");

    fn fixture() -> Filer<FileSystemSource> {
        Filer::from_dir(FIXTURE).unwrap()
    }

    fn get(uri: &str) -> Request<()> {
        Request::get(uri).body(()).unwrap()
    }

    async fn body_bytes(response: Response<AssetBody>) -> Vec<u8> {
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    fn fixture_file(name: &str) -> Vec<u8> {
        std::fs::read(Path::new(FIXTURE).join(name)).unwrap()
    }

    #[tokio::test]
    async fn test_serves_javascript() {
        let response = fixture().handle(&get("/test.js")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.contains("javascript"), "got {content_type}");
        let expected = fixture_file("test.js");
        assert_eq!(
            response.headers()[CONTENT_LENGTH],
            expected.len().to_string().as_str()
        );
        assert_eq!(body_bytes(response).await, expected);
    }

    #[tokio::test]
    async fn test_content_type_follows_resolved_path() {
        for uri in ["/test.js/", "/test.js/.", "/nested/../test.js"] {
            let response = fixture().handle(&get(uri)).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap();
            assert!(content_type.contains("javascript"), "{uri}: got {content_type}");
        }

        let filer = Filer::new(MemorySource::new().with_asset("app.js", "run()"));
        let response = filer.handle(&get("/app.js/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .contains("javascript"));
    }

    #[tokio::test]
    async fn test_serves_css() {
        let response = fixture().handle(&get("/test.css")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.contains("text/css"), "got {content_type}");
        assert_eq!(body_bytes(response).await, fixture_file("test.css"));
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        for uri in ["/", "/nested", "/nested/"] {
            let response = fixture().handle(&get(uri)).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            assert!(response.headers()[CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html"));
        }

        let response = fixture().handle(&get("/")).await;
        assert_eq!(body_bytes(response).await, fixture_file("index.html"));
        let response = fixture().handle(&get("/nested/")).await;
        assert_eq!(body_bytes(response).await, fixture_file("nested/index.html"));
    }

    #[tokio::test]
    async fn test_directory_without_index_is_404() {
        let response = fixture().handle(&get("/nested/deeper")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_is_404() {
        let response = fixture().handle(&get("/missing.js")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_bytes(response).await, b"404 Not Found");
    }

    #[tokio::test]
    async fn test_traversal_is_403() {
        for uri in ["/../Cargo.toml", "/nested/../../Cargo.toml", "/%2e%2e/Cargo.toml"] {
            let response = fixture().handle(&get(uri)).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_query_string_is_ignored() {
        let response = fixture().handle(&get("/test.css?v=3")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_extension_leaves_content_type_unset() {
        let response = fixture().handle(&get("/nested/deeper/NOTICE")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn test_preset_content_type_is_preserved() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-custom"));
        headers.insert("x-served-by", HeaderValue::from_static("filer"));

        let response = fixture().serve("/test.js", headers).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/x-custom");
        assert_eq!(response.headers()["x-served-by"], "filer");
    }

    #[tokio::test]
    async fn test_head_has_headers_but_no_body() {
        let req = Request::head("/test.js").body(()).unwrap();
        let response = fixture().handle(&req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(CONTENT_LENGTH));
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_other_methods_are_rejected() {
        let req = Request::post("/test.js").body(()).unwrap();
        let response = fixture().handle(&req).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_invalid_percent_encoding_is_400() {
        let response = fixture().handle(&get("/%ff%fe.js")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_percent_encoded_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello world.txt"), b"spaced").unwrap();
        let filer = Filer::from_dir(dir.path()).unwrap();

        let response = filer.handle(&get("/hello%20world.txt")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"spaced");
    }

    #[tokio::test]
    async fn test_small_chunks_deliver_whole_file() {
        let filer = fixture().with_chunk_size(3);
        let response = filer.handle(&get("/index.html")).await;
        assert_eq!(body_bytes(response).await, fixture_file("index.html"));
    }

    #[tokio::test]
    async fn test_custom_index_file() {
        let source = MemorySource::new().with_asset("/docs/default.htm", "<p>docs</p>");
        let filer = Filer::new(source).with_index_file("default.htm");

        let response = filer.handle(&get("/docs")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"<p>docs</p>");
    }

    #[tokio::test]
    async fn test_memory_source_behaves_like_filesystem() {
        let source = MemorySource::new()
            .with_asset("/index.html", "<h1>home</h1>")
            .with_asset("/app.js", "run();")
            .with_asset("/empty/dir/file.txt", "x");
        let filer = Filer::new(source);

        let response = filer.handle(&get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"<h1>home</h1>");

        let response = filer.handle(&get("/app.js")).await;
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .contains("javascript"));

        assert_eq!(filer.handle(&get("/empty")).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(filer.handle(&get("/nope")).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(filer.handle(&get("/../x")).await.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_trait_object_source() {
        let source: std::sync::Arc<dyn AssetSource> =
            std::sync::Arc::new(MemorySource::new().with_asset("/notes.txt", "dyn"));
        let filer = Filer::new(source);

        let response = filer.handle(&get("/notes.txt")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(body_bytes(response).await, b"dyn");
    }

    /// Source that reports a directory whose index resolution fails with an I/O error
    struct BrokenIndex;

    #[async_trait]
    impl AssetSource for BrokenIndex {
        async fn resolve(&self, _name: &str) -> Result<Asset, AssetError> {
            Err(AssetError::Io(io::Error::other("disk failure")))
        }

        async fn is_directory(&self, _name: &str) -> Result<bool, AssetError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_io_error_is_500() {
        let response = Filer::new(BrokenIndex).handle(&get("/")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&AssetError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&AssetError::IsDirectory), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&AssetError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&AssetError::InvalidPath), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&AssetError::Io(io::Error::other("x"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_file_is_403() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked.js");
        std::fs::write(&locked, b"secret()").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::File::open(&locked).is_ok() {
            return;
        }

        let filer = Filer::from_dir(dir.path()).unwrap();
        let response = filer.handle(&get("/locked.js")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
