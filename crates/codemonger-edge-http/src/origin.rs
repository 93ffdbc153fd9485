//! Contents origin behind the edge.
//!
//! The data plane asks an [`Origin`] for an object by key once the
//! viewer-request function has run. [`DirectoryOrigin`] serves a local
//! directory the way the contents bucket serves the published site: keys are
//! relative paths, directories are not objects.

use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::EdgeHttpError;

/// An object fetched from the origin.
#[derive(Debug, Clone)]
pub struct OriginObject {
    /// Key the object was stored under.
    pub key: String,
    /// Object contents.
    pub body: Bytes,
    /// Content type derived from the key.
    pub content_type: mime::Mime,
    /// Quoted entity tag.
    pub etag: String,
    /// Last modification time, if known.
    pub last_modified: Option<DateTime<Utc>>,
}

impl OriginObject {
    /// Build an object, deriving content type and ETag from key and body.
    #[must_use]
    pub fn new(key: impl Into<String>, body: impl Into<Bytes>) -> Self {
        let key = key.into();
        let body = body.into();
        Self {
            content_type: content_type_for(&key),
            etag: etag_for(&body),
            key,
            body,
            last_modified: None,
        }
    }
}

/// Source of the objects served at the edge.
pub trait Origin: Send + Sync + 'static {
    /// Fetch the object stored under `key`.
    ///
    /// Returns `NoSuchKey` when nothing is stored under the key.
    fn get_object(
        &self,
        key: String,
    ) -> Pin<Box<dyn Future<Output = Result<OriginObject, EdgeHttpError>> + Send>>;
}

/// Origin serving files below a root directory.
///
/// ```
/// use codemonger_edge_http::{DirectoryOrigin, Origin};
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
/// let origin = DirectoryOrigin::new(dir.path());
///
/// # tokio_test::block_on(async {
/// let object = origin.get_object("index.html".to_owned()).await.unwrap();
/// assert_eq!(object.body.as_ref(), b"<h1>home</h1>");
/// assert!(origin.get_object("blog".to_owned()).await.is_err());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryOrigin {
    root: Arc<PathBuf>,
}

impl DirectoryOrigin {
    /// Serve files below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }
}

impl Origin for DirectoryOrigin {
    fn get_object(
        &self,
        key: String,
    ) -> Pin<Box<dyn Future<Output = Result<OriginObject, EdgeHttpError>> + Send>> {
        let root = Arc::clone(&self.root);
        Box::pin(async move { read_object(&root, key).await })
    }
}

async fn read_object(root: &Path, key: String) -> Result<OriginObject, EdgeHttpError> {
    let Some(relative) = key_to_relative_path(&key) else {
        tracing::debug!(key = %key, "rejected object key");
        return Err(EdgeHttpError::no_such_key(key));
    };
    let path = root.join(relative);

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(EdgeHttpError::no_such_key(key)),
        Err(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
            ) =>
        {
            return Err(EdgeHttpError::no_such_key(key));
        }
        Err(e) => return Err(io_error(&key, e)),
    };

    // Symlinks must not lead outside the root.
    let canonical_root = tokio::fs::canonicalize(root)
        .await
        .map_err(|e| io_error(&key, e))?;
    let canonical_path = tokio::fs::canonicalize(&path)
        .await
        .map_err(|e| io_error(&key, e))?;
    if !canonical_path.starts_with(&canonical_root) {
        tracing::warn!(
            key = %key,
            path = %canonical_path.display(),
            "object key escapes origin root"
        );
        return Err(EdgeHttpError::no_such_key(key));
    }

    let body = tokio::fs::read(&canonical_path)
        .await
        .map_err(|e| io_error(&key, e))?;

    let mut object = OriginObject::new(key, body);
    object.last_modified = metadata.modified().ok().map(DateTime::<Utc>::from);
    Ok(object)
}

fn io_error(key: &str, e: std::io::Error) -> EdgeHttpError {
    tracing::error!(key, error = %e, "failed to read object from origin");
    EdgeHttpError::internal_error("Failed to read object from origin")
        .with_resource(key)
        .with_source(e)
}

/// Map an object key onto a relative file path.
///
/// Returns `None` for keys that cannot name a file below the root: empty
/// keys, absolute paths, and any `.`/`..` component.
fn key_to_relative_path(key: &str) -> Option<&Path> {
    if key.is_empty() || key.contains('\0') || key.contains('\\') {
        return None;
    }
    let path = Path::new(key);
    path.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(path)
}

/// Content type for an object key, from its extension.
#[must_use]
pub fn content_type_for(key: &str) -> mime::Mime {
    let extension = key
        .rsplit_once('.')
        .filter(|(_, ext)| !ext.contains('/'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html" | "htm") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js" | "mjs") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("json") => mime::APPLICATION_JSON,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        Some("xml") => mime::TEXT_XML,
        Some("svg") => mime::IMAGE_SVG,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("woff") => mime::FONT_WOFF,
        Some("woff2") => mime::FONT_WOFF2,
        Some("pdf") => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Quoted hex SHA-256 ETag of `body`.
#[must_use]
pub fn etag_for(body: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(body)))
}
