//! Viewer-request event model.
//!
//! Mirrors the event shape an edge runtime hands to a viewer-request function:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "context": { "eventType": "viewer-request" },
//!   "request": { "method": "GET", "uri": "/blog", "headers": {} }
//! }
//! ```
//!
//! Only `request.uri` is interpreted. Every other field, at either level, is
//! kept as opaque JSON and serialized back untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EdgeError, EdgeResult};
use crate::expand_index::expand_uri;

/// The request a viewer-request function receives and returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerRequest {
    /// Path, optional query and optional fragment, exactly as received.
    pub uri: String,
    /// Everything else on the request (method, headers, querystring, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ViewerRequest {
    /// Create a request carrying only a URI.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            extra: Map::new(),
        }
    }

    /// Attach an opaque field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

/// The event envelope around a [`ViewerRequest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerRequestEvent {
    /// The request to rewrite.
    pub request: ViewerRequest,
    /// Other top-level fields (`version`, `context`, `viewer`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ViewerRequestEvent {
    /// Wrap a request in an event with no other fields.
    #[must_use]
    pub fn new(request: ViewerRequest) -> Self {
        Self {
            request,
            extra: Map::new(),
        }
    }

    /// Decode an event from its JSON form.
    pub fn from_json(bytes: &[u8]) -> EdgeResult<Self> {
        serde_json::from_slice(bytes).map_err(EdgeError::InvalidEvent)
    }
}

/// Rewrite the request of `event` so directory-style URIs address `index.html`.
///
/// Returns the request with only `uri` replaced.
///
/// # Examples
///
/// ```
/// use codemonger_edge_core::{ViewerRequest, ViewerRequestEvent, handle_viewer_request};
///
/// let event = ViewerRequestEvent::new(ViewerRequest::new("/blog/post001/"));
/// assert_eq!(handle_viewer_request(event).uri, "/blog/post001/index.html");
/// ```
#[must_use]
pub fn handle_viewer_request(event: ViewerRequestEvent) -> ViewerRequest {
    let mut request = event.request;
    request.uri = expand_uri(&request.uri);
    request
}
