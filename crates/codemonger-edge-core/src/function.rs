//! Viewer-request functions pluggable into the edge data plane.

use crate::event::{ViewerRequest, ViewerRequestEvent, handle_viewer_request};

/// A function run on every viewer request before the origin is consulted.
///
/// Implementations must be cheap and side-effect free: they run inline on
/// the request path, concurrently across connections.
pub trait ViewerRequestFunction: Send + Sync + 'static {
    /// Function name, reported in logs and the function test endpoint.
    fn name(&self) -> &'static str;

    /// Rewrite the request carried by `event`.
    fn handle(&self, event: ViewerRequestEvent) -> ViewerRequest;
}

/// Expands directory-style URIs to their `index.html` document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandIndex;

impl ViewerRequestFunction for ExpandIndex {
    fn name(&self) -> &'static str {
        "expand-index"
    }

    fn handle(&self, event: ViewerRequestEvent) -> ViewerRequest {
        handle_viewer_request(event)
    }
}

/// Returns the request untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl ViewerRequestFunction for PassThrough {
    fn name(&self) -> &'static str {
        "pass-through"
    }

    fn handle(&self, event: ViewerRequestEvent) -> ViewerRequest {
        event.request
    }
}
