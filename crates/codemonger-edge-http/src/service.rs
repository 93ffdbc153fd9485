//! The edge HTTP service implementing hyper's `Service` trait.
//!
//! [`EdgeHttpService`] plays the part of a content distribution in front of a
//! static-contents origin. It handles:
//!
//! 1. Health check interception (`GET /_health`, `/health`, `/_edge/health`)
//! 2. The function test endpoint (`POST /_edge/functions/viewer-request/test`)
//! 3. Method filtering (only `GET` and `HEAD` reach the origin)
//! 4. The viewer-request hook ([`ViewerRequestFunction`])
//! 5. Origin fetch and object response (`ETag`, `Cache-Control`, `304`)
//! 6. Common response headers (`x-amz-cf-id`, `Server`, `Via`)

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::Service;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use codemonger_edge_core::expand_index::split_at_first;
use codemonger_edge_core::{EdgeConfig, ViewerRequest, ViewerRequestEvent, ViewerRequestFunction};

use crate::error::EdgeHttpError;
use crate::origin::Origin;
use crate::response::{ObjectResponseOptions, error_to_response, json_response, object_response};

/// Path of the function test endpoint.
pub const FUNCTION_TEST_PATH: &str = "/_edge/functions/viewer-request/test";

/// Configuration for the edge HTTP service.
#[derive(Debug, Clone)]
pub struct EdgeHttpConfig {
    /// Cache lifetime advertised on served objects.
    pub cache_ttl: Duration,
}

impl Default for EdgeHttpConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(1),
        }
    }
}

impl From<&EdgeConfig> for EdgeHttpConfig {
    fn from(config: &EdgeConfig) -> Self {
        Self {
            cache_ttl: config.cache_ttl(),
        }
    }
}

/// The edge HTTP service.
///
/// # Type Parameters
///
/// - `F`: The viewer-request function run on every origin-bound request.
/// - `O`: The origin objects are fetched from.
#[derive(Debug)]
pub struct EdgeHttpService<F: ViewerRequestFunction, O: Origin> {
    function: Arc<F>,
    origin: Arc<O>,
    config: Arc<EdgeHttpConfig>,
}

impl<F: ViewerRequestFunction, O: Origin> EdgeHttpService<F, O> {
    /// Create a new edge service.
    #[must_use]
    pub fn new(function: F, origin: O, config: EdgeHttpConfig) -> Self {
        Self {
            function: Arc::new(function),
            origin: Arc::new(origin),
            config: Arc::new(config),
        }
    }

    /// The viewer-request function of this service.
    #[must_use]
    pub fn function(&self) -> &F {
        &self.function
    }
}

impl<F: ViewerRequestFunction, O: Origin> Clone for EdgeHttpService<F, O> {
    fn clone(&self) -> Self {
        Self {
            function: Arc::clone(&self.function),
            origin: Arc::clone(&self.origin),
            config: Arc::clone(&self.config),
        }
    }
}

impl<F, O, B> Service<http::Request<B>> for EdgeHttpService<F, O>
where
    F: ViewerRequestFunction,
    O: Origin,
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Display + Send,
{
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let response = service.process_request(req, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

impl<F: ViewerRequestFunction, O: Origin> EdgeHttpService<F, O> {
    /// Process an incoming HTTP request through the edge pipeline.
    async fn process_request<B>(
        &self,
        req: http::Request<B>,
        request_id: &str,
    ) -> http::Response<Full<Bytes>>
    where
        B: http_body::Body + Send,
        B::Error: Display,
    {
        let method = req.method().clone();
        let uri = req.uri().clone();
        debug!(%method, %uri, request_id, "processing edge request");

        // 1. Health check interception.
        if is_health_check(&method, uri.path()) {
            return health_check_response();
        }

        // 2. Function test endpoint.
        if uri.path() == FUNCTION_TEST_PATH {
            if method != http::Method::POST {
                return error_to_response(&EdgeHttpError::method_not_allowed(&method), request_id);
            }
            return match self.test_function(req).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(error = %err, request_id, "function test rejected");
                    error_to_response(&err, request_id)
                }
            };
        }

        // 3. Only GET and HEAD are forwarded to the origin.
        if method != http::Method::GET && method != http::Method::HEAD {
            warn!(%method, %uri, request_id, "method not allowed");
            return error_to_response(&EdgeHttpError::method_not_allowed(&method), request_id);
        }

        // 4. Viewer-request hook.
        let (parts, _body) = req.into_parts();
        let event = viewer_request_event(&parts);
        let original_uri = event.request.uri.clone();
        let rewritten = self.function.handle(event);
        if rewritten.uri != original_uri {
            info!(
                function = self.function.name(),
                from = %original_uri,
                to = %rewritten.uri,
                request_id,
                "rewrote viewer request"
            );
        }

        // 5. Origin fetch.
        let result = match object_key(&rewritten.uri) {
            Ok(key) => self.origin.get_object(key).await,
            Err(err) => Err(err),
        };
        let object = match result {
            Ok(object) => object,
            Err(err) => {
                debug!(error = %err, request_id, "origin returned error");
                return error_to_response(&err, request_id);
            }
        };

        let if_none_match = parts
            .headers
            .get(http::header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok());
        object_response(
            object,
            ObjectResponseOptions {
                head: method == http::Method::HEAD,
                if_none_match,
                cache_ttl: self.config.cache_ttl,
            },
        )
    }

    /// Run the viewer-request function on an event posted by the client.
    async fn test_function<B>(
        &self,
        req: http::Request<B>,
    ) -> Result<http::Response<Full<Bytes>>, EdgeHttpError>
    where
        B: http_body::Body + Send,
        B::Error: Display,
    {
        let body = collect_body(req.into_body()).await?;
        let event = ViewerRequestEvent::from_json(&body)
            .map_err(|e| EdgeHttpError::invalid_argument(e.to_string()))?;
        let request = self.function.handle(event);

        let mut response = json_response(&request);
        if let Ok(hv) = http::header::HeaderValue::from_str(self.function.name()) {
            response.headers_mut().insert("x-edge-function", hv);
        }
        Ok(response)
    }
}

/// Collect the full body into `Bytes`.
async fn collect_body<B>(body: B) -> Result<Bytes, EdgeHttpError>
where
    B: http_body::Body,
    B::Error: Display,
{
    body.collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| EdgeHttpError::invalid_argument(format!("Failed to read request body: {e}")))
}

/// Build the viewer-request event for an HTTP request.
///
/// The request carries the raw path and query as `uri` plus the method and
/// headers in the edge runtime's shape (`{"name": {"value": "..."}}`). A
/// repeated header keeps its first value in `value` and lists every value
/// under `multiValue`.
fn viewer_request_event(parts: &http::request::Parts) -> ViewerRequestEvent {
    let uri = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_owned(), ToString::to_string);

    let mut headers = Map::new();
    for name in parts.headers.keys() {
        let values: Vec<&str> = parts
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        let Some(first) = values.first() else {
            continue;
        };
        let mut header = json!({ "value": first });
        if values.len() > 1 {
            header["multiValue"] = values
                .iter()
                .map(|value| json!({ "value": value }))
                .collect();
        }
        headers.insert(name.as_str().to_owned(), header);
    }

    let request = ViewerRequest::new(uri)
        .with_field("method", Value::String(parts.method.as_str().to_owned()))
        .with_field("headers", Value::Object(headers));

    let mut event = ViewerRequestEvent::new(request);
    event.extra.insert("version".to_owned(), json!("1.0"));
    event
        .extra
        .insert("context".to_owned(), json!({ "eventType": "viewer-request" }));
    event
}

/// Derive the origin object key from a rewritten URI.
///
/// Query and fragment are dropped, the path is percent-decoded, and the
/// leading `/` removed.
fn object_key(uri: &str) -> Result<String, EdgeHttpError> {
    let (path, _fragment) = split_at_first(uri, '#');
    let (path, _query) = split_at_first(path, '?');
    let decoded = percent_decode_str(path).decode_utf8().map_err(|e| {
        EdgeHttpError::invalid_argument("Object key is not valid UTF-8")
            .with_resource(path)
            .with_source(e)
    })?;
    Ok(decoded.trim_start_matches('/').to_owned())
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET
        && (path == "/_health" || path == "/health" || path == "/_edge/health")
}

/// Produce a health check response.
fn health_check_response() -> http::Response<Full<Bytes>> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from_static(
            br#"{"status":"running","service":"edge"}"#,
        )))
        .expect("static health response should be valid")
}

/// Add common response headers to every edge response.
fn add_common_headers(
    mut response: http::Response<Full<Bytes>>,
    request_id: &str,
) -> http::Response<Full<Bytes>> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::header::HeaderValue::from_str(request_id) {
        headers.insert("x-amz-cf-id", hv);
    }

    headers.insert(
        "Server",
        http::header::HeaderValue::from_static("CodemongerEdge"),
    );
    headers.insert(
        "Via",
        http::header::HeaderValue::from_static("1.1 codemonger-edge"),
    );

    response
}
