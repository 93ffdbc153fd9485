//! Response construction for the edge data plane.
//!
//! Every response carries a fully buffered [`Full<Bytes>`] body. `HEAD` and
//! `304 Not Modified` answers use an empty one, which reports end-of-stream
//! and an exact size of zero.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::Full;

use crate::error::{EdgeErrorCode, EdgeHttpError};
use crate::origin::OriginObject;

/// Convert an [`EdgeHttpError`] into an HTTP response with an XML body.
#[must_use]
pub fn error_to_response(err: &EdgeHttpError, request_id: &str) -> http::Response<Full<Bytes>> {
    let mut builder = http::Response::builder()
        .status(err.status_code())
        .header(http::header::CONTENT_TYPE, "application/xml");
    if err.code == EdgeErrorCode::MethodNotAllowed {
        builder = builder.header(http::header::ALLOW, "GET, HEAD");
    }

    builder
        .body(Full::new(Bytes::from(err.to_xml(request_id))))
        .unwrap_or_else(|_| {
            http::Response::builder()
                .status(http::StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::default())
                .expect("static response should be valid")
        })
}

/// Serialize `value` as a JSON `200 OK` response.
#[must_use]
pub fn json_response(value: &impl serde::Serialize) -> http::Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(json) => http::Response::builder()
            .status(http::StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(json)))
            .expect("static JSON response should be valid"),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize JSON response");
            http::Response::builder()
                .status(http::StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::default())
                .expect("static response should be valid")
        }
    }
}

/// Options that shape an object response.
#[derive(Debug, Clone, Copy)]
pub struct ObjectResponseOptions<'a> {
    /// Whether the request was `HEAD` (headers only).
    pub head: bool,
    /// Value of the request's `If-None-Match` header.
    pub if_none_match: Option<&'a str>,
    /// Cache lifetime advertised in `Cache-Control`.
    pub cache_ttl: Duration,
}

/// Build the response for an object fetched from the origin.
///
/// Answers `304 Not Modified` when `If-None-Match` matches the object's ETag.
#[must_use]
pub fn object_response(
    object: OriginObject,
    options: ObjectResponseOptions<'_>,
) -> http::Response<Full<Bytes>> {
    let not_modified = options
        .if_none_match
        .is_some_and(|inm| etag_matches(inm, &object.etag));

    let status = if not_modified {
        http::StatusCode::NOT_MODIFIED
    } else {
        http::StatusCode::OK
    };
    tracing::debug!(
        key = %object.key,
        etag = %object.etag,
        status = status.as_u16(),
        head = options.head,
        "serving object"
    );

    let mut builder = http::Response::builder()
        .status(status)
        .header(http::header::ETAG, &object.etag)
        .header(
            http::header::CACHE_CONTROL,
            format!("max-age={}", options.cache_ttl.as_secs()),
        );
    if let Some(modified) = object.last_modified {
        builder = builder.header(http::header::LAST_MODIFIED, http_date(modified));
    }

    if not_modified {
        return builder
            .body(Full::default())
            .expect("not-modified response should be valid");
    }

    builder = builder
        .header(http::header::CONTENT_TYPE, object.content_type.as_ref())
        .header(http::header::CONTENT_LENGTH, object.body.len());

    let body = if options.head {
        Full::default()
    } else {
        Full::new(object.body)
    };

    builder
        .body(body)
        .expect("object response should be valid")
}

/// Whether an `If-None-Match` header value matches `etag`.
///
/// Accepts `*`, a comma-separated list, and weak validators.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

/// Format a timestamp as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`).
#[must_use]
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use http_body_util::BodyExt;

    use http_body::Body;

    use super::*;

    fn object(body: &'static [u8]) -> OriginObject {
        OriginObject {
            key: "index.html".to_owned(),
            body: Bytes::from_static(body),
            content_type: mime::TEXT_HTML_UTF_8,
            etag: "\"abc123\"".to_owned(),
            last_modified: Some(Utc.with_ymd_and_hms(2022, 6, 1, 12, 0, 0).unwrap()),
        }
    }

    fn options() -> ObjectResponseOptions<'static> {
        ObjectResponseOptions {
            head: false,
            if_none_match: None,
            cache_ttl: Duration::from_secs(600),
        }
    }

    async fn body_string(resp: http::Response<Full<Bytes>>) -> String {
        let bytes = resp
            .into_body()
            .collect()
            .await
            .expect("infallible")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    fn header<'a>(resp: &'a http::Response<Full<Bytes>>, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_should_render_error_as_xml() {
        let err = EdgeHttpError::no_such_key("blog/<post>/index.html");
        let resp = error_to_response(&err, "req-1");
        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);
        assert_eq!(header(&resp, "content-type"), Some("application/xml"));

        let xml = body_string(resp).await;
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<Code>NoSuchKey</Code>"));
        assert!(xml.contains("<Resource>blog/&lt;post&gt;/index.html</Resource>"));
        assert!(xml.contains("<RequestId>req-1</RequestId>"));
    }

    #[test]
    fn test_should_advertise_allowed_methods() {
        let err = EdgeHttpError::method_not_allowed(&http::Method::POST);
        let resp = error_to_response(&err, "req-2");
        assert_eq!(resp.status(), http::StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(header(&resp, "allow"), Some("GET, HEAD"));
    }

    #[tokio::test]
    async fn test_should_build_object_response() {
        let resp = object_response(object(b"<html></html>"), options());
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(header(&resp, "content-type"), Some("text/html; charset=utf-8"));
        assert_eq!(header(&resp, "content-length"), Some("13"));
        assert_eq!(header(&resp, "etag"), Some("\"abc123\""));
        assert_eq!(header(&resp, "cache-control"), Some("max-age=600"));
        assert_eq!(
            header(&resp, "last-modified"),
            Some("Wed, 01 Jun 2022 12:00:00 GMT")
        );
        assert_eq!(body_string(resp).await, "<html></html>");
    }

    #[tokio::test]
    async fn test_should_omit_body_for_head() {
        let resp = object_response(
            object(b"<html></html>"),
            ObjectResponseOptions {
                head: true,
                ..options()
            },
        );
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(header(&resp, "content-length"), Some("13"));
        assert!(resp.body().is_end_stream());
        assert_eq!(resp.body().size_hint().exact(), Some(0));
        assert!(body_string(resp).await.is_empty());
    }

    #[test]
    fn test_should_answer_not_modified_on_matching_etag() {
        for inm in ["\"abc123\"", "W/\"abc123\"", "\"x\", \"abc123\"", "*"] {
            let resp = object_response(
                object(b"<html></html>"),
                ObjectResponseOptions {
                    if_none_match: Some(inm),
                    ..options()
                },
            );
            assert_eq!(resp.status(), http::StatusCode::NOT_MODIFIED, "{inm}");
            assert!(resp.headers().get("content-length").is_none());
            assert!(resp.body().is_end_stream());
        }
    }

    #[test]
    fn test_should_serve_on_mismatching_etag() {
        let resp = object_response(
            object(b"<html></html>"),
            ObjectResponseOptions {
                if_none_match: Some("\"other\""),
                ..options()
            },
        );
        assert_eq!(resp.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_build_json_response() {
        let resp = json_response(&serde_json::json!({ "uri": "/index.html" }));
        assert_eq!(header(&resp, "content-type"), Some("application/json"));
        assert_eq!(body_string(resp).await, r#"{"uri":"/index.html"}"#);
    }
}
