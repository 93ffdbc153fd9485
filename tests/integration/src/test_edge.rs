//! End-to-end edge tests over HTTP.

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{client, start_edge};

    async fn get_text(url: &str) -> (reqwest::StatusCode, String) {
        let resp = client().get(url).send().await.expect("GET request");
        let status = resp.status();
        let body = resp.text().await.expect("response body");
        (status, body)
    }

    #[tokio::test]
    async fn test_should_serve_root_index() {
        let edge = start_edge().await;

        let (status, body) = get_text(&edge.url("/")).await;
        assert_eq!(status, reqwest::StatusCode::OK);
        assert_eq!(body, "<h1>codemonger</h1>");
    }

    #[tokio::test]
    async fn test_should_expand_directory_paths() {
        let edge = start_edge().await;

        for path in ["/blog", "/blog/", "/blog/index.html"] {
            let (status, body) = get_text(&edge.url(path)).await;
            assert_eq!(status, reqwest::StatusCode::OK, "{path}");
            assert_eq!(body, "<h1>blog</h1>", "{path}");
        }

        for path in [
            "/blog/post001",
            "/blog/post001/",
            "/blog/post001?param=1&param=2",
            "/blog/post001/?param=1&param=2",
        ] {
            let (status, body) = get_text(&edge.url(path)).await;
            assert_eq!(status, reqwest::StatusCode::OK, "{path}");
            assert_eq!(body, "<h1>post001</h1>", "{path}");
        }
    }

    #[tokio::test]
    async fn test_should_serve_files_with_extension_untouched() {
        let edge = start_edge().await;

        let resp = client()
            .get(edge.url("/codemonger.svg"))
            .send()
            .await
            .expect("GET request");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("image/svg+xml")
        );
    }

    #[tokio::test]
    async fn test_should_expand_dotted_directory_only_with_trailing_slash() {
        let edge = start_edge().await;

        let (status, body) = get_text(&edge.url("/assets.v2/")).await;
        assert_eq!(status, reqwest::StatusCode::OK);
        assert_eq!(body, "<h1>assets</h1>");

        let (status, body) = get_text(&edge.url("/assets.v2")).await;
        assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
        assert!(body.contains("<Code>NoSuchKey</Code>"));
    }

    #[tokio::test]
    async fn test_should_return_no_such_key_for_missing_directory() {
        let edge = start_edge().await;

        let (status, body) = get_text(&edge.url("/blog/post999")).await;
        assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
        assert!(body.contains("<Resource>blog/post999/index.html</Resource>"));
    }

    #[tokio::test]
    async fn test_should_set_edge_headers() {
        let edge = start_edge().await;

        let resp = client()
            .get(edge.url("/blog"))
            .send()
            .await
            .expect("GET request");
        let headers = resp.headers();
        assert!(headers.contains_key("x-amz-cf-id"));
        assert!(headers.contains_key("etag"));
        assert_eq!(
            headers.get("cache-control").and_then(|v| v.to_str().ok()),
            Some("max-age=600")
        );
        assert_eq!(
            headers.get("content-type").and_then(|v| v.to_str().ok()),
            Some("text/html; charset=utf-8")
        );
    }

    #[tokio::test]
    async fn test_should_revalidate_with_etag() {
        let edge = start_edge().await;
        let client = client();

        let first = client
            .get(edge.url("/blog/post001/"))
            .send()
            .await
            .expect("GET request");
        let etag = first
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .expect("etag header")
            .to_owned();

        let second = client
            .get(edge.url("/blog/post001"))
            .header("If-None-Match", etag)
            .send()
            .await
            .expect("conditional GET");
        assert_eq!(second.status(), reqwest::StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_should_serve_head_requests() {
        let edge = start_edge().await;

        let resp = client()
            .head(edge.url("/blog"))
            .send()
            .await
            .expect("HEAD request");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("content-length")
                .and_then(|v| v.to_str().ok()),
            Some("13")
        );
    }

    #[tokio::test]
    async fn test_should_reject_writes() {
        let edge = start_edge().await;

        let resp = client()
            .post(edge.url("/blog"))
            .body("data")
            .send()
            .await
            .expect("POST request");
        assert_eq!(resp.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_should_test_viewer_request_function() {
        let edge = start_edge().await;

        let event = json!({
            "version": "1.0",
            "context": { "eventType": "viewer-request" },
            "request": {
                "method": "GET",
                "uri": "/blog/post001/?param=1&param=2#containing#and/",
                "querystring": { "param": { "value": "1", "multiValue": [{ "value": "1" }, { "value": "2" }] } },
                "cookies": {}
            }
        });

        let resp = client()
            .post(edge.url(codemonger_edge_http::FUNCTION_TEST_PATH))
            .json(&event)
            .send()
            .await
            .expect("function test request");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let request: Value = resp.json().await.expect("json response");
        assert_eq!(
            request["uri"],
            json!("/blog/post001/index.html?param=1&param=2#containing#and/")
        );
        assert_eq!(request["querystring"], event["request"]["querystring"]);
        assert_eq!(request["cookies"], json!({}));
    }

    #[tokio::test]
    async fn test_should_report_health() {
        let edge = start_edge().await;

        let (status, body) = get_text(&edge.url("/_health")).await;
        assert_eq!(status, reqwest::StatusCode::OK);
        let health: Value = serde_json::from_str(&body).expect("json health");
        assert_eq!(health["status"], json!("running"));
    }
}
