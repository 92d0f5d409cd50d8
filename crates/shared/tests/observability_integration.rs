//! 可观测性模块集成测试
//!
//! 测试 metrics 记录函数与 HTTP 中间件在真实 axum 路由上的行为。

mod metrics_tests {
    use rewards_shared::observability::metrics::{
        record_commit_conflict, record_http_request, record_reward, record_reward_amount,
    };

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/accounts", 200, 0.05);
        record_http_request("POST", "/api/rewards", 200, 0.12);
        record_http_request("GET", "/api/accounts/{id}", 404, 0.01);
        record_http_request("POST", "/api/rewards", 500, 0.25);
    }

    #[test]
    fn test_record_reward_statuses() {
        record_reward("rewarded", 0.02);
        record_reward("not_eligible", 0.01);
        record_reward("duplicate", 0.005);
        record_reward("failed", 0.03);
        record_reward_amount(0);
        record_reward_amount(800);
        record_commit_conflict();
    }

    #[test]
    fn test_metrics_with_edge_cases() {
        record_http_request("", "", 0, 0.0);

        let long_path = "/api/".to_string() + &"x".repeat(1000);
        record_http_request("GET", &long_path, 200, 0.01);

        record_reward("rewarded", 999.99);
        record_reward_amount(u64::MAX);
    }
}

mod middleware_tests {
    use axum::{
        Extension, Router,
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use rewards_shared::observability::middleware::{
        REQUEST_ID_HEADER, RequestId, http_tracing, request_id,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/echo",
                get(|Extension(id): Extension<RequestId>| async move { id.0 }),
            )
            .layer(middleware::from_fn(request_id))
            .layer(middleware::from_fn(http_tracing))
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let response = app()
            .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let header = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(!header.to_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_id_is_propagated_from_upstream() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header(REQUEST_ID_HEADER, "upstream-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "upstream-42"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"upstream-42");
    }

    #[tokio::test]
    async fn test_http_tracing_passes_through_not_found() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
