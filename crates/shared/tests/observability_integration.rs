//! 可观测性模块集成测试
//!
//! 测试 metrics、middleware 与配置的核心功能。
//! 指标测试使用局部 recorder，不依赖全局安装。

// ============================================================================
// 指标记录测试
// ============================================================================

mod metrics_tests {
    use hsa_shared::observability::metrics::{
        record_classifier_call, record_http_request, record_resolution,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;

    /// 在局部 recorder 上执行记录并返回 Prometheus 文本
    fn render_with_local_recorder(record: impl FnOnce()) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, record);
        handle.render()
    }

    /// 查找指标名与全部标签都匹配的样本值
    fn sample(rendered: &str, name: &str, labels: &[&str]) -> Option<f64> {
        rendered
            .lines()
            .filter(|line| !line.starts_with('#'))
            .filter(|line| line.starts_with(&format!("{name}{{")))
            .find(|line| labels.iter().all(|label| line.contains(label)))
            .and_then(|line| line.rsplit(' ').next())
            .and_then(|value| value.parse().ok())
    }

    #[test]
    fn test_record_http_request() {
        let rendered = render_with_local_recorder(|| {
            record_http_request("POST", "/classify", 400, 0.01);
            record_http_request("POST", "/classify", 400, 0.02);
            record_http_request("GET", "/health", 200, 0.001);
        });

        assert_eq!(
            sample(
                &rendered,
                "http_requests_total",
                &[r#"method="POST""#, r#"path="/classify""#, r#"status="400""#]
            ),
            Some(2.0)
        );
        assert_eq!(
            sample(
                &rendered,
                "http_requests_total",
                &[r#"method="GET""#, r#"path="/health""#, r#"status="200""#]
            ),
            Some(1.0)
        );
        assert_eq!(
            sample(
                &rendered,
                "http_request_duration_seconds_count",
                &[r#"path="/classify""#]
            ),
            Some(2.0)
        );
    }

    #[test]
    fn test_record_resolution() {
        let rendered = render_with_local_recorder(|| {
            record_resolution("merchant_gate", "rejected", 0.0001);
            record_resolution("catalog", "resolved", 0.0002);
            record_resolution("estimator", "failed", 30.0);
        });

        for (tier, outcome) in [
            ("merchant_gate", "rejected"),
            ("catalog", "resolved"),
            ("estimator", "failed"),
        ] {
            let tier_label = format!(r#"tier="{tier}""#);
            let outcome_label = format!(r#"outcome="{outcome}""#);
            assert_eq!(
                sample(
                    &rendered,
                    "eligibility_resolutions_total",
                    &[&tier_label, &outcome_label]
                ),
                Some(1.0),
                "{tier}/{outcome}"
            );
        }
        assert_eq!(
            sample(
                &rendered,
                "eligibility_resolution_duration_seconds_count",
                &[r#"tier="estimator""#]
            ),
            Some(1.0)
        );
    }

    #[test]
    fn test_record_classifier_call() {
        let rendered = render_with_local_recorder(|| {
            record_classifier_call("ok", 1.2);
            record_classifier_call("timeout", 30.0);
            record_classifier_call("timeout", 30.0);
        });

        assert_eq!(
            sample(&rendered, "classifier_calls_total", &[r#"outcome="ok""#]),
            Some(1.0)
        );
        assert_eq!(
            sample(&rendered, "classifier_calls_total", &[r#"outcome="timeout""#]),
            Some(2.0)
        );
        assert_eq!(
            sample(&rendered, "classifier_calls_total", &[r#"outcome="malformed""#]),
            None
        );
        assert_eq!(
            sample(
                &rendered,
                "classifier_call_duration_seconds_sum",
                &[r#"outcome="timeout""#]
            ),
            Some(60.0)
        );
    }
}

// ============================================================================
// 中间件测试
// ============================================================================

mod middleware_tests {
    use axum::{Router, body::Body, http::Request, middleware, routing::get};
    use hsa_shared::observability::middleware::{REQUEST_ID_HEADER, http_tracing, request_id};
    use tower::ServiceExt;

    fn test_app() -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn(http_tracing))
            .layer(middleware::from_fn(request_id))
    }

    #[tokio::test]
    async fn test_request_id_generated_when_missing() {
        let response = test_app()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .expect("应生成请求 ID");
        assert!(uuid::Uuid::parse_str(header.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_request_id_propagated_from_upstream() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header(REQUEST_ID_HEADER, "upstream-req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "upstream-req-42"
        );
    }
}

// ============================================================================
// 配置测试
// ============================================================================

mod config_tests {
    use hsa_shared::config::AppConfig;
    use hsa_shared::observability::ObservabilityConfig;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.service_name, "unknown-service");
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_app_config_embeds_observability() {
        let config = AppConfig::default();
        let obs = config
            .observability
            .clone()
            .with_service_name("eligibility-service");
        assert_eq!(obs.service_name, "eligibility-service");
    }
}
