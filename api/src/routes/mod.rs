pub mod chat;
pub mod health_route;
pub mod products_route;
pub mod status_route;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    core::app_state::AppState,
    middleware_layer::json_extractor::json_error_mapper,
    routes::chat::chat_route::chat,
    routes::health_route::health,
    routes::products_route::{get_product, list_products},
    routes::status_route::status,
};

/// All routes with the JSON rejection envelope and CORS applied.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.cors_origins);
    Router::new()
        .route("/", get(status))
        .route("/chat", post(chat))
        .route("/health", get(health))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .layer(middleware::from_fn(json_error_mapper))
        .layer(cors)
        .with_state(state)
}

/// Explicit origin list with credentials for the shop frontend.
fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins.iter().cloned()))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use std::{future::Future, pin::Pin};

    use ai_llm_service::config::llm_model_config::LlmModelConfig;
    use ai_llm_service::config::llm_provider::LlmProvider;
    use ai_llm_service::service_profiles::LlmServiceProfiles;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use grounding::{
        EvidenceCategory, EvidencePassage, GenerationBackend, GenerationError, GroundingConfig,
        ItemInfo, REFUSAL_TEXT, RetrievalError, StaticCatalog, TemplateLeakClassifier,
        TurnOrchestrator,
    };
    use grounding::retrieve::EvidenceRetriever;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    struct FixedRetriever(Vec<EvidencePassage>);

    impl EvidenceRetriever for FixedRetriever {
        fn retrieve<'a>(
            &'a self,
            _query: &'a str,
            _item_id: i64,
            _top_k: usize,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<EvidencePassage>, RetrievalError>> + Send + 'a>>
        {
            let out = self.0.clone();
            Box::pin(async move { Ok(out) })
        }
    }

    struct FixedBackend {
        available: bool,
        reply: String,
    }

    impl GenerationBackend for FixedBackend {
        fn is_available(&self) -> bool {
            self.available
        }

        fn generate<'a>(
            &'a self,
            _prompt: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
            let out = self.reply.clone();
            Box::pin(async move { Ok(out) })
        }
    }

    /// Gemini profile without a key: never configured, so health checks stay offline.
    fn offline_profiles() -> Arc<LlmServiceProfiles> {
        let cfg = LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-2.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        };
        Arc::new(LlmServiceProfiles::new(cfg.clone(), cfg, Some(1)).unwrap())
    }

    fn catalog() -> Arc<StaticCatalog> {
        Arc::new(StaticCatalog::new([
            (
                2,
                ItemInfo {
                    name: "방수 블루투스 스피커".into(),
                    price: Some(59000),
                    ..Default::default()
                },
            ),
            (
                1,
                ItemInfo {
                    name: "구스 이불".into(),
                    category: Some("침구".into()),
                    ..Default::default()
                },
            ),
        ]))
    }

    fn app(evidence: Vec<EvidencePassage>, available: bool, reply: &str) -> Router {
        let catalog = catalog();
        let orchestrator = TurnOrchestrator::new(
            GroundingConfig::default(),
            Arc::new(FixedRetriever(evidence)),
            Arc::new(FixedBackend {
                available,
                reply: reply.to_string(),
            }),
            catalog.clone(),
            Arc::new(TemplateLeakClassifier),
        );
        router(Arc::new(AppState::new(
            Arc::new(orchestrator),
            offline_profiles(),
            catalog,
        )))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn passage(id: &str, score: f32) -> EvidencePassage {
        EvidencePassage {
            source_id: id.into(),
            category: EvidenceCategory::Description,
            text: "IPX7 등급 방수를 지원합니다.".into(),
            score,
        }
    }

    async fn post_chat(app: Router, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn chat_returns_attributed_answer() {
        let reply = r#"{"answer":"네, IPX7 방수를 지원합니다.","used_source_ids":["d1"]}"#;
        let app = app(vec![passage("d1", 0.3), passage("d2", 0.2)], true, reply);
        let body = json!({"query": "방수 되나요?", "product_id": 7}).to_string();

        let (status, json) = post_chat(app, &body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["answer"], "네, IPX7 방수를 지원합니다.");
        assert_eq!(json["item_id"], 7);
        assert_eq!(json["backend"], "primary");
        assert_eq!(json["sources"].as_array().unwrap().len(), 1);
        assert_eq!(json["sources"][0]["source_id"], "d1");
        assert_eq!(json["sources"][0]["category"], "description");
    }

    #[tokio::test]
    async fn chat_refuses_without_evidence() {
        let (status, json) = post_chat(app(vec![], true, ""), r#"{"query":"q","item_id":1}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["answer"], REFUSAL_TEXT);
        assert_eq!(json["sources"], json!([]));
        assert_eq!(json["suggested_questions"], json!([]));
    }

    #[tokio::test]
    async fn chat_maps_backend_errors() {
        let (status, json) = post_chat(
            app(vec![], true, ""),
            r#"{"query":"q","item_id":1,"backend":"gemini"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "INVALID_BACKEND");

        let (status, json) = post_chat(app(vec![], false, ""), r#"{"query":"q","item_id":1}"#).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "BACKEND_UNAVAILABLE");
    }

    #[tokio::test]
    async fn malformed_body_is_enveloped() {
        let (status, json) = post_chat(app(vec![], true, ""), r#"{"query":"q"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "UNPROCESSABLE_ENTITY");
        assert_eq!(json["error"]["details"][0]["path"], "item_id");

        let (status, json) = post_chat(app(vec![], true, ""), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn health_reports_unconfigured_provider() {
        let (status, json) = get_json(app(vec![], true, ""), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["providers"].as_array().unwrap().len(), 1);
        assert_eq!(json["providers"][0]["ok"], false);
    }

    #[tokio::test]
    async fn lists_and_fetches_products() {
        let (status, json) = get_json(app(vec![], true, ""), "/products").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["id"], 1);
        assert_eq!(json[0]["name"], "구스 이불");
        assert_eq!(json[0]["category"], "침구");
        assert_eq!(json[1]["price"], 59000);

        let (status, json) = get_json(app(vec![], true, ""), "/products/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "방수 블루투스 스피커");

        let (status, json) = get_json(app(vec![], true, ""), "/products/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "ITEM_NOT_FOUND");
    }

    #[tokio::test]
    async fn root_reports_status() {
        let (status, json) = get_json(app(vec![], true, ""), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn cors_allows_listed_origins_only() {
        let preflight = |origin: &str| {
            Request::builder()
                .method("OPTIONS")
                .uri("/chat")
                .header("origin", origin)
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap()
        };

        let resp = app(vec![], true, "")
            .oneshot(preflight("http://localhost:5173"))
            .await
            .unwrap();
        let headers = resp.headers();
        assert_eq!(headers["access-control-allow-origin"], "http://localhost:5173");
        assert_eq!(headers["access-control-allow-credentials"], "true");

        let resp = app(vec![], true, "")
            .oneshot(preflight("http://evil.example"))
            .await
            .unwrap();
        assert!(resp.headers().get("access-control-allow-origin").is_none());
    }
}
