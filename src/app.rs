/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (gateway trust check / security headers / http)
 * - axum::serve() で起動 (with connect info, so rejected callers can be traced)
 */
use std::{net::SocketAddr, panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    services::{auth::GatewayGate, storage::build_storage_service},
    state::AppState,
};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: fail fast
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting project-gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config);
    let app = build_router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

fn build_state(config: &Config) -> AppState {
    let gate = Arc::new(GatewayGate::new(&config.gateway));
    tracing::info!(
        header = %gate.header_name(),
        digest = %config.gateway.digest,
        actuator_path = %config.gateway.actuator_path,
        "gateway trust check configured"
    );

    let storage = build_storage_service(&config.storage);

    AppState::new(gate, storage)
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let router = Router::new().nest("/project", api::v1::routes());
    let router = middleware::auth::gateway::apply(router, state.clone()).with_state(state);
    let router = middleware::security_headers::apply(router);
    middleware::http::apply(router, max_upload_bytes)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, Bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::services::auth::DigestAlgorithm;
    use crate::services::storage::{MemoryObjectStore, ObjectStoreClient};
    use crate::state::tests::{BUCKET, ENDPOINT, test_state_with};

    const BOUNDARY: &str = "X-PROJECT-GATE-BOUNDARY";

    fn gateway_header() -> String {
        DigestAlgorithm::Sha512.hash("Secret", "Salt")
    }

    fn app() -> (Router, Arc<MemoryObjectStore>) {
        let store = Arc::new(MemoryObjectStore::new(ENDPOINT, BUCKET));
        (build_router(test_state_with(store.clone()), 1024 * 1024), store)
    }

    fn request(method: &str, uri: &str, authed: bool) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        if authed {
            builder.header("x-gateway-auth", gateway_header())
        } else {
            builder
        }
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        request("POST", uri, true)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nDemo\r\n"
            )
            .as_bytes(),
        );
        for (name, data) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"screenShots\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(files: &[(&str, &[u8])], authed: bool) -> Request<Body> {
        request("POST", "/project/files", authed)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(files)))
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn health_is_reachable_without_gateway_header() {
        let (app, _) = app();
        let response = app
            .oneshot(
                request("GET", "/project/actuator/health", false)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_json(response).await, json!({"status": "UP"}));
    }

    #[tokio::test]
    async fn info_reports_package() {
        let (app, _) = app();
        let response = app
            .oneshot(
                request("GET", "/project/actuator/info", false)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["app"]["name"], "project-gate");
    }

    #[tokio::test]
    async fn upload_download_round_trip() {
        let (app, store) = app();
        let png: &[u8] = b"\x89PNG\r\n\x1a\nfake image";

        let response = app
            .clone()
            .oneshot(upload_request(&[("shot.png", png), ("model.txt", &b"erd"[..])], true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(response).await,
            json!({"urls": [
                "https://s3.amazonaws.com/projects/shot.png",
                "https://s3.amazonaws.com/projects/model.txt",
            ]})
        );
        assert_eq!(store.object_count().await, 2);

        let response = app
            .oneshot(
                request("GET", "/project/files/shot.png", true)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(&body_bytes(response).await[..], png);
    }

    #[tokio::test]
    async fn upload_without_gateway_header_is_rejected_and_stores_nothing() {
        let (app, store) = app();
        let response = app
            .oneshot(upload_request(&[("shot.png", &b"data"[..])], false))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "UNAUTHORIZED");
        assert_eq!(store.object_count().await, 0);
    }

    #[tokio::test]
    async fn upload_with_no_file_parts_is_bad_request() {
        let (app, _) = app();
        let response = app.oneshot(upload_request(&[], true)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "NO_FILES");
    }

    #[tokio::test]
    async fn download_missing_is_not_found() {
        let (app, _) = app();
        let response = app
            .oneshot(
                request("GET", "/project/files/ghost.png", true)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn presign_returns_grants_in_order() {
        let (app, store) = app();
        for key in ["a.png", "b.png", "c.png"] {
            store.put(key, Bytes::from_static(b"x")).await.unwrap();
        }

        let response = app
            .oneshot(json_request(
                "/project/presign",
                json!({"urls": [
                    "https://s3.amazonaws.com/projects/c.png",
                    "https://s3.amazonaws.com/projects/a.png",
                    "https://s3.amazonaws.com/projects/b.png",
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let grants = body["grants"].as_array().unwrap();
        assert_eq!(grants.len(), 3);
        for (grant, key) in grants.iter().zip(["c.png", "a.png", "b.png"]) {
            let url = grant["url"].as_str().unwrap();
            assert!(url.contains(&format!("/projects/{key}?")), "{url}");
            assert!(url.contains("X-Amz-Expires=30"), "{url}");
            assert!(grant["expires_at"].is_string());
        }
    }

    #[tokio::test]
    async fn presign_with_missing_object_returns_no_grants() {
        let (app, store) = app();
        store.put("a.png", Bytes::from_static(b"x")).await.unwrap();

        let response = app
            .oneshot(json_request(
                "/project/presign",
                json!({"urls": [
                    "https://s3.amazonaws.com/projects/a.png",
                    "https://s3.amazonaws.com/projects/gone.png",
                ], "ttl_seconds": 60}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body.get("grants").is_none());
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn presign_rejects_foreign_url() {
        let (app, _) = app();
        let response = app
            .oneshot(json_request(
                "/project/presign",
                json!({"urls": ["https://evil.example/projects/a.png"]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "INVALID_REFERENCE"
        );
    }

    #[tokio::test]
    async fn resolve_reports_each_entry() {
        let (app, _) = app();
        let response = app
            .oneshot(json_request(
                "/project/resolve",
                json!({"urls": [
                    "https://s3.amazonaws.com/projects/foo.png",
                    "foo.png",
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["keys"][0]["key"], "foo.png");
        assert!(body["keys"][0].get("error").is_none());
        assert!(body["keys"][1].get("key").is_none());
        assert!(body["keys"][1]["error"].is_string());
    }

    #[tokio::test]
    async fn forged_header_cannot_presign() {
        let (app, store) = app();
        store.put("a.png", Bytes::from_static(b"x")).await.unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/project/presign")
                    .header("x-gateway-auth", "forged")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"urls": ["https://s3.amazonaws.com/projects/a.png"]}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_json(response).await.get("grants").is_none());
    }

    #[tokio::test]
    async fn download_with_control_character_in_key_still_serves_file() {
        let (app, store) = app();
        store
            .put("line\nbreak.png", Bytes::from_static(b"pixels"))
            .await
            .unwrap();

        let response = app
            .oneshot(
                request("GET", "/project/files/line%0Abreak.png", true)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"linebreak.png\""
        );
        assert_eq!(&body_bytes(response).await[..], b"pixels");
    }

    #[tokio::test]
    async fn upload_stops_at_unresolvable_name_and_keeps_earlier_parts() {
        let (app, store) = app();
        let response = app
            .oneshot(upload_request(
                &[
                    ("ok.png", &b"first"[..]),
                    ("https://s3.amazonaws.com/projects/x.png", &b"second"[..]),
                    ("later.png", &b"third"[..]),
                ],
                true,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID_REFERENCE");
        assert!(body.get("urls").is_none());
        assert_eq!(store.object_count().await, 1);
        assert_eq!(store.get("ok.png").await.unwrap(), "first");
    }
}
