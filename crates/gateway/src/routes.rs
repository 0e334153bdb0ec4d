//! Router assembly

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::{limit::ConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::handlers::{catalog, health, kids, launch, packages, policies, reports, services, usage};
use crate::middleware::{
    metrics::track_metrics,
    rate_limit::{create_rate_limiter, rate_limit_middleware},
};
use crate::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let mut api_routes = api_routes().route_layer(middleware::from_fn(track_metrics));

    let rate_limit = &state.config.rate_limit;
    if rate_limit.enabled {
        let limiter = create_rate_limiter(rate_limit.requests_per_second, rate_limit.burst);
        api_routes = api_routes.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    let max_concurrent = state.config.server.max_concurrent_requests.max(1);

    // Compose the app
    Router::new()
        // Health endpoints (no auth, no rate limit)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .nest("/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                // Request ID first so every log line carries it
                .layer(request_id)
                .layer(propagate_id)
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                // Concurrency limit for backpressure
                .layer(ConcurrencyLimitLayer::new(max_concurrent)),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Kid profiles
        .route("/kids", get(kids::list_kids).post(kids::create_kid))
        .route("/kids/{id}", get(kids::get_kid))
        .route("/kids/{id}/policies", get(policies::list_policies))
        .route("/kids/{id}/titles", get(policies::allowed_titles))
        .route("/kids/{id}/titles/{title_id}", get(policies::title_status))
        .route("/kids/{id}/packages", get(packages::packages_for_kid))
        .route("/kids/{id}/packages/applied", get(packages::applied_packages))
        .route("/kids/{id}/package-updates/check", post(packages::check_updates))
        .route("/kids/{id}/time-limits", get(usage::get_kid_limits).put(usage::set_kid_limits))
        .route("/kids/{id}/usage", get(usage::usage_summary))

        // Policies and episode overrides
        .route("/policies", post(policies::set_policy))
        .route(
            "/policies/{id}",
            put(policies::update_policy).delete(policies::delete_policy),
        )
        .route("/policies/{id}/episodes", get(policies::list_policy_episodes))
        .route("/policies/{id}/episodes/{episode_id}", put(policies::set_episode_override))
        .route("/policies/{id}/tags/{tag_id}/episodes", get(policies::episodes_by_tag))
        .route("/policies/{id}/tags/{tag_id}/block", post(policies::block_by_tag))

        // Packages
        .route("/packages", get(packages::list_packages))
        .route("/packages/{id}", get(packages::package_detail))
        .route("/packages/{id}/apply", post(packages::apply_package))
        .route("/packages/{id}/apply/{kid_id}", delete(packages::unapply_package))
        .route("/package-updates", get(packages::pending_updates))
        .route("/package-updates/{id}", post(packages::resolve_update))

        // Launch
        .route("/launch/check", post(launch::check_launch))

        // Time limits, devices and usage
        .route("/time-limits", get(usage::get_family_limits).put(usage::set_family_limits))
        .route("/devices", get(usage::list_devices).post(usage::register_device))
        .route("/usage", post(usage::record_usage))

        // Catalog
        .route("/titles/{id}", get(catalog::get_title))
        .route("/titles/{id}/episodes", get(catalog::list_episodes))
        .route("/titles/{id}/tags", get(catalog::title_tags))
        .route("/tags", get(catalog::list_tags))
        .route("/tag-categories", get(catalog::list_categories))

        // Streaming services
        .route("/services", get(services::list_services))
        .route("/services/selection", get(services::get_selection).put(services::set_selection))

        // Reports
        .route("/reports", post(reports::create_report))

        // Administration
        .route("/admin/titles", post(catalog::upsert_title))
        .route("/admin/titles/{id}/episodes", post(catalog::add_episode))
        .route("/admin/titles/{id}/tags", post(catalog::tag_title))
        .route("/admin/episodes/{id}/tags", post(catalog::tag_episode))
        .route("/admin/tags", post(catalog::create_tag))
        .route(
            "/admin/packages",
            get(packages::admin_list_packages).post(packages::create_package),
        )
        .route(
            "/admin/packages/{id}",
            put(packages::update_package).delete(packages::deactivate_package),
        )
        .route("/admin/packages/{id}/items", post(packages::add_items))
        .route(
            "/admin/packages/{id}/items/{title_id}",
            delete(packages::remove_item),
        )
        .route("/admin/reports", get(reports::list_reports))
        .route("/admin/reports/{id}/approve", post(reports::approve_report))
        .route("/admin/reports/{id}/reject", post(reports::reject_report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{API_KEY_HEADER, DEVICE_ID_HEADER};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use safeview_common::{
        auth::Role,
        config::AppConfig,
        db::{schema, DbPool},
    };
    use sea_orm::{ConnectOptions, Database};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const PARENT: i32 = 1;
    const OTHER_PARENT: i32 = 2;
    const ADMIN: i32 = 99;

    async fn test_state(config: AppConfig) -> AppState {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let conn = Database::connect(opts).await.expect("Failed to open database");
        schema::migrate(&conn).await.expect("Failed to create schema");
        AppState::new(config, DbPool::from_connection(conn))
    }

    fn token(state: &AppState, subject: i32, role: Role, is_admin: bool) -> String {
        state
            .jwt
            .generate_token(subject, role, is_admin)
            .expect("Failed to sign token")
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = app.clone().oneshot(request).await.expect("Request failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Body is not JSON")
        };
        (status, value)
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let state = test_state(AppConfig::default()).await;
        let app = create_router(state);

        let (status, body) = send(&app, "GET", "/health", &[], None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&app, "GET", "/ready", &[], None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["database"]["status"], "up");
    }

    #[tokio::test]
    async fn test_requests_need_a_session() {
        let state = test_state(AppConfig::default()).await;
        let app = create_router(state);

        let (status, body) = send(&app, "GET", "/v1/kids", &[], None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, _) = send(&app, "GET", "/v1/kids", &[("authorization", "Bearer nope")], None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_parent_to_launch_flow() {
        let state = test_state(AppConfig::default()).await;
        let parent = bearer(&token(&state, PARENT, Role::Parent, false));
        let admin = bearer(&token(&state, ADMIN, Role::Parent, true));
        let app = create_router(state.clone());

        let (status, kid) = send(
            &app,
            "POST",
            "/v1/kids",
            &[("authorization", parent.as_str())],
            Some(json!({ "name": "Ada", "age": 6 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let kid_id = kid["id"].as_i64().unwrap() as i32;

        let (status, title) = send(
            &app,
            "POST",
            "/v1/admin/titles",
            &[("authorization", admin.as_str())],
            Some(json!({
                "external_ref": "603",
                "name": "Bluey",
                "media_type": "tv",
                "providers": ["netflix"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let title_id = title["id"].as_i64().unwrap() as i32;

        // parents cannot use admin routes
        let (status, _) = send(
            &app,
            "POST",
            "/v1/admin/titles",
            &[("authorization", parent.as_str())],
            Some(json!({ "external_ref": "1", "name": "x", "media_type": "movie" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let launch = json!({ "kid_profile_id": kid_id, "title_id": title_id, "provider": "netflix" });
        let (status, body) = send(&app, "POST", "/v1/launch/check", &[("authorization", parent.as_str())], Some(launch.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "allowed": false, "reason": "title not allowed" }));

        let (status, _) = send(
            &app,
            "POST",
            "/v1/policies",
            &[("authorization", parent.as_str())],
            Some(json!({ "kid_profile_id": kid_id, "title_id": title_id, "is_allowed": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // the kid's own session may launch
        let kid_session = bearer(&token(&state, kid_id, Role::Kid, false));
        let (status, body) = send(&app, "POST", "/v1/launch/check", &[("authorization", kid_session.as_str())], Some(launch)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], true);
        assert_eq!(body["deep_link"], "https://www.netflix.com/title/603");

        let (status, titles) = send(&app, "GET", &format!("/v1/kids/{}/titles", kid_id), &[("authorization", kid_session.as_str())], None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(titles.as_array().unwrap().len(), 1);

        // but not act for another profile or as a parent
        let (status, _) = send(&app, "GET", &format!("/v1/kids/{}/titles", kid_id + 1), &[("authorization", kid_session.as_str())], None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "GET", "/v1/kids", &[("authorization", kid_session.as_str())], None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let stranger = bearer(&token(&state, OTHER_PARENT, Role::Parent, false));
        let (status, _) = send(&app, "GET", &format!("/v1/kids/{}/policies", kid_id), &[("authorization", stranger.as_str())], None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_device_usage_reporting() {
        let state = test_state(AppConfig::default()).await;
        let parent = bearer(&token(&state, PARENT, Role::Parent, false));
        let kid = state.repo.create_kid_profile(PARENT, "Ada", 6).await.unwrap();
        let app = create_router(state);

        let (status, registration) = send(
            &app,
            "POST",
            "/v1/devices",
            &[("authorization", parent.as_str())],
            Some(json!({ "kid_profile_id": kid.id, "name": "Tablet" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let device_id = registration["device"]["public_id"].as_str().unwrap().to_string();
        let api_key = registration["api_key"].as_str().unwrap().to_string();
        assert!(registration["device"].get("api_key_hash").is_none());

        let headers = [(DEVICE_ID_HEADER, device_id.as_str()), (API_KEY_HEADER, api_key.as_str())];
        let (status, body) = send(&app, "POST", "/v1/usage", &headers, Some(json!({ "minutes": 25 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["device_minutes_today"], 25);
        assert_eq!(body["used_minutes"], 25);

        let (status, _) = send(&app, "POST", "/v1/usage", &headers, Some(json!({ "minutes": -3 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let bad_key = [(DEVICE_ID_HEADER, device_id.as_str()), (API_KEY_HEADER, "dk_wrong")];
        let (status, body) = send(&app, "POST", "/v1/usage", &bad_key, Some(json!({ "minutes": 5 }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_API_KEY");
    }

    #[tokio::test]
    async fn test_report_review_conflict() {
        let state = test_state(AppConfig::default()).await;
        let parent = bearer(&token(&state, PARENT, Role::Parent, false));
        let admin = bearer(&token(&state, ADMIN, Role::Parent, true));

        let title = state
            .repo
            .upsert_title(serde_json::from_value(json!({ "external_ref": "1399", "name": "Monster Show", "media_type": "tv" })).unwrap())
            .await
            .unwrap();
        let tag = state
            .repo
            .create_tag(serde_json::from_value(json!({ "category": "creatures", "slug": "spiders", "display_name": "Spiders" })).unwrap())
            .await
            .unwrap();
        let app = create_router(state);

        let (status, report) = send(
            &app,
            "POST",
            "/v1/reports",
            &[("authorization", parent.as_str())],
            Some(json!({ "title_id": title.id, "tag_id": tag.id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let approve = format!("/v1/admin/reports/{}/approve", report["id"]);

        let (status, body) = send(&app, "POST", &approve, &[("authorization", admin.as_str())], None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "approved");

        let (status, body) = send(&app, "POST", &approve, &[("authorization", admin.as_str())], None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

        let (status, queue) = send(&app, "GET", "/v1/admin/reports?status=pending", &[("authorization", admin.as_str())], None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(queue.as_array().unwrap().is_empty());

        let (status, _) = send(&app, "GET", "/v1/admin/reports?status=lost", &[("authorization", admin.as_str())], None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_bursts() {
        let mut config = AppConfig::default();
        config.rate_limit.requests_per_second = 1;
        config.rate_limit.burst = 1;
        let state = test_state(config).await;
        let app = create_router(state);

        let (first, _) = send(&app, "GET", "/v1/services", &[], None).await;
        let (second, body) = send(&app, "GET", "/v1/services", &[], None).await;
        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "RATE_LIMITED");

        // health checks are never limited
        let (status, _) = send(&app, "GET", "/health", &[], None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
