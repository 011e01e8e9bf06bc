//! Router and server for the account service.

use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, post},
    Extension, Router,
};
use rand::rngs::OsRng;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;

use crate::account::password::PasswordHasher;
use crate::account::pin::PinGenerator;
use crate::account::store::{MemoryStore, PgUserStore, UserStore};
use crate::account::AccountService;
use crate::konto::email::Mailer;
use crate::konto::handlers::{
    activate, activate::__path_activate, health, health::__path_health, user_login,
    user_login::__path_login, user_register, user_register::__path_register,
    SharedAccountService,
};

pub mod email;
pub mod handlers;

#[derive(OpenApi)]
#[openapi(
    paths(health, register, login, activate),
    components(schemas(
        health::Health,
        user_register::RegisterRequest,
        user_register::RegisterResponse,
        user_login::LoginRequest,
        activate::ActivateRequest,
        crate::account::user::UserProfile,
    )),
    tags(
        (name = "konto", description = "Minimal user-account API")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the application router around a shared account service.
#[must_use]
pub fn router(service: SharedAccountService) -> Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any);

    Router::new()
        .route("/", get(|| async { "konto" }))
        .route("/user/register", post(handlers::register))
        .route("/user/login", post(handlers::login))
        .route("/user/activate", post(handlers::activate))
        .route("/health", get(handlers::health).options(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(service)),
        )
}

/// Start the server.
///
/// The DSN selects the store: `memory://` runs the non-persistent in-process
/// store (local dev), anything else is handed to Postgres.
///
/// # Errors
///
/// Returns an error if the store or the listener cannot be set up.
pub async fn new(
    port: u16,
    dsn: &str,
    mailer: Arc<dyn Mailer>,
    require_activation: bool,
) -> Result<()> {
    let store: Arc<dyn UserStore> = if dsn.starts_with("memory://") {
        info!("using the in-process memory store, records will not persist");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(PgUserStore::connect(dsn).await?)
    };

    let service: SharedAccountService = Arc::new(AccountService::new(
        store,
        mailer,
        PasswordHasher::new(OsRng),
        PinGenerator::new(OsRng),
        require_activation,
    ));

    let app = router(service);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
