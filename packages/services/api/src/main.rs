//! Nursery API
//!
//! 식물 농원 관리용 REST API 서버입니다.
//! 리소스별 CRUD, 계정 인증, 주문 체크아웃, 관리자 스키마 조회를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod accounts;
mod config;
mod error;
mod gateway;
mod handlers;
mod middleware;
mod schema;
mod state;

#[cfg(test)]
mod test_support;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 설정 로드
    let config = Config::from_env()?;
    let production = config.environment.is_production();

    // 로깅 초기화
    let default_filter = if production {
        "nursery_api=info,tower_http=info"
    } else {
        "nursery_api=debug,tower_http=debug"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Nursery API with config: {:?}", config);

    // 앱 상태 초기화
    let state = AppState::new(&config).await?;
    let state = Arc::new(state);

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Nursery API listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 라우터 생성
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Auth
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/me", get(handlers::auth::me))
        // Checkout
        .route("/api/orders/checkout", post(handlers::orders::checkout))
        // Admin
        .route("/api/admin/tables", get(handlers::admin::list_tables))
        .route("/api/admin/tables/{table}", get(handlers::admin::table_schema))
        // Resource CRUD
        .route(
            "/api/{resource}",
            get(handlers::resources::list).post(handlers::resources::create),
        )
        .route(
            "/api/{resource}/{id}",
            get(handlers::resources::get_one)
                .put(handlers::resources::update)
                .delete(handlers::resources::delete),
        )
        // Middleware (아래쪽이 바깥)
        .layer(from_fn_with_state(state.clone(), middleware::authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn_with_state(state.clone(), middleware::request_context))
        // State
        .with_state(state)
}
