use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use formbuilder_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route("/api/public/forms/:build_id", get(routes::public::get_form))
        .route(
            "/api/public/forms/:build_id/submit",
            post(routes::public::submit_form),
        )
        .layer(axum::middleware::from_fn_with_state(
            formbuilder_backend::middleware::rate_limit::Throttle::per_second(config.public_rps),
            formbuilder_backend::middleware::rate_limit::throttle_middleware,
        ));

    let admin_api = Router::new()
        .route(
            "/api/admin/questions",
            get(routes::admin::list_questions).post(routes::admin::create_question),
        )
        .route(
            "/api/admin/questions/:id",
            get(routes::admin::get_question)
                .patch(routes::admin::update_question)
                .delete(routes::admin::delete_question),
        )
        .route(
            "/api/admin/builds",
            get(routes::admin::list_builds).post(routes::admin::create_build),
        )
        .route(
            "/api/admin/builds/:id",
            get(routes::admin::get_build)
                .patch(routes::admin::update_build)
                .delete(routes::admin::delete_build),
        )
        .route(
            "/api/admin/builds/:id/entries",
            get(routes::admin::list_entries_by_build),
        )
        .route("/api/admin/entries/:id", get(routes::admin::get_entry))
        .layer(axum::middleware::from_fn(
            formbuilder_backend::middleware::auth::require_admin,
        ))
        .layer(axum::middleware::from_fn_with_state(
            formbuilder_backend::middleware::rate_limit::Throttle::per_second(config.admin_rps),
            formbuilder_backend::middleware::rate_limit::throttle_middleware,
        ));

    let app = base_routes
        .merge(public_api)
        .merge(admin_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
