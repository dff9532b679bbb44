use crate::{
    app::{
        cli::UrlPrefix,
        server::{
            app_state::AppState, mosaic_route, point_route, tile_route, tilejson_route,
            wmts_route,
        },
    },
    mosaic::ResolverConfig,
    render::RenderWorkerPool,
};
use axum::{Router, http::StatusCode, routing::get, serve};
use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use tokio::sync::broadcast;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

pub(crate) struct ServerOptions {
    pub(crate) host: Ipv4Addr,
    pub(crate) port: u16,
    pub(crate) max_concurrent_connections: usize,
    pub(crate) request_timeout: Duration,
    pub(crate) cors: bool,
    pub(crate) url_prefix: UrlPrefix,
    pub(crate) public_url: Option<String>,
    pub(crate) allowed_scales: Vec<u8>,
    pub(crate) resolver_config: ResolverConfig,
}

pub(crate) async fn start_server(
    render_worker_pool: Arc<RenderWorkerPool>,
    mut shutdown_rx: broadcast::Receiver<()>,
    options: ServerOptions,
) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from((options.host, options.port));

    let router = build_router(render_worker_pool, &options);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Listening on {addr}{}", options.url_prefix.as_str());

    serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
}

pub(crate) fn build_router(
    render_worker_pool: Arc<RenderWorkerPool>,
    options: &ServerOptions,
) -> Router {
    let prefix = if options.url_prefix.is_root() {
        ""
    } else {
        options.url_prefix.as_str()
    };

    let app_state = AppState {
        render_worker_pool,
        resolver_config: Arc::new(options.resolver_config.clone()),
        allowed_scales: Arc::new(options.allowed_scales.clone()),
        public_url: Arc::new(options.public_url.clone()),
        url_prefix: Arc::from(prefix),
    };

    let root = if prefix.is_empty() { "/" } else { prefix };

    let router = Router::new()
        .route(
            root,
            get(mosaic_route::read)
                .post(mosaic_route::create)
                .put(mosaic_route::update),
        )
        .route(&format!("{prefix}/bounds"), get(mosaic_route::bounds))
        .route(&format!("{prefix}/info"), get(mosaic_route::info))
        .route(&format!("{prefix}/tilejson.json"), get(tilejson_route::get))
        .route(&format!("{prefix}/WMTSCapabilities.xml"), get(wmts_route::get))
        .route(&format!("{prefix}/point/{{coordinates}}"), get(point_route::get))
        .route(&format!("{prefix}/tiles/{{zoom}}/{{x}}/{{y}}"), get(tile_route::get))
        .route(
            &format!("{prefix}/tiles/{{tms}}/{{zoom}}/{{x}}/{{y}}"),
            get(tile_route::get_tms),
        )
        .with_state(app_state);

    let router = if options.cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            options.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(options.max_concurrent_connections))
}
