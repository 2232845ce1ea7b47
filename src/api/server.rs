//! HTTP server implementation

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{any, get},
    Router,
};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use super::handlers::{self, RouteState};
use crate::core::{Config, Result};
use crate::resource::Resource;
use crate::storage::FileLocks;

/// Creates the application router with one mount per configured route
pub fn create_app(config: &Config) -> Router {
    // Permissive CORS, clients under development call from anywhere
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(Any);

    let locks = FileLocks::new();
    let mut app = Router::new();
    for route in &config.routes {
        let mount = config.mount_path(route);
        let state = RouteState {
            resource: Arc::new(Resource::new(route.clone(), config.pagination.clone(), &locks)),
            fake_load: config.server.fake_load,
        };

        if route.raw {
            info!("Serving {:?} verbatim at {}", route.file, mount);
        } else {
            info!("Serving {:?} at {} (id field '{}')", route.file, mount, route.id_field);
        }
        app = app.merge(route_router(&mount, state));
    }

    app.fallback(handlers::not_found).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

fn route_router(mount: &str, state: RouteState) -> Router {
    let router = if state.resource.route().raw {
        Router::new().route(mount, any(handlers::raw))
    } else {
        Router::new()
            .route(
                mount,
                get(handlers::list)
                    .post(handlers::create)
                    .put(handlers::replace)
                    .patch(handlers::patch)
                    .options(handlers::options)
                    .fallback(handlers::method_not_allowed),
            )
            .route(
                &format!("{}/:id", mount),
                get(handlers::get_item)
                    .options(handlers::options)
                    .fallback(handlers::method_not_allowed),
            )
    };
    router.with_state(state)
}

/// Start the HTTP server and run until `shutdown` resolves
pub async fn start_server<F>(config: &Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let app = create_app(config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
