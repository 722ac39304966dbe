use crate::{modules, types::Context, utils::inertia};
use axum::{
    http::{header, HeaderName, Method},
    middleware, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors, trace};

pub fn router(ctx: Arc<Context>) -> Router {
    Router::new()
        .merge(modules::get_router())
        .layer(middleware::from_fn_with_state(
            ctx.clone(),
            inertia::version_guard,
        ))
        .with_state(ctx)
        .layer(trace::TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_methods([Method::OPTIONS, Method::GET])
                .allow_headers([
                    header::CONTENT_TYPE,
                    inertia::X_INERTIA,
                    inertia::X_INERTIA_VERSION,
                    inertia::X_INERTIA_PARTIAL_COMPONENT,
                    inertia::X_INERTIA_PARTIAL_DATA,
                    inertia::X_INERTIA_PARTIAL_EXCEPT,
                    inertia::X_INERTIA_RESET,
                    HeaderName::from_static("x-requested-with"),
                ])
                .allow_origin(cors::Any),
        )
}

pub struct App {
    ctx: Arc<Context>,
    router: Router,
}

impl App {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            router: router(ctx.clone()),
            ctx,
        }
    }

    pub async fn serve(self) -> std::io::Result<()> {
        let address = format!("{}:{}", self.ctx.app.host, self.ctx.app.port);
        let listener = TcpListener::bind(&address).await?;

        tracing::info!("App is running on {} ({})", address, self.ctx.app.url);

        axum::serve(listener, self.router).await
    }
}
