use std::net::SocketAddr;

use dotenvy::dotenv;
use nursery::logging::init_tracing;
use nursery::metrics::{init_metrics, metrics_app};
use nursery::router::init_router;
use nursery::state::init_app_state;
use tracing::{info, warn};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing()?;

    let state = init_app_state().await?;
    if state.jwt_config.uses_dev_secret() {
        warn!("JWT_SECRET is not set, using the development secret");
    }

    let mut app = init_router(state);
    if let Some(handle) = init_metrics()? {
        app = app.merge(metrics_app(handle));
        info!("Prometheus metrics available at /metrics");
    }

    let addr = std::env::var("SERVER_ADDR").unwrap_or_else(|_| DEFAULT_SERVER_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");
    info!("Swagger UI available at /swagger-ui, Scalar at /scalar");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
