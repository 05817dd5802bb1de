use clap::Parser;
use mediagent_service::{ServiceConfig, create_app};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mediagent_service=info,mediagent_core=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::parse();

    let app = create_app(&config)?;
    let listener = TcpListener::bind(config.bind_address()).await?;
    let addr = listener.local_addr()?;

    info!("MediAgent service starting on {}", addr);
    info!("Doctor types: GET http://{}/doctor-types", addr);
    info!("Open a consultation: POST http://{}/consultations", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
