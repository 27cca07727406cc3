use roamdb::config::Config;
use roamdb::server::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::default();

    let server = match Server::bind(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!(addr = %config.listen_addr, error = %e, "failed to bind listener");
            return Err(e.into());
        }
    };

    info!(
        addr = %server.local_addr()?,
        data_dir = %config.data_dir.display(),
        "listening"
    );
    server.serve().await;

    Ok(())
}
