use assistant_shell::config::ShellConfig;
use assistant_shell::sidecar;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // stdout carries the host protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let _ = dotenvy::dotenv();

    let config = ShellConfig::from_env().expect("invalid shell configuration");
    tracing::info!(signin = %config.signin_url, target = %config.target_url, "assistant shell starting");

    if let Err(e) = sidecar::run(config).await {
        tracing::error!(error = %e, "sidecar stopped");
        std::process::exit(1);
    }
}
