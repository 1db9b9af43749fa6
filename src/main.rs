use anyhow::Result;
use app::make_app;
use axum::{ServiceExt, extract::Request};
use clap::Parser;
use config::Config;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use filesystem::SimpleFilesystemProvider;
use setup_tracing::setup_tracing;
use shares::load_shares;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing::info;

mod app;
mod config;
mod dav;
mod filesystem;
mod setup_tracing;
mod shares;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env, default_value = "/etc/share-dav/config.toml")]
    config_file: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config: Config = Figment::new()
        .merge(Toml::file(&args.config_file))
        .merge(Env::prefixed("SHAREDAV_").split("__"))
        .extract()?;

    setup_tracing(&config.tracing)?;

    let fs_provider = Arc::new(SimpleFilesystemProvider::new(config.fs.root_path.clone()));
    let shares = load_shares(fs_provider.as_ref(), &config.shares).await?;
    info!(shares = shares.len(), "share directory ready");

    let app = NormalizePathLayer::trim_trailing_slash().layer(make_app(
        fs_provider,
        Arc::new(shares),
        config.dav.user,
    ));

    let listener = TcpListener::bind((config.http.host.as_str(), config.http.port)).await?;
    info!(address = %listener.local_addr()?, "listening");
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;
    Ok(())
}
