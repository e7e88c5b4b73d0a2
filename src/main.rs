use std::sync::Arc;

use mesh_convert_server::{
    build_app, config::Config, logging, mesh::NativeMeshConverter, AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let bind_socket = config.bind_socket()?;

    let state = AppState::new(config.clone(), Arc::new(NativeMeshConverter::new()));
    state.store.ensure_dirs().await?;

    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        upload_dir = %config.upload_dir.display(),
        converted_dir = %config.converted_dir.display(),
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
