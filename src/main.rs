use dotenvy::dotenv;
use tracing::{error, info};

use issue_token::infra::{
    app::create_app,
    config::LogFormat,
    error::InfraError,
    setup::{init_app_state, init_tracing},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing(LogFormat::from_env());

    let app_state = init_app_state().inspect_err(|e| {
        error!(error = %e, "startup configuration rejected");
    })?;

    let bind_addr = app_state.config.bind_addr;

    let app = create_app(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(InfraError::TcpBind)?;

    info!("Token endpoint listening at {}", &listener.local_addr()?);

    axum::serve(listener, app)
        .await
        .map_err(InfraError::Server)?;

    Ok(())
}
