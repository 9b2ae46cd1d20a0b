use std::sync::Arc;

use clap::Parser;
use cnft_minter::{
    cli::Cli, rpc::SolanaRpcConnection, run_command, telemetry::setup_telemetry, Minter,
    MinterConfig, Notifier, TracingSink,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_telemetry();

    let cli = Cli::parse();
    let config = MinterConfig::new_for_command(&cli.command)?;
    let notifier = Arc::new(Notifier::new(Arc::new(TracingSink)));

    let minter = Minter::<SolanaRpcConnection>::init(config, notifier.clone()).await?;
    let result = run_command(&minter, &cli.command).await;
    notifier.flush();
    notifier.shutdown();
    Ok(result?)
}
