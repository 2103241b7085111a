use clap::Parser;
use log::*;

use gitea_release_please::{
    GithubOutput, Orchestrator, Result, cli::Args, forge::gitea::Gitea,
};

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("gitea_release_please")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    initialize_logger(args.debug_enabled())?;

    let inputs = args.into_inputs().inspect_err(|e| error!("{e}"))?;

    let forge = Gitea::new(&inputs.remote)
        .inspect_err(|e| error!("failed to create gitea client: {e}"))?;

    let orchestrator = Orchestrator::new(inputs, Box::new(forge));

    orchestrator
        .run(&mut GithubOutput::from_env())
        .await
        .inspect_err(|e| error!("release failed: {e}"))?;

    Ok(())
}
