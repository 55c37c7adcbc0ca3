use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use viki_cli::{Cli, CliConfig, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise -v raises the default level
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(&CliConfig {
        profiles_path: cli.profiles,
    })?;

    match command {
        Commands::Languages => handlers::languages::execute(&ctx)?,
        Commands::Detect { text, explain } => handlers::detect::execute(&ctx, text, explain)?,
        Commands::Voices { voices } => handlers::voices::execute(voices.as_deref())?,
        Commands::SelectVoice {
            language,
            voices,
            gender,
            limit,
        } => handlers::select_voice::execute(&ctx, &language, voices.as_deref(), gender, limit)?,
        Commands::Chunks { text, max_chars } => handlers::chunks::execute(text, max_chars)?,
        Commands::Clean { text } => handlers::clean::execute(text)?,
        Commands::Speak(args) => handlers::speak::execute(&ctx, args).await?,
        Commands::TestVoice { language, playback } => {
            handlers::test_voice::execute(&ctx, &language, &playback).await?;
        }
    }

    Ok(())
}
