//! CLI entry point: the composition root.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use carevoice_cli::{Cli, CliContext, CliError, Commands, handlers};

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "carevoice=debug"
    } else {
        "carevoice=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = CliContext::from_cli(&cli)?;

    match cli.command {
        Commands::Transcribe { file } => handlers::transcribe::execute(&ctx, &file).await,
        Commands::Speak { text, out } => {
            handlers::speak::execute(&ctx, &text, out.as_deref()).await
        }
        #[cfg(feature = "local-audio")]
        Commands::Talk {
            chat_url,
            model,
            system_prompt,
        } => {
            let args = handlers::talk::TalkArgs {
                chat_url,
                model,
                system_prompt,
            };
            handlers::talk::execute(&ctx, args).await
        }
        #[cfg(feature = "local-audio")]
        Commands::Devices => handlers::devices::execute(),
    }
}

#[tokio::main]
async fn main() {
    // Load .env before clap reads env-backed flags
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
}
