//! Root CLI structure with global options.

use clap::Parser;
use carevoice_core::PortalContext;

use crate::commands::Commands;

/// Voice front end for the care assistant.
#[derive(Parser, Debug)]
#[command(name = "carevoice")]
#[command(about = "Talk to the care assistant by voice")]
#[command(version)]
pub struct Cli {
    /// Base URL of the transcription and speech service
    #[arg(
        long,
        env = "CAREVOICE_API_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    pub api_url: String,

    /// Portal to serve; fixes the reply voice (provider | patient)
    #[arg(
        long,
        env = "CAREVOICE_PORTAL",
        default_value = "provider",
        value_parser = parse_portal,
        global = true
    )]
    pub portal: PortalContext,

    /// Bearer token sent to every service
    #[arg(long, env = "CAREVOICE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Seconds to wait for each transcription or synthesis call (0 waits
    /// until the service answers)
    #[arg(long, env = "CAREVOICE_TIMEOUT", default_value_t = 60, global = true)]
    pub timeout: u64,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

fn parse_portal(value: &str) -> Result<PortalContext, String> {
    PortalContext::parse(value)
        .ok_or_else(|| format!("unknown portal '{value}' (expected provider or patient)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "carevoice",
            "--portal",
            "Patient",
            "--api-url",
            "http://care.test",
            "--timeout",
            "0",
            "speak",
            "hello",
        ]);
        assert_eq!(cli.portal, PortalContext::Patient);
        assert_eq!(cli.api_url, "http://care.test");
        assert_eq!(cli.timeout, 0);
        assert!(matches!(cli.command, Commands::Speak { ref text, .. } if text == "hello"));
    }

    #[test]
    fn test_unknown_portal_is_rejected() {
        let result = Cli::try_parse_from(["carevoice", "--portal", "admin", "transcribe", "a.wav"]);
        assert!(result.is_err());
    }
}
