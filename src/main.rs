use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ultradns_dns01::auth::EnvCredentialManager;
use ultradns_dns01::{ChallengeProvider, Config, DNSProvider};

#[derive(Parser)]
#[command(version, about = "Solve ACME DNS-01 challenges with UltraDNS")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish the challenge TXT record
    Present {
        domain: String,
        token: String,
        key_auth: String,
    },
    /// Remove the challenge TXT record
    Cleanup {
        domain: String,
        token: String,
        key_auth: String,
    },
    /// Print the propagation timeout and polling interval in seconds
    Timeout,
}

async fn run(cli: Cli) -> Result<(), ultradns_dns01::Error> {
    match cli.command {
        Command::Present {
            domain,
            token,
            key_auth,
        } => {
            let provider = DNSProvider::from_env().await?;
            provider.present(&domain, &token, &key_auth).await?;
            info!(domain = %domain, "Challenge record presented");
        }
        Command::Cleanup {
            domain,
            token,
            key_auth,
        } => {
            let provider = DNSProvider::from_env().await?;
            provider.cleanup(&domain, &token, &key_auth).await?;
            info!(domain = %domain, "Challenge record cleaned up");
        }
        Command::Timeout => {
            let config = Config::defaults_from(&EnvCredentialManager::new());
            println!(
                "{} {}",
                config.propagation_timeout.as_secs(),
                config.polling_interval.as_secs()
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}
