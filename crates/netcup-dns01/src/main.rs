//! netcup-dns01 - manage DNS-01 challenge records at netcup
//!
//! Credentials come from `NETCUP_CUSTOMER_NUMBER`, `NETCUP_API_KEY` and
//! `NETCUP_API_PASSWORD` (or their `_FILE` variants).

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use netcup_dns01::logging::{init_tracing, LogFormat};
use netcup_dns01::{Dns01Record, NetcupProvider};

/// Manage ACME DNS-01 challenge records through the netcup CCP API
#[derive(Parser, Debug)]
#[command(name = "netcup-dns01")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(long = "verbose", global = true)]
    verbose: bool,

    /// Log output format (pretty or json)
    #[arg(
        long = "log-format",
        env = "NETCUP_LOG_FORMAT",
        default_value = "pretty",
        global = true
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that credentials are configured and exit
    Check,
    /// Print the challenge record name and value without contacting netcup
    Record {
        /// Domain being validated (wildcards allowed)
        #[arg(short = 'd', long = "domain")]
        domain: String,

        /// Key authorization for the challenge
        #[arg(short = 'k', long = "key-auth")]
        key_auth: String,
    },
    /// Create the challenge TXT record
    Present(ChallengeArgs),
    /// Remove the challenge TXT record
    Cleanup(ChallengeArgs),
}

#[derive(Args, Debug)]
struct ChallengeArgs {
    /// Domain being validated (wildcards allowed)
    #[arg(short = 'd', long = "domain")]
    domain: String,

    /// Challenge token
    #[arg(short = 't', long = "token")]
    token: String,

    /// Key authorization for the challenge
    #[arg(short = 'k', long = "key-auth")]
    key_auth: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format, cli.verbose)?;

    match cli.command {
        Commands::Check => check(),
        Commands::Record { domain, key_auth } => {
            print_record(&domain, &key_auth);
            Ok(())
        }
        Commands::Present(args) => present(args).await,
        Commands::Cleanup(args) => cleanup(args).await,
    }
}

fn check() -> Result<()> {
    let provider = NetcupProvider::from_env().context("Failed to configure netcup provider")?;
    let (propagation_timeout, polling_interval) = provider.timeout();

    info!(
        customer = %provider.config().customer,
        endpoint = %provider.client().endpoint(),
        "Credentials configured"
    );

    println!(
        "netcup: credentials configured (propagation timeout {}s, polling interval {}s)",
        propagation_timeout.as_secs(),
        polling_interval.as_secs()
    );
    Ok(())
}

fn print_record(domain: &str, key_auth: &str) {
    let record = Dns01Record::new(domain, key_auth);
    println!("{} TXT \"{}\"", record.fqdn, record.value);
}

async fn present(args: ChallengeArgs) -> Result<()> {
    let provider = NetcupProvider::from_env().context("Failed to configure netcup provider")?;

    provider
        .present(&args.domain, &args.token, &args.key_auth)
        .await
        .with_context(|| format!("Failed to present challenge for '{}'", args.domain))?;

    let (propagation_timeout, _) = provider.timeout();
    println!(
        "netcup: challenge record for {} created, allow up to {}s for propagation",
        args.domain,
        propagation_timeout.as_secs()
    );
    Ok(())
}

async fn cleanup(args: ChallengeArgs) -> Result<()> {
    let provider = NetcupProvider::from_env().context("Failed to configure netcup provider")?;

    provider
        .clean_up(&args.domain, &args.token, &args.key_auth)
        .await
        .with_context(|| {
            format!(
                "Failed to clean up challenge for '{}', remove the record manually",
                args.domain
            )
        })?;

    println!("netcup: challenge record for {} removed", args.domain);
    Ok(())
}
