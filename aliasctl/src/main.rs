//! Main entry point for the aliasctl binary
//!
//! Parses the command line, builds the configuration once, wires the real
//! gateway and snapshot store into an [`AliasManager`], and maps the result
//! to the exit code: 0 when every item succeeded, 1 otherwise.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use aliasctl::commands::{self, CommandStatus};
use aliasctl::services::{RealRuleGateway, RealSnapshotStore};
use aliasctl::{AliasManager, AppConfig, ConfigOverrides, CreateRequest, DeleteSource};
use generator::DEFAULT_SECRET_LENGTH;
use shared::{batch_debug, logging};

/// Bulk-manage email forwarding aliases on Cloudflare Email Routing
#[derive(Parser)]
#[command(name = "aliasctl", version)]
#[command(about = "Create, export, secure and clean up themed email aliases")]
pub struct Args {
    /// Domain the aliases live under
    #[arg(long, global = true)]
    pub domain: Option<String>,

    /// API token (defaults to CLOUDFLARE_API_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Zone id; looked up from the domain when absent
    #[arg(long, global = true)]
    pub zone_id: Option<String>,

    /// Address every alias forwards to
    #[arg(long, global = true)]
    pub destination: Option<String>,

    /// Delay between remote requests, in milliseconds
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,

    /// Export directory (defaults to ./output)
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a themed batch and create a forwarding rule for each alias
    Create {
        /// Theme key (see `themes`)
        #[arg(long, default_value = "privacy-guardian")]
        theme: String,

        /// Number of aliases
        #[arg(long, default_value_t = 10)]
        count: usize,

        /// Seed for reproducible names; random when absent
        #[arg(long)]
        seed: Option<u32>,

        /// Generate names only; no remote calls, no export
        #[arg(long)]
        dry_run: bool,

        /// Skip secret generation
        #[arg(long)]
        no_passwords: bool,

        /// Secret length
        #[arg(long, default_value_t = DEFAULT_SECRET_LENGTH)]
        length: usize,
    },

    /// Delete previously created aliases
    Delete {
        /// Where to find the rules to delete
        #[arg(long, value_enum, default_value_t = Source::Export)]
        source: Source,

        /// Show what would be deleted and stop
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Generate secrets for exported aliases that lack one
    Passwords {
        /// Replace existing secrets too
        #[arg(long)]
        regenerate: bool,

        /// Secret length
        #[arg(long, default_value_t = DEFAULT_SECRET_LENGTH)]
        length: usize,

        /// Generate and print counts without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Rebuild the flat list from the structured list
    Convert,

    /// Check the API token and zone access
    Verify,

    /// List built-in themes
    Themes,

    /// List remote rules for the domain, marking generated ones
    List,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Source {
    /// Rule ids recorded in the export
    Export,
    /// Remote rules that look generated
    Remote,
}

impl From<Source> for DeleteSource {
    fn from(source: Source) -> Self {
        match source {
            Source::Export => DeleteSource::Export,
            Source::Remote => DeleteSource::Remote,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    match run(args).await {
        Ok(status) => ExitCode::from(status.exit_code() as u8),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<CommandStatus> {
    if let Command::Themes = args.command {
        return Ok(commands::themes());
    }

    let overrides = ConfigOverrides {
        api_token: args.token,
        zone_id: args.zone_id,
        domain: args.domain,
        destination: args.destination,
        seed: None,
        request_delay_ms: args.delay_ms,
        output_dir: args.output,
    };
    let config = AppConfig::from_env(overrides).context("invalid configuration")?;

    // these only touch local files
    let offline = matches!(
        args.command,
        Command::Create { dry_run: true, .. } | Command::Passwords { .. } | Command::Convert
    );
    if !offline {
        config.require_token().context("invalid configuration")?;
    }
    let gateway = RealRuleGateway::new(&config).context("failed to set up the API client")?;
    let store = RealSnapshotStore::with_base_dir(config.output_dir.clone());
    let manager = AliasManager::new(config, gateway, store);
    batch_debug!(manager.batch_id(), "configuration: {:?}", manager.config());

    let status = match args.command {
        Command::Create {
            theme,
            count,
            seed,
            dry_run,
            no_passwords,
            length,
        } => {
            let request = CreateRequest {
                theme,
                count,
                seed,
                dry_run,
                password_length: (!no_passwords).then_some(length),
            };
            commands::create(&manager, request).await?
        }
        Command::Delete { source, dry_run, yes } => commands::delete(&manager, source.into(), dry_run, yes).await?,
        Command::Passwords {
            regenerate,
            length,
            dry_run,
        } => commands::passwords(&manager, regenerate, length, dry_run).await?,
        Command::Convert => commands::convert(&manager).await?,
        Command::Verify => commands::verify(&manager).await?,
        Command::List => commands::list(&manager).await?,
        Command::Themes => commands::themes(),
    };
    Ok(status)
}
