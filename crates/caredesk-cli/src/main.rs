use std::path::PathBuf;

use caredesk_core::models::{Beneficiary, BeneficiaryRequest, Employee, Guardian, Sponsor};
use caredesk_core::reports::{Report, ReportType};
use caredesk_core::Config;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Context, ListArgs};

#[derive(Parser)]
#[command(name = "caredesk")]
#[command(version, about = "Administration client for beneficiaries, sponsors and staff", long_about = None)]
struct Cli {
    /// Backend base URL (overrides the config file and CAREDESK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Collections that can be listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Collection {
    Beneficiaries,
    Sponsors,
    Guardians,
    Employees,
    Requests,
    Reports,
}

/// Run a generic command against the record type behind `$collection`
macro_rules! for_collection {
    ($collection:expr, $func:ident($($arg:expr),* $(,)?)) => {
        match $collection {
            Collection::Beneficiaries => commands::$func::<Beneficiary>($($arg),*).await,
            Collection::Sponsors => commands::$func::<Sponsor>($($arg),*).await,
            Collection::Guardians => commands::$func::<Guardian>($($arg),*).await,
            Collection::Employees => commands::$func::<Employee>($($arg),*).await,
            Collection::Requests => commands::$func::<BeneficiaryRequest>($($arg),*).await,
            Collection::Reports => commands::$func::<Report>($($arg),*).await,
        }
    };
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long, env = "CAREDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the saved session
    Logout,
    /// Show the signed-in user and what they can open
    Whoami,
    /// List a collection with search, category and sort
    List {
        collection: Collection,
        #[command(flatten)]
        args: ListArgs,
    },
    /// Summary counts for one collection, or the dashboard
    Stats { collection: Option<Collection> },
    /// Show one record
    Show { collection: Collection, id: u64 },
    /// Browse a collection interactively
    Tui {
        collection: Collection,
        /// Start on a category, e.g. `waiting`
        #[arg(long)]
        view: Option<String>,
    },
    /// Show notifications or mark one read
    Notifications {
        #[arg(long)]
        unread: bool,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, value_name = "ID")]
        mark_read: Option<u64>,
    },
    /// Compose and send an SMS
    Sms {
        #[arg(short, long)]
        message: String,
        /// Phone number; repeatable
        #[arg(long)]
        to: Vec<String>,
        /// Text everyone with a phone number in this list
        #[arg(long, value_name = "COLLECTION")]
        from: Option<Collection>,
        /// Category of the `--from` list
        #[arg(long, requires = "from")]
        view: Option<String>,
        /// Print the draft without sending
        #[arg(long)]
        dry_run: bool,
    },
    /// Upload or download report files
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
    /// Month by month payments of a sponsor
    Ledger {
        sponsor_id: u64,
        /// Last day to include; defaults to today
        #[arg(long, value_name = "YYYY-MM-DD")]
        through: Option<String>,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ReportAction {
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: String,
        /// monthly, quarterly, annual or incident
        #[arg(long = "type")]
        report_type: ReportType,
    },
    Download { id: u64, dest: PathBuf },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    Path,
    /// e.g. `caredesk config set api.base_url http://10.0.0.5:5000`
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The TUI owns the screen; keep stderr quiet unless asked
    let default_filter = match cli.command {
        Some(Commands::Tui { .. }) => "caredesk=warn",
        _ => "caredesk=info",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = cli.command else {
        println!("No command specified. Try --help");
        return Ok(());
    };

    // Config edits work on the file alone, without env overrides or a session
    if let Commands::Config { action } = command {
        return match action {
            ConfigAction::Show => commands::config_show(),
            ConfigAction::Path => commands::config_path(),
            ConfigAction::Set { key, value } => commands::config_set(&key, &value),
        };
    }

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    let mut ctx = Context::new(config)?;

    match command {
        Commands::Login { email, password } => commands::login(&mut ctx, &email, password).await,
        Commands::Logout => commands::logout(&mut ctx),
        Commands::Whoami => commands::whoami(&ctx),
        Commands::List { collection, args } => for_collection!(collection, list(&ctx, &args)),
        Commands::Stats { collection: Some(collection) } => for_collection!(collection, stats(&ctx)),
        Commands::Stats { collection: None } => commands::overview(&ctx).await,
        Commands::Show { collection, id } => for_collection!(collection, show(&ctx, id)),
        Commands::Tui { collection, view } => for_collection!(collection, tui(&ctx, view.as_deref())),
        Commands::Notifications { unread, limit, mark_read } => {
            commands::notifications(&ctx, unread, limit, mark_read).await
        }
        Commands::Sms { message, to, from, view, dry_run } => {
            let mut draft = match from {
                Some(collection) => {
                    for_collection!(collection, draft_from_list(&ctx, view.as_deref(), &message))?
                }
                None => caredesk_core::sms::SmsDraft::new(message),
            };
            commands::send_sms(&ctx, &mut draft, &to, dry_run).await
        }
        Commands::Report { action } => match action {
            ReportAction::Upload { file, title, report_type } => {
                commands::report_upload(&ctx, &file, &title, report_type).await
            }
            ReportAction::Download { id, dest } => commands::report_download(&ctx, id, &dest).await,
        },
        Commands::Ledger { sponsor_id, through } => {
            commands::show_ledger(&ctx, sponsor_id, through.as_deref()).await
        }
        Commands::Config { .. } => Ok(()),
    }
}
