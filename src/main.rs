use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::metadata::LevelFilter;
use tracing_subscriber::EnvFilter;

use cardwall::config::Config;

mod cmd;

#[derive(Parser)]
#[command(name = "cardwall")]
#[command(version, about = "Task board client with cached reads and optimistic writes")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Backend base URL (overrides the config file and CARDWALL_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and save the session token
    Login {
        /// Email address (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the saved session
    Logout,
    /// Create an account
    Register {
        /// Email address (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,

        /// Password (prompted twice when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Show the logged-in user
    Whoami,
    /// Render the board with its categories and tickets
    Board,
    /// Manage board categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Manage tickets
    Ticket {
        #[command(subcommand)]
        command: TicketCommands,
    },
    /// Manage labels
    Label {
        #[command(subcommand)]
        command: Option<LabelCommands>,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a category to the board
    Create { title: String },
    /// Rename a category
    Rename { id: i64, title: String },
    /// Delete a category, moving its tickets to another one
    Delete {
        id: i64,

        /// Destination category for the tickets (prompted when omitted)
        #[arg(long)]
        move_to: Option<i64>,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Swap the display order of two categories
    Swap { id: i64, other: i64 },
}

#[derive(Subcommand)]
pub enum TicketCommands {
    /// Create a ticket in a category
    Create {
        /// Category to create the ticket in
        #[arg(long)]
        category: i64,

        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        /// Expiry date (YYYY-MM-DD)
        #[arg(long)]
        expires: Option<String>,
    },
    /// Show a ticket with its movement history
    Show { id: i64 },
    /// Edit a ticket's title, description, or expiry date
    Edit {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// New expiry date (YYYY-MM-DD)
        #[arg(long)]
        expires: Option<String>,
    },
    /// Move a ticket to another category
    Move { id: i64, category: i64 },
    /// Delete a ticket
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum LabelCommands {
    /// List all labels
    List,
    /// Create a label
    Create { title: String },
    /// Rename a label
    Rename { id: i64, title: String },
    /// Delete a label from every ticket
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Attach a label to a ticket
    Add { ticket: i64, label: i64 },
    /// Detach a label from a ticket
    Remove { ticket: i64, label: i64 },
}

fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_from_verbosity(verbosity).into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.base_url.clone())?;
    let ctx = cmd::CmdContext::init(config)?;

    match &cli.command {
        Commands::Login { email, password } => {
            cmd::cmd_login(&ctx, email.as_deref(), password.as_deref()).await?;
        }
        Commands::Logout => cmd::cmd_logout(&ctx)?,
        Commands::Register { email, password } => {
            cmd::cmd_register(&ctx, email.as_deref(), password.as_deref()).await?;
        }
        Commands::Whoami => cmd::cmd_whoami(&ctx).await?,
        Commands::Board => cmd::cmd_board(&ctx).await?,
        Commands::Category { command } => cmd::cmd_category(&ctx, command).await?,
        Commands::Ticket { command } => cmd::cmd_ticket(&ctx, command).await?,
        Commands::Label { command } => cmd::cmd_label(&ctx, command.clone()).await?,
    }

    Ok(())
}
