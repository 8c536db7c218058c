use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{config, movies, otp, serve, tickets, token, Context};
use marquee_config::PathManager;
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Marquee - movie streaming backend and admin tools")]
#[command(version)]
struct Cli {
    /// Enable verbose output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Directory holding config.toml, secrets.toml, data/ and logs/
    #[arg(long, global = true, value_name = "DIR", env = "MARQUEE_HOME")]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    #[command(long_about = "Serve the public catalog API, the admin API and the admin pages. Expired OTP records are swept on the configured cron schedule unless --no-scheduler is given.")]
    Serve {
        /// Override server.bind
        #[arg(long)]
        bind: Option<String>,

        /// Override server.port
        #[arg(long)]
        port: Option<u16>,

        /// Do not start the OTP sweep job
        #[arg(long, action = ArgAction::SetTrue)]
        no_scheduler: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Admin session tokens
    Token {
        #[command(subcommand)]
        cmd: TokenCommands,
    },
    /// OTP maintenance
    Otp {
        #[command(subcommand)]
        cmd: OtpCommands,
    },
    /// Premiere tickets
    Tickets {
        #[command(subcommand)]
        cmd: TicketCommands,
    },
    /// Movie catalog maintenance
    Movies {
        #[command(subcommand)]
        cmd: MovieCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a starter config.toml and generate the session secret
    Init {
        /// Admin email allowed to sign in (repeatable; prompts when omitted)
        #[arg(long = "admin-email", value_name = "EMAIL")]
        admin_emails: Vec<String>,

        /// Overwrite an existing configuration and rotate the secret
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Show the effective configuration (secrets masked)
    Show,
    /// Check the configuration and required secrets
    Validate,
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Print a session cookie value for an admin email
    Issue { email: String },
}

#[derive(Subcommand)]
enum OtpCommands {
    /// Delete expired OTP records now
    Purge,
}

#[derive(Subcommand)]
enum TicketCommands {
    /// Generate ticket codes for a premiere
    Generate {
        premiere_id: String,
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// List a premiere's tickets
    List { premiere_id: String },
    /// Write a premiere's tickets to CSV
    Export {
        premiere_id: String,
        /// Destination file (defaults to data/exports/tickets-<id>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MovieCommands {
    /// List movies with real and displayed metrics
    List,
    /// Reset view and rating boosts on every movie
    ResetBoosts {
        /// Skip the confirmation and captcha
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let paths = match cli.base_dir {
        Some(dir) => PathManager::from_base(dir),
        None => PathManager::default(),
    };
    let ctx = Context::load(paths)?;

    logging::init_logging(cli.verbose, cli.quiet, &ctx.config.logging)
        .map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    let result = match cli.command {
        Commands::Serve { bind, port, no_scheduler } => {
            serve::run_serve(ctx, bind, port, no_scheduler, &output).await
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Init { admin_emails, force } => config::run_init(ctx, admin_emails, force, &output),
            ConfigCommands::Show => config::run_show(&ctx, &output),
            ConfigCommands::Validate => config::run_validate(&ctx, &output),
        },
        Commands::Token { cmd: TokenCommands::Issue { email } } => token::run_issue(&ctx, &email, &output),
        Commands::Otp { cmd: OtpCommands::Purge } => otp::run_purge(&ctx, &output).await,
        Commands::Tickets { cmd } => match cmd {
            TicketCommands::Generate { premiere_id, count } => {
                tickets::run_generate(&ctx, &premiere_id, count, &output).await
            }
            TicketCommands::List { premiere_id } => tickets::run_list(&ctx, &premiere_id, &output).await,
            TicketCommands::Export { premiere_id, out } => {
                tickets::run_export(&ctx, &premiere_id, out, &output).await
            }
        },
        Commands::Movies { cmd } => match cmd {
            MovieCommands::List => movies::run_list(&ctx, &output).await,
            MovieCommands::ResetBoosts { yes } => movies::run_reset_boosts(&ctx, yes, &output).await,
        },
    };

    if let Err(e) = &result {
        if !output.is_human() {
            output.error(e.to_string());
        }
    }
    result
}
