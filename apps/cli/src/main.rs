//! # Vetrina CLI
//!
//! Browses the catalogue from a terminal.
//!
//! ## Commands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  vetrina [--config PATH] [--base-url URL] [--json] <command>            │
//! │                                                                         │
//! │  categories    [--pages N]                  list categories             │
//! │  subcategories <CATEGORY> [--pages N]       list a category's children │
//! │  products      <COLLECTION> [--lang] [--sort] [--pages N]               │
//! │  featured      [--lang] [--limit N]         home screen strip           │
//! │  product       <ITEM_CODE> [--lang]         product sheet               │
//! │  languages                                  supported languages         │
//! │  config                                     effective configuration     │
//! │                                                                         │
//! │  login           --email                    sign in, print the user     │
//! │  register        <FIRST> <LAST> --email     create an account           │
//! │  forgot-password --email                    mail a reset code           │
//! │  reset-password  --otp                      set a new password          │
//! │  update-profile  --email [fields] [--image PATH]                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Passwords are read from `--password` or `VETRINA_PASSWORD`. Nothing is
//! remembered between runs, so `update-profile` signs in first.
//!
//! Logs go to stderr (`RUST_LOG`, default `info,vetrina=debug`); results
//! go to stdout.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vetrina_client::ClientConfig;
use vetrina_core::SortOrder;

#[derive(Debug, Parser)]
#[command(name = "vetrina", version, about = "Browse the Vetrina catalogue")]
pub struct Cli {
    /// Config file (defaults to the platform config dir's client.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides server.base_url.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Print snapshots as JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List catalogue categories.
    Categories {
        /// Pages to load (0 loads everything).
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// List the subcategories of a category.
    Subcategories {
        category: String,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// List the products of a collection.
    Products {
        collection: String,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        sort: Option<SortOrder>,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Show the featured products.
    Featured {
        #[arg(long)]
        lang: Option<String>,
        /// Keep at most this many products.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one product sheet.
    Product {
        item_code: String,
        #[arg(long)]
        lang: Option<String>,
    },

    /// List supported languages.
    Languages,

    /// Print the effective configuration (token masked).
    Config,

    /// Sign in and print the user.
    Login {
        #[arg(long)]
        email: String,
        #[command(flatten)]
        password: PasswordArg,
    },

    /// Create an account.
    Register {
        first_name: String,
        last_name: String,
        #[arg(long)]
        email: String,
        #[command(flatten)]
        password: PasswordArg,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },

    /// Mail a password reset code.
    ForgotPassword {
        #[arg(long)]
        email: String,
    },

    /// Set a new password with a mailed reset code.
    ResetPassword {
        /// Six-digit code from the reset mail.
        #[arg(long)]
        otp: String,
        /// The new password.
        #[command(flatten)]
        password: PasswordArg,
    },

    /// Sign in and update profile fields or the profile picture.
    UpdateProfile {
        #[arg(long)]
        email: String,
        #[command(flatten)]
        password: PasswordArg,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// JPEG, PNG or WebP picture to upload.
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct PasswordArg {
    #[arg(long, env = "VETRINA_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = ClientConfig::load(cli.config.clone())?;
    if let Some(base_url) = &cli.base_url {
        debug!(%base_url, "Overriding base URL from command line");
        config.server.base_url = base_url.clone();
        config.validate()?;
    }

    commands::run(cli, config).await
}

/// Initializes the tracing subscriber on stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vetrina=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
