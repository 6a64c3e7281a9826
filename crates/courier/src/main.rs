// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - a multi-tenant delayed-messaging backend.
//!
//! This is the binary entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod serve;
mod shutdown;

/// Courier - a multi-tenant delayed-messaging backend.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    /// Path to a config file (overrides the XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Courier backend: dispatcher loop plus HTTP gateway.
    Serve,
    /// Create a tenant account and print its API token.
    CreateUser {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Unique email address.
        #[arg(long)]
        email: String,
        /// Initial message credits.
        #[arg(long, default_value_t = 100)]
        credits: i64,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<courier_config::CourierConfig, String> {
    let result = match path {
        Some(path) => courier_config::load_config_from_path(path),
        None => courier_config::load_config(),
    };
    result.map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::CreateUser {
            name,
            email,
            credits,
        } => create_user(config, name, email, credits).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Insert a tenant row and print the generated API token once.
async fn create_user(
    config: courier_config::CourierConfig,
    name: String,
    email: String,
    credits: i64,
) -> Result<(), courier_core::CourierError> {
    use courier_core::{Clock, SystemClock};
    use courier_storage::models::User;
    use courier_storage::queries::users;

    let db = courier_storage::Database::open(&config.storage.database_path).await?;
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        email,
        api_token: uuid::Uuid::new_v4().simple().to_string(),
        credits,
        created_at: SystemClock.now_ts(),
    };
    users::create_user(&db, &user).await?;
    db.close().await?;

    println!("created user {} ({})", user.name, user.id);
    println!("api token: {}", user.api_token);
    Ok(())
}
