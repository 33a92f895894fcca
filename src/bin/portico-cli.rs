use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use portico::config::{load_config, ClientConfig};
use portico::validation::{FormValidator, Rule};
use portico::ApiClient;

#[derive(Parser)]
#[command(name = "portico-cli")]
#[command(about = "Exercise an API through the portico client pipeline", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured base URL.
    #[arg(short, long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate and persist the session
    Login {
        username: String,
        password: String,
        /// Login endpoint path
        #[arg(long, default_value = "/auth/login")]
        path: String,
    },
    /// Perform a GET against an API path
    Get { path: String },
    /// Show the current session
    Whoami,
    /// Clear the session
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portico=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = cli.url {
        config.base_url = url;
    }

    let client = ApiClient::new(config)?;

    match cli.command {
        Commands::Login {
            username,
            password,
            path,
        } => {
            client.check_form(
                FormValidator::new()
                    .field("username", &username, &[Rule::Required])
                    .field("password", &password, &[Rule::Required]),
            )?;
            let session = client
                .login(&path, &json!({"username": username, "password": password}))
                .await?;
            println!("signed in as role '{}'", session.role);
        }
        Commands::Get { path } => {
            let data: Value = client.get(&path).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Commands::Whoami => match client.session().snapshot() {
            Some(session) => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "authenticated": session.is_authenticated(),
                        "role": session.role,
                        "user": session.user,
                    }))?
                );
            }
            None => println!("no session"),
        },
        Commands::Logout => {
            client.logout();
            println!("signed out");
        }
    }

    Ok(())
}
