use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;

use crate::api::routes::state::AppState;
use crate::config::Config;
use crate::database::Database;
use crate::error::AlertDeskError;
use crate::logging;

#[derive(Parser)]
#[command(
    name = "alertdesk",
    version,
    about = "alertdesk: emergency alert service for faculty and campus security"
)]
pub struct Cli {
    /// Path to a TOML config file (default: the per-user data directory)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the server (default if no command specified)
    Serve {
        /// Address to bind, overrides server.host
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, overrides server.port
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },

    /// Create the database schema and exit
    InitDb,
}

impl Cli {
    pub fn handle_command_line() -> Result<(), AlertDeskError> {
        let args = Cli::parse();

        let mut config = Config::load(args.config.as_deref())?;
        let _logger = logging::init(&config.logging)?;

        // Default to Serve if no command specified
        match args.command.unwrap_or(Command::Serve { host: None, port: None }) {
            Command::Serve { host, port } => {
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                Self::start_server(config)
            }
            Command::InitDb => {
                Database::open(&config.database.path)?;
                info!("Database ready at {}", config.database.path.display());
                Ok(())
            }
        }
    }

    fn start_server(config: Config) -> Result<(), AlertDeskError> {
        let db = Database::open(&config.database.path)?;
        let state = AppState::new(db, config.auth);

        info!("Starting server on {}:{}", config.server.host, config.server.port);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| AlertDeskError::Error(format!("Failed to create runtime: {}", e)))?;

        rt.block_on(async {
            let web_server = crate::server::WebServer::new(config.server.host, config.server.port, state);
            web_server.start().await
        })
    }
}
