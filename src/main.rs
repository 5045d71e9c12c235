mod alerts;
mod api;
mod auth;
mod cli;
mod config;
mod database;
mod error;
mod logging;
mod schema;
mod server;
mod time_format;
mod users;

use cli::Cli;
use log::error;

fn main() {
    if let Err(err) = Cli::handle_command_line() {
        error!("{:?}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
