//! `minihome` command-line host for the blog's Spotify session and playlist.
//!
//! Run with: `minihome <command>`
//!
//! This binary stands in for the blog page, so `println!` and `eprintln!`
//! are used for user-facing output; diagnostics go through `tracing` to
//! stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

mod app;
mod command;

use app::App;
use command::Command;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) => tracing::debug!(error = %e, "No .env file loaded"),
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}");
            eprintln!();
            print_help();
            return ExitCode::FAILURE;
        }
    };

    if command == Command::Help {
        print_help();
        return ExitCode::SUCCESS;
    }

    let result = match App::from_env() {
        Ok(app) => app.run(command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn print_help() {
    println!("minihome - Spotify session and playlist for the blog");
    println!();
    println!("USAGE:");
    println!("    minihome <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    login                     Start Spotify authorization (prints the URL to open)");
    println!("    callback <redirect-url>   Finish authorization with the URL Spotify redirected to");
    println!("    status                    Show the session state");
    println!("    token                     Print a valid access token, refreshing if needed");
    println!("    search <query>            Search Spotify tracks");
    println!("    add-track <query>         Add the top search result to the playlist");
    println!("    add-song <title> <artist> [album] [duration]");
    println!("                              Add a song by hand");
    println!("    remove-song <id>          Remove a song from the playlist");
    println!("    playlist                  List the playlist");
    println!("    logout                    Forget the Spotify session");
    println!("    help                      Show this help message");
    println!();
    println!("Configuration comes from MINIHOME_* environment variables (a .env file is");
    println!("read first) or from minihome.toml / minihome.json.");
}
