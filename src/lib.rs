//! Homelink home gateway library
//!
//! A small HTTP gateway for one household. It drives two Spotify accounts
//! (a shared `home` account on the living room speaker and a personal `main`
//! account), moves playback between them, runs alarm and sleep timers, and
//! exposes a GPIO lamp and a few machines reachable over Tailscale.
//!
//! # Modules
//!
//! - `api` - HTTP handlers and the Spotify session middleware
//! - `cli` - terminal commands for login and device listing
//! - `config` - environment variable backed configuration
//! - `error` - the [`GatewayError`](error::GatewayError) taxonomy
//! - `lamp` - GPIO lamp toggle
//! - `machines` - wake, sleep and battery of tailnet machines
//! - `management` - environments, their registry and token files
//! - `scheduler` - delayed one-shot tasks
//! - `server` - router and server lifecycle
//! - `spotify` - Spotify Web API operations
//! - `types` - wire and domain types
//! - `utils` - small parsing and time helpers

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod lamp;
pub mod machines;
pub mod management;
pub mod scheduler;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Prints an informational message with a blue bullet point.
///
/// ```ignore
/// info!("Found {} devices", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal CLI errors. The program terminates with exit code 1, so
/// the macro can stand in any expression position.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
