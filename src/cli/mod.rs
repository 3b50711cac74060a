//! # CLI Module
//!
//! Terminal commands that run next to the server: opening the Spotify login
//! of an environment and listing its devices. Output goes through the
//! colored [`info!`](crate::info), [`success!`](crate::success),
//! [`warning!`](crate::warning) and [`error!`](crate::error) macros.
//!
//! ```bash
//! homelink login --env home    # opens the Spotify consent page
//! homelink devices --env main  # prints the live device table
//! homelink                     # runs the HTTP gateway
//! ```

mod auth;
mod devices;

pub use auth::login;
pub use devices::devices;
