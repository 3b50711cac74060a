//! # Spotify Integration Module
//!
//! This module talks to the Spotify Web API on behalf of the configured
//! environments. It handles token exchange and refresh, device resolution,
//! playback control and moving playback between accounts.
//!
//! ## Architecture
//!
//! ```text
//! HTTP handlers (api)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (authorization code + refresh)
//!     ├── Devices (name → id, active device)
//!     ├── Player (play, pause, volume, playlists, shuffle, repeat)
//!     ├── Playlists (size, track position)
//!     └── Transfer (queue-preserving and hard transfer)
//!          ↓
//! SpotifyClient (reqwest, bearer tokens, timeout)
//!          ↓
//! Spotify Web API
//! ```
//!
//! Every operation takes the [`SpotifyClient`] and the
//! [`Environment`](crate::management::Environment) it acts for; there is no
//! ambient "current account" at this level.
//!
//! ## Token Strategy
//!
//! Access tokens are refreshed eagerly, once per request in the session
//! middleware, instead of reacting to `401` responses. The transfer engine
//! additionally refreshes the destination environment before touching the
//! source.
//!
//! ## API Coverage
//!
//! - `GET /me/player` - current playback state
//! - `GET /me/player/queue` - user queue
//! - `GET /me/player/devices` - available devices
//! - `PUT /me/player/play|pause|volume|shuffle|repeat` - playback control
//! - `GET /playlists/{id}` and `GET /playlists/{id}/tracks` - playlist data
//! - `POST /api/token` - token exchange and refresh

pub mod auth;
mod client;
pub mod devices;
pub mod player;
pub mod playlist;
pub mod transfer;

pub use client::SpotifyClient;
pub use client::ensure_success;
