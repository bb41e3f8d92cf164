//! # Race Server Library
//!
//! This library provides the authoritative server for the arcade racing
//! mini-game. It owns the canonical race state, applies each client tick to
//! it, and reports the resulting positions, laps and winner back as JSON.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server runs the definitive version of both race engines from the
//! `shared` crate. Clients only send the keys they hold and their frame time;
//! every position, lap count and finish decision is made here.
//!
//! ### Serialized Mutation
//! Each race type has exactly one live state. A single race task owns it and
//! processes start, update and read requests strictly in the order they
//! arrive, so concurrent HTTP requests can never interleave half-applied
//! ticks.
//!
//! ### Client Records
//! After every tick the server flattens the race state into the record the
//! browser client renders from (`creature1_x`, `winner`, `lap`, ...).
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! - `RaceSession` holding the live circuit and drag races
//! - `RaceHandle` and the command queue feeding the race task
//! - Reset-and-start semantics for `/start`
//!
//! ### API Module (`api`)
//! - Request and response records
//! - Mapping of race errors onto HTTP status codes
//!
//! ### Network Module (`network`)
//! - axum route table and handlers
//! - Listener binding, optional static file serving, graceful shutdown
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::game::RaceSession;
//! use server::network::Server;
//! use shared::{CircuitConfig, DragConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let session = RaceSession::new(CircuitConfig::with_laps(3), DragConfig::default())?;
//!
//!     // Bind the listener and spawn the race task
//!     let server = Server::new("127.0.0.1:8000", session, None).await?;
//!
//!     // Serve until Ctrl+C
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod game;
pub mod network;
pub mod utils;
