//! # Host Library
//!
//! The authoritative side of the arena soccer game. The host runs the only
//! real physics simulation; clients merely send held-input snapshots and
//! interpolate toward the states broadcast from here.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! [`game::Session`] owns the canonical players, ball and scores and advances
//! them at a fixed 60 Hz tick: input acceleration, drag, integration, boundary
//! clamping, kick impulses with a 300 ms cooldown, ball/player collision and
//! goal detection with immediate round reset.
//!
//! ### Roster Management
//! [`client_manager::ClientManager`] maps network addresses to player ids,
//! enforces the capacity limit and sweeps peers that go silent. Joining peers
//! are placed on whichever team has fewer players.
//!
//! ### State Broadcasting
//! [`network::Server`] publishes a full snapshot (every player, the ball and
//! both scores) at 50 Hz over UDP, plus one immediate out-of-cadence snapshot
//! whenever a goal is scored. There are no deltas, acknowledgements or
//! sequence numbers: a lost snapshot is simply superseded by the next one.
//!
//! ## Architecture
//!
//! Everything runs in a single `tokio::select!` event loop fed by a receive
//! task, a send task and a timeout sweeper. Driver callbacks run to
//! completion before the next fires, so the session is never observed
//! half-updated and no locking discipline beyond the loop itself is needed.
//! The host's own input (for the reserved `peer_host` player) is folded in
//! right before each tick, making the host just another player inside the
//! integrator.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use host::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("127.0.0.1:8080", 8).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod network;
