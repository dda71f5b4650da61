//! # Client Library
//!
//! The viewing side of the arena soccer game. The client runs no physics at
//! all: it sends held-input snapshots to the host and renders an interpolated
//! copy of the authoritative state the host broadcasts back.
//!
//! ## Architecture Overview
//!
//! ### Snapshot Interpolation
//! Every snapshot carries the full match state. [`game::ClientView`] records
//! a target position per entity and the render loop eases the displayed
//! position toward it by a fixed factor each frame, so visual smoothness is
//! decoupled from network rate.
//!
//! ### Snap Correction
//! When an incoming position diverges from the displayed one by more than
//! the snap threshold (a teleport, or the tail end of a dropped snapshot
//! run), the view jumps straight to the authoritative position instead of
//! sliding there. A freshly seen entity is likewise adopted verbatim.
//!
//! ### Loss Tolerance
//! There are no acknowledgements, sequence numbers or retries. A lost
//! snapshot is healed by the next full one; a lost input is covered by the
//! periodic keep-alive resend.
//!
//! ## Module Organization
//!
//! - [`game`] — reconciliation and interpolation engine
//! - [`input`] — keyboard sampling and keep-alive resend
//! - [`network`] — UDP client loop tying input, snapshots and rendering together
//! - [`rendering`] — macroquad pitch, players, ball, scoreboard and goal banner

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
