//! # Tribe Simulation Core
//!
//! Deterministic simulation and visibility core of a settlement-building
//! real-time strategy game.
//!
//! This crate implements the authoritative game loop: state → commands →
//! state transitions. Every replica applying the same commands in the same
//! order ends up with the same state, which is what network play and
//! replays rely on.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │   UI / AI   │────▶│ PlayerInputs │────▶│ step_world  │
//! │  (intents)  │     │ (commands)   │     │ (pure fn)   │
//! └─────────────┘     └──────────────┘     └──────┬──────┘
//!                                                 │
//!                     ┌──────────────┐     ┌──────▼──────┐
//!                     │ Notifications│◀────│ WorldState  │
//!                     │ (sound, ...) │     │ (new state) │
//!                     └──────────────┘     └─────────────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`WorldState`] | Complete simulation state (map, players, objects, queue) |
//! | [`Map`] | Shared field store: terrain, roads, ownership, node caps |
//! | [`Player`] | Per-player vision, statistics, inbox and permissions |
//! | [`Command`] | Player intents (BuildFlag, BuildRoad, AttackFlag, etc.) |
//! | [`step_world`] | Pure function: `(state, inputs) -> state` |
//!
//! ## Systems
//!
//! All mutation goes through [`systems`]: territory and build rights,
//! placement, bulldozing, construction, military actions and messaging.
//! Long-running effects are follow-up commands in the [`CommandQueue`].

pub mod caps;
pub mod config;
pub mod coords;
pub mod error;
pub mod fileio;
pub mod immovable;
pub mod input;
pub mod map;
pub mod messages;
pub mod path;
pub mod player;
pub mod queue;
pub mod state;
pub mod statistics;
pub mod step;
pub mod systems;
pub mod testing;
pub mod tribe;
pub mod vision;
pub mod worker;

pub use caps::{BuildSize, NodeCaps};
pub use config::SimConfig;
pub use coords::{Coords, Direction, PlayerNumber, Serial, Time};
pub use error::{GameDataError, StartError};
pub use input::{Command, PlayerInputs};
pub use map::Map;
pub use player::Player;
pub use queue::CommandQueue;
pub use state::{Notification, WorldState};
pub use step::{step_world, ActionError};
pub use tribe::{TribeData, TribeDescr};
pub use vision::Visibility;
