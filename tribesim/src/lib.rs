//! Headless runner for the tribe simulation core.
//!
//! Loads a scenario file, builds the initial world and replays the
//! scenario's command timeline through [`tribesim_core::step_world`].

pub mod loader;
