//! World-mutating systems.
//!
//! Each module owns one family of operations. Player intents return
//! `Result<_, ActionError>` and leave the world untouched on error;
//! scheduled follow-ups silently skip objects that no longer exist.

pub mod buildings;
pub mod bulldoze;
pub mod construction;
pub mod initialization;
pub mod messaging;
pub mod military;
pub mod placement;
pub mod territory;

pub use bulldoze::bulldoze;
pub use initialization::create_default_infrastructure;
pub use military::{enemy_flag_action, find_attack_soldiers};
pub use placement::{build, build_flag, build_road, plan_road};
pub use territory::get_buildcaps;
