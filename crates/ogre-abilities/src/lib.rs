pub mod ability;
pub mod arena;
pub mod behavior;
pub mod catalog;
pub mod collision;
pub mod config;
pub mod cooldown;
pub mod executor;
pub mod hitbox;
pub mod input;
pub mod peer;
pub mod world;

pub use ability::Ability;
pub use arena::ArenaWorld;
pub use catalog::AbilityCatalog;
pub use config::AbilityConfig;
pub use executor::{AbilityExecutor, Dispatch, ExecutorEvent, Outbound, PeerRole};
pub use peer::ClientPeer;
