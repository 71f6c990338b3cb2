use serde::{Deserialize, Serialize};

/// Identifier of an object spawned into the arena by an ability.
pub type ObjectId = u32;

/// Kinds of objects abilities can spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Walkable platform produced by `GenerateFloor`.
    Floor,
}
