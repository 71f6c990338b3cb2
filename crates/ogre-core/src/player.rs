use serde::{Deserialize, Serialize};

/// Unique identifier for a player in the arena.
pub type PlayerId = u64;

/// Maximum display name length in bytes.
pub const MAX_DISPLAY_NAME_LEN: usize = 32;

/// A player connected to the arena session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
}

impl Player {
    pub fn new(id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// Trim and validate a requested display name.
///
/// Returns `None` for empty names, names longer than [`MAX_DISPLAY_NAME_LEN`],
/// or names containing control characters.
pub fn sanitize_display_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() || name.len() > MAX_DISPLAY_NAME_LEN || name.chars().any(char::is_control)
    {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(sanitize_display_name("  Ogre  ").as_deref(), Some("Ogre"));
    }

    #[test]
    fn rejects_empty_and_blank_names() {
        assert!(sanitize_display_name("").is_none());
        assert!(sanitize_display_name("   ").is_none());
    }

    #[test]
    fn rejects_control_characters() {
        assert!(sanitize_display_name("bad\u{7}name").is_none());
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "x".repeat(MAX_DISPLAY_NAME_LEN + 1);
        assert!(sanitize_display_name(&long).is_none());
        let exact = "x".repeat(MAX_DISPLAY_NAME_LEN);
        assert!(sanitize_display_name(&exact).is_some());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn sanitized_names_are_bounded_and_trimmed(raw in ".{0,48}") {
                if let Some(name) = sanitize_display_name(&raw) {
                    prop_assert!(!name.is_empty());
                    prop_assert!(name.len() <= MAX_DISPLAY_NAME_LEN);
                    prop_assert_eq!(name.trim(), name.as_str());
                    prop_assert!(!name.chars().any(char::is_control));
                }
            }
        }
    }
}
