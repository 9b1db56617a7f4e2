//! Grist Engine Core
//!
//! Contains the fundamental entity storage systems:
//! - Generational entity identities and recycling
//! - Typed columnar component storage
//! - Versioned entity sets with set algebra
//! - Join/query surface over component memberships

pub mod ecs;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
