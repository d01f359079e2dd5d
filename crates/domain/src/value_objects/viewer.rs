//! Who is looking at the catalog

use serde::{Deserialize, Serialize};

/// The caller's visibility class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Viewer {
    /// Authenticated staff member
    Admin,
    /// Anonymous visitor
    #[default]
    Public,
}

impl Viewer {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admin_is_admin() {
        assert!(Viewer::Admin.is_admin());
        assert!(!Viewer::Public.is_admin());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Viewer::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn default_is_public() {
        assert_eq!(Viewer::default(), Viewer::Public);
    }
}
