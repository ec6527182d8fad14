//! Which side of the product the client is serving.

use serde::{Deserialize, Serialize};

/// The portal the voice pipeline runs in.
///
/// Each portal has a fixed synthesis voice. The voice is configuration, not a
/// user-facing control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortalContext {
    /// Clinician-facing portal.
    #[default]
    Provider,
    /// Patient-facing portal.
    Patient,
}

impl PortalContext {
    /// Synthesis voice identifier for this portal.
    pub const fn voice(self) -> &'static str {
        match self {
            Self::Provider => "alloy",
            // warmer voice for patients
            Self::Patient => "nova",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Patient => "patient",
        }
    }

    /// Parse a portal name (`"provider"` | `"patient"`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "provider" => Some(Self::Provider),
            "patient" => Some(Self::Patient),
            _ => None,
        }
    }
}

impl std::fmt::Display for PortalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
