//! Enumeration types for COMETS simulation output.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Log kinds
// ---------------------------------------------------------------------------

/// One of the six log files the simulation engine can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// Tab-delimited total biomass per model, one row per cycle.
    TotalBiomass,
    /// Sparse per-cell biomass: `cycle x y species biomass`.
    Biomass,
    /// Sparse per-cell reaction fluxes, multiplexed by model index.
    Flux,
    /// Sparse per-cell metabolite concentrations.
    Media,
    /// Header-bearing free-form table of selected media values.
    SpecificMedia,
    /// Lineage events written when evolution is enabled.
    Genotypes,
}

impl LogKind {
    /// All log kinds, in the order the run output loads them.
    pub const ALL: [Self; 6] = [
        Self::TotalBiomass,
        Self::Flux,
        Self::Media,
        Self::Biomass,
        Self::Genotypes,
        Self::SpecificMedia,
    ];

    /// Stable lowercase name used in logs and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TotalBiomass => "total_biomass",
            Self::Biomass => "biomass",
            Self::Flux => "flux",
            Self::Media => "media",
            Self::SpecificMedia => "specific_media",
            Self::Genotypes => "genotypes",
        }
    }
}

impl core::fmt::Display for LogKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// The category of name a grid query selects on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A model id from the configured model list.
    Model,
    /// A species id as written in the spatial biomass log.
    Species,
    /// An extracellular metabolite name.
    Metabolite,
    /// A reaction name from a model's reaction list.
    Reaction,
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Model => "model",
            Self::Species => "species",
            Self::Metabolite => "metabolite",
            Self::Reaction => "reaction",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_kind_serializes_snake_case() {
        let json = serde_json::to_string(&LogKind::SpecificMedia);
        assert!(matches!(json.as_deref(), Ok("\"specific_media\"")));
    }

    #[test]
    fn display_matches_as_str() {
        for kind in LogKind::ALL {
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }
}
