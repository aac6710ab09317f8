use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::filter::ClassifyOptions;
use crate::data::loader::DEFAULT_ATOM;
use crate::data::registry::{AlignOptions, NumberingSource};
use crate::geometry::LayoutOptions;

/// Every tunable of a session. Fields missing from a settings file keep their
/// defaults.
///
/// ```json
/// {
///   "align": { "max_mismatches": 2 },
///   "classify": { "statistic_threshold": 20.0, "positive_only": true },
///   "score_slack": 1,
///   "pdb_atom": "O2'"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub align: AlignOptions,
    pub classify: ClassifyOptions,
    pub layout: LayoutOptions,
    /// Positional slack when scoring contacts against a reference structure.
    pub score_slack: usize,
    /// Atom representing each residue of a 3-D model.
    pub pdb_atom: String,
    /// Chain of a 3-D model to read; the first chain when unset.
    pub pdb_chain: Option<String>,
    /// Numbering that contact files opened later are read in.
    pub contact_numbering: NumberingSource,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            align: AlignOptions::default(),
            classify: ClassifyOptions::default(),
            layout: LayoutOptions::default(),
            score_slack: 0,
            pdb_atom: DEFAULT_ATOM.to_string(),
            pdb_chain: None,
            contact_numbering: NumberingSource::Profile,
        }
    }
}

impl Settings {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing settings JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        let settings = Self::from_json_str(&text)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
