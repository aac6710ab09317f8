use std::path::Path;

use anyhow::{bail, Context, Result};
use rnavista::config::Settings;
use rnavista::data::filter::Score;
use rnavista::data::loader::{dataset_name, load_file_with, LoadedData};
use rnavista::error::{Built, UnmappedPositionWarning};
use rnavista::figure::{
    ArcFigure, DistanceFigure, HeatmapFigure, OverlayFigure, QcFigure, Session, SkylineFigure,
};

// ---------------------------------------------------------------------------
// Figure selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureKind {
    Skyline,
    Arcs,
    Comparison,
    SecondaryStructure,
    Circle,
    Heatmap,
    DistanceHistogram,
    Qc,
}

impl FigureKind {
    pub const ALL: [FigureKind; 8] = [
        FigureKind::Skyline,
        FigureKind::Arcs,
        FigureKind::Comparison,
        FigureKind::SecondaryStructure,
        FigureKind::Circle,
        FigureKind::Heatmap,
        FigureKind::DistanceHistogram,
        FigureKind::Qc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FigureKind::Skyline => "Skyline",
            FigureKind::Arcs => "Arc diagram",
            FigureKind::Comparison => "Structure comparison",
            FigureKind::SecondaryStructure => "Secondary structure",
            FigureKind::Circle => "Circle diagram",
            FigureKind::Heatmap => "Heatmap",
            FigureKind::DistanceHistogram => "3-D distance histogram",
            FigureKind::Qc => "Read depth / QC",
        }
    }
}

/// Geometry of the figure currently on screen.
#[derive(Debug, Clone)]
pub enum FigureGeometry {
    Skyline(SkylineFigure),
    Arcs(ArcFigure),
    Overlay(OverlayFigure),
    Heatmap(HeatmapFigure),
    Distance(DistanceFigure),
    Qc(QcFigure),
}

impl FigureGeometry {
    pub fn score(&self) -> Option<Score> {
        match self {
            FigureGeometry::Arcs(arcs) => arcs.score,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded data (None until a file defining the sequence is opened).
    pub session: Option<Session>,

    /// Settings applied to the session and to files opened later.
    pub settings: Settings,

    pub figure_kind: FigureKind,

    /// Sample whose data the figure shows.
    pub sample: Option<String>,

    /// Second sample for structure comparisons.
    pub other_sample: Option<String>,

    /// Sample that newly opened files are added to; the file name when empty.
    pub load_label: String,

    /// Last built figure (cached until something changes).
    pub figure: Option<FigureGeometry>,

    /// Positions that could not be drawn in the last figure.
    pub warnings: Vec<UnmappedPositionWarning>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: None,
            settings: Settings::default(),
            figure_kind: FigureKind::Arcs,
            sample: None,
            other_sample: None,
            load_label: String::new(),
            figure: None,
            warnings: Vec::new(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Parse `path` and add it to the session under the load label.
    pub fn open_path(&mut self, path: &Path) -> Result<()> {
        let data = load_file_with(path, &self.settings.pdb_atom, self.settings.pdb_chain.as_deref())?;
        let label = match self.load_label.trim() {
            "" => dataset_name(path),
            label => label.to_string(),
        };
        self.add_loaded(&label, data)
            .with_context(|| format!("adding {} to sample '{label}'", path.display()))
    }

    /// Add parsed data, starting a session from it when none exists yet. A
    /// session is only kept once its first dataset has been added.
    pub fn add_loaded(&mut self, label: &str, data: LoadedData) -> Result<()> {
        match self.session.as_mut() {
            Some(session) => session.add(label, data)?,
            None => {
                let Some(sequence) = data.sequence() else {
                    bail!("open a sequence, profile or structure before {} data", data.kind());
                };
                let mut session = Session::new(sequence, self.settings.clone());
                session.add(label, data)?;
                self.session = Some(session);
            }
        }
        if self.sample.is_none() {
            self.sample = Some(label.to_string());
        } else if self.other_sample.is_none() && self.sample.as_deref() != Some(label) {
            self.other_sample = Some(label.to_string());
        }
        self.status_message = None;
        self.rebuild();
        Ok(())
    }

    pub fn set_settings(&mut self, settings: Settings) {
        if let Some(session) = self.session.as_mut() {
            session.set_settings(settings.clone());
        }
        self.settings = settings;
        self.rebuild();
    }

    pub fn set_figure_kind(&mut self, kind: FigureKind) {
        self.figure_kind = kind;
        self.rebuild();
    }

    pub fn select_sample(&mut self, label: String) {
        self.sample = Some(label);
        self.rebuild();
    }

    pub fn select_other_sample(&mut self, label: String) {
        self.other_sample = Some(label);
        self.rebuild();
    }

    /// Drop every loaded dataset.
    pub fn clear(&mut self) {
        *self = AppState {
            settings: self.settings.clone(),
            ..AppState::default()
        };
    }

    /// Rebuild the cached figure after a data, selection or settings change.
    pub fn rebuild(&mut self) {
        self.figure = None;
        self.warnings.clear();
        let Some(session) = &self.session else {
            return;
        };
        let sample = self.sample.as_deref().unwrap_or_default();
        let other = self.other_sample.as_deref().unwrap_or_default();

        let built = match self.figure_kind {
            FigureKind::Skyline => session.skyline().map(|b| b.map(FigureGeometry::Skyline)),
            FigureKind::Arcs => session.arcs(sample).map(|b| b.map(FigureGeometry::Arcs)),
            FigureKind::Comparison => session
                .comparison(sample, other)
                .map(|b| b.map(FigureGeometry::Arcs)),
            FigureKind::SecondaryStructure => session
                .secondary_structure(sample)
                .map(|b| b.map(FigureGeometry::Overlay)),
            FigureKind::Circle => session.circle(sample).map(|b| b.map(FigureGeometry::Overlay)),
            FigureKind::Heatmap => session.heatmap(sample).map(|b| b.map(FigureGeometry::Heatmap)),
            FigureKind::DistanceHistogram => session
                .disthist(sample)
                .map(|b| b.map(FigureGeometry::Distance)),
            FigureKind::Qc => session.qc(sample).map(|b| b.map(FigureGeometry::Qc)),
        };

        match built {
            Ok(Built { value, warnings }) => {
                if !warnings.is_empty() {
                    log::warn!("{}: {} positions could not be drawn", self.figure_kind.label(), warnings.len());
                }
                self.figure = Some(value);
                self.warnings = warnings;
                self.status_message = None;
            }
            Err(e) => {
                log::info!("{} not built: {e}", self.figure_kind.label());
                self.status_message = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rnavista::data::model::{Contact, ContactSet, Pair, Sequence};

    fn structure(pairs: Vec<Pair>) -> LoadedData {
        LoadedData::Structure {
            sequence: Sequence::new("hp", "GGGAAACCC"),
            pairs,
        }
    }

    #[test]
    fn test_failed_first_file_leaves_no_session() {
        let mut state = AppState::default();
        let conflicting = structure(vec![Pair::new(1, 9), Pair::new(1, 8)]);
        assert!(state.add_loaded("hp", conflicting).is_err());
        assert!(state.session.is_none());
        assert!(state.sample.is_none());

        state.add_loaded("hp", structure(vec![Pair::new(1, 9)])).unwrap();
        let session = state.session.as_ref().unwrap();
        assert_eq!(session.samples().len(), 1);
        assert_eq!(state.sample.as_deref(), Some("hp"));
    }

    #[test]
    fn test_contacts_cannot_start_a_session() {
        let mut state = AppState::default();
        let set = ContactSet {
            name: "rings".to_string(),
            contacts: vec![Contact::new(1, 9, 30.0)],
        };
        let err = state.add_loaded("hp", LoadedData::Contacts(set)).unwrap_err();
        assert!(err.to_string().contains("before contacts data"));
        assert!(state.session.is_none());
    }

    #[test]
    fn test_figure_rebuilt_on_selection() {
        let mut state = AppState::default();
        state.add_loaded("hp", structure(vec![Pair::new(1, 9), Pair::new(2, 8)])).unwrap();
        assert!(matches!(state.figure, Some(FigureGeometry::Arcs(_))));

        state.set_figure_kind(FigureKind::DistanceHistogram);
        assert!(state.figure.is_none());
        assert!(state.status_message.is_some());

        state.set_figure_kind(FigureKind::Circle);
        assert!(matches!(state.figure, Some(FigureGeometry::Overlay(_))));
    }
}
