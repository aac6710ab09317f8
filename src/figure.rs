//! Figure composition: a session of aligned samples and the builders that run
//! the filter → layout pipeline for each figure type.
//!
//! ```text
//!   LoadedData ──add──▶ Session ──align / project──▶ Sample (Arc'd, global numbering)
//!                          │
//!                          ├── skyline()              → SkylineFigure
//!                          ├── arcs() / comparison()  → ArcFigure
//!                          ├── secondary_structure()  → OverlayFigure
//!                          ├── circle()               → OverlayFigure
//!                          ├── heatmap()              → HeatmapFigure
//!                          ├── disthist()             → DistanceFigure
//!                          └── qc()                   → QcFigure
//! ```
//!
//! Builders never mutate the session. Each returns the geometry plus any
//! unmapped-position warnings, or aborts with an [`RnavError`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Settings;
use crate::data::filter::{classify, score, Score};
use crate::data::loader::LoadedData;
use crate::data::model::{
    Contact, ContactClass, ContactSet, Linked, Position, Profile, ProfileRow, Sequence, SpatialModel,
    StructureCoordinateSet,
};
use crate::data::registry::{Alignment, NumberingSource, SequenceRegistry};
use crate::data::structure::{PairOrigin, StructureModel};
use crate::error::{Built, Result, RnavError};
use crate::geometry::{
    arc_layout, backbone_path, bins_for, circle_coordinates, distance_histogram, heatmap_contour,
    skyline_series, structure_overlay, ArcDescriptor, ContactColoring, ContourPath, DistanceHistogram,
    Segment, StatisticGrid,
};

// ---------------------------------------------------------------------------
// Samples and the session
// ---------------------------------------------------------------------------

/// A contact whose link weight is the configured colouring value.
struct Colored<'a> {
    contact: &'a Contact,
    by: ContactColoring,
}

impl Linked for Colored<'_> {
    fn endpoints(&self) -> (Position, Position) {
        self.contact.key()
    }

    fn weight(&self) -> Option<f64> {
        self.by.value(self.contact)
    }

    fn class(&self) -> Option<ContactClass> {
        self.contact.class
    }
}

/// Everything loaded for one experiment, already in global numbering.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub label: String,
    pub profile: Option<Arc<Profile>>,
    pub contacts: Option<Arc<ContactSet>>,
    pub structure: Option<Arc<StructureModel>>,
    pub coordinates: Option<Arc<StructureCoordinateSet>>,
    pub spatial: Option<Arc<SpatialModel>>,
    /// Alignment of each sequence-bearing dataset, by kind.
    alignments: BTreeMap<NumberingSource, Alignment>,
    /// Contacts as read, with the numbering they follow. Re-projected
    /// whenever one of the alignments changes.
    raw_contacts: Option<(ContactSet, NumberingSource)>,
}

impl Sample {
    fn new(label: &str) -> Self {
        Sample {
            label: label.to_string(),
            ..Default::default()
        }
    }

    /// Short list of what is loaded, for the side panel.
    pub fn summary(&self) -> Vec<&'static str> {
        [
            (self.profile.is_some(), "profile"),
            (self.contacts.is_some(), "contacts"),
            (self.structure.is_some(), "structure"),
            (self.coordinates.is_some(), "diagram"),
            (self.spatial.is_some(), "3-D model"),
        ]
        .into_iter()
        .filter_map(|(present, name)| present.then_some(name))
        .collect()
    }

    /// Numbering the contacts were placed with, if any are loaded.
    pub fn contact_numbering(&self) -> Option<NumberingSource> {
        self.raw_contacts.as_ref().map(|(_, source)| *source)
    }

    fn set_alignment(&mut self, source: NumberingSource, alignment: Alignment, registry: &SequenceRegistry) {
        self.alignments.insert(source, alignment);
        self.project_contacts(registry);
    }

    /// Place the raw contacts with the alignment of their numbering source,
    /// or as global positions while that dataset is not loaded.
    fn project_contacts(&mut self, registry: &SequenceRegistry) {
        let Some((set, source)) = &self.raw_contacts else {
            return;
        };
        let alignment = match self.alignments.get(source) {
            Some(alignment) => *alignment,
            None => {
                if *source != NumberingSource::Identity {
                    log::debug!("{}: no {} loaded, contacts kept as numbered", set.name, source.label());
                }
                registry.identity()
            }
        };
        let contacts = registry.project_contacts(&set.name, &set.contacts, &alignment);
        self.contacts = Some(Arc::new(ContactSet {
            name: set.name.clone(),
            contacts,
        }));
    }
}

/// One canonical sequence and the samples aligned onto it.
#[derive(Debug, Clone)]
pub struct Session {
    registry: Arc<SequenceRegistry>,
    settings: Settings,
    samples: Vec<Sample>,
}

impl Session {
    pub fn new(sequence: Sequence, settings: Settings) -> Self {
        log::info!("New session on '{}' ({} nt)", sequence.name(), sequence.len());
        Session {
            registry: Arc::new(SequenceRegistry::with_options(Arc::new(sequence), settings.align)),
            settings,
            samples: Vec::new(),
        }
    }

    pub fn sequence(&self) -> &Arc<Sequence> {
        self.registry.sequence()
    }

    pub fn length(&self) -> usize {
        self.sequence().len()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings. Alignment options and contact numbering apply to
    /// datasets added later; filter and layout options apply to the next
    /// figure build.
    pub fn set_settings(&mut self, settings: Settings) {
        if settings.align != self.settings.align {
            self.registry = Arc::new(SequenceRegistry::with_options(self.sequence().clone(), settings.align));
        }
        self.settings = settings;
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn sample(&self, label: &str) -> Result<&Sample> {
        self.samples
            .iter()
            .find(|s| s.label == label)
            .ok_or_else(|| RnavError::MissingData(format!("sample {label}")))
    }

    fn sample_mut(&mut self, label: &str) -> &mut Sample {
        let idx = match self.samples.iter().position(|s| s.label == label) {
            Some(idx) => idx,
            None => {
                self.samples.push(Sample::new(label));
                self.samples.len() - 1
            }
        };
        &mut self.samples[idx]
    }

    /// Align a loaded dataset onto the canonical sequence and store it under
    /// `label`. A dataset of a kind the sample already holds replaces it.
    /// Contact files follow the configured `contact_numbering`.
    pub fn add(&mut self, label: &str, data: LoadedData) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        let length = registry.sequence().len();
        match data {
            LoadedData::Sequence(seq) => {
                let positions: Vec<Position> = seq.positions().collect();
                let alignment = registry.align(seq.name(), &positions, seq.as_str())?;
                self.sample_mut(label)
                    .set_alignment(NumberingSource::Sequence, alignment, &registry);
            }
            LoadedData::Profile(profile) => {
                let alignment = registry.align(&profile.sample, &profile.positions(), &profile.fragment())?;
                let projected = registry.project_profile(&profile, &alignment);
                let sample = self.sample_mut(label);
                sample.profile = Some(Arc::new(projected));
                sample.set_alignment(NumberingSource::Profile, alignment, &registry);
            }
            LoadedData::Structure { sequence, pairs } => {
                let positions: Vec<Position> = sequence.positions().collect();
                let alignment = registry.align(sequence.name(), &positions, sequence.as_str())?;
                let projected = registry.project_pairs(sequence.name(), &pairs, &alignment);
                let model = StructureModel::new(length, projected)?;
                let sample = self.sample_mut(label);
                sample.structure = Some(Arc::new(model));
                sample.set_alignment(NumberingSource::Structure, alignment, &registry);
            }
            LoadedData::Coordinates(coords) => {
                let alignment = registry.align(label, &coords.positions(), &coords.fragment())?;
                let projected = registry.project_coordinates(label, &coords, &alignment);
                self.sample_mut(label).coordinates = Some(Arc::new(projected));
            }
            LoadedData::Spatial(model) => {
                let alignment = registry.align(label, &model.positions(), &model.fragment())?;
                let projected = registry.project_spatial(label, &model, &alignment);
                self.sample_mut(label).spatial = Some(Arc::new(projected));
            }
            LoadedData::Contacts(set) => {
                let source = self.settings.contact_numbering;
                self.add_contacts(label, set, source);
            }
        }
        Ok(())
    }

    /// Store a contact set numbered like the sample's `source` dataset. The
    /// result does not depend on whether that dataset is added before or
    /// after the contacts.
    pub fn add_contacts(&mut self, label: &str, set: ContactSet, source: NumberingSource) {
        let registry = Arc::clone(&self.registry);
        let sample = self.sample_mut(label);
        sample.raw_contacts = Some((set, source));
        sample.project_contacts(&registry);
    }

    // -- pipeline helpers --

    fn structure_or_empty(&self, sample: &Sample) -> Result<Arc<StructureModel>> {
        match &sample.structure {
            Some(model) => Ok(Arc::clone(model)),
            None => Ok(Arc::new(StructureModel::new(self.length(), Vec::new())?)),
        }
    }

    /// Contacts of `sample` passing the configured filters, or none when the
    /// sample has no contact file.
    pub fn filtered_contacts(&self, sample: &Sample) -> Result<Vec<Contact>> {
        let Some(set) = &sample.contacts else {
            return Ok(Vec::new());
        };
        let structure = self.structure_or_empty(sample)?;
        classify(
            &set.contacts,
            &structure,
            sample.spatial.as_deref(),
            &self.settings.classify,
        )
    }

    fn colored<'a>(&self, contacts: &'a [Contact]) -> Vec<Colored<'a>> {
        let by = self.settings.layout.contact_coloring;
        contacts.iter().map(|contact| Colored { contact, by }).collect()
    }

    // -----------------------------------------------------------------------
    // Figure builders
    // -----------------------------------------------------------------------

    /// Reactivity step plots of every sample with a profile.
    pub fn skyline(&self) -> Result<Built<SkylineFigure>> {
        let mut series = Vec::new();
        for sample in &self.samples {
            let Some(profile) = &sample.profile else {
                continue;
            };
            series.push(SkylineSeries {
                label: sample.label.clone(),
                runs: skyline_series(profile, self.length(), &self.settings.layout)?,
            });
        }
        if series.is_empty() {
            return Err(RnavError::MissingData("profile".to_string()));
        }
        Ok(Built::clean(SkylineFigure {
            sequence: Arc::clone(self.sequence()),
            series,
        }))
    }

    /// Structure pairs above the axis, filtered contacts below it.
    pub fn arcs(&self, label: &str) -> Result<Built<ArcFigure>> {
        let sample = self.sample(label)?;
        let layout = &self.settings.layout;
        let pairs = match &sample.structure {
            Some(model) => arc_layout(model.pairs(), self.length(), layout)?
                .into_iter()
                .map(|arc| (arc, None))
                .collect(),
            None => Vec::new(),
        };
        let contacts = self.filtered_contacts(sample)?;
        let score = sample
            .structure
            .as_ref()
            .filter(|_| sample.contacts.is_some())
            .map(|model| score(&contacts, model, self.settings.score_slack));
        if pairs.is_empty() && sample.contacts.is_none() {
            return Err(RnavError::MissingData(format!("structure or contacts for {label}")));
        }
        Ok(Built::clean(ArcFigure {
            sequence: Arc::clone(self.sequence()),
            pairs,
            contacts: arc_layout(&self.colored(&contacts), self.length(), layout)?,
            coloring: layout.contact_coloring,
            score,
        }))
    }

    /// Pairs of two samples' structures, labelled shared or unique.
    pub fn comparison(&self, label: &str, other: &str) -> Result<Built<ArcFigure>> {
        let structure = |name: &str| -> Result<Arc<StructureModel>> {
            self.sample(name)?
                .structure
                .clone()
                .ok_or_else(|| RnavError::MissingData(format!("structure for {name}")))
        };
        let (this, that) = (structure(label)?, structure(other)?);
        let labelled = this.compare(&that);
        let pairs: Vec<_> = labelled.iter().map(|(pair, _)| *pair).collect();
        let arcs = arc_layout(&pairs, self.length(), &self.settings.layout)?;
        Ok(Built::clean(ArcFigure {
            sequence: Arc::clone(self.sequence()),
            pairs: arcs
                .into_iter()
                .map(|arc| {
                    let origin = labelled
                        .iter()
                        .find(|(p, _)| p.key() == (arc.i, arc.j))
                        .map(|(_, origin)| *origin);
                    (arc, origin)
                })
                .collect(),
            contacts: Vec::new(),
            coloring: self.settings.layout.contact_coloring,
            score: Some(score(this.pairs(), &that, self.settings.score_slack)),
        }))
    }

    /// Pairs and filtered contacts drawn over the sample's diagram coordinates.
    pub fn secondary_structure(&self, label: &str) -> Result<Built<OverlayFigure>> {
        let sample = self.sample(label)?;
        let coords = sample
            .coordinates
            .as_ref()
            .ok_or_else(|| RnavError::MissingData(format!("diagram coordinates for {label}")))?;
        self.overlay(sample, coords)
    }

    /// The same overlay on a circle layout, which needs no coordinate file.
    pub fn circle(&self, label: &str) -> Result<Built<OverlayFigure>> {
        let sample = self.sample(label)?;
        let coords = circle_coordinates(self.sequence(), self.settings.layout.circle_gap_degrees);
        self.overlay(sample, &coords)
    }

    fn overlay(&self, sample: &Sample, coords: &StructureCoordinateSet) -> Result<Built<OverlayFigure>> {
        let length = self.length();
        let pairs = match &sample.structure {
            Some(model) => structure_overlay(coords, model.pairs(), length)?,
            None => Built::clean(Vec::new()),
        };
        let filtered = self.filtered_contacts(sample)?;
        let contacts = structure_overlay(coords, &self.colored(&filtered), length)?;

        let reactivity = |position: Position| {
            sample
                .profile
                .as_ref()
                .and_then(|p| p.row(position))
                .and_then(|row| row.reactivity)
        };
        let nucleotides = coords
            .coordinates
            .iter()
            .map(|(&position, &xy)| NucleotideMark {
                position,
                xy,
                nucleotide: self.sequence().nucleotide(position).unwrap_or('N'),
                reactivity: reactivity(position),
            })
            .collect();

        let mut warnings = pairs.warnings;
        warnings.extend(contacts.warnings);
        warnings.sort();
        warnings.dedup();
        Ok(Built {
            value: OverlayFigure {
                backbone: backbone_path(coords),
                nucleotides,
                pairs: pairs.value,
                contacts: contacts.value,
                coloring: self.settings.layout.contact_coloring,
            },
            warnings,
        })
    }

    /// Contact statistics on an (i, j) grid, outlined where the structure pairs.
    pub fn heatmap(&self, label: &str) -> Result<Built<HeatmapFigure>> {
        let sample = self.sample(label)?;
        if sample.contacts.is_none() {
            return Err(RnavError::MissingData(format!("contacts for {label}")));
        }
        let grid = StatisticGrid::from_contacts(self.length(), &self.filtered_contacts(sample)?)?;
        let contours = match &sample.structure {
            Some(model) => heatmap_contour(model, &grid)?.collect(),
            None => Vec::new(),
        };
        Ok(Built::clean(HeatmapFigure { grid, contours }))
    }

    /// 3-D distances of the filtered contacts next to those of every residue
    /// pair the model places. Contacts the model does not place are left out.
    pub fn disthist(&self, label: &str) -> Result<Built<DistanceFigure>> {
        let sample = self.sample(label)?;
        let model = sample
            .spatial
            .as_ref()
            .ok_or_else(|| RnavError::MissingData(format!("3-D model for {label}")))?;
        if sample.contacts.is_none() {
            return Err(RnavError::MissingData(format!("contacts for {label}")));
        }
        let mode = self.settings.classify.distance_mode;
        let contact_distances: Vec<f64> = self
            .filtered_contacts(sample)?
            .iter()
            .filter_map(|c| c.distance)
            .collect();
        let positions = model.positions();
        let background_distances: Vec<f64> = positions
            .iter()
            .enumerate()
            .flat_map(|(k, &i)| positions[k + 1..].iter().map(move |&j| (i, j)))
            .filter_map(|(i, j)| model.distance(i, j, mode))
            .collect();

        let mut bin_width = self.settings.layout.histogram_bin_width;
        if bin_width.is_nan() || bin_width <= 0.0 {
            log::warn!("histogram bin width {bin_width} is not positive, using 5 Å");
            bin_width = 5.0;
        }
        let max = contact_distances
            .iter()
            .chain(&background_distances)
            .copied()
            .fold(0.0, f64::max);
        let bins = bins_for(max, bin_width);
        log::debug!(
            "{label}: {} contact distances against {} background pairs",
            contact_distances.len(),
            background_distances.len()
        );
        Ok(Built::clean(DistanceFigure {
            contacts: distance_histogram(contact_distances, bin_width, bins),
            background: distance_histogram(background_distances, bin_width, bins),
        }))
    }

    /// Read depths and mutation rates along the sequence.
    pub fn qc(&self, label: &str) -> Result<Built<QcFigure>> {
        let sample = self.sample(label)?;
        let profile = sample
            .profile
            .as_ref()
            .ok_or_else(|| RnavError::MissingData(format!("profile for {label}")))?;
        let series = |value: &dyn Fn(&ProfileRow) -> Option<f64>| -> Vec<[f64; 2]> {
            profile
                .rows
                .iter()
                .filter_map(|row| Some([row.position as f64, value(row)?]))
                .collect()
        };
        Ok(Built::clean(QcFigure {
            read_depth: series(&|r| r.read_depth.map(|d| d as f64)),
            effective_depth: series(&|r| r.effective_depth.map(|d| d as f64)),
            modified_rate: series(&|r| r.modified_rate),
            background_rate: series(&|r| r.background_rate),
        }))
    }

    /// Sensitivity and PPV of the sample's filtered contacts against its structure.
    pub fn score(&self, label: &str) -> Result<Score> {
        let sample = self.sample(label)?;
        let reference = sample
            .structure
            .as_ref()
            .ok_or_else(|| RnavError::MissingData(format!("structure for {label}")))?;
        Ok(score(&self.filtered_contacts(sample)?, reference, self.settings.score_slack))
    }
}

// ---------------------------------------------------------------------------
// Figure geometry handed to the plot adapter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SkylineSeries {
    pub label: String,
    pub runs: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkylineFigure {
    pub sequence: Arc<Sequence>,
    pub series: Vec<SkylineSeries>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcFigure {
    pub sequence: Arc<Sequence>,
    /// Pair arcs, with their origin when two structures are compared.
    pub pairs: Vec<(ArcDescriptor, Option<PairOrigin>)>,
    pub contacts: Vec<ArcDescriptor>,
    /// What the contact weights encode.
    pub coloring: ContactColoring,
    pub score: Option<Score>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NucleotideMark {
    pub position: Position,
    pub xy: [f64; 2],
    pub nucleotide: char,
    pub reactivity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFigure {
    pub backbone: Vec<Vec<[f64; 2]>>,
    pub nucleotides: Vec<NucleotideMark>,
    pub pairs: Vec<Segment>,
    pub contacts: Vec<Segment>,
    pub coloring: ContactColoring,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapFigure {
    pub grid: StatisticGrid,
    pub contours: Vec<ContourPath>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceFigure {
    pub contacts: DistanceHistogram,
    /// Every residue pair of the 3-D model.
    pub background: DistanceHistogram,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QcFigure {
    pub read_depth: Vec<[f64; 2]>,
    pub effective_depth: Vec<[f64; 2]>,
    pub modified_rate: Vec<[f64; 2]>,
    pub background_rate: Vec<[f64; 2]>,
}
