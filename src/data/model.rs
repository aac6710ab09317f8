use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RnavError};

/// 1-based nucleotide position.
pub type Position = usize;

/// Upper-case a nucleotide string, map DNA `T` to `U` and drop whitespace.
pub fn normalize_nucleotides(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c.to_ascii_uppercase() {
            'T' => 'U',
            other => other,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sequence – the canonical coordinate space
// ---------------------------------------------------------------------------

/// The canonical nucleotide sequence every other dataset is aligned onto.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    name: String,
    residues: String,
}

impl Sequence {
    pub fn new(name: impl Into<String>, residues: &str) -> Self {
        Sequence {
            name: name.into(),
            residues: normalize_nucleotides(residues),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_str(&self) -> &str {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Nucleotide at a 1-based position.
    pub fn nucleotide(&self, position: Position) -> Option<char> {
        if position == 0 {
            return None;
        }
        self.residues.as_bytes().get(position - 1).map(|&b| b as char)
    }

    pub fn contains(&self, position: Position) -> bool {
        (1..=self.len()).contains(&position)
    }

    /// Fail with [`RnavError::OutOfRange`] unless `position` is in 1..=len.
    pub fn check(&self, position: Position) -> Result<()> {
        check_position(position, self.len())
    }

    pub fn positions(&self) -> RangeInclusive<Position> {
        1..=self.len()
    }
}

pub(crate) fn check_position(position: Position, length: usize) -> Result<()> {
    if position == 0 || position > length {
        return Err(RnavError::OutOfRange { position, length });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Profile – per-nucleotide reactivities of one sample
// ---------------------------------------------------------------------------

/// One row of a reactivity profile. Missing values are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRow {
    pub position: Position,
    pub nucleotide: char,
    /// Normalized reactivity.
    pub reactivity: Option<f64>,
    /// Standard error of `reactivity`.
    pub stderr: Option<f64>,
    pub modified_rate: Option<f64>,
    /// Untreated (background) mutation rate.
    pub background_rate: Option<f64>,
    pub read_depth: Option<u64>,
    pub effective_depth: Option<u64>,
}

impl ProfileRow {
    pub fn new(position: Position, nucleotide: char) -> Self {
        ProfileRow {
            position,
            nucleotide,
            reactivity: None,
            stderr: None,
            modified_rate: None,
            background_rate: None,
            read_depth: None,
            effective_depth: None,
        }
    }
}

/// Reactivity profile of a single sample, in the numbering of its source file
/// until projected by the sequence registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub sample: String,
    pub rows: Vec<ProfileRow>,
}

impl Profile {
    pub fn new(sample: impl Into<String>, rows: Vec<ProfileRow>) -> Self {
        Profile {
            sample: sample.into(),
            rows,
        }
    }

    /// The sequence fragment spelled out by the rows.
    pub fn fragment(&self) -> String {
        normalize_nucleotides(&self.rows.iter().map(|r| r.nucleotide).collect::<String>())
    }

    pub fn positions(&self) -> Vec<Position> {
        self.rows.iter().map(|r| r.position).collect()
    }

    pub fn row(&self, position: Position) -> Option<&ProfileRow> {
        self.rows.iter().find(|r| r.position == position)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Pair – a base pair
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PairKind {
    /// Ordinary secondary-structure pair; each position takes part in at most one.
    Secondary,
    /// Tertiary or pseudoknot pair, exempt from the one-partner rule.
    Tertiary,
}

/// Topological relation between two base pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRelation {
    /// One pair encloses the other.
    Nested,
    /// The endpoints interleave (pseudoknot).
    Crossing,
    Independent,
}

/// An unordered base pair, stored with `i < j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    pub i: Position,
    pub j: Position,
    pub kind: PairKind,
    pub confidence: Option<f64>,
}

impl Pair {
    pub fn new(a: Position, b: Position) -> Self {
        Pair {
            i: a.min(b),
            j: a.max(b),
            kind: PairKind::Secondary,
            confidence: None,
        }
    }

    pub fn tertiary(a: Position, b: Position) -> Self {
        Pair {
            kind: PairKind::Tertiary,
            ..Pair::new(a, b)
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn key(&self) -> (Position, Position) {
        (self.i, self.j)
    }

    pub fn span(&self) -> usize {
        self.j - self.i
    }

    /// Classify `self` against `other` from their endpoints alone.
    pub fn relation(&self, other: &Pair) -> PairRelation {
        let (outer, inner) = if self.i <= other.i {
            (self, other)
        } else {
            (other, self)
        };
        if outer.i < inner.i && inner.j < outer.j {
            PairRelation::Nested
        } else if outer.i < inner.i && inner.i < outer.j && outer.j < inner.j {
            PairRelation::Crossing
        } else {
            PairRelation::Independent
        }
    }

    pub fn is_nested(&self, other: &Pair) -> bool {
        self.relation(other) == PairRelation::Nested
    }

    pub fn is_crossing(&self, other: &Pair) -> bool {
        self.relation(other) == PairRelation::Crossing
    }
}

// ---------------------------------------------------------------------------
// Contact – a statistically supported relationship
// ---------------------------------------------------------------------------

/// Assigned by the contact filter relative to a structure model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactClass {
    /// Both positions form a pair of the model.
    BasePair,
    /// Both legs are paired, but not with each other.
    Paired,
    /// Exactly one leg is paired.
    Mixed,
    Unpaired,
}

impl fmt::Display for ContactClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContactClass::BasePair => "base pair",
            ContactClass::Paired => "paired",
            ContactClass::Mixed => "mixed",
            ContactClass::Unpaired => "unpaired",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub i: Position,
    pub j: Position,
    pub statistic: f64,
    /// +1 for positive correlations, -1 for negative ones.
    pub sign: i8,
    /// 3-D distance, filled in by the contact filter when a model is available.
    pub distance: Option<f64>,
    /// Class column of pair-correlation files (e.g. PairMapper 1 = principal).
    pub tag: Option<i32>,
    pub class: Option<ContactClass>,
}

impl Contact {
    pub fn new(i: Position, j: Position, statistic: f64) -> Self {
        Contact {
            i,
            j,
            statistic,
            sign: 1,
            distance: None,
            tag: None,
            class: None,
        }
    }

    /// Endpoints ordered ascending.
    pub fn key(&self) -> (Position, Position) {
        (self.i.min(self.j), self.i.max(self.j))
    }
}

/// A named set of contacts from one correlation file.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactSet {
    pub name: String,
    pub contacts: Vec<Contact>,
}

/// Anything drawn as a link between two positions.
pub trait Linked {
    fn endpoints(&self) -> (Position, Position);

    /// Scalar used for colouring, if any.
    fn weight(&self) -> Option<f64> {
        None
    }

    /// Category used for colouring, if any.
    fn class(&self) -> Option<ContactClass> {
        None
    }
}

impl Linked for Pair {
    fn endpoints(&self) -> (Position, Position) {
        (self.i, self.j)
    }

    fn weight(&self) -> Option<f64> {
        self.confidence
    }
}

impl Linked for Contact {
    fn endpoints(&self) -> (Position, Position) {
        self.key()
    }

    fn weight(&self) -> Option<f64> {
        Some(self.statistic)
    }

    fn class(&self) -> Option<ContactClass> {
        self.class
    }
}

impl Linked for (Position, Position) {
    fn endpoints(&self) -> (Position, Position) {
        (self.0.min(self.1), self.0.max(self.1))
    }
}

// ---------------------------------------------------------------------------
// StructureCoordinateSet – planar diagram coordinates
// ---------------------------------------------------------------------------

/// Diagram coordinates keyed by position. Used for layout only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructureCoordinateSet {
    /// Nucleotide of each coordinate, for alignment.
    pub nucleotides: BTreeMap<Position, char>,
    pub coordinates: BTreeMap<Position, [f64; 2]>,
}

impl StructureCoordinateSet {
    pub fn insert(&mut self, position: Position, nucleotide: char, xy: [f64; 2]) {
        self.nucleotides.insert(position, nucleotide);
        self.coordinates.insert(position, xy);
    }

    pub fn get(&self, position: Position) -> Option<[f64; 2]> {
        self.coordinates.get(&position).copied()
    }

    pub fn fragment(&self) -> String {
        normalize_nucleotides(&self.nucleotides.values().collect::<String>())
    }

    pub fn positions(&self) -> Vec<Position> {
        self.nucleotides.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SpatialModel – 3-D coordinates, one map per conformer
// ---------------------------------------------------------------------------

/// How per-conformer distances are reduced to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMode {
    #[default]
    Min,
    Mean,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpatialModel {
    /// Atom used to represent each residue (e.g. `O2'`).
    pub atom: String,
    pub nucleotides: BTreeMap<Position, char>,
    pub conformers: Vec<BTreeMap<Position, [f64; 3]>>,
}

impl SpatialModel {
    pub fn fragment(&self) -> String {
        normalize_nucleotides(&self.nucleotides.values().collect::<String>())
    }

    pub fn positions(&self) -> Vec<Position> {
        self.nucleotides.keys().copied().collect()
    }

    /// Distance between two residues reduced over the conformers that place both.
    pub fn distance(&self, i: Position, j: Position, mode: DistanceMode) -> Option<f64> {
        let per_conformer: Vec<f64> = self
            .conformers
            .iter()
            .filter_map(|conf| {
                let a = conf.get(&i)?;
                let b = conf.get(&j)?;
                Some(euclidean(a, b))
            })
            .collect();
        if per_conformer.is_empty() {
            return None;
        }
        Some(match mode {
            DistanceMode::Min => per_conformer.iter().copied().fold(f64::INFINITY, f64::min),
            DistanceMode::Mean => per_conformer.iter().sum::<f64>() / per_conformer.len() as f64,
        })
    }
}

fn euclidean(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_normalizes_dna() {
        let seq = Sequence::new("test", "acgt\nACGT");
        assert_eq!(seq.as_str(), "ACGUACGU");
        assert_eq!(seq.len(), 8);
        assert_eq!(seq.nucleotide(4), Some('U'));
        assert_eq!(seq.nucleotide(0), None);
        assert_eq!(seq.nucleotide(9), None);
    }

    #[test]
    fn test_sequence_check_reports_out_of_range() {
        let seq = Sequence::new("test", "GGGAAACCC");
        assert!(seq.check(1).is_ok());
        assert!(seq.check(9).is_ok());
        assert_eq!(
            seq.check(10),
            Err(RnavError::OutOfRange {
                position: 10,
                length: 9
            })
        );
        assert!(seq.check(0).is_err());
    }

    #[test]
    fn test_pair_relations() {
        let outer = Pair::new(2, 10);
        assert_eq!(outer.relation(&Pair::new(4, 8)), PairRelation::Nested);
        assert_eq!(outer.relation(&Pair::new(5, 15)), PairRelation::Crossing);
        assert_eq!(
            Pair::new(2, 5).relation(&Pair::new(10, 15)),
            PairRelation::Independent
        );
    }

    #[test]
    fn test_pair_relations_are_symmetric_and_exclusive() {
        let pairs = [
            Pair::new(2, 10),
            Pair::new(4, 8),
            Pair::new(5, 15),
            Pair::new(10, 15),
            Pair::new(1, 20),
            Pair::new(11, 12),
        ];
        for a in &pairs {
            for b in &pairs {
                if a == b {
                    continue;
                }
                assert_eq!(a.relation(b), b.relation(a));
                assert!(!(a.is_nested(b) && a.is_crossing(b)));
            }
        }
    }

    #[test]
    fn test_pair_is_ordered() {
        let p = Pair::new(17, 3);
        assert_eq!(p.key(), (3, 17));
        assert_eq!(p.span(), 14);
    }

    #[test]
    fn test_spatial_distance_modes() {
        let mut a = BTreeMap::new();
        a.insert(1, [0.0, 0.0, 0.0]);
        a.insert(2, [3.0, 4.0, 0.0]);
        let mut b = BTreeMap::new();
        b.insert(1, [0.0, 0.0, 0.0]);
        b.insert(2, [0.0, 0.0, 15.0]);
        let model = SpatialModel {
            atom: "O2'".to_string(),
            nucleotides: BTreeMap::new(),
            conformers: vec![a, b],
        };
        assert_eq!(model.distance(1, 2, DistanceMode::Min), Some(5.0));
        assert_eq!(model.distance(1, 2, DistanceMode::Mean), Some(10.0));
        assert_eq!(model.distance(1, 3, DistanceMode::Min), None);
    }
}
