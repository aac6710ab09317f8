use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::model::{
    normalize_nucleotides, Contact, Pair, Position, Profile, Sequence, SpatialModel,
    StructureCoordinateSet,
};
use crate::error::{Result, RnavError};

// ---------------------------------------------------------------------------
// Alignment options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignOptions {
    /// Mismatches tolerated over the overlapping region.
    pub max_mismatches: usize,
    /// Minimum number of overlapping nucleotides. `None` requires the whole
    /// fragment (or the whole sequence, if the fragment is longer).
    pub min_overlap: Option<usize>,
}

/// Dataset whose numbering a contact file follows. Contact files carry no
/// nucleotides, so they borrow the alignment of a sibling dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingSource {
    /// The reactivity profile the correlations were computed from.
    #[default]
    Profile,
    Structure,
    Sequence,
    /// File positions are already global.
    Identity,
}

impl NumberingSource {
    pub const ALL: [NumberingSource; 4] = [
        NumberingSource::Profile,
        NumberingSource::Structure,
        NumberingSource::Sequence,
        NumberingSource::Identity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NumberingSource::Profile => "profile",
            NumberingSource::Structure => "structure",
            NumberingSource::Sequence => "sequence",
            NumberingSource::Identity => "as in file",
        }
    }
}

// ---------------------------------------------------------------------------
// Alignment – the only way to move from local to global numbering
// ---------------------------------------------------------------------------

/// Offset from a dataset's numbering to the canonical one:
/// `global = local + offset`. Only the registry creates these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    offset: i64,
    length: usize,
    pub overlap: usize,
    pub mismatches: usize,
}

impl Alignment {
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Global position for `local`, or `None` when it falls outside the sequence.
    pub fn to_global(&self, local: Position) -> Option<Position> {
        let global = local as i64 + self.offset;
        if global >= 1 && global <= self.length as i64 {
            Some(global as Position)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// SequenceRegistry
// ---------------------------------------------------------------------------

/// Owns the canonical sequence and maps every dataset onto it.
#[derive(Debug, Clone)]
pub struct SequenceRegistry {
    sequence: Arc<Sequence>,
    options: AlignOptions,
}

struct Candidate {
    offset: i64,
    overlap: usize,
    mismatches: usize,
}

impl SequenceRegistry {
    pub fn new(sequence: Arc<Sequence>) -> Self {
        Self::with_options(sequence, AlignOptions::default())
    }

    pub fn with_options(sequence: Arc<Sequence>, options: AlignOptions) -> Self {
        SequenceRegistry { sequence, options }
    }

    pub fn sequence(&self) -> &Arc<Sequence> {
        &self.sequence
    }

    pub fn options(&self) -> AlignOptions {
        self.options
    }

    /// Alignment for data already numbered like the canonical sequence.
    pub fn identity(&self) -> Alignment {
        Alignment {
            offset: 0,
            length: self.sequence.len(),
            overlap: self.sequence.len(),
            mismatches: 0,
        }
    }

    /// Find the offset placing `fragment` (numbered by `local_positions`) on
    /// the canonical sequence.
    ///
    /// Candidates need at least the configured overlap and at most
    /// `max_mismatches` mismatches. Among those the fewest mismatches win, then
    /// the largest overlap, then the smallest |offset|, then the smallest offset.
    pub fn align(
        &self,
        dataset: &str,
        local_positions: &[Position],
        fragment: &str,
    ) -> Result<Alignment> {
        let fragment = normalize_nucleotides(fragment);
        if fragment.len() != local_positions.len() {
            log::warn!(
                "{dataset}: {} numbered positions but {} nucleotides, aligning the common prefix",
                local_positions.len(),
                fragment.len()
            );
        }
        let residues: Vec<(Position, u8)> = local_positions
            .iter()
            .copied()
            .zip(fragment.bytes())
            .collect();
        let canonical = self.sequence.as_str().as_bytes();
        let length = canonical.len();

        let failure = |best: Option<&Candidate>| RnavError::Alignment {
            dataset: dataset.to_string(),
            best_mismatches: best.map_or(0, |c| c.mismatches),
            best_overlap: best.map_or(0, |c| c.overlap),
            max_mismatches: self.options.max_mismatches,
        };

        let (Some(min_local), Some(max_local)) = (
            residues.iter().map(|r| r.0).min(),
            residues.iter().map(|r| r.0).max(),
        ) else {
            return Err(failure(None));
        };
        if length == 0 {
            return Err(failure(None));
        }

        let required = self
            .options
            .min_overlap
            .unwrap_or_else(|| residues.len().min(length))
            .max(1);

        let mut best: Option<Candidate> = None;
        for offset in (1 - max_local as i64)..=(length as i64 - min_local as i64) {
            let mut overlap = 0;
            let mut mismatches = 0;
            for &(local, nt) in &residues {
                let global = local as i64 + offset;
                if global < 1 || global > length as i64 {
                    continue;
                }
                overlap += 1;
                if canonical[(global - 1) as usize] != nt {
                    mismatches += 1;
                }
            }
            if overlap < required {
                continue;
            }
            let candidate = Candidate {
                offset,
                overlap,
                mismatches,
            };
            let rank = |c: &Candidate| (c.mismatches, Reverse(c.overlap), c.offset.abs(), c.offset);
            if best.as_ref().map_or(true, |b| rank(&candidate) < rank(b)) {
                best = Some(candidate);
            }
        }

        match best {
            Some(c) if c.mismatches <= self.options.max_mismatches => {
                log::debug!(
                    "{dataset}: offset {} ({} mismatches over {} nt)",
                    c.offset,
                    c.mismatches,
                    c.overlap
                );
                Ok(Alignment {
                    offset: c.offset,
                    length,
                    overlap: c.overlap,
                    mismatches: c.mismatches,
                })
            }
            other => Err(failure(other.as_ref())),
        }
    }

    // -- projections: derive new entities in global numbering --

    pub fn project_profile(&self, profile: &Profile, alignment: &Alignment) -> Profile {
        let rows: Vec<_> = profile
            .rows
            .iter()
            .filter_map(|row| {
                let position = alignment.to_global(row.position)?;
                let mut row = row.clone();
                row.position = position;
                Some(row)
            })
            .collect();
        log_dropped(&profile.sample, profile.rows.len(), rows.len());
        Profile::new(profile.sample.clone(), rows)
    }

    pub fn project_contacts(&self, name: &str, contacts: &[Contact], alignment: &Alignment) -> Vec<Contact> {
        let projected: Vec<_> = contacts
            .iter()
            .filter_map(|c| {
                let mut c = c.clone();
                c.i = alignment.to_global(c.i)?;
                c.j = alignment.to_global(c.j)?;
                Some(c)
            })
            .collect();
        log_dropped(name, contacts.len(), projected.len());
        projected
    }

    pub fn project_pairs(&self, name: &str, pairs: &[Pair], alignment: &Alignment) -> Vec<Pair> {
        let projected: Vec<_> = pairs
            .iter()
            .filter_map(|p| {
                Some(Pair {
                    i: alignment.to_global(p.i)?,
                    j: alignment.to_global(p.j)?,
                    ..*p
                })
            })
            .collect();
        log_dropped(name, pairs.len(), projected.len());
        projected
    }

    pub fn project_coordinates(
        &self,
        name: &str,
        coords: &StructureCoordinateSet,
        alignment: &Alignment,
    ) -> StructureCoordinateSet {
        let mut projected = StructureCoordinateSet::default();
        for (&local, &xy) in &coords.coordinates {
            let Some(global) = alignment.to_global(local) else {
                continue;
            };
            let nt = coords.nucleotides.get(&local).copied().unwrap_or('N');
            projected.insert(global, nt, xy);
        }
        log_dropped(name, coords.len(), projected.len());
        projected
    }

    pub fn project_spatial(&self, name: &str, model: &SpatialModel, alignment: &Alignment) -> SpatialModel {
        let remap = |map: &BTreeMap<Position, [f64; 3]>| -> BTreeMap<Position, [f64; 3]> {
            map.iter()
                .filter_map(|(&local, &xyz)| Some((alignment.to_global(local)?, xyz)))
                .collect()
        };
        let nucleotides: BTreeMap<_, _> = model
            .nucleotides
            .iter()
            .filter_map(|(&local, &nt)| Some((alignment.to_global(local)?, nt)))
            .collect();
        log_dropped(name, model.nucleotides.len(), nucleotides.len());
        SpatialModel {
            atom: model.atom.clone(),
            nucleotides,
            conformers: model.conformers.iter().map(remap).collect(),
        }
    }
}

fn log_dropped(name: &str, before: usize, after: usize) {
    if after < before {
        log::info!("{name}: {} records fall outside the sequence and were dropped", before - after);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ProfileRow;

    const CANONICAL: &str = "GGACUUCGGUCCAAGCUAGCAUGC";

    fn registry() -> SequenceRegistry {
        SequenceRegistry::new(Arc::new(Sequence::new("canon", CANONICAL)))
    }

    fn numbered(start: Position, fragment: &str) -> Vec<Position> {
        (start..start + fragment.len()).collect()
    }

    #[test]
    fn test_align_finds_true_offset() {
        let reg = registry();
        // fragment is canonical 11..=18, numbered from 1
        let fragment = &CANONICAL[10..18];
        let aln = reg.align("frag", &numbered(1, fragment), fragment).unwrap();
        assert_eq!(aln.offset(), 10);
        assert_eq!(aln.to_global(1), Some(11));

        // same fragment numbered from 101
        let aln = reg.align("frag", &numbered(101, fragment), fragment).unwrap();
        assert_eq!(aln.offset(), -90);
    }

    #[test]
    fn test_align_identity_prefers_zero_offset() {
        let reg = registry();
        let aln = reg.align("full", &numbered(1, CANONICAL), CANONICAL).unwrap();
        assert_eq!(aln.offset(), 0);
        assert_eq!(aln.mismatches, 0);
    }

    #[test]
    fn test_align_accepts_dna_and_lowercase() {
        let reg = registry();
        let aln = reg.align("dna", &numbered(5, "ttcggt"), "ttcggt").unwrap();
        assert_eq!(aln.offset(), 0);
    }

    #[test]
    fn test_align_longer_fragment_covers_sequence() {
        let reg = registry();
        let fragment = format!("AAAA{CANONICAL}CCC");
        let aln = reg.align("flanked", &numbered(1, &fragment), &fragment).unwrap();
        assert_eq!(aln.offset(), -4);
        assert_eq!(aln.to_global(1), None);
        assert_eq!(aln.to_global(5), Some(1));
    }

    #[test]
    fn test_align_fails_without_match() {
        let reg = registry();
        let err = reg.align("bad", &numbered(1, "AAAAAAA"), "AAAAAAA").unwrap_err();
        assert!(matches!(err, RnavError::Alignment { .. }));
    }

    #[test]
    fn test_align_mismatch_tolerance() {
        let seq = Arc::new(Sequence::new("canon", CANONICAL));
        let mutated = "GGACUACGGUCC";
        let strict = SequenceRegistry::new(seq.clone());
        assert!(strict.align("mut", &numbered(1, mutated), mutated).is_err());

        let lenient = SequenceRegistry::with_options(
            seq,
            AlignOptions {
                max_mismatches: 1,
                min_overlap: None,
            },
        );
        let aln = lenient.align("mut", &numbered(1, mutated), mutated).unwrap();
        assert_eq!(aln.offset(), 0);
        assert_eq!(aln.mismatches, 1);
    }

    #[test]
    fn test_project_profile_drops_out_of_range_rows() {
        let reg = registry();
        let rows = (1..=4)
            .map(|p| {
                let mut r = ProfileRow::new(p, 'N');
                r.reactivity = Some(p as f64);
                r
            })
            .collect();
        let profile = Profile::new("s1", rows);
        let aln = reg
            .align("s1", &[1, 2, 3], &CANONICAL[21..24])
            .unwrap();
        assert_eq!(aln.offset(), 21);
        let projected = reg.project_profile(&profile, &aln);
        assert_eq!(projected.positions(), vec![22, 23, 24]);
        // source untouched
        assert_eq!(profile.positions(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_project_contacts_requires_both_legs() {
        let reg = registry();
        let aln = reg.align("ctx", &numbered(1, &CANONICAL[2..12]), &CANONICAL[2..12]).unwrap();
        let contacts = vec![Contact::new(1, 5, 30.0), Contact::new(1, 30, 40.0)];
        let projected = reg.project_contacts("ctx", &contacts, &aln);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].key(), (3, 7));
    }
}
