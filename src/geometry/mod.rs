//! Layout layer: aligned structure, contact and profile data → plain geometry.
//!
//! ```text
//!   StructureModel / Contacts / StructureCoordinateSet / Profile
//!        │
//!        ▼
//!   ┌──────────┐   arcs, overlay segments, contour paths, skyline steps
//!   │ geometry  │
//!   └──────────┘
//!        │
//!        ▼
//!   ui::plot (egui_plot primitives)
//! ```
//!
//! Every function here is pure: inputs are borrowed immutably and a position
//! outside the sequence fails with `OutOfRange` rather than being clamped.

pub mod arc;
pub mod contour;
pub mod histogram;
pub mod overlay;

use serde::{Deserialize, Serialize};

use crate::data::model::{check_position, Contact, Position, Profile};
use crate::error::Result;

pub use arc::{arc_layout, ArcDescriptor};
pub use contour::{heatmap_contour, ContourPath, ContourTracer, StatisticGrid};
pub use histogram::{bins_for, distance_histogram, DistanceHistogram};
pub use overlay::{backbone_path, circle_coordinates, structure_overlay, Segment};

/// What a contact's colour encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactColoring {
    #[default]
    Statistic,
    /// 3-D distance; contacts without one are drawn grey.
    Distance,
    /// Class assigned against the structure.
    Class,
    /// Class column of the contact file.
    Tag,
}

impl ContactColoring {
    pub const ALL: [ContactColoring; 4] = [
        ContactColoring::Statistic,
        ContactColoring::Distance,
        ContactColoring::Class,
        ContactColoring::Tag,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ContactColoring::Statistic => "statistic",
            ContactColoring::Distance => "3-D distance",
            ContactColoring::Class => "structure class",
            ContactColoring::Tag => "file class",
        }
    }

    /// Scalar carried as the link weight. Class colouring is categorical and
    /// has none.
    pub fn value(self, contact: &Contact) -> Option<f64> {
        match self {
            ContactColoring::Statistic => Some(contact.statistic),
            ContactColoring::Distance => contact.distance,
            ContactColoring::Class => None,
            ContactColoring::Tag => contact.tag.map(f64::from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Restrict arc and skyline figures to `start..=end`.
    pub region: Option<(Position, Position)>,
    /// Opening left at the top of circle diagrams, in degrees.
    pub circle_gap_degrees: f64,
    pub contact_coloring: ContactColoring,
    /// Bin width of distance histograms, in Å.
    pub histogram_bin_width: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            region: None,
            circle_gap_degrees: 10.0,
            contact_coloring: ContactColoring::Statistic,
            histogram_bin_width: 5.0,
        }
    }
}

/// Step-plot runs for a profile: each run rises from the baseline, follows one
/// flat step per nucleotide and returns to the baseline. Missing reactivities
/// split the runs.
pub fn skyline_series(
    profile: &Profile,
    length: usize,
    options: &LayoutOptions,
) -> Result<Vec<Vec<[f64; 2]>>> {
    for row in &profile.rows {
        check_position(row.position, length)?;
    }
    let (start, end) = options.region.unwrap_or((1, length));

    let mut runs = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    let mut last_position: Option<Position> = None;
    let close = |run: &mut Vec<[f64; 2]>, runs: &mut Vec<Vec<[f64; 2]>>| {
        if let Some(&[x, _]) = run.last() {
            run.push([x, 0.0]);
            runs.push(std::mem::take(run));
        }
    };

    let mut rows: Vec<_> = profile
        .rows
        .iter()
        .filter(|r| (start..=end).contains(&r.position))
        .collect();
    rows.sort_by_key(|r| r.position);

    for row in rows {
        let contiguous = last_position.is_some_and(|p| p + 1 == row.position);
        match row.reactivity {
            Some(value) if value.is_finite() => {
                if !contiguous {
                    close(&mut current, &mut runs);
                }
                let x = row.position as f64;
                if current.is_empty() {
                    current.push([x - 0.5, 0.0]);
                }
                current.push([x - 0.5, value]);
                current.push([x + 0.5, value]);
                last_position = Some(row.position);
            }
            _ => {
                close(&mut current, &mut runs);
                last_position = None;
            }
        }
    }
    close(&mut current, &mut runs);
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ProfileRow;

    fn profile(values: &[Option<f64>]) -> Profile {
        let rows = values
            .iter()
            .enumerate()
            .map(|(k, v)| {
                let mut row = ProfileRow::new(k + 1, 'A');
                row.reactivity = *v;
                row
            })
            .collect();
        Profile::new("s", rows)
    }

    #[test]
    fn test_skyline_steps() {
        let runs = skyline_series(&profile(&[Some(1.0), Some(2.0)]), 2, &LayoutOptions::default()).unwrap();
        assert_eq!(
            runs,
            vec![vec![
                [0.5, 0.0],
                [0.5, 1.0],
                [1.5, 1.0],
                [1.5, 2.0],
                [2.5, 2.0],
                [2.5, 0.0]
            ]]
        );
    }

    #[test]
    fn test_skyline_missing_values_split_runs() {
        let runs = skyline_series(
            &profile(&[Some(1.0), None, Some(f64::NAN), Some(0.5)]),
            4,
            &LayoutOptions::default(),
        )
        .unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1][0], [3.5, 0.0]);
    }

    #[test]
    fn test_skyline_region_and_range() {
        let options = LayoutOptions {
            region: Some((2, 3)),
            ..Default::default()
        };
        let runs = skyline_series(&profile(&[Some(1.0), Some(1.0), Some(1.0), Some(1.0)]), 4, &options).unwrap();
        assert_eq!(runs[0].first(), Some(&[1.5, 0.0]));
        assert_eq!(runs[0].last(), Some(&[3.5, 0.0]));

        assert!(skyline_series(&profile(&[Some(1.0), Some(1.0)]), 1, &LayoutOptions::default()).is_err());
    }

    #[test]
    fn test_contact_coloring_values() {
        let mut contact = Contact::new(2, 9, 30.0);
        contact.tag = Some(2);
        assert_eq!(ContactColoring::Statistic.value(&contact), Some(30.0));
        assert_eq!(ContactColoring::Distance.value(&contact), None);
        assert_eq!(ContactColoring::Tag.value(&contact), Some(2.0));
        assert_eq!(ContactColoring::Class.value(&contact), None);
        contact.distance = Some(12.5);
        assert_eq!(ContactColoring::Distance.value(&contact), Some(12.5));
    }
}
