use std::collections::BTreeSet;
use std::f64::consts::PI;

use crate::data::model::{check_position, ContactClass, Linked, Position, Sequence, StructureCoordinateSet};
use crate::error::{Built, Result, UnmappedPositionWarning};

/// A straight line between the diagram coordinates of two positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub i: Position,
    pub j: Position,
    pub from: [f64; 2],
    pub to: [f64; 2],
    pub weight: Option<f64>,
    pub class: Option<ContactClass>,
}

/// Segments between the coordinates of each linked pair of positions.
///
/// A link with an endpoint missing from `coords` is omitted and the missing
/// position is reported once in the warnings. Positions outside
/// `1..=length` abort with `OutOfRange`.
pub fn structure_overlay<L: Linked>(
    coords: &StructureCoordinateSet,
    links: &[L],
    length: usize,
) -> Result<Built<Vec<Segment>>> {
    let mut segments = Vec::with_capacity(links.len());
    let mut unmapped = BTreeSet::new();
    for link in links {
        let (i, j) = link.endpoints();
        check_position(i, length)?;
        check_position(j, length)?;
        match (coords.get(i), coords.get(j)) {
            (Some(from), Some(to)) => segments.push(Segment {
                i,
                j,
                from,
                to,
                weight: link.weight(),
                class: link.class(),
            }),
            (from, to) => {
                if from.is_none() {
                    unmapped.insert(i);
                }
                if to.is_none() {
                    unmapped.insert(j);
                }
            }
        }
    }
    if !unmapped.is_empty() {
        log::warn!("{} positions have no diagram coordinate", unmapped.len());
    }
    Ok(Built {
        value: segments,
        warnings: unmapped
            .into_iter()
            .map(|position| UnmappedPositionWarning { position })
            .collect(),
    })
}

/// Polylines through consecutive mapped positions; a gap in the coordinates
/// starts a new polyline.
pub fn backbone_path(coords: &StructureCoordinateSet) -> Vec<Vec<[f64; 2]>> {
    let mut paths: Vec<Vec<[f64; 2]>> = Vec::new();
    let mut previous: Option<Position> = None;
    for (&position, &xy) in &coords.coordinates {
        match (previous, paths.last_mut()) {
            (Some(p), Some(path)) if p + 1 == position => path.push(xy),
            _ => paths.push(vec![xy]),
        }
        previous = Some(position);
    }
    paths
}

/// Place every nucleotide on a circle, 5' end just right of the top and
/// running clockwise, leaving `gap_degrees` open at the top. Neighbouring
/// nucleotides sit roughly one unit apart.
pub fn circle_coordinates(sequence: &Sequence, gap_degrees: f64) -> StructureCoordinateSet {
    let n = sequence.len();
    let mut coords = StructureCoordinateSet::default();
    if n == 0 {
        return coords;
    }
    let sweep = (360.0 - gap_degrees.clamp(0.0, 359.0)).to_radians();
    let radius = n as f64 / sweep;
    let step = sweep / n as f64;
    let start = PI / 2.0 - (2.0 * PI - sweep) / 2.0 - step / 2.0;
    for (k, nt) in sequence.as_str().chars().enumerate() {
        let angle = start - step * k as f64;
        coords.insert(k + 1, nt, [radius * angle.cos(), radius * angle.sin()]);
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Pair;

    fn line_coords(length: usize, skip: &[Position]) -> StructureCoordinateSet {
        let mut coords = StructureCoordinateSet::default();
        for p in 1..=length {
            if !skip.contains(&p) {
                coords.insert(p, 'A', [p as f64, 0.0]);
            }
        }
        coords
    }

    #[test]
    fn test_unmapped_position_is_warned_and_omitted() {
        let coords = line_coords(50, &[12]);
        let built = structure_overlay(&coords, &[Pair::new(12, 40)], 50).unwrap();
        assert!(built.value.is_empty());
        assert_eq!(built.warnings, vec![UnmappedPositionWarning { position: 12 }]);
    }

    #[test]
    fn test_overlay_segments() {
        let coords = line_coords(20, &[]);
        let built = structure_overlay(&coords, &[Pair::new(3, 17), Pair::new(4, 16)], 20).unwrap();
        assert!(built.warnings.is_empty());
        assert_eq!(built.value.len(), 2);
        assert_eq!(built.value[0].from, [3.0, 0.0]);
        assert_eq!(built.value[0].to, [17.0, 0.0]);
    }

    #[test]
    fn test_overlay_warns_once_per_position() {
        let coords = line_coords(20, &[5]);
        let built = structure_overlay(&coords, &[(5, 10), (5, 15), (2, 8)], 20).unwrap();
        assert_eq!(built.value.len(), 1);
        assert_eq!(built.warnings.len(), 1);
    }

    #[test]
    fn test_overlay_out_of_range() {
        let coords = line_coords(20, &[]);
        assert!(structure_overlay(&coords, &[(5, 25)], 20).is_err());
    }

    #[test]
    fn test_backbone_breaks_at_gaps() {
        let paths = backbone_path(&line_coords(6, &[3]));
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].len(), 2);
        assert_eq!(paths[1].len(), 3);
    }

    #[test]
    fn test_circle_coordinates() {
        let seq = Sequence::new("s", "GGGAAACCC");
        let coords = circle_coordinates(&seq, 0.0);
        assert_eq!(coords.len(), 9);
        let radius = |p: Position| {
            let [x, y] = coords.get(p).unwrap();
            (x * x + y * y).sqrt()
        };
        assert!((radius(1) - radius(5)).abs() < 1e-9);
        assert_eq!(coords.fragment(), "GGGAAACCC");
    }
}
