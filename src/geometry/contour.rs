use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::data::model::{check_position, Contact, Position};
use crate::data::structure::StructureModel;
use crate::error::{Result, RnavError};

// ---------------------------------------------------------------------------
// StatisticGrid – square (i, j) matrix behind a heatmap
// ---------------------------------------------------------------------------

/// Symmetric `size × size` grid of statistics, 1-based. Empty cells are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticGrid {
    size: usize,
    values: Vec<f64>,
}

impl StatisticGrid {
    pub fn new(size: usize) -> Self {
        StatisticGrid {
            size,
            values: vec![f64::NAN; size * size],
        }
    }

    /// Fill both `(i, j)` and `(j, i)` from each contact, keeping the largest
    /// statistic when contacts repeat.
    pub fn from_contacts(size: usize, contacts: &[Contact]) -> Result<Self> {
        let mut grid = StatisticGrid::new(size);
        for contact in contacts {
            check_position(contact.i, size)?;
            check_position(contact.j, size)?;
            for (a, b) in [(contact.i, contact.j), (contact.j, contact.i)] {
                let cell = &mut grid.values[(a - 1) * size + (b - 1)];
                if cell.is_nan() || contact.statistic > *cell {
                    *cell = contact.statistic;
                }
            }
        }
        Ok(grid)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: Position, j: Position) -> Option<f64> {
        if i == 0 || j == 0 || i > self.size || j > self.size {
            return None;
        }
        let value = self.values[(i - 1) * self.size + (j - 1)];
        (!value.is_nan()).then_some(value)
    }

    /// Filled cells as `(i, j, value)`, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (Position, Position, f64)> + '_ {
        self.values.iter().enumerate().filter_map(move |(idx, &v)| {
            (!v.is_nan()).then_some((idx / self.size + 1, idx % self.size + 1, v))
        })
    }
}

// ---------------------------------------------------------------------------
// Contours around pair cells
// ---------------------------------------------------------------------------

/// Closed outline in heatmap coordinates; cell `(i, j)` covers
/// `[i-0.5, i+0.5] × [j-0.5, j+0.5]`. First and last points coincide.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourPath {
    pub points: Vec<[f64; 2]>,
}

/// Outline the grid cells `(i, j)` and `(j, i)` of every pair (secondary and
/// tertiary) of `structure`. Paths are traced lazily, one 4-connected group
/// of cells at a time.
pub fn heatmap_contour(structure: &StructureModel, grid: &StatisticGrid) -> Result<ContourTracer> {
    let mut cells = BTreeSet::new();
    for pair in structure.pairs().iter().chain(structure.tertiary_pairs()) {
        if pair.j > grid.size() {
            return Err(RnavError::OutOfRange {
                position: pair.j,
                length: grid.size(),
            });
        }
        cells.insert((pair.i, pair.j));
        cells.insert((pair.j, pair.i));
    }
    Ok(ContourTracer {
        remaining: cells,
        pending: VecDeque::new(),
    })
}

pub struct ContourTracer {
    remaining: BTreeSet<(Position, Position)>,
    pending: VecDeque<ContourPath>,
}

impl Iterator for ContourTracer {
    type Item = ContourPath;

    fn next(&mut self) -> Option<ContourPath> {
        if let Some(path) = self.pending.pop_front() {
            return Some(path);
        }
        let seed = self.remaining.pop_first()?;
        let component = take_component(&mut self.remaining, seed);
        self.pending.extend(trace_outline(&component));
        self.pending.pop_front()
    }
}

fn take_component(
    remaining: &mut BTreeSet<(Position, Position)>,
    seed: (Position, Position),
) -> BTreeSet<(Position, Position)> {
    let mut component = BTreeSet::from([seed]);
    let mut queue = VecDeque::from([seed]);
    while let Some((x, y)) = queue.pop_front() {
        let neighbours = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for cell in neighbours {
            if remaining.remove(&cell) {
                component.insert(cell);
                queue.push_back(cell);
            }
        }
    }
    component
}

/// Walk the counter-clockwise boundary edges of a cell group into closed
/// loops. Corner `(x, y)` is the lower-left corner of cell `(x, y)`.
fn trace_outline(component: &BTreeSet<(Position, Position)>) -> Vec<ContourPath> {
    type Corner = (Position, Position);
    let mut edges: BTreeMap<Corner, Vec<Corner>> = BTreeMap::new();
    let mut add = |from: Corner, to: Corner| edges.entry(from).or_default().push(to);

    for &(x, y) in component {
        let filled = |cx: Position, cy: Position| component.contains(&(cx, cy));
        if y == 0 || !filled(x, y - 1) {
            add((x, y), (x + 1, y));
        }
        if !filled(x + 1, y) {
            add((x + 1, y), (x + 1, y + 1));
        }
        if !filled(x, y + 1) {
            add((x + 1, y + 1), (x, y + 1));
        }
        if x == 0 || !filled(x - 1, y) {
            add((x, y + 1), (x, y));
        }
    }

    let corner_point = |(cx, cy): Corner| [cx as f64 - 0.5, cy as f64 - 0.5];
    let mut loops = Vec::new();
    loop {
        let Some(start) = edges
            .iter()
            .find(|(_, targets)| !targets.is_empty())
            .map(|(&corner, _)| corner)
        else {
            break;
        };
        let mut points = vec![corner_point(start)];
        let mut at = start;
        loop {
            let Some(next) = edges.get_mut(&at).and_then(|targets| targets.pop()) else {
                break;
            };
            points.push(corner_point(next));
            at = next;
            if at == start {
                break;
            }
        }
        loops.push(ContourPath { points });
    }
    loops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Pair;

    #[test]
    fn test_single_pair_gives_two_squares() {
        let model = StructureModel::new(20, vec![Pair::new(3, 17)]).unwrap();
        let grid = StatisticGrid::new(20);
        let paths: Vec<_> = heatmap_contour(&model, &grid).unwrap().collect();
        assert_eq!(paths.len(), 2);
        for path in &paths {
            assert_eq!(path.points.len(), 5);
            assert_eq!(path.points.first(), path.points.last());
        }
        let xs: Vec<f64> = paths[0].points.iter().map(|p| p[0]).collect();
        assert!(xs.contains(&2.5) && xs.contains(&3.5));
    }

    #[test]
    fn test_adjacent_cells_merge() {
        // tertiary (1,11) sits next to the secondary pair (1,10)
        let model = StructureModel::new(12, vec![Pair::new(1, 10), Pair::tertiary(1, 11)]).unwrap();
        let grid = StatisticGrid::new(12);
        let paths: Vec<_> = heatmap_contour(&model, &grid).unwrap().collect();
        assert_eq!(paths.len(), 2);
        // a 1x2 rectangle has 6 boundary corners, plus the closing point
        assert!(paths.iter().all(|p| p.points.len() == 7));
    }

    #[test]
    fn test_contour_is_lazy_and_ordered() {
        let model = StructureModel::new(20, vec![Pair::new(1, 20), Pair::new(2, 19)]).unwrap();
        let grid = StatisticGrid::new(20);
        let mut tracer = heatmap_contour(&model, &grid).unwrap();
        let first = tracer.next().unwrap();
        assert_eq!(first.points[0], [0.5, 19.5]);
        assert_eq!(tracer.count(), 3);
    }

    #[test]
    fn test_contour_grid_too_small() {
        let model = StructureModel::new(20, vec![Pair::new(3, 17)]).unwrap();
        let grid = StatisticGrid::new(10);
        assert!(matches!(
            heatmap_contour(&model, &grid),
            Err(RnavError::OutOfRange { position: 17, length: 10 })
        ));
    }

    #[test]
    fn test_grid_from_contacts() {
        let contacts = vec![Contact::new(2, 5, 10.0), Contact::new(5, 2, 30.0)];
        let grid = StatisticGrid::from_contacts(6, &contacts).unwrap();
        assert_eq!(grid.get(2, 5), Some(30.0));
        assert_eq!(grid.get(5, 2), Some(30.0));
        assert_eq!(grid.get(1, 1), None);
        assert_eq!(grid.cells().count(), 2);
        assert!(StatisticGrid::from_contacts(4, &contacts).is_err());
    }
}
