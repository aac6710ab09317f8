use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::OnceLock;

use super::model::{check_position, Pair, PairKind, PairRelation, Position};
use crate::error::{Result, RnavError};

/// Bracket families used by dot-bracket notation, in nesting-level order.
const BRACKETS: [(char, char); 4] = [('(', ')'), ('[', ']'), ('{', '}'), ('<', '>')];

/// A maximal run of stacked pairs `(i, j), (i+1, j-1), ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Helix {
    /// Outermost pair.
    pub i: Position,
    pub j: Position,
    pub length: usize,
}

impl Helix {
    pub fn pairs(&self) -> impl Iterator<Item = Pair> + '_ {
        (0..self.length).map(move |k| Pair::new(self.i + k, self.j - k))
    }
}

/// Where a pair comes from when two structures are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PairOrigin {
    Shared,
    /// Only in the structure `compare` was called on.
    OnlyThis,
    OnlyOther,
}

// ---------------------------------------------------------------------------
// StructureModel
// ---------------------------------------------------------------------------

/// Base-pairing topology over a sequence of `length` nucleotides.
///
/// Every position has at most one secondary partner. Tertiary pairs are kept
/// apart and never affect `partner`, helices or contact distances.
#[derive(Debug, Clone)]
pub struct StructureModel {
    length: usize,
    pairs: Vec<Pair>,
    tertiary: Vec<Pair>,
    partners: Vec<Option<Position>>,
    single_stranded: BTreeSet<Position>,
    helices: OnceLock<Vec<Helix>>,
}

impl StructureModel {
    pub fn new(length: usize, pairs: impl IntoIterator<Item = Pair>) -> Result<Self> {
        Self::with_single_stranded(length, pairs, std::iter::empty())
    }

    /// Build a model with explicit single-stranded flags. Flagging a paired
    /// position is a conflict.
    pub fn with_single_stranded(
        length: usize,
        pairs: impl IntoIterator<Item = Pair>,
        single_stranded: impl IntoIterator<Item = Position>,
    ) -> Result<Self> {
        let mut partners = vec![None; length + 1];
        let mut secondary = Vec::new();
        let mut tertiary = Vec::new();

        for pair in pairs {
            let pair = Pair {
                i: pair.i.min(pair.j),
                j: pair.i.max(pair.j),
                ..pair
            };
            if pair.i == pair.j {
                return Err(RnavError::InvalidStructure(format!(
                    "position {} is paired with itself",
                    pair.i
                )));
            }
            check_position(pair.i, length)?;
            check_position(pair.j, length)?;

            if pair.kind == PairKind::Tertiary {
                tertiary.push(pair);
                continue;
            }
            match (partners[pair.i], partners[pair.j]) {
                (None, None) => {
                    partners[pair.i] = Some(pair.j);
                    partners[pair.j] = Some(pair.i);
                    secondary.push(pair);
                }
                (Some(p), Some(q)) if p == pair.j && q == pair.i => {
                    log::debug!("duplicate pair ({}, {}) ignored", pair.i, pair.j);
                }
                (existing_i, existing_j) => {
                    let (position, old) = match existing_i {
                        Some(old) => (pair.i, old),
                        None => (pair.j, existing_j.unwrap_or_default()),
                    };
                    return Err(RnavError::InvalidStructure(format!(
                        "position {position} pairs with both {old} and {}",
                        if position == pair.i { pair.j } else { pair.i }
                    )));
                }
            }
        }

        let single_stranded: BTreeSet<Position> = single_stranded.into_iter().collect();
        for &position in &single_stranded {
            check_position(position, length)?;
            if let Some(partner) = partners[position] {
                return Err(RnavError::InvalidStructure(format!(
                    "position {position} is flagged single-stranded but pairs with {partner}"
                )));
            }
        }

        secondary.sort_by_key(Pair::key);
        tertiary.sort_by_key(Pair::key);
        Ok(StructureModel {
            length,
            pairs: secondary,
            tertiary,
            partners,
            single_stranded,
            helices: OnceLock::new(),
        })
    }

    /// Parse dot-bracket notation. Each bracket family nests on its own, and
    /// upper/lower case letters pair like brackets (`A` opens, `a` closes).
    pub fn from_dot_bracket(structure: &str) -> Result<Self> {
        let symbols: Vec<char> = structure.chars().filter(|c| !c.is_whitespace()).collect();
        let mut stacks: BTreeMap<char, Vec<Position>> = BTreeMap::new();
        let mut pairs = Vec::new();

        for (idx, &symbol) in symbols.iter().enumerate() {
            let position = idx + 1;
            if let Some(&(open, _)) = BRACKETS.iter().find(|(o, _)| *o == symbol) {
                stacks.entry(open).or_default().push(position);
            } else if let Some(&(open, close)) = BRACKETS.iter().find(|(_, c)| *c == symbol) {
                let partner = stacks.entry(open).or_default().pop().ok_or_else(|| {
                    RnavError::InvalidStructure(format!("unmatched '{close}' at position {position}"))
                })?;
                pairs.push(Pair::new(partner, position));
            } else if symbol.is_ascii_uppercase() {
                stacks.entry(symbol).or_default().push(position);
            } else if symbol.is_ascii_lowercase() {
                let open = symbol.to_ascii_uppercase();
                let partner = stacks.entry(open).or_default().pop().ok_or_else(|| {
                    RnavError::InvalidStructure(format!("unmatched '{symbol}' at position {position}"))
                })?;
                pairs.push(Pair::new(partner, position));
            }
        }

        if let Some((open, stack)) = stacks.iter().find(|(_, s)| !s.is_empty()) {
            return Err(RnavError::InvalidStructure(format!(
                "unmatched '{open}' at position {}",
                stack[stack.len() - 1]
            )));
        }
        Self::new(symbols.len(), pairs)
    }

    /// Dot-bracket string; crossing pairs move to the next bracket family.
    pub fn to_dot_bracket(&self) -> String {
        let mut levels: Vec<Vec<Pair>> = Vec::new();
        let mut symbols = vec!['.'; self.length];
        for pair in &self.pairs {
            let level = match levels
                .iter()
                .position(|placed| placed.iter().all(|p| !p.is_crossing(pair)))
            {
                Some(level) => level,
                None => {
                    levels.push(Vec::new());
                    levels.len() - 1
                }
            };
            levels[level].push(*pair);
            let (open, close) = match BRACKETS.get(level) {
                Some(&brackets) => brackets,
                None => {
                    let letter = (b'A' + ((level - BRACKETS.len()) % 26) as u8) as char;
                    (letter, letter.to_ascii_lowercase())
                }
            };
            symbols[pair.i - 1] = open;
            symbols[pair.j - 1] = close;
        }
        symbols.into_iter().collect()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Secondary pairs ordered by `(i, j)`.
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn tertiary_pairs(&self) -> &[Pair] {
        &self.tertiary
    }

    pub fn partner(&self, position: Position) -> Option<Position> {
        self.partners.get(position).copied().flatten()
    }

    pub fn is_paired(&self, position: Position) -> bool {
        self.partner(position).is_some()
    }

    /// Explicitly flagged single-stranded, or unflagged and unpaired.
    pub fn is_single_stranded(&self, position: Position) -> bool {
        self.single_stranded.contains(&position) || !self.is_paired(position)
    }

    pub fn contains_pair(&self, a: Position, b: Position) -> bool {
        a != b && self.partner(a) == Some(b)
    }

    pub fn relation(a: &Pair, b: &Pair) -> PairRelation {
        a.relation(b)
    }

    pub fn is_nested(a: &Pair, b: &Pair) -> bool {
        a.is_nested(b)
    }

    pub fn is_crossing(a: &Pair, b: &Pair) -> bool {
        a.is_crossing(b)
    }

    /// Helices produced on demand, in order of their outermost pair.
    pub fn helix_iter(&self) -> HelixIter<'_> {
        HelixIter {
            model: self,
            next: 0,
        }
    }

    /// All helices, computed on first use and cached.
    pub fn helices(&self) -> &[Helix] {
        self.helices.get_or_init(|| self.helix_iter().collect())
    }

    /// Pairs that cross at least one other pair (pseudoknots).
    pub fn crossing_pairs(&self) -> impl Iterator<Item = &Pair> + '_ {
        self.pairs
            .iter()
            .filter(move |p| self.pairs.iter().any(|q| p.is_crossing(q)))
    }

    /// Shortest path between two positions over backbone links and pairs.
    pub fn contact_distance(&self, from: Position, to: Position) -> Result<usize> {
        check_position(from, self.length)?;
        check_position(to, self.length)?;
        if from == to {
            return Ok(0);
        }
        let mut distance = vec![usize::MAX; self.length + 1];
        let mut queue = VecDeque::from([from]);
        distance[from] = 0;
        while let Some(position) = queue.pop_front() {
            let step = distance[position] + 1;
            let neighbours = [
                position.checked_sub(1).filter(|&p| p >= 1),
                Some(position + 1).filter(|&p| p <= self.length),
                self.partner(position),
            ];
            for next in neighbours.into_iter().flatten() {
                if distance[next] == usize::MAX {
                    if next == to {
                        return Ok(step);
                    }
                    distance[next] = step;
                    queue.push_back(next);
                }
            }
        }
        Ok(distance[to])
    }

    /// Label each pair of either structure by which structure contains it.
    pub fn compare(&self, other: &StructureModel) -> Vec<(Pair, PairOrigin)> {
        let mut merged: BTreeMap<(Position, Position), (Pair, PairOrigin)> = self
            .pairs
            .iter()
            .map(|p| (p.key(), (*p, PairOrigin::OnlyThis)))
            .collect();
        for pair in &other.pairs {
            merged
                .entry(pair.key())
                .and_modify(|entry| entry.1 = PairOrigin::Shared)
                .or_insert((*pair, PairOrigin::OnlyOther));
        }
        merged.into_values().collect()
    }
}

/// Lazily walks the pair list, yielding one [`Helix`] per stack start.
pub struct HelixIter<'a> {
    model: &'a StructureModel,
    next: usize,
}

impl Iterator for HelixIter<'_> {
    type Item = Helix;

    fn next(&mut self) -> Option<Helix> {
        while let Some(pair) = self.model.pairs.get(self.next) {
            self.next += 1;
            let continues_outer = pair.i > 1 && self.model.partner(pair.i - 1) == Some(pair.j + 1);
            if continues_outer {
                continue;
            }
            let mut length = 1;
            while pair.i + length < pair.j - length
                && self.model.partner(pair.i + length) == Some(pair.j - length)
            {
                length += 1;
            }
            return Some(Helix {
                i: pair.i,
                j: pair.j,
                length,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hairpin() -> StructureModel {
        // ((((....))))..((...))
        StructureModel::from_dot_bracket("((((....))))..((...))").unwrap()
    }

    #[test]
    fn test_partner_lookup() {
        let model = hairpin();
        assert_eq!(model.length(), 21);
        assert_eq!(model.partner(1), Some(12));
        assert_eq!(model.partner(12), Some(1));
        assert_eq!(model.partner(5), None);
        assert_eq!(model.partner(0), None);
        assert_eq!(model.partner(99), None);
        assert!(model.is_single_stranded(13));
    }

    #[test]
    fn test_conflicting_partner_is_rejected() {
        let err = StructureModel::new(20, vec![Pair::new(1, 10), Pair::new(1, 12)]).unwrap_err();
        assert!(matches!(err, RnavError::InvalidStructure(_)));

        let err = StructureModel::new(20, vec![Pair::new(1, 10), Pair::new(5, 10)]).unwrap_err();
        assert!(matches!(err, RnavError::InvalidStructure(_)));
    }

    #[test]
    fn test_self_pair_and_range() {
        assert!(matches!(
            StructureModel::new(10, vec![Pair::new(4, 4)]),
            Err(RnavError::InvalidStructure(_))
        ));
        assert!(matches!(
            StructureModel::new(10, vec![Pair::new(4, 11)]),
            Err(RnavError::OutOfRange { position: 11, .. })
        ));
    }

    #[test]
    fn test_tertiary_pairs_may_share_positions() {
        let model = StructureModel::new(
            20,
            vec![Pair::new(1, 10), Pair::tertiary(1, 15), Pair::tertiary(10, 18)],
        )
        .unwrap();
        assert_eq!(model.partner(1), Some(10));
        assert_eq!(model.tertiary_pairs().len(), 2);
    }

    #[test]
    fn test_single_stranded_flag_conflict() {
        let err = StructureModel::with_single_stranded(10, vec![Pair::new(1, 10)], vec![10]).unwrap_err();
        assert!(matches!(err, RnavError::InvalidStructure(_)));
    }

    #[test]
    fn test_helices() {
        let model = hairpin();
        let helices = model.helices();
        assert_eq!(
            helices,
            &[
                Helix { i: 1, j: 12, length: 4 },
                Helix { i: 15, j: 21, length: 2 },
            ]
        );
        assert_eq!(helices[1].pairs().collect::<Vec<_>>(), vec![Pair::new(15, 21), Pair::new(16, 20)]);
        // cached value matches a fresh iteration
        assert_eq!(model.helix_iter().collect::<Vec<_>>(), helices.to_vec());
    }

    #[test]
    fn test_bulge_splits_helix() {
        // pairs (1,12) (2,11) then bulge at 10, (3,9)
        let model = StructureModel::new(
            12,
            vec![Pair::new(1, 12), Pair::new(2, 11), Pair::new(3, 9)],
        )
        .unwrap();
        assert_eq!(model.helices().len(), 2);
    }

    #[test]
    fn test_dot_bracket_roundtrip_with_pseudoknot() {
        let text = "((..[[..))..]]";
        let model = StructureModel::from_dot_bracket(text).unwrap();
        assert_eq!(model.pairs().len(), 4);
        assert_eq!(model.crossing_pairs().count(), 4);
        assert_eq!(model.to_dot_bracket(), text);
    }

    #[test]
    fn test_dot_bracket_unbalanced() {
        assert!(StructureModel::from_dot_bracket("((..)").is_err());
        assert!(StructureModel::from_dot_bracket("..))").is_err());
    }

    #[test]
    fn test_contact_distance_uses_pairs() {
        let model = hairpin();
        // 1 pairs with 12, so 1 -> 13 is two steps (1-12-13)
        assert_eq!(model.contact_distance(1, 13).unwrap(), 2);
        assert_eq!(model.contact_distance(5, 5).unwrap(), 0);
        assert_eq!(model.contact_distance(5, 6).unwrap(), 1);
        assert!(model.contact_distance(5, 30).is_err());
    }

    #[test]
    fn test_compare_structures() {
        let a = StructureModel::new(20, vec![Pair::new(1, 20), Pair::new(2, 19)]).unwrap();
        let b = StructureModel::new(20, vec![Pair::new(1, 20), Pair::new(3, 18)]).unwrap();
        let cmp = a.compare(&b);
        assert_eq!(
            cmp.iter().map(|(p, o)| (p.key(), *o)).collect::<Vec<_>>(),
            vec![
                ((1, 20), PairOrigin::Shared),
                ((2, 19), PairOrigin::OnlyThis),
                ((3, 18), PairOrigin::OnlyOther),
            ]
        );
    }
}
