use serde::{Deserialize, Serialize};

use super::model::{check_position, Contact, ContactClass, DistanceMode, Linked, Position, SpatialModel};
use super::structure::StructureModel;
use crate::error::{Result, RnavError};

// ---------------------------------------------------------------------------
// Filter options: which contacts survive classification
// ---------------------------------------------------------------------------

/// Contact filter settings. Every `None` / `false` means "no constraint".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyOptions {
    /// Drop contacts whose statistic is below this value.
    pub statistic_threshold: Option<f64>,
    /// Drop contacts farther apart than this in the 3-D model (Å).
    pub max_contact_distance: Option<f64>,
    pub distance_mode: DistanceMode,
    /// Drop negative correlations.
    pub positive_only: bool,
    /// Keep only contacts with both legs single-stranded in the structure.
    pub unpaired_only: bool,
    /// Drop contacts closer than this along the structure graph.
    pub min_structure_distance: Option<usize>,
}

/// Class of a contact relative to `structure`.
pub fn contact_class(contact: &Contact, structure: &StructureModel) -> ContactClass {
    let (i, j) = contact.key();
    if structure.contains_pair(i, j) {
        return ContactClass::BasePair;
    }
    match (structure.is_paired(i), structure.is_paired(j)) {
        (true, true) => ContactClass::Paired,
        (false, false) => ContactClass::Unpaired,
        _ => ContactClass::Mixed,
    }
}

/// Return a new contact list holding the contacts that pass every active
/// filter, each tagged with its [`ContactClass`]. Input order is preserved.
///
/// A contact is dropped when:
/// * its statistic is below `statistic_threshold`
/// * it is a negative correlation and `positive_only` is set
/// * a leg is paired and `unpaired_only` is set
/// * its structure-graph distance is below `min_structure_distance`
/// * its 3-D distance is unknown or above `max_contact_distance`
pub fn classify(
    contacts: &[Contact],
    structure: &StructureModel,
    spatial: Option<&SpatialModel>,
    options: &ClassifyOptions,
) -> Result<Vec<Contact>> {
    if options.max_contact_distance.is_some() && spatial.is_none() {
        return Err(RnavError::MissingGeometry("max_contact_distance".to_string()));
    }
    for contact in contacts {
        check_position(contact.i, structure.length())?;
        check_position(contact.j, structure.length())?;
    }

    let mut kept = Vec::with_capacity(contacts.len());
    for contact in contacts {
        if options
            .statistic_threshold
            .is_some_and(|threshold| contact.statistic < threshold)
        {
            continue;
        }
        if options.positive_only && contact.sign < 0 {
            continue;
        }
        let class = contact_class(contact, structure);
        if options.unpaired_only && class != ContactClass::Unpaired {
            continue;
        }
        if let Some(min) = options.min_structure_distance {
            if structure.contact_distance(contact.i, contact.j)? < min {
                continue;
            }
        }

        let mut classified = contact.clone();
        if let Some(model) = spatial {
            classified.distance = model.distance(contact.i, contact.j, options.distance_mode);
        }
        if let Some(max) = options.max_contact_distance {
            // Unknown distances cannot be shown to be within range.
            match classified.distance {
                Some(d) if d <= max => {}
                _ => continue,
            }
        }
        classified.class = Some(class);
        kept.push(classified);
    }

    log::debug!("contact filter kept {} of {} contacts", kept.len(), contacts.len());
    Ok(kept)
}

// ---------------------------------------------------------------------------
// Scoring against a reference structure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// Recovered reference pairs / reference pairs.
    pub sensitivity: f64,
    /// Contacts matching a reference pair / contacts.
    pub ppv: f64,
    pub matched_reference: usize,
    pub reference_total: usize,
    pub matched_contacts: usize,
    pub contact_total: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Sensitivity and PPV of `links` against the secondary pairs of `reference`.
///
/// A link matches a reference pair when both endpoints lie within `slack`
/// nucleotides of the pair's endpoints. Each reference pair counts once toward
/// sensitivity no matter how many links hit it. Links are visited in ascending
/// `(i, j)` order, so the result does not depend on input order.
pub fn score<L: Linked>(links: &[L], reference: &StructureModel, slack: usize) -> Score {
    let mut keys: Vec<(Position, Position)> = links.iter().map(Linked::endpoints).collect();
    keys.sort_unstable();

    let pairs = reference.pairs();
    let mut recovered = vec![false; pairs.len()];
    let mut matched_contacts = 0;

    for &(a, b) in &keys {
        let first = pairs.partition_point(|p| p.i + slack < a);
        let mut hit = false;
        for (offset, pair) in pairs[first..].iter().enumerate() {
            if pair.i > a + slack {
                break;
            }
            if pair.j.abs_diff(b) <= slack {
                recovered[first + offset] = true;
                hit = true;
            }
        }
        if hit {
            matched_contacts += 1;
        }
    }

    let matched_reference = recovered.iter().filter(|&&r| r).count();
    Score {
        sensitivity: ratio(matched_reference, pairs.len()),
        ppv: ratio(matched_contacts, keys.len()),
        matched_reference,
        reference_total: pairs.len(),
        matched_contacts,
        contact_total: keys.len(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::model::Pair;

    fn reference() -> StructureModel {
        StructureModel::new(20, vec![Pair::new(1, 20), Pair::new(2, 19), Pair::new(3, 18)]).unwrap()
    }

    fn contacts() -> Vec<Contact> {
        vec![
            Contact::new(1, 20, 50.0),
            Contact::new(2, 19, 40.0),
            Contact::new(5, 16, 30.0),
            Contact::new(5, 15, 20.0),
        ]
    }

    #[test]
    fn test_score_scenario() {
        let s = score(&contacts(), &reference(), 0);
        assert!((s.sensitivity - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.ppv, 0.5);
        assert_eq!(s.matched_reference, 2);
        assert_eq!(s.contact_total, 4);
    }

    #[test]
    fn test_score_is_order_independent() {
        let mut reversed = contacts();
        reversed.reverse();
        let swapped: Vec<Contact> = contacts()
            .into_iter()
            .map(|c| Contact::new(c.j, c.i, c.statistic))
            .collect();
        let shuffled_reference =
            StructureModel::new(20, vec![Pair::new(18, 3), Pair::new(1, 20), Pair::new(19, 2)]).unwrap();

        let base = score(&contacts(), &reference(), 0);
        assert_eq!(score(&reversed, &reference(), 0), base);
        assert_eq!(score(&swapped, &reference(), 0), base);
        assert_eq!(score(&contacts(), &shuffled_reference, 0), base);
    }

    #[test]
    fn test_score_counts_each_reference_pair_once() {
        let dupes = vec![Contact::new(1, 20, 1.0), Contact::new(1, 20, 2.0)];
        let s = score(&dupes, &reference(), 0);
        assert_eq!(s.matched_reference, 1);
        assert_eq!(s.matched_contacts, 2);
        assert_eq!(s.ppv, 1.0);
    }

    #[test]
    fn test_score_with_slack() {
        let near = vec![Contact::new(4, 17, 1.0)];
        assert_eq!(score(&near, &reference(), 0).matched_contacts, 0);
        let s = score(&near, &reference(), 1);
        assert_eq!(s.matched_contacts, 1);
        assert_eq!(s.matched_reference, 1);
    }

    #[test]
    fn test_score_empty_inputs() {
        let none: Vec<Contact> = Vec::new();
        let s = score(&none, &reference(), 0);
        assert_eq!(s.sensitivity, 0.0);
        assert_eq!(s.ppv, 0.0);
    }

    #[test]
    fn test_classify_without_filters_only_adds_tags() {
        let options = ClassifyOptions {
            statistic_threshold: Some(0.0),
            ..Default::default()
        };
        let input = contacts();
        let out = classify(&input, &reference(), None, &options).unwrap();
        assert_eq!(out.len(), input.len());
        for (before, after) in input.iter().zip(&out) {
            assert_eq!(Contact { class: None, ..after.clone() }, *before);
            assert!(after.class.is_some());
        }
        assert_eq!(out[0].class, Some(ContactClass::BasePair));
        assert_eq!(out[2].class, Some(ContactClass::Unpaired));
    }

    #[test]
    fn test_classify_threshold_and_sign() {
        let mut input = contacts();
        input[1].sign = -1;
        let options = ClassifyOptions {
            statistic_threshold: Some(25.0),
            positive_only: true,
            ..Default::default()
        };
        let out = classify(&input, &reference(), None, &options).unwrap();
        assert_eq!(out.iter().map(|c| c.key()).collect::<Vec<_>>(), vec![(1, 20), (5, 16)]);
    }

    #[test]
    fn test_classify_distance_requires_model() {
        let options = ClassifyOptions {
            max_contact_distance: Some(20.0),
            ..Default::default()
        };
        let err = classify(&contacts(), &reference(), None, &options).unwrap_err();
        assert!(matches!(err, RnavError::MissingGeometry(_)));
    }

    #[test]
    fn test_classify_distance_filter() {
        let mut conf = BTreeMap::new();
        conf.insert(1, [0.0, 0.0, 0.0]);
        conf.insert(20, [10.0, 0.0, 0.0]);
        conf.insert(2, [0.0, 0.0, 0.0]);
        conf.insert(19, [30.0, 0.0, 0.0]);
        let model = SpatialModel {
            atom: "O2'".to_string(),
            nucleotides: BTreeMap::new(),
            conformers: vec![conf],
        };
        let options = ClassifyOptions {
            max_contact_distance: Some(20.0),
            ..Default::default()
        };
        let out = classify(&contacts(), &reference(), Some(&model), &options).unwrap();
        // (2,19) is too far; (5,*) have no coordinates
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key(), (1, 20));
        assert_eq!(out[0].distance, Some(10.0));
    }

    #[test]
    fn test_classify_structure_distance() {
        let options = ClassifyOptions {
            min_structure_distance: Some(3),
            ..Default::default()
        };
        let out = classify(&contacts(), &reference(), None, &options).unwrap();
        // (1,20) and (2,19) are one step apart through their pair
        assert_eq!(out.iter().map(|c| c.key()).collect::<Vec<_>>(), vec![(5, 16), (5, 15)]);
    }

    #[test]
    fn test_classify_out_of_range() {
        let input = vec![Contact::new(1, 21, 10.0)];
        let err = classify(&input, &reference(), None, &ClassifyOptions::default()).unwrap_err();
        assert_eq!(err, RnavError::OutOfRange { position: 21, length: 20 });
    }
}
