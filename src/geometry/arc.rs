use crate::data::model::{check_position, ContactClass, Linked, Position};
use crate::error::Result;

use super::LayoutOptions;

/// A half-circle joining two positions on the nucleotide axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcDescriptor {
    pub i: Position,
    pub j: Position,
    /// Midpoint between the two positions.
    pub center: f64,
    /// Half the span, so the arc lands exactly on both positions.
    pub radius: f64,
    /// Peak height; grows with the span so long-range links stand out.
    pub height: f64,
    pub weight: Option<f64>,
    pub class: Option<ContactClass>,
}

/// One arc per link, in input order. Links lying entirely on one side of the
/// configured region are skipped.
pub fn arc_layout<L: Linked>(links: &[L], length: usize, options: &LayoutOptions) -> Result<Vec<ArcDescriptor>> {
    let (start, end) = options.region.unwrap_or((1, length));
    let mut arcs = Vec::with_capacity(links.len());
    for link in links {
        let (i, j) = link.endpoints();
        check_position(i, length)?;
        check_position(j, length)?;
        if (i < start && j < start) || (i > end && j > end) {
            continue;
        }
        let radius = j.abs_diff(i) as f64 / 2.0;
        arcs.push(ArcDescriptor {
            i,
            j,
            center: (i + j) as f64 / 2.0,
            radius,
            height: radius,
            weight: link.weight(),
            class: link.class(),
        });
    }
    Ok(arcs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Contact, Pair};
    use crate::error::RnavError;

    #[test]
    fn test_arc_for_pair() {
        let arcs = arc_layout(&[Pair::new(3, 17)], 20, &LayoutOptions::default()).unwrap();
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].center, 10.0);
        assert_eq!(arcs[0].radius, 7.0);
    }

    #[test]
    fn test_arc_height_grows_with_span() {
        let contacts = vec![
            Contact::new(10, 12, 1.0),
            Contact::new(10, 30, 2.0),
            Contact::new(40, 1, 3.0),
        ];
        let arcs = arc_layout(&contacts, 50, &LayoutOptions::default()).unwrap();
        assert!(arcs[0].height < arcs[1].height);
        assert!(arcs[1].height < arcs[2].height);
        assert_eq!((arcs[2].i, arcs[2].j), (1, 40));
        assert_eq!(arcs[1].weight, Some(2.0));
    }

    #[test]
    fn test_arc_out_of_range_is_error() {
        let err = arc_layout(&[(5, 21)], 20, &LayoutOptions::default()).unwrap_err();
        assert_eq!(err, RnavError::OutOfRange { position: 21, length: 20 });
    }

    #[test]
    fn test_arc_region() {
        let options = LayoutOptions {
            region: Some((10, 20)),
            ..Default::default()
        };
        let arcs = arc_layout(&[(1, 5), (5, 15), (21, 25)], 30, &options).unwrap();
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].center, 10.0);
    }
}
