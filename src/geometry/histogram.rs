//! Binned 3-D distances, used to compare filtered contacts against the
//! background of every residue pair in a model.

/// Counts of distances in `[k * bin_width, (k + 1) * bin_width)`. The last bin
/// also takes everything beyond it.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceHistogram {
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

impl DistanceHistogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Share of the values in each bin; all zero when nothing was counted.
    pub fn fractions(&self) -> Vec<f64> {
        let total = self.total();
        self.counts
            .iter()
            .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
            .collect()
    }

    /// Step outline of the fractions, closed to the baseline at both ends.
    pub fn outline(&self) -> Vec<[f64; 2]> {
        let fractions = self.fractions();
        let mut points = Vec::with_capacity(2 * fractions.len() + 2);
        points.push([0.0, 0.0]);
        for (k, fraction) in fractions.iter().enumerate() {
            points.push([k as f64 * self.bin_width, *fraction]);
            points.push([(k + 1) as f64 * self.bin_width, *fraction]);
        }
        if let Some(&[x, _]) = points.last() {
            points.push([x, 0.0]);
        }
        points
    }
}

/// Number of bins needed for `max` to fall inside the last one.
pub fn bins_for(max: f64, bin_width: f64) -> usize {
    if bin_width.is_nan() || bin_width <= 0.0 || !max.is_finite() || max < 0.0 {
        return 1;
    }
    (max / bin_width).floor() as usize + 1
}

/// Histogram of `distances` over `bins` bins. Negative and non-finite values
/// are skipped, as is everything when `bin_width` is not positive.
pub fn distance_histogram(
    distances: impl IntoIterator<Item = f64>,
    bin_width: f64,
    bins: usize,
) -> DistanceHistogram {
    let mut counts = vec![0; bins];
    if bin_width > 0.0 && bins > 0 {
        for d in distances {
            if !d.is_finite() || d < 0.0 {
                continue;
            }
            let k = ((d / bin_width).floor() as usize).min(bins - 1);
            counts[k] += 1;
        }
    }
    DistanceHistogram { bin_width, counts }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binning() {
        let hist = distance_histogram([1.0, 4.9, 5.0, 12.0, f64::NAN, -1.0], 5.0, 3);
        assert_eq!(hist.counts, vec![2, 1, 1]);
        assert_eq!(hist.fractions(), vec![0.5, 0.25, 0.25]);
    }

    #[test]
    fn test_overflow_lands_in_last_bin() {
        let hist = distance_histogram([40.0], 5.0, bins_for(12.0, 5.0));
        assert_eq!(hist.counts, vec![0, 0, 1]);
    }

    #[test]
    fn test_empty_histogram() {
        let hist = distance_histogram(std::iter::empty(), 5.0, 2);
        assert_eq!(hist.total(), 0);
        assert_eq!(hist.fractions(), vec![0.0, 0.0]);
        assert_eq!(distance_histogram([1.0], 0.0, 2).total(), 0);
    }

    #[test]
    fn test_outline() {
        let hist = distance_histogram([1.0, 6.0, 7.0, 8.0], 5.0, 2);
        assert_eq!(
            hist.outline(),
            vec![[0.0, 0.0], [0.0, 0.25], [5.0, 0.25], [5.0, 0.75], [10.0, 0.75], [10.0, 0.0]]
        );
    }

    #[test]
    fn test_bins_for() {
        assert_eq!(bins_for(10.0, 5.0), 3);
        assert_eq!(bins_for(4.0, 5.0), 1);
        assert_eq!(bins_for(f64::NAN, 5.0), 1);
    }
}
