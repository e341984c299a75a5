use ibw_common::{Real, SampleIndex};
use std::collections::BTreeSet;

/// Keeps the tallest peak of every neighbourhood narrower than `min_distance`.
///
/// Candidates are taken in descending order of height, the leftmost first
/// among equal heights, and are accepted only if every peak already accepted
/// is at least `min_distance` samples away. The survivors are returned in
/// ascending index order.
pub(super) fn suppress_close_peaks(
    series: &[Real],
    candidates: &[SampleIndex],
    min_distance: usize,
) -> Vec<SampleIndex> {
    let mut by_height = candidates.to_vec();
    by_height.sort_by(|&a, &b| {
        series[b]
            .total_cmp(&series[a])
            .then_with(|| a.cmp(&b))
    });

    let reach = min_distance.saturating_sub(1);
    let mut accepted = BTreeSet::new();
    for index in by_height {
        let neighbourhood = index.saturating_sub(reach)..=index.saturating_add(reach);
        if accepted.range(neighbourhood).next().is_none() {
            accepted.insert(index);
        }
    }
    accepted.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallest_wins() {
        let series = [0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 5.0, 1.0, 0.0];
        assert_eq!(suppress_close_peaks(&series, &[2, 6], 5), vec![6]);
        assert_eq!(suppress_close_peaks(&series, &[2, 6], 4), vec![2, 6]);
    }

    #[test]
    fn equal_heights_keep_leftmost() {
        let series = [0.0, 4.0, 0.0, 4.0, 0.0, 4.0, 0.0];
        assert_eq!(suppress_close_peaks(&series, &[1, 3, 5], 3), vec![1, 5]);
        assert_eq!(suppress_close_peaks(&series, &[1, 3, 5], 4), vec![1, 5]);
        assert_eq!(suppress_close_peaks(&series, &[1, 3, 5], 5), vec![1]);
    }

    #[test]
    fn suppressed_peak_does_not_suppress_others() {
        // 4 is removed by 7, so 1 survives even though it is close to 4
        let series = [0.0, 5.0, 0.0, 0.0, 6.0, 0.0, 0.0, 9.0, 0.0];
        assert_eq!(suppress_close_peaks(&series, &[1, 4, 7], 4), vec![1, 7]);
    }

    #[test]
    fn distance_of_one_keeps_everything() {
        let series = [0.0, 2.0, 0.0, 2.0, 0.0];
        assert_eq!(suppress_close_peaks(&series, &[1, 3], 1), vec![1, 3]);
    }
}
