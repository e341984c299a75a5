use ibw_common::{Real, SampleIndex};

/// Indices of the local maxima of `series`, excluding the first and last sample.
///
/// A flat top is reported once, at its first sample, provided the samples on
/// either side of it are both lower. A flat run followed by a rise, or one that
/// reaches the end of the series, is a shoulder rather than a maximum.
pub(super) fn local_maxima(series: &[Real]) -> Vec<SampleIndex> {
    let mut maxima = Vec::new();
    let last = series.len().saturating_sub(1);
    let mut index = 1;
    while index < last {
        if series[index - 1] < series[index] {
            let mut ahead = index + 1;
            while ahead < last && series[ahead] == series[index] {
                ahead += 1;
            }
            if series[ahead] < series[index] {
                maxima.push(index);
            }
            index = ahead;
        } else {
            index += 1;
        }
    }
    maxima
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_maxima() {
        assert_eq!(
            local_maxima(&[0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 5.0, 1.0, 0.0]),
            vec![2, 6]
        );
    }

    #[test]
    fn plateau_reported_at_first_index() {
        assert_eq!(local_maxima(&[0.0, 1.0, 2.0, 2.0, 2.0, 1.0, 0.0]), vec![2]);
    }

    #[test]
    fn shoulders_are_not_maxima() {
        assert_eq!(local_maxima(&[0.0, 2.0, 2.0, 3.0, 1.0]), vec![3]);
        assert_eq!(local_maxima(&[0.0, 1.0, 2.0, 2.0]), Vec::<SampleIndex>::new());
    }

    #[test]
    fn boundaries_are_not_maxima() {
        assert!(local_maxima(&[5.0, 1.0, 5.0]).is_empty());
        assert!(local_maxima(&[1.0, 5.0]).is_empty());
        assert!(local_maxima(&[]).is_empty());
    }

    #[test]
    fn constant_series() {
        assert!(local_maxima(&[3.0; 10]).is_empty());
    }
}
