use ibw_common::{Real, SampleIndex};

/// How far the signal must fall from `peak` before it can climb to something higher.
///
/// The search runs outwards on each side until a strictly higher sample or the
/// end of the series. The lowest point of each side is its base, and the
/// prominence is measured from the higher of the two bases.
pub(super) fn prominence(series: &[Real], peak: SampleIndex) -> Real {
    let Some((&height, right)) = series.get(peak..).and_then(<[Real]>::split_first) else {
        return 0.0;
    };
    let left = series.get(..peak).unwrap_or_default();
    let left_base = base(left.iter().rev(), height);
    let right_base = base(right.iter(), height);
    height - left_base.max(right_base)
}

fn base<'a>(side: impl Iterator<Item = &'a Real>, height: Real) -> Real {
    side.take_while(|&&value| value <= height)
        .fold(height, |lowest, &value| lowest.min(value))
}
