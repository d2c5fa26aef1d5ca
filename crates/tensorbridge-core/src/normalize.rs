//! Min/max range discovery and [0, 1] rescaling, tolerant of NaN/Inf.
//!
//! Every function here is total: degenerate input yields the documented
//! fallback (`{0, 1}` range, `0.5` value) rather than an error.

use crate::OutputLayout;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizationRange {
    pub min: f32,
    pub max: f32,
}

impl NormalizationRange {
    pub const UNIT: Self = Self { min: 0.0, max: 1.0 };

    pub fn is_usable(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }

    /// Range of an inference output, per-channel folded for multi-channel layouts.
    pub fn for_output(tensor: &[f32], layout: &OutputLayout) -> Self {
        if layout.single_channel {
            find_range(tensor)
        } else {
            find_range_multi_channel(tensor, layout.channel_count, layout.width, layout.height)
        }
    }
}

impl Default for NormalizationRange {
    fn default() -> Self {
        Self::UNIT
    }
}

#[derive(Clone, Copy)]
struct Extent {
    min: f32,
    max: f32,
}

impl Extent {
    fn scan(values: &[f32]) -> Option<Self> {
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Extent>, v| match acc {
                None => Some(Extent { min: v, max: v }),
                Some(e) => Some(Extent {
                    min: e.min.min(v),
                    max: e.max.max(v),
                }),
            })
    }

    fn merge(self, other: Extent) -> Self {
        Extent {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Single-pass range over finite values. Collapses to `{0, 1}` when no finite
/// value exists or all finite values are equal.
pub fn find_range(tensor: &[f32]) -> NormalizationRange {
    match Extent::scan(tensor) {
        Some(e) if e.min < e.max => NormalizationRange {
            min: e.min,
            max: e.max,
        },
        _ => NormalizationRange::UNIT,
    }
}

/// Range folded over per-channel planes of `width * height` points.
///
/// Planes starting past the end of the buffer are skipped and a truncated
/// last plane is scanned as far as it goes. A flat result keeps its min and
/// gets `max = min + 1`.
pub fn find_range_multi_channel(
    tensor: &[f32],
    channel_count: usize,
    width: usize,
    height: usize,
) -> NormalizationRange {
    let points = width * height;
    if tensor.is_empty() || points == 0 || channel_count == 0 {
        return NormalizationRange::UNIT;
    }

    let folded = (0..channel_count)
        .filter_map(|c| {
            let start = c * points;
            if start >= tensor.len() {
                return None;
            }
            let end = (start + points).min(tensor.len());
            Extent::scan(&tensor[start..end])
        })
        .reduce(Extent::merge);

    match folded {
        None => NormalizationRange::UNIT,
        Some(e) if e.min == e.max => {
            let max = e.min + 1.0;
            if max.is_finite() && max > e.min {
                NormalizationRange { min: e.min, max }
            } else {
                NormalizationRange::UNIT
            }
        }
        Some(e) => NormalizationRange {
            min: e.min,
            max: e.max,
        },
    }
}

/// Clamps `value` into `range` and rescales linearly to `[0, 1]`.
/// Non-finite values and unusable ranges map to `0.5`.
pub fn normalize(value: f32, range: NormalizationRange) -> f32 {
    if !value.is_finite() || !range.is_usable() {
        return 0.5;
    }
    let span = range.max - range.min;
    if !span.is_finite() {
        // min/max of opposite sign near f32::MAX; rescale in f64.
        let v = f64::from(value.clamp(range.min, range.max));
        let (lo, hi) = (f64::from(range.min), f64::from(range.max));
        return ((v - lo) / (hi - lo)) as f32;
    }
    (value.clamp(range.min, range.max) - range.min) / span
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_ignores_non_finite_values() {
        let r = find_range(&[f32::NAN, 2.0, f32::INFINITY, -3.0, f32::NEG_INFINITY]);
        assert_eq!(r, NormalizationRange { min: -3.0, max: 2.0 });
    }

    #[test]
    fn empty_or_all_invalid_tensor_yields_unit_range() {
        assert_eq!(find_range(&[]), NormalizationRange::UNIT);
        assert_eq!(find_range(&[f32::NAN, f32::INFINITY]), NormalizationRange::UNIT);
        assert_eq!(find_range(&[4.0, 4.0]), NormalizationRange::UNIT);
    }

    #[test]
    fn flat_multi_channel_range_is_widened_by_one() {
        let r = find_range_multi_channel(&[1.0, 1.0], 2, 1, 1);
        assert_eq!(r, NormalizationRange { min: 1.0, max: 2.0 });
    }

    #[test]
    fn multi_channel_skips_planes_past_the_buffer() {
        // 3 declared channels of 2 points, only 1.5 planes present
        let r = find_range_multi_channel(&[0.5, -1.0, 7.0], 3, 2, 1);
        assert_eq!(r, NormalizationRange { min: -1.0, max: 7.0 });
        assert_eq!(
            find_range_multi_channel(&[f32::NAN; 4], 2, 2, 1),
            NormalizationRange::UNIT
        );
    }

    #[test]
    fn normalize_maps_endpoints_and_clamps() {
        let r = NormalizationRange { min: -2.0, max: 6.0 };
        assert_eq!(normalize(-2.0, r), 0.0);
        assert_eq!(normalize(6.0, r), 1.0);
        assert_eq!(normalize(2.0, r), 0.5);
        assert_eq!(normalize(100.0, r), 1.0);
        assert_eq!(normalize(-100.0, r), 0.0);
    }

    #[test]
    fn normalize_degenerate_inputs_give_midpoint() {
        assert_eq!(normalize(f32::NAN, NormalizationRange::UNIT), 0.5);
        assert_eq!(normalize(1.0, NormalizationRange { min: 1.0, max: 1.0 }), 0.5);
        assert_eq!(
            normalize(1.0, NormalizationRange { min: 0.0, max: f32::INFINITY }),
            0.5
        );
    }

    #[test]
    fn extreme_range_stays_finite() {
        let r = find_range(&[f32::MIN, f32::MAX]);
        assert!(r.is_usable());
        let v = normalize(0.0, r);
        assert!((0.0..=1.0).contains(&v));
        assert_eq!(normalize(f32::MAX, r), 1.0);
    }
}
