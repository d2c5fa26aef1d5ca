//! Maps an output tensor back onto the channels of a host scanline.

use crate::{normalize, Channel, NormalizationRange, OutputLayout, Row};

/// How one requested output channel is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelSource {
    /// Read tensor channel `n`.
    Tensor(usize),
    PassThrough,
    Zero,
}

/// Decides where `channel` comes from under `layout`.
pub fn classify(channel: &Channel, layout: &OutputLayout) -> ChannelSource {
    let Some(slot) = channel.standard_index() else {
        return match channel.component_index() {
            Some(c) if c < layout.channel_count => {
                ChannelSource::Tensor(if layout.single_channel { 0 } else { c })
            }
            _ => ChannelSource::Zero,
        };
    };

    if layout.single_channel {
        return match channel {
            Channel::Red => ChannelSource::Tensor(0),
            Channel::Green | Channel::Blue => ChannelSource::Zero,
            _ => ChannelSource::PassThrough,
        };
    }

    if slot < layout.channel_count {
        ChannelSource::Tensor(slot)
    } else {
        ChannelSource::PassThrough
    }
}

/// Bounds-checked tensor read at `(x, y)` of `channel`.
///
/// Out-of-range coordinates and non-finite values read as `0.0` without
/// normalization; otherwise the raw value is normalized when a range is given.
pub fn tensor_value(
    tensor: &[f32],
    layout: &OutputLayout,
    x: i32,
    y: i32,
    channel: usize,
    range: Option<NormalizationRange>,
) -> f32 {
    let (Ok(xu), Ok(yu)) = (usize::try_from(x), usize::try_from(y)) else {
        return 0.0;
    };
    if xu >= layout.width || yu >= layout.height {
        return 0.0;
    }
    let plane = if layout.single_channel { 0 } else { channel };
    let idx = plane * layout.height * layout.width + yu * layout.width + xu;
    match tensor.get(idx) {
        Some(v) if v.is_finite() => match range {
            Some(range) => normalize(*v, range),
            None => *v,
        },
        _ => 0.0,
    }
}

/// Writes row `y`, columns `x..r`, of `channels` into `out`.
///
/// Rows outside the output height are copied from `input`. Within the row
/// each channel is filled from the tensor, from `input`, or with zero as
/// [`classify`] decides. Past the output width, tensor-mapped columns are
/// zero and pass-through channels keep copying from `input`.
#[allow(clippy::too_many_arguments)]
pub fn map_row(
    tensor: &[f32],
    layout: &OutputLayout,
    range: Option<NormalizationRange>,
    y: i32,
    x: i32,
    r: i32,
    channels: &[Channel],
    input: &Row,
    out: &mut Row,
) {
    let x = x.max(out.x());
    let r = r.min(out.r());
    if x >= r {
        return;
    }

    let in_rows = usize::try_from(y).is_ok_and(|yu| yu < layout.height);
    if !in_rows {
        out.copy_from(input, channels, x, r);
        return;
    }

    let width = i32::try_from(layout.width).unwrap_or(i32::MAX);
    let end = r.min(width).max(x);
    let out_x = out.x();

    for channel in channels {
        match classify(channel, layout) {
            ChannelSource::Tensor(c) => {
                let dst = out.writable(channel);
                for col in x..end {
                    dst[(col - out_x) as usize] = tensor_value(tensor, layout, col, y, c, range);
                }
                dst[(end - out_x) as usize..(r - out_x) as usize].fill(0.0);
            }
            ChannelSource::PassThrough => out.copy_from(input, std::slice::from_ref(channel), x, r),
            ChannelSource::Zero => {
                out.writable(channel)[(x - out_x) as usize..(r - out_x) as usize].fill(0.0);
            }
        }
    }
}
