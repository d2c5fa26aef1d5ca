//! Planar image region → NCHW (batch 1) float tensor.

use tracing::trace;

use crate::{BridgeError, Channel, ImageRegion, Result};

/// Converts a region into a `[1, channels, height, width]` tensor buffer.
///
/// Plane `c` is read from the standard channel at slot `c` (red, green,
/// blue, alpha). Planes past alpha are left zero, as are planes of channels
/// the region does not carry. No resampling: pixel `(w, h)` is read from
/// column `bbox.x + w` of scanline `bbox.y + h`.
pub fn to_nchw<R: ImageRegion + ?Sized>(
    region: &R,
    width: usize,
    height: usize,
    channels: usize,
) -> Result<Vec<f32>> {
    let mut tensor = Vec::new();
    to_nchw_into(region, width, height, channels, &mut tensor)?;
    Ok(tensor)
}

/// Like [`to_nchw`], reusing `tensor`'s allocation. The buffer is resized to
/// exactly `channels * height * width` and zeroed before writing.
pub fn to_nchw_into<R: ImageRegion + ?Sized>(
    region: &R,
    width: usize,
    height: usize,
    channels: usize,
    tensor: &mut Vec<f32>,
) -> Result<()> {
    if width == 0 || height == 0 || channels == 0 {
        return Err(BridgeError::invalid_input(format!(
            "invalid dimensions for tensor conversion: {width}x{height} C:{channels}"
        )));
    }

    let plane_len = height * width;
    tensor.clear();
    tensor.resize(channels * plane_len, 0.0);

    let bbox = region.bbox();
    for c in 0..channels {
        let Some(channel) = Channel::from_plane_index(c) else {
            continue;
        };
        if !region.has_channel(&channel) {
            trace!(%channel, plane = c, "channel missing from region, plane left zero");
            continue;
        }

        let plane = &mut tensor[c * plane_len..(c + 1) * plane_len];
        for (h, dst_row) in plane.chunks_exact_mut(width).enumerate() {
            let Some(src_row) = region.scanline(&channel, bbox.y + h as i32) else {
                continue;
            };
            let n = width.min(src_row.len());
            dst_row[..n].copy_from_slice(&src_row[..n]);
        }
    }

    Ok(())
}
