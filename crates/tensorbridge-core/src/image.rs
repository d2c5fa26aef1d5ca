//! Host-side image abstractions: full-frame regions read during tensor
//! preparation, and scanline rows read and written while rendering.

use std::collections::HashMap;

use crate::Channel;

/// Integer bounding box, `x..r` by `y..t`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub r: i32,
    pub t: i32,
}

impl BBox {
    pub fn from_size(width: usize, height: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            r: i32::try_from(width).unwrap_or(i32::MAX),
            t: i32::try_from(height).unwrap_or(i32::MAX),
        }
    }

    pub fn width(&self) -> usize {
        usize::try_from(self.r - self.x).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        usize::try_from(self.t - self.y).unwrap_or(0)
    }
}

/// Random access to whole scanlines of an image, per channel.
pub trait ImageRegion {
    fn bbox(&self) -> BBox;

    fn has_channel(&self, channel: &Channel) -> bool;

    /// Scanline `y` (absolute) of `channel`; element 0 is column `bbox().x`.
    fn scanline(&self, channel: &Channel, y: i32) -> Option<&[f32]>;
}

/// Reads rows of an upstream image for pass-through.
pub trait RowSource {
    /// Fills `channels` of `out` over columns `x..r` of row `y`. Columns or
    /// channels the source does not cover come back as zero.
    fn fetch_row(&self, y: i32, x: i32, r: i32, channels: &[Channel], out: &mut Row);
}

/// An upstream image usable both for tensor preparation and pass-through.
pub trait SourceImage: ImageRegion + RowSource + Sync {}

impl<T: ImageRegion + RowSource + Sync> SourceImage for T {}

/// One output scanline over columns `x..r`, holding a float plane per channel.
#[derive(Clone, Debug)]
pub struct Row {
    x: i32,
    r: i32,
    planes: HashMap<Channel, Vec<f32>>,
}

impl Row {
    pub fn new(x: i32, r: i32) -> Self {
        Self {
            x,
            r: r.max(x),
            planes: HashMap::new(),
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn r(&self) -> i32 {
        self.r
    }

    pub fn width(&self) -> usize {
        usize::try_from(self.r - self.x).unwrap_or(0)
    }

    /// Plane of `channel`; element 0 is column `x()`.
    pub fn get(&self, channel: &Channel) -> Option<&[f32]> {
        self.planes.get(channel).map(Vec::as_slice)
    }

    /// Value at absolute column `col`, if the channel and column are present.
    pub fn value(&self, channel: &Channel, col: i32) -> Option<f32> {
        let idx = usize::try_from(col - self.x).ok()?;
        self.get(channel)?.get(idx).copied()
    }

    /// Writable plane of `channel`, created zero-filled on first use.
    pub fn writable(&mut self, channel: &Channel) -> &mut [f32] {
        let width = self.width();
        self.planes
            .entry(channel.clone())
            .or_insert_with(|| vec![0.0; width])
    }

    pub fn erase(&mut self, channels: &[Channel]) {
        for channel in channels {
            self.writable(channel).fill(0.0);
        }
    }

    /// Copies `channels` over the overlap of `x..r` with both rows. A channel
    /// missing from `src` is written as zero.
    pub fn copy_from(&mut self, src: &Row, channels: &[Channel], x: i32, r: i32) {
        let start = x.max(self.x).max(src.x);
        let end = r.min(self.r).min(src.r);
        for channel in channels {
            let src_plane = src.get(channel);
            let dst_x = self.x;
            let dst = self.writable(channel);
            for col in start..end {
                let value = src_plane
                    .and_then(|p| p.get((col - src.x) as usize).copied())
                    .unwrap_or(0.0);
                dst[(col - dst_x) as usize] = value;
            }
        }
    }
}

/// A simple in-memory planar image: one row-major plane per channel.
#[derive(Clone, Debug)]
pub struct PlanarImage {
    bbox: BBox,
    planes: Vec<(Channel, Vec<f32>)>,
}

impl PlanarImage {
    pub fn new(bbox: BBox) -> Self {
        Self {
            bbox,
            planes: Vec::new(),
        }
    }

    /// Sets (or replaces) the plane of `channel`. The plane is resized to the
    /// bbox area, zero-padding short input.
    pub fn with_plane(mut self, channel: Channel, mut data: Vec<f32>) -> Self {
        data.resize(self.bbox.width() * self.bbox.height(), 0.0);
        match self.planes.iter_mut().find(|(c, _)| *c == channel) {
            Some((_, plane)) => *plane = data,
            None => self.planes.push((channel, data)),
        }
        self
    }

    /// Builds a plane by evaluating `f(col, row)` in bbox-relative coordinates.
    pub fn with_fn(self, channel: Channel, f: impl Fn(usize, usize) -> f32) -> Self {
        let (w, h) = (self.bbox.width(), self.bbox.height());
        let data = (0..h)
            .flat_map(|row| (0..w).map(move |col| (col, row)))
            .map(|(col, row)| f(col, row))
            .collect();
        self.with_plane(channel, data)
    }

    fn plane(&self, channel: &Channel) -> Option<&[f32]> {
        self.planes
            .iter()
            .find(|(c, _)| c == channel)
            .map(|(_, p)| p.as_slice())
    }
}

impl ImageRegion for PlanarImage {
    fn bbox(&self) -> BBox {
        self.bbox
    }

    fn has_channel(&self, channel: &Channel) -> bool {
        self.plane(channel).is_some()
    }

    fn scanline(&self, channel: &Channel, y: i32) -> Option<&[f32]> {
        if y < self.bbox.y || y >= self.bbox.t {
            return None;
        }
        let w = self.bbox.width();
        let start = (y - self.bbox.y) as usize * w;
        self.plane(channel)?.get(start..start + w)
    }
}

impl RowSource for PlanarImage {
    fn fetch_row(&self, y: i32, x: i32, r: i32, channels: &[Channel], out: &mut Row) {
        let out_x = out.x();
        let lo = x.max(out_x).max(self.bbox.x);
        let hi = r.min(out.r()).min(self.bbox.r);
        for channel in channels {
            let line = self.scanline(channel, y);
            let dst = out.writable(channel);
            dst.fill(0.0);
            let Some(line) = line else { continue };
            for col in lo..hi {
                dst[(col - out_x) as usize] = line[(col - self.bbox.x) as usize];
            }
        }
    }
}
