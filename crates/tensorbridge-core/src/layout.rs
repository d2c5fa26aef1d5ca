use std::fmt;

/// Spatial and channel layout of a model output tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    pub width: usize,
    pub height: usize,
    pub channel_count: usize,
    pub single_channel: bool,
}

impl OutputLayout {
    pub fn new(width: usize, height: usize, channel_count: usize) -> Self {
        Self {
            width,
            height,
            channel_count,
            single_channel: channel_count == 1,
        }
    }

    /// Interprets an output shape: rank 4 is NCHW, rank 3 is CHW and rank 2
    /// is HW with a single channel. Any other rank has no defined layout.
    pub fn from_shape(dims: &[usize]) -> Option<Self> {
        match *dims {
            [_, c, h, w] => Some(Self::new(w, h, c)),
            [c, h, w] => Some(Self::new(w, h, c)),
            [h, w] => Some(Self::new(w, h, 1)),
            _ => None,
        }
    }

    /// Element count a tensor of this layout must hold.
    pub fn element_count(&self) -> usize {
        self.channel_count * self.height * self.width
    }
}

impl fmt::Display for OutputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} with {} channel(s) ({})",
            self.width,
            self.height,
            self.channel_count,
            if self.single_channel {
                "single-channel"
            } else {
                "multi-channel"
            }
        )
    }
}
