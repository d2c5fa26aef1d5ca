use std::borrow::Cow;
use std::fmt;

/// Identity of an image channel as seen by the host.
///
/// The four standard channels occupy fixed semantic slots; anything else is
/// a named layer channel such as `"depth.Z"` or `"motion.x"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
    Named(String),
}

pub const RGB: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];
pub const RGBA: [Channel; 4] = [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha];

impl Channel {
    /// Builds a channel from its `layer.component` name. The `rgba` layer
    /// resolves to the standard channels.
    pub fn from_name(name: &str) -> Self {
        match name {
            "rgba.red" => Channel::Red,
            "rgba.green" => Channel::Green,
            "rgba.blue" => Channel::Blue,
            "rgba.alpha" => Channel::Alpha,
            other => Channel::Named(other.to_string()),
        }
    }

    /// Standard channel for NCHW plane `index` (0=red .. 3=alpha).
    pub fn from_plane_index(index: usize) -> Option<Self> {
        RGBA.get(index).cloned()
    }

    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Channel::Red => Cow::Borrowed("rgba.red"),
            Channel::Green => Cow::Borrowed("rgba.green"),
            Channel::Blue => Cow::Borrowed("rgba.blue"),
            Channel::Alpha => Cow::Borrowed("rgba.alpha"),
            Channel::Named(name) => Cow::Borrowed(name.as_str()),
        }
    }

    /// Fixed slot of a standard channel; `None` for named channels.
    pub fn standard_index(&self) -> Option<usize> {
        match self {
            Channel::Red => Some(0),
            Channel::Green => Some(1),
            Channel::Blue => Some(2),
            Channel::Alpha => Some(3),
            Channel::Named(_) => None,
        }
    }

    pub fn is_standard(&self) -> bool {
        self.standard_index().is_some()
    }

    pub fn component_index(&self) -> Option<usize> {
        component_index(&self.name())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name())
    }
}

/// Component slot selected by the token after the last `.` of a channel name:
/// `red|r|x` → 0, `green|g|y` → 1, `blue|b|z` → 2, `alpha|a|w` → 3.
pub fn component_index(name: &str) -> Option<usize> {
    let (_, component) = name.rsplit_once('.')?;
    match component {
        "red" | "r" | "x" => Some(0),
        "green" | "g" | "y" => Some(1),
        "blue" | "b" | "z" => Some(2),
        "alpha" | "a" | "w" => Some(3),
        _ => None,
    }
}
