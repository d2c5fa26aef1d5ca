use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IOName(pub String);

impl IOName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IOName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug)]
pub struct TensorSpec {
    pub name: IOName,
    pub dtype: super::DType,
    pub dims: Vec<Option<usize>>, // None = dynamic
}

impl TensorSpec {
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Dims in engine notation, `-1` marking a dynamic axis.
    pub fn dims_i64(&self) -> Vec<i64> {
        self.dims
            .iter()
            .map(|d| d.map_or(-1, |v| v as i64))
            .collect()
    }

    /// Only `Some` when every axis is static.
    pub fn static_dims(&self) -> Option<Vec<usize>> {
        self.dims.iter().copied().collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ModelSpec {
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
}
