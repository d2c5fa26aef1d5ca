use bytes::Bytes;
use smallvec::SmallVec;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda { device_id: u32 },
}

impl Device {
    /// Maps the host's "use GPU" toggle onto a device.
    pub fn from_gpu_hint(use_gpu: bool) -> Self {
        if use_gpu {
            Device::Cuda { device_id: 0 }
        } else {
            Device::Cpu
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Device::Cpu => "CPU".to_string(),
            Device::Cuda { device_id } => format!("GPU (CUDA:{device_id})"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    F32,
    F16,
    I64,
    I32,
    U8,
}

impl DType {
    pub fn byte_size(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F16 => 2,
            DType::I64 => 8,
            DType::I32 => 4,
            DType::U8 => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }

    /// Converts signed engine dims; any negative (dynamic) entry yields `None`.
    pub fn from_i64(d: &[i64]) -> Option<Self> {
        d.iter()
            .map(|v| usize::try_from(*v).ok())
            .collect::<Option<SmallVec<_>>>()
            .map(Self)
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn numel(&self) -> usize {
        self.0.iter().product::<usize>().max(1)
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }
}

#[derive(Clone, Debug)]
pub struct TensorDesc {
    pub dtype: DType,
    pub shape: Shape,
}

/// A CPU-resident tensor as exchanged with an inference engine.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub desc: TensorDesc,
    pub bytes: Bytes,
}

impl Tensor {
    pub fn from_cpu_bytes(dtype: DType, shape: Shape, bytes: Bytes) -> Self {
        Self {
            desc: TensorDesc { dtype, shape },
            bytes,
        }
    }

    pub fn from_f32(shape: Shape, data: &[f32]) -> Self {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::from_cpu_bytes(DType::F32, shape, Bytes::from(bytes))
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Decodes the storage as little-endian `f32`s. `None` for other dtypes
    /// or a byte length that is not a whole number of elements.
    pub fn to_f32_vec(&self) -> Option<Vec<f32>> {
        if self.desc.dtype != DType::F32 || self.bytes.len() % 4 != 0 {
            return None;
        }
        Some(
            self.bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        )
    }
}
