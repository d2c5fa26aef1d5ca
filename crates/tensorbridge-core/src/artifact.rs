#[derive(Clone, Debug)]
pub enum ModelArtifact {
    OnnxPath(std::path::PathBuf),
}

impl ModelArtifact {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ModelArtifact::OnnxPath(path) => path,
        }
    }
}
