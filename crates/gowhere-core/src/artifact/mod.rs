mod read;

pub use read::{ArtifactContext, read_artifact, read_bytes};
