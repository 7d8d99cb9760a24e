//! Supported model formats and load requests

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ViewerError;

/// A model file format the viewer knows how to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Glb,
    Gltf,
    Fbx,
    Obj,
    Stl,
}

impl ModelFormat {
    /// Every registered format, in the order they are offered to the user
    pub const ALL: [ModelFormat; 5] = [
        ModelFormat::Glb,
        ModelFormat::Gltf,
        ModelFormat::Fbx,
        ModelFormat::Obj,
        ModelFormat::Stl,
    ];

    /// Look up a format by file extension (without the dot, any case)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "glb" => Some(Self::Glb),
            "gltf" => Some(Self::Gltf),
            "fbx" => Some(Self::Fbx),
            "obj" => Some(Self::Obj),
            "stl" => Some(Self::Stl),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Glb => "glb",
            Self::Gltf => "gltf",
            Self::Fbx => "fbx",
            Self::Obj => "obj",
            Self::Stl => "stl",
        }
    }

    /// glTF variants come back from the loader as a full scene graph with
    /// animations; everything else is plain geometry.
    pub fn is_scene_graph(&self) -> bool {
        matches!(self, Self::Glb | Self::Gltf)
    }

    /// Accept string for an HTML file input, e.g. ".glb,.gltf,.fbx,.obj,.stl"
    pub fn accept_string() -> String {
        Self::ALL
            .iter()
            .map(|f| format!(".{}", f.extension()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension().to_ascii_uppercase())
    }
}

/// Sequence number attached to every dispatched load
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A file the user picked, waiting to be dispatched to a loader
#[derive(Clone)]
pub struct LoadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Lowercased text after the last '.' of the file name
    pub extension: String,
}

impl LoadRequest {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let extension = extension_of(&file_name);
        Self {
            file_name,
            bytes,
            extension,
        }
    }

    /// Resolve the request's extension against the registered formats
    pub fn format(&self) -> Result<ModelFormat, ViewerError> {
        ModelFormat::from_extension(&self.extension).ok_or_else(|| ViewerError::UnsupportedFormat {
            extension: self.extension.clone(),
        })
    }
}

impl fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .field("extension", &self.extension)
            .finish()
    }
}

fn extension_of(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}
