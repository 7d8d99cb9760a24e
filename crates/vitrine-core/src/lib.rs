//! Vitrine Core - Model lifecycle, framing, and mesh readers
//!
//! This crate holds everything about displaying a model that does not depend
//! on a particular rendering engine:
//! - The model lifecycle controller (submit, load, frame, dispose)
//! - Collaborator traits for the scene host, loader registry, and status surface
//! - Bounding box and camera framing math
//! - STL, OBJ, and binary FBX mesh readers
//! - Viewer configuration

pub mod config;
pub mod error;
pub mod format;
pub mod framing;
pub mod geometry;
pub mod host;
pub mod lifecycle;
pub mod mesh;

#[cfg(test)]
mod mock;

pub use glam;

pub use config::{load_config, ViewerConfig};
pub use error::ViewerError;
pub use format::{LoadRequest, ModelFormat, RequestId};
pub use framing::{clip_range, CameraPose, ClipRange};
pub use geometry::Aabb;
pub use host::{
    AnimationClip, LoaderRegistry, LoaderResult, MaterialSpec, SceneHost, StatusMessage,
    StatusSink,
};
pub use lifecycle::{LoadedModel, ModelLifecycle, ViewerState, MODEL_TAG};
pub use mesh::{MeshData, MeshError};
