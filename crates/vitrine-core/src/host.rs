//! Collaborator contracts for the model lifecycle
//!
//! The lifecycle never touches a renderer directly. It talks to three
//! collaborators, each passed in by reference on every call:
//! - [`SceneHost`]: owns the scene graph, camera, and GPU resources
//! - [`LoaderRegistry`]: turns a [`LoadRequest`] into a [`LoaderResult`] later
//! - [`StatusSink`]: the user-visible status line and alerts

use glam::Vec3;
use std::fmt;
use std::hash::Hash;

use crate::error::ViewerError;
use crate::format::{LoadRequest, RequestId};
use crate::framing::CameraPose;
use crate::geometry::Aabb;
use crate::mesh::MeshData;

/// A named animation clip as listed by the source file
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip<C> {
    pub name: String,
    pub handle: C,
}

/// Material applied to geometry that arrives without one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialSpec {
    /// sRGB base color (0.0-1.0)
    pub base_color: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
}

impl MaterialSpec {
    pub fn matte(base_color: [f32; 3]) -> Self {
        Self {
            base_color,
            metallic: 0.0,
            roughness: 0.8,
        }
    }
}

/// What a format loader hands back, before normalization
pub enum LoaderResult<N, C> {
    /// A scene graph with optional animations (glTF/GLB).
    /// `root` is `None` when the file contained no scene.
    GraphWithAnimations {
        root: Option<N>,
        clips: Vec<AnimationClip<C>>,
    },
    /// Bare triangle geometry without a node or material (STL, OBJ, FBX)
    BareGeometry { parts: Vec<MeshData> },
}

impl<N: fmt::Debug, C> fmt::Debug for LoaderResult<N, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GraphWithAnimations { root, clips } => f
                .debug_struct("GraphWithAnimations")
                .field("root", root)
                .field("clips", &clips.iter().map(|c| c.name.as_str()).collect::<Vec<_>>())
                .finish(),
            Self::BareGeometry { parts } => f
                .debug_struct("BareGeometry")
                .field("parts", &parts.len())
                .finish(),
        }
    }
}

/// The rendering host's scene graph
pub trait SceneHost {
    /// Handle to a node in the scene graph
    type Node: Clone + PartialEq + fmt::Debug;
    /// Handle to a GPU-side resource (geometry or material) owned by a node
    type Resource: Clone + Eq + Hash + fmt::Debug;
    /// Handle to an animation clip
    type Clip: Clone;

    /// Build a detached node holding `parts`, each with `material`
    fn spawn_geometry(&mut self, parts: Vec<MeshData>, material: &MaterialSpec) -> Self::Node;

    /// Attach a detached subtree to the scene under the given tag
    fn add_subtree(&mut self, node: &Self::Node, tag: &str);

    /// Detach and destroy an attached subtree
    fn remove_subtree(&mut self, node: &Self::Node);

    /// Destroy a subtree that was never attached
    fn discard(&mut self, node: &Self::Node);

    fn find_by_tag(&self, tag: &str) -> Option<Self::Node>;

    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Geometry and materials owned by this node alone (not its children)
    fn owned_resources(&self, node: &Self::Node) -> Vec<Self::Resource>;

    fn release(&mut self, resource: &Self::Resource);

    /// Bounds of all geometry under `node`, in the node's parent space.
    /// `None` when the subtree holds no geometry.
    fn compute_bounding_box(&self, node: &Self::Node) -> Option<Aabb>;

    fn translate(&mut self, node: &Self::Node, offset: Vec3);

    /// Bind `clip` to an animation player on the subtree and start it.
    /// Returns false when the subtree has nothing the clip can drive.
    fn play_animation(&mut self, node: &Self::Node, clip: &Self::Clip, repeat: bool) -> bool;

    /// Stop and detach any animation player bound on the subtree
    fn stop_animation(&mut self, node: &Self::Node);

    fn set_camera(&mut self, pose: CameraPose);
}

/// Dispatches load requests to format-specific loaders.
///
/// Completion is reported back asynchronously by whoever drives the
/// registry, through the lifecycle's `on_load_*` methods with the same id.
pub trait LoaderRegistry {
    fn dispatch(&mut self, id: RequestId, request: LoadRequest) -> Result<(), ViewerError>;
}

/// User-visible status messages
#[derive(Debug, Clone, PartialEq)]
pub enum StatusMessage {
    ReadingFile { file_name: String },
    /// `percent` is `None` when the total size is unknown
    Progress { percent: Option<u8>, loaded: u64 },
    Loading { file_name: String },
    PlayingAnimation { name: String },
    LoadedStatic,
    Cleared,
    Error { message: String },
}

impl StatusMessage {
    /// Progress message from a byte count and an optional total
    pub fn progress(loaded: u64, total: u64) -> Self {
        let percent = (total > 0).then(|| ((loaded.min(total) * 100) / total) as u8);
        Self::Progress { percent, loaded }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadingFile { file_name } => write!(f, "Reading {}...", file_name),
            Self::Progress {
                percent: Some(p), ..
            } => write!(f, "Loading: {}%", p),
            Self::Progress {
                percent: None,
                loaded,
            } => write!(f, "Loading: {} KB", loaded / 1024),
            Self::Loading { file_name } => write!(f, "Loading {}...", file_name),
            Self::PlayingAnimation { name } => write!(f, "Model loaded, playing animation: {}", name),
            Self::LoadedStatic => write!(f, "Model loaded (static)."),
            Self::Cleared => write!(f, "Model removed, memory released."),
            Self::Error { message } => write!(f, "Error: {}", message),
        }
    }
}

/// Receives status updates. `alert` interrupts the user and is reserved for
/// load failures.
pub trait StatusSink {
    fn report(&mut self, message: StatusMessage);

    fn alert(&mut self, text: &str);
}
