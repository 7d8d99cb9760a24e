//! Model lifecycle controller
//!
//! Owns the "current model" state and walks it through
//! `Idle -> Loading -> Idle(model) | Idle(error)`:
//! - [`ModelLifecycle::submit_file`] disposes whatever is displayed and
//!   dispatches the new file under a fresh [`RequestId`]
//! - [`ModelLifecycle::on_load_success`] normalizes the loader output,
//!   floor-aligns it, attaches it, starts the first clip, and frames the camera
//! - [`ModelLifecycle::on_load_error`] clears the loading flag and alerts
//! - [`ModelLifecycle::dispose_current`] releases every resource of the model
//!
//! Only the most recently dispatched request may complete. Completions that
//! carry an older id are discarded without touching the scene, so two
//! overlapping submissions can never leave two models attached.

use glam::Vec3;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::format::{LoadRequest, ModelFormat, RequestId};
use crate::framing::frame_floor_aligned;
use crate::host::{
    AnimationClip, LoaderRegistry, LoaderResult, MaterialSpec, SceneHost, StatusMessage,
    StatusSink,
};

/// Name the current model carries in the scene graph
pub const MODEL_TAG: &str = "LoadedModel";

/// The model currently attached to the scene
#[derive(Debug, Clone)]
pub struct LoadedModel<N, C> {
    pub root: N,
    pub request: RequestId,
    pub file_name: String,
    pub format: ModelFormat,
    /// Every clip the file listed, in file order
    pub clips: Vec<AnimationClip<C>>,
    /// Name of the clip that is playing (always the first one, if any)
    pub active_clip: Option<String>,
    pub bounding_size: Vec3,
    /// Bounding box center before floor alignment
    pub bounding_center: Vec3,
}

impl<N, C> LoadedModel<N, C> {
    /// Clips listed by the file that are never bound
    pub fn ignored_clip_count(&self) -> usize {
        self.clips.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone)]
struct PendingLoad {
    id: RequestId,
    file_name: String,
    format: ModelFormat,
}

/// Per-viewer state
#[derive(Debug, Clone)]
pub struct ViewerState<N, C> {
    pub current: Option<LoadedModel<N, C>>,
    pub is_loading: bool,
    /// Id of the most recently dispatched request
    pub latest_request: Option<RequestId>,
    pending: Option<PendingLoad>,
}

impl<N, C> Default for ViewerState<N, C> {
    fn default() -> Self {
        Self {
            current: None,
            is_loading: false,
            latest_request: None,
            pending: None,
        }
    }
}

/// Drives loading, framing, and disposal of the displayed model
#[derive(Debug, Clone)]
pub struct ModelLifecycle<N, C> {
    state: ViewerState<N, C>,
    config: ViewerConfig,
    next_request: u64,
}

impl<N, C> ModelLifecycle<N, C>
where
    N: Clone + PartialEq + std::fmt::Debug,
    C: Clone,
{
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            state: ViewerState::default(),
            config,
            next_request: 1,
        }
    }

    pub fn state(&self) -> &ViewerState<N, C> {
        &self.state
    }

    pub fn current(&self) -> Option<&LoadedModel<N, C>> {
        self.state.current.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Material for formats that carry none
    pub fn default_material(&self) -> MaterialSpec {
        MaterialSpec::matte(self.config.scene.default_material_color)
    }

    fn is_pending(&self, id: RequestId) -> bool {
        self.state.pending.as_ref().is_some_and(|p| p.id == id)
    }

    /// Accept a picked file: dispose the current model and dispatch the file
    /// to its loader. Unsupported extensions are rejected before anything
    /// else happens.
    pub fn submit_file<H, L, S>(
        &mut self,
        request: LoadRequest,
        loaders: &mut L,
        scene: &mut H,
        status: &mut S,
    ) -> Result<RequestId, ViewerError>
    where
        H: SceneHost<Node = N, Clip = C>,
        L: LoaderRegistry,
        S: StatusSink,
    {
        let format = match request.format() {
            Ok(format) => format,
            Err(err) => {
                warn!(file = %request.file_name, "Rejected file: {}", err);
                status.report(StatusMessage::Error {
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        self.dispose_current(scene, status);

        let id = RequestId(self.next_request);
        self.next_request += 1;
        if let Some(previous) = self.state.pending.take() {
            info!(
                previous = %previous.id,
                superseded_by = %id,
                "Superseding in-flight load of {}",
                previous.file_name
            );
        }
        self.state.latest_request = Some(id);
        self.state.pending = Some(PendingLoad {
            id,
            file_name: request.file_name.clone(),
            format,
        });
        self.state.is_loading = true;

        info!(
            request = %id,
            file = %request.file_name,
            %format,
            bytes = request.bytes.len(),
            "Dispatching model load"
        );
        status.report(StatusMessage::Loading {
            file_name: request.file_name.clone(),
        });

        if let Err(err) = loaders.dispatch(id, request) {
            self.on_load_error(id, err.clone(), status);
            return Err(err);
        }
        Ok(id)
    }

    /// Loader progress; may be called any number of times before the
    /// terminal callback.
    pub fn on_load_progress<S: StatusSink>(
        &mut self,
        id: RequestId,
        loaded: u64,
        total: u64,
        status: &mut S,
    ) {
        if !self.is_pending(id) {
            return;
        }
        status.report(StatusMessage::progress(loaded, total));
    }

    /// Loader finished. Stale results are discarded; malformed ones are
    /// reported like a loader failure and returned as the error.
    pub fn on_load_success<H, S>(
        &mut self,
        id: RequestId,
        result: LoaderResult<N, C>,
        scene: &mut H,
        status: &mut S,
    ) -> Result<(), ViewerError>
    where
        H: SceneHost<Node = N, Clip = C>,
        S: StatusSink,
    {
        if !self.is_pending(id) {
            debug!(request = %id, "Discarding stale load result");
            if let LoaderResult::GraphWithAnimations { root: Some(root), .. } = result {
                release_subtree(scene, &root);
                scene.discard(&root);
            }
            return Ok(());
        }
        let Some(pending) = self.state.pending.take() else {
            return Ok(());
        };

        match self.attach(pending, result, scene, status) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.fail(id, &err, status);
                Err(err)
            }
        }
    }

    /// Loader failed. Stale failures are ignored.
    pub fn on_load_error<S: StatusSink>(&mut self, id: RequestId, cause: ViewerError, status: &mut S) {
        if !self.is_pending(id) {
            debug!(request = %id, "Ignoring stale load error: {}", cause);
            return;
        }
        self.state.pending = None;
        self.fail(id, &cause, status);
    }

    fn fail<S: StatusSink>(&mut self, id: RequestId, cause: &ViewerError, status: &mut S) {
        self.state.is_loading = false;
        error!(request = %id, "Model load failed: {}", cause);
        status.report(StatusMessage::Error {
            message: cause.to_string(),
        });
        status.alert(&format!("Could not load the model.\n\n{}", cause));
    }

    fn attach<H, S>(
        &mut self,
        pending: PendingLoad,
        result: LoaderResult<N, C>,
        scene: &mut H,
        status: &mut S,
    ) -> Result<(), ViewerError>
    where
        H: SceneHost<Node = N, Clip = C>,
        S: StatusSink,
    {
        let (root, clips) = match result {
            LoaderResult::GraphWithAnimations {
                root: Some(root),
                clips,
            } => (root, clips),
            LoaderResult::GraphWithAnimations { root: None, .. } => {
                return Err(ViewerError::MalformedResult(
                    "file does not contain a scene".to_string(),
                ));
            }
            LoaderResult::BareGeometry { parts } => {
                let parts: Vec<_> = parts.into_iter().filter(|p| !p.is_empty()).collect();
                if parts.is_empty() {
                    return Err(ViewerError::MalformedResult(
                        "file does not contain any triangles".to_string(),
                    ));
                }
                let material = self.default_material();
                (scene.spawn_geometry(parts, &material), Vec::new())
            }
        };

        let Some(bounds) = scene.compute_bounding_box(&root) else {
            release_subtree(scene, &root);
            scene.discard(&root);
            return Err(ViewerError::MalformedResult(
                "model has no renderable geometry".to_string(),
            ));
        };

        if let Some(stray) = scene.find_by_tag(MODEL_TAG) {
            warn!(node = ?stray, "Removing untracked model left in the scene");
            release_subtree(scene, &stray);
            scene.remove_subtree(&stray);
        }

        scene.translate(&root, bounds.floor_alignment_offset());
        scene.add_subtree(&root, MODEL_TAG);

        // First clip wins; the rest stay listed but are never bound
        let active_clip = match clips.first() {
            Some(clip) => {
                if scene.play_animation(&root, &clip.handle, self.config.animation.repeat) {
                    Some(clip.name.clone())
                } else {
                    warn!(clip = %clip.name, "Model has no animation target for its first clip");
                    None
                }
            }
            None => None,
        };
        if clips.len() > 1 {
            debug!(
                count = clips.len(),
                "Ignoring {} additional animation clip(s)",
                clips.len() - 1
            );
        }

        let size = bounds.size();
        scene.set_camera(frame_floor_aligned(size, &self.config.camera));

        match &active_clip {
            Some(name) => status.report(StatusMessage::PlayingAnimation { name: name.clone() }),
            None => status.report(StatusMessage::LoadedStatic),
        }
        info!(
            request = %pending.id,
            file = %pending.file_name,
            size = ?size,
            clips = clips.len(),
            "Model attached"
        );

        self.state.current = Some(LoadedModel {
            root,
            request: pending.id,
            file_name: pending.file_name,
            format: pending.format,
            clips,
            active_clip,
            bounding_size: size,
            bounding_center: bounds.center(),
        });
        self.state.is_loading = false;
        Ok(())
    }

    /// Release the current model's resources and remove it from the scene.
    /// Does nothing when no model is displayed.
    pub fn dispose_current<H, S>(&mut self, scene: &mut H, status: &mut S)
    where
        H: SceneHost<Node = N, Clip = C>,
        S: StatusSink,
    {
        let Some(model) = self.state.current.take() else {
            return;
        };

        if model.active_clip.is_some() {
            scene.stop_animation(&model.root);
        }
        let released = release_subtree(scene, &model.root);
        scene.remove_subtree(&model.root);

        info!(
            file = %model.file_name,
            released,
            "Model disposed"
        );
        status.report(StatusMessage::Cleared);
    }

    /// Put the camera back on the framing computed for the current model
    pub fn reframe<H>(&self, scene: &mut H) -> bool
    where
        H: SceneHost<Node = N, Clip = C>,
    {
        match &self.state.current {
            Some(model) => {
                scene.set_camera(frame_floor_aligned(model.bounding_size, &self.config.camera));
                true
            }
            None => false,
        }
    }
}

/// Release every distinct resource owned by any node under `root`.
/// Returns the number of resources released.
fn release_subtree<H: SceneHost>(scene: &mut H, root: &H::Node) -> usize {
    let mut seen: HashSet<H::Resource> = HashSet::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        for resource in scene.owned_resources(&node) {
            if seen.insert(resource.clone()) {
                scene.release(&resource);
            }
        }
        stack.extend(scene.children(&node));
    }
    seen.len()
}
