//! Model loading and the Bevy scene host
//!
//! [`ModelLoader`] turns load requests into jobs: glTF/GLB files go through
//! the asset server (via the `memory://` source), STL/OBJ/FBX are parsed on
//! the async compute pool. Jobs are polled every frame and their results are
//! handed to the [`ModelLifecycle`], which manipulates the world through
//! [`WorldScene`].

use bevy::asset::io::memory::Dir;
use bevy::asset::{LoadState, RecursiveDependencyLoadState, RenderAssetUsages};
use bevy::gltf::Gltf;
use bevy::math::Affine3A;
use bevy::mesh::Indices;
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;
use bevy::scene::{SceneInstance, SceneSpawner};
use bevy::tasks::{block_on, futures_lite::future, AsyncComputeTaskPool, Task};
use std::path::Path;
use vitrine_core::host::AnimationClip as ModelClip;
use vitrine_core::mesh::read_mesh;
use vitrine_core::{
    clip_range, glam, Aabb, CameraPose, LoadRequest, LoaderRegistry, LoaderResult, MaterialSpec, MeshData,
    MeshError, ModelLifecycle, RequestId, SceneHost, StatusMessage, StatusSink, ViewerError,
};

use crate::app::{MemoryAssets, ViewerSettings, MEMORY_SOURCE};
use crate::file_picker::{FileEvent, PendingFileEvents};
use crate::scene::{CameraSettings, MainCamera};
use crate::ui::StatusLine;

pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<ViewerSettings>()
            .map(|s| s.0.clone())
            .unwrap_or_default();

        app.insert_resource(ModelViewer(ModelLifecycle::new(config)))
            .init_resource::<ModelLoader>()
            .init_resource::<ViewerActions>()
            .add_systems(
                Update,
                (process_file_events, poll_model_loads, apply_viewer_actions).chain(),
            );
    }
}

pub type ViewerLifecycle = ModelLifecycle<Entity, Handle<AnimationClip>>;

/// The lifecycle controller for the displayed model
#[derive(Resource)]
pub struct ModelViewer(pub ViewerLifecycle);

/// Requests from the UI, applied once per frame
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct ViewerActions {
    pub discard: bool,
    pub reframe: bool,
}

/// The glTF asset a spawned scene came from
#[derive(Component)]
pub struct ModelSource(pub Handle<Gltf>);

// ============================================================================
// Scene host
// ============================================================================

/// Assets a model entity keeps alive
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelResource {
    Mesh(AssetId<Mesh>),
    Material(AssetId<StandardMaterial>),
    Graph(AssetId<AnimationGraph>),
    Scene(AssetId<Scene>),
    Gltf(AssetId<Gltf>),
}

/// [`SceneHost`] over a borrowed world. Changes apply immediately, so a
/// node spawned by one call is visible to the next.
pub struct WorldScene<'w> {
    world: &'w mut World,
}

impl<'w> WorldScene<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self { world }
    }

    /// `root` and every entity below it that has a `C`
    fn descendants_with<C: Component>(&self, root: Entity) -> Vec<Entity> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(entity) = stack.pop() {
            if self.world.get::<C>(entity).is_some() {
                found.push(entity);
            }
            if let Some(children) = self.world.get::<Children>(entity) {
                stack.extend(children.to_vec());
            }
        }
        found
    }
}

fn to_core(v: Vec3) -> glam::Vec3 {
    glam::Vec3::from_array(v.to_array())
}

/// Convert a parsed triangle list into a Bevy mesh
pub fn build_mesh(mut part: MeshData) -> Mesh {
    if part.normals.len() != part.positions.len() {
        part.compute_normals();
    }
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, part.positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, part.normals)
        .with_inserted_indices(Indices::U32(part.indices))
}

impl SceneHost for WorldScene<'_> {
    type Node = Entity;
    type Resource = ModelResource;
    type Clip = Handle<AnimationClip>;

    fn spawn_geometry(&mut self, parts: Vec<MeshData>, material: &MaterialSpec) -> Entity {
        let [r, g, b] = material.base_color;
        let material = self
            .world
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial {
                base_color: Color::srgb(r, g, b),
                metallic: material.metallic,
                perceptual_roughness: material.roughness,
                ..default()
            });

        let root = self
            .world
            .spawn((
                Name::new("GeneratedModel"),
                Transform::default(),
                Visibility::Hidden,
            ))
            .id();

        for (i, part) in parts.into_iter().enumerate() {
            let name = part
                .name
                .clone()
                .unwrap_or_else(|| format!("Part {}", i));
            let mesh = self.world.resource_mut::<Assets<Mesh>>().add(build_mesh(part));
            self.world.spawn((
                Name::new(name),
                Mesh3d(mesh),
                MeshMaterial3d(material.clone()),
                Transform::default(),
                ChildOf(root),
            ));
        }
        root
    }

    fn add_subtree(&mut self, node: &Entity, tag: &str) {
        if let Ok(mut entity) = self.world.get_entity_mut(*node) {
            entity.insert((Name::new(tag.to_string()), Visibility::Inherited));
        }
    }

    fn remove_subtree(&mut self, node: &Entity) {
        if let Ok(entity) = self.world.get_entity_mut(*node) {
            entity.despawn();
        }
    }

    fn discard(&mut self, node: &Entity) {
        self.remove_subtree(node);
    }

    fn find_by_tag(&self, tag: &str) -> Option<Entity> {
        let mut query = self.world.try_query::<(Entity, &Name, Has<ChildOf>)>()?;
        query
            .iter(&*self.world)
            .find(|(_, name, has_parent)| !has_parent && name.as_str() == tag)
            .map(|(entity, ..)| entity)
    }

    fn children(&self, node: &Entity) -> Vec<Entity> {
        self.world
            .get::<Children>(*node)
            .map(|children| children.to_vec())
            .unwrap_or_default()
    }

    fn owned_resources(&self, node: &Entity) -> Vec<ModelResource> {
        let mut owned = Vec::new();
        let Ok(entity) = self.world.get_entity(*node) else {
            return owned;
        };
        if let Some(mesh) = entity.get::<Mesh3d>() {
            owned.push(ModelResource::Mesh(mesh.0.id()));
        }
        if let Some(material) = entity.get::<MeshMaterial3d<StandardMaterial>>() {
            owned.push(ModelResource::Material(material.0.id()));
        }
        if let Some(graph) = entity.get::<AnimationGraphHandle>() {
            owned.push(ModelResource::Graph(graph.0.id()));
        }
        if let Some(scene) = entity.get::<SceneRoot>() {
            owned.push(ModelResource::Scene(scene.0.id()));
        }
        if let Some(source) = entity.get::<ModelSource>() {
            owned.push(ModelResource::Gltf(source.0.id()));
        }
        owned
    }

    fn release(&mut self, resource: &ModelResource) {
        match resource {
            ModelResource::Mesh(id) => {
                if let Some(mut assets) = self.world.get_resource_mut::<Assets<Mesh>>() {
                    assets.remove(*id);
                }
            }
            ModelResource::Material(id) => {
                if let Some(mut assets) = self.world.get_resource_mut::<Assets<StandardMaterial>>() {
                    assets.remove(*id);
                }
            }
            ModelResource::Graph(id) => {
                if let Some(mut assets) = self.world.get_resource_mut::<Assets<AnimationGraph>>() {
                    assets.remove(*id);
                }
            }
            ModelResource::Scene(id) => {
                if let Some(mut assets) = self.world.get_resource_mut::<Assets<Scene>>() {
                    assets.remove(*id);
                }
            }
            ModelResource::Gltf(id) => {
                if let Some(mut assets) = self.world.get_resource_mut::<Assets<Gltf>>() {
                    assets.remove(*id);
                }
            }
        }
    }

    fn compute_bounding_box(&self, node: &Entity) -> Option<Aabb> {
        let meshes = self.world.get_resource::<Assets<Mesh>>()?;
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut found = false;

        // Local transforms are composed by hand; GlobalTransform is not
        // propagated until PostUpdate.
        let mut stack = vec![(*node, Affine3A::IDENTITY)];
        while let Some((entity, parent)) = stack.pop() {
            let local = self
                .world
                .get::<Transform>(entity)
                .map(|t| t.compute_affine())
                .unwrap_or(Affine3A::IDENTITY);
            let affine = parent * local;

            let positions = self
                .world
                .get::<Mesh3d>(entity)
                .and_then(|m| meshes.get(&m.0))
                .and_then(|mesh| mesh.attribute(Mesh::ATTRIBUTE_POSITION))
                .and_then(|values| values.as_float3());
            if let Some(positions) = positions {
                for p in positions {
                    let p = affine.transform_point3(Vec3::from_array(*p));
                    min = min.min(p);
                    max = max.max(p);
                    found = true;
                }
            }

            if let Some(children) = self.world.get::<Children>(entity) {
                stack.extend(children.to_vec().into_iter().map(|c| (c, affine)));
            }
        }

        found.then(|| Aabb::new(to_core(min), to_core(max)))
    }

    fn translate(&mut self, node: &Entity, offset: glam::Vec3) {
        if let Some(mut transform) = self.world.get_mut::<Transform>(*node) {
            transform.translation += Vec3::from_array(offset.to_array());
        }
    }

    fn play_animation(&mut self, node: &Entity, clip: &Handle<AnimationClip>, repeat: bool) -> bool {
        let players = self.descendants_with::<AnimationPlayer>(*node);
        if players.is_empty() {
            return false;
        }

        let (graph, index) = AnimationGraph::from_clip(clip.clone());
        let graph = self.world.resource_mut::<Assets<AnimationGraph>>().add(graph);
        for player in players {
            let Ok(mut entity) = self.world.get_entity_mut(player) else {
                continue;
            };
            entity.insert(AnimationGraphHandle(graph.clone()));
            if let Some(mut animation) = entity.get_mut::<AnimationPlayer>() {
                let active = animation.play(index);
                if repeat {
                    active.repeat();
                }
            }
        }
        true
    }

    fn stop_animation(&mut self, node: &Entity) {
        for player in self.descendants_with::<AnimationPlayer>(*node) {
            if let Some(mut animation) = self.world.get_mut::<AnimationPlayer>(player) {
                animation.stop_all();
            }
        }
    }

    fn set_camera(&mut self, pose: CameraPose) {
        let config = self
            .world
            .get_resource::<ViewerSettings>()
            .map(|s| s.0.camera.clone())
            .unwrap_or_default();
        let range = clip_range(&pose, &config);

        if let Some(mut camera) = self.world.get_resource_mut::<CameraSettings>() {
            camera.snap_to(&pose);
            camera.max_distance = range.max_orbit_distance();
        }

        // Large models (STL in millimetres) would otherwise sit past the far plane
        let mut cameras = self
            .world
            .query_filtered::<&mut Projection, With<MainCamera>>();
        for mut projection in cameras.iter_mut(self.world) {
            if let Projection::Perspective(perspective) = projection.as_mut() {
                perspective.near = range.near;
                perspective.far = range.far;
            }
        }
        tracing::debug!(near = range.near, far = range.far, "Camera clip planes");
    }
}

// ============================================================================
// Loader registry
// ============================================================================

type ViewerResult = LoaderResult<Entity, Handle<AnimationClip>>;

enum JobKind {
    Gltf {
        handle: Handle<Gltf>,
        path: String,
        /// Scene entity, once the file is decoded and instancing has started
        scene: Option<Entity>,
        clips: Vec<ModelClip<Handle<AnimationClip>>>,
    },
    Mesh {
        task: Task<Result<Vec<MeshData>, MeshError>>,
    },
}

struct LoadJob {
    id: RequestId,
    size: u64,
    kind: JobKind,
}

/// What a poll produced for one request
pub enum LoadEvent {
    Progress { id: RequestId, loaded: u64, total: u64 },
    Success(RequestId, ViewerResult),
    Failure(RequestId, ViewerError),
}

/// Format loaders for the Bevy host
#[derive(Resource)]
pub struct ModelLoader {
    asset_server: AssetServer,
    memory: Dir,
    jobs: Vec<LoadJob>,
}

impl FromWorld for ModelLoader {
    fn from_world(world: &mut World) -> Self {
        Self {
            asset_server: world.resource::<AssetServer>().clone(),
            memory: world
                .get_resource::<MemoryAssets>()
                .map(|m| m.0.clone())
                .unwrap_or_default(),
            jobs: Vec::new(),
        }
    }
}

impl LoaderRegistry for ModelLoader {
    fn dispatch(&mut self, id: RequestId, request: LoadRequest) -> Result<(), ViewerError> {
        let format = request.format()?;
        let size = request.bytes.len() as u64;

        let kind = if format.is_scene_graph() {
            let path = format!("{}/model.{}", id.0, format.extension());
            self.memory.insert_asset(Path::new(&path), request.bytes);
            let handle = self
                .asset_server
                .load::<Gltf>(format!("{}://{}", MEMORY_SOURCE, path));
            JobKind::Gltf {
                handle,
                path,
                scene: None,
                clips: Vec::new(),
            }
        } else {
            let bytes = request.bytes;
            let task = AsyncComputeTaskPool::get().spawn(async move { read_mesh(format, &bytes) });
            JobKind::Mesh { task }
        };

        tracing::debug!(request = %id, %format, size, "Load job started");
        self.jobs.push(LoadJob { id, size, kind });
        Ok(())
    }
}

impl ModelLoader {
    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Advance every job; finished jobs are dropped
    pub fn poll(&mut self, world: &mut World) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        let jobs = std::mem::take(&mut self.jobs);
        for mut job in jobs {
            if !self.poll_job(&mut job, world, &mut events) {
                self.jobs.push(job);
            }
        }
        events
    }

    /// Returns true once the job has produced its terminal event
    fn poll_job(&self, job: &mut LoadJob, world: &mut World, events: &mut Vec<LoadEvent>) -> bool {
        let id = job.id;
        let size = job.size;
        match &mut job.kind {
            JobKind::Mesh { task } => {
                let Some(result) = block_on(future::poll_once(task)) else {
                    return false;
                };
                events.push(match result {
                    Ok(parts) => LoadEvent::Success(id, LoaderResult::BareGeometry { parts }),
                    Err(e) => LoadEvent::Failure(id, e.into()),
                });
                true
            }
            JobKind::Gltf {
                handle,
                path,
                scene,
                clips,
            } => {
                if let Some(root) = *scene {
                    let ready = world
                        .get::<SceneInstance>(root)
                        .is_some_and(|instance| {
                            world.resource::<SceneSpawner>().instance_is_ready(**instance)
                        });
                    if ready {
                        events.push(LoadEvent::Success(
                            id,
                            LoaderResult::GraphWithAnimations {
                                root: Some(root),
                                clips: std::mem::take(clips),
                            },
                        ));
                    }
                    return ready;
                }

                if let Some(cause) = self.load_failure(handle) {
                    self.memory.remove_asset(Path::new(path.as_str()));
                    events.push(LoadEvent::Failure(id, ViewerError::LoaderFailure(cause)));
                    return true;
                }
                if !self.asset_server.is_loaded_with_dependencies(handle.id()) {
                    return false;
                }
                self.memory.remove_asset(Path::new(path.as_str()));

                let decoded = world
                    .resource::<Assets<Gltf>>()
                    .get(handle.id())
                    .map(|gltf| {
                        let scene = gltf
                            .default_scene
                            .clone()
                            .or_else(|| gltf.scenes.first().cloned());
                        (scene, gltf_clips(gltf))
                    });
                let Some((scene_handle, found_clips)) = decoded else {
                    events.push(LoadEvent::Failure(
                        id,
                        ViewerError::LoaderFailure("decoded glTF asset is missing".to_string()),
                    ));
                    return true;
                };

                let Some(scene_handle) = scene_handle else {
                    events.push(LoadEvent::Success(
                        id,
                        LoaderResult::GraphWithAnimations {
                            root: None,
                            clips: found_clips,
                        },
                    ));
                    return true;
                };

                // Instancing finishes on a later frame; keep it hidden until attached
                let root = world
                    .spawn((
                        Name::new("PendingModel"),
                        SceneRoot(scene_handle),
                        Transform::default(),
                        Visibility::Hidden,
                        ModelSource(handle.clone()),
                    ))
                    .id();
                *scene = Some(root);
                *clips = found_clips;
                events.push(LoadEvent::Progress {
                    id,
                    loaded: size,
                    total: size,
                });
                false
            }
        }
    }

    fn load_failure(&self, handle: &Handle<Gltf>) -> Option<String> {
        if let Some(LoadState::Failed(err)) = self.asset_server.get_load_state(handle.id()) {
            return Some(err.to_string());
        }
        if let Some(RecursiveDependencyLoadState::Failed(err)) = self
            .asset_server
            .get_recursive_dependency_load_state(handle.id())
        {
            return Some(err.to_string());
        }
        None
    }
}

/// Clips in file order, named from the file where possible
fn gltf_clips(gltf: &Gltf) -> Vec<ModelClip<Handle<AnimationClip>>> {
    gltf.animations
        .iter()
        .enumerate()
        .map(|(i, handle)| {
            let name = gltf
                .named_animations
                .iter()
                .find(|(_, named)| *named == handle)
                .map(|(name, _)| name.to_string())
                .unwrap_or_else(|| format!("Animation {}", i));
            ModelClip {
                name,
                handle: handle.clone(),
            }
        })
        .collect()
}

// ============================================================================
// Systems
// ============================================================================

/// Run `f` with the lifecycle and every collaborator it needs
fn with_viewer<R>(
    world: &mut World,
    f: impl FnOnce(&mut ViewerLifecycle, &mut ModelLoader, &mut StatusLine, &mut WorldScene) -> R,
) -> R {
    world.resource_scope(|world, mut viewer: Mut<ModelViewer>| {
        world.resource_scope(|world, mut loader: Mut<ModelLoader>| {
            world.resource_scope(|world, mut status: Mut<StatusLine>| {
                let mut scene = WorldScene::new(world);
                f(&mut viewer.0, &mut *loader, &mut *status, &mut scene)
            })
        })
    })
}

/// Submit files the picker finished reading
fn process_file_events(world: &mut World) {
    let events = world.resource::<PendingFileEvents>().drain();
    if events.is_empty() {
        return;
    }

    with_viewer(world, |lifecycle, loader, status, scene| {
        for event in events {
            match event {
                FileEvent::Started { file_name } => status.begin_read(&file_name),
                FileEvent::Progress { loaded, total } => {
                    status.report(StatusMessage::progress(loaded, total));
                }
                FileEvent::Loaded { file_name, bytes } => {
                    status.end_read();
                    let request = LoadRequest::new(file_name, bytes);
                    if let Err(e) = lifecycle.submit_file(request, loader, scene, status) {
                        tracing::debug!("Submission ended early: {}", e);
                    }
                }
                FileEvent::Failed { file_name, error } => {
                    status.end_read();
                    let message = if file_name.is_empty() {
                        error
                    } else {
                        format!("{}: {}", file_name, error)
                    };
                    status.report(StatusMessage::Error {
                        message: message.clone(),
                    });
                    status.alert(&message);
                }
            }
        }
    });
}

/// Feed finished load jobs back to the lifecycle
fn poll_model_loads(world: &mut World) {
    let events = world.resource_scope(|world, mut loader: Mut<ModelLoader>| loader.poll(world));
    if events.is_empty() {
        return;
    }

    with_viewer(world, |lifecycle, _loader, status, scene| {
        for event in events {
            match event {
                LoadEvent::Progress { id, loaded, total } => {
                    lifecycle.on_load_progress(id, loaded, total, status);
                }
                LoadEvent::Success(id, result) => {
                    if let Err(e) = lifecycle.on_load_success(id, result, scene, status) {
                        tracing::debug!(request = %id, "Load result rejected: {}", e);
                    }
                }
                LoadEvent::Failure(id, cause) => lifecycle.on_load_error(id, cause, status),
            }
        }
    });
}

fn apply_viewer_actions(world: &mut World) {
    let actions = std::mem::take(&mut *world.resource_mut::<ViewerActions>());
    if actions.discard {
        with_viewer(world, |lifecycle, _loader, status, scene| {
            lifecycle.dispose_current(scene, status);
        });
    }
    if actions.reframe {
        with_viewer(world, |lifecycle, _loader, _status, scene| {
            lifecycle.reframe(scene);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_core::{framing::frame_floor_aligned, ViewerConfig, MODEL_TAG};

    fn test_world() -> World {
        let mut world = World::new();
        world.init_resource::<Assets<Mesh>>();
        world.init_resource::<Assets<StandardMaterial>>();
        world.init_resource::<Assets<AnimationGraph>>();
        world.insert_resource(CameraSettings::default());
        world
    }

    fn part(name: &str, offset: f32) -> MeshData {
        MeshData {
            name: Some(name.to_string()),
            positions: vec![
                [offset, 2.0, 0.0],
                [offset + 1.0, 2.0, 0.0],
                [offset, 5.0, 1.0],
            ],
            normals: Vec::new(),
            indices: vec![0, 1, 2],
        }
    }

    #[derive(Default)]
    struct RecordingLoader(Vec<RequestId>);

    impl LoaderRegistry for RecordingLoader {
        fn dispatch(&mut self, id: RequestId, _request: LoadRequest) -> Result<(), ViewerError> {
            self.0.push(id);
            Ok(())
        }
    }

    #[test]
    fn test_build_mesh_computes_missing_normals() {
        let mesh = build_mesh(part("tri", 0.0));
        let normals = mesh
            .attribute(Mesh::ATTRIBUTE_NORMAL)
            .and_then(|n| n.as_float3())
            .unwrap();
        assert_eq!(normals.len(), 3);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(3));
    }

    #[test]
    fn test_spawned_geometry_shares_one_material() {
        let mut world = test_world();
        let mut scene = WorldScene::new(&mut world);
        let root = scene.spawn_geometry(
            vec![part("a", 0.0), part("b", 3.0)],
            &MaterialSpec::matte([0.5, 0.5, 0.5]),
        );

        let children = scene.children(&root);
        assert_eq!(children.len(), 2);
        let first = scene.owned_resources(&children[0]);
        let second = scene.owned_resources(&children[1]);
        assert_eq!(first.len(), 2);
        assert_eq!(first[1], second[1]);
        assert_ne!(first[0], second[0]);

        let bounds = scene.compute_bounding_box(&root).unwrap();
        assert_eq!(bounds.min, glam::Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(bounds.max, glam::Vec3::new(4.0, 5.0, 1.0));

        scene.translate(&root, glam::Vec3::new(1.0, -2.0, 0.0));
        let moved = scene.compute_bounding_box(&root).unwrap();
        assert_eq!(moved.min, glam::Vec3::new(1.0, 0.0, 0.0));

        // Detached until tagged
        assert!(scene.find_by_tag(MODEL_TAG).is_none());
        scene.add_subtree(&root, MODEL_TAG);
        assert_eq!(scene.find_by_tag(MODEL_TAG), Some(root));

        // Nothing here can play a clip
        assert!(!scene.play_animation(&root, &Handle::default(), true));
    }

    #[test]
    fn test_lifecycle_over_world_releases_assets() {
        let mut world = test_world();
        let mut lifecycle = ViewerLifecycle::new(ViewerConfig::default());
        let mut loader = RecordingLoader::default();
        let mut status = StatusLine::default();

        {
            let mut scene = WorldScene::new(&mut world);
            let id = lifecycle
                .submit_file(
                    LoadRequest::new("bracket.stl", vec![0; 84]),
                    &mut loader,
                    &mut scene,
                    &mut status,
                )
                .unwrap();
            lifecycle
                .on_load_success(
                    id,
                    LoaderResult::BareGeometry {
                        parts: vec![part("a", 0.0), part("b", 3.0)],
                    },
                    &mut scene,
                    &mut status,
                )
                .unwrap();

            let root = scene.find_by_tag(MODEL_TAG).unwrap();
            let bounds = scene.compute_bounding_box(&root).unwrap();
            assert!(bounds.min.y.abs() < 1e-6);
            assert!(bounds.center().x.abs() < 1e-6);
            assert!(bounds.center().z.abs() < 1e-6);
        }
        assert_eq!(loader.0.len(), 1);
        assert_eq!(world.resource::<Assets<Mesh>>().len(), 2);
        assert_eq!(world.resource::<Assets<StandardMaterial>>().len(), 1);
        let camera = world.resource::<CameraSettings>();
        assert!((camera.target.y - 1.5).abs() < 1e-5);

        {
            let mut scene = WorldScene::new(&mut world);
            lifecycle.dispose_current(&mut scene, &mut status);
            assert!(scene.find_by_tag(MODEL_TAG).is_none());
        }
        assert!(world.resource::<Assets<Mesh>>().is_empty());
        assert!(world.resource::<Assets<StandardMaterial>>().is_empty());
        assert_eq!(status.message, Some(StatusMessage::Cleared));
    }

    #[test]
    fn test_framing_large_model_widens_clip_planes() {
        let mut world = test_world();
        world.insert_resource(ViewerSettings(ViewerConfig::default()));
        let camera = world
            .spawn((
                MainCamera,
                Projection::Perspective(PerspectiveProjection {
                    near: 0.1,
                    far: 1000.0,
                    ..default()
                }),
            ))
            .id();

        let config = ViewerConfig::default().camera;
        let size = glam::Vec3::new(600.0, 100.0, 600.0);
        let pose = frame_floor_aligned(size, &config);
        WorldScene::new(&mut world).set_camera(pose);

        let Some(Projection::Perspective(perspective)) = world.get::<Projection>(camera) else {
            panic!("camera lost its perspective projection");
        };
        let reach = pose.distance + size.length() * 0.5;
        assert!(perspective.far > reach, "far {} < {}", perspective.far, reach);
        assert!(perspective.near < pose.distance);

        let settings = world.resource::<CameraSettings>();
        assert!(settings.max_distance >= pose.distance);
        assert_eq!(settings.target_distance, settings.distance);
    }
}
