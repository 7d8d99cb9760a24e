//! 3D scene: camera, lights, and orbit controls

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use vitrine_core::CameraPose;

use crate::app::ViewerSettings;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraSettings>()
            .add_systems(Startup, setup_scene)
            .add_systems(Update, update_camera);
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Orbit camera controller settings (Y is up)
#[derive(Debug, Clone, Resource)]
pub struct CameraSettings {
    pub distance: f32,
    pub target_distance: f32, // For smooth zoom
    pub azimuth: f32,
    pub elevation: f32,
    pub target: Vec3,
    pub target_focus: Vec3, // For smooth re-centering
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

// Inherent rather than `Default`: bevy's blanket `FromWorld for T: Default`
// would conflict with the config-aware `FromWorld` impl below.
impl CameraSettings {
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        // Looking at the origin from (5, 5, 5)
        let mut settings = Self {
            distance: 0.0,
            target_distance: 0.0,
            azimuth: 0.0,
            elevation: 0.0,
            target: Vec3::ZERO,
            target_focus: Vec3::ZERO,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            smooth_factor: 0.15,
            min_distance: 0.01,
            max_distance: 500.0,
        };
        settings.look_from(Vec3::splat(5.0), Vec3::ZERO);
        settings
    }
}

impl FromWorld for CameraSettings {
    fn from_world(world: &mut World) -> Self {
        let mut settings = Self::default();
        if let Some(config) = world.get_resource::<ViewerSettings>() {
            let camera = &config.0.camera;
            settings.min_distance = camera.min_distance;
            settings.max_distance = camera.far * 0.5;
        }
        settings
    }
}

impl CameraSettings {
    /// Jump to a framed pose, skipping the smoothing
    pub fn snap_to(&mut self, pose: &CameraPose) {
        let position = Vec3::from_array(pose.position.to_array());
        let target = Vec3::from_array(pose.target.to_array());
        self.look_from(position, target);
    }

    fn look_from(&mut self, position: Vec3, target: Vec3) {
        let offset = position - target;
        let distance = offset.length().max(f32::EPSILON);
        self.elevation = (offset.y / distance).clamp(-1.0, 1.0).asin().clamp(-1.5, 1.5);
        self.azimuth = offset.z.atan2(offset.x);
        self.distance = distance;
        self.target_distance = distance;
        self.target = target;
        self.target_focus = target;
    }

    /// Camera position for the current orbit state
    pub fn eye(&self) -> Vec3 {
        let x = self.distance * self.azimuth.cos() * self.elevation.cos();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.azimuth.sin() * self.elevation.cos();
        self.target + Vec3::new(x, y, z)
    }
}

fn setup_scene(mut commands: Commands, settings: Res<ViewerSettings>, camera: Res<CameraSettings>) {
    let cam = &settings.0.camera;
    let scene = &settings.0.scene;

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: cam.fov_degrees.to_radians(),
            near: cam.near,
            far: cam.far,
            ..default()
        }),
        Transform::from_translation(camera.eye()).looking_at(camera.target, Vec3::Y),
        MainCamera,
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: scene.ambient_brightness,
        ..default()
    });

    // Key light
    let [x, y, z] = scene.light_position;
    commands.spawn((
        DirectionalLight {
            illuminance: scene.light_illuminance,
            shadows_enabled: scene.shadows,
            ..default()
        },
        Transform::from_xyz(x, y, z).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Dim gray fill from below, like a hemisphere light's ground color
    commands.spawn((
        DirectionalLight {
            illuminance: scene.light_illuminance * 0.15,
            color: Color::srgb(0.27, 0.27, 0.27),
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(-x, -y, -z).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    mut settings: ResMut<CameraSettings>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    time: Res<Time>,
    mut contexts: bevy_egui::EguiContexts,
) {
    // Don't steal drags and scrolls from the UI
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);

    let motion = mouse_motion.delta;

    // Orbit with left mouse drag
    if mouse_button.pressed(MouseButton::Left) && !egui_wants_pointer {
        settings.azimuth += motion.x * settings.sensitivity;
        settings.elevation = (settings.elevation + motion.y * settings.sensitivity).clamp(-1.5, 1.5);
    }

    // Pan with right mouse drag, in the camera's vertical plane
    if mouse_button.pressed(MouseButton::Right) && !egui_wants_pointer {
        let right = Vec3::new(settings.azimuth.sin(), 0.0, -settings.azimuth.cos());
        let pan_speed = settings.distance * 0.002;
        settings.target_focus += right * motion.x * pan_speed;
        settings.target_focus += Vec3::Y * motion.y * pan_speed;
    }

    // Zoom with scroll
    if !egui_wants_pointer && mouse_scroll.delta.y != 0.0 {
        let lines = match mouse_scroll.unit {
            MouseScrollUnit::Line => mouse_scroll.delta.y,
            MouseScrollUnit::Pixel => mouse_scroll.delta.y / 100.0,
        };
        let zoom_factor = 1.0 - lines * settings.zoom_speed * 0.3;
        settings.target_distance = (settings.target_distance * zoom_factor)
            .clamp(settings.min_distance, settings.max_distance);
    }

    // Touch support for mobile
    if touch_input.iter().count() == 1 && !egui_wants_pointer {
        for touch in touch_input.iter() {
            let delta = touch.delta();
            if delta != Vec2::ZERO {
                settings.azimuth += delta.x * settings.sensitivity;
                settings.elevation =
                    (settings.elevation + delta.y * settings.sensitivity).clamp(-1.5, 1.5);
            }
        }
    }

    // Pinch to zoom
    if touch_input.iter().count() == 2 {
        let touches: Vec<_> = touch_input.iter().collect();
        if let (Some(t1), Some(t2)) = (touches.first(), touches.get(1)) {
            let curr_dist = t1.position().distance(t2.position());
            let prev_dist = (t1.position() - t1.delta()).distance(t2.position() - t2.delta());
            let zoom_factor = prev_dist / curr_dist.max(1.0);
            settings.target_distance = (settings.target_distance * zoom_factor)
                .clamp(settings.min_distance, settings.max_distance);
        }
    }

    // Damping
    let dt = time.delta_secs();
    let lerp_factor = 1.0 - (-settings.smooth_factor * 60.0 * dt).exp();
    settings.distance += (settings.target_distance - settings.distance) * lerp_factor;
    let target = settings.target + (settings.target_focus - settings.target) * lerp_factor;
    settings.target = target;

    if let Ok(mut transform) = camera_query.single_mut() {
        transform.translation = settings.eye();
        transform.look_at(settings.target, Vec3::Y);
    }
}
