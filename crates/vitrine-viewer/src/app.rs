//! Bevy application setup

use bevy::asset::io::memory::{Dir, MemoryAssetReader};
use bevy::asset::io::AssetSource;
use bevy::app::PluginGroupBuilder;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use vitrine_core::ViewerConfig;

use crate::file_picker::{FileEvent, FilePickerPlugin, PendingFileEvents};
use crate::models::ModelsPlugin;
use crate::scene::ScenePlugin;
use crate::ui::UiPlugin;

/// Asset source that serves files the user picked, straight from memory
pub const MEMORY_SOURCE: &str = "memory";

/// Startup options for [`run`]
#[derive(Debug, Clone, Default)]
pub struct ViewerOptions {
    pub config: ViewerConfig,
    /// File to submit as soon as the app starts: (file name, contents)
    pub initial_file: Option<(String, Vec<u8>)>,
}

/// Loaded viewer configuration
#[derive(Debug, Clone, Resource)]
pub struct ViewerSettings(pub ViewerConfig);

/// Directory backing the `memory://` asset source
#[derive(Clone, Resource)]
pub struct MemoryAssets(pub Dir);

/// Run the Bevy application
pub fn run(options: ViewerOptions) {
    let memory = Dir::default();
    let reader_root = memory.clone();
    let [r, g, b] = options.config.scene.background;

    let pending = PendingFileEvents::default();
    if let Some((file_name, bytes)) = options.initial_file {
        pending.push(FileEvent::Loaded { file_name, bytes });
    }

    App::new()
        .insert_resource(ClearColor(Color::srgb(r, g, b)))
        // Must be registered before AssetPlugin is built
        .register_asset_source(
            MEMORY_SOURCE,
            AssetSource::build().with_reader(move || {
                Box::new(MemoryAssetReader {
                    root: reader_root.clone(),
                })
            }),
        )
        .add_plugins(engine_plugins())
        .add_plugins(EguiPlugin::default())
        .insert_resource(ViewerSettings(options.config))
        .insert_resource(MemoryAssets(memory))
        .insert_resource(pending)
        .add_plugins(FilePickerPlugin)
        .add_plugins(ScenePlugin)
        .add_plugins(ModelsPlugin)
        .add_plugins(UiPlugin)
        .run();
}

/// Bevy's default plugins, configured for the viewer canvas and picked files
fn engine_plugins() -> PluginGroupBuilder {
    DefaultPlugins
        .set(WindowPlugin {
            primary_window: Some(Window {
                title: "Vitrine".to_string(),
                canvas: Some("#vitrine-canvas".to_string()),
                fit_canvas_to_parent: true,
                prevent_default_event_handling: false,
                ..default()
            }),
            ..default()
        })
        .set(AssetPlugin {
            // Picked files never come with .meta files
            meta_check: bevy::asset::AssetMetaCheck::Never,
            ..default()
        })
        // The WASM start function and the native binary install their own subscriber
        .disable::<LogPlugin>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_plugins_leave_logging_to_the_entry_point() {
        let plugins = engine_plugins();
        assert!(plugins.contains::<LogPlugin>());
        assert!(!plugins.enabled::<LogPlugin>());
        assert!(plugins.enabled::<AssetPlugin>());
    }
}
