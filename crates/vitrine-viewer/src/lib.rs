//! Vitrine Viewer - 3D model viewer for the browser and the desktop
//!
//! Pick a GLB, GLTF, FBX, OBJ, or STL file and the viewer floor-aligns it,
//! frames it in an orbit camera, and plays its first animation. The lifecycle
//! logic lives in `vitrine-core`; this crate provides the Bevy host for it.

mod app;
mod file_picker;
mod models;
mod scene;
mod ui;

pub use app::{run, ViewerOptions};

use vitrine_core::ViewerConfig;

/// Configuration compiled into the WASM build
const EMBEDDED_CONFIG: &str = include_str!("../assets/vitrine.toml");

/// Parse the embedded configuration, falling back to defaults if it is invalid
pub fn embedded_config() -> ViewerConfig {
    match ViewerConfig::from_toml_str(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Embedded configuration rejected, using defaults: {}", e);
            ViewerConfig::default()
        }
    }
}

/// WASM entry point
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging with filtering to reduce wgpu noise
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::WARN)
            .build(),
    );

    app::run(ViewerOptions {
        config: embedded_config(),
        initial_file: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_is_valid() {
        let config = ViewerConfig::from_toml_str(EMBEDDED_CONFIG).unwrap();
        assert_eq!(config, embedded_config());
        assert_eq!(config.camera.fov_degrees, 45.0);
    }
}
