//! Vitrine - desktop entry point
//!
//! Opens the viewer window, optionally with a model file preloaded.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::main()
}

// The WASM build starts from the library's `wasm_bindgen(start)` function
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use anyhow::{Context, Result};
    use clap::Parser;
    use std::path::PathBuf;
    use tracing::{info, Level};
    use tracing_subscriber::FmtSubscriber;
    use vitrine_viewer::ViewerOptions;

    #[derive(Parser, Debug)]
    #[command(name = "vitrine")]
    #[command(about = "View GLB, GLTF, FBX, OBJ, and STL models")]
    #[command(version)]
    struct Args {
        /// Model file to open on startup
        file: Option<PathBuf>,

        /// Path to configuration file
        #[arg(short, long, default_value = "vitrine.toml")]
        config: PathBuf,

        /// Log level (trace, debug, info, warn, error)
        #[arg(short, long, default_value = "info")]
        log_level: String,
    }

    pub fn main() -> Result<()> {
        let args = Args::parse();

        // Initialize logging
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();

        tracing::subscriber::set_global_default(subscriber)?;

        info!("Vitrine v{}", env!("CARGO_PKG_VERSION"));

        let config = vitrine_core::load_config(&args.config)
            .with_context(|| format!("Invalid configuration in {}", args.config.display()))?;

        let initial_file = match args.file {
            Some(path) => {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                info!(file = %file_name, size = bytes.len(), "Opening model");
                Some((file_name, bytes))
            }
            None => None,
        };

        vitrine_viewer::run(ViewerOptions {
            config,
            initial_file,
        });
        Ok(())
    }
}
