//! UI overlays using bevy_egui

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use vitrine_core::{ModelFormat, StatusMessage, StatusSink};

use crate::file_picker::{trigger_file_open, FileFilter, PendingFileEvents};
use crate::models::{ModelViewer, ViewerActions};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StatusLine>()
            // Main UI system runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
            .add_systems(EguiPrimaryContextPass, ui_system);
    }
}

/// The status line under the panel buttons
#[derive(Resource, Default, Debug)]
pub struct StatusLine {
    pub message: Option<StatusMessage>,
    /// File being read into memory, before the lifecycle sees it
    pub reading: Option<String>,
}

impl StatusLine {
    pub fn begin_read(&mut self, file_name: &str) {
        self.reading = Some(file_name.to_string());
        self.report(StatusMessage::ReadingFile {
            file_name: file_name.to_string(),
        });
    }

    pub fn end_read(&mut self) {
        self.reading = None;
    }

    pub fn text(&self) -> String {
        self.message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "Select a model file to begin.".to_string())
    }

    pub fn is_error(&self) -> bool {
        self.message.as_ref().is_some_and(StatusMessage::is_error)
    }
}

impl StatusSink for StatusLine {
    fn report(&mut self, message: StatusMessage) {
        match &message {
            StatusMessage::Error { message } => tracing::warn!("Status: {}", message),
            StatusMessage::Progress { .. } => tracing::trace!("Status: {}", message),
            other => tracing::info!("Status: {}", other),
        }
        self.message = Some(message);
    }

    fn alert(&mut self, text: &str) {
        #[cfg(target_arch = "wasm32")]
        if let Some(window) = web_sys::window() {
            window.alert_with_message(text).ok();
        }
        #[cfg(not(target_arch = "wasm32"))]
        tracing::error!("{}", text);
    }
}

/// Grouped system parameters for the main UI system
#[derive(SystemParam)]
pub struct UiParams<'w, 's> {
    pub contexts: EguiContexts<'w, 's>,
    pub viewer: Res<'w, ModelViewer>,
    pub status: Res<'w, StatusLine>,
    pub actions: ResMut<'w, ViewerActions>,
    pub pending_files: Res<'w, PendingFileEvents>,
}

fn ui_system(mut params: UiParams) {
    let Ok(ctx) = params.contexts.ctx_mut() else { return };

    let lifecycle = &params.viewer.0;
    let busy = lifecycle.is_loading() || params.status.reading.is_some();
    let has_model = lifecycle.current().is_some();

    egui::Window::new("Vitrine")
        .anchor(egui::Align2::LEFT_TOP, [20.0, 20.0])
        .default_width(220.0)
        .resizable(false)
        .collapsible(true)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!busy, egui::Button::new("📂 Open model"))
                    .clicked()
                {
                    trigger_file_open(&params.pending_files, &FileFilter::models());
                }
                if ui
                    .add_enabled(has_model && !busy, egui::Button::new("Discard"))
                    .on_hover_text("Remove the model and free its memory")
                    .clicked()
                {
                    params.actions.discard = true;
                }
                if ui
                    .add_enabled(has_model, egui::Button::new("Reset view"))
                    .clicked()
                {
                    params.actions.reframe = true;
                }
            });

            ui.separator();

            let text = params.status.text();
            if params.status.is_error() {
                ui.label(egui::RichText::new(text).color(egui::Color32::from_rgb(255, 100, 100)));
            } else {
                ui.label(text);
            }

            if let Some(model) = lifecycle.current() {
                ui.separator();
                egui::Grid::new("model_info")
                    .num_columns(2)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new("File").color(egui::Color32::GRAY));
                        ui.label(&model.file_name);
                        ui.end_row();

                        ui.label(egui::RichText::new("Format").color(egui::Color32::GRAY));
                        ui.label(model.format.to_string());
                        ui.end_row();

                        let size = model.bounding_size;
                        ui.label(egui::RichText::new("Size").color(egui::Color32::GRAY));
                        ui.label(format!("{:.2} × {:.2} × {:.2}", size.x, size.y, size.z));
                        ui.end_row();

                        ui.label(egui::RichText::new("Animation").color(egui::Color32::GRAY));
                        match &model.active_clip {
                            Some(name) => {
                                ui.label(egui::RichText::new(name).color(egui::Color32::LIGHT_GREEN))
                            }
                            None => ui.label("none"),
                        };
                        ui.end_row();
                    });

                if let Some(note) = format_note(model.format) {
                    ui.label(egui::RichText::new(note).small().color(egui::Color32::YELLOW));
                }

                let ignored = model.ignored_clip_count();
                if ignored > 0 {
                    ui.label(
                        egui::RichText::new(format!("{} more clip(s) in file, not played", ignored))
                            .small()
                            .color(egui::Color32::GRAY),
                    );
                }
            }

            ui.separator();
            ui.label(
                egui::RichText::new(SUPPORTED_FORMATS_HINT)
                    .small()
                    .color(egui::Color32::GRAY),
            );
        });

    if busy {
        loading_overlay(ctx);
    }
}

const SUPPORTED_FORMATS_HINT: &str =
    "Supports GLB, GLTF, FBX, OBJ, STL.\nFBX files load as static geometry, without rig or animation.";

/// Caveat shown next to a loaded model of this format
fn format_note(format: ModelFormat) -> Option<&'static str> {
    match format {
        ModelFormat::Fbx => Some("FBX animations and materials are not imported"),
        _ => None,
    }
}

/// Dims the viewport and shows a spinner while a file is read or decoded
fn loading_overlay(ctx: &egui::Context) {
    let screen = ctx.screen_rect();
    egui::Area::new(egui::Id::new("loading_overlay"))
        .order(egui::Order::Background)
        .fixed_pos(screen.min)
        .interactable(false)
        .show(ctx, |ui| {
            ui.painter()
                .rect_filled(screen, 0.0, egui::Color32::from_black_alpha(120));
        });

    egui::Area::new(egui::Id::new("loading_spinner"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add(egui::Spinner::new().size(48.0));
                ui.label(egui::RichText::new("Loading...").color(egui::Color32::WHITE));
            });
        });
}
