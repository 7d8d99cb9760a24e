//! File picking for WASM
//!
//! Reads a user-picked file (or the `?model=` URL parameter) into memory and
//! queues [`FileEvent`]s for the model systems to consume. JavaScript
//! callbacks fill the queue; Bevy systems drain it.

use bevy::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use vitrine_core::ModelFormat;

/// File picker plugin
pub struct FilePickerPlugin;

impl Plugin for FilePickerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingFileEvents>()
            .add_systems(Startup, check_url_parameter);
    }
}

/// Progress of reading a file into memory
#[derive(Debug, Clone, PartialEq)]
pub enum FileEvent {
    Started { file_name: String },
    /// `total` is 0 when the size is unknown
    Progress { loaded: u64, total: u64 },
    Loaded { file_name: String, bytes: Vec<u8> },
    Failed { file_name: String, error: String },
}

/// File events from JavaScript callbacks
#[derive(Resource, Default, Clone)]
pub struct PendingFileEvents(pub Arc<Mutex<VecDeque<FileEvent>>>);

impl PendingFileEvents {
    pub fn push(&self, event: FileEvent) {
        if let Ok(mut events) = self.0.lock() {
            events.push_back(event);
        }
    }

    /// Take every queued event, oldest first
    pub fn drain(&self) -> Vec<FileEvent> {
        match self.0.lock() {
            Ok(mut events) => events.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// File filter for the picker dialog
#[derive(Debug, Clone)]
pub struct FileFilter {
    /// Display name (e.g., "3D Models")
    pub name: String,
    /// File extensions without dots (e.g., ["glb", "stl"])
    pub extensions: Vec<String>,
}

impl FileFilter {
    /// Every format the viewer can load
    pub fn models() -> Self {
        Self {
            name: "3D Models".to_string(),
            extensions: ModelFormat::ALL
                .iter()
                .map(|f| f.extension().to_string())
                .collect(),
        }
    }

    /// Convert to accept string for HTML input element
    pub fn to_accept_string(&self) -> String {
        if self.extensions.is_empty() {
            "*".to_string()
        } else {
            self.extensions
                .iter()
                .map(|ext| format!(".{}", ext))
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}

/// File name for a model fetched from a URL: the last path segment,
/// without query string or fragment
pub fn file_name_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = match path.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or(""),
        None => path,
    };
    path.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("model")
        .to_string()
}

/// Check URL for ?model= parameter on startup
fn check_url_parameter(pending: Res<PendingFileEvents>) {
    if let Some(url) = js_interop::model_url_parameter() {
        tracing::info!("Loading model from URL parameter: {}", url);
        js_interop::fetch_model(url, pending.0.clone());
    }
}

/// Helper to trigger file open from UI
pub fn trigger_file_open(pending: &PendingFileEvents, filter: &FileFilter) {
    let accept = filter.to_accept_string();
    tracing::debug!("trigger_file_open: accept={}", accept);
    js_interop::open_file_picker(&accept, pending.0.clone());
}

// ============================================================================
// JavaScript Interop (WASM only)
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod js_interop {
    use super::*;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{FileReader, HtmlInputElement, ProgressEvent};

    type Queue = Arc<Mutex<VecDeque<FileEvent>>>;

    fn push(queue: &Queue, event: FileEvent) {
        if let Ok(mut events) = queue.lock() {
            events.push_back(event);
        }
    }

    /// Open a file picker dialog using a hidden HTML input element
    pub fn open_file_picker(accept: &str, pending: Queue) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            tracing::error!("open_file_picker: no document object");
            return;
        };

        let input: HtmlInputElement = match document
            .create_element("input")
            .map(|el| el.dyn_into::<HtmlInputElement>())
        {
            Ok(Ok(input)) => input,
            _ => {
                tracing::error!("open_file_picker: failed to create input element");
                return;
            }
        };

        input.set_type("file");
        input.set_accept(accept);
        input.style().set_property("display", "none").ok();

        let Some(body) = document.body() else {
            tracing::error!("open_file_picker: no document body");
            return;
        };
        if let Err(e) = body.append_child(&input) {
            tracing::error!("open_file_picker: failed to append input to body: {:?}", e);
            return;
        }

        let input_clone = input.clone();
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            if let Some(file) = input_clone.files().and_then(|files| files.get(0)) {
                read_file(file, pending.clone());
            } else {
                tracing::debug!("open_file_picker: no file selected");
            }

            // Remove the input element
            if let Some(parent) = input_clone.parent_node() {
                parent.remove_child(&input_clone).ok();
            }
        }) as Box<dyn FnMut(_)>);

        input.set_onchange(Some(closure.as_ref().unchecked_ref()));
        closure.forget();

        input.click();
    }

    fn read_file(file: web_sys::File, pending: Queue) {
        let file_name = file.name();
        let reader = match FileReader::new() {
            Ok(reader) => reader,
            Err(e) => {
                push(
                    &pending,
                    FileEvent::Failed {
                        file_name,
                        error: format!("FileReader unavailable: {:?}", e),
                    },
                );
                return;
            }
        };
        push(
            &pending,
            FileEvent::Started {
                file_name: file_name.clone(),
            },
        );

        let progress_queue = pending.clone();
        let onprogress = Closure::wrap(Box::new(move |event: ProgressEvent| {
            let total = if event.length_computable() {
                event.total() as u64
            } else {
                0
            };
            push(
                &progress_queue,
                FileEvent::Progress {
                    loaded: event.loaded() as u64,
                    total,
                },
            );
        }) as Box<dyn FnMut(_)>);

        let reader_clone = reader.clone();
        let load_queue = pending.clone();
        let load_name = file_name.clone();
        let onload = Closure::wrap(Box::new(move |_: web_sys::Event| {
            let event = match reader_clone
                .result()
                .ok()
                .and_then(|r| r.dyn_into::<js_sys::ArrayBuffer>().ok())
            {
                Some(buffer) => FileEvent::Loaded {
                    file_name: load_name.clone(),
                    bytes: js_sys::Uint8Array::new(&buffer).to_vec(),
                },
                None => FileEvent::Failed {
                    file_name: load_name.clone(),
                    error: "file contents are not an ArrayBuffer".to_string(),
                },
            };
            push(&load_queue, event);
        }) as Box<dyn FnMut(_)>);

        let error_queue = pending;
        let error_name = file_name;
        let onerror = Closure::wrap(Box::new(move |_: web_sys::Event| {
            push(
                &error_queue,
                FileEvent::Failed {
                    file_name: error_name.clone(),
                    error: "the browser could not read the file".to_string(),
                },
            );
        }) as Box<dyn FnMut(_)>);

        reader.set_onprogress(Some(onprogress.as_ref().unchecked_ref()));
        reader.set_onload(Some(onload.as_ref().unchecked_ref()));
        reader.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onprogress.forget();
        onload.forget();
        onerror.forget();

        reader.read_as_array_buffer(&file).ok();
    }

    /// Value of the `model` query parameter, if any
    pub fn model_url_parameter() -> Option<String> {
        let href = web_sys::window()?.location().href().ok()?;
        let url = web_sys::Url::new(&href).ok()?;
        url.search_params().get("model")
    }

    /// Fetch a remote model file and queue it like a picked file
    pub fn fetch_model(url: String, pending: Queue) {
        let file_name = file_name_from_url(&url);
        push(
            &pending,
            FileEvent::Started {
                file_name: file_name.clone(),
            },
        );
        wasm_bindgen_futures::spawn_local(async move {
            let event = match fetch_bytes(&url).await {
                Ok(bytes) => FileEvent::Loaded { file_name, bytes },
                Err(error) => FileEvent::Failed { file_name, error },
            };
            push(&pending, event);
        });
    }

    async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
        let window = web_sys::window().ok_or("No window")?;

        let resp = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|e| format!("Fetch failed: {:?}", e))?;
        let resp: web_sys::Response = resp.dyn_into().map_err(|_| "Response cast failed")?;

        if !resp.ok() {
            return Err(format!("HTTP {}: {}", resp.status(), resp.status_text()));
        }

        let buffer = JsFuture::from(resp.array_buffer().map_err(|_| "Failed to get body")?)
            .await
            .map_err(|e| format!("Body read failed: {:?}", e))?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

// Non-WASM stubs
#[cfg(not(target_arch = "wasm32"))]
mod js_interop {
    use super::*;

    pub fn open_file_picker(_accept: &str, pending: Arc<Mutex<VecDeque<FileEvent>>>) {
        if let Ok(mut events) = pending.lock() {
            events.push_back(FileEvent::Failed {
                file_name: String::new(),
                error: "File picker not supported on this platform, pass a file path on the command line"
                    .to_string(),
            });
        }
    }

    pub fn model_url_parameter() -> Option<String> {
        None
    }

    pub fn fetch_model(_url: String, _pending: Arc<Mutex<VecDeque<FileEvent>>>) {}
}
