//! Recording collaborators for lifecycle tests

use glam::Vec3;
use std::collections::HashMap;

use crate::error::ViewerError;
use crate::format::{LoadRequest, RequestId};
use crate::framing::CameraPose;
use crate::geometry::Aabb;
use crate::host::{LoaderRegistry, MaterialSpec, SceneHost, StatusMessage, StatusSink};
use crate::mesh::MeshData;

#[derive(Debug, Default)]
struct MockNode {
    children: Vec<u32>,
    resources: Vec<String>,
    bounds: Option<Aabb>,
    offset: Vec3,
    tag: Option<String>,
}

/// In-memory scene graph that records every call the lifecycle makes
#[derive(Debug)]
pub struct MockScene {
    nodes: HashMap<u32, MockNode>,
    next_id: u32,
    pub attached: Vec<u32>,
    pub released: Vec<String>,
    pub discarded: Vec<u32>,
    pub stopped: Vec<u32>,
    pub play_calls: Vec<(String, bool)>,
    pub camera: Option<CameraPose>,
    /// Whether models built here carry something a clip can drive
    pub animatable: bool,
    pub spawned_parts: Vec<usize>,
    pub spawned_materials: Vec<MaterialSpec>,
}

impl Default for MockScene {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 1,
            attached: Vec::new(),
            released: Vec::new(),
            discarded: Vec::new(),
            stopped: Vec::new(),
            play_calls: Vec::new(),
            camera: None,
            animatable: true,
            spawned_parts: Vec::new(),
            spawned_materials: Vec::new(),
        }
    }
}

impl MockScene {
    fn new_node(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, MockNode::default());
        id
    }

    pub fn empty_node(&mut self) -> u32 {
        self.new_node()
    }

    /// Detached model: a root with `children` mesh nodes, each owning one
    /// geometry and `materials` materials. The first child carries `bounds`.
    pub fn build_model(&mut self, bounds: Aabb, children: usize, materials: usize) -> u32 {
        let root = self.new_node();
        for i in 0..children {
            let child = self.new_node();
            let node = self.nodes.get_mut(&child).unwrap();
            node.resources.push(format!("geom:{}", child));
            for k in 0..materials {
                node.resources.push(format!("mat:{}:{}", child, k));
            }
            if i == 0 {
                node.bounds = Some(bounds);
            }
            self.nodes.get_mut(&root).unwrap().children.push(child);
        }
        root
    }

    pub fn give_resource(&mut self, node: u32, resource: &str) {
        self.nodes
            .get_mut(&node)
            .unwrap()
            .resources
            .push(resource.to_string());
    }

    /// Distinct resources under `root`, sorted
    pub fn all_resources(&self, root: u32) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[&id];
            out.extend(node.resources.iter().cloned());
            stack.extend(node.children.iter().copied());
        }
        out.sort();
        out.dedup();
        out
    }

    fn subtree_bounds(&self, id: u32, offset: Vec3) -> Option<Aabb> {
        let node = self.nodes.get(&id)?;
        let offset = offset + node.offset;
        let mut bounds = node.bounds.map(|b| b.translated(offset));
        for child in &node.children {
            if let Some(b) = self.subtree_bounds(*child, offset) {
                bounds = Some(match bounds {
                    Some(acc) => acc.union(&b),
                    None => b,
                });
            }
        }
        bounds
    }
}

impl SceneHost for MockScene {
    type Node = u32;
    type Resource = String;
    type Clip = String;

    fn spawn_geometry(&mut self, parts: Vec<MeshData>, material: &MaterialSpec) -> u32 {
        self.spawned_parts.push(parts.len());
        self.spawned_materials.push(*material);
        let root = self.new_node();
        for part in parts {
            let child = self.new_node();
            let node = self.nodes.get_mut(&child).unwrap();
            node.bounds = part.bounds();
            node.resources.push(format!("geom:{}", child));
            node.resources.push(format!("mat:{}:0", child));
            self.nodes.get_mut(&root).unwrap().children.push(child);
        }
        root
    }

    fn add_subtree(&mut self, node: &u32, tag: &str) {
        self.nodes.get_mut(node).unwrap().tag = Some(tag.to_string());
        self.attached.push(*node);
    }

    fn remove_subtree(&mut self, node: &u32) {
        self.attached.retain(|n| n != node);
    }

    fn discard(&mut self, node: &u32) {
        self.discarded.push(*node);
    }

    fn find_by_tag(&self, tag: &str) -> Option<u32> {
        self.attached
            .iter()
            .copied()
            .find(|id| self.nodes[id].tag.as_deref() == Some(tag))
    }

    fn children(&self, node: &u32) -> Vec<u32> {
        self.nodes
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn owned_resources(&self, node: &u32) -> Vec<String> {
        self.nodes
            .get(node)
            .map(|n| n.resources.clone())
            .unwrap_or_default()
    }

    fn release(&mut self, resource: &String) {
        self.released.push(resource.clone());
    }

    fn compute_bounding_box(&self, node: &u32) -> Option<Aabb> {
        self.subtree_bounds(*node, Vec3::ZERO)
    }

    fn translate(&mut self, node: &u32, offset: Vec3) {
        self.nodes.get_mut(node).unwrap().offset += offset;
    }

    fn play_animation(&mut self, _node: &u32, clip: &String, repeat: bool) -> bool {
        if !self.animatable {
            return false;
        }
        self.play_calls.push((clip.clone(), repeat));
        true
    }

    fn stop_animation(&mut self, node: &u32) {
        self.stopped.push(*node);
    }

    fn set_camera(&mut self, pose: CameraPose) {
        self.camera = Some(pose);
    }
}

#[derive(Debug, Default)]
pub struct MockLoaders {
    pub dispatched: Vec<(RequestId, String)>,
    pub fail_with: Option<ViewerError>,
}

impl LoaderRegistry for MockLoaders {
    fn dispatch(&mut self, id: RequestId, request: LoadRequest) -> Result<(), ViewerError> {
        if let Some(err) = self.fail_with.take() {
            return Err(err);
        }
        self.dispatched.push((id, request.file_name));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockStatus {
    pub messages: Vec<StatusMessage>,
    pub alerts: Vec<String>,
}

impl MockStatus {
    pub fn last(&self) -> Option<&StatusMessage> {
        self.messages.last()
    }
}

impl StatusSink for MockStatus {
    fn report(&mut self, message: StatusMessage) {
        self.messages.push(message);
    }

    fn alert(&mut self, text: &str) {
        self.alerts.push(text.to_string());
    }
}
