use crate::camera3d::Camera3D;
use crate::config::OutlineConfig;
use crate::mesh::TriMesh;
use crate::picking::pick_nearest;
use crate::scene::RoomScene;
use bevy_ecs::prelude::Entity;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::sync::Arc;
use winit::dpi::PhysicalSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoverState {
    #[default]
    None,
    Hovering(Entity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

impl CursorStyle {
    pub fn icon(self) -> winit::window::CursorIcon {
        match self {
            CursorStyle::Default => winit::window::CursorIcon::Default,
            CursorStyle::Pointer => winit::window::CursorIcon::Pointer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineStyle {
    /// View-space inflation along the vertex normal.
    pub thickness: f32,
    pub color: Vec4,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self { thickness: 0.008, color: Vec4::ONE }
    }
}

impl OutlineStyle {
    pub fn from_config(cfg: &OutlineConfig) -> Self {
        let [r, g, b] = cfg.color;
        Self { thickness: cfg.thickness, color: Vec4::new(r, g, b, 1.0) }
    }
}

/// Overlay copy of one mesh in the hovered group. Shares geometry with the source node.
#[derive(Debug, Clone)]
pub struct OutlineMesh {
    pub source: Entity,
    pub mesh: Arc<TriMesh>,
    pub model: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverUpdate {
    pub changed: bool,
    pub state: HoverState,
    pub cursor: CursorStyle,
}

/// Hover outliner. Tracks at most one group and rebuilds its overlay wholesale on every change.
#[derive(Debug, Default)]
pub struct OutlinePicker {
    state: HoverState,
    outlines: Vec<OutlineMesh>,
    generation: u64,
    style: OutlineStyle,
}

impl OutlinePicker {
    pub fn new(style: OutlineStyle) -> Self {
        Self { style, ..Self::default() }
    }

    pub fn state(&self) -> HoverState {
        self.state
    }

    pub fn style(&self) -> OutlineStyle {
        self.style
    }

    pub fn outlines(&self) -> &[OutlineMesh] {
        &self.outlines
    }

    /// Bumped whenever the outline set is replaced or cleared.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cursor(&self) -> CursorStyle {
        match self.state {
            HoverState::None => CursorStyle::Default,
            HoverState::Hovering(_) => CursorStyle::Pointer,
        }
    }

    pub fn update(
        &mut self,
        scene: &RoomScene,
        camera: &Camera3D,
        pointer: Option<Vec2>,
        viewport: PhysicalSize<u32>,
    ) -> HoverUpdate {
        let ray = pointer.and_then(|p| camera.screen_ray(p, viewport));
        self.update_from_ray(scene, ray)
    }

    pub fn update_from_ray(&mut self, scene: &RoomScene, ray: Option<(Vec3, Vec3)>) -> HoverUpdate {
        let target = ray
            .and_then(|(origin, dir)| pick_nearest(scene, origin, dir))
            .filter(|hit| is_allow_listed(scene, hit.entity))
            .map(|hit| resolve_group(scene, hit.entity));

        let changed = match (self.state, target) {
            (HoverState::Hovering(current), Some(group)) if current == group => false,
            (HoverState::None, None) => false,
            (_, Some(group)) => {
                self.detach();
                self.attach(scene, group);
                true
            }
            (HoverState::Hovering(_), None) => {
                self.detach();
                true
            }
        };
        if changed {
            log::debug!("[outline] hover -> {:?}", target.and_then(|g| scene.name(g)));
        } else {
            self.refresh_transforms(scene);
        }
        HoverUpdate { changed, state: self.state, cursor: self.cursor() }
    }

    fn attach(&mut self, scene: &RoomScene, group: Entity) {
        self.outlines = scene
            .descendants_with_mesh(group)
            .into_iter()
            .filter_map(|entity| {
                scene.mesh(entity).map(|renderable| OutlineMesh {
                    source: entity,
                    mesh: Arc::clone(&renderable.mesh),
                    model: scene.world_matrix(entity),
                })
            })
            .collect();
        self.state = HoverState::Hovering(group);
        self.generation = self.generation.wrapping_add(1);
    }

    fn detach(&mut self) {
        if self.state == HoverState::None {
            return;
        }
        self.outlines.clear();
        self.outlines.shrink_to_fit();
        self.state = HoverState::None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Keeps overlay transforms in step with animated source nodes.
    pub fn refresh_transforms(&mut self, scene: &RoomScene) {
        for outline in &mut self.outlines {
            outline.model = scene.world_matrix(outline.source);
        }
    }
}

/// True when the node or one of its ancestors was tagged interactive at load time.
pub fn is_allow_listed(scene: &RoomScene, entity: Entity) -> bool {
    scene.is_interactive(entity) || scene.ancestors(entity).iter().any(|&a| scene.is_interactive(a))
}

/// Meshes directly under the root, or one level below it, outline alone; deeper meshes outline
/// their immediate parent's whole subtree.
pub fn resolve_group(scene: &RoomScene, hit: Entity) -> Entity {
    let root = scene.root();
    let Some(parent) = scene.parent(hit) else {
        return hit;
    };
    if parent == root {
        return hit;
    }
    if scene.parent(parent) == Some(root) {
        hit
    } else {
        parent
    }
}
