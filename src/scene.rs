use crate::mesh::{MeshShape, TriMesh};
use anyhow::{Context, Result};
use bevy_ecs::prelude::{Component, Entity, World};
use glam::{EulerRot, Mat4, Quat, Vec3, Vec4};
use serde::Deserialize;
use smallvec::SmallVec;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct NodeName(pub String);

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl Transform3D {
    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::default() }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform3D(pub Mat4);

impl Default for WorldTransform3D {
    fn default() -> Self {
        Self(Mat4::IDENTITY)
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(pub Vec<Entity>);

#[derive(Component, Debug, Clone)]
pub struct MeshRenderable {
    pub mesh: Arc<TriMesh>,
    pub color: Vec4,
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SceneRoot;

/// Glass surface the sky shows through.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct WindowPane;

/// Node eligible for hover outlining.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Interactive;

/// Name tables resolved into tags once, when the scene is loaded.
#[derive(Debug, Clone, Default)]
pub struct TagRules {
    pub window_panes: Vec<String>,
    pub outline_allow_list: Vec<String>,
}

impl TagRules {
    pub fn is_window_pane(&self, name: &str) -> bool {
        self.window_panes.iter().any(|pane| pane == name)
    }

    pub fn is_interactive(&self, name: &str) -> bool {
        self.outline_allow_list.iter().any(|entry| name == entry || name.starts_with(entry.as_str()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeDescription {
    pub name: String,
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default)]
    pub rotation_degrees: [f32; 3],
    #[serde(default = "NodeDescription::default_scale")]
    pub scale: [f32; 3],
    #[serde(default)]
    pub mesh: Option<MeshShape>,
    #[serde(default = "NodeDescription::default_color")]
    pub color: [f32; 4],
    #[serde(default)]
    pub children: Vec<NodeDescription>,
}

impl NodeDescription {
    const fn default_scale() -> [f32; 3] {
        [1.0, 1.0, 1.0]
    }

    const fn default_color() -> [f32; 4] {
        [0.8, 0.8, 0.8, 1.0]
    }

    fn transform(&self) -> Transform3D {
        let [rx, ry, rz] = self.rotation_degrees;
        Transform3D {
            translation: Vec3::from_array(self.translation),
            rotation: Quat::from_euler(EulerRot::XYZ, rx.to_radians(), ry.to_radians(), rz.to_radians()),
            scale: Vec3::from_array(self.scale),
        }
    }
}

impl SceneDescription {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read scene file {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse scene file {}", path.display()))
    }
}

/// Room scene graph. Nodes are ECS entities under a single root.
pub struct RoomScene {
    world: World,
    root: Entity,
    nodes: Vec<Entity>,
}

impl RoomScene {
    pub fn new() -> Self {
        let mut world = World::new();
        let root = world
            .spawn((
                SceneRoot,
                NodeName("Scene".to_string()),
                Transform3D::default(),
                WorldTransform3D::default(),
                Children::default(),
            ))
            .id();
        Self { world, root, nodes: Vec::new() }
    }

    pub fn from_description(desc: &SceneDescription, rules: &TagRules) -> Self {
        let mut scene = Self::new();
        let root = scene.root;
        for node in &desc.nodes {
            scene.spawn_description(root, node);
        }
        scene.propagate_transforms();
        scene.apply_tags(rules);
        scene
    }

    fn spawn_description(&mut self, parent: Entity, node: &NodeDescription) {
        let mesh = node.mesh.map(|shape| MeshRenderable {
            mesh: Arc::new(shape.build()),
            color: Vec4::from_array(node.color),
        });
        let entity = self.spawn_node(parent, &node.name, node.transform(), mesh);
        for child in &node.children {
            self.spawn_description(entity, child);
        }
    }

    pub fn spawn_node(
        &mut self,
        parent: Entity,
        name: &str,
        transform: Transform3D,
        mesh: Option<MeshRenderable>,
    ) -> Entity {
        let mut entity = self.world.spawn((
            NodeName(name.to_string()),
            transform,
            WorldTransform3D::default(),
            Parent(parent),
            Children::default(),
        ));
        if let Some(mesh) = mesh {
            entity.insert(mesh);
        }
        let id = entity.id();
        if let Some(mut children) = self.world.get_mut::<Children>(parent) {
            children.0.push(id);
        }
        self.nodes.push(id);
        id
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.world.get::<NodeName>(entity).map(|n| n.0.as_str())
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<Parent>(entity).map(|p| p.0)
    }

    pub fn world_matrix(&self, entity: Entity) -> Mat4 {
        self.world.get::<WorldTransform3D>(entity).map(|w| w.0).unwrap_or(Mat4::IDENTITY)
    }

    pub fn mesh(&self, entity: Entity) -> Option<&MeshRenderable> {
        self.world.get::<MeshRenderable>(entity)
    }

    pub fn is_window_pane(&self, entity: Entity) -> bool {
        self.world.get::<WindowPane>(entity).is_some()
    }

    pub fn is_interactive(&self, entity: Entity) -> bool {
        self.world.get::<Interactive>(entity).is_some()
    }

    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.nodes.iter().copied().find(|&e| self.name(e) == Some(name))
    }

    /// Recomputes every world matrix from the root down.
    pub fn propagate_transforms(&mut self) {
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((entity, parent_world)) = stack.pop() {
            let local = self.world.get::<Transform3D>(entity).map(Transform3D::matrix).unwrap_or(Mat4::IDENTITY);
            let world = parent_world * local;
            if let Some(mut slot) = self.world.get_mut::<WorldTransform3D>(entity) {
                slot.0 = world;
            }
            if let Some(children) = self.world.get::<Children>(entity) {
                stack.extend(children.0.iter().map(|&child| (child, world)));
            }
        }
    }

    /// Resolves name tables into [`WindowPane`] / [`Interactive`] tags.
    pub fn apply_tags(&mut self, rules: &TagRules) {
        let mut panes = 0usize;
        let mut interactive = 0usize;
        for &entity in &self.nodes {
            let Some(name) = self.world.get::<NodeName>(entity).map(|n| n.0.clone()) else {
                continue;
            };
            let mut node = self.world.entity_mut(entity);
            if rules.is_window_pane(&name) {
                node.insert(WindowPane);
                panes += 1;
            }
            if rules.is_interactive(&name) {
                node.insert(Interactive);
                interactive += 1;
            }
        }
        for pane in &rules.window_panes {
            if self.find_by_name(pane).is_none() {
                log::warn!("[scene] window pane '{pane}' not found; sky will not show through it");
            }
        }
        log::info!("[scene] tagged {panes} window pane(s) and {interactive} interactive node(s)");
    }

    /// Parent chain from the immediate parent up to and including the root.
    pub fn ancestors(&self, entity: Entity) -> SmallVec<[Entity; 8]> {
        let mut chain = SmallVec::new();
        let mut current = self.parent(entity);
        while let Some(e) = current {
            chain.push(e);
            current = if e == self.root { None } else { self.parent(e) };
        }
        chain
    }

    /// The node itself plus every descendant that carries a mesh, depth first.
    pub fn descendants_with_mesh(&self, entity: Entity) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut stack = vec![entity];
        while let Some(e) = stack.pop() {
            if self.mesh(e).is_some() {
                out.push(e);
            }
            if let Some(children) = self.world.get::<Children>(e) {
                stack.extend(children.0.iter().rev().copied());
            }
        }
        out
    }

    pub fn renderables(&self) -> impl Iterator<Item = (Entity, &MeshRenderable, Mat4)> + '_ {
        self.nodes
            .iter()
            .filter_map(move |&e| self.mesh(e).map(|mesh| (e, mesh, self.world_matrix(e))))
    }

    pub fn window_panes(&self) -> impl Iterator<Item = (Entity, &MeshRenderable, Mat4)> + '_ {
        self.renderables().filter(move |(e, _, _)| self.is_window_pane(*e))
    }

    /// Built-in room used when no scene file is configured.
    pub fn demo_room(rules: &TagRules) -> Self {
        Self::from_description(&demo_description(), rules)
    }

    /// Loads the scene file at `path`, falling back to the built-in room when absent or unreadable.
    pub fn load_or_demo(path: Option<&str>, rules: &TagRules) -> Self {
        let Some(path) = path else {
            log::info!("[scene] no scene file configured; using the built-in room");
            return Self::demo_room(rules);
        };
        match SceneDescription::load(path) {
            Ok(desc) => {
                let scene = Self::from_description(&desc, rules);
                log::info!(
                    "[scene] loaded {} node(s), {} window pane(s) from {path}",
                    scene.len(),
                    scene.window_panes().count()
                );
                scene
            }
            Err(err) => {
                log::warn!("[scene] {err:#}. Using the built-in room.");
                Self::demo_room(rules)
            }
        }
    }
}

impl Default for RoomScene {
    fn default() -> Self {
        Self::new()
    }
}

fn node(name: &str, translation: [f32; 3], mesh: Option<MeshShape>, color: [f32; 4]) -> NodeDescription {
    NodeDescription {
        name: name.to_string(),
        translation,
        rotation_degrees: [0.0; 3],
        scale: [1.0; 3],
        mesh,
        color,
        children: Vec::new(),
    }
}

fn cuboid(x: f32, y: f32, z: f32) -> Option<MeshShape> {
    Some(MeshShape::Cuboid { size: [x, y, z] })
}

fn demo_description() -> SceneDescription {
    const WALL: [f32; 4] = [0.78, 0.74, 0.68, 1.0];
    const WOOD: [f32; 4] = [0.55, 0.38, 0.24, 1.0];
    const GLASS: [f32; 4] = [0.6, 0.75, 0.9, 1.0];

    let mut desk = node("Desk", [0.0, 0.0, -1.2], None, WOOD);
    desk.children = vec![
        node("Desk_Top", [0.0, 0.75, 0.0], cuboid(1.6, 0.06, 0.7), WOOD),
        node("Desk_Leg_L", [-0.75, 0.36, 0.0], cuboid(0.06, 0.72, 0.6), WOOD),
        node("Desk_Leg_R", [0.75, 0.36, 0.0], cuboid(0.06, 0.72, 0.6), WOOD),
    ];
    let mut laptop = node("Laptop", [0.2, 0.79, -1.2], None, [0.2, 0.2, 0.22, 1.0]);
    laptop.children = vec![
        node("Laptop_Base", [0.0, 0.0, 0.0], cuboid(0.34, 0.02, 0.24), [0.2, 0.2, 0.22, 1.0]),
        node("Laptop_Lid", [0.0, 0.12, -0.12], cuboid(0.34, 0.24, 0.01), [0.15, 0.15, 0.17, 1.0]),
    ];
    let mut shelf = node("Shelf_1", [-1.4, 1.4, -1.7], None, WOOD);
    shelf.children = vec![
        node("Shelf_1_Board", [0.0, 0.0, 0.0], cuboid(0.8, 0.04, 0.25), WOOD),
        node("Shelf_1_Books", [0.1, 0.13, 0.0], cuboid(0.4, 0.22, 0.18), [0.45, 0.2, 0.2, 1.0]),
    ];
    let mut windows = node("Windows", [0.0, 1.5, -1.99], None, GLASS);
    windows.children = vec![
        node("Win_1", [-0.55, 0.0, 0.0], Some(MeshShape::Quad { width: 0.8, height: 0.9 }), GLASS),
        node("Win_2", [0.55, 0.0, 0.0], Some(MeshShape::Quad { width: 0.8, height: 0.9 }), GLASS),
    ];

    let mut room = node("Room", [0.0, 0.0, 0.0], None, WALL);
    room.children = vec![
        node("Floor", [0.0, -0.05, 0.0], cuboid(4.0, 0.1, 4.0), [0.42, 0.36, 0.3, 1.0]),
        node("Wall_Back", [0.0, 1.5, -2.05], cuboid(4.0, 3.0, 0.1), WALL),
        node("Wall_Left", [-2.05, 1.5, 0.0], cuboid(0.1, 3.0, 4.0), WALL),
        windows,
        desk,
        laptop,
        shelf,
        node("Coffee", [-0.4, 0.83, -1.1], cuboid(0.08, 0.1, 0.08), [0.9, 0.9, 0.88, 1.0]),
        node("Cat", [1.2, 0.12, -0.6], cuboid(0.35, 0.24, 0.18), [0.2, 0.18, 0.16, 1.0]),
    ];
    SceneDescription { nodes: vec![room] }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> TagRules {
        TagRules {
            window_panes: vec!["Win_1".into(), "Win_2".into()],
            outline_allow_list: vec!["Desk".into(), "Cat".into()],
        }
    }

    #[test]
    fn tags_follow_name_tables() {
        let scene = RoomScene::demo_room(&rules());
        let win = scene.find_by_name("Win_1").unwrap();
        assert!(scene.is_window_pane(win));
        assert_eq!(scene.window_panes().count(), 2);
        let leg = scene.find_by_name("Desk_Leg_L").unwrap();
        assert!(scene.is_interactive(leg), "prefix match tags children like Desk_Leg_L");
        let floor = scene.find_by_name("Floor").unwrap();
        assert!(!scene.is_interactive(floor));
    }

    #[test]
    fn world_transforms_accumulate_down_the_tree() {
        let scene = RoomScene::demo_room(&rules());
        let top = scene.find_by_name("Desk_Top").unwrap();
        let origin = scene.world_matrix(top).transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(0.0, 0.75, -1.2)).length() < 1e-5);
    }

    #[test]
    fn ancestors_end_at_root() {
        let scene = RoomScene::demo_room(&rules());
        let top = scene.find_by_name("Desk_Top").unwrap();
        let chain = scene.ancestors(top);
        let names: Vec<_> = chain.iter().filter_map(|&e| scene.name(e)).collect();
        assert_eq!(names, vec!["Desk", "Room", "Scene"]);
    }

    #[test]
    fn descendants_include_nested_meshes_only() {
        let scene = RoomScene::demo_room(&rules());
        let desk = scene.find_by_name("Desk").unwrap();
        let meshes = scene.descendants_with_mesh(desk);
        assert_eq!(meshes.len(), 3);
        assert!(!meshes.contains(&desk));
    }
}
