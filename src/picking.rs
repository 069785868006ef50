use crate::mesh::MeshBounds;
use crate::scene::RoomScene;
use bevy_ecs::prelude::Entity;
use glam::{Mat4, Vec3};

const BOUNDS_PADDING: f32 = 1e-4;

/// Nearest intersection along a pick ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub entity: Entity,
    pub distance: f32,
    pub point: Vec3,
}

pub fn matrix_is_finite(mat: &Mat4) -> bool {
    mat.to_cols_array().iter().all(|v| v.is_finite())
}

/// Slab test. Returns the entry distance (or exit distance when the origin is inside).
pub fn ray_aabb_intersection(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_min: f32 = 0.0;
    let mut t_max: f32 = f32::INFINITY;
    for axis in 0..3 {
        let (o, d) = (origin[axis], dir[axis]);
        if d.abs() < 1e-6 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv_d = 1.0 / d;
        let mut t1 = (min[axis] - o) * inv_d;
        let mut t2 = (max[axis] - o) * inv_d;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_min > t_max {
            return None;
        }
    }
    if t_max < 0.0 {
        return None;
    }
    Some(if t_min >= 0.0 { t_min } else { t_max })
}

/// Bounds test in the mesh's local frame, so rotated meshes keep tight boxes.
pub fn ray_hits_bounds(origin: Vec3, dir: Vec3, model: &Mat4, bounds: &MeshBounds) -> bool {
    if !matrix_is_finite(model) {
        return false;
    }
    let inv = model.inverse();
    if !matrix_is_finite(&inv) {
        return false;
    }
    let local_origin = inv.transform_point3(origin);
    let local_dir = inv.transform_vector3(dir);
    if local_dir.length_squared() <= f32::EPSILON {
        return false;
    }
    let pad = Vec3::splat(BOUNDS_PADDING);
    ray_aabb_intersection(local_origin, local_dir, bounds.min - pad, bounds.max + pad).is_some()
}

/// Moller-Trumbore, both faces.
pub fn ray_triangle_intersection(origin: Vec3, dir: Vec3, tri: [Vec3; 3]) -> Option<f32> {
    let [a, b, c] = tri;
    let edge1 = b - a;
    let edge2 = c - a;
    let p = dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > 1e-6).then_some(t)
}

/// Casts against every mesh in the scene and returns the closest hit.
pub fn pick_nearest(scene: &RoomScene, origin: Vec3, dir: Vec3) -> Option<PickHit> {
    let dir = dir.normalize_or_zero();
    if dir == Vec3::ZERO {
        return None;
    }
    let mut best: Option<PickHit> = None;
    for (entity, renderable, model) in scene.renderables() {
        if !ray_hits_bounds(origin, dir, &model, &renderable.mesh.bounds) {
            continue;
        }
        for tri in renderable.mesh.world_triangles(model) {
            if let Some(t) = ray_triangle_intersection(origin, dir, tri) {
                if best.map_or(true, |hit| t < hit.distance) {
                    best = Some(PickHit { entity, distance: t, point: origin + dir * t });
                }
            }
        }
    }
    best
}
