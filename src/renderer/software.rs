//! CPU rasterizer executing the same pass plan as the GPU path. Used for captures and tests.

use super::passes::{CullMode, FramePass, PassState, StencilMode, MAIN_FRAME};
use super::{DrawItem, FrameDrawList, SceneLighting};
use crate::camera3d::sky_camera_projection;
use crate::canvas::SkyCanvas;
use crate::mesh::TriMesh;
use crate::outline::OutlineStyle;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::sync::{Arc, OnceLock};

pub struct SoftwareInputs<'a> {
    pub draws: &'a FrameDrawList,
    pub view: Mat4,
    pub proj: Mat4,
    pub sky: &'a SkyCanvas,
    pub clear_color: [f32; 3],
    pub lighting: SceneLighting,
    pub outline: OutlineStyle,
}

#[derive(Clone, Copy)]
enum Shade<'a> {
    Lit(Vec4),
    Flat(Vec4),
    Sky(&'a SkyCanvas),
}

#[derive(Clone, Copy)]
struct ScreenVertex {
    pos: Vec2,
    depth: f32,
    normal: Vec3,
}

/// Color, depth and stencil targets with the same semantics as the GPU attachments.
pub struct SoftwareFrame {
    width: u32,
    height: u32,
    color: Vec<[u8; 4]>,
    depth: Vec<f32>,
    stencil: Vec<u8>,
}

impl SoftwareFrame {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let len = width as usize * height as usize;
        Self { width, height, color: vec![[0, 0, 0, 255]; len], depth: vec![1.0; len], stencil: vec![0; len] }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.color[self.index(x, y)]
    }

    pub fn stencil(&self, x: u32, y: u32) -> u8 {
        self.stencil[self.index(x, y)]
    }

    pub fn depth(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Main frame followed by the outline overlay.
    pub fn render(&mut self, inputs: &SoftwareInputs<'_>) {
        for pass in MAIN_FRAME {
            self.run_pass(pass, inputs);
        }
        self.run_pass(FramePass::Outline, inputs);
    }

    pub fn run_pass(&mut self, pass: FramePass, inputs: &SoftwareInputs<'_>) {
        let state = PassState::for_pass(pass);
        match pass {
            FramePass::Clear => self.clear(inputs.clear_color),
            FramePass::Scene => {
                for item in &inputs.draws.scene {
                    let shade = Shade::Lit(item.color);
                    self.draw(item, inputs.view, inputs.proj, 0.0, &state, shade, &inputs.lighting);
                }
            }
            FramePass::WindowMask => {
                for item in &inputs.draws.windows {
                    let shade = Shade::Flat(item.color);
                    self.draw(item, inputs.view, inputs.proj, 0.0, &state, shade, &inputs.lighting);
                }
            }
            FramePass::Sky => {
                let quad = DrawItem { mesh: sky_quad(), model: Mat4::IDENTITY, color: Vec4::ONE };
                let proj = sky_camera_projection();
                self.draw(&quad, Mat4::IDENTITY, proj, 0.0, &state, Shade::Sky(inputs.sky), &inputs.lighting);
            }
            FramePass::Outline => {
                let shade = Shade::Flat(inputs.outline.color);
                let thickness = inputs.outline.thickness;
                for item in &inputs.draws.outlines {
                    self.draw(item, inputs.view, inputs.proj, thickness, &state, shade, &inputs.lighting);
                }
            }
        }
    }

    fn clear(&mut self, color: [f32; 3]) {
        let rgba = [to_u8(color[0]), to_u8(color[1]), to_u8(color[2]), 255];
        self.color.fill(rgba);
        self.depth.fill(1.0);
        self.stencil.fill(0);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw(
        &mut self,
        item: &DrawItem,
        view: Mat4,
        proj: Mat4,
        inflate: f32,
        state: &PassState,
        shade: Shade<'_>,
        lighting: &SceneLighting,
    ) {
        let model_view = view * item.model;
        let (w, h) = (self.width as f32, self.height as f32);
        let project = |index: u32| -> Option<ScreenVertex> {
            let vertex = item.mesh.vertices.get(index as usize)?;
            let mut view_pos = model_view.transform_point3(vertex.position());
            if inflate != 0.0 {
                let n = model_view.transform_vector3(vertex.normal()).normalize_or_zero();
                view_pos.x += n.x * inflate;
                view_pos.y += n.y * inflate;
            }
            let clip = proj * view_pos.extend(1.0);
            if clip.w <= 1e-5 {
                return None;
            }
            let ndc = clip.truncate() / clip.w;
            Some(ScreenVertex {
                pos: Vec2::new((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h),
                depth: ndc.z,
                normal: item.model.transform_vector3(vertex.normal()).normalize_or_zero(),
            })
        };
        for tri in item.mesh.indices.chunks_exact(3) {
            let (Some(a), Some(b), Some(c)) = (project(tri[0]), project(tri[1]), project(tri[2])) else {
                continue;
            };
            self.raster_triangle([a, b, c], state, shade, lighting);
        }
    }

    fn raster_triangle(
        &mut self,
        [a, b, c]: [ScreenVertex; 3],
        state: &PassState,
        shade: Shade<'_>,
        lighting: &SceneLighting,
    ) {
        let area = edge(a.pos, b.pos, c.pos);
        if area.abs() <= f32::EPSILON {
            return;
        }
        // screen y points down, so counter-clockwise in NDC is negative area here
        let front_facing = area < 0.0;
        match state.cull {
            CullMode::Back if !front_facing => return,
            CullMode::Front if front_facing => return,
            _ => {}
        }
        let min = a.pos.min(b.pos).min(c.pos);
        let max = a.pos.max(b.pos).max(c.pos);
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(self.width);
        let y1 = (max.y.ceil().max(0.0) as u32).min(self.height);
        let face_normal = (a.normal + b.normal + c.normal).normalize_or_zero();

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let wa = edge(b.pos, c.pos, p) / area;
                let wb = edge(c.pos, a.pos, p) / area;
                let wc = edge(a.pos, b.pos, p) / area;
                if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                    continue;
                }
                let z = wa * a.depth + wb * b.depth + wc * c.depth;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }
                let i = self.index(x, y);
                let stencil_pass = match state.stencil {
                    StencilMode::Disabled | StencilMode::Stamp { .. } => true,
                    StencilMode::Equal { reference } => u32::from(self.stencil[i]) == reference,
                };
                if !stencil_pass {
                    continue;
                }
                if state.depth_test && z > self.depth[i] {
                    continue;
                }
                if let StencilMode::Stamp { reference } = state.stencil {
                    self.stencil[i] = (reference & 0xff) as u8;
                }
                if state.depth_write {
                    self.depth[i] = z;
                }
                if state.color_write {
                    self.color[i] = shade_pixel(shade, face_normal, lighting, p, self.width, self.height);
                }
            }
        }
    }

    pub fn to_image(&self) -> image::RgbaImage {
        let bytes: Vec<u8> = self.color.iter().flat_map(|px| px.iter().copied()).collect();
        image::RgbaImage::from_raw(self.width, self.height, bytes)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }
}

fn sky_quad() -> Arc<TriMesh> {
    static QUAD: OnceLock<Arc<TriMesh>> = OnceLock::new();
    QUAD.get_or_init(|| Arc::new(TriMesh::quad(2.0, 2.0))).clone()
}

#[inline]
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

fn shade_pixel(
    shade: Shade<'_>,
    normal: Vec3,
    lighting: &SceneLighting,
    p: Vec2,
    width: u32,
    height: u32,
) -> [u8; 4] {
    match shade {
        Shade::Flat(color) => [to_u8(color.x), to_u8(color.y), to_u8(color.z), 255],
        Shade::Lit(color) => {
            let rgb = lighting.shade(color.truncate(), normal);
            [to_u8(rgb.x), to_u8(rgb.y), to_u8(rgb.z), 255]
        }
        Shade::Sky(canvas) => {
            let u = p.x / width as f32;
            let v = p.y / height as f32;
            let tx = ((u * canvas.width() as f32) as u32).min(canvas.width() - 1);
            let ty = ((v * canvas.height() as f32) as u32).min(canvas.height() - 1);
            let texel = canvas.pixel(tx, ty).unwrap_or([0, 0, 0, 255]);
            [texel[0], texel[1], texel[2], 255]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_offsets_do_not_overflow_u32() {
        let frame =
            SoftwareFrame { width: 70_000, height: 70_000, color: Vec::new(), depth: Vec::new(), stencil: Vec::new() };
        assert_eq!(frame.index(69_999, 69_999), 69_999usize * 70_000 + 69_999);
    }
}
