pub mod passes;
pub mod software;
pub mod window_surface;

use crate::canvas::SkyCanvas;
use crate::camera3d::sky_camera_projection;
use crate::config::WindowConfig;
use crate::mesh::{MeshVertex, TriMesh};
use crate::outline::{OutlinePicker, OutlineStyle};
use crate::scene::RoomScene;
use anyhow::{Context, Result};
use glam::{Mat4, Vec3, Vec4};
use passes::{FramePass, PassState};
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;
use window_surface::WindowSurface;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;
pub const SKY_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// One mesh instance to draw.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub mesh: Arc<TriMesh>,
    pub model: Mat4,
    pub color: Vec4,
}

/// Everything a frame draws, split by pass.
#[derive(Debug, Clone, Default)]
pub struct FrameDrawList {
    pub scene: Vec<DrawItem>,
    pub windows: Vec<DrawItem>,
    pub outlines: Vec<DrawItem>,
}

impl FrameDrawList {
    pub fn collect(scene: &RoomScene, picker: &OutlinePicker) -> Self {
        let item = |(_, renderable, model): (_, &crate::scene::MeshRenderable, Mat4)| DrawItem {
            mesh: Arc::clone(&renderable.mesh),
            model,
            color: renderable.color,
        };
        let color = picker.style().color;
        Self {
            scene: scene.renderables().map(item).collect(),
            windows: scene.window_panes().map(item).collect(),
            outlines: picker
                .outlines()
                .iter()
                .map(|o| DrawItem { mesh: Arc::clone(&o.mesh), model: o.model, color })
                .collect(),
        }
    }
}

/// Single directional light plus a flat ambient term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLighting {
    /// Direction the light travels, world space.
    pub direction: Vec3,
    pub ambient: f32,
}

impl Default for SceneLighting {
    fn default() -> Self {
        Self { direction: Vec3::new(-0.4, -1.0, -0.6).normalize(), ambient: 0.45 }
    }
}

impl SceneLighting {
    pub fn shade(&self, albedo: Vec3, normal: Vec3) -> Vec3 {
        let diffuse = normal.dot(-self.direction).max(0.0);
        albedo * (self.ambient + (1.0 - self.ambient) * diffuse)
    }
}

/// Per-frame camera and style state handed to the GPU renderer.
pub struct FrameInputs<'a> {
    pub draws: &'a FrameDrawList,
    pub view: Mat4,
    pub proj: Mat4,
    pub sky: &'a SkyCanvas,
    pub lighting: SceneLighting,
    pub outline: OutlineStyle,
    pub outline_generation: u64,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniform {
    view_proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
    // x: ambient, y: outline thickness
    params: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniform {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SkyUniform {
    projection: [[f32; 4]; 4],
}

struct GpuMesh {
    _source: Arc<TriMesh>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Dynamic-offset uniform buffer holding one `DrawUniform` per draw.
struct DrawUniforms {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
    stride: u64,
}

impl DrawUniforms {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: usize, label: &str) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment.max(1));
        let size = std::mem::size_of::<DrawUniform>() as u64;
        let stride = size.div_ceil(alignment) * alignment;
        let capacity = capacity.max(1);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size),
                }),
            }],
        });
        Self { buffer, bind_group, capacity, stride }
    }

    fn write(&self, queue: &wgpu::Queue, items: &[DrawItem]) {
        let mut bytes = vec![0u8; self.stride as usize * items.len()];
        for (i, item) in items.iter().enumerate() {
            let uniform = DrawUniform { model: item.model.to_cols_array_2d(), color: item.color.to_array() };
            let start = i * self.stride as usize;
            bytes[start..start + std::mem::size_of::<DrawUniform>()].copy_from_slice(bytemuck::bytes_of(&uniform));
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, &bytes);
        }
    }

    fn offset(&self, index: usize) -> u32 {
        (self.stride * index as u64) as u32
    }
}

/// GPU resources for the current hover outline. Replaced wholesale when the hovered group changes.
struct OutlineResources {
    generation: u64,
    uniforms: DrawUniforms,
}

struct SkyTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

struct FramePipelines {
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_layout: wgpu::BindGroupLayout,
    sky_layout: wgpu::BindGroupLayout,
    sky_uniform: wgpu::Buffer,
    sky_sampler: wgpu::Sampler,
    scene: wgpu::RenderPipeline,
    window_mask: wgpu::RenderPipeline,
    sky: wgpu::RenderPipeline,
    outline: wgpu::RenderPipeline,
}

pub struct Renderer {
    surface: WindowSurface,
    pipelines: Option<FramePipelines>,
    sky_texture: Option<SkyTexture>,
    meshes: HashMap<usize, GpuMesh>,
    draw_uniforms: Option<DrawUniforms>,
    outlines: Option<OutlineResources>,
    clear_color: wgpu::Color,
}

impl Renderer {
    pub fn new(window_cfg: &WindowConfig, background: [f32; 3]) -> Self {
        Self {
            surface: WindowSurface::new(window_cfg),
            pipelines: None,
            sky_texture: None,
            meshes: HashMap::new(),
            draw_uniforms: None,
            outlines: None,
            clear_color: wgpu::Color {
                r: f64::from(background[0]),
                g: f64::from(background[1]),
                b: f64::from(background[2]),
                a: 1.0,
            },
        }
    }

    pub fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        self.surface.ensure_window(event_loop)?;
        if self.pipelines.is_none() {
            let device = self.surface.device()?;
            let format = self.surface.surface_format()?;
            self.pipelines = Some(create_pipelines(device, format));
        }
        Ok(())
    }

    pub fn window(&self) -> Option<&Window> {
        self.surface.window()
    }

    pub fn request_redraw(&self) {
        self.surface.request_redraw();
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.surface.size()
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.surface.resize(new_size);
    }

    pub fn render_frame(&mut self, inputs: &FrameInputs<'_>) -> Result<()> {
        let device = self.surface.device()?.clone();
        let queue = self.surface.queue()?.clone();
        let pipelines = self.pipelines.as_ref().context("Render pipelines not initialized")?;

        let frame_uniform = FrameUniform {
            view_proj: (inputs.proj * inputs.view).to_cols_array_2d(),
            view: inputs.view.to_cols_array_2d(),
            proj: inputs.proj.to_cols_array_2d(),
            light_dir: inputs.lighting.direction.extend(0.0).to_array(),
            params: [inputs.lighting.ambient, inputs.outline.thickness, 0.0, 0.0],
        };
        queue.write_buffer(&pipelines.frame_buffer, 0, bytemuck::bytes_of(&frame_uniform));
        queue.write_buffer(
            &pipelines.sky_uniform,
            0,
            bytemuck::bytes_of(&SkyUniform { projection: sky_camera_projection().to_cols_array_2d() }),
        );

        self.upload_sky(&device, &queue, inputs.sky);
        for item in inputs.draws.scene.iter().chain(&inputs.draws.windows).chain(&inputs.draws.outlines) {
            self.ensure_mesh(&device, &item.mesh);
        }
        let main_items: Vec<DrawItem> =
            inputs.draws.scene.iter().chain(inputs.draws.windows.iter()).cloned().collect();
        self.ensure_draw_capacity(&device, main_items.len());
        self.sync_outlines(&device, inputs.outline_generation, inputs.draws.outlines.len());

        let pipelines = self.pipelines.as_ref().context("Render pipelines not initialized")?;
        let draw_uniforms = self.draw_uniforms.as_ref().context("Draw uniforms missing")?;
        draw_uniforms.write(&queue, &main_items);
        if let Some(outlines) = self.outlines.as_ref() {
            outlines.uniforms.write(&queue, &inputs.draws.outlines);
        }
        let sky = self.sky_texture.as_ref().context("Sky texture missing")?;

        let frame = self.surface.acquire_surface_frame()?;
        let depth_view = self.surface.depth_view()?;
        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Frame Encoder") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Room Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame.view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Clear(self.clear_color), store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Clear(1.0), store: wgpu::StoreOp::Store }),
                    stencil_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Clear(0), store: wgpu::StoreOp::Store }),
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_bind_group(0, &pipelines.frame_bind_group, &[]);

            pass.set_pipeline(&pipelines.scene);
            for (i, item) in inputs.draws.scene.iter().enumerate() {
                self.draw_mesh(&mut pass, item, &draw_uniforms.bind_group, draw_uniforms.offset(i));
            }

            let mask_state = PassState::for_pass(FramePass::WindowMask);
            pass.set_pipeline(&pipelines.window_mask);
            pass.set_stencil_reference(mask_state.stencil_reference());
            let base = inputs.draws.scene.len();
            for (i, item) in inputs.draws.windows.iter().enumerate() {
                self.draw_mesh(&mut pass, item, &draw_uniforms.bind_group, draw_uniforms.offset(base + i));
            }

            let sky_state = PassState::for_pass(FramePass::Sky);
            pass.set_pipeline(&pipelines.sky);
            pass.set_stencil_reference(sky_state.stencil_reference());
            pass.set_bind_group(0, &sky.bind_group, &[]);
            pass.draw(0..6, 0..1);
        }
        if let Some(outlines) = self.outlines.as_ref().filter(|_| !inputs.draws.outlines.is_empty()) {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Outline Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame.view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store }),
                    stencil_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store }),
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipelines.outline);
            pass.set_bind_group(0, &pipelines.frame_bind_group, &[]);
            for (i, item) in inputs.draws.outlines.iter().enumerate() {
                self.draw_mesh(&mut pass, item, &outlines.uniforms.bind_group, outlines.uniforms.offset(i));
            }
        }
        queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn draw_mesh(&self, pass: &mut wgpu::RenderPass<'_>, item: &DrawItem, bind_group: &wgpu::BindGroup, offset: u32) {
        let Some(mesh) = self.meshes.get(&mesh_key(&item.mesh)) else {
            return;
        };
        pass.set_bind_group(1, bind_group, &[offset]);
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    fn ensure_mesh(&mut self, device: &wgpu::Device, mesh: &Arc<TriMesh>) {
        let key = mesh_key(mesh);
        if self.meshes.contains_key(&key) || mesh.indices.is_empty() {
            return;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.meshes.insert(
            key,
            GpuMesh {
                _source: Arc::clone(mesh),
                vertex_buffer,
                index_buffer,
                index_count: mesh.indices.len() as u32,
            },
        );
    }

    fn ensure_draw_capacity(&mut self, device: &wgpu::Device, count: usize) {
        let Some(pipelines) = self.pipelines.as_ref() else {
            return;
        };
        if self.draw_uniforms.as_ref().is_some_and(|u| u.capacity >= count) {
            return;
        }
        let capacity = count.max(64).next_power_of_two();
        self.draw_uniforms = Some(DrawUniforms::new(device, &pipelines.draw_layout, capacity, "Draw Uniforms"));
    }

    /// Releases the previous outline buffers as soon as the hovered group changes.
    fn sync_outlines(&mut self, device: &wgpu::Device, generation: u64, count: usize) {
        let stale = self.outlines.as_ref().map_or(true, |o| o.generation != generation || o.uniforms.capacity < count);
        if !stale {
            return;
        }
        if let Some(old) = self.outlines.take() {
            old.uniforms.buffer.destroy();
        }
        if count == 0 {
            return;
        }
        let Some(pipelines) = self.pipelines.as_ref() else {
            return;
        };
        let uniforms = DrawUniforms::new(device, &pipelines.draw_layout, count, "Outline Uniforms");
        self.outlines = Some(OutlineResources { generation, uniforms });
    }

    fn upload_sky(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, canvas: &SkyCanvas) {
        let size = canvas.size();
        if self.sky_texture.as_ref().map(|s| s.size) != Some(size) {
            let Some(pipelines) = self.pipelines.as_ref() else {
                return;
            };
            if let Some(old) = self.sky_texture.take() {
                old.texture.destroy();
            }
            self.sky_texture = Some(create_sky_texture(device, pipelines, size));
            log::debug!("[renderer] sky texture {}x{}", size.0, size.1);
        }
        let Some(sky) = self.sky_texture.as_ref() else {
            return;
        };
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &sky.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            canvas.as_bytes(),
            wgpu::TexelCopyBufferLayout { offset: 0, bytes_per_row: Some(4 * size.0), rows_per_image: Some(size.1) },
            wgpu::Extent3d { width: size.0, height: size.1, depth_or_array_layers: 1 },
        );
    }
}

fn mesh_key(mesh: &Arc<TriMesh>) -> usize {
    Arc::as_ptr(mesh) as usize
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages, dynamic: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_sky_texture(device: &wgpu::Device, pipelines: &FramePipelines, size: (u32, u32)) -> SkyTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Sky Canvas Texture"),
        size: wgpu::Extent3d { width: size.0, height: size.1, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SKY_TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Sky Bind Group"),
        layout: &pipelines.sky_layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: pipelines.sky_uniform.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&view) },
            wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&pipelines.sky_sampler) },
        ],
    });
    SkyTexture { texture, bind_group, size }
}

struct PipelineDesc<'a> {
    label: &'a str,
    module: &'a wgpu::ShaderModule,
    layout: &'a wgpu::PipelineLayout,
    pass: FramePass,
    vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    blend: Option<wgpu::BlendState>,
}

fn build_pipeline(device: &wgpu::Device, format: wgpu::TextureFormat, desc: PipelineDesc<'_>) -> wgpu::RenderPipeline {
    let state = PassState::for_pass(desc.pass);
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: desc.module,
            entry_point: Some("vs_main"),
            buffers: desc.vertex_buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState { format, blend: desc.blend, write_mask: state.color_writes() })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: state.cull_face(),
            ..Default::default()
        },
        depth_stencil: Some(state.depth_stencil_state()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_pipelines(device: &wgpu::Device, format: wgpu::TextureFormat) -> FramePipelines {
    let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Scene Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("../assets/shaders/scene.wgsl").into()),
    });
    let outline_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Outline Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("../assets/shaders/outline.wgsl").into()),
    });
    let sky_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Sky Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("../assets/shaders/sky.wgsl").into()),
    });

    let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Frame Layout"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, false)],
    });
    let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Draw Layout"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, true)],
    });
    let sky_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Sky Layout"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX, false),
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Frame Uniform"),
        size: std::mem::size_of::<FrameUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Frame Bind Group"),
        layout: &frame_layout,
        entries: &[wgpu::BindGroupEntry { binding: 0, resource: frame_buffer.as_entire_binding() }],
    });
    let sky_uniform = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sky Uniform"),
        size: std::mem::size_of::<SkyUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let sky_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Sky Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Mesh Pipeline Layout"),
        bind_group_layouts: &[&frame_layout, &draw_layout],
        push_constant_ranges: &[],
    });
    let sky_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Sky Pipeline Layout"),
        bind_group_layouts: &[&sky_layout],
        push_constant_ranges: &[],
    });
    let vertex_buffers = [MeshVertex::layout()];

    let scene = build_pipeline(
        device,
        format,
        PipelineDesc {
            label: "Scene Pipeline",
            module: &scene_shader,
            layout: &mesh_layout,
            pass: FramePass::Scene,
            vertex_buffers: &vertex_buffers,
            blend: None,
        },
    );
    let window_mask = build_pipeline(
        device,
        format,
        PipelineDesc {
            label: "Window Mask Pipeline",
            module: &scene_shader,
            layout: &mesh_layout,
            pass: FramePass::WindowMask,
            vertex_buffers: &vertex_buffers,
            blend: None,
        },
    );
    let sky = build_pipeline(
        device,
        format,
        PipelineDesc {
            label: "Sky Pipeline",
            module: &sky_shader,
            layout: &sky_pipeline_layout,
            pass: FramePass::Sky,
            vertex_buffers: &[],
            blend: None,
        },
    );
    let outline = build_pipeline(
        device,
        format,
        PipelineDesc {
            label: "Outline Pipeline",
            module: &outline_shader,
            layout: &mesh_layout,
            pass: FramePass::Outline,
            vertex_buffers: &vertex_buffers,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        },
    );

    FramePipelines {
        frame_buffer,
        frame_bind_group,
        draw_layout,
        sky_layout,
        sky_uniform,
        sky_sampler,
        scene,
        window_mask,
        sky,
        outline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::OutlinePicker;
    use crate::scene::TagRules;

    #[test]
    fn uniform_layouts_match_shader_sizes() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 224);
        assert_eq!(std::mem::size_of::<DrawUniform>(), 80);
        assert_eq!(std::mem::size_of::<MeshVertex>(), 24);
    }

    #[test]
    fn draw_list_splits_window_panes() {
        let rules = TagRules { window_panes: vec!["Win_1".into()], outline_allow_list: Vec::new() };
        let scene = RoomScene::demo_room(&rules);
        let draws = FrameDrawList::collect(&scene, &OutlinePicker::default());
        assert_eq!(draws.windows.len(), 1);
        assert!(draws.scene.len() > draws.windows.len());
        assert!(draws.outlines.is_empty());
    }

    #[test]
    fn lighting_keeps_ambient_floor() {
        let lighting = SceneLighting::default();
        let away = lighting.shade(Vec3::ONE, lighting.direction);
        assert!((away.x - lighting.ambient).abs() < 1e-6);
        let facing = lighting.shade(Vec3::ONE, -lighting.direction);
        assert!((facing.x - 1.0).abs() < 1e-5);
    }
}
