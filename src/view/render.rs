use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::error::AssetError;
use crate::model::{ObjectId, TextureSlot};
use crate::view::gpu_init::GpuContext;
use crate::view::mesh::{Aabb, MeshLibrary, Vertex};
use crate::view::texture::TextureSet;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const BUILTIN_SHADER: &str = include_str!("shaders/scene.wgsl");
const INITIAL_OBJECT_CAPACITY: u64 = 64;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

impl CameraUniform {
    pub fn new(view_proj: Mat4, eye: Vec3) -> Self {
        Self { view_proj: view_proj.to_cols_array_2d(), eye: eye.extend(1.0).to_array() }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightingUniform {
    pub fill_dir: [f32; 3],
    pub intensity: f32,
    pub ambient: f32,
    pub _pad1: f32,
    pub _pad2: f32,
    pub _pad3: f32,
}

impl Default for LightingUniform {
    fn default() -> Self {
        Self {
            fill_dir: [-0.3, -1.0, -0.4],
            intensity: 1.0,
            ambient: 0.15,
            _pad1: 0.0,
            _pad2: 0.0,
            _pad3: 0.0,
        }
    }
}

/// Per-draw data bound at a dynamic offset
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub bbox_min: [f32; 4],
    pub bbox_max: [f32; 4],
    pub tint: [f32; 4],
    pub object_id: u32,
    pub uv_mapping: u32,
    pub blend_secondary: u32,
    pub _pad: u32,
}

impl ObjectUniform {
    pub fn new(model: Mat4, bbox: Aabb, object: ObjectId) -> Self {
        let material = object.material();
        // empty boxes would feed inf into the UV fallbacks
        let (min, max) = if bbox.is_empty() { (Vec3::ZERO, Vec3::ONE) } else { (bbox.min, bbox.max) };
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
            bbox_min: min.extend(1.0).to_array(),
            bbox_max: max.extend(1.0).to_array(),
            tint: material.tint,
            object_id: object.code(),
            uv_mapping: material.mapping as u32,
            blend_secondary: material.secondary.is_some() as u32,
            _pad: 0,
        }
    }
}

pub fn align_to(value: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

fn material_key(object: ObjectId) -> (TextureSlot, TextureSlot) {
    let material = object.material();
    (material.primary, material.secondary.unwrap_or(material.primary))
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
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

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn create_scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    source: &str,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("scene_pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState { format, blend: Some(wgpu::BlendState::REPLACE), write_mask: wgpu::ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

fn read_shader(path: Option<&Path>) -> Result<String, AssetError> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| AssetError::Io { path: path.to_path_buf(), source }),
        None => Ok(BUILTIN_SHADER.to_string()),
    }
}

struct QueuedDraw {
    mesh: usize,
    material: (TextureSlot, TextureSlot),
}

/// Scene pass: one pipeline, per-object uniforms, cached material bind groups
pub struct Renderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    format: wgpu::TextureFormat,
    shader_path: Option<PathBuf>,

    meshes: MeshLibrary,
    textures: TextureSet,

    camera_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,

    object_layout: wgpu::BindGroupLayout,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_stride: u64,
    object_capacity: u64,

    material_layout: wgpu::BindGroupLayout,
    material_groups: HashMap<(TextureSlot, TextureSlot), wgpu::BindGroup>,

    pipeline_layout: wgpu::PipelineLayout,
    pipeline: wgpu::RenderPipeline,

    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,

    draws: Vec<QueuedDraw>,
    objects: Vec<ObjectUniform>,
}

impl Renderer {
    pub fn new(
        gpu: &GpuContext,
        meshes: MeshLibrary,
        textures: TextureSet,
        shader_path: Option<PathBuf>,
    ) -> Result<Self, AssetError> {
        let device = gpu.device.clone();

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera_buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lighting_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lighting_buffer"),
            size: std::mem::size_of::<LightingUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue.write_buffer(&lighting_buffer, 0, bytemuck::bytes_of(&LightingUniform::default()));

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT, false),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT, false),
            ],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
            ],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT, true)],
        });
        let object_stride = align_to(
            std::mem::size_of::<ObjectUniform>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let (object_buffer, object_bind_group) =
            create_object_buffer(&device, &object_layout, object_stride, INITIAL_OBJECT_CAPACITY);

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &object_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let source = read_shader(shader_path.as_deref())?;
        let pipeline = compile_checked(&device, &pipeline_layout, gpu.format, &source)?;

        let (depth_texture, depth_view) = create_depth_texture(&device, gpu.config.width, gpu.config.height);

        Ok(Self {
            device,
            queue: gpu.queue.clone(),
            format: gpu.format,
            shader_path,
            meshes,
            textures,
            camera_buffer,
            frame_bind_group,
            object_layout,
            object_buffer,
            object_bind_group,
            object_stride,
            object_capacity: INITIAL_OBJECT_CAPACITY,
            material_layout,
            material_groups: HashMap::new(),
            pipeline_layout,
            pipeline,
            _depth_texture: depth_texture,
            depth_view,
            draws: Vec::new(),
            objects: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let (texture, view) = create_depth_texture(&self.device, width, height);
        self._depth_texture = texture;
        self.depth_view = view;
    }

    /// Clears queued draws and uploads the camera for this frame.
    pub fn begin_frame(&mut self, view_proj: Mat4, eye: Vec3) {
        self.draws.clear();
        self.objects.clear();
        self.queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&CameraUniform::new(view_proj, eye)));
    }

    pub fn draw_object(&mut self, name: &str, model: Mat4, object: ObjectId) -> Result<(), AssetError> {
        let mesh = self.meshes.index_of(name).ok_or_else(|| AssetError::MissingMesh(name.to_string()))?;
        let bbox = self.meshes.get(mesh).map(|m| m.bbox).unwrap_or_else(Aabb::empty);
        let material = material_key(object);
        self.ensure_material(material);
        self.draws.push(QueuedDraw { mesh, material });
        self.objects.push(ObjectUniform::new(model, bbox, object));
        Ok(())
    }

    fn ensure_material(&mut self, key: (TextureSlot, TextureSlot)) {
        if self.material_groups.contains_key(&key) {
            return;
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(self.textures.view(key.0)) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(self.textures.view(key.1)) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&self.textures.sampler) },
            ],
        });
        self.material_groups.insert(key, bind_group);
    }

    fn upload_objects(&mut self) {
        let needed = self.objects.len() as u64;
        if needed > self.object_capacity {
            let capacity = needed.next_power_of_two();
            let (buffer, bind_group) = create_object_buffer(&self.device, &self.object_layout, self.object_stride, capacity);
            self.object_buffer = buffer;
            self.object_bind_group = bind_group;
            self.object_capacity = capacity;
            tracing::debug!(capacity, "grew object uniform buffer");
        }

        let stride = self.object_stride as usize;
        let mut bytes = vec![0u8; stride * self.objects.len()];
        for (i, object) in self.objects.iter().enumerate() {
            let src = bytemuck::bytes_of(object);
            bytes[i * stride..i * stride + src.len()].copy_from_slice(src);
        }
        if !bytes.is_empty() {
            self.queue.write_buffer(&self.object_buffer, 0, &bytes);
        }
    }

    /// Records the scene pass for everything queued since `begin_frame`.
    pub fn encode(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        self.upload_objects();

        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        rp.set_pipeline(&self.pipeline);
        rp.set_bind_group(0, &self.frame_bind_group, &[]);

        for (i, draw) in self.draws.iter().enumerate() {
            let (Some(mesh), Some(material)) = (self.meshes.get(draw.mesh), self.material_groups.get(&draw.material)) else {
                continue;
            };
            if mesh.index_count == 0 {
                continue;
            }
            let offset = (i as u64 * self.object_stride) as u32;
            rp.set_bind_group(1, &self.object_bind_group, &[offset]);
            rp.set_bind_group(2, material, &[]);
            rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            rp.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rp.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    /// Rebuilds the pipeline from source; on any error the current one stays.
    pub fn reload_shaders(&mut self) {
        let source = match read_shader(self.shader_path.as_deref()) {
            Ok(source) => source,
            Err(err) => {
                tracing::error!(error = %err, "shader reload failed");
                return;
            }
        };
        match compile_checked(&self.device, &self.pipeline_layout, self.format, &source) {
            Ok(pipeline) => {
                self.pipeline = pipeline;
                tracing::info!("shaders reloaded");
            }
            Err(err) => tracing::error!(error = %err, "shader reload failed, keeping previous pipeline"),
        }
    }
}

fn create_object_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    capacity: u64,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("object_buffer"),
        size: stride * capacity,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("object_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<ObjectUniform>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}

/// Compiles inside a validation scope so bad WGSL surfaces as an error.
fn compile_checked(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    source: &str,
) -> Result<wgpu::RenderPipeline, AssetError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = create_scene_pipeline(device, layout, format, source);
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(AssetError::Shader(err.to_string())),
        None => Ok(pipeline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(0, 256), 0);
        assert_eq!(align_to(1, 256), 256);
        assert_eq!(align_to(192, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(10, 0), 10);
    }

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 32);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 192);
    }

    #[test]
    fn test_object_uniform_material_fields() {
        let mut bbox = Aabb::empty();
        bbox.extend(Vec3::new(-1.0, 0.0, -1.0));
        bbox.extend(Vec3::new(1.0, 2.0, 1.0));
        let globe = ObjectUniform::new(Mat4::IDENTITY, bbox, ObjectId::Sphere);
        assert_eq!(globe.object_id, 0);
        assert_eq!(globe.uv_mapping, 2);
        assert_eq!(globe.blend_secondary, 1);
        assert_eq!(globe.bbox_max, [1.0, 2.0, 1.0, 1.0]);

        let wall = ObjectUniform::new(Mat4::IDENTITY, bbox, ObjectId::Wall);
        assert_eq!(wall.blend_secondary, 0);
        assert_eq!(wall.uv_mapping, 0);
    }

    #[test]
    fn test_normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let u = ObjectUniform::new(model, Aabb::empty(), ObjectId::Floor);
        let normal = Mat4::from_cols_array_2d(&u.normal);
        let n = normal.transform_vector3(Vec3::X);
        assert!((n.x - 0.5).abs() < 1e-6);
        // empty bounds fall back to the unit box
        assert_eq!(u.bbox_min, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_material_key_reuses_primary_without_secondary() {
        assert_eq!(material_key(ObjectId::Wall), (TextureSlot::Wall, TextureSlot::Wall));
        assert_eq!(material_key(ObjectId::Sphere), (TextureSlot::EarthDay, TextureSlot::EarthNight));
    }
}
