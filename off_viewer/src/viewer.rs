use anyhow::Result;

use winit_input_helper::WinitInputHelper;

use crate::camera::{Camera, CameraData, CameraUniform};
use crate::camera_control::CameraLookAt;
use crate::frame_rate::FrameRate;
use crate::gpu_mesh::GpuMesh;
use crate::passes::mesh_render_pass::MeshRenderPass;
use crate::texture::{self, Texture};

mod ui;

/// Shading models, in keyboard order (keys 1 to 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingMode {
    Gouraud,
    Phong,
    Textured,
    NormalMapped,
}

impl ShadingMode {
    pub const ALL: [Self; 4] = [
        Self::Gouraud,
        Self::Phong,
        Self::Textured,
        Self::NormalMapped,
    ];

    pub const fn shader_file(self) -> &'static str {
        match self {
            Self::Gouraud => "gouraud.wgsl",
            Self::Phong => "phong.wgsl",
            Self::Textured => "texture.wgsl",
            Self::NormalMapped => "normal_map.wgsl",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Gouraud => "Gouraud",
            Self::Phong => "Phong",
            Self::Textured => "Textured",
            Self::NormalMapped => "Normal mapped",
        }
    }
}

/// Light and material products for the shading models, view-space light.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Lighting {
    pub light_position: [f32; 4],
    pub ambient_product: [f32; 4],
    pub diffuse_product: [f32; 4],
    pub specular_product: [f32; 4],
    pub shininess: f32,
    pub _padding: [f32; 3],
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            light_position: [2.0, 3.0, 4.0, 1.0],
            ambient_product: [0.12, 0.12, 0.14, 1.0],
            diffuse_product: [0.85, 0.82, 0.78, 1.0],
            specular_product: [0.9, 0.9, 0.9, 1.0],
            shininess: 60.0,
            _padding: [0.0; 3],
        }
    }
}

/// GPU-side copy of [`Lighting`].
pub struct LightingData {
    pub lighting: Lighting,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightingData {
    pub fn new(device: &wgpu::Device, lighting: Lighting) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lighting Buffer"),
            size: std::mem::size_of::<Lighting>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("lighting_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("lighting_bind_group"),
        });

        Self {
            lighting,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

#[derive(Debug, Clone)]
struct Parameters {
    file_name: Option<String>,
    shading_mode: ShadingMode,
    background_color: [f32; 3],
}

/// The viewer program: current mesh, camera, shading state, UI.
pub struct Viewer {
    parameters: Parameters,

    swapchain_format: wgpu::TextureFormat,
    depth_map: Texture,

    camera: CameraData,
    lighting: LightingData,

    color_map: Texture,
    normal_map: Texture,

    render_pass: MeshRenderPass,
    /// Rebuild the render pipeline on the next frame (mode switch or shader
    /// hot reload).
    pipeline_dirty: bool,

    /// Current mesh buffers; `None` until a load succeeds.
    mesh: Option<GpuMesh>,
    /// Human-readable summary of the last load.
    status: Option<String>,

    frame_rate: FrameRate,
    last_frame: std::time::Instant,
}

impl Viewer {
    /// Get program name.
    pub fn get_name() -> &'static str {
        "OFF Viewer"
    }

    pub fn init(
        surface: &wgpu::Surface,
        device: &wgpu::Device,
        adapter: &wgpu::Adapter,
        queue: &wgpu::Queue,
    ) -> Result<Self> {
        let swapchain_capabilities = surface.get_capabilities(adapter);
        let swapchain_format = swapchain_capabilities.formats[0];

        let size = surface.get_current_texture()?.texture.size();

        let depth_map = Texture::create_depth_texture(device, size, "depth_texture");
        let camera = Self::create_camera(device);
        let lighting = LightingData::new(device, Lighting::default());

        let color_map = Texture::from_image(
            device,
            queue,
            &texture::checkerboard(512, 16),
            Some("color_map"),
            true,
        );
        let normal_map = Texture::from_image(
            device,
            queue,
            &texture::ridged_normal_map(512, 24),
            Some("normal_map"),
            false,
        );

        let parameters = Parameters {
            file_name: None,
            shading_mode: ShadingMode::Gouraud,
            background_color: [0.1, 0.1, 0.12],
        };

        let render_pass = MeshRenderPass::new(
            device,
            swapchain_format,
            &camera,
            &lighting,
            parameters.shading_mode,
        )?;

        Ok(Self {
            parameters,
            swapchain_format,
            depth_map,
            camera,
            lighting,
            color_map,
            normal_map,
            render_pass,
            pipeline_dirty: false,
            mesh: None,
            status: None,
            frame_rate: FrameRate::default(),
            last_frame: std::time::Instant::now(),
        })
    }

    /// Keyboard shading-mode switch, keys 1 to 4.
    pub fn process_input(&mut self, input: &WinitInputHelper) -> bool {
        use winit::keyboard::KeyCode;

        let mut captured = false;

        for (key, mode) in [
            (KeyCode::Digit1, ShadingMode::Gouraud),
            (KeyCode::Digit2, ShadingMode::Phong),
            (KeyCode::Digit3, ShadingMode::Textured),
            (KeyCode::Digit4, ShadingMode::NormalMapped),
        ] {
            if input.key_released(key) {
                self.set_shading_mode(mode);
                captured = true;
            }
        }

        captured
    }

    pub fn get_camera(&mut self) -> Option<&mut CameraLookAt> {
        Some(&mut self.camera.camera.look_at)
    }

    /// Flag the pipeline for a rebuild; applied by [`Self::update_passes`].
    pub fn mark_pipeline_dirty(&mut self) {
        self.pipeline_dirty = true;
    }

    fn set_shading_mode(&mut self, mode: ShadingMode) {
        if self.parameters.shading_mode != mode {
            self.parameters.shading_mode = mode;
            self.pipeline_dirty = true;
        }
    }

    /// Rebuild the render pipeline if a mode switch or shader reload asked
    /// for it. A failed rebuild keeps the previous pipeline running.
    pub fn update_passes(&mut self, device: &wgpu::Device) -> Result<()> {
        if !self.pipeline_dirty {
            return Ok(());
        }
        self.pipeline_dirty = false;
        self.render_pass.update_pipeline(
            device,
            self.swapchain_format,
            &self.camera,
            &self.lighting,
            self.parameters.shading_mode,
        )
    }

    pub fn resize(
        &mut self,
        config: &wgpu::SurfaceConfiguration,
        device: &wgpu::Device,
        _queue: &wgpu::Queue,
    ) {
        self.camera
            .update_resolution([config.width, config.height]);

        let size = wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        };
        self.depth_map = Texture::create_depth_texture(device, size, "depth_texture");
    }

    /// Per-frame CPU-side update: camera uniform, lighting, frame rate.
    pub fn update(&mut self, queue: &wgpu::Queue) {
        let now = std::time::Instant::now();
        self.frame_rate
            .update(now.duration_since(self.last_frame).as_secs_f32());
        self.last_frame = now;

        self.camera.uniform.update_view_proj(&self.camera.camera);
        queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform]),
        );
        queue.write_buffer(
            &self.lighting.buffer,
            0,
            bytemuck::cast_slice(&[self.lighting.lighting]),
        );
    }

    pub fn render(&mut self, view: &wgpu::TextureView, device: &wgpu::Device, queue: &wgpu::Queue) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Viewer::render"),
        });

        self.render_pass.run(
            &mut encoder,
            view,
            &self.depth_map,
            &self.camera,
            &self.lighting,
            &self.color_map,
            &self.normal_map,
            self.mesh.as_ref(),
            self.parameters.background_color,
        );

        queue.submit(Some(encoder.finish()));
    }

    /// Load the mesh at `parameters.file_name`, replacing the current one.
    ///
    /// Ordering guarantees:
    /// - parse and attribute generation run before any GPU state is touched,
    ///   so a failed load leaves the previous mesh rendering untouched;
    /// - the old buffer set is destroyed before the new one is created;
    /// - a failed upload degrades to the "no mesh loaded" state rather than
    ///   keeping a partial buffer set.
    fn load_mesh(&mut self, device: &wgpu::Device) -> Result<()> {
        match self.parameters.file_name {
            None => anyhow::bail!("No file to load"),
            Some(ref path) => {
                let mesh = off_mesh::load_off(path)?;

                if mesh.is_empty() {
                    self.mesh = None;
                    let status = format!("{} vertices, 0 faces", mesh.vertex_count());
                    log::info!("Loaded {path}: {status}");
                    self.status = Some(status);
                    return Ok(());
                }

                let attributes = off_mesh::generate_attributes(&mesh);

                let vertex_count = mesh.vertex_count();
                let triangle_count = mesh.triangle_count();

                // Destroy-old-then-create-new. Dropping first also means a
                // failed upload cannot leave stale buffers behind.
                self.mesh = None;
                self.mesh = Some(GpuMesh::upload(device, mesh, attributes)?);

                let status = format!("{vertex_count} vertices, {triangle_count} faces");
                log::info!("Loaded {path}: {status}");
                self.status = Some(status);

                Ok(())
            }
        }
    }

    fn create_camera(device: &wgpu::Device) -> CameraData {
        let camera = Camera {
            look_at: CameraLookAt::default(),
            aspect: 1.0,
            fovy: 60.0,
            znear: 0.1,
        };

        let camera_uniform = CameraUniform::from_camera(&camera);

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        CameraData {
            camera,
            uniform: camera_uniform,
            buffer: camera_buffer,
            bind_group: camera_bind_group,
            bind_group_layout: camera_bind_group_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn test_shading_modes_have_distinct_shaders() {
        assert!(ShadingMode::ALL
            .iter()
            .map(|mode| mode.shader_file())
            .all_unique());
    }

    #[test]
    fn test_lighting_uniform_is_std140_sized() {
        // 4 vec4s + shininess + padding: the WGSL struct is 80 bytes.
        assert_eq!(std::mem::size_of::<Lighting>(), 80);
    }
}
