use anyhow::Result;

use crate::camera::CameraData;
use crate::gpu_mesh::GpuMesh;
use crate::shader_builder::ShaderBuilder;
use crate::texture::Texture;
use crate::viewer::{LightingData, ShadingMode};

/// Indexed triangle-list draw of the current mesh under one shading model.
///
/// Bind groups: 0 camera, 1 lighting, 2 color map, 3 normal map. Every
/// shading model shares the layout; each shader only touches the groups it
/// needs.
pub struct MeshRenderPass {
    pub render_pipeline: wgpu::RenderPipeline,
    shading_mode: ShadingMode,
}

impl MeshRenderPass {
    fn create_pipeline(
        device: &wgpu::Device,
        view_format: wgpu::TextureFormat,
        camera: &CameraData,
        lighting: &LightingData,
        shading_mode: ShadingMode,
    ) -> Result<wgpu::RenderPipeline> {
        let draw_shader = ShaderBuilder::create_module(device, shading_mode.shader_file())?;

        let texture_bind_group_layout = Texture::get_bind_group_layout(device, true);

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("mesh render"),
                bind_group_layouts: &[
                    &camera.bind_group_layout,
                    &lighting.bind_group_layout,
                    &texture_bind_group_layout,
                    &texture_bind_group_layout,
                ],
                push_constant_ranges: &[],
            });

        // No backface culling: fan triangulation of arbitrary polygon files
        // gives no winding guarantee worth trusting.
        let primitive = wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        };

        ShaderBuilder::create_render_pipeline(
            device,
            &wgpu::RenderPipelineDescriptor {
                label: Some("MeshRenderPass::render_pipeline"),
                layout: Some(&render_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &draw_shader,
                    entry_point: "main_vs",
                    buffers: &GpuMesh::vertex_layouts(),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &draw_shader,
                    entry_point: "main_fs",
                    targets: &[Some(view_format.into())],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive,
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: Texture::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Greater,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            },
        )
    }

    pub fn new(
        device: &wgpu::Device,
        view_format: wgpu::TextureFormat,
        camera: &CameraData,
        lighting: &LightingData,
        shading_mode: ShadingMode,
    ) -> Result<Self> {
        let render_pipeline =
            Self::create_pipeline(device, view_format, camera, lighting, shading_mode)?;

        Ok(Self {
            render_pipeline,
            shading_mode,
        })
    }

    /// Rebuild the pipeline for a (possibly new) shading mode.
    /// On failure the previous pipeline stays in place.
    pub fn update_pipeline(
        &mut self,
        device: &wgpu::Device,
        view_format: wgpu::TextureFormat,
        camera: &CameraData,
        lighting: &LightingData,
        shading_mode: ShadingMode,
    ) -> Result<()> {
        self.render_pipeline =
            Self::create_pipeline(device, view_format, camera, lighting, shading_mode)?;
        self.shading_mode = shading_mode;
        Ok(())
    }

    pub const fn shading_mode(&self) -> ShadingMode {
        self.shading_mode
    }

    /// Clear the targets and draw the mesh, if there is one.
    ///
    /// With no mesh loaded the pass still clears and presents: the viewer
    /// never skips a frame, it just issues zero draw calls.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &self,
        command_encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth_map: &Texture,
        camera: &CameraData,
        lighting: &LightingData,
        color_map: &Texture,
        normal_map: &Texture,
        mesh: Option<&GpuMesh>,
        clear_color: [f32; 3],
    ) {
        let render_pass_descriptor = wgpu::RenderPassDescriptor {
            label: Some("MeshRenderPass::run::render_pass_descriptor"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: f64::from(clear_color[0]),
                        g: f64::from(clear_color[1]),
                        b: f64::from(clear_color[2]),
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_map.view,
                depth_ops: Some(wgpu::Operations {
                    // Reverse z: far plane clears to 0.
                    load: wgpu::LoadOp::Clear(0.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        };

        let mut rpass = command_encoder.begin_render_pass(&render_pass_descriptor);

        let Some(mesh) = mesh else {
            return;
        };

        rpass.set_pipeline(&self.render_pipeline);
        rpass.set_bind_group(0, &camera.bind_group, &[]);
        rpass.set_bind_group(1, &lighting.bind_group, &[]);
        rpass.set_bind_group(2, &color_map.bind_group, &[]);
        rpass.set_bind_group(3, &normal_map.bind_group, &[]);

        rpass.set_vertex_buffer(0, mesh.position_buffer.slice(..));
        rpass.set_vertex_buffer(1, mesh.normal_buffer.slice(..));
        rpass.set_vertex_buffer(2, mesh.tex_coord_buffer.slice(..));
        rpass.set_vertex_buffer(3, mesh.tangent_buffer.slice(..));
        rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
