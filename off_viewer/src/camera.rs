use crate::camera_control::CameraLookAt;

#[derive(Debug)]
pub struct Camera {
    pub look_at: CameraLookAt,
    pub aspect: f32,
    pub fovy: f32,
    pub znear: f32,
}

impl Camera {
    pub fn get_view_matrix(&self) -> glam::Mat4 {
        self.look_at.get_view_matrix()
    }

    pub fn get_projection_matrix(&self) -> glam::Mat4 {
        // Note: we use reverse z.
        glam::Mat4::perspective_infinite_reverse_rh(self.fovy.to_radians(), self.aspect, self.znear)
    }

    pub fn build_view_projection_matrix(&self) -> glam::Mat4 {
        let view = self.get_view_matrix();
        let proj = self.get_projection_matrix();
        proj * view
    }

    pub fn update_resolution(&mut self, resolution: [u32; 2]) {
        self.aspect = resolution[0] as f32 / resolution[1] as f32;
    }
}

/// GPU-side camera state, std140-compatible for the shader uniform.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: glam::Mat4,
    pub view: glam::Mat4,
    pub eye: glam::Vec4,
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: glam::Mat4::IDENTITY,
            view: glam::Mat4::IDENTITY,
            eye: glam::Vec4::ZERO,
        }
    }

    pub fn from_camera(camera: &Camera) -> Self {
        let mut res = Self::new();
        res.update_view_proj(camera);
        res
    }

    /// Update the view and projection matrices.
    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_proj = camera.build_view_projection_matrix();
        self.view = camera.get_view_matrix();
        self.eye = camera.look_at.get_eye();
    }
}

#[derive(Debug)]
pub struct CameraData {
    pub camera: Camera,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraData {
    pub fn update_resolution(&mut self, resolution: [u32; 2]) {
        self.camera.update_resolution(resolution);
    }
}
