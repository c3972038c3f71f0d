use egui_wgpu::{Renderer, ScreenDescriptor};
use std::sync::{Arc, Mutex};
use winit::dpi::PhysicalSize;
use winit::event::StartCause;
use winit::{
    event::Event,
    event_loop::{ControlFlow, EventLoop},
    window::Window,
};
use winit_input_helper::WinitInputHelper;

use crate::viewer::Viewer;

struct EventLoopWrapper {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
}

impl EventLoopWrapper {
    pub fn new(title: &str) -> Self {
        let event_loop = EventLoop::new().unwrap();
        let builder = winit::window::WindowBuilder::new()
            .with_title(title)
            .with_maximized(true);
        let window = Arc::new(builder.build(&event_loop).unwrap());

        Self { event_loop, window }
    }
}

/// Wrapper type which manages the surface and surface configuration.
struct SurfaceWrapper {
    surface: Option<wgpu::Surface<'static>>,
    config: Option<wgpu::SurfaceConfiguration>,
}

impl SurfaceWrapper {
    /// Create a new surface wrapper with no surface or configuration.
    fn new() -> Self {
        Self {
            surface: None,
            config: None,
        }
    }

    /// Check if the event is the start condition for the surface.
    fn start_condition(event: &Event<()>) -> bool {
        event == &Event::NewEvents(StartCause::Init)
    }

    /// Create and configure the surface.
    /// Window size is only actually valid after we enter the event loop.
    fn resume(&mut self, context: &GpuContext, window: Arc<Window>, srgb: bool) {
        let window_size = window.inner_size();
        let width = window_size.width.max(1);
        let height = window_size.height.max(1);

        log::info!("Surface resume {window_size:?}");

        self.surface = Some(context.instance.create_surface(window).unwrap());
        let surface = self.surface.as_ref().unwrap();

        // Get the default configuration.
        let mut config = surface
            .get_default_config(&context.adapter, width, height)
            .expect("Surface isn't supported by the adapter.");
        if srgb {
            let view_format = config.format.add_srgb_suffix();
            config.view_formats.push(view_format);
        } else {
            let format = config.format.remove_srgb_suffix();
            config.format = format;
            config.view_formats.push(format);
        };

        surface.configure(&context.device, &config);
        self.config = Some(config);
    }

    /// Resize the surface, making sure to not resize to zero.
    fn resize(&mut self, context: &GpuContext, size: PhysicalSize<u32>) {
        log::info!("Surface resize {size:?}");

        let config = self.config.as_mut().unwrap();
        config.width = size.width.max(1);
        config.height = size.height.max(1);
        let surface = self.surface.as_ref().unwrap();
        surface.configure(&context.device, config);
    }

    fn get(&self) -> Option<&wgpu::Surface<'static>> {
        self.surface.as_ref()
    }
}

/// Context containing global wgpu resources.
struct GpuContext {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuContext {
    /// Initializes the wgpu context.
    async fn init_async(surface: &SurfaceWrapper) -> Self {
        log::info!("Initializing wgpu...");

        let backends = wgpu::util::backend_bits_from_env().unwrap_or(wgpu::Backends::all());
        let dx12_shader_compiler = wgpu::util::dx12_shader_compiler_from_env().unwrap_or_default();
        let gles_minor_version = wgpu::util::gles_minor_version_from_env().unwrap_or_default();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            flags: wgpu::InstanceFlags::default(),
            dx12_shader_compiler,
            gles_minor_version,
        });

        let adapter = wgpu::util::initialize_adapter_from_env_or_default(&instance, surface.get())
            .await
            .expect("No suitable GPU adapters found on the system!");

        let adapter_info = adapter.get_info();
        log::info!("Using {} ({:?})", adapter_info.name, adapter_info.backend);

        // Use the resolution limits of the adapter so the depth target can
        // match any surface size.
        let needed_limits = wgpu::Limits::default().using_resolution(adapter.limits());

        let trace_dir = std::env::var("WGPU_TRACE");
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device Descriptor"),
                    required_features: wgpu::Features::empty(),
                    required_limits: needed_limits,
                },
                trace_dir.ok().as_ref().map(std::path::Path::new),
            )
            .await
            .expect("Unable to find a suitable GPU adapter!");

        Self {
            instance,
            adapter,
            device,
            queue,
        }
    }
}

/// Initialize wgpu and run the app.
async fn run(reload: Arc<Mutex<crate::reload_flags::ReloadFlags>>) {
    let window_loop = EventLoopWrapper::new(Viewer::get_name());
    let mut surface = SurfaceWrapper::new();
    let context = GpuContext::init_async(&surface).await;

    let mut input = WinitInputHelper::new();
    let mut program = None;

    // Create egui state.
    let mut egui_state = egui_winit::State::new(
        egui::Context::default(),
        egui::ViewportId::default(),
        &window_loop.event_loop,
        None,
        None,
    );

    let mut egui_renderer: Option<Renderer> = None;

    window_loop
        .event_loop
        .run(
            move |event: Event<()>, target: &winit::event_loop::EventLoopWindowTarget<()>| {
                if let Event::WindowEvent {
                    event: ref window_event,
                    ..
                } = &event
                {
                    // ignore event response.
                    let _ = egui_state.on_window_event(&window_loop.window, window_event);

                    if window_event == &winit::event::WindowEvent::CloseRequested {
                        target.exit();
                    }
                }

                if SurfaceWrapper::start_condition(&event) {
                    surface.resume(&context, window_loop.window.clone(), true);

                    if program.is_none() {
                        program = Some(
                            Viewer::init(
                                surface.surface.as_ref().unwrap(),
                                &context.device,
                                &context.adapter,
                                &context.queue,
                            )
                            .unwrap(),
                        );
                    }

                    if egui_renderer.is_none() {
                        egui_renderer = Some(Renderer::new(
                            &context.device,
                            surface.config.as_ref().unwrap().format,
                            None,
                            1,
                        ));
                    }
                }

                if input.update(&event) {
                    let Some(program) = &mut program else {
                        return;
                    };
                    let Some(config) = surface.config.as_mut() else {
                        return;
                    };
                    let Some(surface) = surface.surface.as_ref() else {
                        return;
                    };
                    let Some(egui_renderer) = egui_renderer.as_mut() else {
                        return;
                    };

                    // Poll all events to ensure a maximum framerate.
                    target.set_control_flow(ControlFlow::Poll);

                    if input.close_requested()
                        || input.key_released(winit::keyboard::KeyCode::Escape)
                    {
                        target.exit();
                    }
                    if let Some(new_size) = input.window_resized() {
                        log::info!("Window resized: {:?}", new_size);
                        // Resize with 0 width and height is used by winit to
                        // signal a minimize event on Windows.
                        if new_size.width > 0 && new_size.height > 0 {
                            config.width = new_size.width;
                            config.height = new_size.height;
                            surface.configure(&context.device, config);
                            program.resize(config, &context.device, &context.queue);
                        }
                    }

                    program.process_input(&input);

                    if let Some(camera) = program.get_camera() {
                        camera.update(&input, [config.width as f32, config.height as f32]);
                    };

                    // Rebuild the pipeline when a shader was saved.
                    {
                        let mut reload = reload.lock().unwrap();
                        if !reload.shaders.is_empty() {
                            log::info!("rebuild shaders {:?}", reload.shaders);
                            program.mark_pipeline_dirty();
                            reload.shaders.clear();
                        }
                    }
                    if let Err(program_error) = program.update_passes(&context.device) {
                        log::error!("{program_error:?}");
                    }

                    // Get the next frame and view.
                    let texture = surface.get_current_texture();
                    let frame = match texture {
                        Ok(f) => f,
                        Err(e) => {
                            log::warn!("surface lost: window is probably minimized: {e}");
                            return;
                        }
                    };

                    let view = frame
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());

                    // Update the program before drawing.
                    program.update(&context.queue);

                    // Render the program first so the ui is on top.
                    program.render(&view, &context.device, &context.queue);

                    // Update the ui before drawing.
                    let egui_input = egui_state.take_egui_input(&window_loop.window);
                    let egui_context = egui_state.egui_ctx();

                    egui_context.begin_frame(egui_input);
                    egui::panel::SidePanel::new(
                        egui::panel::Side::Left,
                        egui::Id::new("control_panel"),
                    )
                    .default_width(config.width as f32 * 0.15)
                    .show(egui_context, |ui| {
                        program.draw_ui(&context.device, &context.queue, ui);
                    });

                    let output = egui_context.end_frame();
                    let paint_jobs =
                        egui_context.tessellate(output.shapes, egui_context.pixels_per_point());
                    let screen_descriptor = ScreenDescriptor {
                        size_in_pixels: [config.width, config.height],
                        pixels_per_point: egui_context.pixels_per_point(),
                    };

                    // Create a command encoder.
                    let mut encoder = context
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

                    // Update the egui renderer.
                    {
                        for (id, image_delta) in &output.textures_delta.set {
                            egui_renderer.update_texture(
                                &context.device,
                                &context.queue,
                                *id,
                                image_delta,
                            );
                        }
                        for id in &output.textures_delta.free {
                            egui_renderer.free_texture(id);
                        }

                        egui_renderer.update_buffers(
                            &context.device,
                            &context.queue,
                            &mut encoder,
                            &paint_jobs,
                            &screen_descriptor,
                        );
                    }

                    // Render ui.
                    {
                        let mut render_pass =
                            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                                label: Some("egui render pass"),
                                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                    view: &view,
                                    resolve_target: None,
                                    ops: wgpu::Operations {
                                        load: wgpu::LoadOp::Load,
                                        store: wgpu::StoreOp::Store,
                                    },
                                })],
                                depth_stencil_attachment: None,
                                timestamp_writes: None,
                                occlusion_query_set: None,
                            });

                        egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
                    }

                    // Present the frame.
                    context.queue.submit(Some(encoder.finish()));
                    frame.present();
                }
            },
        )
        .unwrap();
}

/// Entry point: blocks on the event loop.
pub fn start_app(reload: &Arc<Mutex<crate::reload_flags::ReloadFlags>>) {
    pollster::block_on(run(reload.clone()));
}
