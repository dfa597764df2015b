// Interactive liquify tool: a textured grid mesh warped in real time by a
// circular brush. Drag to push vertices outward, hold Ctrl to pull them in.
// The mesh core lives in engine::{mesh, brush, session}; this file is the
// wgpu/winit glue around it.

mod engine;

use winit::{
    event::{Event as WinitEvent, WindowEvent, ElementState, KeyEvent, MouseButton},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};
use engine::{BrushMode, LiquifySession, PointerEvent, DEFAULT_BRUSH_RADIUS, DEFAULT_GRID_RESOLUTION};
use engine::input::InputState;
use engine::mesh::GridMesh;
use engine::texture::{ImageTexture, TextureData};
use engine::ui::{ControlPanel, PanelStats};

// ============================================================================
// VERTEX LAYOUT
// ============================================================================

// Positions and UVs live in separate buffers: positions are rewritten after
// every brush step, UVs never change after a rebuild.

fn position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    }
}

fn uv_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    fill_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    position_buffer: wgpu::Buffer,
    uv_buffer: wgpu::Buffer,
    triangle_index_buffer: wgpu::Buffer,
    line_index_buffer: wgpu::Buffer,
    texture_bind_group: wgpu::BindGroup,

    session: LiquifySession,
    panel: ControlPanel,
    input: InputState,

    // Position buffer needs a re-upload before the next draw
    mesh_dirty: bool,
}

/// The four GPU buffers mirroring a GridMesh, created together so a rebuild
/// can never leave the renderer with a mixed set.
fn create_mesh_buffers(
    device: &wgpu::Device,
    mesh: &GridMesh,
) -> (wgpu::Buffer, wgpu::Buffer, wgpu::Buffer, wgpu::Buffer) {
    use wgpu::util::DeviceExt;

    let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Grid Position Buffer"),
        contents: mesh.position_bytes(),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    });

    let uv_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Grid UV Buffer"),
        contents: mesh.uv_bytes(),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let triangle_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Grid Triangle Index Buffer"),
        contents: mesh.triangle_index_bytes(),
        usage: wgpu::BufferUsages::INDEX,
    });

    let line_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Grid Line Index Buffer"),
        contents: mesh.line_index_bytes(),
        usage: wgpu::BufferUsages::INDEX,
    });

    (position_buffer, uv_buffer, triangle_index_buffer, line_index_buffer)
}

impl State {
    async fn new(window: std::sync::Arc<winit::window::Window>, image: &TextureData) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Liquify Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("liquify.wgsl").into()),
        });

        let texture = ImageTexture::upload(&device, &queue, image);

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("texture_bind_group_layout"),
            });

        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
            label: Some("texture_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&texture_bind_group_layout],
                push_constant_ranges: &[],
            });

        // Culling stays off: the brush can fold cells over themselves and
        // flip triangle winding mid-drag.
        let primitive = |topology| wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        };

        let fill_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Fill Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[position_layout(), uv_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: primitive(wgpu::PrimitiveTopology::TriangleList),
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Wireframe Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[position_layout(), uv_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_line"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: primitive(wgpu::PrimitiveTopology::LineList),
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let session = LiquifySession::new(DEFAULT_GRID_RESOLUTION);

        let (position_buffer, uv_buffer, triangle_index_buffer, line_index_buffer) =
            create_mesh_buffers(&device, session.mesh());

        let panel = ControlPanel::new(
            &window,
            &device,
            surface_format,
            DEFAULT_GRID_RESOLUTION,
            DEFAULT_BRUSH_RADIUS,
        );

        let input = InputState::new((size.width, size.height));

        Self {
            surface,
            device,
            queue,
            config,
            size,
            fill_pipeline,
            line_pipeline,
            position_buffer,
            uv_buffer,
            triangle_index_buffer,
            line_index_buffer,
            texture_bind_group,
            session,
            panel,
            input,
            mesh_dirty: false,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Rebuild the grid at a new resolution: the CPU mesh and all four GPU
    /// buffers are replaced in one step, discarding any deformation.
    fn rebuild_grid(&mut self, resolution: usize) {
        self.session.rebuild(resolution);

        let (position_buffer, uv_buffer, triangle_index_buffer, line_index_buffer) =
            create_mesh_buffers(&self.device, self.session.mesh());
        self.position_buffer = position_buffer;
        self.uv_buffer = uv_buffer;
        self.triangle_index_buffer = triangle_index_buffer;
        self.line_index_buffer = line_index_buffer;

        // Fresh buffers already hold the fresh positions
        self.mesh_dirty = false;

        log::info!("rebuilt grid at {resolution}x{resolution} vertices");
    }

    /// Apply the panel's requested values to the session. Invalid requests
    /// are rejected and the panel snaps back to the previous valid value, so
    /// the mesh core never sees them.
    fn apply_panel_controls(&mut self) {
        let requested = self.panel.grid_resolution;
        if requested != self.session.resolution() {
            if requested >= 2 {
                self.rebuild_grid(requested);
            } else {
                log::warn!(
                    "rejected grid resolution {requested}; keeping {}",
                    self.session.resolution()
                );
                self.panel.grid_resolution = self.session.resolution();
            }
        }

        if self.panel.brush_radius > 0.0 {
            self.session.brush.radius = self.panel.brush_radius;
        } else {
            log::warn!(
                "rejected brush radius {}; keeping {}",
                self.panel.brush_radius,
                self.session.brush.radius
            );
            self.panel.brush_radius = self.session.brush.radius;
        }
    }

    fn render(&mut self, window: &Window, fps: u32) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Re-upload positions only when the brush actually moved something
        if self.mesh_dirty {
            self.queue
                .write_buffer(&self.position_buffer, 0, self.session.mesh().position_bytes());
            self.mesh_dirty = false;
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mesh Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.05,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.texture_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.position_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.uv_buffer.slice(..));

            render_pass.set_pipeline(&self.fill_pipeline);
            render_pass.set_index_buffer(
                self.triangle_index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            render_pass.draw_indexed(0..self.session.mesh().triangle_index_count() as u32, 0, 0..1);

            if self.panel.show_wireframe {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_index_buffer(
                    self.line_index_buffer.slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                render_pass.draw_indexed(0..self.session.mesh().line_index_count() as u32, 0, 0..1);
            }
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        let stats = PanelStats {
            fps,
            vertex_count: self.session.mesh().vertex_count(),
            dragging: self.session.is_dragging(),
        };

        self.panel.render(
            &self.device,
            &self.queue,
            &mut encoder,
            window,
            &view,
            &screen_descriptor,
            &stats,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn load_source_image() -> TextureData {
    // Optional image path as the first CLI argument; anything that fails to
    // decode falls back to a generated checkerboard so the tool still starts.
    let fallback = || TextureData::checkerboard(512, [235, 235, 235, 255], [60, 60, 70, 255]);

    match std::env::args().nth(1) {
        Some(path) => match TextureData::from_file(&path) {
            Ok(data) => {
                log::info!("loaded {path} ({}x{})", data.width, data.height);
                data
            }
            Err(e) => {
                log::warn!("{e}; using checkerboard instead");
                fallback()
            }
        },
        None => fallback(),
    }
}

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();

    let window_attributes = Window::default_attributes()
        .with_title("Liquify - drag to push, Ctrl-drag to pull")
        .with_inner_size(winit::dpi::LogicalSize::new(900, 900));

    let window = std::sync::Arc::new(event_loop.create_window(window_attributes).unwrap());

    let image = load_source_image();
    let mut state = pollster::block_on(State::new(window.clone(), &image));

    let mut frame_count = 0u32;
    let mut fps = 0u32;
    let mut last_fps_update = std::time::Instant::now();

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                // egui gets first look; pointer events it consumes must not
                // reach the brush.
                let ui_response = state.panel.handle_window_event(&window, event);
                state.input.process_event(event);

                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => control_flow.exit(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } if !ui_response.consumed => {
                        state.session.handle_pointer(PointerEvent::Down);
                    }
                    WindowEvent::MouseInput {
                        state: ElementState::Released,
                        button: MouseButton::Left,
                        ..
                    } => {
                        // Delivered even when egui consumed it: a drag must
                        // not stay active under the panel.
                        state.session.handle_pointer(PointerEvent::Up);
                    }
                    WindowEvent::CursorMoved { .. } if !ui_response.consumed => {
                        state.session.brush.mode = if state.input.ctrl_held() {
                            BrushMode::Pull
                        } else {
                            BrushMode::Push
                        };
                        if let Some(pointer) = state.input.pointer_ndc() {
                            if state.session.handle_pointer(PointerEvent::Move(pointer)) {
                                state.mesh_dirty = true;
                            }
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        state.apply_panel_controls();
                        match state.render(&window, fps) {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                            Err(e) => log::warn!("surface error: {e:?}"),
                        }

                        frame_count += 1;
                        let now = std::time::Instant::now();
                        if (now - last_fps_update).as_secs_f32() >= 1.0 {
                            fps = frame_count;
                            frame_count = 0;
                            last_fps_update = now;
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    }).unwrap();
}
