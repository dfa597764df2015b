use egui::epaint::Shadow;

/// Per-frame numbers shown at the bottom of the panel.
pub struct PanelStats {
    pub fps: u32,
    pub vertex_count: usize,
    pub dragging: bool,
}

/// egui control panel: grid resolution, brush radius, wireframe toggle.
///
/// The panel owns the *requested* values; the event loop validates them each
/// frame and applies them to the session (restoring the previous value when a
/// request is invalid), so the mesh core never sees bad input.
pub struct ControlPanel {
    pub grid_resolution: usize,
    pub brush_radius: f32,
    pub show_wireframe: bool,

    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl ControlPanel {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        grid_resolution: usize,
        brush_radius: f32,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Style: dark, semi-transparent, small monospace white font
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            grid_resolution,
            brush_radius,
            show_wireframe: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    /// Feed a window event to egui first. When the response reports the event
    /// as consumed, the pointer was over the panel and brush handling should
    /// skip it.
    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Render the panel on top of the warped image.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        stats: &PanelStats,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        // Widgets edit locals, written back after the pass.
        let mut grid_resolution = self.grid_resolution;
        let mut brush_radius = self.brush_radius;
        let mut show_wireframe = self.show_wireframe;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::Window::new("Liquify")
                .default_pos(egui::pos2(10.0, 10.0))
                .resizable(false)
                .show(ctx, |ui| {
                    ui.add(
                        egui::Slider::new(&mut grid_resolution, 2..=128)
                            .text("grid resolution"),
                    );
                    ui.add(
                        egui::Slider::new(&mut brush_radius, 0.01..=1.0)
                            .text("brush radius"),
                    );
                    ui.checkbox(&mut show_wireframe, "show wireframe");

                    ui.separator();
                    ui.label("drag to push, hold Ctrl to pull");

                    ui.separator();
                    ui.label(format!("FPS: {}", stats.fps));
                    ui.label(format!("Vertices: {}", stats.vertex_count));
                    ui.label(if stats.dragging { "brush: active" } else { "brush: idle" });
                });
        });

        self.grid_resolution = grid_resolution;
        self.brush_radius = brush_radius;
        self.show_wireframe = show_wireframe;

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
