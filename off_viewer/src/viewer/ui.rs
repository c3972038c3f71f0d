use super::{ShadingMode, Viewer};

impl Viewer {
    /// Left side panel: file picker, shading mode, background color, status.
    pub fn draw_ui(&mut self, device: &wgpu::Device, _queue: &wgpu::Queue, ui: &mut egui::Ui) {
        ui.heading("Mesh");

        if ui.button("Open OFF file...").clicked() {
            let file = rfd::FileDialog::new()
                .add_filter("OFF mesh", &["off"])
                .pick_file();

            if let Some(path) = file {
                self.parameters.file_name = Some(path.display().to_string());
                if let Err(error) = self.load_mesh(device) {
                    log::warn!("Could not load mesh: {error}");
                    self.status = Some(format!("Load failed: {error}"));
                }
            }
        }

        if let Some(ref status) = self.status {
            ui.label(status);
        } else {
            ui.label("No mesh loaded");
        }

        ui.separator();
        ui.heading("Shading");

        let mut mode = self.parameters.shading_mode;
        for candidate in ShadingMode::ALL {
            ui.radio_value(&mut mode, candidate, candidate.label());
        }
        self.set_shading_mode(mode);

        ui.separator();

        if let Some(new_color) =
            Self::add_color_widget(ui, "Background", self.parameters.background_color)
        {
            self.parameters.background_color = new_color;
        }

        ui.separator();
        ui.label(format!("{:.0} fps", self.frame_rate.get()));
    }

    pub fn add_color_widget(ui: &mut egui::Ui, label: &str, color: [f32; 3]) -> Option<[f32; 3]> {
        ui.label(label);
        let mut new_color = color;
        egui::color_picker::color_edit_button_rgb(ui, &mut new_color);

        if !float_cmp::approx_eq!(f32, color[0], new_color[0], ulps = 2, epsilon = 1e-6)
            || !float_cmp::approx_eq!(f32, color[1], new_color[1], ulps = 2, epsilon = 1e-6)
            || !float_cmp::approx_eq!(f32, color[2], new_color[2], ulps = 2, epsilon = 1e-6)
        {
            Some(new_color)
        } else {
            None
        }
    }
}
