use std::sync::mpsc::Receiver;

use eframe::egui;
use image::GenericImageView;
use log::debug;

use imagelab::display::{fit_dimensions, render, usable_area};
use imagelab::{Session, SessionEvent};

/// Shows the session's processed image scaled into the preview pane.
///
/// The preview listens to session events and only resamples when the image
/// changed or the pane was resized; otherwise the bound texture is reused.
pub struct Preview {
    events: Receiver<SessionEvent>,
    texture: Option<egui::TextureHandle>,
    rendered_size: Option<(u32, u32)>,
    stale: bool,
}

impl Preview {
    pub fn new(session: &mut Session) -> Self {
        Self {
            events: session.subscribe(),
            texture: None,
            rendered_size: None,
            stale: true,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, session: &Session) {
        for event in self.events.try_iter() {
            if event.changes_image() {
                self.stale = true;
            }
        }

        let Some(image) = session.processed() else {
            ui.centered_and_justified(|ui| {
                ui.label("No image loaded. Click 'Load Image' to open one.");
            });
            return;
        };

        let available = ui.available_size();
        let area = usable_area((available.x, available.y));
        let target = fit_dimensions(image.dimensions(), area);
        if self.stale || self.rendered_size != Some(target) {
            let display = render(image, area);
            debug!(
                "Rendering preview at {}x{} (scale {:.3})",
                target.0, target.1, display.scale
            );
            let color_image = egui::ColorImage::from_rgba_unmultiplied(display.size(), display.pixels.as_raw());
            match self.texture.as_mut() {
                Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
                None => {
                    self.texture = Some(ui.ctx().load_texture(
                        "processed_image",
                        color_image,
                        egui::TextureOptions::LINEAR,
                    ))
                }
            }
            self.rendered_size = Some(target);
            self.stale = false;
        }

        if let Some(texture) = &self.texture {
            ui.centered_and_justified(|ui| {
                ui.image((texture.id(), texture.size_vec2()));
            });
        }
    }
}
