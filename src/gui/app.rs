use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use eframe::egui;
use log::error;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};

use imagelab::operations::{Operation, FACTOR_RANGE};
use imagelab::persistence::{OutputFormat, DEFAULT_SAVE_EXTENSION, OPEN_EXTENSIONS};
use imagelab::{Session, SessionEvent, SettingsStore};

use crate::preview::Preview;

/// Something the user asked for this frame.
enum Action {
    Load,
    Save,
    Reset,
    Apply(Operation),
}

pub struct ImageLabApp {
    session: Session,
    preview: Preview,
    status_events: Receiver<SessionEvent>,
    status_message: String,
    settings: SettingsStore,
}

impl ImageLabApp {
    pub fn new(settings: SettingsStore) -> Self {
        let mut session = Session::new();
        let preview = Preview::new(&mut session);
        let status_events = session.subscribe();
        Self {
            session,
            preview,
            status_events,
            status_message: "Ready".to_string(),
            settings,
        }
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::Load => self.load_image(),
            Action::Save => self.save_image(),
            Action::Reset => {
                self.session.reset();
            }
            Action::Apply(op) => {
                self.session.apply(op);
            }
        }
    }

    fn load_image(&mut self) {
        let mut dialog = FileDialog::new().add_filter("Image files", OPEN_EXTENSIONS);
        if let Some(dir) = &self.settings.current.last_directory {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };

        match self.session.load(&path) {
            Ok(_) => {
                self.settings.current.remember_directory(&path);
                self.settings.flush();
            }
            Err(e) => self.report_error(&e.to_string()),
        }
    }

    fn save_image(&mut self) {
        let Some(stem) = self.session.filename().map(file_stem) else {
            return;
        };

        let mut dialog = FileDialog::new().set_file_name(format!("{}_processed.{}", stem, DEFAULT_SAVE_EXTENSION));
        for format in OutputFormat::ALL {
            dialog = dialog.add_filter(format.filter_name(), &[format.extension()]);
        }
        if let Some(dir) = &self.settings.current.last_directory {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };

        match self.session.save(&path, None) {
            Ok(written) => {
                self.settings.current.remember_directory(&written);
                self.settings.flush();
                MessageDialog::new()
                    .set_level(MessageLevel::Info)
                    .set_title("Success")
                    .set_description(format!("Image saved to {}", written.display()))
                    .set_buttons(MessageButtons::Ok)
                    .show();
            }
            Err(e) => self.report_error(&e.to_string()),
        }
    }

    fn report_error(&mut self, message: &str) {
        error!("{}", message);
        self.status_message = format!("Error: {}", message);
        MessageDialog::new()
            .set_level(MessageLevel::Error)
            .set_title("Error")
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show();
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) -> Option<Action> {
        let mut action = None;

        ui.heading("Controls");
        ui.separator();

        if wide_button(ui, "Load Image") {
            action = Some(Action::Load);
        }
        if wide_button(ui, "Save Processed Image") {
            action = Some(Action::Save);
        }
        ui.separator();

        ui.group(|ui| {
            ui.label(egui::RichText::new("Image Filtering").strong());
            for (label, op) in [
                ("Blur", Operation::Blur),
                ("Sharpen", Operation::Sharpen),
                ("Find Edges", Operation::FindEdges),
                ("Emboss", Operation::Emboss),
            ] {
                if wide_button(ui, label) {
                    action = Some(Action::Apply(op));
                }
            }
        });

        ui.group(|ui| {
            ui.label(egui::RichText::new("Color Manipulation").strong());

            if wide_button(ui, "Enhance Brightness") {
                action = Some(Action::Apply(Operation::Brightness(self.settings.current.brightness_factor)));
            }
            ui.label("Brightness Factor:");
            let brightness = ui.add(egui::Slider::new(&mut self.settings.current.brightness_factor, FACTOR_RANGE));

            if wide_button(ui, "Enhance Contrast") {
                action = Some(Action::Apply(Operation::Contrast(self.settings.current.contrast_factor)));
            }
            ui.label("Contrast Factor:");
            let contrast = ui.add(egui::Slider::new(&mut self.settings.current.contrast_factor, FACTOR_RANGE));

            // Clicks and keyboard steps land at once; drags when released
            if [brightness, contrast]
                .iter()
                .any(|slider| (slider.changed() && !slider.dragged()) || slider.drag_stopped())
            {
                self.settings.flush();
            }

            if wide_button(ui, "Grayscale") {
                action = Some(Action::Apply(Operation::Grayscale));
            }
        });

        ui.group(|ui| {
            ui.label(egui::RichText::new("Transformations").strong());
            for (label, op) in [
                ("Rotate 90°", Operation::Rotate90),
                ("Rotate 180°", Operation::Rotate180),
                ("Rotate 270°", Operation::Rotate270),
                ("Flip Horizontal", Operation::FlipHorizontal),
                ("Flip Vertical", Operation::FlipVertical),
            ] {
                if wide_button(ui, label) {
                    action = Some(Action::Apply(op));
                }
            }
        });

        ui.separator();
        if wide_button(ui, "Reset to Original") {
            action = Some(Action::Reset);
        }

        action
    }

    fn shortcut(ctx: &egui::Context) -> Option<Action> {
        ctx.input(|i| {
            if !i.modifiers.command {
                None
            } else if i.key_pressed(egui::Key::O) {
                Some(Action::Load)
            } else if i.key_pressed(egui::Key::S) {
                Some(Action::Save)
            } else if i.key_pressed(egui::Key::R) {
                Some(Action::Reset)
            } else {
                None
            }
        })
    }
}

impl eframe::App for ImageLabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut action = Self::shortcut(ctx);

        egui::SidePanel::left("controls")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    if let Some(clicked) = self.show_controls(ui) {
                        action = Some(clicked);
                    }
                });
            });

        if let Some(action) = action {
            self.dispatch(action);
        }

        for event in self.status_events.try_iter() {
            self.status_message = event.status_text();
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(&self.status_message);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Image Preview");
            ui.separator();
            self.preview.show(ui, &self.session);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.flush();
    }
}

fn wide_button(ui: &mut egui::Ui, label: &str) -> bool {
    let width = ui.available_width();
    ui.add(egui::Button::new(label).min_size(egui::vec2(width, 0.0)))
        .clicked()
}

fn file_stem(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(filename).display().to_string())
}
