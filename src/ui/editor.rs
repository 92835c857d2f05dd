//! Markdown editor panel

use eframe::egui;

use crate::app::BooklessApp;
use crate::core::front_matter::MetadataStatus;
use crate::core::store::Transition;

/// Markdown editor panel
pub struct EditorPanel;

impl EditorPanel {
    /// Show the editor panel
    pub fn show(ui: &mut egui::Ui, app: &mut BooklessApp) {
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.strong(app.state().document.title());
                if let Some(name) = &app.state().document.file_name {
                    ui.weak(name);
                }
            });
            if let MetadataStatus::Invalid(reason) = app.state().document.metadata_status() {
                ui.colored_label(ui.visuals().warn_fg_color, format!("Front matter ignored: {reason}"));
            }
            ui.separator();

            // The store owns the text; edit a copy and dispatch when it changes
            let mut text = app.state().document.raw().to_string();
            let font = egui::FontId::monospace(app.prefs.editor.font_size);
            let read_only = !app.state().document.is_saved();

            let changed = egui::ScrollArea::vertical()
                .id_salt("editor_scroll")
                .show(ui, |ui| {
                    egui::TextEdit::multiline(&mut text)
                        .font(font)
                        .interactive(!read_only)
                        .desired_width(f32::INFINITY)
                        .desired_rows(30)
                        .show(ui)
                        .response
                        .changed()
                })
                .inner;

            if changed {
                app.dispatch(Transition::UpdateText { text });
            }
        });
    }
}
