//! Markdown preview panel using egui_commonmark

use eframe::egui;
use egui_commonmark::CommonMarkViewer;

use crate::app::BooklessApp;

/// Width of a page in paginated mode
const PAGE_WIDTH: f32 = 560.0;

/// Markdown preview panel
pub struct PreviewPanel;

impl PreviewPanel {
    /// Show the preview panel
    pub fn show(ui: &mut egui::Ui, app: &mut BooklessApp) {
        // Get content first to avoid borrow conflicts
        let state = app.state();
        let body = state.document.body().to_string();
        let paginated = state.paginated;
        // Relative image links resolve against the book folder
        let scheme = state
            .folder
            .as_ref()
            .map(|folder| format!("file://{}/", folder.display()));

        egui::ScrollArea::vertical()
            .id_salt("preview_scroll")
            .show(ui, |ui| {
                let mut viewer = CommonMarkViewer::new();
                if let Some(scheme) = scheme {
                    viewer = viewer.default_implicit_uri_scheme(scheme);
                }
                if paginated {
                    ui.vertical_centered(|ui| {
                        egui::Frame::new()
                            .fill(ui.visuals().extreme_bg_color)
                            .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
                            .inner_margin(egui::Margin::same(48))
                            .show(ui, |ui| {
                                ui.set_width(PAGE_WIDTH);
                                viewer.show(ui, &mut app.commonmark_cache, &body);
                            });
                    });
                } else {
                    viewer.show(ui, &mut app.commonmark_cache, &body);
                }
            });
    }
}
