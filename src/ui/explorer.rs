//! Chapter explorer panel

use eframe::egui;

use crate::app::BooklessApp;
use crate::core::chapters::ChapterEntry;

/// What the user asked for while the list was drawn
enum Action {
    Open(String),
    Rename(String),
    Delete(String),
    Move { from: usize, to: usize },
}

/// Chapter list panel
pub struct ExplorerPanel;

impl ExplorerPanel {
    /// Show the explorer panel
    pub fn show(ui: &mut egui::Ui, app: &mut BooklessApp) {
        let mut action = None;

        ui.vertical(|ui| {
            // Header
            ui.horizontal(|ui| {
                ui.heading("Chapters");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let has_book = app.state().folder.is_some();
                    if ui
                        .add_enabled(has_book, egui::Button::new("+"))
                        .on_hover_text("New chapter")
                        .clicked()
                    {
                        app.new_chapter();
                    }
                    if ui.button("\u{1F4C2}").on_hover_text("Open folder").clicked() {
                        app.open_folder();
                    }
                });
            });

            if let Some(folder) = &app.state().folder {
                ui.weak(folder.display().to_string());
            }
            ui.separator();

            egui::ScrollArea::vertical()
                .id_salt("explorer_scroll")
                .show(ui, |ui| {
                    let state = app.state();
                    if state.folder.is_none() {
                        ui.label("No book open");
                        ui.add_space(10.0);
                        if ui.button("Open Folder...").clicked() {
                            app.open_folder();
                        }
                        return;
                    }
                    if state.chapters.is_empty() {
                        ui.label("This folder has no chapters yet");
                        return;
                    }
                    let open = state.document.file_name.as_deref();
                    let count = state.chapters.len();
                    for (index, entry) in state.chapters.iter().enumerate() {
                        let active = open == Some(entry.name.as_str());
                        if let Some(chosen) = Self::show_card(ui, index, count, entry, active) {
                            action = Some(chosen);
                        }
                    }
                });
        });

        match action {
            Some(Action::Open(name)) => app.open_chapter(&name),
            Some(Action::Rename(name)) => app.rename_chapter(&name),
            Some(Action::Delete(name)) => app.delete_chapter(&name),
            Some(Action::Move { from, to }) => app.move_chapter(from, to),
            None => {}
        }
    }

    /// One chapter: name, preview, word count and its buttons. Cards can be
    /// dragged onto each other to reorder.
    fn show_card(
        ui: &mut egui::Ui,
        index: usize,
        count: usize,
        entry: &ChapterEntry,
        active: bool,
    ) -> Option<Action> {
        let mut action = None;
        let id = egui::Id::new(("chapter", &entry.name));

        let card = egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.dnd_drag_source(id, index, |ui| {
                if ui.selectable_label(active, &entry.name).clicked() {
                    action = Some(Action::Open(entry.name.clone()));
                }
            });
            if !entry.preview.is_empty() {
                ui.weak(&entry.preview);
            }
            ui.horizontal(|ui| {
                ui.small(format!("{} words", entry.word_count));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("\u{1F5D1}").on_hover_text("Delete").clicked() {
                        action = Some(Action::Delete(entry.name.clone()));
                    }
                    if ui.small_button("\u{270F}").on_hover_text("Rename").clicked() {
                        action = Some(Action::Rename(entry.name.clone()));
                    }
                    if ui
                        .add_enabled(index + 1 < count, egui::Button::new("\u{2193}").small())
                        .on_hover_text("Move down")
                        .clicked()
                    {
                        action = Some(Action::Move {
                            from: index,
                            to: index + 1,
                        });
                    }
                    if ui
                        .add_enabled(index > 0, egui::Button::new("\u{2191}").small())
                        .on_hover_text("Move up")
                        .clicked()
                    {
                        action = Some(Action::Move {
                            from: index,
                            to: index - 1,
                        });
                    }
                });
            });
        });

        if let Some(from) = card.response.dnd_release_payload::<usize>() {
            if *from != index {
                action = Some(Action::Move { from: *from, to: index });
            }
        }
        action
    }
}
