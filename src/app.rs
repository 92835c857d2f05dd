//! Main application state and UI coordination
//!
//! The UI thread owns the [`Store`]. Anything that touches the disk or a
//! dialog runs on the tokio runtime and reports back by sending transitions
//! to the inbox, which is drained once per frame in arrival order. Planned
//! writes go to a single writer task so they hit the disk in dispatch order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eframe::egui;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::core::assets;
use crate::core::book_config::{self, BookConfig};
use crate::core::chapters::{self, ChapterEntry, OpenedFolder};
use crate::core::config::AppConfig;
use crate::core::dialogs::{Dialogs, NoticeLevel};
use crate::core::mirror::WriteQueue;
use crate::core::store::{AppState, Request, Store, Transition};
use crate::export::{self, ExportScope};
use crate::ui::dialogs::NativeDialogs;
use crate::ui::{editor::EditorPanel, explorer::ExplorerPanel, preview::PreviewPanel, settings::SettingsPanel};

/// View mode for the editor area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Editor,
    Preview,
    Split,
}

/// Cloneable handle async work uses to report back to the UI thread
#[derive(Clone)]
struct Inbox {
    tx: UnboundedSender<Transition>,
    ctx: egui::Context,
}

impl Inbox {
    fn send(&self, transition: Transition) {
        if self.tx.send(transition).is_err() {
            tracing::warn!("UI is gone, dropping a transition");
            return;
        }
        self.ctx.request_repaint();
    }
}

/// Main application state
pub struct BooklessApp {
    store: Store,
    /// Application preferences
    pub prefs: AppConfig,
    runtime: Handle,
    dialogs: Arc<NativeDialogs>,
    inbox: Inbox,
    transitions: UnboundedReceiver<Transition>,
    writes: WriteQueue,
    /// Current view mode
    pub view_mode: ViewMode,
    /// Commonmark cache for preview
    pub commonmark_cache: egui_commonmark::CommonMarkCache,
}

impl BooklessApp {
    /// Create a new application instance and reopen the last book
    pub fn new(cc: &eframe::CreationContext<'_>, runtime: Handle) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let prefs = AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Using default preferences: {:#}", e);
            AppConfig::default()
        });
        let dialogs = Arc::new(NativeDialogs);
        let (tx, transitions) = mpsc::unbounded_channel();
        let writes = WriteQueue::spawn(&runtime, Arc::clone(&dialogs));

        let mut app = Self {
            store: Store::new(),
            prefs,
            runtime,
            dialogs,
            inbox: Inbox {
                tx,
                ctx: cc.egui_ctx.clone(),
            },
            transitions,
            writes,
            view_mode: ViewMode::Split,
            commonmark_cache: egui_commonmark::CommonMarkCache::default(),
        };

        if let Some(folder) = app.prefs.last_folder.clone().filter(|folder| folder.is_dir()) {
            app.reopen_folder(folder);
        }
        app
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    /// Apply a transition and carry out whatever it asks for
    pub fn dispatch(&mut self, transition: Transition) {
        let selected = match &transition {
            Transition::SelectFolder { folder } => Some(folder.clone()),
            _ => None,
        };
        let outcome = self.store.dispatch(transition);
        if !outcome.applied {
            return;
        }
        if let Some(folder) = selected {
            self.remember_folder(folder);
        }
        for write in outcome.writes {
            self.writes.push(write);
        }
        for request in outcome.requests {
            match request {
                Request::OpenChapter { folder, name } => self.open_chapter_in(folder, name),
            }
        }
    }

    fn drain_inbox(&mut self) {
        while let Ok(transition) = self.transitions.try_recv() {
            self.dispatch(transition);
        }
    }

    fn remember_folder(&mut self, folder: PathBuf) {
        self.prefs.add_recent_folder(folder);
        if let Err(e) = self.prefs.save() {
            tracing::error!("Failed to save preferences: {:#}", e);
        }
    }

    fn spawn<F>(&self, task: impl FnOnce(Arc<NativeDialogs>, Inbox) -> F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(task(Arc::clone(&self.dialogs), self.inbox.clone()));
    }

    /// Pick a book folder and load it
    pub fn open_folder(&self) {
        self.spawn(|dialogs, inbox| async move {
            if let Some(opened) = chapters::open_folder(dialogs.as_ref()).await {
                load_folder(dialogs.as_ref(), &|t| inbox.send(t), opened).await;
            }
        });
    }

    /// Load a folder without asking, as for a recent or last-used book
    pub fn reopen_folder(&self, folder: PathBuf) {
        self.spawn(|dialogs, inbox| async move {
            match chapters::list_chapters(&folder) {
                Ok(file_names) => {
                    let opened = OpenedFolder { folder, file_names };
                    load_folder(dialogs.as_ref(), &|t| inbox.send(t), opened).await;
                }
                Err(e) => {
                    tracing::error!("Failed to list {}: {}", folder.display(), e);
                    dialogs
                        .notify(NoticeLevel::Error, "Could not open folder", &e.to_string())
                        .await;
                }
            }
        });
    }

    /// Open a chapter of the current book. The open chapter is not reloaded;
    /// the editor already holds its newest text.
    pub fn open_chapter(&self, name: &str) {
        let state = self.state();
        if state.document.file_name.as_deref() == Some(name) {
            return;
        }
        if let Some(folder) = state.folder.clone() {
            self.open_chapter_in(folder, name.to_string());
        }
    }

    fn open_chapter_in(&self, folder: PathBuf, name: String) {
        let writes = self.writes.clone();
        self.spawn(|dialogs, inbox| async move {
            writes.flushed().await;
            if let Some(chapter) = chapters::load_chapter(dialogs.as_ref(), &folder, &name).await {
                inbox.send(Transition::InitDocument { chapter });
            }
        });
    }

    /// Create a chapter file and add it after the open one
    pub fn new_chapter(&self) {
        let Some(folder) = self.state().folder.clone() else {
            return;
        };
        self.spawn(|dialogs, inbox| async move {
            let Some(name) = chapters::create_file(dialogs.as_ref(), &folder).await else {
                return;
            };
            if let Some(entry) = load_entry(&folder, &name).await {
                inbox.send(Transition::AddChapter { folder, entry });
            }
        });
    }

    pub fn rename_chapter(&self, old_name: &str) {
        let Some(folder) = self.state().folder.clone() else {
            return;
        };
        let old_name = old_name.to_string();
        self.spawn(|dialogs, inbox| async move {
            let Some(name) = chapters::rename_file(dialogs.as_ref(), &folder, &old_name).await else {
                return;
            };
            if let Some(entry) = load_entry(&folder, &name).await {
                inbox.send(Transition::RenameChapter {
                    folder,
                    old_name,
                    entry,
                });
            }
        });
    }

    pub fn delete_chapter(&self, name: &str) {
        let Some(folder) = self.state().folder.clone() else {
            return;
        };
        let name = name.to_string();
        self.spawn(|dialogs, inbox| async move {
            if chapters::delete_file(dialogs.as_ref(), &folder, &name).await {
                inbox.send(Transition::RemoveChapter { folder, name });
            }
        });
    }

    /// Move a chapter within the book
    pub fn move_chapter(&mut self, from: usize, to: usize) {
        if let Some(folder) = self.state().folder.clone() {
            self.dispatch(Transition::ReorderChapters { folder, from, to });
        }
    }

    /// Export the open chapter, or the whole book
    pub fn export(&self, whole_book: bool) {
        let state = self.state();
        let Some(folder) = state.folder.clone() else {
            return;
        };
        let scope = if whole_book {
            ExportScope::Book
        } else {
            match state.document.file_name.clone() {
                Some(name) => ExportScope::Chapter(name),
                None => return,
            }
        };
        let config = state.config.clone();
        let program = self.prefs.pandoc_path.clone();
        let writes = self.writes.clone();
        self.spawn(|dialogs, _| async move {
            writes.flushed().await;
            export::export_with_dialog(dialogs.as_ref(), &program, folder, scope, config).await;
        });
    }

    /// Copy dropped images into the book and reference them from the open chapter
    fn handle_dropped_files(&self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if dropped.is_empty() {
            return;
        }
        let state = self.state();
        let (Some(folder), Some(path)) = (state.folder.clone(), state.document.path.clone()) else {
            return;
        };
        self.spawn(|dialogs, inbox| async move {
            for source in dropped {
                if let Some(reference) = assets::paste_image(dialogs.as_ref(), &folder, &source).await {
                    inbox.send(Transition::InsertImage {
                        path: path.clone(),
                        reference,
                    });
                }
            }
        });
    }

    /// Render the top menu bar
    fn render_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                let has_book = self.state().folder.is_some();
                ui.menu_button("File", |ui| {
                    if ui.button("Open Folder...").clicked() {
                        self.open_folder();
                        ui.close();
                    }
                    ui.menu_button("Open Recent", |ui| {
                        for folder in self.prefs.recent_folders.clone() {
                            if ui.button(folder.display().to_string()).clicked() {
                                self.reopen_folder(folder);
                                ui.close();
                            }
                        }
                    });
                    if ui.add_enabled(has_book, egui::Button::new("New Chapter...")).clicked() {
                        self.new_chapter();
                        ui.close();
                    }
                    ui.separator();
                    let has_chapter = self.state().document.file_name.is_some();
                    if ui.add_enabled(has_chapter, egui::Button::new("Export Chapter...")).clicked() {
                        self.export(false);
                        ui.close();
                    }
                    if ui.add_enabled(has_book, egui::Button::new("Export Book...")).clicked() {
                        self.export(true);
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Toggle Explorer").clicked() {
                        self.dispatch(Transition::ToggleExplorer);
                        ui.close();
                    }
                    if ui.button("Toggle Settings").clicked() {
                        self.dispatch(Transition::ToggleSettings);
                        ui.close();
                    }
                    if ui.selectable_label(self.state().paginated, "Paginated Preview").clicked() {
                        self.dispatch(Transition::TogglePagination);
                        ui.close();
                    }
                    ui.separator();
                    if ui.selectable_label(self.view_mode == ViewMode::Editor, "Editor Only").clicked() {
                        self.view_mode = ViewMode::Editor;
                        ui.close();
                    }
                    if ui.selectable_label(self.view_mode == ViewMode::Preview, "Preview Only").clicked() {
                        self.view_mode = ViewMode::Preview;
                        ui.close();
                    }
                    if ui.selectable_label(self.view_mode == ViewMode::Split, "Split View").clicked() {
                        self.view_mode = ViewMode::Split;
                        ui.close();
                    }
                });
            });
        });
    }
}

impl eframe::App for BooklessApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_inbox();
        self.handle_dropped_files(ctx);

        // Handle keyboard shortcuts
        let (open, new, explorer, settings) = ctx.input(|i| {
            let cmd = i.modifiers.command;
            (
                cmd && i.key_pressed(egui::Key::O),
                cmd && i.key_pressed(egui::Key::N),
                cmd && i.key_pressed(egui::Key::E),
                cmd && i.key_pressed(egui::Key::Comma),
            )
        });
        if open {
            self.open_folder();
        }
        if new {
            self.new_chapter();
        }
        if explorer {
            self.dispatch(Transition::ToggleExplorer);
        }
        if settings {
            self.dispatch(Transition::ToggleSettings);
        }

        // Render menu bar
        self.render_menu_bar(ctx);

        if self.state().explorer_open {
            egui::SidePanel::left("explorer")
                .resizable(true)
                .default_width(260.0)
                .min_width(180.0)
                .show(ctx, |ui| {
                    ExplorerPanel::show(ui, self);
                });
        }

        if self.state().settings_open {
            egui::SidePanel::right("settings")
                .resizable(true)
                .default_width(300.0)
                .min_width(220.0)
                .show(ctx, |ui| {
                    SettingsPanel::show(ui, self);
                });
        }

        // Render main content area
        egui::CentralPanel::default().show(ctx, |ui| match self.view_mode {
            ViewMode::Editor => EditorPanel::show(ui, self),
            ViewMode::Preview => PreviewPanel::show(ui, self),
            ViewMode::Split => {
                // Split view: editor on left, preview on right
                let available_width = ui.available_width();
                ui.horizontal(|ui| {
                    ui.set_min_width(available_width);

                    ui.vertical(|ui| {
                        ui.set_width(available_width / 2.0 - 4.0);
                        EditorPanel::show(ui, self);
                    });

                    ui.separator();

                    ui.vertical(|ui| {
                        ui.set_width(available_width / 2.0 - 4.0);
                        PreviewPanel::show(ui, self);
                    });
                });
            }
        });
    }
}

/// Replace the book with `opened`: configuration first, then the chapter
/// list in configured order, then the first chapter. Each step is handed
/// to `send` as a transition.
async fn load_folder(dialogs: &impl Dialogs, send: &(impl Fn(Transition) + Sync), opened: OpenedFolder) {
    let OpenedFolder { folder, file_names } = opened;
    send(Transition::SelectFolder { folder: folder.clone() });

    let stored = match book_config::load(&folder).await {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            dialogs
                .notify(NoticeLevel::Error, "Could not read book settings", &e.to_string())
                .await;
            BookConfig::new()
        }
    };
    if stored.is_empty() {
        tracing::info!("No {} in {}, using defaults", book_config::CONFIG_FILE, folder.display());
    }
    let config = stored.with_defaults(&folder, &file_names);
    let order = config.input_files();
    send(Transition::InitConfig {
        folder: folder.clone(),
        config,
    });

    let entries = chapters::load_entries(&folder, &order).await;
    let first = entries.first().map(|entry| entry.name.clone());
    send(Transition::InitFileList {
        folder: folder.clone(),
        chapters: entries,
    });

    if let Some(name) = first {
        if let Some(chapter) = chapters::load_chapter(dialogs, &folder, &name).await {
            send(Transition::InitDocument { chapter });
        }
    }
}

async fn load_entry(folder: &Path, name: &str) -> Option<ChapterEntry> {
    chapters::load_entries(folder, &[name.to_string()]).await.pop()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::book_config::keys;
    use crate::core::dialogs::testing::ScriptedDialogs;
    use crate::core::value::Value;

    /// Run the open-folder sequence and apply what it sends to a fresh store
    async fn open(folder: &Path, dialogs: &ScriptedDialogs) -> Store {
        let sent = Mutex::new(Vec::new());
        let opened = OpenedFolder {
            folder: folder.to_path_buf(),
            file_names: chapters::list_chapters(folder).unwrap(),
        };
        load_folder(dialogs, &|t| sent.lock().unwrap().push(t), opened).await;

        let mut store = Store::new();
        for transition in sent.into_inner().unwrap() {
            assert!(store.dispatch(transition).applied);
        }
        store
    }

    #[tokio::test]
    async fn test_open_follows_config_order_and_skips_missing_chapters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();
        std::fs::write(dir.path().join("b.md"), "# B").unwrap();
        std::fs::write(
            dir.path().join(book_config::CONFIG_FILE),
            "input-files: [b.md, gone.md, a.md]\n",
        )
        .unwrap();
        let dialogs = ScriptedDialogs::default();

        let store = open(dir.path(), &dialogs).await;
        let state = store.state();
        assert_eq!(state.folder.as_deref(), Some(dir.path()));
        assert_eq!(state.chapter_names(), vec!["b.md", "a.md"]);
        assert_eq!(state.config.input_files(), state.chapter_names());
        assert_eq!(state.document.file_name.as_deref(), Some("b.md"));
        assert_eq!(state.document.raw(), "# B");
        assert_eq!(state.config.folder().as_deref(), Some(dir.path()));
        let folder_name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(state.config.get(keys::TITLE), Some(&Value::from(folder_name)));
        assert!(dialogs.errors().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_config_is_reported_and_scan_is_used() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "# B").unwrap();
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();
        std::fs::write(dir.path().join(book_config::CONFIG_FILE), "a: [1, 2\n").unwrap();
        let dialogs = ScriptedDialogs::default();

        let store = open(dir.path(), &dialogs).await;
        assert_eq!(store.state().chapter_names(), vec!["a.md", "b.md"]);
        assert_eq!(store.state().document.file_name.as_deref(), Some("a.md"));
        let errors = dialogs.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Could not read book settings"));
    }

    #[tokio::test]
    async fn test_empty_folder_keeps_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let dialogs = ScriptedDialogs::default();

        let store = open(dir.path(), &dialogs).await;
        assert!(store.state().chapters.is_empty());
        assert!(!store.state().document.is_saved());
        assert!(dialogs.errors().is_empty());
    }
}
