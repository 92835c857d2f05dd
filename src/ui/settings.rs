//! Book settings form
//!
//! Each field shows one configuration key. Some keys are stored in a form
//! pandoc wants and edited in a friendlier one, so a field converts on the
//! way in ([`FieldKind::load`]) and on the way out ([`FieldKind::finish`]).

use eframe::egui;

use crate::app::BooklessApp;
use crate::core::book_config::{keys, BookConfig};
use crate::core::store::Transition;
use crate::core::value::Value;

const STYLE_OPEN: &str = "<style>\n";
const STYLE_CLOSE: &str = "\n</style>";

/// How a field is edited and stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Whole pixels, stored with a `px` suffix
    Pixels,
    /// CSS, stored wrapped in a style element
    Css,
    /// Chapter order; shown one per line and never edited here
    Chapters,
}

struct Field {
    key: &'static str,
    label: &'static str,
    kind: FieldKind,
    hint: &'static str,
}

const BOOK_FIELDS: &[Field] = &[
    Field { key: keys::INPUT_FILES, label: "Book chapters", kind: FieldKind::Chapters, hint: "" },
    Field { key: keys::TITLE, label: "Title", kind: FieldKind::Text, hint: "" },
    Field { key: keys::AUTHOR, label: "Author", kind: FieldKind::Text, hint: "" },
    Field { key: keys::DATE, label: "Date", kind: FieldKind::Text, hint: "" },
    Field { key: keys::LANG, label: "Language", kind: FieldKind::Text, hint: "en" },
];

const LAYOUT_FIELDS: &[Field] = &[
    Field { key: keys::FONT_FAMILY, label: "Font family", kind: FieldKind::Text, hint: "mathpazo" },
    Field { key: keys::FONT_SIZE, label: "Font size (px)", kind: FieldKind::Pixels, hint: "" },
    Field { key: keys::LINE_HEIGHT, label: "Line height", kind: FieldKind::Text, hint: "1.5" },
    Field {
        key: keys::HEADER_INCLUDES,
        label: "Include CSS",
        kind: FieldKind::Css,
        hint: "blockquote {\n  font-style: italic;\n}",
    },
];

impl FieldKind {
    /// Text shown in the form for a stored value
    pub fn load(self, value: Option<&Value>) -> String {
        let stored = match value {
            Some(Value::List(items)) => items
                .iter()
                .filter_map(Value::scalar_text)
                .collect::<Vec<_>>()
                .join("\n"),
            Some(value) => value.to_string(),
            None => String::new(),
        };
        match self {
            FieldKind::Text | FieldKind::Chapters => stored,
            FieldKind::Pixels => leading_digits(&stored).to_string(),
            FieldKind::Css => stored
                .strip_prefix(STYLE_OPEN)
                .and_then(|inner| inner.strip_suffix(STYLE_CLOSE))
                .map(str::to_string)
                .unwrap_or(stored),
        }
    }

    /// Value stored for text typed into the form
    pub fn finish(self, text: &str) -> Value {
        match self {
            FieldKind::Text | FieldKind::Chapters => Value::from(text),
            FieldKind::Pixels => match leading_digits(text) {
                "" => Value::from(""),
                digits => Value::from(format!("{digits}px")),
            },
            FieldKind::Css => Value::from(format!("{STYLE_OPEN}{text}{STYLE_CLOSE}")),
        }
    }

    fn multiline(self) -> bool {
        matches!(self, FieldKind::Css | FieldKind::Chapters)
    }
}

fn leading_digits(text: &str) -> &str {
    let text = text.trim_start();
    let end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    &text[..end]
}

/// Settings side panel
pub struct SettingsPanel;

impl SettingsPanel {
    /// Show the settings panel
    pub fn show(ui: &mut egui::Ui, app: &mut BooklessApp) {
        ui.horizontal(|ui| {
            ui.heading("Settings");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("\u{2715}").on_hover_text("Close").clicked() {
                    app.dispatch(Transition::ToggleSettings);
                }
            });
        });
        ui.separator();

        let Some(folder) = app.state().folder.clone() else {
            ui.label("Open a book folder to edit its settings");
            return;
        };

        let mut edits = Vec::new();
        egui::ScrollArea::vertical()
            .id_salt("settings_scroll")
            .show(ui, |ui| {
                let config = &app.state().config;
                ui.strong("Metadata");
                Self::show_fields(ui, config, BOOK_FIELDS, &mut edits);
                ui.add_space(12.0);
                ui.strong("Layout");
                Self::show_fields(ui, config, LAYOUT_FIELDS, &mut edits);
            });

        for (key, value) in edits {
            app.dispatch(Transition::UpdateConfig {
                patch: BookConfig::for_folder(&folder).with(key, value),
            });
        }
    }

    fn show_fields(
        ui: &mut egui::Ui,
        config: &BookConfig,
        fields: &[Field],
        edits: &mut Vec<(&'static str, Value)>,
    ) {
        for field in fields {
            ui.label(field.label);
            let mut text = field.kind.load(config.get(field.key));
            let edit = if field.kind.multiline() {
                egui::TextEdit::multiline(&mut text).desired_rows(4)
            } else {
                egui::TextEdit::singleline(&mut text)
            };
            let response = ui.add_enabled(
                field.kind != FieldKind::Chapters,
                edit.hint_text(field.hint).desired_width(f32::INFINITY),
            );
            if response.changed() {
                edits.push((field.key, field.kind.finish(&text)));
            }
            ui.add_space(4.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixels_drop_and_restore_suffix() {
        assert_eq!(FieldKind::Pixels.load(Some(&Value::from("12px"))), "12");
        assert_eq!(FieldKind::Pixels.load(Some(&Value::Integer(14))), "14");
        assert_eq!(FieldKind::Pixels.load(None), "");
        assert_eq!(FieldKind::Pixels.finish("12"), Value::from("12px"));
        assert_eq!(FieldKind::Pixels.finish("12abc"), Value::from("12px"));
        assert_eq!(FieldKind::Pixels.finish(""), Value::from(""));
    }

    #[test]
    fn test_css_is_wrapped_in_style_element() {
        let stored = FieldKind::Css.finish("p { color: red; }");
        assert_eq!(stored, Value::from("<style>\np { color: red; }\n</style>"));
        assert_eq!(FieldKind::Css.load(Some(&stored)), "p { color: red; }");
        // Hand-written includes without the wrapper are shown as they are
        assert_eq!(
            FieldKind::Css.load(Some(&Value::from("<link rel=x>"))),
            "<link rel=x>"
        );
    }

    #[test]
    fn test_chapters_one_per_line() {
        let names = Value::from(vec!["a.md".to_string(), "b.md".to_string()]);
        assert_eq!(FieldKind::Chapters.load(Some(&names)), "a.md\nb.md");
    }

    #[test]
    fn test_text_shows_scalars() {
        assert_eq!(FieldKind::Text.load(Some(&Value::Float(1.5))), "1.5");
        assert_eq!(FieldKind::Text.finish("Jane"), Value::from("Jane"));
    }
}
