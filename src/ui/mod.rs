//! UI components for Bookless

pub mod dialogs;
pub mod editor;
pub mod explorer;
pub mod preview;
pub mod settings;
