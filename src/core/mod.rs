//! Book state core: front matter, configuration mapping, chapter registry,
//! the state store and its persistence mirror

pub mod assets;
pub mod book_config;
pub mod chapters;
pub mod config;
pub mod dialogs;
pub mod document;
pub mod error;
pub mod front_matter;
pub mod mirror;
pub mod store;
pub mod text;
pub mod value;
