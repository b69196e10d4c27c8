//! QjackCtl configuration handling
//!
//! - **ini**: case-preserving INI reader
//! - **aliases**: QjackCtl setting names → JACK parameter addresses
//! - **qjackctl**: translation of the config file into a `PresetStore`
//! - **source**: mtime-based reloading of the store

mod aliases;
mod ini;
pub mod qjackctl;
pub mod source;

pub use qjackctl::{PresetSettings, PresetStore, default_config_path};
pub use source::PresetSource;
