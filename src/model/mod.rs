//! Data model of the tracker: records, drafts, patches and resume files

mod application;
mod draft;
mod patch;
mod resume;

pub mod format;

pub use application::*;
pub use draft::*;
pub use patch::*;
pub use resume::*;
