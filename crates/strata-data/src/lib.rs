pub mod layout;
pub mod loader;
pub mod project;

pub use loader::{DataLoadError, Format};
pub use project::{load_project, Project};
