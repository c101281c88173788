pub mod cleaner;
pub mod headers;
pub mod loader;
pub mod patterns;
pub mod types;
pub mod utils;

pub use cleaner::clean_sheet;
pub use headers::normalize_headers;
pub use loader::{FrameOptions, PreviewOptions, WorkbookLoader};
pub use patterns::analyze_column_patterns;
pub use types::{CleanedSheet, SheetFrame, SheetTable};
