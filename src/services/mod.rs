pub mod excel;
pub mod file_processor;
pub mod ml;
pub mod navigation;
pub mod queue;
