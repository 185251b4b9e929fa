pub mod commands;
pub mod error;
pub mod file_utils;
pub mod mcp;
pub mod page_range;
pub mod pdf;
pub mod progress;
pub mod rotation;
pub mod selection;
pub mod validation;
