//! Utility functions for archscan

pub mod cycles;
pub mod module_path;
