//! Data models for archscan

pub mod config;
pub mod dependency_graph;
pub mod detection;
pub mod facts;
pub mod pattern;
pub mod report;
