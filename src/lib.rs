//! NutriLog Library
//!
//! Nutrition intake engine: foods, recipes, diary snapshots, goals and
//! summaries, served over MCP.

pub mod build_info;
pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
