//! MCP tool implementations
//!
//! Each module wraps engine operations with storage access and the
//! response shapes returned to clients.

pub mod diary;
pub mod foods;
pub mod goals;
pub mod recipes;
pub mod status;
pub mod summaries;
