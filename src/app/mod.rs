//! Application orchestration: state, input handling and background jobs.

pub mod event;
pub mod handler;
pub mod image_runtime;
pub mod state;
