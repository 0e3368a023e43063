//! The per-frame detection pipeline and the loop that drives it.

pub mod coordinate_mapper;
pub mod cycle_logger;
pub mod decoder;
pub mod infrastructure;
pub mod loop_controller;
pub mod nms;
pub mod preprocessor;
pub mod refresh_scheduler;
pub mod throughput;
