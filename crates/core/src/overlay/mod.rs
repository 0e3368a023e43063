pub mod class_palette;
pub mod domain;
pub mod infrastructure;
pub mod renderer;
