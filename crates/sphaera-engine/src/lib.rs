//! Sphaera engine crate.
//!
//! Generates a latitude/longitude sphere, uploads it to the GPU and drives a
//! fixed Phong pipeline from a single-window render loop.

pub mod coords;
pub mod core;
pub mod device;
pub mod logging;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod shader;
pub mod window;
