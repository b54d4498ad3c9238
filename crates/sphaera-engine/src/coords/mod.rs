//! Screen-space types shared by the device, render loop and window host.

mod viewport;

pub use viewport::Viewport;
