//! Pixel-level implementations of the transform kinds.

pub mod blur;
pub mod enhance;
pub mod geometry;
