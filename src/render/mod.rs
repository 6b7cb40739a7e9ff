//! Rendering the scenes.

pub mod gaussian_3d;
pub mod view;
