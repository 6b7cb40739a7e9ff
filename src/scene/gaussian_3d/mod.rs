//! 3DGS scene representation.

pub mod config;
pub mod property;

pub use crate::backend::{self, AutodiffBackend, Backend};
pub use burn::{
    module::{AutodiffModule, Module, Param},
    tensor::{Tensor, TensorData},
};
pub use config::*;
pub use property::*;

use std::fmt;

/// A set of 3D Gaussian primitives.
///
/// All the properties are stored as inner (unconstrained) values.
/// Use the outer value getters, e.g., [`Gaussian3dScene::get_colors_rgb`],
/// to obtain the values consumed by a renderer.
#[derive(Module)]
pub struct Gaussian3dScene<B: Backend> {
    /// Inner value of RGB colors.
    ///
    /// The shape is `[P, 3]`.
    pub colors_rgb: Param<Tensor<B, 2>>,
    /// Inner value of opacities.
    ///
    /// The shape is `[P, 1]`.
    pub opacities: Param<Tensor<B, 2>>,
    /// Inner value of 3D positions.
    ///
    /// The shape is `[P, 3]`.
    pub positions: Param<Tensor<B, 2>>,
    /// Inner value of rotations.
    ///
    /// The shape is `[P, 4]`.
    pub rotations: Param<Tensor<B, 2>>,
    /// Inner value of 3D scalings.
    ///
    /// The shape is `[P, 3]`.
    pub scalings: Param<Tensor<B, 2>>,
}

impl<B: Backend> fmt::Debug for Gaussian3dScene<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct(&format!("Gaussian3dScene<{}>", B::name()))
            .field("devices", &self.devices())
            .field("colors_rgb.dims()", &self.colors_rgb.dims())
            .field("opacities.dims()", &self.opacities.dims())
            .field("positions.dims()", &self.positions.dims())
            .field("rotations.dims()", &self.rotations.dims())
            .field("scalings.dims()", &self.scalings.dims())
            .finish()
    }
}
