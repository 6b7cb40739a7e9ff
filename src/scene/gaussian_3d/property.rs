//! 3DGS scene property implementation.

pub use super::*;

use burn::tensor::activation;
use humansize::{format_size, BINARY};

/// The inner properties that the optimizer is allowed to update.
#[derive(Config, Debug, PartialEq)]
pub struct Gaussian3dTrainable {
    #[config(default = true)]
    pub colors_rgb: bool,
    #[config(default = false)]
    pub opacities: bool,
    #[config(default = false)]
    pub positions: bool,
    #[config(default = false)]
    pub rotations: bool,
    #[config(default = false)]
    pub scalings: bool,
}

impl Gaussian3dTrainable {
    /// Every property is trainable.
    pub fn all() -> Self {
        Self {
            colors_rgb: true,
            opacities: true,
            positions: true,
            rotations: true,
            scalings: true,
        }
    }

    /// No property is trainable.
    pub fn none() -> Self {
        Self {
            colors_rgb: false,
            opacities: false,
            positions: false,
            rotations: false,
            scalings: false,
        }
    }

    /// Parsing a comma-separated list of property names,
    /// e.g., `colors,opacities`.
    pub fn parse(names: &str) -> Result<Self, crate::error::Error> {
        names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(Self::none(), |mut trainable, name| {
                match name {
                    "colors" | "colors_rgb" => trainable.colors_rgb = true,
                    "opacities" => trainable.opacities = true,
                    "positions" | "means" => trainable.positions = true,
                    "rotations" | "quats" => trainable.rotations = true,
                    "scalings" | "scales" => trainable.scalings = true,
                    "all" => trainable = Self::all(),
                    _ => {
                        return Err(crate::error::Error::Validation(
                            format!("trainable property ({name})"),
                            "one of colors, opacities, positions, \
                            rotations, scalings or all"
                                .into(),
                        ))
                    },
                }
                Ok(trainable)
            })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.colors_rgb
            || self.opacities
            || self.positions
            || self.rotations
            || self.scalings)
    }
}

impl Default for Gaussian3dTrainable {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Outer property value getters
impl<B: Backend> Gaussian3dScene<B> {
    /// RGB colors. (Outer value)
    ///
    /// The shape is `[P, 3]`.
    ///
    /// They range from `0.0` to `1.0`.
    #[inline]
    pub fn get_colors_rgb(&self) -> Tensor<B, 2> {
        Self::make_colors_rgb(self.colors_rgb.val())
    }

    /// Opacities. (Outer value)
    ///
    /// The shape is `[P, 1]`.
    ///
    /// They range from `0.0` to `1.0`.
    #[inline]
    pub fn get_opacities(&self) -> Tensor<B, 2> {
        Self::make_opacities(self.opacities.val())
    }

    /// 3D Positions. (Outer value)
    ///
    /// The shape is `[P, 3]`.
    #[inline]
    pub fn get_positions(&self) -> Tensor<B, 2> {
        Self::make_positions(self.positions.val())
    }

    /// Rotations. (Outer value)
    ///
    /// The shape is `[P, 4]`.
    ///
    /// They are represented as normalized Hamilton quaternions in scalar-first order,
    /// i.e., `[w, x, y, z]`.
    #[inline]
    pub fn get_rotations(&self) -> Tensor<B, 2> {
        Self::make_rotations(self.rotations.val())
    }

    /// 3D scalings. (Outer value)
    ///
    /// The shape is `[P, 3]`.
    #[inline]
    pub fn get_scalings(&self) -> Tensor<B, 2> {
        Self::make_scalings(self.scalings.val())
    }
}

/// Outer property value makers
impl<B: Backend> Gaussian3dScene<B> {
    /// Making values for [`Gaussian3dScene::get_colors_rgb`]
    #[inline]
    pub fn make_colors_rgb(colors_rgb: Tensor<B, 2>) -> Tensor<B, 2> {
        activation::sigmoid(colors_rgb)
    }

    /// Making values for [`Gaussian3dScene::get_opacities`]
    #[inline]
    pub fn make_opacities(opacities: Tensor<B, 2>) -> Tensor<B, 2> {
        activation::sigmoid(opacities)
    }

    /// Making values for [`Gaussian3dScene::get_positions`]
    #[inline]
    pub fn make_positions(positions: Tensor<B, 2>) -> Tensor<B, 2> {
        positions
    }

    /// Making values for [`Gaussian3dScene::get_rotations`]
    #[inline]
    pub fn make_rotations(rotations: Tensor<B, 2>) -> Tensor<B, 2> {
        rotations
            .to_owned()
            .div(rotations.powf_scalar(2.0).sum_dim(1).sqrt())
    }

    /// Making values for [`Gaussian3dScene::get_scalings`]
    #[inline]
    pub fn make_scalings(scalings: Tensor<B, 2>) -> Tensor<B, 2> {
        scalings
    }
}

/// Inner property value setters
impl<B: Backend> Gaussian3dScene<B> {
    /// Setting inner values for [`Gaussian3dScene::colors_rgb`]
    #[inline]
    pub fn set_inner_colors_rgb(
        &mut self,
        colors_rgb: Tensor<B, 2>,
    ) -> &mut Self {
        self.colors_rgb =
            Param::initialized(self.colors_rgb.id.to_owned(), colors_rgb);
        self
    }

    /// Setting inner values for [`Gaussian3dScene::opacities`]
    #[inline]
    pub fn set_inner_opacities(
        &mut self,
        opacities: Tensor<B, 2>,
    ) -> &mut Self {
        self.opacities =
            Param::initialized(self.opacities.id.to_owned(), opacities);
        self
    }

    /// Setting inner values for [`Gaussian3dScene::positions`]
    #[inline]
    pub fn set_inner_positions(
        &mut self,
        positions: Tensor<B, 2>,
    ) -> &mut Self {
        self.positions =
            Param::initialized(self.positions.id.to_owned(), positions);
        self
    }

    /// Setting inner values for [`Gaussian3dScene::rotations`]
    #[inline]
    pub fn set_inner_rotations(
        &mut self,
        rotations: Tensor<B, 2>,
    ) -> &mut Self {
        self.rotations =
            Param::initialized(self.rotations.id.to_owned(), rotations);
        self
    }

    /// Setting inner values for [`Gaussian3dScene::scalings`]
    #[inline]
    pub fn set_inner_scalings(
        &mut self,
        scalings: Tensor<B, 2>,
    ) -> &mut Self {
        self.scalings =
            Param::initialized(self.scalings.id.to_owned(), scalings);
        self
    }

    /// Marking the inner values as requiring gradients or not.
    ///
    /// Only the properties marked in `trainable` are tracked by autodiff.
    pub fn set_trainable(
        &mut self,
        trainable: &Gaussian3dTrainable,
    ) -> &mut Self {
        let colors_rgb =
            self.colors_rgb.val().set_require_grad(trainable.colors_rgb);
        let opacities =
            self.opacities.val().set_require_grad(trainable.opacities);
        let positions =
            self.positions.val().set_require_grad(trainable.positions);
        let rotations =
            self.rotations.val().set_require_grad(trainable.rotations);
        let scalings = self.scalings.val().set_require_grad(trainable.scalings);

        self.set_inner_colors_rgb(colors_rgb)
            .set_inner_opacities(opacities)
            .set_inner_positions(positions)
            .set_inner_rotations(rotations)
            .set_inner_scalings(scalings)
    }
}

/// Attribute getters
impl<B: Backend> Gaussian3dScene<B> {
    /// The device.
    #[inline]
    pub fn device(&self) -> B::Device {
        self.positions.device()
    }

    /// Number of points.
    #[inline]
    pub fn point_count(&self) -> usize {
        let point_count_target = self.colors_rgb.dims()[0];
        let point_count_other = self.opacities.dims()[0];
        debug_assert_eq!(point_count_other, point_count_target);
        let point_count_other = self.positions.dims()[0];
        debug_assert_eq!(point_count_other, point_count_target);
        let point_count_other = self.rotations.dims()[0];
        debug_assert_eq!(point_count_other, point_count_target);
        let point_count_other = self.scalings.dims()[0];
        debug_assert_eq!(point_count_other, point_count_target);

        point_count_target
    }

    /// Size of the parameters in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.num_params() * size_of::<B::FloatElem>()
    }

    /// Readable size of the parameters.
    #[inline]
    pub fn size_readable(&self) -> String {
        format_size(self.size(), BINARY.decimal_places(1))
    }
}
