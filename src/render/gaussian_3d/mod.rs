//! 3DGS rendering.

pub mod rasterize;
pub mod segment;
pub mod transform;

pub use crate::{
    backend::{self, AutodiffBackend, Backend},
    error::Error,
    render::view::View,
    scene::gaussian_3d::Gaussian3dScene,
};
pub use burn::{
    config::Config,
    tensor::{Int, Tensor, TensorData},
};

use std::fmt;

/// `T_x`
pub const TILE_SIZE_X: u32 = 16;
/// `T_y`
pub const TILE_SIZE_Y: u32 = 16;
/// The maximum number of tiles.
pub const TILE_COUNT_MAX: u32 = 1 << 16;
/// The maximum number of pixels.
pub const PIXEL_COUNT_MAX: u32 = TILE_COUNT_MAX * TILE_SIZE_X * TILE_SIZE_Y;

/// Rendering a [`Gaussian3dScene`] from a [`View`].
///
/// The backward pass is derived by the autodiff backend,
/// so an implementor only needs to compose differentiable tensor operations.
pub trait Gaussian3dRenderer<B: Backend>: fmt::Debug {
    fn render(
        &self,
        scene: &Gaussian3dScene<B>,
        view: &View,
    ) -> Result<Gaussian3dRenderOutput<B>, Error>;
}

#[derive(Config, Debug, PartialEq)]
pub struct Gaussian3dRasterizerOptions {
    /// `C_f`, the variance added to the 2D covariances.
    #[config(default = 0.3)]
    pub filter_low_pass: f64,
    /// `Z_min`, the points not farther than it are culled.
    #[config(default = 0.2)]
    pub near: f64,
    /// The opacities lower than it are discarded.
    #[config(default = "1.0 / 255.0")]
    pub opacity_min: f64,
    /// The opacities higher than it are clamped.
    #[config(default = 0.99)]
    pub opacity_max: f64,
}

/// A tile-based rasterizer composed of tensor operations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gaussian3dRasterizer {
    pub options: Gaussian3dRasterizerOptions,
}

#[derive(Clone)]
pub struct Gaussian3dRenderOutput<B: Backend> {
    /// `[I_y, I_x, 3]`
    pub colors_rgb_2d: Tensor<B, 3>,
    /// `[P]`, zero for the culled points.
    pub radii: Vec<u32>,
}

impl Gaussian3dRasterizer {
    pub fn new(options: Gaussian3dRasterizerOptions) -> Self {
        Self { options }
    }
}

impl<B: Backend> Gaussian3dRenderer<B> for Gaussian3dRasterizer {
    fn render(
        &self,
        scene: &Gaussian3dScene<B>,
        view: &View,
    ) -> Result<Gaussian3dRenderOutput<B>, Error> {
        #[cfg(debug_assertions)]
        log::debug!(
            target: "gausplat::trainer::render",
            "Gaussian3dRasterizer::render",
        );

        // I_x, I_y
        let image_size_x = view.image_width;
        let image_size_y = view.image_height;
        // I_x / T_x, I_y / T_y
        let tile_count_x = image_size_x.div_ceil(TILE_SIZE_X);
        let tile_count_y = image_size_y.div_ceil(TILE_SIZE_Y);

        validate(view, scene)?;

        // [P, 3]
        let colors_rgb = scene.get_colors_rgb();
        // [P, 1]
        let opacities = scene.get_opacities();

        let focal_length_x = view.focal_length_x();
        let focal_length_y = view.focal_length_y();
        let filter_low_pass = self.options.filter_low_pass;

        let outputs_transform = transform::main(
            transform::Arguments {
                filter_low_pass,
                focal_length_x,
                focal_length_y,
                image_size_half_x: image_size_x as f64 / 2.0,
                image_size_half_y: image_size_y as f64 / 2.0,
                depth_min: self.options.near,
                view_bound_x: (view.field_of_view_x / 2.0).tan()
                    * (filter_low_pass + 1.0),
                view_bound_y: (view.field_of_view_y / 2.0).tan()
                    * (filter_low_pass + 1.0),
                view_rotation: view.view_rotation(),
                view_translation: view.view_translation(),
            },
            transform::Inputs {
                positions_3d: scene.get_positions(),
                rotations: scene.get_rotations(),
                scalings: scene.get_scalings(),
            },
        );

        #[cfg(debug_assertions)]
        log::debug!(
            target: "gausplat::trainer::render",
            "Gaussian3dRasterizer::render > transform",
        );

        let inputs_segment = {
            let [a, b, c] = outputs_transform.covariances_2d.to_owned();
            let [x, y] = outputs_transform.positions_2d.to_owned();

            // [P * 3]
            let covariances_2d = Tensor::cat(vec![a, b, c], 1)
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()?;
            // [P]
            let depths = outputs_transform
                .depths
                .to_owned()
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()?;
            // [P * 2]
            let positions_2d = Tensor::cat(vec![x, y], 1)
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()?;

            segment::Inputs {
                covariances_2d: covariances_2d
                    .chunks_exact(3)
                    .map(|c| [c[0], c[1], c[2]])
                    .collect(),
                depths,
                positions_2d: positions_2d
                    .chunks_exact(2)
                    .map(|p| [p[0], p[1]])
                    .collect(),
            }
        };

        let outputs_segment = segment::main(
            segment::Arguments {
                depth_min: self.options.near as f32,
                tile_count_x,
                tile_count_y,
            },
            inputs_segment,
        );

        #[cfg(debug_assertions)]
        log::debug!(
            target: "gausplat::trainer::render",
            "Gaussian3dRasterizer::render > segment > tile_touched_count ({})",
            outputs_segment.point_indices.len(),
        );

        let colors_rgb_2d = rasterize::main(
            rasterize::Arguments {
                image_size_x,
                image_size_y,
                opacity_max: self.options.opacity_max,
                opacity_min: self.options.opacity_min,
                tile_count_x,
                tile_count_y,
            },
            rasterize::Inputs {
                colors_rgb,
                conics: outputs_transform.conics,
                opacities,
                point_indices: outputs_segment.point_indices,
                positions_2d: outputs_transform.positions_2d,
                tile_point_ranges: outputs_segment.tile_point_ranges,
            },
        );

        #[cfg(debug_assertions)]
        log::debug!(
            target: "gausplat::trainer::render",
            "Gaussian3dRasterizer::render > rasterize",
        );

        Ok(Gaussian3dRenderOutput {
            colors_rgb_2d,
            radii: outputs_segment.radii,
        })
    }
}

fn validate<B: Backend>(
    view: &View,
    scene: &Gaussian3dScene<B>,
) -> Result<(), Error> {
    if view.image_width == 0 || view.image_height == 0 {
        return Err(Error::Validation(
            format!(
                "image size ({}x{})",
                view.image_width, view.image_height
            ),
            "greater than 0".into(),
        ));
    }

    let pixel_count = view.image_width as u64 * view.image_height as u64;
    if pixel_count > PIXEL_COUNT_MAX as u64 {
        return Err(Error::Validation(
            format!("pixel count ({pixel_count})"),
            format!("no more than {PIXEL_COUNT_MAX}"),
        ));
    }

    let point_count = scene.colors_rgb.dims()[0];
    let dims = [
        scene.colors_rgb.dims(),
        scene.opacities.dims(),
        scene.positions.dims(),
        scene.rotations.dims(),
        scene.scalings.dims(),
    ];
    if dims.iter().any(|d| d[0] != point_count) {
        return Err(Error::Validation(
            format!("row counts of the scene properties ({dims:?})"),
            format!("all equal to {point_count}"),
        ));
    }

    Ok(())
}

impl Default for Gaussian3dRasterizerOptions {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> fmt::Debug for Gaussian3dRenderOutput<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct(&format!("Gaussian3dRenderOutput<{}>", B::name()))
            .field("colors_rgb_2d.dims()", &self.colors_rgb_2d.dims())
            .field("radii.len()", &self.radii.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Autodiff, NdArray};
    use crate::scene::gaussian_3d::Gaussian3dSceneConfig;
    use burn::module::Param;

    fn scene_of_one_point<B: Backend>(
        position: [f32; 3],
        device: &B::Device,
    ) -> Gaussian3dScene<B> {
        let mut scene = Gaussian3dSceneConfig::new()
            .with_point_count(1)
            .init::<B>(device)
            .unwrap();
        scene
            .set_inner_colors_rgb(Tensor::zeros([1, 3], device))
            .set_inner_opacities(Tensor::zeros([1, 1], device))
            .set_inner_positions(Tensor::from_floats([position], device))
            .set_inner_rotations(Tensor::from_floats(
                [[1.0, 0.0, 0.0, 0.0]],
                device,
            ))
            .set_inner_scalings(Tensor::full([1, 3], 0.5, device));
        scene
    }

    #[test]
    fn render_single_point() {
        let device = Default::default();
        let scene = scene_of_one_point::<NdArray>([0.0, 0.0, 0.0], &device);
        let view = View::looking_at_origin(64, 48, 1.0, 8.0);

        let output = Gaussian3dRasterizer::default()
            .render(&scene, &view)
            .unwrap();

        assert_eq!(output.colors_rgb_2d.dims(), [48, 64, 3]);
        assert_eq!(output.radii.len(), 1);
        assert!(output.radii[0] > 0);

        // sigmoid(0) * sigmoid(0) near the center
        let center = output
            .colors_rgb_2d
            .to_owned()
            .slice([24..25, 32..33, 0..3])
            .reshape([1, 3]);
        center
            .into_data()
            .assert_approx_eq(&TensorData::from([[0.25f32; 3]]), 1);

        // Black at the corner
        let corner = output
            .colors_rgb_2d
            .slice([0..1, 0..1, 0..3])
            .reshape([1, 3]);
        corner
            .into_data()
            .assert_approx_eq(&TensorData::from([[0.0f32; 3]]), 5);
    }

    #[test]
    fn render_culled_points_in_black() {
        let device = Default::default();
        // Behind the view
        let scene = scene_of_one_point::<NdArray>([0.0, 0.0, -10.0], &device);
        let view = View::looking_at_origin(32, 32, 1.0, 8.0);

        let output = Gaussian3dRasterizer::default()
            .render(&scene, &view)
            .unwrap();

        assert_eq!(output.radii, vec![0]);
        let target = Tensor::<NdArray, 3>::zeros([32, 32, 3], &device);
        output
            .colors_rgb_2d
            .into_data()
            .assert_approx_eq(&target.into_data(), 6);
    }

    #[test]
    fn render_gradients_reach_colors() {
        let device = Default::default();
        let mut scene =
            scene_of_one_point::<Autodiff<NdArray>>([0.2, -0.1, 0.0], &device);
        scene.set_trainable(&Default::default());
        let view = View::looking_at_origin(32, 32, 1.0, 8.0);

        let output = Gaussian3dRasterizer::default()
            .render(&scene, &view)
            .unwrap();
        let grads = output.colors_rgb_2d.sum().backward();

        let colors_rgb_grad = scene.colors_rgb.val().grad(&grads).unwrap();
        let colors_rgb_grad =
            colors_rgb_grad.into_data().to_vec::<f32>().unwrap();
        assert!(
            colors_rgb_grad.iter().all(|g| *g > 0.0),
            "colors_rgb_grad: {colors_rgb_grad:?}"
        );
        assert!(scene.opacities.val().grad(&grads).is_none());
    }

    #[test]
    fn render_invalid_inputs() {
        let device = Default::default();
        let mut scene =
            scene_of_one_point::<NdArray>([0.0, 0.0, 0.0], &device);
        let rasterizer = Gaussian3dRasterizer::default();

        let view = View::looking_at_origin(0, 32, 1.0, 8.0);
        let result = rasterizer.render(&scene, &view);
        assert!(matches!(result, Err(Error::Validation(..))));

        let view = View::looking_at_origin(1 << 13, 1 << 13, 1.0, 8.0);
        let result = rasterizer.render(&scene, &view);
        assert!(matches!(result, Err(Error::Validation(..))));

        scene.opacities =
            Param::from_tensor(Tensor::zeros([2, 1], &device));
        let view = View::looking_at_origin(32, 32, 1.0, 8.0);
        let result = rasterizer.render(&scene, &view);
        assert!(matches!(result, Err(Error::Validation(..))));
    }

    #[test]
    fn default_options() {
        let options = Gaussian3dRasterizerOptions::default();
        assert_eq!(options.filter_low_pass, 0.3);
        assert_eq!(options.near, 0.2);
        assert_eq!(options.opacity_min, 1.0 / 255.0);
        assert_eq!(options.opacity_max, 0.99);
    }
}
