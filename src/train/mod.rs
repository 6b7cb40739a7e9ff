//! 3DGS training.

pub mod config;
pub mod loss;

pub use crate::{
    backend::{AutodiffBackend, Backend},
    error::Error,
    export::FrameRecorder,
    render::gaussian_3d::{Gaussian3dRenderer, View},
    scene::gaussian_3d::{Gaussian3dScene, Gaussian3dTrainable},
};
pub use burn::tensor::Tensor;
pub use config::*;
pub use loss::*;

use burn::{
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::ElementConversion,
};
use std::fmt;

/// Fitting a [`Gaussian3dScene`] to a target image from a fixed view.
#[derive(Clone, Debug, PartialEq)]
pub struct Gaussian3dTrainer<R> {
    pub config: Gaussian3dTrainerConfig,
    pub renderer: R,
}

pub struct Gaussian3dTrainOutput<B: Backend> {
    pub scene: Gaussian3dScene<B>,
    /// The loss of each iteration.
    pub losses: Vec<f32>,
    /// `[I_y, I_x, 3]`, the image rendered at the last iteration.
    pub colors_rgb_2d: Option<Tensor<B, 3>>,
    /// It is `None` if the frames are not recorded.
    pub frames: Option<FrameRecorder>,
}

impl<R> Gaussian3dTrainer<R> {
    /// Running the optimization loop for the configured iterations.
    ///
    /// `target` is `[I_y, I_x, 3]` and should match the size of `view`.
    pub fn train<AB: AutodiffBackend>(
        &self,
        mut scene: Gaussian3dScene<AB>,
        view: &View,
        target: &Tensor<AB, 3>,
    ) -> Result<Gaussian3dTrainOutput<AB>, Error>
    where
        R: Gaussian3dRenderer<AB>,
    {
        let config = &self.config;
        // M
        let iterations = config.iterations;
        let mut frames = if config.is_recording_frames {
            Some(FrameRecorder::new(config.frame_stride)?)
        } else {
            None
        };
        let mut losses = Vec::with_capacity(iterations);
        let mut colors_rgb_2d = None;

        log::info!(
            target: "gausplat::trainer::train",
            "train > point_count ({}) > size ({}) > iterations ({iterations})",
            scene.point_count(),
            scene.size_readable(),
        );

        if iterations == 0 {
            return Ok(Gaussian3dTrainOutput {
                scene,
                losses,
                colors_rgb_2d,
                frames,
            });
        }

        scene.set_trainable(&config.trainable);

        let mut optimizer = AdamConfig::new()
            .with_beta_1(0.9)
            .with_beta_2(0.999)
            .with_epsilon(1e-8)
            .init();

        for iteration in 0..iterations {
            // Forward
            let output = self.renderer.render(&scene, view)?;
            let image = output.colors_rgb_2d;

            // Loss
            let loss = mse_loss(image.to_owned(), target.to_owned())?;
            let loss_value = loss.to_owned().into_scalar().elem::<f32>();

            log::info!(
                target: "gausplat::trainer::train",
                "Iteration {}/{iterations}, Loss: {loss_value}",
                iteration + 1,
            );
            log::debug!(
                target: "gausplat::trainer::train",
                "Iteration {}/{iterations} > {}",
                iteration + 1,
                Extrema(&scene, &image),
            );

            if let Some(frames) = frames.as_mut() {
                frames.capture(iteration, &image)?;
            }

            // Backward
            let grads = GradientsParams::from_grads(loss.backward(), &scene);

            // Step
            scene = optimizer.step(config.learning_rate, scene, grads);

            losses.push(loss_value);
            colors_rgb_2d = Some(image);
        }

        Ok(Gaussian3dTrainOutput {
            scene,
            losses,
            colors_rgb_2d,
            frames,
        })
    }
}

/// Minimum and maximum values for the debug logs.
struct Extrema<'a, B: Backend>(&'a Gaussian3dScene<B>, &'a Tensor<B, 3>);

impl<B: Backend> fmt::Display for Extrema<'_, B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let range = |tensor: Tensor<B, 1>| {
            let min = tensor.to_owned().min().into_scalar().elem::<f32>();
            let max = tensor.max().into_scalar().elem::<f32>();
            (min, max)
        };
        let (colors_rgb_min, colors_rgb_max) =
            range(self.0.colors_rgb.val().flatten(0, 1));
        let (opacities_min, opacities_max) =
            range(self.0.opacities.val().flatten(0, 1));
        let (image_min, image_max) = range(self.1.to_owned().flatten(0, 2));

        write!(
            f,
            "colors_rgb ({colors_rgb_min}, {colors_rgb_max}) > \
            opacities ({opacities_min}, {opacities_max}) > \
            image ({image_min}, {image_max})",
        )
    }
}

impl<B: Backend> fmt::Debug for Gaussian3dTrainOutput<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct(&format!("Gaussian3dTrainOutput<{}>", B::name()))
            .field("scene", &self.scene)
            .field("losses.len()", &self.losses.len())
            .field(
                "colors_rgb_2d.dims()",
                &self.colors_rgb_2d.as_ref().map(Tensor::dims),
            )
            .field(
                "frames.len()",
                &self.frames.as_ref().map(|frames| frames.frames().len()),
            )
            .finish()
    }
}
