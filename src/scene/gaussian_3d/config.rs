pub use super::{Backend, Gaussian3dScene, Param, Tensor, TensorData};
pub use burn::config::Config;

use crate::error::Error;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f32::consts::PI;

/// Random initialization of [`Gaussian3dScene`].
#[derive(Config, Debug, PartialEq)]
pub struct Gaussian3dSceneConfig {
    /// Number of primitives (`P`).
    #[config(default = 2000)]
    pub point_count: usize,
    /// Half-width of the cube where the positions are sampled.
    #[config(default = 1.0)]
    pub position_extent: f64,
    /// Seed of the random generator.
    ///
    /// It is seeded from the OS entropy if it is `None`.
    #[config(default = "None")]
    pub seed: Option<u64>,
}

impl Gaussian3dSceneConfig {
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<Gaussian3dScene<B>, Error> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.init_with_rng(device, &mut rng)
    }

    pub fn init_with_rng<B: Backend, R: Rng + ?Sized>(
        &self,
        device: &B::Device,
        rng: &mut R,
    ) -> Result<Gaussian3dScene<B>, Error> {
        // P
        let point_count = self.point_count;
        let extent = self.position_extent as f32;

        if point_count == 0 {
            return Err(Error::Validation(
                "point_count".into(),
                "greater than 0".into(),
            ));
        }
        if !(extent.is_finite() && extent > 0.0) {
            return Err(Error::Validation(
                format!("position_extent ({extent})"),
                "a positive finite number".into(),
            ));
        }

        let mut colors_rgb = Vec::with_capacity(point_count * 3);
        let mut positions = Vec::with_capacity(point_count * 3);
        let mut rotations = Vec::with_capacity(point_count * 4);
        let mut scalings = Vec::with_capacity(point_count * 3);

        for _ in 0..point_count {
            positions.extend([(); 3].map(|_| rng.gen_range(-extent..extent)));
            scalings.extend([(); 3].map(|_| rng.gen_range(f32::EPSILON..1.0)));
            colors_rgb.extend([(); 3].map(|_| rng.gen::<f32>()));

            // Uniform sampling over SO(3), (w, x, y, z)
            let u = rng.gen::<f32>();
            let v = rng.gen::<f32>();
            let w = rng.gen::<f32>();
            rotations.extend([
                (1.0 - u).sqrt() * (2.0 * PI * v).sin(),
                (1.0 - u).sqrt() * (2.0 * PI * v).cos(),
                u.sqrt() * (2.0 * PI * w).sin(),
                u.sqrt() * (2.0 * PI * w).cos(),
            ]);
        }

        let make = |values: Vec<f32>, width: usize| {
            Param::from_tensor(Tensor::<B, 2>::from_data(
                TensorData::new(values, [point_count, width])
                    .convert::<B::FloatElem>(),
                device,
            ))
        };

        log::debug!(
            target: "gausplat::trainer::scene",
            "init > point_count ({point_count})",
        );

        Ok(Gaussian3dScene {
            colors_rgb: make(colors_rgb, 3),
            opacities: make(vec![1.0; point_count], 1),
            positions: make(positions, 3),
            rotations: make(rotations, 4),
            scalings: make(scalings, 3),
        })
    }
}
