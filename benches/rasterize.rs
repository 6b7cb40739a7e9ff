use divan::Bencher;
use gausplat_trainer::{
    backend::NdArray,
    render::gaussian_3d::{segment, Gaussian3dRasterizer, Gaussian3dRenderer},
};

fn main() {
    divan::main();
}

mod cpu {
    use super::*;

    #[divan::bench(sample_count = 100, sample_size = 2)]
    fn segment(bencher: Bencher) {
        bencher
            .with_inputs(data::random_segment_inputs())
            .bench_local_refs(|inputs| {
                segment::main(
                    segment::Arguments {
                        depth_min: 0.2,
                        tile_count_x: data::IMAGE_SIZE / 16,
                        tile_count_y: data::IMAGE_SIZE / 16,
                    },
                    inputs.to_owned(),
                )
            });
    }

    #[divan::bench(sample_count = 10, sample_size = 1)]
    fn render(bencher: Bencher) {
        let renderer = Gaussian3dRasterizer::default();

        bencher
            .with_inputs(data::random_scene_view())
            .bench_local_refs(|(scene, view)| renderer.render(scene, view));
    }
}

mod data {
    use gausplat_trainer::{
        render::{gaussian_3d::segment::Inputs, view::View},
        scene::gaussian_3d::{Gaussian3dScene, Gaussian3dSceneConfig},
    };
    use rand::{distributions::Uniform, rngs::StdRng, Rng, SeedableRng};

    use super::NdArray;

    pub const IMAGE_SIZE: u32 = 128;
    const POINT_COUNT: usize = 1 << 12;

    pub fn random_segment_inputs() -> impl FnMut() -> Inputs {
        || {
            let mut rng = StdRng::seed_from_u64(0);
            let position = Uniform::new(0.0, IMAGE_SIZE as f32);
            let variance = Uniform::new(0.5, 16.0);
            let depth = Uniform::new(0.0, 16.0);

            let mut inputs = Inputs::default();
            for _ in 0..POINT_COUNT {
                inputs
                    .positions_2d
                    .push([rng.sample(position), rng.sample(position)]);
                inputs.covariances_2d.push([
                    rng.sample(variance),
                    0.0,
                    rng.sample(variance),
                ]);
                inputs.depths.push(rng.sample(depth));
            }
            inputs
        }
    }

    pub fn random_scene_view() -> impl FnMut() -> (Gaussian3dScene<NdArray>, View)
    {
        || {
            let mut config =
                Gaussian3dSceneConfig::new().with_point_count(POINT_COUNT / 8);
            config.seed = Some(0);
            let scene = config
                .init(&Default::default())
                .expect("initializing the scene");
            let view = View::looking_at_origin(
                IMAGE_SIZE,
                IMAGE_SIZE,
                std::f64::consts::FRAC_PI_2,
                8.0,
            );
            (scene, view)
        }
    }
}
