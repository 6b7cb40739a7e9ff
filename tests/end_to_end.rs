use burn::tensor::{Tensor, TensorData};
use gausplat_trainer::{
    backend::{Autodiff, NdArray},
    render::{
        gaussian_3d::{Gaussian3dRasterizer, Gaussian3dRenderer},
        view::View,
    },
    scene::gaussian_3d::Gaussian3dSceneConfig,
    train::Gaussian3dTrainerConfig,
};
use std::f64::consts::FRAC_PI_2;

type AB = Autodiff<NdArray>;

/// Red on the left half, blue on the right half.
fn halves(size: usize) -> Tensor<AB, 3> {
    let colors = (0..size * size)
        .flat_map(|index| {
            if index % size < size / 2 {
                [1.0, 0.0, 0.0]
            } else {
                [0.0, 0.0, 1.0]
            }
        })
        .collect::<Vec<f32>>();
    Tensor::from_data(
        TensorData::new(colors, [size, size, 3]),
        &Default::default(),
    )
}

#[test]
fn fit_halves_then_render() {
    let device = Default::default();
    let target = halves(64);
    let view = View::looking_at_origin(64, 64, FRAC_PI_2, 8.0);
    let mut config = Gaussian3dSceneConfig::new().with_point_count(100);
    config.seed = Some(42);
    let scene = config.init::<AB>(&device).unwrap();

    let output = Gaussian3dTrainerConfig::new()
        .with_iterations(10)
        .with_frame_stride(5)
        .init(Gaussian3dRasterizer::default())
        .unwrap()
        .train(scene, &view, &target)
        .unwrap();

    assert_eq!(output.losses.len(), 10);
    assert!(output.losses.iter().all(|loss| loss.is_finite()));
    assert_eq!(output.colors_rgb_2d.unwrap().dims(), [64, 64, 3]);
    assert_eq!(output.frames.unwrap().frames().len(), 2);

    let render = Gaussian3dRasterizer::default()
        .render(&output.scene, &view)
        .unwrap();
    assert_eq!(render.colors_rgb_2d.dims(), [64, 64, 3]);
    assert_eq!(render.radii.len(), 100);
}

#[test]
fn save_outputs_after_fit() {
    use gausplat_trainer::export::{save_png, FRAME_DELAY_DEFAULT};

    let device = Default::default();
    let directory = tempfile::tempdir().unwrap();
    let target = halves(16);
    let view = View::looking_at_origin(16, 16, FRAC_PI_2, 8.0);
    let mut config = Gaussian3dSceneConfig::new().with_point_count(16);
    config.seed = Some(1);
    let scene = config.init::<AB>(&device).unwrap();

    let output = Gaussian3dTrainerConfig::new()
        .with_iterations(3)
        .with_frame_stride(1)
        .init(Gaussian3dRasterizer::default())
        .unwrap()
        .train(scene, &view, &target)
        .unwrap();

    let gif_path = directory.path().join("renders/training.gif");
    let png_path = directory.path().join("renders/final.png");
    output
        .frames
        .unwrap()
        .save_gif(&gif_path, FRAME_DELAY_DEFAULT)
        .unwrap();
    save_png(&output.colors_rgb_2d.unwrap(), &png_path).unwrap();

    assert!(gif_path.exists());
    let image = image::open(&png_path).unwrap();
    assert_eq!((image.width(), image.height()), (16, 16));
}
