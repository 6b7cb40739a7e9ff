//! Target images to fit.

pub use crate::{backend::Backend, error::Error};
pub use burn::tensor::{Tensor, TensorData};

use std::path::Path;

/// A synthetic target of `[I_y, I_x, 3]`.
///
/// The background is white, the top-left quadrant is red,
/// and the bottom-right quadrant is blue.
pub fn quadrants<B: Backend>(
    image_size_y: usize,
    image_size_x: usize,
    device: &B::Device,
) -> Tensor<B, 3> {
    let image_size_half_y = image_size_y / 2;
    let image_size_half_x = image_size_x / 2;

    let values = (0..image_size_y)
        .flat_map(|y| (0..image_size_x).map(move |x| (x, y)))
        .flat_map(|(x, y)| {
            let is_top = y < image_size_half_y;
            let is_left = x < image_size_half_x;
            match (is_top, is_left) {
                (true, true) => [1.0, 0.0, 0.0],
                (false, false) => [0.0, 0.0, 1.0],
                _ => [1.0, 1.0, 1.0],
            }
        })
        .collect::<Vec<f32>>();

    Tensor::from_data(
        TensorData::new(values, [image_size_y, image_size_x, 3])
            .convert::<B::FloatElem>(),
        device,
    )
}

/// Decoding the image at `path` into `[I_y, I_x, 3]` colors in `[0, 1]`.
pub fn load<B: Backend>(
    path: impl AsRef<Path>,
    device: &B::Device,
) -> Result<Tensor<B, 3>, Error> {
    let path = path.as_ref();
    let image = image::open(path)?.into_rgb8();
    let (image_size_x, image_size_y) = image.dimensions();

    log::info!(
        target: "gausplat::trainer::target",
        "load > {path:?} > {image_size_x}x{image_size_y}",
    );

    let values = image
        .into_raw()
        .into_iter()
        .map(|value| value as f32 / 255.0)
        .collect::<Vec<_>>();

    Ok(Tensor::from_data(
        TensorData::new(
            values,
            [image_size_y as usize, image_size_x as usize, 3],
        )
        .convert::<B::FloatElem>(),
        device,
    ))
}
