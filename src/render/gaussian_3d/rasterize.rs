//! Compositing the points into the tiles of an image.

pub use super::*;

use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arguments {
    /// `I_x`
    pub image_size_x: u32,
    /// `I_y`
    pub image_size_y: u32,
    pub opacity_max: f64,
    pub opacity_min: f64,
    /// `I_x / T_x`
    pub tile_count_x: u32,
    /// `I_y / T_y`
    pub tile_count_y: u32,
}

#[derive(Clone, Debug)]
pub struct Inputs<B: Backend> {
    /// `[P, 3]`
    pub colors_rgb: Tensor<B, 2>,
    /// `[P, 1] * 3`
    pub conics: [Tensor<B, 2>; 3],
    /// `[P, 1]`
    pub opacities: Tensor<B, 2>,
    /// `[T]`
    pub point_indices: Vec<u32>,
    /// `[P, 1] * 2`
    pub positions_2d: [Tensor<B, 2>; 2],
    /// `[(I_y / T_y) * (I_x / T_x)]`
    pub tile_point_ranges: Vec<Range<usize>>,
}

/// Returns the colors of the image, `[I_y, I_x, 3]`.
pub fn main<B: Backend>(
    arguments: Arguments,
    inputs: Inputs<B>,
) -> Tensor<B, 3> {
    let device = inputs.colors_rgb.device();

    // [P, 6]
    let points = {
        let [x, y] = inputs.positions_2d;
        let [a, b, c] = inputs.conics;
        Tensor::cat(vec![x, y, a, b, c, inputs.opacities], 1)
    };

    // [I_y / T_y] * [T_y, I_x, 3]
    let tile_rows = (0..arguments.tile_count_y)
        .map(|tile_y| {
            let pixel_y_min = tile_y * TILE_SIZE_Y;
            let pixel_y_max =
                (pixel_y_min + TILE_SIZE_Y).min(arguments.image_size_y);

            // [I_x / T_x] * [T_y, T_x, 3]
            let tiles = (0..arguments.tile_count_x)
                .map(|tile_x| {
                    let pixel_x_min = tile_x * TILE_SIZE_X;
                    let pixel_x_max = (pixel_x_min + TILE_SIZE_X)
                        .min(arguments.image_size_x);
                    let tile_size_x = (pixel_x_max - pixel_x_min) as usize;
                    let tile_size_y = (pixel_y_max - pixel_y_min) as usize;

                    let tile =
                        (tile_y * arguments.tile_count_x + tile_x) as usize;
                    let range = inputs
                        .tile_point_ranges
                        .get(tile)
                        .cloned()
                        .unwrap_or_default();
                    if range.is_empty() {
                        return Tensor::zeros(
                            [tile_size_y, tile_size_x, 3],
                            &device,
                        );
                    }

                    // [R]
                    let indices = Tensor::<B, 1, Int>::from_data(
                        TensorData::new(
                            inputs.point_indices[range.to_owned()]
                                .iter()
                                .map(|&index| index as i64)
                                .collect::<Vec<_>>(),
                            [range.len()],
                        )
                        .convert::<B::IntElem>(),
                        &device,
                    );

                    composite(
                        &arguments,
                        points.to_owned().select(0, indices.to_owned()),
                        inputs.colors_rgb.to_owned().select(0, indices),
                        [pixel_x_min, pixel_y_min],
                        [tile_size_x, tile_size_y],
                    )
                })
                .collect::<Vec<_>>();

            Tensor::cat(tiles, 1)
        })
        .collect::<Vec<_>>();

    Tensor::cat(tile_rows, 0)
}

/// Alpha blending of the sorted points in front-to-back order.
///
/// Returns the colors of the tile, `[T_y, T_x, 3]`.
fn composite<B: Backend>(
    arguments: &Arguments,
    points: Tensor<B, 2>,
    colors_rgb: Tensor<B, 2>,
    pixel_min: [u32; 2],
    tile_size: [usize; 2],
) -> Tensor<B, 3> {
    let device = points.device();
    let [tile_size_x, tile_size_y] = tile_size;
    // R
    let point_count = points.dims()[0];
    // T_y * T_x
    let pixel_count = tile_size_x * tile_size_y;

    let make = |values: Vec<f32>, shape: [usize; 2]| {
        Tensor::<B, 2>::from_data(
            TensorData::new(values, shape).convert::<B::FloatElem>(),
            &device,
        )
    };

    // [T_y * T_x, R] * 2 (Pixel centers)
    let (pixels_x, pixels_y) = {
        let (x, y) = (0..tile_size_y)
            .flat_map(|y| (0..tile_size_x).map(move |x| (x, y)))
            .map(|(x, y)| {
                (
                    (pixel_min[0] as usize + x) as f32 + 0.5,
                    (pixel_min[1] as usize + y) as f32 + 0.5,
                )
            })
            .unzip::<_, _, Vec<_>, Vec<_>>();

        (
            make(x, [pixel_count, 1]).expand([pixel_count, point_count]),
            make(y, [pixel_count, 1]).expand([pixel_count, point_count]),
        )
    };

    // [T_y * T_x, R] * 6
    let [x, y, a, b, c, opacities] =
        transform::columns::<B, 6>(points).map(|column| {
            column.transpose().expand([pixel_count, point_count])
        });

    // [T_y * T_x, R]
    let alphas = {
        let d_x = x - pixels_x;
        let d_y = y - pixels_y;
        let powers = (a * d_x.to_owned() * d_x.to_owned()
            + c * d_y.to_owned() * d_y.to_owned())
        .mul_scalar(-0.5)
            - b * d_x * d_y;
        let alphas = (opacities * powers.clamp_max(0.0).exp())
            .clamp_max(arguments.opacity_max);

        alphas
            .to_owned()
            .mask_fill(alphas.lower_elem(arguments.opacity_min), 0.0)
    };

    // [R, R] (Strictly upper triangular)
    let exclusive_sums = make(
        (0..point_count)
            .flat_map(|row| {
                (0..point_count).map(move |col| (row < col) as u8 as f32)
            })
            .collect(),
        [point_count, point_count],
    );

    // [T_y * T_x, R] <- prod_{j < i} (1 - alpha_j)
    let transmittances = alphas
        .to_owned()
        .neg()
        .add_scalar(1.0)
        .log()
        .matmul(exclusive_sums)
        .exp();

    // [T_y * T_x, 3] <- sum_i (alpha_i * T_i * c_i)
    (alphas * transmittances)
        .matmul(colors_rgb)
        .reshape([tile_size_y, tile_size_x, 3])
}
