//! Binning the projected points into screen tiles.

pub use super::{TILE_SIZE_X, TILE_SIZE_Y};

use rayon::slice::ParallelSliceMut;
use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arguments {
    /// `Z_min`
    pub depth_min: f32,
    /// `I_x / T_x`
    pub tile_count_x: u32,
    /// `I_y / T_y`
    pub tile_count_y: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inputs {
    /// `[P, 3]`, i.e., `(a, b, c)` of `[[a, b], [b, c]]`
    pub covariances_2d: Vec<[f32; 3]>,
    /// `[P]`
    pub depths: Vec<f32>,
    /// `[P, 2]`
    pub positions_2d: Vec<[f32; 2]>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outputs {
    /// `[T]`, ordered by tile index, then by depth.
    pub point_indices: Vec<u32>,
    /// `[P]`
    pub radii: Vec<u32>,
    /// `[(I_y / T_y) * (I_x / T_x)]`
    pub tile_point_ranges: Vec<Range<usize>>,
}

pub fn main(
    arguments: Arguments,
    inputs: Inputs,
) -> Outputs {
    let tile_count_x = arguments.tile_count_x as i64;
    let tile_count_y = arguments.tile_count_y as i64;
    let tile_count = (tile_count_x * tile_count_y) as usize;
    let tile_size_x = TILE_SIZE_X as f32;
    let tile_size_y = TILE_SIZE_Y as f32;

    debug_assert_eq!(inputs.covariances_2d.len(), inputs.depths.len());
    debug_assert_eq!(inputs.positions_2d.len(), inputs.depths.len());

    // [P] * 2
    let (radii, tiles_touched) = inputs
        .covariances_2d
        .iter()
        .zip(&inputs.depths)
        .zip(&inputs.positions_2d)
        .map(|((&[a, b, c], &depth), &[x, y])| {
            let is_visible = depth > arguments.depth_min
                && [a, b, c, x, y].iter().all(|v| v.is_finite());
            if !is_visible {
                return (0, [0; 4]);
            }

            // The largest eigenvalue of the 2D covariance
            let middle = (a + c) / 2.0;
            let determinant = a * c - b * b;
            let extent_max =
                middle + (middle * middle - determinant).max(0.1).sqrt();
            let radius = (3.0 * extent_max.sqrt()).ceil();

            // [x_min, x_max, y_min, y_max]
            let tiles = [
                ((x - radius) / tile_size_x).floor() as i64,
                ((x + radius + tile_size_x - 1.0) / tile_size_x).floor() as i64,
                ((y - radius) / tile_size_y).floor() as i64,
                ((y + radius + tile_size_y - 1.0) / tile_size_y).floor() as i64,
            ];
            let tiles = [
                tiles[0].clamp(0, tile_count_x) as u32,
                tiles[1].clamp(0, tile_count_x) as u32,
                tiles[2].clamp(0, tile_count_y) as u32,
                tiles[3].clamp(0, tile_count_y) as u32,
            ];
            if tiles[0] == tiles[1] || tiles[2] == tiles[3] {
                return (0, [0; 4]);
            }

            (radius as u32, tiles)
        })
        .unzip::<_, _, Vec<_>, Vec<_>>();

    // [P]
    let tile_touched_counts = tiles_touched
        .iter()
        .map(|t| ((t[1] - t[0]) * (t[3] - t[2])) as usize)
        .collect::<Vec<_>>();

    // [P], T
    let (tile_touched_offsets, tile_touched_count) = {
        let offsets = tile_touched_counts
            .iter()
            .scan(0, |state, &count| {
                let offset = *state;
                *state += count;
                Some(offset)
            })
            .collect::<Vec<_>>();
        let count = offsets.last().copied().unwrap_or_default()
            + tile_touched_counts.last().copied().unwrap_or_default();

        (offsets, count)
    };

    // [P] (f32 -> u32), the order is kept for positive values
    let depths = bytemuck::cast_slice::<f32, u32>(&inputs.depths);

    // [T]
    let mut point_keys_and_indices = vec![(0_u64, 0_u32); tile_touched_count];
    for (index, tiles) in tiles_touched.iter().enumerate() {
        let mut offset = tile_touched_offsets[index];
        for tile_y in tiles[2]..tiles[3] {
            for tile_x in tiles[0]..tiles[1] {
                let tile = (tile_y * arguments.tile_count_x + tile_x) as u64;
                point_keys_and_indices[offset] =
                    (tile << 32 | depths[index] as u64, index as u32);
                offset += 1;
            }
        }
    }

    point_keys_and_indices.par_sort_unstable_by_key(|(key, _)| *key);

    // [(I_y / T_y) * (I_x / T_x)]
    let mut tile_point_ranges = vec![0..0; tile_count];
    for (offset, (key, _)) in point_keys_and_indices.iter().enumerate() {
        let tile = (key >> 32) as usize;
        let range = &mut tile_point_ranges[tile];
        if range.start == range.end {
            *range = offset..offset;
        }
        range.end = offset + 1;
    }

    let point_indices = point_keys_and_indices
        .into_iter()
        .map(|(_, index)| index)
        .collect();

    Outputs {
        point_indices,
        radii,
        tile_point_ranges,
    }
}
