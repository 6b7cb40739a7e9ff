//! Projecting 3D Gaussians to the screen space.

pub use super::*;

use std::array;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arguments {
    /// `C_f`
    pub filter_low_pass: f64,
    /// `f_x <- I_x / tan(Fov_x / 2) / 2`
    pub focal_length_x: f64,
    /// `f_y <- I_y / tan(Fov_y / 2) / 2`
    pub focal_length_y: f64,
    /// `I_x / 2`
    pub image_size_half_x: f64,
    /// `I_y / 2`
    pub image_size_half_y: f64,
    /// `Z_min`
    pub depth_min: f64,
    /// `tan(Fov_x / 2) * (C_f + 1)`
    pub view_bound_x: f64,
    /// `tan(Fov_y / 2) * (C_f + 1)`
    pub view_bound_y: f64,
    /// `R_v` in row-major order
    pub view_rotation: [[f64; 3]; 3],
    /// `T_v`
    pub view_translation: [f64; 3],
}

#[derive(Clone, Debug)]
pub struct Inputs<B: Backend> {
    /// `[P, 3]`
    pub positions_3d: Tensor<B, 2>,
    /// `[P, 4]` (Normalized)
    pub rotations: Tensor<B, 2>,
    /// `[P, 3]`
    pub scalings: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct Outputs<B: Backend> {
    /// `[P, 1] * 3`, i.e., `(a, b, c)` of `[[a, b], [b, c]]`
    pub conics: [Tensor<B, 2>; 3],
    /// `[P, 1] * 3`, i.e., `(a, b, c)` of `[[a, b], [b, c]]`
    pub covariances_2d: [Tensor<B, 2>; 3],
    /// `[P, 1]`
    pub depths: Tensor<B, 2>,
    /// `[P, 1] * 2`
    pub positions_2d: [Tensor<B, 2>; 2],
}

/// Splitting `[P, N]` into `[P, 1] * N`.
pub fn columns<B: Backend, const N: usize>(
    tensor: Tensor<B, 2>
) -> [Tensor<B, 2>; N] {
    let point_count = tensor.dims()[0];
    array::from_fn(|index| {
        tensor.to_owned().slice([0..point_count, index..index + 1])
    })
}

pub fn main<B: Backend>(
    arguments: Arguments,
    inputs: Inputs<B>,
) -> Outputs<B> {
    let r_v = arguments.view_rotation;
    let t_v = arguments.view_translation;

    // [P, 1] * 3
    let positions_3d = columns::<B, 3>(inputs.positions_3d);

    // [P, 1] * 3 (World -> View)
    let positions_3d_in_view: [Tensor<B, 2>; 3] = array::from_fn(|row| {
        positions_3d[0].to_owned().mul_scalar(r_v[row][0])
            + positions_3d[1].to_owned().mul_scalar(r_v[row][1])
            + positions_3d[2].to_owned().mul_scalar(r_v[row][2])
            + t_v[row]
    });
    let [x_v, y_v, depths] = positions_3d_in_view;

    // [P, 1] (Clamped for culled points to keep the gradients finite)
    let depths_clamped = depths.to_owned().clamp_min(arguments.depth_min);
    // [P, 1]
    let x_normalized = x_v / depths_clamped.to_owned();
    // [P, 1]
    let y_normalized = y_v / depths_clamped.to_owned();

    // [P, 1] * 3 * 3
    let rotations = {
        let [w, x, y, z] = columns::<B, 4>(inputs.rotations);

        let xx = x.to_owned() * x.to_owned();
        let yy = y.to_owned() * y.to_owned();
        let zz = z.to_owned() * z.to_owned();
        let wx = w.to_owned() * x.to_owned();
        let wy = w.to_owned() * y.to_owned();
        let wz = w * z.to_owned();
        let xy = x.to_owned() * y.to_owned();
        let xz = x * z.to_owned();
        let yz = y * z;

        [
            [
                (yy.to_owned() + zz.to_owned()).mul_scalar(-2.0) + 1.0,
                (xy.to_owned() - wz.to_owned()).mul_scalar(2.0),
                (xz.to_owned() + wy.to_owned()).mul_scalar(2.0),
            ],
            [
                (xy + wz).mul_scalar(2.0),
                (xx.to_owned() + zz).mul_scalar(-2.0) + 1.0,
                (yz.to_owned() - wx.to_owned()).mul_scalar(2.0),
            ],
            [
                (xz - wy).mul_scalar(2.0),
                (yz + wx).mul_scalar(2.0),
                (xx + yy).mul_scalar(-2.0) + 1.0,
            ],
        ]
    };

    // [P, 1] * 3
    let scalings = columns::<B, 3>(inputs.scalings);

    // [P, 1] * 3 * 3 <- R_v * R * S
    let transforms_3d: [[Tensor<B, 2>; 3]; 3] = array::from_fn(|row| {
        array::from_fn(|col| {
            (rotations[0][col].to_owned().mul_scalar(r_v[row][0])
                + rotations[1][col].to_owned().mul_scalar(r_v[row][1])
                + rotations[2][col].to_owned().mul_scalar(r_v[row][2]))
                * scalings[col].to_owned()
        })
    });

    // [P, 1] * 2 * 3 <- J * R_v * R * S
    let transforms_2d = {
        let bound_x = arguments.view_bound_x;
        let bound_y = arguments.view_bound_y;

        // f_x / z
        let j_0_0 = depths_clamped
            .to_owned()
            .recip()
            .mul_scalar(arguments.focal_length_x);
        // f_y / z
        let j_1_1 = depths_clamped
            .to_owned()
            .recip()
            .mul_scalar(arguments.focal_length_y);
        // -f_x / z * x / z
        let j_0_2 = -j_0_0.to_owned()
            * x_normalized.to_owned().clamp(-bound_x, bound_x);
        // -f_y / z * y / z
        let j_1_2 = -j_1_1.to_owned()
            * y_normalized.to_owned().clamp(-bound_y, bound_y);

        [
            array::from_fn(|col| {
                j_0_0.to_owned() * transforms_3d[0][col].to_owned()
                    + j_0_2.to_owned() * transforms_3d[2][col].to_owned()
            }),
            array::from_fn(|col| {
                j_1_1.to_owned() * transforms_3d[1][col].to_owned()
                    + j_1_2.to_owned() * transforms_3d[2][col].to_owned()
            }),
        ]
    };

    // [P, 1] * 3 <- (J * R_v * R * S) * (J * R_v * R * S)^T + C_f * I
    let covariances_2d = {
        let [t_0, t_1]: [[Tensor<B, 2>; 3]; 2] = transforms_2d;
        let dot = |l: &[Tensor<B, 2>; 3], r: &[Tensor<B, 2>; 3]| {
            l[0].to_owned() * r[0].to_owned()
                + l[1].to_owned() * r[1].to_owned()
                + l[2].to_owned() * r[2].to_owned()
        };

        [
            dot(&t_0, &t_0) + arguments.filter_low_pass,
            dot(&t_0, &t_1),
            dot(&t_1, &t_1) + arguments.filter_low_pass,
        ]
    };

    // [P, 1] * 3
    let conics = {
        let [a, b, c] = covariances_2d.to_owned();
        let det = a.to_owned() * c.to_owned() - b.to_owned() * b.to_owned();

        [c / det.to_owned(), -b / det.to_owned(), a / det]
    };

    // [P, 1] * 2 (View -> Screen)
    let positions_2d = [
        x_normalized
            .mul_scalar(arguments.focal_length_x)
            .add_scalar(arguments.image_size_half_x),
        y_normalized
            .mul_scalar(arguments.focal_length_y)
            .add_scalar(arguments.image_size_half_y),
    ];

    Outputs {
        conics,
        covariances_2d,
        depths,
        positions_2d,
    }
}
