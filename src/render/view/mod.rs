use std::f64::consts::FRAC_PI_2;

/// A fixed pinhole view in 3D space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    /// The horizontal field of view in radians.
    pub field_of_view_x: f64,
    /// The vertical field of view in radians.
    pub field_of_view_y: f64,
    /// Image height.
    pub image_height: u32,
    /// Image width.
    pub image_width: u32,
    /// Affine transformation from world space to view space.
    ///
    /// It is in **column-major order**, i.e., `M[col][row]`.
    ///
    /// # Format
    ///
    /// ```plaintext
    /// [R_v   | T_v]
    /// [...   | ...]
    /// [0 0 0 | 1  ]
    /// ```
    pub view_transform: [[f64; 4]; 4],
}

/// Linear transformations.
impl View {
    /// Returns the affine transformation matrix.
    ///
    /// `rotation` is in row-major order, i.e., `R[row][col]`.
    /// The result is in **column-major order**, i.e., `M[col][row]`.
    #[inline]
    pub const fn transform(
        rotation: &[[f64; 3]; 3],
        translation: &[f64; 3],
    ) -> [[f64; 4]; 4] {
        let r = rotation;
        let t = translation;
        [
            [r[0][0], r[1][0], r[2][0], 0.0],
            [r[0][1], r[1][1], r[2][1], 0.0],
            [r[0][2], r[1][2], r[2][2], 0.0],
            [t[0], t[1], t[2], 1.0],
        ]
    }

    /// The rotation part of [`View::view_transform`] in row-major order.
    #[inline]
    pub const fn view_rotation(&self) -> [[f64; 3]; 3] {
        let m = &self.view_transform;
        [
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ]
    }

    /// The translation part of [`View::view_transform`].
    #[inline]
    pub const fn view_translation(&self) -> [f64; 3] {
        let m = &self.view_transform;
        [m[3][0], m[3][1], m[3][2]]
    }
}

/// Camera intrinsics
impl View {
    /// A square-pixel view with the horizontal field of view `field_of_view_x`,
    /// looking down `+Z` from `distance` units in front of the origin.
    pub fn looking_at_origin(
        image_width: u32,
        image_height: u32,
        field_of_view_x: f64,
        distance: f64,
    ) -> Self {
        let focal_length =
            image_width as f64 / (field_of_view_x / 2.0).tan() / 2.0;
        let field_of_view_y =
            2.0 * (image_height as f64 / focal_length / 2.0).atan();

        Self {
            field_of_view_x,
            field_of_view_y,
            image_height,
            image_width,
            view_transform: Self::transform(
                &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                &[0.0, 0.0, distance],
            ),
        }
    }

    /// `f_x <- I_x / tan(Fov_x / 2) / 2`
    #[inline]
    pub fn focal_length_x(&self) -> f64 {
        self.image_width as f64 / (self.field_of_view_x / 2.0).tan() / 2.0
    }

    /// `f_y <- I_y / tan(Fov_y / 2) / 2`
    #[inline]
    pub fn focal_length_y(&self) -> f64 {
        self.image_height as f64 / (self.field_of_view_y / 2.0).tan() / 2.0
    }

    /// `I_y * I_x`
    #[inline]
    pub const fn pixel_count(&self) -> u32 {
        self.image_height * self.image_width
    }
}

impl Default for View {
    /// A `256 x 256` view with a 90° field of view, 8 units away from the origin.
    #[inline]
    fn default() -> Self {
        Self::looking_at_origin(256, 256, FRAC_PI_2, 8.0)
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn transform() {
        use super::*;

        let rotation = [
            [0.9870946659543874, -0.000481623211642526, -0.1601370927782764],
            [0.011754269038001336, 0.9975159094549839, 0.0694539238889973],
            [0.1597058471183149, -0.07043989227191047, 0.9846482945564589],
        ];
        let translation = [0.129242027423, 0.0, -0.3424233862];
        let target = [
            [0.9870946659543874, 0.011754269038001336, 0.1597058471183149, 0.0],
            [
                -0.000481623211642526,
                0.9975159094549839,
                -0.07043989227191047,
                0.0,
            ],
            [-0.1601370927782764, 0.0694539238889973, 0.9846482945564589, 0.0],
            [0.129242027423, 0.0, -0.3424233862, 1.0],
        ];

        let output = View::transform(&rotation, &translation);
        assert_eq!(output, target);

        let view = View {
            view_transform: output,
            ..Default::default()
        };
        assert_eq!(view.view_rotation(), rotation);
        assert_eq!(view.view_translation(), translation);
    }

    #[test]
    fn focal_lengths_of_default_view() {
        use super::*;

        let view = View::default();

        // 0.5 * W / tan(Fov_x / 2)
        assert!((view.focal_length_x() - 128.0).abs() < 1e-9);
        assert!((view.focal_length_y() - 128.0).abs() < 1e-9);
        assert_eq!(view.view_translation(), [0.0, 0.0, 8.0]);
        assert_eq!(view.pixel_count(), 256 * 256);
    }

    #[test]
    fn looking_at_origin_non_square() {
        use super::*;

        let view = View::looking_at_origin(128, 64, FRAC_PI_2, 4.0);

        assert!((view.focal_length_x() - view.focal_length_y()).abs() < 1e-9);
        assert!(view.field_of_view_y < view.field_of_view_x);
    }
}
