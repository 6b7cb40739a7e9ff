//! Exporting the rendered images.

pub use crate::{backend::Backend, error::Error};
pub use burn::tensor::Tensor;

use image::{
    codecs::gif::{GifEncoder, Repeat},
    Delay, DynamicImage, Frame, ImageFormat, RgbImage,
};
use std::{fs, io, path::Path, time::Duration};

/// The smallest delay that a GIF frame can hold.
pub const FRAME_DELAY_DEFAULT: Duration = Duration::from_millis(10);

/// Recording the snapshots of the training images at a fixed stride.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRecorder {
    frames: Vec<RgbImage>,
    stride: usize,
}

impl FrameRecorder {
    pub fn new(stride: usize) -> Result<Self, Error> {
        if stride == 0 {
            return Err(Error::Validation(
                "frame stride".into(),
                "greater than 0".into(),
            ));
        }

        Ok(Self {
            frames: vec![],
            stride,
        })
    }

    /// Capturing `image` if `iteration` is a multiple of the stride.
    ///
    /// Returns `true` if a frame is recorded.
    pub fn capture<B: Backend>(
        &mut self,
        iteration: usize,
        image: &Tensor<B, 3>,
    ) -> Result<bool, Error> {
        if iteration % self.stride != 0 {
            return Ok(false);
        }

        self.frames.push(to_rgb_image(image)?);
        Ok(true)
    }

    #[inline]
    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Encoding the frames as an infinitely looping GIF at `path`.
    ///
    /// The parent directories are created if missing.
    pub fn save_gif(
        &self,
        path: impl AsRef<Path>,
        delay: Duration,
    ) -> Result<(), Error> {
        let path = path.as_ref();

        if self.frames.is_empty() {
            return Err(Error::EmptyFrames);
        }

        create_parent_dir(path)?;

        let writer = io::BufWriter::new(fs::File::create(path)?);
        let mut encoder = GifEncoder::new(writer);
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.encode_frames(self.frames.iter().map(|frame| {
            Frame::from_parts(
                DynamicImage::ImageRgb8(frame.to_owned()).into_rgba8(),
                0,
                0,
                Delay::from_saturating_duration(delay),
            )
        }))?;

        log::info!(
            target: "gausplat::trainer::export",
            "save_gif > {} frames > {path:?}",
            self.frames.len(),
        );

        Ok(())
    }
}

/// Writing `image` as a PNG at `path`.
///
/// The parent directories are created if missing.
pub fn save_png<B: Backend>(
    image: &Tensor<B, 3>,
    path: impl AsRef<Path>,
) -> Result<(), Error> {
    let path = path.as_ref();

    create_parent_dir(path)?;
    to_rgb_image(image)?.save_with_format(path, ImageFormat::Png)?;

    log::info!(target: "gausplat::trainer::export", "save_png > {path:?}");

    Ok(())
}

/// Converting `[I_y, I_x, 3]` colors in `[0, 1]` to an 8-bit image.
///
/// The values are clamped and truncated.
pub fn to_rgb_image<B: Backend>(
    image: &Tensor<B, 3>
) -> Result<RgbImage, Error> {
    let [image_size_y, image_size_x, channel_count] = image.dims();
    if channel_count != 3 {
        return Err(Error::Validation(
            format!("channel count ({channel_count})"),
            "3".into(),
        ));
    }

    let values = image
        .to_owned()
        .clamp(0.0, 1.0)
        .mul_scalar(255.0)
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()?
        .into_iter()
        .map(|value| value as u8)
        .collect();

    RgbImage::from_raw(image_size_x as u32, image_size_y as u32, values)
        .ok_or_else(|| {
            Error::Validation(
                format!("image size ({image_size_x}x{image_size_y})"),
                "matched with the pixel count".into(),
            )
        })
}

fn create_parent_dir(path: &Path) -> Result<(), Error> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            Ok(fs::create_dir_all(parent)?)
        },
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NdArray;

    #[test]
    fn capture_at_stride() {
        let device = Default::default();
        let image = Tensor::<NdArray, 3>::zeros([4, 4, 3], &device);

        for (iterations, stride, frame_count) in
            [(10, 3, 4), (10, 5, 2), (1, 5, 1), (0, 2, 0), (7, 1, 7)]
        {
            let mut recorder = FrameRecorder::new(stride).unwrap();
            for iteration in 0..iterations {
                recorder.capture(iteration, &image).unwrap();
            }
            assert_eq!(
                recorder.frames().len(),
                frame_count,
                "iterations: {iterations}, stride: {stride}"
            );
        }

        assert!(FrameRecorder::new(0).is_err());
    }

    #[test]
    fn to_rgb_image_clamps_and_truncates() {
        let device = Default::default();
        let image = Tensor::<NdArray, 3>::from_floats(
            [[[0.5, 1.5, -0.5], [1.0, 0.0, 0.999]]],
            &device,
        );

        let image = to_rgb_image(&image).unwrap();

        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(0, 0).0, [127, 255, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [255, 0, 254]);
    }

    #[test]
    fn save_gif_with_frames() {
        let device = Default::default();
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("renders").join("training.gif");

        let mut recorder = FrameRecorder::new(2).unwrap();
        for iteration in 0..5 {
            let image = Tensor::<NdArray, 3>::full(
                [8, 6, 3],
                iteration as f32 / 5.0,
                &device,
            );
            recorder.capture(iteration, &image).unwrap();
        }
        recorder.save_gif(&path, FRAME_DELAY_DEFAULT).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
    }

    #[test]
    fn save_gif_without_frames() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("training.gif");

        let recorder = FrameRecorder::new(5).unwrap();
        let result = recorder.save_gif(&path, FRAME_DELAY_DEFAULT);

        assert!(matches!(result, Err(Error::EmptyFrames)));
        assert!(!path.exists());
    }

    #[test]
    fn save_png_then_open() {
        let device = Default::default();
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("renders").join("final.png");
        let image = Tensor::<NdArray, 3>::from_floats(
            [[[1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]],
            &device,
        );

        save_png(&image, &path).unwrap();

        let image = image::open(&path).unwrap().into_rgb8();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 255]);
    }
}
