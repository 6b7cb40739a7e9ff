#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Empty Frames Error: There is no frame to export")]
    EmptyFrames,

    #[error("HTTP Error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tensor Data Error: {0}")]
    TensorData(String),

    #[error("Validation Error: {0} should be {1}")]
    Validation(String, String),

    #[error("Zip Error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl From<burn::tensor::DataError> for Error {
    #[inline]
    fn from(error: burn::tensor::DataError) -> Self {
        Self::TensorData(format!("{error:?}"))
    }
}
