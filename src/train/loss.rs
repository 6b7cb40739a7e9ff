pub use super::{Backend, Error, Tensor};

/// Mean squared error between `output` and `target`.
///
/// Both shapes should be equal.
pub fn mse_loss<B: Backend, const D: usize>(
    output: Tensor<B, D>,
    target: Tensor<B, D>,
) -> Result<Tensor<B, 1>, Error> {
    let output_dims = output.dims();
    let target_dims = target.dims();
    if output_dims != target_dims {
        return Err(Error::Validation(
            format!("shape of the output ({output_dims:?})"),
            format!("equal to the shape of the target ({target_dims:?})"),
        ));
    }

    Ok((output - target).powf_scalar(2.0).mean())
}
