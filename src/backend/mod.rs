pub use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice},
    tensor::backend::{AutodiffBackend, Backend},
};

use burn::backend::{self as backends, autodiff};

pub type Autodiff<B> = autodiff::Autodiff<B>;
pub type NdArray = backends::NdArray;
pub type Wgpu = backends::Wgpu;
