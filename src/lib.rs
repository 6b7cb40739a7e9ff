#![allow(missing_docs)]

pub mod backend;
pub mod dataset;
pub mod error;
pub mod export;
pub mod render;
pub mod scene;
pub mod target;
pub mod train;
