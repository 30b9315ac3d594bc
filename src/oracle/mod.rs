//! Oracle module - traits and HTTP clients for the external models

pub mod http_inpainting;
pub mod http_segmentation;
pub mod traits;

pub use http_inpainting::HttpInpaintingOracle;
pub use http_segmentation::HttpSegmentationOracle;
pub use traits::{InpaintRequest, InpaintingOracle, SegmentationMap, SegmentationOracle};
