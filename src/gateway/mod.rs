//! Gateway module - orchestration of the external inference oracles

pub mod inference;

pub use inference::{InferenceDefaults, InferenceGateway, InpaintOptions};
