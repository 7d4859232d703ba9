//! Distance-based level of detail: threshold ladder, per-chunk LOD swaps, and alpha fade.

mod fade;
mod selector;

pub use fade::LodFade;
pub use selector::{LodChange, LodSelector, LodThresholds, planar_distance};
