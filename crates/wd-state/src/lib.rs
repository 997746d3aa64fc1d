//! wd-state: Timeline data model for WaveDesk
//!
//! Projects own tracks and segments; segments point at tracks by id. Every
//! mutator keeps the model valid (one master track, bounded audio tracks,
//! minimum segment width, sorted automation) and treats unknown ids as a
//! no-op rather than an error.

mod automation;
mod effects;
mod error;
mod handle;
mod project;
mod segment;
mod store;
mod track;
mod viewport;

pub use automation::*;
pub use effects::*;
pub use error::*;
pub use handle::*;
pub use project::*;
pub use segment::*;
pub use store::*;
pub use track::*;
pub use viewport::*;
