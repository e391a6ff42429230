//! Core data models for the F1 data lake.

mod driver;
mod ids;
mod race;
mod result;
mod standing;

pub use driver::*;
pub use ids::*;
pub use race::*;
pub use result::*;
pub use standing::*;
