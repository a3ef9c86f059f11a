//! Molecular descriptors for retention time models.
//!
//! Descriptors are computed by a [`DescriptorEngine`]. The bundled
//! [`ExternalEngine`] drives an external descriptor program; tests and
//! embedders can provide their own engine.

pub mod engine;
pub mod error;
pub mod external;
pub mod families;
pub mod row;

pub use engine::{DescriptorEngine, DescriptorFamily};
pub use error::{DescriptorError, Result};
pub use external::{ExternalEngine, ENGINE_ENV};
pub use families::format_families;
pub use row::TsvRow;
