//! Metadata information regarding the layer being served.

pub mod layer;
pub mod spatial_reference;

// re-export without modules
pub use layer::*;
pub use spatial_reference::*;
