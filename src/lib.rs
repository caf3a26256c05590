pub mod config;
pub mod errors;
pub mod mockd3d12;
pub mod niced3d12;
pub mod render;
pub mod typeyd3d12;
#[cfg(windows)]
pub mod windowsd3d12;

pub use config::SRenderConfig;
pub use errors::{EError, Result};
pub use render::{SRender, SRenderFrame};
