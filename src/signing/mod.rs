//! Authenticode signing through an external signing utility
//!
//! - `locate` - Ranked discovery of the signing tool on the host
//! - `signtool` - Invocation of the tool against a built executable

pub mod locate;
pub mod signtool;

pub use locate::{FileProbe, KnownPaths, RealFs, SearchPath, ToolLocator, ToolResolver};
pub use signtool::{sign, sign_args};
