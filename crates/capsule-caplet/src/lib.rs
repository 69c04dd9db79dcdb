//! The caplet chain: an ordered pipeline of manifest-attribute and
//! command-building transformers, applied between manifest validation
//! and command construction.

pub mod builtin;
pub mod caplet;
pub mod chain;
pub mod view;

pub use builtin::{CapletBuiltin, IdentityCaplet, LogCaplet};
pub use caplet::Caplet;
pub use chain::CapletChain;
pub use view::{CapletView, ManifestView};
