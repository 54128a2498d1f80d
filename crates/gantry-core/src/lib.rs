//! Core domain types for the Gantry CI build-queue admission core.
//!
//! This crate contains:
//! - Resource identifiers and common types
//! - Pending builds awaiting dispatch
//! - Namespace hierarchy and root resolution
//! - CI-minutes quotas, cost factors and additional packs
//! - Runner scope classification

pub mod build;
pub mod error;
pub mod id;
pub mod namespace;
pub mod quota;
pub mod runner;
pub mod visibility;

pub use build::PendingBuild;
pub use error::{Error, Result};
pub use id::ResourceId;
pub use namespace::{Namespace, NamespaceIndex, RootLookup};
pub use quota::{AdditionalPack, CostFactor, MinutesQuota};
pub use runner::{Runner, RunnerScope};
pub use visibility::Visibility;
