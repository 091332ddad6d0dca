//! Request and decision types shared by the engine and its callers.

mod asset;
mod decision;

pub use asset::{AssetOptions, AssetRequest, AssetType};
pub use decision::{Decision, OriginalReason};
