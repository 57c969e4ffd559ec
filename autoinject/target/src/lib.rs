//! Identity of a scrape target as seen by the target allocator.
//!
//! Two [`TargetItem`]s with the same job, URL and labels always produce the same
//! [`TargetItem::hash`], no matter in which order the labels were inserted.

pub mod item;
pub mod labels;

pub use item::{LinkJson, TargetItem};
pub use labels::{Fingerprint, LabelSet};
