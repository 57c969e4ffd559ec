//! This crate contains the pod mutation that preloads an auto-instrumentation agent into a
//! workload's containers.
//!
//! The entry point is [`mutator::PodMutator`], which is driven once per target container by the
//! admission webhook. Constants for a runtime live in a [`profile::RuntimeProfile`].

#![warn(clippy::indexing_slicing)]

pub mod descriptor;
pub mod env;
pub mod error;
pub mod guard;
pub mod mutator;
pub mod policy;
pub mod profile;
