//! Test fixtures for Sylva development.
//!
//! Synthetic kernels and libraries stand in for the precomputed light
//! influence patterns a real model loads from disk; seeded scatter
//! helpers produce reproducible tree and unit layouts.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    attenuation_kernel, reader_kernel, sample_library, scatter_trees, unit_origins, ScatteredTree,
    BEECH, SPRUCE,
};
