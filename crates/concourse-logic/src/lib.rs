//! Pure navigation logic for Concourse.
//!
//! This crate contains the spatial primitives and precompute algorithms that
//! are independent of any engine or runtime. Functions take plain data and
//! return results, making them unit-testable and portable.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`grid`] | Cell coordinates and the flat bounds-checked grid arena |
//! | [`cost`] | Combined cost surface (passability) built from raster layers |
//! | [`gradient`] | Multi-source steps-to-exit field builder |
//! | [`sight`] | Discretized line-of-sight obstruction checks |
//! | [`speed`] | Density-to-walking-speed model and unit conversions |
//! | [`neighborhood`] | Square / Manhattan / disc neighborhood enumeration |

pub mod cost;
pub mod gradient;
pub mod grid;
pub mod neighborhood;
pub mod sight;
pub mod speed;
