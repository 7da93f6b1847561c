// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! Shared primitives for the vspace crates: the crate-wide error type and a
//! few small utilities that do not belong to any single layer of the stack
//! (paths, schema derivation, manifest bookkeeping, or the dataset-facing
//! `Space` API).

pub mod error;

pub use error::{Error, Result};
