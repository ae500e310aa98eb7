// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # testscope
//!
//! A zero-copy reader for the managed-metadata section of .NET PE/COFF images,
//! paired with a streaming identifier generator that derives stable 128-bit test
//! identities from name fragments.
//!
//! ## Overview
//!
//! `testscope` answers two questions a test-discovery host has to ask about every
//! candidate assembly:
//!
//! 1. **Where is the metadata?** The [`crate::file`] module walks the MS-DOS stub,
//!    COFF header, optional PE header, section table and CLI/COR header with strict
//!    bounds checking and returns the absolute offset and size of the embedded
//!    ECMA-335 metadata blob. Plain COFF object files (which carry their metadata
//!    in a `.cormeta` section instead of a data directory) and already-loaded
//!    in-memory images are handled as well.
//!
//! 2. **Which symbols are tests?** The [`crate::metadata`] module reads just enough
//!    of the metadata tables (`TypeDef`, `MethodDef`, `GenericParam`, the `#Strings`
//!    and `#Blob` heaps) for the [`crate::discovery`] module to classify public,
//!    parameterless, void-returning methods on public non-nested classes whose
//!    name ends in `Tests`. For every match, [`crate::identity`] produces a
//!    deterministic identifier from the executor URI, source path and the
//!    namespace-qualified method name.
//!
//! All parsing operates on a caller-supplied byte buffer, never copies section
//! payloads, performs no I/O beyond the initial file mapping, and is safe to run
//! on many images concurrently with separate instances.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use testscope::{discovery::Discoverer, file::Image};
//! use std::path::Path;
//!
//! fn main() -> testscope::Result<()> {
//!     let image = Image::from_file(Path::new("MyProject.Tests.dll"))?;
//!
//!     let discoverer = Discoverer::new("executor://testscope/v1");
//!     for case in discoverer.discover(&image, "MyProject.Tests.dll")? {
//!         println!("{} -> {}", case.fully_qualified_name(), case.id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Safety and determinism
//!
//! The identifier hash is a faithful reimplementation of a historical SHA-1 based
//! scheme. It is **not** a security primitive; it exists solely so that the same
//! test in the same assembly always maps to the same identifier across discovery
//! runs. See [`crate::identity`] for the exact contract.

#[macro_use]
pub(crate) mod error;

pub mod discovery;
pub mod file;
pub mod identity;
pub mod metadata;

pub use error::Error;

/// Convenience `Result` type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
