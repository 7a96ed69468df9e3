// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for data model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when a plan or mesh value breaks its invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid mesh buffer: {0}")]
    InvalidMesh(String),

    #[error("Unknown level #{0}")]
    UnknownLevel(usize),
}
