// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
///
/// Degenerate contours are not errors: generators skip them and still build the rest
/// of the mesh. A generator asked for an object the home does not hold returns
/// [`Error::UnknownIndex`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("No {kind} at index {index}")]
    UnknownIndex { kind: &'static str, index: usize },

    #[error("Data model error: {0}")]
    CoreError(#[from] plan3d_core::Error),
}
