// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for producers, the rebuild pipeline and the interchange codecs.

use crate::codec::ProbeRejection;
use thiserror::Error;

/// Result type for processing operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Every format probe refused the model
    #[error("Unsupported model format: {}", describe_rejections(.0))]
    Probe(Vec<ProbeRejection>),

    #[error("{format} parse error at {position}: {message}")]
    Parse {
        format: &'static str,
        /// Line number for text formats, byte offset for binary ones
        position: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Geometry error: {0}")]
    Geometry(#[from] plan3d_geometry::Error),
}

impl Error {
    pub fn parse(format: &'static str, position: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            format,
            position,
            message: message.into(),
        }
    }
}

fn describe_rejections(rejections: &[ProbeRejection]) -> String {
    if rejections.is_empty() {
        return "no probe registered".to_string();
    }
    rejections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
