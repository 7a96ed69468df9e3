// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Plan3D Processing
//!
//! Turns a home plan into the shapes of a 3D scene and moves models in and out of
//! interchange formats.
//!
//! - [`MeshProducer`]: one per object of the home, rebuilding all its shapes at once
//! - [`rebuild`]: runs producers on the rayon pool and hands results to a [`MeshSink`]
//! - [`codec`]: 3DS and OBJ readers behind [`FormatProbe`]s, a [`ModelCache`] and the
//!   [`ObjWriter`]
//!
//! ```rust,ignore
//! use plan3d_processing::{parse_home, rebuild_home, PipelineConfig, SceneBuffer};
//!
//! let home = parse_home(&std::fs::read_to_string("home.json")?)?;
//! let mut scene = SceneBuffer::new();
//! let stats = rebuild_home(&home, &PipelineConfig::from_env(), &mut scene);
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod producer;

pub use codec::{
    default_probes, load_model, parse_3ds, parse_obj, FormatProbe, LoadedGroup, LoadedModel,
    ModelCache, ObjWriter, ProbeRejection,
};
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use pipeline::{
    export_obj, parse_home, rebuild, rebuild_home, MeshSink, RebuildStats, SceneBuffer,
};
pub use producer::{MeshProducer, ShapePart};
