// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model interchange: format probes, readers and the OBJ writer
//!
//! Loading walks an ordered list of [`FormatProbe`]s and keeps the first model one of
//! them accepts. A probe that cannot read the bytes returns a [`ProbeRejection`]
//! instead of failing, so that the next one gets its chance.

mod max3ds_reader;
mod obj_reader;
mod obj_writer;

pub use max3ds_reader::{parse_3ds, Max3dsProbe};
pub use obj_reader::{parse_obj, ObjProbe};
pub use obj_writer::{format_number, sanitize_name, ObjWriter};

use crate::error::{Error, Result};
use plan3d_core::MeshBuffer;
use rustc_hash::{FxHashMap, FxHasher};
use std::fmt;
use std::hash::Hasher;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// One mesh of a loaded model with the material it uses
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedGroup {
    pub name: String,
    pub material: Option<String>,
    pub mesh: MeshBuffer,
}

/// A model read by one of the format probes
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    /// Name of the probe that read it
    pub format: &'static str,
    pub groups: Vec<LoadedGroup>,
}

impl LoadedModel {
    pub fn vertex_count(&self) -> usize {
        self.groups.iter().map(|g| g.mesh.vertex_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.mesh.triangle_count()).sum()
    }

    /// Every group merged in one indexed mesh, as used for piece placement
    pub fn merged_mesh(&self) -> MeshBuffer {
        let mut mesh = MeshBuffer::new();
        for group in &self.groups {
            mesh.merge(&group.mesh);
        }
        mesh
    }
}

/// Why a probe refused some bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRejection {
    pub probe: &'static str,
    pub reason: String,
}

impl ProbeRejection {
    pub fn new(probe: &'static str, reason: impl Into<String>) -> Self {
        Self {
            probe,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ProbeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.probe, self.reason)
    }
}

/// A reader recognizing one model format
pub trait FormatProbe: Send + Sync {
    fn name(&self) -> &'static str;

    /// Read `bytes`, or explain why they are not in this format
    fn try_load(&self, bytes: &[u8]) -> std::result::Result<LoadedModel, ProbeRejection>;
}

/// Probes tried by default: binary 3DS first, then OBJ text
pub fn default_probes() -> Vec<Box<dyn FormatProbe>> {
    vec![Box::new(Max3dsProbe), Box::new(ObjProbe)]
}

/// Load a model with the first probe accepting `bytes`
pub fn load_model(bytes: &[u8], probes: &[Box<dyn FormatProbe>]) -> Result<LoadedModel> {
    let mut rejections = Vec::with_capacity(probes.len());
    for probe in probes {
        match probe.try_load(bytes) {
            Ok(model) => {
                debug!(
                    format = probe.name(),
                    groups = model.groups.len(),
                    vertices = model.vertex_count(),
                    "loaded model"
                );
                return Ok(model);
            }
            Err(rejection) => {
                debug!(probe = rejection.probe, reason = %rejection.reason, "probe rejected model");
                rejections.push(rejection);
            }
        }
    }
    Err(Error::Probe(rejections))
}

/// Models already loaded, keyed by the hash of their bytes
///
/// The cache is an explicit handle: callers decide its lifetime and share it between
/// threads through a reference.
#[derive(Debug, Default)]
pub struct ModelCache {
    models: Mutex<FxHashMap<(u64, usize), Arc<LoadedModel>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash of some model bytes, used as cache key together with their length
    pub fn content_key(bytes: &[u8]) -> (u64, usize) {
        let mut hasher = FxHasher::default();
        hasher.write(bytes);
        (hasher.finish(), bytes.len())
    }

    /// Cached model for `bytes`, loading it on first request
    ///
    /// Failed loads are not cached.
    pub fn load(&self, bytes: &[u8], probes: &[Box<dyn FormatProbe>]) -> Result<Arc<LoadedModel>> {
        let key = Self::content_key(bytes);
        if let Some(model) = self.lock().get(&key) {
            return Ok(Arc::clone(model));
        }
        // Loading happens outside the lock; a concurrent load of the same bytes keeps
        // the first model stored
        let model = Arc::new(load_model(bytes, probes)?);
        Ok(Arc::clone(self.lock().entry(key).or_insert(model)))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FxHashMap<(u64, usize), Arc<LoadedModel>>> {
        // A panic while holding the lock cannot leave the map half updated
        self.models.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE_OBJ: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn test_load_model_picks_obj() {
        let model = load_model(TRIANGLE_OBJ.as_bytes(), &default_probes()).unwrap();
        assert_eq!(model.format, "OBJ");
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn test_load_model_reports_every_rejection() {
        let error = load_model(&[0xFF, 0x00, 0x13], &default_probes()).unwrap_err();
        match error {
            Error::Probe(rejections) => {
                assert_eq!(rejections.len(), 2);
                assert_eq!(rejections[0].probe, "3DS");
                assert_eq!(rejections[1].probe, "OBJ");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_cache_shares_models() {
        let cache = ModelCache::new();
        let probes = default_probes();
        let a = cache.load(TRIANGLE_OBJ.as_bytes(), &probes).unwrap();
        let b = cache.load(TRIANGLE_OBJ.as_bytes(), &probes).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        assert!(cache.load(b"not a model", &probes).is_err());
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
