// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch rebuilds with parallel mesh generation.
//!
//! Producers run on the rayon pool; their results are then handed to the sink one
//! object at a time, in producer order. An object is replaced only once all of its
//! shapes are built, so a sink never sees half an object.

use crate::codec::ObjWriter;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::producer::{MeshProducer, ShapePart};
use plan3d_core::Home;
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;
use tracing::{info, info_span, warn};

/// Receiver of rebuilt objects, typically a retained scene graph
pub trait MeshSink {
    /// Swap every shape of `object` for `parts`
    fn replace(&mut self, object: &MeshProducer, parts: Vec<ShapePart>);
}

/// Sink keeping the shapes of each object in memory
#[derive(Debug, Default, Clone)]
pub struct SceneBuffer {
    objects: Vec<(MeshProducer, Vec<ShapePart>)>,
}

impl SceneBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shapes last given for `object`
    pub fn get(&self, object: &MeshProducer) -> Option<&[ShapePart]> {
        self.objects
            .iter()
            .find(|(producer, _)| producer == object)
            .map(|(_, parts)| parts.as_slice())
    }

    pub fn objects(&self) -> impl Iterator<Item = (&MeshProducer, &[ShapePart])> {
        self.objects.iter().map(|(producer, parts)| (producer, parts.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl MeshSink for SceneBuffer {
    fn replace(&mut self, object: &MeshProducer, parts: Vec<ShapePart>) {
        match self.objects.iter_mut().find(|(producer, _)| producer == object) {
            Some((_, existing)) => *existing = parts,
            None => self.objects.push((object.clone(), parts)),
        }
    }
}

/// Statistics of one batch rebuild
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RebuildStats {
    /// Objects handed to the sink
    pub rebuilt: usize,
    /// Objects left untouched because their rebuild failed
    pub failed: usize,
    pub parts: usize,
    pub vertices: usize,
    pub triangles: usize,
}

/// Rebuild `producers` from `home` and hand each result to `sink`
///
/// A failed producer is logged and skipped: the sink keeps its previous shapes.
pub fn rebuild(
    home: &Home,
    producers: &[MeshProducer],
    config: &PipelineConfig,
    sink: &mut dyn MeshSink,
) -> RebuildStats {
    let span = info_span!("rebuild", producers = producers.len(), parallel = config.parallel);
    let _guard = span.enter();

    let build = |producer: &MeshProducer| producer.rebuild(home, &config.geometry);
    let results: Vec<Result<Vec<ShapePart>>> = if config.parallel {
        producers.par_iter().map(build).collect()
    } else {
        producers.iter().map(build).collect()
    };

    let mut stats = RebuildStats::default();
    for (producer, result) in producers.iter().zip(results) {
        match result {
            Ok(parts) => {
                stats.rebuilt += 1;
                stats.parts += parts.len();
                stats.vertices += parts.iter().map(|p| p.mesh.vertex_count()).sum::<usize>();
                stats.triangles += parts.iter().map(|p| p.mesh.triangle_count()).sum::<usize>();
                sink.replace(producer, parts);
            }
            Err(error) => {
                stats.failed += 1;
                warn!(object = %producer.name(), error = %error, "rebuild failed");
            }
        }
    }

    info!(
        rebuilt = stats.rebuilt,
        failed = stats.failed,
        parts = stats.parts,
        triangles = stats.triangles,
        "rebuild complete"
    );
    stats
}

/// Rebuild every object of `home`
pub fn rebuild_home(home: &Home, config: &PipelineConfig, sink: &mut dyn MeshSink) -> RebuildStats {
    rebuild(home, &MeshProducer::all(home), config, sink)
}

/// Write every object of `scene` in producer order, one OBJ node per object
pub fn export_obj<W: Write>(scene: &SceneBuffer, writer: &mut ObjWriter<W>) -> Result<()> {
    for (object, parts) in scene.objects() {
        writer.write_node(&object.name(), parts)?;
    }
    Ok(())
}

/// Read a home plan serialized as JSON
pub fn parse_home(json: &str) -> Result<Home> {
    let home: Home = serde_json::from_str(json)?;
    home.validate().map_err(plan3d_geometry::Error::from)?;
    Ok(home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan3d_core::{Point2, Room, Wall};

    fn sample_home() -> Home {
        let mut home = Home::new();
        home.walls.push(Wall::new(0.0, 0.0, 400.0, 0.0, 10.0));
        home.walls.push(Wall::new(400.0, 0.0, 400.0, 300.0, 10.0));
        home.rooms.push(Room::new(
            "hall",
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(400.0, 0.0),
                Point2::new(400.0, 300.0),
                Point2::new(0.0, 300.0),
            ],
        ));
        home
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let home = sample_home();
        let mut parallel = SceneBuffer::new();
        let mut sequential = SceneBuffer::new();
        let config = PipelineConfig::default();
        let stats = rebuild_home(&home, &config, &mut parallel);
        let sequential_config = PipelineConfig {
            parallel: false,
            ..PipelineConfig::default()
        };
        let sequential_stats = rebuild_home(&home, &sequential_config, &mut sequential);

        assert_eq!(stats, sequential_stats);
        assert_eq!(stats.rebuilt, 4);
        assert_eq!(stats.failed, 0);
        for ((a, parts_a), (b, parts_b)) in parallel.objects().zip(sequential.objects()) {
            assert_eq!(a, b);
            assert_eq!(parts_a, parts_b);
        }
    }

    #[test]
    fn test_replace_swaps_previous_shapes() {
        let mut home = sample_home();
        let mut scene = SceneBuffer::new();
        let config = PipelineConfig::default();
        rebuild_home(&home, &config, &mut scene);
        let before = scene.get(&MeshProducer::Wall(0)).map(|p| p.to_vec()).unwrap();

        home.walls[0].height = Some(100.0);
        rebuild(&home, &[MeshProducer::Wall(0)], &config, &mut scene);
        let after = scene.get(&MeshProducer::Wall(0)).unwrap();
        assert_eq!(scene.len(), 4);
        assert_ne!(before.as_slice(), after);
    }

    #[test]
    fn test_failed_producer_keeps_previous_shapes() {
        let home = sample_home();
        let mut scene = SceneBuffer::new();
        let config = PipelineConfig::default();
        let stats = rebuild(&home, &[MeshProducer::Wall(7)], &config, &mut scene);
        assert_eq!(stats.failed, 1);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_export_obj_names_groups_after_objects() {
        let home = sample_home();
        let config = PipelineConfig::default();
        let mut scene = SceneBuffer::new();
        rebuild_home(&home, &config, &mut scene);

        let mut writer = ObjWriter::new(Vec::new(), None)
            .unwrap()
            .fraction_digits(config.obj_fraction_digits);
        export_obj(&scene, &mut writer).unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(text.contains("g wall_0_left_"));
        assert!(text.contains("g wall_1_right_"));
        assert!(text.contains("g room_0_floor_"));
        assert!(text.lines().any(|l| l.starts_with("f ")));
    }
}
