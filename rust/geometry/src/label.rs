// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Labels shown in 3D as a textured rectangle
//!
//! The rectangle has the measured size of the text, its base line centered on the
//! label point. It lies flat on the floor for a zero pitch and stands up for a pitch
//! of a quarter turn.

use crate::builder::MeshGeometryBuilder;
use nalgebra::{Point3, Rotation3, Vector3};
use plan3d_core::{Home, Label, MeshBuffer};

/// Build the quad of the label at `index`, `None` for labels kept in the plan
pub fn generate_label(home: &Home, index: usize) -> Option<MeshBuffer> {
    let label = home.labels.get(index)?;
    if !home.is_viewable(label.level) {
        return None;
    }
    label_quad(home, label)
}

fn label_quad(home: &Home, label: &Label) -> Option<MeshBuffer> {
    let pitch = label.pitch?;
    if label.text_width <= 0.0 || label.text_height <= 0.0 {
        return None;
    }

    let half = label.text_width / 2.0;
    let height = label.text_height;
    let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), -label.angle)
        * Rotation3::from_axis_angle(&Vector3::x_axis(), pitch);
    let origin = Vector3::new(
        label.x,
        home.ground_elevation(label.level, label.elevation),
        label.y,
    );
    let place = |x: f64, z: f64| rotation * Point3::new(x, 0.0, z) + origin;

    let mut builder = MeshGeometryBuilder::new(0.0);
    builder.add_quad(
        [
            place(-half, 0.0),
            place(half, 0.0),
            place(half, -height),
            place(-half, -height),
        ],
        Some([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
    );
    Some(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use plan3d_core::Level;

    #[test]
    fn test_flat_label_faces_up() {
        let mut home = Home::new();
        home.labels.push(Label::new("Kitchen", 100.0, 50.0, 40.0, 10.0).with_pitch(0.0));
        let mesh = generate_label(&home, 0).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        let (min, max) = mesh.bounds();
        assert_relative_eq!(min.x, 80.0, epsilon = 1e-4);
        assert_relative_eq!(max.x, 120.0, epsilon = 1e-4);
        assert_relative_eq!(min.z, 40.0, epsilon = 1e-4);
        assert_relative_eq!(max.z, 50.0, epsilon = 1e-4);
        assert!(mesh.normal(0).unwrap().y > 0.99);
    }

    #[test]
    fn test_pitched_label_stands_on_its_level() {
        let mut home = Home::new();
        let level = home.add_level(Level::new("upper", 300.0, 12.0, 250.0));
        let mut label = Label::new("Sign", 0.0, 0.0, 20.0, 10.0).with_pitch(std::f64::consts::FRAC_PI_2);
        label.level = Some(level);
        home.labels.push(label);
        let mesh = generate_label(&home, 0).unwrap();
        let (min, max) = mesh.bounds();
        assert_relative_eq!(min.y, 300.0, epsilon = 1e-3);
        assert_relative_eq!(max.y, 310.0, epsilon = 1e-3);
        assert_relative_eq!(max.z - min.z, 0.0, epsilon = 1e-3);
        // Text reads from the front, towards +z in the plan
        assert!(mesh.normal(0).unwrap().z > 0.99);
    }

    #[test]
    fn test_label_without_pitch_stays_in_plan() {
        let mut home = Home::new();
        home.labels.push(Label::new("Plan only", 0.0, 0.0, 20.0, 10.0));
        assert!(generate_label(&home, 0).is_none());
        assert!(generate_label(&home, 1).is_none());
    }
}
