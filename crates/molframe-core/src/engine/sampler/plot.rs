//! Maps samples onto the in-scene energy plot, a 0.8 x 0.8 panel centered on
//! its own origin and drawn just in front of its surface.

use super::buffer::SampleBuffer;
use crate::core::models::sample::EnergySample;
use nalgebra::Point3;

pub const PLOT_SPAN: f64 = 0.8;
pub const PLOT_HALF_SPAN: f64 = 0.4;
/// Display energy range covered by the plot's height.
pub const PLOT_ENERGY_RANGE: f64 = 25.0;
/// Offset towards the viewer so markers are not hidden by the panel.
pub const PLOT_DEPTH: f64 = 0.002;
/// Number of line slots along the x axis.
pub const PLOT_LINE_SLOTS: usize = 150;

#[inline]
fn energy_to_y(energy: f64) -> f64 {
    energy / PLOT_ENERGY_RANGE * PLOT_SPAN - PLOT_HALF_SPAN
}

/// Position of a scatter marker for a (dihedral, energy) pair.
pub fn marker_position(dihedral_degrees: f64, energy: f64) -> Point3<f64> {
    Point3::new(
        (dihedral_degrees + 180.0) / 360.0 * PLOT_SPAN - PLOT_HALF_SPAN,
        energy_to_y(energy),
        PLOT_DEPTH,
    )
}

/// Position of the `index`-th point of the energy-over-time line.
pub fn line_point(index: usize, energy: f64) -> Point3<f64> {
    Point3::new(
        index as f64 / PLOT_LINE_SLOTS as f64 * PLOT_SPAN - PLOT_HALF_SPAN,
        energy_to_y(energy),
        PLOT_DEPTH,
    )
}

/// Everything needed to redraw the plot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotFrame {
    /// One marker per buffered sample, oldest first.
    pub markers: Vec<Point3<f64>>,
    pub line: Vec<Point3<f64>>,
}

impl PlotFrame {
    pub fn from_buffer(buffer: &SampleBuffer) -> Self {
        Self::from_samples(buffer.iter())
    }

    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a EnergySample>) -> Self {
        let mut frame = Self::default();
        for (index, sample) in samples.into_iter().enumerate() {
            frame
                .markers
                .push(marker_position(sample.dihedral_degrees, sample.energy));
            frame.line.push(line_point(index, sample.energy));
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn marker_spans_the_plot() {
        let left = marker_position(-180.0, 0.0);
        let right = marker_position(180.0, 25.0);
        assert!(f64_approx_equal(left.x, -0.4));
        assert!(f64_approx_equal(left.y, -0.4));
        assert!(f64_approx_equal(right.x, 0.4));
        assert!(f64_approx_equal(right.y, 0.4));
        assert_eq!(left.z, 0.002);
    }

    #[test]
    fn marker_for_zero_dihedral_is_centered_horizontally() {
        let marker = marker_position(0.0, 12.5);
        assert!(f64_approx_equal(marker.x, 0.0));
        assert!(f64_approx_equal(marker.y, 0.0));
    }

    #[test]
    fn line_points_advance_by_slot() {
        assert!(f64_approx_equal(line_point(0, 0.0).x, -0.4));
        assert!(f64_approx_equal(line_point(75, 0.0).x, 0.0));
        assert!(f64_approx_equal(line_point(150, 0.0).x, 0.4));
    }

    #[test]
    fn frame_has_one_marker_and_line_point_per_sample() {
        let mut buffer = SampleBuffer::new(3);
        for i in 0..5 {
            buffer.push(EnergySample::new(i, 0.0, i as f64 * 10.0, 0.0));
        }
        let frame = PlotFrame::from_buffer(&buffer);
        assert_eq!(frame.markers.len(), 3);
        assert_eq!(frame.line.len(), 3);
        assert!(f64_approx_equal(frame.markers[0].x, marker_position(20.0, 0.0).x));
        assert!(f64_approx_equal(frame.line[2].x, line_point(2, 0.0).x));
    }
}
