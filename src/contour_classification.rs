// src/contour_classification.rs
//
// Turns binary edge maps into classified marker detections:
//
//   contours → polygon approximation → area/convexity filter
//            → vertex-count shape class → centroid hue confirmation
//
// A triangle only counts as the red fighter's marker if the hue around its
// centroid sits in the red band (wrapping 0°); a square only counts as the
// blue fighter's marker inside the blue band. Everything else is discarded.
// Results from all detection channels land in one DetectionSet, so at most
// one marker per class survives a frame (last writer wins).

use crate::types::{
    ClassifiedMarker, ClassifyConfig, DetectionChannel, DetectionConfig, DetectionSet, ShapeClass,
};
use image::{GrayImage, RgbImage};
use imageproc::contours::find_contours;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use tracing::{debug, trace};

pub struct ContourClassifier {
    detection: DetectionConfig,
    classify: ClassifyConfig,
}

impl ContourClassifier {
    pub fn new(detection: DetectionConfig, classify: ClassifyConfig) -> Self {
        Self {
            detection,
            classify,
        }
    }

    /// Run classification over every channel's edge map, unioning per-class
    /// results into a single DetectionSet.
    pub fn classify_channels(
        &self,
        frame: &RgbImage,
        edge_maps: &[(DetectionChannel, GrayImage)],
    ) -> DetectionSet {
        let mut detections = DetectionSet::new();
        for (channel, edges) in edge_maps {
            let before = detections.len();
            self.classify_map(frame, edges, &mut detections);
            trace!(
                channel = channel.as_str(),
                found = detections.len() - before,
                "channel classified"
            );
        }
        detections
    }

    /// Classify one edge map. The contour tree is kept but iterated flatly:
    /// holes are as likely to trace the marker as outer borders are.
    pub fn classify_map(&self, frame: &RgbImage, edges: &GrayImage, out: &mut DetectionSet) {
        let contours = find_contours::<i32>(edges);

        for contour in &contours {
            if contour.points.len() < 3 {
                continue;
            }

            let epsilon = self.detection.approx_epsilon_frac * arc_length(&contour.points, true);
            let polygon = approximate_polygon_dp(&contour.points, epsilon, true);

            let area = polygon_area(&polygon).abs();
            if area < self.detection.min_area {
                continue;
            }
            if !is_convex(&polygon) {
                continue;
            }

            let class = match polygon.len() {
                3 => ShapeClass::Triangle,
                4 => ShapeClass::Square,
                _ => continue,
            };

            // Degenerate curves have no centroid; drop them without
            // aborting the frame.
            let Some(centroid) = polygon_centroid(&polygon) else {
                continue;
            };

            let radius =
                (min_vertex_distance_to(&polygon, centroid) / self.classify.sample_radius_divisor)
                    .max(1.0) as i32;
            let hue = average_hue(frame, centroid, radius);

            let confirmed = match class {
                ShapeClass::Triangle => {
                    hue < self.classify.red_hue_below || hue > self.classify.red_hue_above
                }
                ShapeClass::Square => {
                    hue > self.classify.blue_hue_min && hue < self.classify.blue_hue_max
                }
            };
            if !confirmed {
                debug!(
                    "rejected {:?} candidate at ({}, {}): hue {:.1} out of band",
                    class, centroid.x, centroid.y, hue
                );
                continue;
            }

            out.insert(ClassifiedMarker {
                class,
                centroid,
                polygon,
            });
        }
    }
}

// ============================================================================
// POLYGON GEOMETRY
// ============================================================================

/// Signed shoelace area.
pub fn polygon_area(polygon: &[Point<i32>]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, a) in polygon.iter().enumerate() {
        let b = &polygon[(i + 1) % polygon.len()];
        sum += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    sum / 2.0
}

/// Area-moment centroid. None when the polygon degenerates to zero area.
pub fn polygon_centroid(polygon: &[Point<i32>]) -> Option<Point<i32>> {
    let area = polygon_area(polygon);
    if area.abs() < 1e-9 {
        return None;
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (i, a) in polygon.iter().enumerate() {
        let b = &polygon[(i + 1) % polygon.len()];
        let cross = a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
        cx += (a.x + b.x) as f64 * cross;
        cy += (a.y + b.y) as f64 * cross;
    }
    cx /= 6.0 * area;
    cy /= 6.0 * area;
    Some(Point::new(cx.round() as i32, cy.round() as i32))
}

/// All cross products of consecutive edges must share a sign (zeros allowed).
pub fn is_convex(polygon: &[Point<i32>]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0i64;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let c = polygon[(i + 2) % n];
        let cross = (b.x - a.x) as i64 * (c.y - b.y) as i64
            - (b.y - a.y) as i64 * (c.x - b.x) as i64;
        if cross != 0 {
            if sign == 0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
    }
    true
}

fn min_vertex_distance_to(polygon: &[Point<i32>], centroid: Point<i32>) -> f32 {
    polygon
        .iter()
        .map(|p| {
            let dx = (p.x - centroid.x) as f32;
            let dy = (p.y - centroid.y) as f32;
            (dx * dx + dy * dy).sqrt()
        })
        .fold(f32::INFINITY, f32::min)
}

// ============================================================================
// HUE SAMPLING
// ============================================================================

/// Convert RGB to hue in degrees (0–360). Saturation/value are not needed
/// for band confirmation.
pub fn rgb_hue(r: u8, g: u8, b: u8) -> f32 {
    let r_n = r as f32 / 255.0;
    let g_n = g as f32 / 255.0;
    let b_n = b as f32 / 255.0;

    let max = r_n.max(g_n).max(b_n);
    let min = r_n.min(g_n).min(b_n);
    let delta = max - min;

    let h = if delta < 1e-6 {
        0.0
    } else if (max - r_n).abs() < 1e-6 {
        60.0 * (((g_n - b_n) / delta) % 6.0)
    } else if (max - g_n).abs() < 1e-6 {
        60.0 * (((b_n - r_n) / delta) + 2.0)
    } else {
        60.0 * (((r_n - g_n) / delta) + 4.0)
    };
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

/// Mean hue over a square neighborhood around `center`, clamped to the
/// frame bounds.
pub fn average_hue(frame: &RgbImage, center: Point<i32>, radius: i32) -> f32 {
    let (w, h) = (frame.width() as i32, frame.height() as i32);
    let x0 = (center.x - radius).clamp(0, w - 1);
    let x1 = (center.x + radius).clamp(0, w - 1);
    let y0 = (center.y - radius).clamp(0, h - 1);
    let y1 = (center.y + radius).clamp(0, h - 1);

    let mut sum = 0.0;
    let mut count = 0u32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = frame.get_pixel(x as u32, y as u32).0;
            sum += rgb_hue(p[0], p[1], p[2]);
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}
