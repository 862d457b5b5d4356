/// Multi-scale sliding-window face localizer driven by a Haar cascade.
///
/// The grayscale image is scanned at a pyramid of scales with the
/// cascade's native window; raw hits are clustered and weak clusters
/// discarded before the largest surviving face is selected.
use std::path::Path;

use image::imageops::FilterType;
use image::GrayImage;

use crate::detection::domain::detector_params::DetectorParams;
use crate::detection::domain::face_localizer::FaceLocalizer;
use crate::detection::infrastructure::haar_cascade::{CascadeError, HaarCascade};
use crate::detection::infrastructure::math::{self, IntegralImage};
use crate::shared::constants::GROUPING_EPS;
use crate::shared::decoded_image::DecodedImage;
use crate::shared::face_box::FaceBox;

pub struct HaarFaceLocalizer {
    cascade: HaarCascade,
    params: DetectorParams,
}

impl HaarFaceLocalizer {
    pub fn new(cascade: HaarCascade, params: DetectorParams) -> Self {
        Self { cascade, params }
    }

    pub fn from_file(cascade_path: &Path, params: DetectorParams) -> Result<Self, CascadeError> {
        let cascade = HaarCascade::from_file(cascade_path)?;
        log::info!(
            "Loaded Haar cascade {} ({} stages, {}x{} window)",
            cascade_path.display(),
            cascade.stage_count(),
            cascade.window_size().0,
            cascade.window_size().1
        );
        Ok(Self::new(cascade, params))
    }

    /// Every window the cascade accepts, in original image coordinates.
    fn raw_hits(&self, gray: &GrayImage) -> Vec<FaceBox> {
        let (img_w, img_h) = (gray.width() as f64, gray.height() as f64);
        let (win_w, win_h) = self.cascade.window_size();
        let min_size = self.params.min_face_size as f64;
        let mut hits = Vec::new();

        let mut factor = 1.0f64;
        loop {
            let scaled_w = (img_w / factor).round() as usize;
            let scaled_h = (img_h / factor).round() as usize;
            if scaled_w < win_w || scaled_h < win_h {
                break;
            }
            let box_w = (win_w as f64 * factor).round();
            let box_h = (win_h as f64 * factor).round();
            if box_w > img_w || box_h > img_h {
                break;
            }
            if box_w >= min_size && box_h >= min_size {
                let integral = if factor == 1.0 {
                    IntegralImage::new(gray)
                } else {
                    IntegralImage::new(&image::imageops::resize(
                        gray,
                        scaled_w as u32,
                        scaled_h as u32,
                        FilterType::Triangle,
                    ))
                };
                let step = if factor > 2.0 { 1 } else { 2 };

                for y in (0..=scaled_h - win_h).step_by(step) {
                    for x in (0..=scaled_w - win_w).step_by(step) {
                        if self.cascade.accepts(&integral, x, y) {
                            hits.push(FaceBox::new(
                                (x as f64 * factor).round() as i32,
                                (y as f64 * factor).round() as i32,
                                box_w as i32,
                                box_h as i32,
                            ));
                        }
                    }
                }
            }
            factor *= self.params.scale_factor;
        }

        hits
    }
}

impl FaceLocalizer for HaarFaceLocalizer {
    fn detect(&self, image: &DecodedImage) -> Vec<FaceBox> {
        let hits = self.raw_hits(image.grayscale());
        let faces = group_hits(&hits, self.params.min_neighbors, GROUPING_EPS);
        log::debug!(
            "Haar scan: {} raw hits, {} faces after grouping",
            hits.len(),
            faces.len()
        );
        faces
    }
}

/// Cluster overlapping detector hits into faces.
///
/// Similar hits are merged into their average box; clusters with
/// `min_neighbors` or fewer members are dropped, as is any cluster lying
/// inside a stronger one. `min_neighbors == 0` returns the hits untouched.
/// Output order follows the first hit of each cluster.
pub fn group_hits(hits: &[FaceBox], min_neighbors: u32, eps: f64) -> Vec<FaceBox> {
    if min_neighbors == 0 {
        return hits.to_vec();
    }
    let threshold = min_neighbors as usize;

    let (labels, classes) = math::partition(hits, |a, b| a.is_similar(b, eps));

    let mut sums = vec![[0i64; 4]; classes];
    let mut counts = vec![0usize; classes];
    for (hit, &label) in hits.iter().zip(&labels) {
        let s = &mut sums[label];
        s[0] += hit.x as i64;
        s[1] += hit.y as i64;
        s[2] += hit.width as i64;
        s[3] += hit.height as i64;
        counts[label] += 1;
    }

    let averaged: Vec<FaceBox> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &n)| {
            let avg = |v: i64| (v as f64 / n as f64).round() as i32;
            FaceBox::new(avg(s[0]), avg(s[1]), avg(s[2]), avg(s[3]))
        })
        .collect();

    let mut faces = Vec::new();
    for (i, face) in averaged.iter().enumerate() {
        let n1 = counts[i];
        if n1 <= threshold {
            continue;
        }
        let swallowed = averaged.iter().enumerate().any(|(j, other)| {
            let n2 = counts[j];
            j != i
                && n2 > threshold
                && face.is_inside(other, eps)
                && (n2 > n1.max(3) || n1 < 3)
        });
        if !swallowed {
            faces.push(*face);
        }
    }
    faces
}
