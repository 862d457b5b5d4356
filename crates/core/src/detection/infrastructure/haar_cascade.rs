//! Boosted Haar cascade in OpenCV's `opencv_storage/cascade` XML layout.
//!
//! Only upright HAAR features with BOOST stages are supported, which
//! covers the stock frontal-face cascades shipped with OpenCV.

use std::path::Path;
use std::str::FromStr;

use roxmltree::{Document, Node};
use thiserror::Error;

use crate::detection::infrastructure::math::IntegralImage;

/// Interior contrast a window needs before the stages are evaluated.
const MIN_WINDOW_STDDEV: f64 = 10.0;

/// Slack on stage thresholds, absorbing rounding in stored cascades.
const STAGE_THRESHOLD_EPS: f64 = 1e-5;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("failed to read cascade file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cascade is not valid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("malformed cascade: {0}")]
    Malformed(String),
    #[error("unsupported cascade: {0}")]
    Unsupported(String),
}

#[derive(Clone, Debug, PartialEq)]
struct WeightedRect {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    weight: f64,
}

#[derive(Clone, Debug, PartialEq)]
struct HaarFeature {
    rects: Vec<WeightedRect>,
}

/// Split node: `value < threshold` goes `left`, otherwise `right`.
/// Child indices `<= 0` name a leaf (`-index`).
#[derive(Clone, Debug, PartialEq)]
struct TreeNode {
    left: i32,
    right: i32,
    feature: usize,
    threshold: f64,
}

#[derive(Clone, Debug, PartialEq)]
struct WeakClassifier {
    nodes: Vec<TreeNode>,
    leaves: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
struct Stage {
    threshold: f64,
    classifiers: Vec<WeakClassifier>,
}

/// A trained cascade: every stage must accept a window for it to count
/// as a detection.
#[derive(Clone, Debug, PartialEq)]
pub struct HaarCascade {
    window_width: usize,
    window_height: usize,
    stages: Vec<Stage>,
    features: Vec<HaarFeature>,
}

impl HaarCascade {
    pub fn from_file(path: &Path) -> Result<Self, CascadeError> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }

    pub fn from_xml(xml: &str) -> Result<Self, CascadeError> {
        let doc = Document::parse(xml)?;
        let cascade = doc
            .root_element()
            .children()
            .find(|n| n.has_tag_name("cascade"))
            .ok_or_else(|| {
                CascadeError::Unsupported(
                    "missing <cascade> element (old-style cascades are not supported)".into(),
                )
            })?;

        let stage_type = text_of(cascade, "stageType")?;
        if stage_type != "BOOST" {
            return Err(CascadeError::Unsupported(format!("stage type {stage_type}")));
        }
        let feature_type = text_of(cascade, "featureType")?;
        if feature_type != "HAAR" {
            return Err(CascadeError::Unsupported(format!(
                "feature type {feature_type}"
            )));
        }

        let window_width: usize = parse_one(cascade, "width")?;
        let window_height: usize = parse_one(cascade, "height")?;
        if window_width < 3 || window_height < 3 {
            return Err(CascadeError::Malformed(format!(
                "window {window_width}x{window_height} is too small"
            )));
        }

        let stages = items(child(cascade, "stages")?)
            .map(parse_stage)
            .collect::<Result<Vec<_>, _>>()?;
        let features = items(child(cascade, "features")?)
            .map(|n| parse_feature(n, window_width, window_height))
            .collect::<Result<Vec<_>, _>>()?;

        let cascade = Self {
            window_width,
            window_height,
            stages,
            features,
        };
        cascade.validate()?;
        Ok(cascade)
    }

    pub fn window_size(&self) -> (usize, usize) {
        (self.window_width, self.window_height)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Run the cascade on the native-size window whose top-left corner is
    /// at `(x, y)`. The window must lie inside the integral image.
    ///
    /// Windows whose interior (1px inset) has a standard deviation of at
    /// most `MIN_WINDOW_STDDEV` grey levels are rejected before any stage
    /// runs.
    pub fn accepts(&self, integral: &IntegralImage, x: usize, y: usize) -> bool {
        let Some(norm) = self.variance_norm(integral, x, y) else {
            return false;
        };

        self.stages.iter().all(|stage| {
            let score: f64 = stage
                .classifiers
                .iter()
                .map(|weak| self.weak_score(weak, integral, x, y, norm))
                .sum();
            score >= stage.threshold - STAGE_THRESHOLD_EPS
        })
    }

    /// `area · stddev` of the window interior, or `None` for a window too
    /// flat to evaluate.
    fn variance_norm(&self, integral: &IntegralImage, x: usize, y: usize) -> Option<f64> {
        let (nw, nh) = (self.window_width - 2, self.window_height - 2);
        let area = (nw * nh) as f64;
        let sum = integral.rect_sum(x + 1, y + 1, nw, nh) as f64;
        let sq_sum = integral.rect_sq_sum(x + 1, y + 1, nw, nh) as f64;
        let variance = area * sq_sum - sum * sum;
        if variance <= 0.0 {
            return None;
        }
        let norm = variance.sqrt();
        // area / norm == 1 / stddev
        if area / norm >= 1.0 / MIN_WINDOW_STDDEV {
            return None;
        }
        Some(norm)
    }

    fn weak_score(
        &self,
        weak: &WeakClassifier,
        integral: &IntegralImage,
        x: usize,
        y: usize,
        norm: f64,
    ) -> f64 {
        let mut idx: i32 = 0;
        loop {
            let node = &weak.nodes[idx as usize];
            let value = self.feature_value(node.feature, integral, x, y) / norm;
            idx = if value < node.threshold {
                node.left
            } else {
                node.right
            };
            if idx <= 0 {
                return weak.leaves[(-idx) as usize];
            }
        }
    }

    fn feature_value(&self, feature: usize, integral: &IntegralImage, x: usize, y: usize) -> f64 {
        self.features[feature]
            .rects
            .iter()
            .map(|r| integral.rect_sum(x + r.x, y + r.y, r.width, r.height) as f64 * r.weight)
            .sum()
    }

    /// Cross-check indices so evaluation can index without bounds failures.
    fn validate(&self) -> Result<(), CascadeError> {
        if self.stages.is_empty() {
            return Err(CascadeError::Malformed("cascade has no stages".into()));
        }
        for (si, stage) in self.stages.iter().enumerate() {
            for weak in &stage.classifiers {
                if weak.nodes.is_empty() {
                    return Err(CascadeError::Malformed(format!(
                        "stage {si} has a weak classifier without nodes"
                    )));
                }
                for (ni, node) in weak.nodes.iter().enumerate() {
                    if node.feature >= self.features.len() {
                        return Err(CascadeError::Malformed(format!(
                            "stage {si} references missing feature {}",
                            node.feature
                        )));
                    }
                    for child in [node.left, node.right] {
                        // Inner children must point forward so every walk ends in a leaf.
                        let in_range = if child > 0 {
                            (child as usize) > ni && (child as usize) < weak.nodes.len()
                        } else {
                            ((-child) as usize) < weak.leaves.len()
                        };
                        if !in_range {
                            return Err(CascadeError::Malformed(format!(
                                "stage {si} has a dangling tree index {child}"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_stage(node: Node<'_, '_>) -> Result<Stage, CascadeError> {
    let threshold: f64 = parse_one(node, "stageThreshold")?;
    let classifiers = items(child(node, "weakClassifiers")?)
        .map(parse_weak_classifier)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stage {
        threshold,
        classifiers,
    })
}

fn parse_weak_classifier(node: Node<'_, '_>) -> Result<WeakClassifier, CascadeError> {
    let raw: Vec<f64> = parse_list(child(node, "internalNodes")?)?;
    if raw.is_empty() || raw.len() % 4 != 0 {
        return Err(CascadeError::Malformed(format!(
            "internalNodes must hold groups of 4 values, got {}",
            raw.len()
        )));
    }
    let nodes = raw
        .chunks_exact(4)
        .map(|c| {
            if c[2] < 0.0 {
                return Err(CascadeError::Malformed(format!(
                    "negative feature index {}",
                    c[2]
                )));
            }
            Ok(TreeNode {
                left: c[0] as i32,
                right: c[1] as i32,
                feature: c[2] as usize,
                threshold: c[3],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let leaves: Vec<f64> = parse_list(child(node, "leafValues")?)?;
    Ok(WeakClassifier { nodes, leaves })
}

fn parse_feature(
    node: Node<'_, '_>,
    window_width: usize,
    window_height: usize,
) -> Result<HaarFeature, CascadeError> {
    if let Some(tilted) = node.children().find(|n| n.has_tag_name("tilted")) {
        if tilted.text().map(str::trim) == Some("1") {
            return Err(CascadeError::Unsupported("tilted Haar features".into()));
        }
    }

    let rects = items(child(node, "rects")?)
        .map(|r| {
            let values: Vec<f64> = parse_list(r)?;
            if values.len() != 5 {
                return Err(CascadeError::Malformed(format!(
                    "rect needs 5 values, got {}",
                    values.len()
                )));
            }
            if values[..4].iter().any(|v| *v < 0.0) {
                return Err(CascadeError::Malformed("negative rect geometry".into()));
            }
            let rect = WeightedRect {
                x: values[0] as usize,
                y: values[1] as usize,
                width: values[2] as usize,
                height: values[3] as usize,
                weight: values[4],
            };
            if rect.x + rect.width > window_width || rect.y + rect.height > window_height {
                return Err(CascadeError::Malformed(
                    "feature rect exceeds the detection window".into(),
                ));
            }
            Ok(rect)
        })
        .collect::<Result<Vec<_>, _>>()?;

    if rects.is_empty() {
        return Err(CascadeError::Malformed("feature without rects".into()));
    }
    Ok(HaarFeature { rects })
}

// ---------------------------------------------------------------------------
// XML helpers
// ---------------------------------------------------------------------------

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Result<Node<'a, 'input>, CascadeError> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .ok_or_else(|| CascadeError::Malformed(format!("missing <{tag}>")))
}

/// OpenCV stores sequences as repeated `<_>` elements.
fn items<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.has_tag_name("_"))
}

fn text_of<'a>(node: Node<'a, '_>, tag: &str) -> Result<&'a str, CascadeError> {
    Ok(child(node, tag)?.text().unwrap_or_default().trim())
}

fn parse_one<T: FromStr>(node: Node<'_, '_>, tag: &str) -> Result<T, CascadeError> {
    let text = text_of(node, tag)?;
    text.parse()
        .map_err(|_| CascadeError::Malformed(format!("<{tag}> is not a number: {text:?}")))
}

fn parse_list<T: FromStr>(node: Node<'_, '_>) -> Result<Vec<T>, CascadeError> {
    node.text()
        .unwrap_or_default()
        .split_whitespace()
        .map(|token| {
            token
                .parse()
                .map_err(|_| CascadeError::Malformed(format!("not a number: {token:?}")))
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_cascades {
    /// A one-stage cascade on a 4×4 window with a single two-rect feature
    /// comparing the bottom half against the top half. A window passes when
    /// its bottom half is brighter than its top half.
    pub const BRIGHT_BOTTOM: &str = r#"<?xml version="1.0"?>
<!-- synthetic cascade used in tests -->
<opencv_storage>
<cascade type_id="opencv-cascade-classifier"><stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>4</height>
  <width>4</width>
  <stageParams><maxWeakCount>1</maxWeakCount></stageParams>
  <featureParams><maxCatCount>0</maxCatCount></featureParams>
  <stageNum>1</stageNum>
  <stages>
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>0.</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>
            0 -1 0 1.0000000000000000e-01</internalNodes>
          <leafValues>
            -1. 1.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>
          0 0 4 2 -1.</_>
        <_>
          0 2 4 2 1.</_></rects></_></features></cascade>
</opencv_storage>
"#;
}

#[cfg(test)]
mod tests {
    use super::test_cascades::BRIGHT_BOTTOM;
    use super::*;
    use image::{GrayImage, Luma};
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn split_image(top: u8, bottom: u8) -> GrayImage {
        GrayImage::from_fn(4, 4, |_, y| Luma([if y < 2 { top } else { bottom }]))
    }

    #[test]
    fn test_parses_window_and_stages() {
        let cascade = HaarCascade::from_xml(BRIGHT_BOTTOM).unwrap();
        assert_eq!(cascade.window_size(), (4, 4));
        assert_eq!(cascade.stage_count(), 1);
        assert_eq!(cascade.features[0].rects.len(), 2);
        assert_eq!(cascade.features[0].rects[0].weight, -1.0);
    }

    #[test]
    fn test_parses_stump_as_single_node_tree() {
        let cascade = HaarCascade::from_xml(BRIGHT_BOTTOM).unwrap();
        let weak = &cascade.stages[0].classifiers[0];
        assert_eq!(
            weak.nodes,
            vec![TreeNode {
                left: 0,
                right: -1,
                feature: 0,
                threshold: 0.1
            }]
        );
        assert_eq!(weak.leaves, vec![-1.0, 1.0]);
    }

    #[test]
    fn test_accepts_bright_bottom_window() {
        let cascade = HaarCascade::from_xml(BRIGHT_BOTTOM).unwrap();
        let integral = IntegralImage::new(&split_image(20, 220));
        assert!(cascade.accepts(&integral, 0, 0));
    }

    #[test]
    fn test_rejects_bright_top_window() {
        let cascade = HaarCascade::from_xml(BRIGHT_BOTTOM).unwrap();
        let integral = IntegralImage::new(&split_image(220, 20));
        assert!(!cascade.accepts(&integral, 0, 0));
    }

    fn rows_image(rows: [u8; 4]) -> GrayImage {
        GrayImage::from_fn(4, 4, |_, y| Luma([rows[y as usize]]))
    }

    #[test]
    fn test_rejects_flat_window() {
        let cascade = HaarCascade::from_xml(BRIGHT_BOTTOM).unwrap();
        let integral = IntegralImage::new(&GrayImage::from_pixel(4, 4, Luma([128])));
        assert!(!cascade.accepts(&integral, 0, 0));
    }

    #[test]
    fn test_flat_window_rejected_even_when_stages_would_pass() {
        // A negative split threshold sends a zero feature value right,
        // so only the contrast check can reject this window.
        let xml = BRIGHT_BOTTOM.replace(
            "0 -1 0 1.0000000000000000e-01",
            "0 -1 0 -1.0000000000000000e-01",
        );
        let cascade = HaarCascade::from_xml(&xml).unwrap();
        let integral = IntegralImage::new(&GrayImage::from_pixel(4, 4, Luma([128])));
        assert!(!cascade.accepts(&integral, 0, 0));
    }

    #[test]
    fn test_rejects_low_contrast_window() {
        // interior stddev 2.5: bottom is brighter but the window is too flat
        let cascade = HaarCascade::from_xml(BRIGHT_BOTTOM).unwrap();
        let integral = IntegralImage::new(&rows_image([120, 120, 125, 125]));
        assert!(!cascade.accepts(&integral, 0, 0));
    }

    #[rstest]
    #[case([100, 100, 120, 120], false)]
    #[case([100, 100, 121, 121], true)]
    fn test_contrast_boundary_is_ten_grey_levels(#[case] rows: [u8; 4], #[case] accepted: bool) {
        let cascade = HaarCascade::from_xml(BRIGHT_BOTTOM).unwrap();
        let integral = IntegralImage::new(&rows_image(rows));
        assert_eq!(cascade.accepts(&integral, 0, 0), accepted);
    }

    #[rstest]
    #[case("1.000001", true)]
    #[case("1.0001", false)]
    fn test_stage_threshold_tolerance(#[case] threshold: &str, #[case] accepted: bool) {
        // the single leaf reached scores exactly 1.0
        let xml = BRIGHT_BOTTOM.replace(
            "<stageThreshold>0.</stageThreshold>",
            &format!("<stageThreshold>{threshold}</stageThreshold>"),
        );
        let cascade = HaarCascade::from_xml(&xml).unwrap();
        let integral = IntegralImage::new(&split_image(20, 220));
        assert_eq!(cascade.accepts(&integral, 0, 0), accepted);
    }

    #[test]
    fn test_non_forward_tree_edge_is_malformed() {
        let xml = BRIGHT_BOTTOM
            .replace(
                "0 -1 0 1.0000000000000000e-01",
                "1 -1 0 0.1 1 -2 0 0.1",
            )
            .replace("-1. 1.</leafValues>", "-1. 1. 0.5</leafValues>");
        let err = HaarCascade::from_xml(&xml).unwrap_err();
        assert!(matches!(err, CascadeError::Malformed(_)));
    }

    #[test]
    fn test_forward_tree_edges_are_accepted() {
        let xml = BRIGHT_BOTTOM
            .replace(
                "0 -1 0 1.0000000000000000e-01",
                "1 -1 0 0.1 -1 -2 0 0.1",
            )
            .replace("-1. 1.</leafValues>", "-1. 1. 0.5</leafValues>");
        assert!(HaarCascade::from_xml(&xml).is_ok());
    }

    #[test]
    fn test_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cascade.xml");
        fs::write(&path, BRIGHT_BOTTOM).unwrap();
        assert!(HaarCascade::from_file(&path).is_ok());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = HaarCascade::from_file(Path::new("/nonexistent/cascade.xml")).unwrap_err();
        assert!(matches!(err, CascadeError::Io(_)));
    }

    #[test]
    fn test_invalid_xml() {
        let err = HaarCascade::from_xml("<opencv_storage><cascade>").unwrap_err();
        assert!(matches!(err, CascadeError::Xml(_)));
    }

    #[test]
    fn test_old_style_cascade_is_unsupported() {
        let xml = r#"<opencv_storage><haarcascade_frontalface type_id="opencv-haar-classifier"/></opencv_storage>"#;
        let err = HaarCascade::from_xml(xml).unwrap_err();
        assert!(matches!(err, CascadeError::Unsupported(_)));
    }

    #[test]
    fn test_lbp_cascade_is_unsupported() {
        let xml = BRIGHT_BOTTOM.replace(
            "<featureType>HAAR</featureType>",
            "<featureType>LBP</featureType>",
        );
        let err = HaarCascade::from_xml(&xml).unwrap_err();
        assert!(matches!(err, CascadeError::Unsupported(_)));
    }

    #[test]
    fn test_tilted_features_are_unsupported() {
        let xml = BRIGHT_BOTTOM.replace("</rects></_></features>", "</rects><tilted>1</tilted></_></features>");
        let err = HaarCascade::from_xml(&xml).unwrap_err();
        assert!(matches!(err, CascadeError::Unsupported(_)));
    }

    #[test]
    fn test_dangling_feature_index_is_malformed() {
        let xml = BRIGHT_BOTTOM.replace("0 -1 0 1.0000000000000000e-01", "0 -1 3 0.1");
        let err = HaarCascade::from_xml(&xml).unwrap_err();
        assert!(matches!(err, CascadeError::Malformed(_)));
    }

    #[test]
    fn test_rect_outside_window_is_malformed() {
        let xml = BRIGHT_BOTTOM.replace("0 2 4 2 1.", "0 3 4 2 1.");
        let err = HaarCascade::from_xml(&xml).unwrap_err();
        assert!(matches!(err, CascadeError::Malformed(_)));
    }
}
