use crate::shared::decoded_image::DecodedImage;
use crate::shared::face_box::FaceBox;

/// Domain interface for finding the face a prediction is made on.
///
/// Implementations are loaded once and shared by every request, hence
/// `&self` and `Sync`.
pub trait FaceLocalizer: Send + Sync {
    /// All face regions found, in detector output order.
    fn detect(&self, image: &DecodedImage) -> Vec<FaceBox>;

    /// The face to analyze, or `None` when no face was found.
    fn locate(&self, image: &DecodedImage) -> Option<FaceBox> {
        crate::detection::domain::face_selection::select_largest(&self.detect(image))
    }
}
