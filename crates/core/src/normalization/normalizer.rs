use image::imageops::{self, FilterType};
use ndarray::Array4;

use crate::shared::constants::FACE_INPUT_SIZE;
use crate::shared::decoded_image::DecodedImage;
use crate::shared::face_box::FaceBox;

/// Classifier input: a single grayscale face, shape `(1, 48, 48, 1)`,
/// intensities in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedTensor(Array4<f32>);

impl NormalizedTensor {
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.0
    }

    /// All-zero tensor of the classifier input shape.
    pub fn zeros() -> Self {
        Self(Array4::zeros((1, FACE_INPUT_SIZE, FACE_INPUT_SIZE, 1)))
    }
}

/// Crops a face out of the grayscale image and rescales it into the
/// local classifier's input contract.
#[derive(Clone, Copy, Debug, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// The box is clamped to the image first, so any box that overlaps the
    /// image (or lies just outside it) yields a valid tensor.
    pub fn normalize(&self, image: &DecodedImage, face: &FaceBox) -> NormalizedTensor {
        let region = face.clamp_to(image.width(), image.height());
        let crop = imageops::crop_imm(
            image.grayscale(),
            region.x as u32,
            region.y as u32,
            region.width as u32,
            region.height as u32,
        )
        .to_image();

        let size = FACE_INPUT_SIZE as u32;
        let resized = imageops::resize(&crop, size, size, FilterType::Triangle);

        let tensor = Array4::from_shape_fn(
            (1, FACE_INPUT_SIZE, FACE_INPUT_SIZE, 1),
            |(_, y, x, _)| resized.get_pixel(x as u32, y as u32)[0] as f32 / 255.0,
        );
        NormalizedTensor(tensor)
    }
}
