pub mod haar_cascade;
pub mod haar_face_localizer;
pub mod math;
