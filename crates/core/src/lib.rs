//! Facial emotion inference: decode an image payload, locate the most
//! prominent face, normalize it into the classifier's input tensor and
//! dispatch it to one of two prediction backends.

pub mod shared {
    pub mod constants;
    pub mod decoded_image;
    pub mod face_box;
    pub mod model_resolver;
}

pub mod decoding {
    pub mod image_decoder;
}

pub mod detection {
    pub mod domain {
        pub mod detector_params;
        pub mod face_localizer;
        pub mod face_selection;
    }
    pub mod infrastructure;
}

pub mod normalization {
    pub mod normalizer;
}

pub mod prediction {
    pub mod domain {
        pub mod backend_error;
        pub mod backend_kind;
        pub mod emotion_classifier;
        pub mod emotion_distribution;
        pub mod emotion_label;
        pub mod face_analyzer;
        pub mod prediction_result;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod pipeline_error;
    pub mod predict_emotion_use_case;
    pub mod predictor_factory;
}
