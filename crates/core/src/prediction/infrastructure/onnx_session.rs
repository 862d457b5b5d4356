//! ONNX Runtime session construction shared by the local backends.

use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

/// Return the preferred ONNX execution providers for the current platform.
///
/// An empty list leaves ONNX Runtime on its default CPU provider, which is
/// also where it falls back if a listed provider fails to register.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Build a fully optimized session for `model_path`.
///
/// Runs are serialized by the callers, so intra-op parallelism gets every
/// core and inter-op parallelism stays at one.
pub fn build_session(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads)?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// Fixed dimensions of the first model input, `None` where a dimension is
/// symbolic (e.g. a dynamic batch axis).
pub fn input_dims(session: &Session) -> Option<Vec<Option<usize>>> {
    let input = session.inputs().first()?;
    if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
        Some(
            shape
                .iter()
                .map(|&d| if d > 0 { Some(d as usize) } else { None })
                .collect(),
        )
    } else {
        None
    }
}
