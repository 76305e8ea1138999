use thiserror::Error;

/// Validation failures raised when a scenario file parses but describes a
/// farm the engine cannot run.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario must define at least one crop")]
    EmptyCropSet,
    #[error("crop '{0}' must have a positive area")]
    NonPositiveArea(String),
    #[error("crop '{0}' is defined more than once")]
    DuplicateCrop(String),
    #[error("update interval must be positive")]
    ZeroInterval,
}
