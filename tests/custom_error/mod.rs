#[derive(Debug, thiserror::Error)]
#[error("Custom error occurred")]
pub struct CustomError;
