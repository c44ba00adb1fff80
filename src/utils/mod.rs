/// Utility modules for error handling, math helpers and scaling
pub mod error;
pub mod math;
pub mod scaling;

// Re-export commonly used types
pub use error::{EngineError, Result};
pub use math::{sigmoid, sigmoid_slope, validate_probability};
pub use scaling::StandardScaler;
