use super::error::EngineError;

/// Logistic sigmoid: maps a log-odds value into (0, 1)
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Derivative of the sigmoid evaluated at a log-odds value
///
/// Used to map additive log-odds contributions into probability space
/// around an explainer's base value.
pub fn sigmoid_slope(x: f64) -> f64 {
    let s = sigmoid(x);
    s * (1.0 - s)
}

/// Validate probability is within valid range [0, 1]
///
/// # Arguments
/// * `probability` - The probability value to validate
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(EngineError::Validation)` if out of range or not finite
pub fn validate_probability(probability: f64) -> Result<(), EngineError> {
    if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
        return Err(EngineError::Validation(format!(
            "probability must be 0-1, got {}",
            probability
        )));
    }
    Ok(())
}
