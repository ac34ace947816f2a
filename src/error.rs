use std::path::Path;

/// Fatal error for a run.
///
/// Exit codes:
/// - `2`: missing or unreadable inputs, output write failures, bad arguments
/// - `3`: malformed series handed to the series builder
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// A required input table could not be located.
    pub fn missing_input(path: &Path) -> Self {
        Self::new(2, format!("Missing required file: {}", path.display()))
    }

    /// A product group reached the series builder without observations.
    pub fn malformed_series(product_id: &str) -> Self {
        Self::new(3, format!("Product '{product_id}' has no sales observations."))
    }

    /// Read/write/serialization failure on `path`.
    pub fn io(action: &str, path: &Path, err: impl std::fmt::Display) -> Self {
        Self::new(2, format!("Failed to {action} '{}': {err}", path.display()))
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_names_the_path() {
        let err = AppError::missing_input(Path::new("data/forecast.csv"));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("data/forecast.csv"));
    }

    #[test]
    fn malformed_series_uses_its_own_exit_code() {
        let err = AppError::malformed_series("1_1");
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("1_1"));
    }
}
