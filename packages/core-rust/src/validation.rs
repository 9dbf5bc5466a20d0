use serde::{Deserialize, Serialize};

/// A single failed property check reported by a [`Validator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPropertyError {
    /// Name of the offending property.
    pub property_name: String,
    /// Description of what is wrong with it.
    pub error_message: String,
}

impl ValidationPropertyError {
    #[must_use]
    pub fn new(property_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            error_message: error_message.into(),
        }
    }
}

impl std::fmt::Display for ValidationPropertyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.property_name, self.error_message)
    }
}

/// Result of validating one value. Valid exactly when `errors` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<ValidationPropertyError>,
}

impl ValidationResult {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(errors: Vec<ValidationPropertyError>) -> Self {
        Self { errors }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationPropertyError] {
        &self.errors
    }

    /// Records one more failure.
    pub fn push(&mut self, error: ValidationPropertyError) {
        self.errors.push(error);
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<ValidationPropertyError> {
        self.errors
    }
}

/// Synchronous validation rule set for values of type `T`.
pub trait Validator<T>: Send + Sync + 'static {
    fn validate(&self, instance: &T) -> ValidationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NonEmptyName;

    impl Validator<String> for NonEmptyName {
        fn validate(&self, instance: &String) -> ValidationResult {
            let mut result = ValidationResult::success();
            if instance.trim().is_empty() {
                result.push(ValidationPropertyError::new("Name", "Name cannot be empty"));
            }
            result
        }
    }

    #[test]
    fn property_error_renders_name_and_message() {
        let err = ValidationPropertyError::new("Name", "Name cannot be empty");
        assert_eq!(err.to_string(), "Name: Name cannot be empty");
    }

    #[test]
    fn success_is_valid() {
        let result = ValidationResult::success();
        assert!(result.is_valid());
        assert!(result.errors().is_empty());
    }

    #[test]
    fn failure_is_invalid_and_keeps_order() {
        let result = ValidationResult::failure(vec![
            ValidationPropertyError::new("A", "first"),
            ValidationPropertyError::new("B", "second"),
        ]);
        assert!(!result.is_valid());
        let names: Vec<&str> = result
            .errors()
            .iter()
            .map(|e| e.property_name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn failure_with_no_errors_is_valid() {
        assert!(ValidationResult::failure(Vec::new()).is_valid());
    }

    #[test]
    fn validator_reports_blank_name() {
        assert!(NonEmptyName.validate(&"alice".to_string()).is_valid());
        let result = NonEmptyName.validate(&"  ".to_string());
        assert_eq!(result.into_errors().len(), 1);
    }
}
