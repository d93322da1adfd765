//! Result type alias for Casewise
//!
//! This module provides a convenient Result type alias that uses CasewiseError
//! as the error type.

use super::errors::CasewiseError;

/// Result type alias for Casewise operations
///
/// # Examples
///
/// ```
/// use casewise::domain::result::Result;
/// use casewise::domain::errors::CasewiseError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(CasewiseError::Input("No Patient resource".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, CasewiseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::CasewiseError;

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(CasewiseError::Input("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
