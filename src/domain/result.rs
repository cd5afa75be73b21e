//! Result type alias for redcap-export
//!
//! This module provides a convenient Result type alias that uses
//! [`RedcapError`] as the error type.

use super::errors::RedcapError;

/// Result type alias for redcap-export operations
///
/// This is a convenience type alias that uses `RedcapError` as the error
/// type. Use this throughout the codebase for fallible operations.
///
/// # Examples
///
/// ```
/// use redcap_export::domain::result::Result;
/// use redcap_export::domain::errors::RedcapError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(RedcapError::Configuration("missing api_url".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, RedcapError>;
