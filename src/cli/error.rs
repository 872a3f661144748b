// Error handling utilities for consistent error messages and exit codes

use std::process;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing cases, rejected transitions, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate that a case ID is valid (positive integer)
pub fn validate_case_id(id_str: &str) -> Result<i64, String> {
    id_str.parse::<i64>()
        .map_err(|_| format!("Invalid case ID: '{}'. Case ID must be a number.", id_str))
        .and_then(|id| {
            if id > 0 {
                Ok(id)
            } else {
                Err(format!("Invalid case ID: {}. Case ID must be positive.", id))
            }
        })
}

/// Parse a money amount. Empty input means "not given"; separators are allowed.
pub fn parse_amount(value: &str) -> Result<Option<f64>, String> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(Some(amount)),
        Ok(_) => Err(format!("Invalid amount: '{}'. Amount must be zero or more.", value)),
        Err(_) => Err(format!("Invalid amount: '{}'. Amount must be a number.", value)),
    }
}

/// Validate case number format (letters, digits, '/', '-', '.')
pub fn validate_case_number(number: &str) -> Result<(), String> {
    validate_non_empty(number, "Case number")?;
    if number.chars().all(|c| c.is_alphanumeric() || c == '/' || c == '-' || c == '.') {
        Ok(())
    } else {
        Err(format!("Invalid case number: '{}'. Case numbers can only contain letters, numbers, slashes, hyphens, and dots.", number))
    }
}
