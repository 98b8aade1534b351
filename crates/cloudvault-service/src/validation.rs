//! Input-shape checks shared by the directory and file facades.

use validator::ValidateEmail;

use cloudvault_core::error::AppError;
use cloudvault_core::result::AppResult;
use cloudvault_entity::directory::MAX_NAME_LEN;

const RESERVED_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Validate a directory or file name and return it trimmed.
pub fn validate_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "Name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(AppError::validation("Name cannot be '.' or '..'"));
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| RESERVED_CHARS.contains(c) || c.is_control())
    {
        return Err(AppError::validation(format!(
            "Name contains a reserved character: {bad:?}"
        )));
    }

    Ok(trimmed.to_string())
}

/// Validate an email address and return it trimmed.
pub fn validate_email(email: &str) -> AppResult<String> {
    let trimmed = email.trim();
    if !trimmed.validate_email() {
        return Err(AppError::validation(format!(
            "Invalid email address: {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}

/// Split a client-supplied relative upload path into validated directory
/// names, dropping the final (file name) segment.
///
/// Empty segments and `.` are ignored; `..` is rejected.
pub fn relative_directories(relative_path: &str) -> AppResult<Vec<String>> {
    let mut segments: Vec<&str> = relative_path
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    segments.pop();

    segments
        .into_iter()
        .map(|segment| {
            if segment == ".." {
                Err(AppError::validation("Relative path cannot contain '..'"))
            } else {
                validate_name(segment)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Docs ").unwrap(), "Docs");
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("a\\b").is_err());
        assert!(validate_name("what?").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name(&"x".repeat(256)).is_err());
        assert!(validate_name(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email(" friend@example.com ").unwrap(),
            "friend@example.com"
        );
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn test_relative_directories() {
        assert_eq!(
            relative_directories("photos/2024/beach.jpg").unwrap(),
            vec!["photos", "2024"]
        );
        assert_eq!(
            relative_directories("./a//b\\c.txt").unwrap(),
            vec!["a", "b"]
        );
        assert!(relative_directories("beach.jpg").unwrap().is_empty());
        assert!(relative_directories("../escape/x.txt").is_err());
    }
}
