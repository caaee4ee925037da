// src/utils/validation.rs

use validator::{ValidationError, ValidationErrors};

use crate::error::AppError;

/// Rejects empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Turns a `ValidationErrors` set into a single client error naming the
/// first failing field, checked in `field_order`.
pub fn first_violation(errors: &ValidationErrors, field_order: &[&str]) -> AppError {
    let fields = errors.field_errors();

    for name in field_order {
        if let Some(error) = fields.get(*name).and_then(|list| list.first()) {
            return AppError::validation(describe(name, error), *name);
        }
    }

    AppError::BadRequest(errors.to_string())
}

fn describe(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    match &*error.code {
        "blank" | "required" => format!("{} is required", capitalize(field)),
        code => format!("{} is invalid ({})", capitalize(field), code),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
