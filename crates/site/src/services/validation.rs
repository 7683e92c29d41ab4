//! Per-field validation errors for the admin forms.

use std::collections::BTreeMap;

use crate::services::uploads::is_allowed_image;

/// Message shown next to a rejected image upload.
pub const IMAGE_TYPE_MESSAGE: &str = "Apenas imagens JPG, JPEG ou PNG são permitidas.";

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the first message for a field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// The message for `field`, if it was rejected.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// `Ok(value)` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field was rejected.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Number of characters (not bytes) in `value`.
pub(crate) fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Check an optional upload's file name.
pub(crate) fn check_image(errors: &mut FieldErrors, file_name: Option<&str>) {
    if let Some(name) = file_name
        && !is_allowed_image(name)
    {
        errors.add("image", IMAGE_TYPE_MESSAGE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_wins() {
        let mut errors = FieldErrors::new();
        errors.add("name", "primeira");
        errors.add("name", "segunda");
        assert_eq!(errors.get("name"), Some("primeira"));
        assert!(errors.into_result(()).is_err());
    }

    #[test]
    fn test_check_image() {
        let mut errors = FieldErrors::new();
        check_image(&mut errors, None);
        check_image(&mut errors, Some("foto.PNG"));
        assert!(errors.is_empty());
        check_image(&mut errors, Some("foto.webp"));
        assert!(errors.has("image"));
    }
}
