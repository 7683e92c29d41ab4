//! Multipart form reading for forms with an image field.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::AppError;
use crate::services::uploads::ImageUpload;

/// Name of the file input on admin forms.
pub const IMAGE_FIELD: &str = "image";

/// Text fields plus the optional image of a multipart submission.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    pub image: Option<ImageUpload>,
}

impl UploadForm {
    /// Drain a multipart body.
    ///
    /// An image input left empty (no file name or no bytes) counts as no
    /// image.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not valid multipart or
    /// exceeds the body limit.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == IMAGE_FIELD {
                let file_name = field.file_name().map(str::to_owned).unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.image = Some(ImageUpload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// A text field, empty when absent.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// A checkbox: browsers omit unchecked boxes entirely.
    #[must_use]
    pub fn checked(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .is_some_and(|value| !matches!(value.as_str(), "" | "off" | "false"))
    }

    /// Original file name of the uploaded image.
    #[must_use]
    pub fn image_name(&self) -> Option<String> {
        self.image.as_ref().map(|upload| upload.file_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked() {
        let mut form = UploadForm::default();
        form.fields.insert("active".to_string(), "y".to_string());
        form.fields.insert("published".to_string(), "off".to_string());

        assert!(form.checked("active"));
        assert!(!form.checked("published"));
        assert!(!form.checked("missing"));
        assert_eq!(form.text("missing"), "");
    }
}
