use bytes::Bytes;

use super::ActionError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_TITLE_LEN: usize = 255;

pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

fn invalid(message: impl Into<String>) -> ActionError {
    ActionError::Validation(message.into())
}

pub fn name(value: &str) -> Result<&str, ActionError> {
    let value = value.trim();
    let len = value.chars().count();
    if len < MIN_NAME_LEN {
        return Err(invalid(format!(
            "Name must have at least {MIN_NAME_LEN} characters"
        )));
    }
    if len > MAX_NAME_LEN {
        return Err(invalid(format!(
            "Name must have at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(value)
}

pub fn email(value: &str) -> Result<&str, ActionError> {
    let value = value.trim();
    let well_formed = value
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(invalid("Invalid email"));
    }
    if value.len() > MAX_EMAIL_LEN {
        return Err(invalid(format!(
            "Email must have at most {MAX_EMAIL_LEN} characters"
        )));
    }
    Ok(value)
}

pub fn password(value: &str) -> Result<&str, ActionError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(format!(
            "Password must have at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(value)
}

pub fn post_title(value: &str) -> Result<&str, ActionError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid("Title is required"));
    }
    if value.chars().count() > MAX_TITLE_LEN {
        return Err(invalid(format!(
            "Title must have at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(value)
}

/// Optional article title: blank means "no title".
pub fn article_title(value: Option<&str>) -> Result<Option<&str>, ActionError> {
    match value.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) if title.chars().count() > MAX_TITLE_LEN => Err(invalid(format!(
            "Title must have at most {MAX_TITLE_LEN} characters"
        ))),
        other => Ok(other),
    }
}

pub fn article_text(value: &str) -> Result<&str, ActionError> {
    if value.trim().is_empty() {
        return Err(invalid("Text is required"));
    }
    Ok(value)
}

/// An image file as received from a client, before it is sent to the media host.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Bytes,
    pub file_name: String,
    /// Content type declared by the client, if any
    pub content_type: Option<String>,
}

impl ImageUpload {
    /// Content type from the upload itself, else guessed from the file name.
    pub fn mime_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|ct| ct != "application/octet-stream")
            .or_else(|| {
                mime_guess::from_path(&self.file_name)
                    .first()
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }

    pub fn validate(&self, max_size: u64) -> Result<(), ActionError> {
        if self.data.is_empty() {
            return Err(invalid("Image is required"));
        }
        if self.data.len() as u64 > max_size {
            return Err(invalid(format!(
                "Image must be at most {} MB",
                max_size as f64 / (1024.0 * 1024.0)
            )));
        }
        if !ALLOWED_IMAGE_TYPES.contains(&self.mime_type().as_str()) {
            return Err(invalid("Only JPG, PNG or WebP files are allowed"));
        }
        if self.file_name.chars().count() > MAX_TITLE_LEN {
            return Err(invalid(format!(
                "File name must have at most {MAX_TITLE_LEN} characters"
            )));
        }
        Ok(())
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
