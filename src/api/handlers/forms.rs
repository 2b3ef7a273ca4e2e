use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::BytesMut;

use crate::actions::validation::ImageUpload;
use crate::actions::Outcome;
use crate::api::response::invalid_request;

/// A multipart form: at most one image file plus plain text fields.
#[derive(Debug, Default)]
pub struct ImageForm {
    pub file: Option<ImageUpload>,
    pub fields: HashMap<String, String>,
}

impl ImageForm {
    /// Read every part of the form. `file_field` names the part holding the image.
    pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, Outcome<()>> {
        let mut form = ImageForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| invalid_request(format!("Invalid multipart data: {e}")))?
        {
            let field_name = field.name().unwrap_or("").to_string();

            if field_name == file_field {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(|s| s.to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| invalid_request(format!("Failed to read file: {e}")))?;

                // Browsers send an empty part when no file was picked
                if data.is_empty() && file_name.is_empty() {
                    continue;
                }

                let mut buf = BytesMut::with_capacity(data.len());
                buf.extend_from_slice(&data);
                form.file = Some(ImageUpload {
                    data: buf.freeze(),
                    file_name,
                    content_type,
                });
            } else if !field_name.is_empty() {
                let text = field
                    .text()
                    .await
                    .map_err(|e| invalid_request(format!("Invalid {field_name}: {e}")))?;
                form.fields.insert(field_name, text);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The optional `index` field as an integer.
    pub fn index(&self) -> Result<Option<i32>, Outcome<()>> {
        self.text("index")
            .map(|raw| {
                raw.trim()
                    .parse::<i32>()
                    .map_err(|_| invalid_request("index must be an integer"))
            })
            .transpose()
    }

    pub fn require_file(self) -> Result<ImageUpload, Outcome<()>> {
        self.file.ok_or_else(|| invalid_request("Image is required"))
    }
}
