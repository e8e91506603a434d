//! Multipart forms carrying text fields and image files.

use std::collections::HashMap;

use axum::extract::Multipart;
use campus_storage::MediaUpload;

use crate::error::ApiError;

/// Upper bound on files accepted in one request.
pub const MAX_FILES_PER_REQUEST: usize = 20;

#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: Vec<(String, MediaUpload)>,
}

impl UploadForm {
    /// Drain a multipart body. File inputs left empty by the browser are skipped.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field.bytes().await?;
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    if form.files.len() == MAX_FILES_PER_REQUEST {
                        return Err(ApiError::BadRequest(format!(
                            "at most {} files per request",
                            MAX_FILES_PER_REQUEST
                        )));
                    }
                    form.files.push((
                        name,
                        MediaUpload {
                            file_name,
                            content_type,
                            data,
                        },
                    ));
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// A trimmed text field, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn required(&self, name: &str) -> Result<String, ApiError> {
        self.text(name)
            .ok_or_else(|| ApiError::BadRequest(format!("missing field: {}", name)))
    }

    /// Checkbox semantics: present and not an explicit false value.
    pub fn flag(&self, name: &str) -> bool {
        self.text(name)
            .is_some_and(|v| !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "off" | "no"))
    }

    /// Every file sent under `name`.
    pub fn files(&mut self, name: &str) -> Vec<MediaUpload> {
        let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = rest;
        matching.into_iter().map(|(_, upload)| upload).collect()
    }

    /// Exactly one file sent under `name`.
    pub fn single_file(&mut self, name: &str) -> Result<MediaUpload, ApiError> {
        let mut files = self.files(name);
        match files.len() {
            1 => Ok(files.remove(0)),
            0 => Err(ApiError::BadRequest(format!("missing file: {}", name))),
            _ => Err(ApiError::BadRequest(format!("expected one file in {}", name))),
        }
    }
}

#[cfg(test)]
impl UploadForm {
    pub fn with(fields: &[(&str, &str)], files: Vec<(&str, MediaUpload)>) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: files
                .into_iter()
                .map(|(name, upload)| (name.to_string(), upload))
                .collect(),
        }
    }
}
