use actix_multipart::{Field, Multipart};
use futures::{StreamExt, TryStreamExt};
use image::ImageReader;
use shared::ImageInfo;
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File must be an image (JPEG, PNG, etc.)")]
    InvalidContentType,
    #[error("File size must be less than {}MB", .limit / (1024 * 1024))]
    FileTooLarge { limit: usize },
    #[error("Uploaded file is empty")]
    EmptyFile,
    #[error("No file uploaded")]
    MissingFile,
    #[error("Too many files. Maximum {max} files allowed")]
    TooManyFiles { max: usize },
    #[error("Malformed multipart payload: {0}")]
    Multipart(#[from] actix_multipart::MultipartError),
}

/// One multipart part. Bytes past the read limit are counted but not kept.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
    pub size: usize,
}

impl UploadedFile {
    #[cfg(test)]
    pub fn new(filename: Option<&str>, content_type: Option<&str>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.map(str::to_string),
            content_type: content_type.map(str::to_string),
            size: data.len(),
            data,
        }
    }

    pub fn validate(&self, max_size: usize) -> Result<(), UploadError> {
        let is_image = self
            .content_type
            .as_deref()
            .is_some_and(|content_type| content_type.starts_with("image/"));
        if !is_image {
            return Err(UploadError::InvalidContentType);
        }
        if self.size > max_size {
            return Err(UploadError::FileTooLarge { limit: max_size });
        }
        if self.size == 0 {
            return Err(UploadError::EmptyFile);
        }
        Ok(())
    }

    /// Upload metadata plus whatever the image header reveals. Undecodable
    /// headers leave format and dimensions unset.
    pub fn image_info(&self) -> ImageInfo {
        let (format, dimensions) = match ImageReader::new(Cursor::new(&self.data)).with_guessed_format()
        {
            Ok(reader) => {
                let format = reader.format();
                (format, reader.into_dimensions().ok())
            }
            Err(_) => (None, None),
        };

        ImageInfo {
            filename: self.filename.clone(),
            size: self.size,
            content_type: self.content_type.clone(),
            format: format.map(|format| format!("{:?}", format).to_lowercase()),
            width: dimensions.map(|(width, _)| width),
            height: dimensions.map(|(_, height)| height),
        }
    }
}

/// Collects every part of the payload. Reading a part stops keeping bytes once
/// it passes `read_limit`, so oversized uploads are rejected without being buffered.
/// A part past `max_parts` fails the whole payload before its body is read.
pub async fn read_multipart(
    mut payload: Multipart,
    read_limit: usize,
    max_parts: usize,
) -> Result<Vec<UploadedFile>, UploadError> {
    let mut files = Vec::new();

    while let Some(mut field) = payload.try_next().await? {
        if files.len() >= max_parts {
            return Err(UploadError::TooManyFiles { max: max_parts });
        }
        files.push(read_part(&mut field, read_limit).await?);
    }

    Ok(files)
}

/// The first part, validated against `max_size`. Later parts are ignored.
pub async fn read_single_image(
    mut payload: Multipart,
    max_size: usize,
) -> Result<UploadedFile, UploadError> {
    let mut field = payload.try_next().await?.ok_or(UploadError::MissingFile)?;
    let file = read_part(&mut field, max_size).await?;
    file.validate(max_size)?;
    Ok(file)
}

async fn read_part(field: &mut Field, read_limit: usize) -> Result<UploadedFile, UploadError> {
    let filename = field
        .content_disposition()
        .and_then(|disposition| disposition.get_filename())
        .map(str::to_string);
    let content_type = field.content_type().map(|mime| mime.to_string());

    let mut data = Vec::new();
    let mut size = 0;
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        size += chunk.len();
        if size <= read_limit {
            data.extend_from_slice(&chunk);
        }
    }

    Ok(UploadedFile {
        filename,
        content_type,
        data,
        size,
    })
}
