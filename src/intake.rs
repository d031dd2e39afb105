//! File intake: the selected image and its preview.

use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};

use crate::error::ClientError;

const IMAGE_PREFIX: &str = "image/";
const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// A file chosen by the user, with the media type it declares.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its media type from the extension
    /// the way a browser file picker does.
    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::Io(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, media_type_for_path(path), bytes))
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with(IMAGE_PREFIX)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Declared media type for a path, by extension. Unknown extensions map to
/// `application/octet-stream`.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") | Some("jfif") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("ico") => "image/x-icon",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        Some("txt") => "text/plain",
        Some("pdf") => "application/pdf",
        Some("dcm") => "application/dicom",
        _ => UNKNOWN_MEDIA_TYPE,
    }
}

/// What the preview region shows for the selected file.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub data_uri: String,
    /// Pixel size, when the bytes decode as a raster image
    pub dimensions: Option<(u32, u32)>,
}

impl Preview {
    /// Encode the file as a data URI. Dimensions come from the image header
    /// only; bytes without a readable header still get a URI, just no
    /// dimensions.
    pub fn decode(file: &SelectedFile) -> Self {
        let data_uri = format!(
            "data:{};base64,{}",
            file.media_type,
            general_purpose::STANDARD.encode(&file.bytes)
        );

        let dimensions = match header_dimensions(&file.bytes) {
            Ok(dims) => Some(dims),
            Err(e) => {
                log::debug!("{} has no decodable pixels: {}", file.name, e);
                None
            }
        };

        Self {
            data_uri,
            dimensions,
        }
    }
}

fn header_dimensions(bytes: &[u8]) -> image::ImageResult<(u32, u32)> {
    image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
}

/// Decode the preview off the async executor.
pub async fn load_preview(file: SelectedFile) -> Result<Preview, ClientError> {
    let preview = tokio::task::spawn_blocking(move || Preview::decode(&file)).await?;
    Ok(preview)
}

#[cfg(test)]
pub(crate) fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(3, 2, image::Rgb([40, 40, 40]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png,
        )
        .unwrap();
    bytes
}
