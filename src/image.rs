use log::error;
use serde_json::Value;

use crate::{
    blobs::BlobScope,
    models::{Kep, WrappedBytes},
};

pub const DATA_URL_SCHEME: &str = "data:";
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";
pub const JPEG: &str = "image/jpeg";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("value {0} is not a byte")]
    NotAByte(Value),

    #[error("wrapped image data is not an array")]
    NotAnArray,

    #[error("unsupported image payload")]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Usable as-is.
    Url(String),
    /// Raw bytes that still need an object URL.
    Blob {
        bytes: Vec<u8>,
        content_type: &'static str,
    },
}

/// Normalizes an image payload.
///
/// Strings starting with `data:` are passed through, other strings are taken
/// as bare base64 JPEG, and byte arrays (wrapped in a `data` field or not)
/// become a JPEG blob. An empty string counts as no image.
pub fn decode(kep: Option<&Kep>) -> Result<Option<ImageSource>, DecodeError> {
    let kep = match kep {
        None => return Ok(None),
        Some(Kep::Text(text)) if text.is_empty() => return Ok(None),
        Some(kep) => kep,
    };

    let bytes = match kep {
        Kep::Text(text) if text.starts_with(DATA_URL_SCHEME) => {
            return Ok(Some(ImageSource::Url(text.clone())))
        }
        Kep::Text(text) => {
            return Ok(Some(ImageSource::Url(format!(
                "{JPEG_DATA_URL_PREFIX}{text}"
            ))))
        }
        Kep::Wrapped(WrappedBytes { data, .. }) => match data {
            Value::Array(values) => to_bytes(values)?,
            _ => return Err(DecodeError::NotAnArray),
        },
        Kep::Bytes(values) => to_bytes(values)?,
        Kep::Other(_) => return Err(DecodeError::Unsupported),
    };

    Ok(Some(ImageSource::Blob {
        bytes,
        content_type: JPEG,
    }))
}

fn to_bytes(values: &[Value]) -> Result<Vec<u8>, DecodeError> {
    values
        .iter()
        .map(|value| {
            value
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| DecodeError::NotAByte(value.clone()))
        })
        .collect()
}

/// Image source for a template, or `None` when there is nothing to show.
pub fn image_src(kep: Option<&Kep>, blobs: &mut BlobScope<'_>) -> Option<String> {
    match decode(kep) {
        Ok(Some(ImageSource::Url(url))) => Some(url),
        Ok(Some(ImageSource::Blob {
            bytes,
            content_type,
        })) => Some(blobs.register(bytes, content_type)),
        Ok(None) => None,
        Err(err) => {
            error!("Could not convert image data: {err}");
            None
        }
    }
}
