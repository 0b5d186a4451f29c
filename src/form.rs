use base64::{engine::general_purpose::STANDARD, Engine};
use log::{debug, warn};
use rocket::{
    form::{error::ErrorKind, Context},
    fs::TempFile,
    FromForm,
};
use tokio::io::AsyncReadExt;

use crate::models::{FishRecord, Kep};

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// `size` is unknown when the upload was cut off while being received.
    #[error("A kép mérete maximum {}MB lehet!", .limit / (1024 * 1024))]
    TooLarge { size: Option<u64>, limit: u64 },

    #[error("Csak képfájl tölthető fel!")]
    NotAnImage,

    #[error("Could not read uploaded image")]
    Read(#[from] std::io::Error),
}

/// The submitted edit form.
#[derive(Debug, FromForm)]
pub struct EditForm<'r> {
    pub nev: String,
    pub faj: String,
    #[field(name = "meretCm")]
    pub meret_cm: String,
    #[field(name = "toId")]
    pub to_id: String,
    pub kep: Option<TempFile<'r>>,
}

/// Reads a number the way the form's number inputs are read: anything that
/// does not parse to a finite number becomes zero.
pub fn parse_number(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Copies whatever editable fields made it into a submission the form guard
/// rejected.
pub fn apply_partial(context: &Context<'_>, record: &mut FishRecord) {
    if let Some(nev) = context.field_value("nev") {
        record.nev = nev.to_string();
    }
    if let Some(faj) = context.field_value("faj") {
        record.faj = faj.to_string();
    }
    if let Some(meret_cm) = context.field_value("meretCm") {
        record.meret_cm = parse_number(meret_cm);
    }
    if let Some(to_id) = context.field_value("toId") {
        record.to_id = parse_number(to_id) as i64;
    }
}

/// Whether the submission was rejected for exceeding an upload limit.
pub fn cut_off(context: &Context<'_>) -> bool {
    context
        .errors()
        .any(|err| matches!(err.kind, ErrorKind::InvalidLength { .. }))
}

impl EditForm<'_> {
    /// Overwrites the editable fields of `record`.
    pub fn apply(&self, record: &mut FishRecord) {
        record.nev = self.nev.clone();
        record.faj = self.faj.clone();
        record.meret_cm = parse_number(&self.meret_cm);
        record.to_id = parse_number(&self.to_id) as i64;
    }

    /// The newly selected image, base64 encoded, if there is one.
    pub async fn image(&self, limit: u64) -> Result<Option<Kep>, UploadError> {
        let Some(file) = self.kep.as_ref().filter(|file| file.len() > 0) else {
            return Ok(None);
        };

        let size = file.len();
        if size > limit {
            return Err(UploadError::TooLarge {
                size: Some(size),
                limit,
            });
        }

        if !file
            .content_type()
            .map(|content_type| content_type.top() == "image")
            .unwrap_or(false)
        {
            warn!("Rejecting upload of type {:?}", file.content_type());
            return Err(UploadError::NotAnImage);
        }

        let mut bytes = Vec::with_capacity(size as usize);
        let reader = file.open().await?;
        tokio::pin!(reader);
        reader.read_to_end(&mut bytes).await?;
        debug!("Encoding uploaded image of {} bytes", bytes.len());

        Ok(Some(Kep::Text(STANDARD.encode(bytes))))
    }
}
