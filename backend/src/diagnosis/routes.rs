use actix_multipart::{Field, Multipart};
use actix_web::{web, Error, HttpResponse};
use futures::TryStreamExt;
use log::{info, warn};
use shared::capture::MAX_IMAGE_BYTES;
use shared::{ErrorBody, ImageMime, ImagePayload, ValidationError};

use crate::auth::middleware::AuthenticatedUser;

use super::client::InferenceClient;
use super::store::DiagnosisStore;

const IMAGE_FIELD: &str = "image";
const DEFAULT_FILENAME: &str = "upload";

enum ImageUpload {
    Missing,
    Rejected(ValidationError),
    Received(ImagePayload),
}

/// Reads the field into memory, giving up as soon as it passes the size limit.
async fn read_limited(field: &mut Field) -> Result<Result<Vec<u8>, ValidationError>, Error> {
    let mut image_data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if image_data.len() + chunk.len() > MAX_IMAGE_BYTES {
            return Ok(Err(ValidationError::TooLarge {
                size: image_data.len() + chunk.len(),
            }));
        }
        image_data.extend_from_slice(&chunk);
    }
    Ok(Ok(image_data))
}

async fn read_image_field(payload: &mut Multipart) -> Result<ImageUpload, Error> {
    while let Some(mut field) = payload.try_next().await? {
        if field.name() != Some(IMAGE_FIELD) {
            while field.try_next().await?.is_some() {}
            continue;
        }

        let content_type = field.content_type().map(|m| m.to_string()).unwrap_or_default();
        if let Err(e) = ImageMime::parse(&content_type) {
            return Ok(ImageUpload::Rejected(e));
        }
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();

        let image_data = match read_limited(&mut field).await? {
            Ok(bytes) => bytes,
            Err(e) => return Ok(ImageUpload::Rejected(e)),
        };
        if image_data.is_empty() {
            return Ok(ImageUpload::Missing);
        }

        return Ok(match ImagePayload::from_file(image_data, &content_type, filename) {
            Ok(payload) => ImageUpload::Received(payload),
            Err(e) => ImageUpload::Rejected(e),
        });
    }
    Ok(ImageUpload::Missing)
}

/// `POST /api/diagnosis`: validate, forward to the model, remember the result.
pub async fn diagnose(
    user: AuthenticatedUser,
    mut payload: Multipart,
    client: web::Data<InferenceClient>,
    store: web::Data<DiagnosisStore>,
) -> Result<HttpResponse, Error> {
    let image = match read_image_field(&mut payload).await? {
        ImageUpload::Received(image) => image,
        ImageUpload::Missing => {
            warn!("Diagnosis request from {} without an image", user.0);
            return Ok(HttpResponse::BadRequest().json(ErrorBody::new("No image provided")));
        }
        ImageUpload::Rejected(e) => {
            warn!("Rejected upload from {}: {}", user.0, e);
            return Ok(HttpResponse::BadRequest().json(ErrorBody::from(&e)));
        }
    };

    match client.diagnose(image).await {
        Ok(result) => {
            store.set(user.0, result.clone());
            info!("Stored diagnosis for {}", user.0);
            Ok(HttpResponse::Ok().json(result))
        }
        Err(e) => Ok(HttpResponse::BadGateway().json(ErrorBody::new(e.message()))),
    }
}

pub async fn latest(user: AuthenticatedUser, store: web::Data<DiagnosisStore>) -> HttpResponse {
    match store.get(user.0) {
        Some(result) => HttpResponse::Ok().json(result),
        None => HttpResponse::NotFound().json(ErrorBody::new("No diagnosis available")),
    }
}

pub async fn clear_latest(user: AuthenticatedUser, store: web::Data<DiagnosisStore>) -> HttpResponse {
    store.clear(user.0);
    HttpResponse::NoContent().finish()
}
