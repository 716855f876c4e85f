use gloo_file::Blob;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use shared::species::SpeciesPage;
use shared::{
    AuthResponse, DiagnosisResult, ErrorBody, ImagePayload, LoginRequest, SignupRequest, UserInfo,
};

async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(error) if !error.error.is_empty() => error.describe(),
        _ => format!("Server error: {}", status),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, String> {
    if !response.ok() {
        return Err(error_message(response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))
}

fn network_error(e: gloo_net::Error) -> String {
    format!("Network error: {}", e)
}

/// `None` when there is no valid session.
pub async fn current_user() -> Result<Option<UserInfo>, String> {
    let response = Request::get("/api/auth/me").send().await.map_err(network_error)?;
    match response.status() {
        401 => Ok(None),
        _ => read_json(response).await.map(Some),
    }
}

pub async fn login(request: &LoginRequest) -> Result<UserInfo, String> {
    let response = Request::post("/api/auth/login")
        .json(request)
        .map_err(network_error)?
        .send()
        .await
        .map_err(network_error)?;
    read_json::<AuthResponse>(response).await.map(|auth| auth.user)
}

pub async fn signup(request: &SignupRequest) -> Result<UserInfo, String> {
    let response = Request::post("/api/auth/signup")
        .json(request)
        .map_err(network_error)?
        .send()
        .await
        .map_err(network_error)?;
    read_json::<AuthResponse>(response).await.map(|auth| auth.user)
}

pub async fn logout() -> Result<(), String> {
    let response = Request::post("/api/auth/logout").send().await.map_err(network_error)?;
    if response.ok() {
        Ok(())
    } else {
        Err(error_message(response).await)
    }
}

/// Sends the image as multipart field `image`.
pub async fn diagnose(payload: &ImagePayload) -> Result<DiagnosisResult, String> {
    let form = web_sys::FormData::new().map_err(|e| format!("{:?}", e))?;
    let blob = Blob::new_with_options(payload.bytes(), Some(payload.mime().as_ref()));
    form.append_with_blob_and_filename("image", blob.as_ref(), payload.filename())
        .map_err(|e| format!("{:?}", e))?;

    log::info!("Submitting {} ({} bytes) for diagnosis", payload.filename(), payload.len());
    let response = Request::post("/api/diagnosis")
        .body(form)
        .map_err(network_error)?
        .send()
        .await
        .map_err(network_error)?;
    read_json(response).await
}

pub async fn latest_diagnosis() -> Result<Option<DiagnosisResult>, String> {
    let response = Request::get("/api/diagnosis/latest").send().await.map_err(network_error)?;
    match response.status() {
        404 | 401 => Ok(None),
        _ => read_json(response).await.map(Some),
    }
}

pub async fn search_species(query: &str, page: u32) -> Result<SpeciesPage, String> {
    let page = page.to_string();
    let response = Request::get("/api/species/search")
        .query([("q", query), ("page", page.as_str())])
        .send()
        .await
        .map_err(network_error)?;
    read_json(response).await
}
