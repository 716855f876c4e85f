use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{error, info, warn};
use shared::{AuthResponse, ErrorBody, LoginRequest, SignupRequest};

use crate::config::AppConfig;
use crate::db::user_repository::{RepositoryError, UserRepository};
use crate::diagnosis::store::DiagnosisStore;

use super::jwt::{JwtService, SESSION_DAYS};
use super::middleware::{session_user_id, AuthenticatedUser};
use super::models::AuthUser;
use super::password::{hash_password, verify_password};
use super::TOKEN_COOKIE;

const MIN_PASSWORD_LEN: usize = 6;
const MIN_NAME_LEN: usize = 2;

fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn validate_signup(req: &SignupRequest) -> Vec<String> {
    let mut details = Vec::new();
    if !is_valid_email(&req.email) {
        details.push("email: must be a valid email address".to_string());
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        details.push(format!("password: must be at least {} characters", MIN_PASSWORD_LEN));
    }
    if req.name.trim().chars().count() < MIN_NAME_LEN {
        details.push(format!("name: must be at least {} characters", MIN_NAME_LEN));
    }
    details
}

fn validate_login(req: &LoginRequest) -> Vec<String> {
    let mut details = Vec::new();
    if !is_valid_email(&req.email) {
        details.push("email: must be a valid email address".to_string());
    }
    if req.password.is_empty() {
        details.push("password: is required".to_string());
    }
    details
}

fn invalid_input(details: Vec<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorBody {
        error: "Invalid input".to_string(),
        details,
        ..ErrorBody::default()
    })
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorBody::new("Internal server error"))
}

fn session_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(SESSION_DAYS))
        .finish()
}

/// Issues the JWT for a user and answers with body + cookie.
fn session_response(user: AuthUser, jwt_service: &JwtService, config: &AppConfig) -> HttpResponse {
    match jwt_service.generate_token(&user) {
        Ok(token) => {
            let cookie = session_cookie(token.clone(), config);
            HttpResponse::Ok().cookie(cookie).json(AuthResponse {
                user: user.into(),
                token,
            })
        }
        Err(e) => {
            error!("Failed to generate token for {}: {:?}", user.email, e);
            internal_error()
        }
    }
}

pub async fn signup(
    body: web::Json<SignupRequest>,
    users: web::Data<UserRepository>,
    jwt_service: web::Data<JwtService>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    let details = validate_signup(&req);
    if !details.is_empty() {
        return Ok(invalid_input(details));
    }

    match users.find_by_email(&req.email).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::BadRequest().json(ErrorBody::new("Email already registered")));
        }
        Ok(None) => {}
        Err(e) => {
            error!("Signup lookup failed: {:?}", e);
            return Ok(internal_error());
        }
    }

    let password_hash = match hash_password(req.password, config.bcrypt_cost).await {
        Ok(hash) => hash,
        Err(e) => {
            error!("Password hashing failed: {:?}", e);
            return Ok(internal_error());
        }
    };

    match users.create_user(&req.email, &password_hash, &req.name).await {
        Ok(user) => {
            info!("Signed up user {}", user.id);
            Ok(session_response(AuthUser::from(user), &jwt_service, &config))
        }
        Err(RepositoryError::EmailTaken) => {
            Ok(HttpResponse::BadRequest().json(ErrorBody::new("Email already registered")))
        }
        Err(e) => {
            error!("Signup failed: {:?}", e);
            Ok(internal_error())
        }
    }
}

pub async fn login(
    body: web::Json<LoginRequest>,
    users: web::Data<UserRepository>,
    jwt_service: web::Data<JwtService>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    let details = validate_login(&req);
    if !details.is_empty() {
        return Ok(invalid_input(details));
    }

    let invalid_credentials =
        || HttpResponse::Unauthorized().json(ErrorBody::new("Invalid email or password"));

    let user = match users.find_by_email(&req.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Login attempt for unknown email");
            return Ok(invalid_credentials());
        }
        Err(e) => {
            error!("Login lookup failed: {:?}", e);
            return Ok(internal_error());
        }
    };

    match verify_password(req.password, user.password_hash.clone()).await {
        Ok(true) => {
            info!("User {} logged in", user.id);
            Ok(session_response(AuthUser::from(user), &jwt_service, &config))
        }
        Ok(false) => {
            warn!("Wrong password for user {}", user.id);
            Ok(invalid_credentials())
        }
        Err(e) => {
            error!("Password verification failed for user {}: {:?}", user.id, e);
            Ok(internal_error())
        }
    }
}

/// Clears the cookie and, when the caller is still signed in, their result.
pub async fn logout(
    req: HttpRequest,
    jwt_service: web::Data<JwtService>,
    store: web::Data<DiagnosisStore>,
) -> Result<HttpResponse> {
    if let Some(user_id) = session_user_id(&req, &jwt_service) {
        store.clear(user_id);
        info!("User {} logged out", user_id);
    }

    let mut removal = Cookie::new(TOKEN_COOKIE, "");
    removal.set_path("/");
    removal.make_removal();
    Ok(HttpResponse::Ok().cookie(removal).json(serde_json::json!({ "ok": true })))
}

pub async fn me(user: AuthenticatedUser, users: web::Data<UserRepository>) -> Result<HttpResponse> {
    match users.find_by_id(user.0).await {
        Ok(Some(found)) => {
            let info: shared::UserInfo = AuthUser::from(found).into();
            Ok(HttpResponse::Ok().json(info))
        }
        Ok(None) => {
            warn!("Token for deleted user {}", user.0);
            Ok(HttpResponse::Unauthorized().json(ErrorBody::new("User no longer exists")))
        }
        Err(e) => {
            error!("Failed to fetch user {}: {:?}", user.0, e);
            Ok(internal_error())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        for ok in ["a@b.co", "first.last@example.org", " padded@example.com "] {
            assert!(is_valid_email(ok), "{}", ok);
        }
        for bad in ["", "plain", "@example.com", "a@b", "a@@b.com", "a@.com", "a b@c.com", "a@b.com."] {
            assert!(!is_valid_email(bad), "{}", bad);
        }
    }

    #[test]
    fn test_signup_validation_lists_every_problem() {
        let details = validate_signup(&SignupRequest {
            email: "nope".into(),
            password: "123".into(),
            name: "A".into(),
        });
        assert_eq!(details.len(), 3);

        let ok = validate_signup(&SignupRequest {
            email: "ok@example.com".into(),
            password: "123456".into(),
            name: "Al".into(),
        });
        assert!(ok.is_empty());
    }
}
