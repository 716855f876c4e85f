use actix_web::web;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("hashing task failed: {0}")]
    Blocking(String),
}

/// bcrypt is deliberately slow, so both operations run on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, PasswordError> {
    web::block(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| PasswordError::Blocking(e.to_string()))?
        .map_err(PasswordError::from)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, PasswordError> {
    web::block(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| PasswordError::Blocking(e.to_string()))?
        .map_err(PasswordError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("hunter22".into(), 4).await.unwrap();
        assert_ne!(hash, "hunter22");
        assert!(hash.starts_with("$2"));
        assert!(verify_password("hunter22".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("hunter23".into(), hash).await.unwrap());
    }

    #[actix_web::test]
    async fn test_same_password_gets_distinct_salts() {
        let a = hash_password("leafy-green".into(), 4).await.unwrap();
        let b = hash_password("leafy-green".into(), 4).await.unwrap();
        assert_ne!(a, b);
    }

    #[actix_web::test]
    async fn test_garbage_hash_is_an_error() {
        assert!(verify_password("x".into(), "not-a-hash".into()).await.is_err());
    }
}
