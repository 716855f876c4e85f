pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod routes;

/// Name of the HTTP-only cookie carrying the session JWT.
pub const TOKEN_COOKIE: &str = "token";
