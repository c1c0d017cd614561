use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts},
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::entities::user;
use crate::errors::ServiceError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CUSTOMER: &str = "customer";

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Role ("customer" or "admin")
    pub role: String,
    /// Token ID, unique per issued token
    pub jti: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

/// The authenticated principal, resolved once per request from the bearer
/// token and available to handlers as an extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub token_id: String,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_service = parts
            .extensions
            .get::<Arc<AuthService>>()
            .cloned()
            .ok_or_else(|| {
                ServiceError::InternalError("Authentication service not available".into())
            })?;

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("Missing authorization header".into()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| {
                ServiceError::Unauthorized("Authorization header must be a bearer token".into())
            })?;

        let claims = auth_service.validate_token(token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::AuthError("Token subject is not a valid user id".into()))?;

        Ok(AuthUser {
            user_id,
            name: claims.name,
            email: claims.email,
            role: claims.role,
            token_id: claims.jti,
        })
    }
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration: Duration,
    pub issuer: String,
    pub audience: String,
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            token_expiration: Duration::seconds(cfg.jwt_expiration as i64),
            issuer: cfg.auth_issuer.clone(),
            audience: cfg.auth_audience.clone(),
        }
    }
}

/// Issued token response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Issues and validates tokens, and owns credential checks against the
/// users table.
pub struct AuthService {
    config: AuthConfig,
    db: DbPool,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: DbPool) -> Self {
        Self { config, db }
    }

    /// Generate an access token for a user
    pub fn generate_token(&self, user: &user::Model) -> Result<AccessToken, ServiceError> {
        let now = Utc::now();
        let expires_at = now + self.config.token_expiration;

        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::AuthError(format!("Failed to generate token: {}", e)))?;

        Ok(AccessToken {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_expiration.num_seconds(),
        })
    }

    /// Validate a token and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ServiceError::Unauthorized("Token has expired".into())
            }
            _ => ServiceError::Unauthorized("Invalid token".into()),
        })?;

        Ok(token_data.claims)
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::InternalError(format!("Password hashing failed: {}", e)))
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        PasswordHash::new(password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Create a customer account. Emails are unique; registration never
    /// grants the admin role.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<user::Model, ServiceError> {
        request.validate()?;

        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(request.email.clone()))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "An account with this email already exists".into(),
            ));
        }

        let password_hash = self.hash_password(&request.password)?;

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            email: Set(request.email),
            password_hash: Set(password_hash),
            role: Set(ROLE_CUSTOMER.to_string()),
            active: Set(true),
            ..Default::default()
        };

        let saved = model.insert(&self.db).await?;
        info!(user_id = %saved.id, "user registered");
        Ok(saved)
    }

    /// Check credentials and issue a token. Wrong email and wrong password
    /// produce the same error.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AccessToken, ServiceError> {
        request.validate()?;

        let found = user::Entity::find()
            .filter(user::Column::Email.eq(request.email.clone()))
            .one(&self.db)
            .await?;

        let user = match found {
            Some(u) if u.active => u,
            _ => {
                warn!("login rejected");
                return Err(ServiceError::Unauthorized("Invalid credentials".into()));
            }
        };

        if !self.verify_password(&request.password, &user.password_hash) {
            warn!(user_id = %user.id, "login rejected");
            return Err(ServiceError::Unauthorized("Invalid credentials".into()));
        }

        self.generate_token(&user)
    }
}

/// Authentication routes
pub fn auth_routes() -> Router<Arc<AuthService>> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub(crate) async fn register_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(axum::http::StatusCode, Json<user::Model>), ServiceError> {
    let user = auth_service.register(request).await?;
    Ok((axum::http::StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = AccessToken),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub(crate) async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AccessToken>, ServiceError> {
    let token = auth_service.login(request).await?;
    Ok(Json(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit_test_secret_key_that_is_long_enough_42".into(),
            token_expiration: Duration::hours(1),
            issuer: "storefront-auth".into(),
            audience: "storefront-api".into(),
        }
    }

    fn test_user(role: &str) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            name: "Test User".into(),
            email: "test@example.com".into(),
            password_hash: String::new(),
            role: role.into(),
            active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    async fn service(config: AuthConfig) -> AuthService {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        AuthService::new(config, db)
    }

    #[tokio::test]
    async fn token_round_trip_preserves_claims() {
        let svc = service(test_config()).await;
        let user = test_user(ROLE_CUSTOMER);

        let token = svc.generate_token(&user).unwrap();
        let claims = svc.validate_token(&token.access_token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, ROLE_CUSTOMER);
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let svc = service(test_config()).await;
        let user = test_user(ROLE_ADMIN);

        let mut token = svc.generate_token(&user).unwrap().access_token;
        token.push('x');
        assert!(svc.validate_token(&token).is_err());
    }

    #[tokio::test]
    async fn wrong_audience_is_rejected() {
        let issuing = service(test_config()).await;
        let token = issuing
            .generate_token(&test_user(ROLE_CUSTOMER))
            .unwrap()
            .access_token;

        let mut other = test_config();
        other.audience = "some-other-service".into();
        let validating = service(other).await;
        assert!(validating.validate_token(&token).is_err());
    }

    #[tokio::test]
    async fn password_hash_verifies_and_rejects() {
        let svc = service(test_config()).await;
        let hash = svc.hash_password("hunter2hunter2").unwrap();
        assert!(svc.verify_password("hunter2hunter2", &hash));
        assert!(!svc.verify_password("wrong-password", &hash));
        assert!(!svc.verify_password("hunter2hunter2", "not-a-phc-string"));
    }

    #[test]
    fn admin_role_check() {
        let admin = AuthUser {
            user_id: Uuid::new_v4(),
            name: "Admin".into(),
            email: "admin@example.com".into(),
            role: ROLE_ADMIN.into(),
            token_id: Uuid::new_v4().to_string(),
        };
        assert!(admin.is_admin());
        assert!(!admin.has_role(ROLE_CUSTOMER));
    }
}
