use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Settings;
use crate::database::models::{CreateUserRequest, NewUser, TokenResponse, User};
use crate::database::{StoreError, UserStore};
use crate::services::{ServiceError, ServiceResult};
use crate::utils::password::{
    hash_password, is_valid_email, validate_password_strength, verify_password,
};

pub const CREDENTIALS_ERROR: &str = "Could not validate credentials";
const LOGIN_ERROR: &str = "Incorrect username or password";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued at
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_lifetime_minutes: i64,
    pub bcrypt_cost: u32,
}

impl From<&Settings> for AuthConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            jwt_secret: settings.secret_key.clone(),
            token_lifetime_minutes: settings.access_token_expire_minutes,
            bcrypt_cost: settings.bcrypt_cost,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    config: Arc<AuthConfig>,
    users: Arc<dyn UserStore>,
}

impl AuthService {
    pub fn new(config: AuthConfig, users: Arc<dyn UserStore>) -> Self {
        Self {
            config: Arc::new(config),
            users,
        }
    }

    /// Generate JWT token for user
    pub fn generate_token(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.config.token_lifetime_minutes);

        let claims = Claims {
            sub: user.id.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(self.config.jwt_secret.as_ref());

        encode(&header, &claims, &key)
    }

    /// Verify JWT token and extract claims
    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let key = DecodingKey::from_secret(self.config.jwt_secret.as_ref());
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(token, &key, &validation)?;
        Ok(token_data.claims)
    }

    /// Validate and store a new account
    pub async fn register(&self, request: CreateUserRequest) -> ServiceResult<User> {
        let email = request.email.trim().to_lowercase();
        let username = request.username.trim().to_string();

        if !is_valid_email(&email) {
            return Err(ServiceError::Validation(
                "value is not a valid email address".to_string(),
            ));
        }
        if username.is_empty() {
            return Err(ServiceError::Validation(
                "Username must not be empty".to_string(),
            ));
        }
        validate_password_strength(&request.password).map_err(ServiceError::Validation)?;

        if self.users.get_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }
        if self.users.get_user_by_username(&username).await?.is_some() {
            return Err(ServiceError::Conflict("Username already taken".to_string()));
        }

        let hashed_password = hash_password(&request.password, self.config.bcrypt_cost)
            .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {}", e)))?;

        let user = self
            .users
            .create_user(NewUser {
                email,
                username,
                hashed_password,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration
                StoreError::Conflict(_) => {
                    ServiceError::Conflict("Email already registered".to_string())
                }
                other => other.into(),
            })?;

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Check credentials; `login` may be a username or an email address
    pub async fn authenticate(&self, login: &str, password: &str) -> ServiceResult<User> {
        let login = login.trim();
        let user = match self.users.get_user_by_username(login).await? {
            Some(user) => Some(user),
            None => self.users.get_user_by_email(&login.to_lowercase()).await?,
        };

        let Some(user) = user else {
            return Err(ServiceError::InvalidCredentials(LOGIN_ERROR.to_string()));
        };

        let matches = verify_password(password, &user.hashed_password).unwrap_or(false);
        if !matches {
            return Err(ServiceError::InvalidCredentials(LOGIN_ERROR.to_string()));
        }
        if !user.is_active {
            return Err(ServiceError::Unauthorized("Inactive user".to_string()));
        }

        Ok(user)
    }

    pub async fn login(&self, login: &str, password: &str) -> ServiceResult<TokenResponse> {
        let user = self.authenticate(login, password).await?;
        let access_token = self
            .generate_token(&user)
            .map_err(|e| ServiceError::Internal(format!("Failed to generate token: {}", e)))?;

        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Resolve a bearer token to an active user
    pub async fn get_user_by_token(&self, token: &str) -> ServiceResult<User> {
        let claims = self
            .verify_token(token)
            .map_err(|_| ServiceError::Unauthorized(CREDENTIALS_ERROR.to_string()))?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized(CREDENTIALS_ERROR.to_string()))?;

        let user = self
            .users
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("User not found".to_string()))?;

        if !user.is_active {
            return Err(ServiceError::Unauthorized("Inactive user".to_string()));
        }

        Ok(user)
    }
}
