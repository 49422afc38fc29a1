use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http, web, Error, HttpMessage, HttpRequest, HttpResponse,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use futures::future::{ok, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::CoreError;
use crate::identity::IdentityDirectory;
use crate::models::{Credential, User, UserRole};
use crate::store::DocumentStore;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub fn create_jwt(user_id: &str, secret: &str) -> Result<String, CoreError> {
    let expiration = Utc::now() + Duration::hours(24);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| CoreError::Internal(format!("token encode error: {}", e)))
}

fn verify_token(token: &str, secret: &str) -> Result<String, String> {
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    ) {
        Ok(token_data) => Ok(token_data.claims.sub),
        Err(e) => Err(format!("Token decode error: {}", e)),
    }
}

/// The authenticated principal injected by the bearer middleware.
pub fn current_user_id(req: &HttpRequest) -> Result<String, CoreError> {
    req.extensions()
        .get::<String>()
        .cloned()
        .ok_or(CoreError::Unauthorized)
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"))
}

fn validate_email(email: &str) -> Result<(), CoreError> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(CoreError::Validation("invalid email address".into()))
    }
}

// ─── BEARER MIDDLEWARE ────────────────────────────────────────────────────────

/// Decodes "Bearer <token>" and inserts the subject user id into the
/// request extensions. Requests without a header pass through
/// unauthenticated; handlers decide whether a principal is required.
#[derive(Debug)]
pub struct Authentication {
    secret: String,
}

impl Authentication {
    pub fn new(secret: impl Into<String>) -> Self {
        Authentication {
            secret: secret.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddleware {
            service,
            secret: self.secret.clone(),
        })
    }
}

pub struct AuthMiddleware<S> {
    service: S,
    secret: String,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
            if let Ok(auth_str) = auth_header.to_str() {
                if auth_str.starts_with("Bearer ") {
                    let token = auth_str.trim_start_matches("Bearer ").trim().to_string();
                    match verify_token(&token, &self.secret) {
                        Ok(user_id) => {
                            req.extensions_mut().insert(user_id);
                        }
                        Err(e) => {
                            let (req_parts, _payload) = req.into_parts();
                            let resp = HttpResponse::Unauthorized()
                                .body(format!("Invalid token: {}", e))
                                .map_into_boxed_body();
                            let srv_resp = ServiceResponse::new(req_parts, resp);
                            return Box::pin(async move { Ok(srv_resp) });
                        }
                    }
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

// ─── AUTH SERVICE ─────────────────────────────────────────────────────────────

/// Email+password identity provider: signup, login, logout, password
/// reset. Yields stable user ids and bearer tokens; everything else
/// about the account lives in the IdentityDirectory.
pub struct AuthService {
    store: Arc<dyn DocumentStore>,
    directory: Arc<IdentityDirectory>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        directory: Arc<IdentityDirectory>,
        jwt_secret: String,
    ) -> Self {
        AuthService {
            store,
            directory,
            jwt_secret,
        }
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: UserRole,
        username: Option<String>,
    ) -> Result<(String, User), CoreError> {
        let email = email.trim().to_lowercase();
        validate_email(&email)?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(CoreError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.store.find_credential_by_email(&email).await?.is_some() {
            return Err(CoreError::Validation("email already registered".into()));
        }

        let password_hash = hash(password, DEFAULT_COST)
            .map_err(|e| CoreError::Internal(format!("password hash error: {}", e)))?;

        let user = self
            .directory
            .create_user(&email, full_name, role, username)
            .await?;
        let credential = Credential {
            user_id: user.id.clone(),
            email,
            password_hash,
        };
        self.store.insert_credential(&credential).await?;

        let token = create_jwt(&user.id, &self.jwt_secret)?;
        info!("User signed up: {}", user.email);
        Ok((token, user))
    }

    /// Accepts an email or, when the identifier contains no '@', a
    /// username that is first resolved to its account email.
    pub async fn sign_in(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(String, User), CoreError> {
        let email = if identifier.contains('@') {
            identifier.trim().to_lowercase()
        } else {
            self.directory.find_by_username(identifier).await?.email
        };

        let credential = self
            .store
            .find_credential_by_email(&email)
            .await?
            .ok_or(CoreError::Unauthorized)?;
        if !verify(password, &credential.password_hash).unwrap_or(false) {
            return Err(CoreError::Unauthorized);
        }

        let user = self.directory.get_user(&credential.user_id).await?;
        let token = create_jwt(&user.id, &self.jwt_secret)?;
        info!("User signed in: {}", user.email);
        Ok((token, user))
    }

    /// Bearer tokens are stateless; logout only clears the stored
    /// device token so pushes stop reaching the signed-out device.
    pub async fn sign_out(&self, user_id: &str) -> Result<(), CoreError> {
        self.directory.set_fcm_token(user_id, None).await
    }

    /// Delivery of the reset email is an external concern; this only
    /// checks the account exists.
    pub async fn reset_password(&self, email: &str) -> Result<(), CoreError> {
        self.directory.find_by_email(email).await?;
        info!("Password reset requested for {}", email);
        Ok(())
    }
}

// ─── REQUEST PAYLOADS ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: UserRole,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

// ─── ENDPOINTS ────────────────────────────────────────────────────────────────

// POST /auth/signup
pub async fn signup(
    data: web::Data<AppState>,
    payload: web::Json<SignupRequest>,
) -> Result<HttpResponse, CoreError> {
    let payload = payload.into_inner();
    let (token, user) = data
        .auth
        .sign_up(
            &payload.email,
            &payload.password,
            &payload.full_name,
            payload.role,
            payload.username,
        )
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "token": token, "user": user })))
}

// POST /auth/login
pub async fn login(
    data: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, CoreError> {
    let (token, user) = data
        .auth
        .sign_in(&payload.identifier, &payload.password)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "token": token, "user": user })))
}

// POST /auth/logout
pub async fn logout(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    data.auth.sign_out(&current_user).await?;
    Ok(HttpResponse::Ok().finish())
}

// POST /auth/reset_password
pub async fn reset_password(
    data: web::Data<AppState>,
    payload: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, CoreError> {
    data.auth.reset_password(&payload.email).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "reset email sent" })))
}
