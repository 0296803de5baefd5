use crate::core::{is_valid_document, normalize_document, DocumentKind};
use crate::models::{
    AccountKind, AccountSummary, AuthResponse, LoginRequest, RegisterCompanyRequest,
    RegisterUserRequest,
};
use crate::routes::{ApiError, AppState};
use crate::services::{
    normalize_postal_code, Claims, CredentialService, NewCompanyAccount, NewUser,
};
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest, HttpResponse};
use std::future::{ready, Ready};
use std::sync::Arc;
use validator::Validate;

/// Configure account routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/register/user", web::post().to(register_user))
        .route("/auth/register/company", web::post().to(register_company))
        .route("/auth/login", web::post().to(login));
}

/// Caller identity taken from a bearer token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub email: String,
    pub kind: AccountKind,
    pub company_id: Option<i64>,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            kind: claims.kind,
            company_id: claims.company_id,
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, ApiError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Authorization header must use the Bearer scheme".to_string())
        })
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("Application state missing".to_string()))?;

    let token = bearer_token(req)?;
    let claims = state.credentials.validate_token(token)?;

    Ok(claims.into())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Register an individual account
///
/// POST /api/v1/auth/register/user
async fn register_user(
    state: web::Data<AppState>,
    req: web::Json<RegisterUserRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let cpf = normalize_document(&req.cpf);
    if !is_valid_document(&cpf, DocumentKind::Pf) {
        return Err(ApiError::BadRequest("Invalid CPF".to_string()));
    }

    let email = normalize_email(&req.email);
    if state.postgres.account_exists(&email, &cpf).await? {
        return Err(ApiError::Conflict("Account already exists".to_string()));
    }

    let password_hash = hash_password(&state.credentials, &req.password).await?;
    let user = state
        .postgres
        .create_user(&NewUser {
            email,
            password_hash,
            full_name: req.full_name.trim().to_string(),
            document: cpf,
            phone: non_blank(&req.phone),
        })
        .await?;

    let token = state
        .credentials
        .issue_token(user.id, &user.email, AccountKind::User, None)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        message: "User registered successfully".to_string(),
        token,
        user: AccountSummary {
            id: user.id,
            email: user.email,
            name: user.full_name,
            kind: AccountKind::User,
            company_id: None,
        },
    }))
}

/// Register a company owner and the company profile
///
/// POST /api/v1/auth/register/company
///
/// A postal code that the directory cannot resolve still registers the
/// company, without a coordinate.
async fn register_company(
    state: web::Data<AppState>,
    req: web::Json<RegisterCompanyRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let cnpj = normalize_document(&req.cnpj);
    if !is_valid_document(&cnpj, DocumentKind::Pj) {
        return Err(ApiError::BadRequest("Invalid CNPJ".to_string()));
    }

    let postal_code = non_blank(&req.postal_code)
        .map(|raw| normalize_postal_code(&raw))
        .transpose()?;

    let email = normalize_email(&req.email);
    if state.postgres.account_exists(&email, &cnpj).await? {
        return Err(ApiError::Conflict("Account already exists".to_string()));
    }

    let location = match &postal_code {
        Some(cep) => match state.geocoder.resolve(cep).await {
            Ok(location) => Some(location),
            Err(e) if e.is_recoverable() => {
                tracing::warn!("Registering company without location: {}", e);
                None
            }
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    let password_hash = hash_password(&state.credentials, &req.password).await?;
    let company_name = req.company_name.trim().to_string();

    let (user, company_id) = state
        .postgres
        .create_company_account(&NewCompanyAccount {
            owner: NewUser {
                email,
                password_hash,
                full_name: company_name.clone(),
                document: cnpj,
                phone: non_blank(&req.phone),
            },
            company_name,
            whatsapp: non_blank(&req.whatsapp),
            category: non_blank(&req.category),
            postal_code,
            location,
        })
        .await?;

    let token = state.credentials.issue_token(
        user.id,
        &user.email,
        AccountKind::Company,
        Some(company_id),
    )?;

    Ok(HttpResponse::Created().json(AuthResponse {
        message: "Company registered successfully".to_string(),
        token,
        user: AccountSummary {
            id: user.id,
            email: user.email,
            name: user.full_name,
            kind: AccountKind::Company,
            company_id: Some(company_id),
        },
    }))
}

/// Exchange email and password for a session token
///
/// POST /api/v1/auth/login
async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = state
        .postgres
        .find_user_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(invalid());
    }
    if !verify_password(&state.credentials, &req.password, &user.password_hash).await? {
        return Err(invalid());
    }

    let company_id = state.postgres.company_id_for_user(user.id).await?;
    let kind = if company_id.is_some() {
        AccountKind::Company
    } else {
        AccountKind::User
    };

    let token = state
        .credentials
        .issue_token(user.id, &user.email, kind, company_id)?;

    tracing::info!("Login for account {}", user.id);

    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: AccountSummary {
            id: user.id,
            email: user.email,
            name: user.full_name,
            kind,
            company_id,
        },
    }))
}

// Argon2 work runs on the blocking pool, not the async workers
async fn hash_password(
    credentials: &Arc<CredentialService>,
    password: &str,
) -> Result<String, ApiError> {
    let credentials = Arc::clone(credentials);
    let password = password.to_string();
    Ok(web::block(move || credentials.hash_password(&password)).await??)
}

async fn verify_password(
    credentials: &Arc<CredentialService>,
    password: &str,
    hash: &str,
) -> Result<bool, ApiError> {
    let credentials = Arc::clone(credentials);
    let (password, hash) = (password.to_string(), hash.to_string());
    Ok(web::block(move || credentials.verify_password(&password, &hash)).await?)
}
