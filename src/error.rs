use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Already drawn today")]
    AlreadyDrawnToday,

    #[error("Insufficient tickets")]
    InsufficientTickets,

    #[error("Badge catalog misconfigured: {0}")]
    CatalogMisconfigured(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// 调用方可恢复的业务拒绝（明天再来 / 获得券后再试），不产生任何状态变更
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::AlreadyDrawnToday | AppError::InsufficientTickets
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::AlreadyDrawnToday | AppError::InsufficientTickets => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                ("VALIDATION_ERROR", msg.clone())
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                ("AUTH_ERROR", msg.clone())
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                ("AUTH_ERROR", "Invalid access token".to_string())
            }
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                ("FORBIDDEN", "Forbidden".to_string())
            }
            AppError::AlreadyDrawnToday => {
                log::warn!("Daily draw refused: already drawn today");
                (
                    "ALREADY_DRAWN_TODAY",
                    "Daily draw already used today".to_string(),
                )
            }
            AppError::InsufficientTickets => {
                log::warn!("Ticket draw refused: insufficient tickets");
                ("INSUFFICIENT_TICKETS", "Not enough tickets".to_string())
            }
            AppError::CatalogMisconfigured(msg) => {
                log::error!("Badge catalog misconfigured: {msg}");
                (
                    "CATALOG_MISCONFIGURED",
                    "Badge catalog misconfigured".to_string(),
                )
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                ("DATABASE_ERROR", "Database error".to_string())
            }
            _ => {
                log::error!("Internal error: {self}");
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}
