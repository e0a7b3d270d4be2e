use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use dsn_core::{Article, DateSummary};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::dashboard::render_dashboard;
use crate::AppState;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(#[from] dsn_core::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(e) => {
                error!("Request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct ArticleList {
    pub success: bool,
    pub date: Option<NaiveDate>,
    pub articles: Vec<Article>,
    pub total: usize,
}

impl ArticleList {
    fn new(date: Option<NaiveDate>, articles: Vec<Article>) -> Self {
        Self {
            success: true,
            date,
            total: articles.len(),
            articles,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArticleDetail {
    pub success: bool,
    pub article: Article,
}

#[derive(Debug, Serialize)]
pub struct DateList {
    pub success: bool,
    pub dates: Vec<DateSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct Status {
    pub server_status: &'static str,
    pub current_date: Option<NaiveDate>,
    pub total_articles: usize,
    pub last_collection: Option<chrono::DateTime<Utc>>,
    pub dates: usize,
    pub timestamp: chrono::DateTime<Utc>,
}

pub async fn dashboard(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let latest = state.storage.load_latest().await?;
    let dates = state.storage.list_dates().await?;
    Ok(Html(render_dashboard(latest.as_ref(), &dates)))
}

pub async fn list_articles(State(state): State<Arc<AppState>>) -> ApiResult<Json<ArticleList>> {
    let list = match state.storage.load_latest().await? {
        Some(doc) => ArticleList::new(Some(doc.date), doc.articles),
        None => ArticleList::new(None, Vec::new()),
    };
    Ok(Json(list))
}

pub async fn articles_by_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> ApiResult<Json<ArticleList>> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date {}, expected YYYY-MM-DD", date)))?;
    let doc = state
        .storage
        .load_daily(date)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No articles for {}", date)))?;
    Ok(Json(ArticleList::new(Some(doc.date), doc.articles)))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ArticleDetail>> {
    let article = state
        .storage
        .find_article(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Article {} not found", id)))?;
    Ok(Json(ArticleDetail {
        success: true,
        article,
    }))
}

pub async fn list_dates(State(state): State<Arc<AppState>>) -> ApiResult<Json<DateList>> {
    let dates = state.storage.list_dates().await?;
    info!("Listing {} dates", dates.len());
    Ok(Json(DateList {
        success: true,
        total: dates.len(),
        dates,
    }))
}

pub async fn status(State(state): State<Arc<AppState>>) -> ApiResult<Json<Status>> {
    let latest = state.storage.load_latest().await?;
    let dates = state.storage.list_dates().await?;

    let (current_date, total_articles, last_collection) = match &latest {
        Some(doc) => (
            Some(doc.date),
            doc.articles.len(),
            doc.articles.iter().filter_map(|a| a.collected_at).max(),
        ),
        None => (None, 0, None),
    };

    Ok(Json(Status {
        server_status: "online",
        current_date,
        total_articles,
        last_collection,
        dates: dates.len(),
        timestamp: Utc::now(),
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
