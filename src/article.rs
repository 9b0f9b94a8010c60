use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArticleSeedError {
    #[error("Failed to read article seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid article seed file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Article {index} has an empty {field}")]
    Blank { index: usize, field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleCategory {
    Crops,
    Vegetables,
    Pests,
    Diseases,
    Techniques,
    Seasonal,
}

/// A published knowledge-base article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub id: u64,
    #[serde(flatten)]
    pub details: NewArticle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub category: ArticleCategory,
    #[serde(default)]
    pub popular_tags: Option<String>,
    /// Publication day; seeds without one are dated on load.
    #[serde(default = "today")]
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    /// URL of the cover image.
    pub image: String,
    pub description: String,
    /// Estimated reading time in minutes.
    pub total_mins: u32,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Reads a JSON array of articles used to populate the store at startup.
pub fn load_articles(path: &Path) -> Result<Vec<NewArticle>, ArticleSeedError> {
    let raw = fs::read_to_string(path)?;
    let articles: Vec<NewArticle> = serde_json::from_str(&raw)?;

    for (index, article) in articles.iter().enumerate() {
        for (field, value) in [
            ("title", &article.title),
            ("image", &article.image),
            ("description", &article.description),
        ] {
            if value.trim().is_empty() {
                return Err(ArticleSeedError::Blank { index, field });
            }
        }
    }

    tracing::info!("Loaded {} articles from {:?}", articles.len(), path);
    Ok(articles)
}
