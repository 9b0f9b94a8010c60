use crate::{
    article::{Article, NewArticle},
    report::{NewReport, PlantHealthReport},
    scheme::{NewScheme, Scheme},
    storage::StoredImage,
};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

pub trait ReportStore: Send + Sync + 'static {
    /// Every report, newest first.
    fn list_reports(&self) -> Result<Vec<PlantHealthReport>, StoreError>;
    fn insert_report(
        &self,
        report: &NewReport,
        image: &StoredImage,
    ) -> Result<PlantHealthReport, StoreError>;
    fn count_reports(&self) -> Result<usize, StoreError>;
}

pub trait SchemeStore: Send + Sync + 'static {
    /// Every scheme, highest id first.
    fn list_schemes(&self) -> Result<Vec<Scheme>, StoreError>;
    fn get_scheme(&self, id: u64) -> Result<Option<Scheme>, StoreError>;
    fn insert_scheme(&self, scheme: NewScheme) -> Result<Scheme, StoreError>;
    fn count_schemes(&self) -> Result<usize, StoreError>;
}

pub trait ArticleStore: Send + Sync + 'static {
    /// Every article, latest date first.
    fn list_articles(&self) -> Result<Vec<Article>, StoreError>;
    fn get_article(&self, id: u64) -> Result<Option<Article>, StoreError>;
    fn insert_article(&self, article: NewArticle) -> Result<Article, StoreError>;
    fn count_articles(&self) -> Result<usize, StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    reports: Vec<PlantHealthReport>,
    schemes: Vec<Scheme>,
    articles: Vec<Article>,
    last_created_at: Option<DateTime<Utc>>,
}

/// Process-local store. Report timestamps strictly increase across inserts,
/// even when the clock does not advance between them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for MemoryStore {
    fn list_reports(&self) -> Result<Vec<PlantHealthReport>, StoreError> {
        let tables = self.tables.read();
        let mut reports = tables.reports.clone();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reports)
    }

    fn insert_report(
        &self,
        report: &NewReport,
        image: &StoredImage,
    ) -> Result<PlantHealthReport, StoreError> {
        let mut tables = self.tables.write();

        let now = Utc::now();
        let created_at = match tables.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        tables.last_created_at = Some(created_at);

        let stored = PlantHealthReport {
            id: tables.reports.len() as u64 + 1,
            image_url: image.url.clone(),
            health: report.health,
            confidence: report.confidence,
            issue: report.issue.clone().unwrap_or_default(),
            recommendation: report.recommendation.clone().unwrap_or_default(),
            created_at,
        };
        tables.reports.push(stored.clone());

        Ok(stored)
    }

    fn count_reports(&self) -> Result<usize, StoreError> {
        Ok(self.tables.read().reports.len())
    }
}

impl SchemeStore for MemoryStore {
    fn list_schemes(&self) -> Result<Vec<Scheme>, StoreError> {
        let mut schemes = self.tables.read().schemes.clone();
        schemes.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(schemes)
    }

    fn get_scheme(&self, id: u64) -> Result<Option<Scheme>, StoreError> {
        Ok(self
            .tables
            .read()
            .schemes
            .iter()
            .find(|scheme| scheme.id == id)
            .cloned())
    }

    fn insert_scheme(&self, details: NewScheme) -> Result<Scheme, StoreError> {
        let mut tables = self.tables.write();
        let scheme = Scheme {
            id: tables.schemes.len() as u64 + 1,
            details,
        };
        tables.schemes.push(scheme.clone());
        Ok(scheme)
    }

    fn count_schemes(&self) -> Result<usize, StoreError> {
        Ok(self.tables.read().schemes.len())
    }
}

impl ArticleStore for MemoryStore {
    fn list_articles(&self) -> Result<Vec<Article>, StoreError> {
        let mut articles = self.tables.read().articles.clone();
        articles.sort_by(|a, b| {
            b.details
                .date
                .cmp(&a.details.date)
                .then(b.id.cmp(&a.id))
        });
        Ok(articles)
    }

    fn get_article(&self, id: u64) -> Result<Option<Article>, StoreError> {
        Ok(self
            .tables
            .read()
            .articles
            .iter()
            .find(|article| article.id == id)
            .cloned())
    }

    fn insert_article(&self, details: NewArticle) -> Result<Article, StoreError> {
        let mut tables = self.tables.write();
        let article = Article {
            id: tables.articles.len() as u64 + 1,
            details,
        };
        tables.articles.push(article.clone());
        Ok(article)
    }

    fn count_articles(&self) -> Result<usize, StoreError> {
        Ok(self.tables.read().articles.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::tests::new_article;
    use crate::report::{HealthStatus, UploadedImage};
    use crate::scheme::tests::valid_input;
    use std::path::PathBuf;

    fn new_report(health: HealthStatus) -> NewReport {
        NewReport {
            image: UploadedImage {
                file_name: "leaf.png".to_string(),
                content: vec![0],
            },
            health,
            confidence: 50.0,
            issue: None,
            recommendation: Some("Water regularly.".to_string()),
        }
    }

    fn image(n: usize) -> StoredImage {
        StoredImage {
            path: PathBuf::from(format!("/tmp/leaf{}.png", n)),
            url: format!("/media/plant_images/leaf{}.png", n),
        }
    }

    #[test]
    fn test_reports_listed_newest_first_with_strict_order() {
        let store = MemoryStore::new();
        for n in 0..50 {
            store
                .insert_report(&new_report(HealthStatus::Disease), &image(n))
                .unwrap();
        }

        let reports = store.list_reports().unwrap();
        assert_eq!(reports.len(), 50);
        assert_eq!(reports[0].id, 50);
        assert_eq!(reports[0].image_url, "/media/plant_images/leaf49.png");
        for pair in reports.windows(2) {
            assert!(pair[0].created_at > pair[1].created_at);
        }
        assert_eq!(store.count_reports().unwrap(), 50);
    }

    #[test]
    fn test_missing_optional_text_is_stored_empty() {
        let store = MemoryStore::new();
        let report = store
            .insert_report(&new_report(HealthStatus::Healthy), &image(0))
            .unwrap();
        assert_eq!(report.issue, "");
        assert_eq!(report.recommendation, "Water regularly.");
        assert_eq!(report.health, HealthStatus::Healthy);
    }

    #[test]
    fn test_schemes() {
        let store = MemoryStore::new();
        let first = store
            .insert_scheme(valid_input().validate().unwrap())
            .unwrap();
        let second = store
            .insert_scheme(valid_input().validate().unwrap())
            .unwrap();

        let ids: Vec<u64> = store.list_schemes().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(store.get_scheme(first.id).unwrap(), Some(first));
        assert_eq!(store.get_scheme(99).unwrap(), None);
        assert_eq!(store.count_schemes().unwrap(), 2);
    }

    #[test]
    fn test_articles_listed_by_date_then_id() {
        let store = MemoryStore::new();
        let old = store
            .insert_article(new_article("Crop rotation", "2024-11-02"))
            .unwrap();
        let first = store
            .insert_article(new_article("Leaf curl", "2025-03-15"))
            .unwrap();
        let second = store
            .insert_article(new_article("Late blight", "2025-03-15"))
            .unwrap();

        let ids: Vec<u64> = store.list_articles().unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![second.id, first.id, old.id]);
        assert_eq!(store.get_article(old.id).unwrap(), Some(old));
        assert_eq!(store.get_article(42).unwrap(), None);
        assert_eq!(store.count_articles().unwrap(), 3);
    }
}
