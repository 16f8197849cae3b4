use std::sync::Arc;

use uuid::Uuid;

use crate::application::dto::books::{BookChangesDto, BookFilterDto, BookPageDto, NewBookDto};
use crate::application::ports::book_repository::BookRepository;
use crate::domain::books::book::Book as DomainBook;

pub const DEFAULT_PAGE_LIMIT: i64 = 30;
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const MAX_TITLE_CHARS: usize = 255;

#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct BookUseCase {
    repo: Arc<dyn BookRepository>,
}

impl BookUseCase {
    pub fn new(repo: Arc<dyn BookRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(
        &self,
        title: Option<String>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<BookPageDto, BookError> {
        let offset = offset.unwrap_or(0);
        if offset < 0 {
            return Err(BookError::Invalid("offset must not be negative".into()));
        }
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let filter = BookFilterDto {
            title,
            limit,
            offset,
        };
        let items = self.repo.list(&filter).await?;
        Ok(BookPageDto {
            items,
            limit,
            offset,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<DomainBook>, BookError> {
        Ok(self.repo.get_by_id(id).await?)
    }

    pub async fn create(&self, mut book: NewBookDto) -> Result<DomainBook, BookError> {
        book.title = normalize_title(&book.title)?;
        book.image_url = normalize_image_url(book.image_url)?;
        Ok(self.repo.create(&book).await?)
    }

    pub async fn update(
        &self,
        id: Uuid,
        mut changes: BookChangesDto,
    ) -> Result<Option<DomainBook>, BookError> {
        if changes.is_empty() {
            return Err(BookError::Invalid("no fields to update".into()));
        }
        if let Some(title) = changes.title.as_deref() {
            changes.title = Some(normalize_title(title)?);
        }
        if let Some(url) = changes.image_url.take() {
            changes.image_url = Some(normalize_image_url(url)?);
        }
        Ok(self.repo.update(id, &changes).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, BookError> {
        Ok(self.repo.delete(id).await?)
    }
}

fn normalize_title(title: &str) -> Result<String, BookError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(BookError::Invalid("title must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(BookError::Invalid(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

// Empty strings count as "no image"
fn normalize_image_url(url: Option<String>) -> Result<Option<String>, BookError> {
    let Some(url) = url else {
        return Ok(None);
    };
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(Some(trimmed.to_string()))
    } else {
        Err(BookError::Invalid(
            "image_url must be an http(s) URL".into(),
        ))
    }
}
