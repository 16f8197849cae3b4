use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct NewBookDto {
    pub title: String,
    pub published_date: NaiveDate,
    pub image_url: Option<String>,
    pub description: String,
}

/// Partial update. `image_url`: None => not provided; Some(None) => clear; Some(Some(url)) => set
#[derive(Debug, Clone, Default)]
pub struct BookChangesDto {
    pub title: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub image_url: Option<Option<String>>,
    pub description: Option<String>,
}

impl BookChangesDto {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.published_date.is_none()
            && self.image_url.is_none()
            && self.description.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct BookFilterDto {
    pub title: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct BookPageDto {
    pub items: Vec<crate::domain::books::book::Book>,
    pub limit: i64,
    pub offset: i64,
}
