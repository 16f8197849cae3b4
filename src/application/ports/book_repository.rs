use async_trait::async_trait;
use uuid::Uuid;

use crate::application::dto::books::{BookChangesDto, BookFilterDto, NewBookDto};
use crate::domain::books::book::Book as DomainBook;

#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn list(&self, filter: &BookFilterDto) -> anyhow::Result<Vec<DomainBook>>;

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<DomainBook>>;

    async fn create(&self, book: &NewBookDto) -> anyhow::Result<DomainBook>;

    // Returns None if no book has this id
    async fn update(
        &self,
        id: Uuid,
        changes: &BookChangesDto,
    ) -> anyhow::Result<Option<DomainBook>>;

    // Returns false if nothing was deleted
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}
