use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::dto::books::{BookChangesDto, BookFilterDto, NewBookDto};
use crate::application::ports::book_repository::BookRepository;
use crate::domain::books::book::Book as DomainBook;
use crate::infrastructure::db::PgPool;

const BOOK_COLUMNS: &str =
    "id, title, published_date, image_url, description, created_at, updated_at";

pub struct SqlxBookRepository {
    pub pool: PgPool,
}

impl SqlxBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: PgRow) -> DomainBook {
    DomainBook {
        id: r.get("id"),
        title: r.get("title"),
        published_date: r.get("published_date"),
        image_url: r.get("image_url"),
        description: r.get("description"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

// Makes `%`, `_` and `\` match literally inside an `ESCAPE '\'` pattern
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl BookRepository for SqlxBookRepository {
    async fn list(&self, filter: &BookFilterDto) -> anyhow::Result<Vec<DomainBook>> {
        let rows = if let Some(title) = filter.title.as_deref() {
            let like = format!("%{}%", escape_like(title));
            sqlx::query(&format!(
                r#"SELECT {BOOK_COLUMNS} FROM books
                   WHERE title ILIKE $1 ESCAPE '\'
                   ORDER BY created_at DESC, id ASC
                   LIMIT $2 OFFSET $3"#
            ))
            .bind(like)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(&format!(
                r#"SELECT {BOOK_COLUMNS} FROM books
                   ORDER BY created_at DESC, id ASC
                   LIMIT $1 OFFSET $2"#
            ))
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows.into_iter().map(map_row).collect())
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<DomainBook>> {
        let row = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_row))
    }

    async fn create(&self, book: &NewBookDto) -> anyhow::Result<DomainBook> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO books (id, title, published_date, image_url, description)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {BOOK_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(&book.title)
        .bind(book.published_date)
        .bind(book.image_url.as_deref())
        .bind(&book.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_row(row))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &BookChangesDto,
    ) -> anyhow::Result<Option<DomainBook>> {
        // $4 flags whether image_url was provided at all; $5 may then be NULL to clear it
        let row = sqlx::query(&format!(
            r#"UPDATE books SET
                    title = COALESCE($1, title),
                    published_date = COALESCE($2, published_date),
                    description = COALESCE($3, description),
                    image_url = CASE WHEN $4 THEN $5 ELSE image_url END,
                    updated_at = now()
                WHERE id = $6
                RETURNING {BOOK_COLUMNS}"#
        ))
        .bind(changes.title.as_deref())
        .bind(changes.published_date)
        .bind(changes.description.as_deref())
        .bind(changes.image_url.is_some())
        .bind(changes.image_url.clone().flatten())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(map_row))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
