pub mod book_repository_sqlx;
pub mod health_repository_sqlx;
