pub mod book_repository;
pub mod health_repository;
