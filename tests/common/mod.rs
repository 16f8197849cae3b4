//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use bookshelf_api::application::dto::books::{BookChangesDto, BookFilterDto, NewBookDto};
use bookshelf_api::application::ports::book_repository::BookRepository;
use bookshelf_api::application::ports::health_repository::HealthRepository;
use bookshelf_api::bootstrap::app::{App, Phase, ServeError};
use bookshelf_api::bootstrap::app_context::AppServices;
use bookshelf_api::bootstrap::config::Config;
use bookshelf_api::domain::books::book::Book;

/// Health repository whose state can be flipped while the server runs.
#[derive(Default)]
pub struct SwitchableHealth {
    down: AtomicBool,
}

impl SwitchableHealth {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl HealthRepository for SwitchableHealth {
    async fn readiness(&self) -> anyhow::Result<()> {
        if self.down.load(Ordering::SeqCst) {
            anyhow::bail!("database unreachable");
        }
        Ok(())
    }
}

/// In-memory book store; `list` optionally sleeps to simulate a slow query.
#[derive(Default)]
pub struct MemoryBooks {
    books: Mutex<Vec<Book>>,
    list_delay: Option<Duration>,
}

impl MemoryBooks {
    pub fn with_list_delay(delay: Duration) -> Self {
        Self {
            list_delay: Some(delay),
            ..Default::default()
        }
    }
}

#[async_trait]
impl BookRepository for MemoryBooks {
    async fn list(&self, filter: &BookFilterDto) -> anyhow::Result<Vec<Book>> {
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        let needle = filter.title.as_deref().map(str::to_lowercase);
        Ok(self
            .books
            .lock()
            .unwrap()
            .iter()
            .filter(|b| {
                needle
                    .as_deref()
                    .is_none_or(|n| b.title.to_lowercase().contains(n))
            })
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Book>> {
        Ok(self.books.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn create(&self, book: &NewBookDto) -> anyhow::Result<Book> {
        let now = chrono::Utc::now();
        let created = Book {
            id: Uuid::new_v4(),
            title: book.title.clone(),
            published_date: book.published_date,
            image_url: book.image_url.clone(),
            description: book.description.clone(),
            created_at: now,
            updated_at: now,
        };
        self.books.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &BookChangesDto) -> anyhow::Result<Option<Book>> {
        let mut books = self.books.lock().unwrap();
        let Some(book) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            book.title = title.clone();
        }
        if let Some(date) = changes.published_date {
            book.published_date = date;
        }
        if let Some(url) = &changes.image_url {
            book.image_url = url.clone();
        }
        if let Some(description) = &changes.description {
            book.description = description.clone();
        }
        book.updated_at = chrono::Utc::now();
        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut books = self.books.lock().unwrap();
        let before = books.len();
        books.retain(|b| b.id != id);
        Ok(books.len() != before)
    }
}

pub fn test_config(idle_timeout_secs: u64) -> Config {
    Config {
        api_host: "127.0.0.1".into(),
        api_port: 0,
        idle_timeout_secs,
        write_timeout_secs: 30,
        ..Config::default()
    }
}

pub struct TestServer {
    pub base_url: String,
    pub phase: watch::Receiver<Phase>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ServeError>>,
}

impl TestServer {
    pub async fn start(
        cfg: Config,
        health: Arc<dyn HealthRepository>,
        books: Arc<dyn BookRepository>,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = App::from_services(cfg, AppServices::new(health, books));
        let phase = app.phase();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            app.serve(listener, "test", async move {
                let _ = rx.await;
            })
            .await
        });
        Self {
            base_url: format!("http://{addr}"),
            phase,
            shutdown: Some(tx),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Stands in for the OS interrupt.
    pub fn trigger_shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    pub async fn stopped(self) -> Result<(), ServeError> {
        self.handle.await.expect("serve task panicked")
    }
}

pub async fn wait_for_phase(phase: &mut watch::Receiver<Phase>, want: Phase) {
    tokio::time::timeout(Duration::from_secs(5), phase.wait_for(|p| *p == want))
        .await
        .expect("timed out waiting for lifecycle phase")
        .expect("phase channel closed");
}
