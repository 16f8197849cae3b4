use std::sync::Arc;

use crate::application::ports::book_repository::BookRepository;
use crate::application::ports::health_repository::HealthRepository;
use crate::application::use_cases::books::BookUseCase;
use crate::application::use_cases::health::HealthUseCase;
use crate::bootstrap::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

/// One use case per domain, each wrapping exactly one repository.
pub struct AppServices {
    health_uc: Arc<HealthUseCase>,
    book_uc: Arc<BookUseCase>,
}

impl AppServices {
    pub fn new(
        health_repo: Arc<dyn HealthRepository>,
        book_repo: Arc<dyn BookRepository>,
    ) -> Self {
        Self {
            health_uc: Arc::new(HealthUseCase::new(health_repo)),
            book_uc: Arc::new(BookUseCase::new(book_repo)),
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn health_uc(&self) -> Arc<HealthUseCase> {
        self.services.health_uc.clone()
    }

    pub fn book_uc(&self) -> Arc<BookUseCase> {
        self.services.book_uc.clone()
    }
}
