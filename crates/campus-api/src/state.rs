//! Application state.

use campus_config::SiteConfig;
use campus_db::{
    BannerRepo, CurriculumRepo, EnrollmentRepo, FacilityRepo, NewsRepo, PgBannerRepo,
    PgCurriculumRepo, PgEnrollmentRepo, PgFacilityRepo, PgNewsRepo, PgSearchRepo, PgUnitRepo,
    SearchRepo, UnitRepo,
};
use campus_storage::MediaLibrary;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<SiteConfig>,
    pub media: MediaLibrary,
    pub banner_repo: Arc<dyn BannerRepo>,
    pub curriculum_repo: Arc<dyn CurriculumRepo>,
    pub news_repo: Arc<dyn NewsRepo>,
    pub unit_repo: Arc<dyn UnitRepo>,
    pub facility_repo: Arc<dyn FacilityRepo>,
    pub enrollment_repo: Arc<dyn EnrollmentRepo>,
    pub search_repo: Arc<dyn SearchRepo>,
    /// Held while a crawl runs so cron calls never overlap.
    pub crawl_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pool: PgPool, config: SiteConfig, media: MediaLibrary) -> Self {
        Self {
            banner_repo: Arc::new(PgBannerRepo::new(pool.clone())),
            curriculum_repo: Arc::new(PgCurriculumRepo::new(pool.clone())),
            news_repo: Arc::new(PgNewsRepo::new(pool.clone())),
            unit_repo: Arc::new(PgUnitRepo::new(pool.clone())),
            facility_repo: Arc::new(PgFacilityRepo::new(pool.clone())),
            enrollment_repo: Arc::new(PgEnrollmentRepo::new(pool.clone())),
            search_repo: Arc::new(PgSearchRepo::new(pool.clone())),
            crawl_lock: Arc::new(Mutex::new(())),
            config: Arc::new(config),
            media,
            pool,
        }
    }
}
