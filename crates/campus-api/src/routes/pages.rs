//! Public site pages rendered from templates.

use std::collections::HashMap;

use askama::Template;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use campus_core::{Carousel, ResourceId};
use campus_db::DbError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;

pub const NEWS_PER_PAGE: u32 = 9;
pub const HOME_NEWS: i64 = 3;
pub const SEARCH_LIMIT: i64 = 20;
const SNIPPET_CHARS: usize = 220;

// ============================================================================
// Template structs
// ============================================================================

#[derive(Template)]
#[template(path = "pages/home.html")]
struct HomeTemplate {
    site_name: String,
    slides: Vec<SlideView>,
    start_position: usize,
    news: Vec<NewsCard>,
    units: Vec<UnitCard>,
}

#[derive(Template)]
#[template(path = "pages/curriculum/list.html")]
struct CurriculumListTemplate {
    site_name: String,
    curricula: Vec<CurriculumView>,
}

#[derive(Template)]
#[template(path = "pages/curriculum/detail.html")]
struct CurriculumDetailTemplate {
    site_name: String,
    curriculum: CurriculumView,
}

#[derive(Template)]
#[template(path = "pages/news/list.html")]
struct NewsListTemplate {
    site_name: String,
    news: Vec<NewsCard>,
    pagination: Pagination,
}

#[derive(Template)]
#[template(path = "pages/news/detail.html")]
struct NewsDetailTemplate {
    site_name: String,
    post: NewsCard,
    body: String,
    slides: Vec<SlideView>,
    start_position: usize,
}

#[derive(Template)]
#[template(path = "pages/units/list.html")]
struct UnitListTemplate {
    site_name: String,
    units: Vec<UnitCard>,
}

#[derive(Template)]
#[template(path = "pages/units/detail.html")]
struct UnitDetailTemplate {
    site_name: String,
    unit: UnitCard,
    description: String,
    phone: String,
    email: String,
    map_url: String,
    facilities: Vec<FacilityView>,
}

#[derive(Template)]
#[template(path = "pages/enrollment.html")]
struct EnrollmentTemplate {
    site_name: String,
    headline: String,
    body: String,
    contact_email: String,
    is_open: bool,
}

#[derive(Template)]
#[template(path = "pages/search.html")]
struct SearchTemplate {
    site_name: String,
    query: String,
    results: Vec<SearchResultView>,
}

#[derive(Template)]
#[template(path = "pages/error.html")]
struct ErrorTemplate {
    status: u16,
    title: &'static str,
    message: &'static str,
}

// ============================================================================
// View models
// ============================================================================

/// One rendered carousel slide. Clones repeat an edge slide for looping.
#[derive(Debug, Clone, PartialEq)]
struct SlideView {
    position: usize,
    index: usize,
    is_clone: bool,
    title: String,
    subtitle: String,
    link_url: String,
    image_url: String,
}

struct NewsCard {
    slug: String,
    title: String,
    excerpt: String,
    published: String,
    cover_url: String,
}

struct CurriculumView {
    slug: String,
    title: String,
    summary: String,
    body: String,
    cover_url: String,
}

struct UnitCard {
    slug: String,
    name: String,
    address: String,
}

struct FacilityView {
    name: String,
    description: String,
    slides: Vec<SlideView>,
    start_position: usize,
}

struct SearchResultView {
    url: String,
    title: String,
    snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pagination {
    page: u32,
    total_pages: u32,
    prev: Option<u32>,
    next: Option<u32>,
}

impl Pagination {
    fn new(requested: Option<u32>, total_items: i64, per_page: u32) -> Self {
        let per_page = per_page.max(1) as i64;
        let total_pages = ((total_items.max(0) + per_page - 1) / per_page).max(1);
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);
        let page = requested.unwrap_or(1).clamp(1, total_pages);
        Self {
            page,
            total_pages,
            prev: (page > 1).then(|| page - 1),
            next: (page < total_pages).then(|| page + 1),
        }
    }

    fn offset(&self, per_page: u32) -> i64 {
        (self.page as i64 - 1) * per_page as i64
    }
}

// ============================================================================
// Routes
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home_page))
        .route("/curriculum", get(curriculum_list_page))
        .route("/curriculum/{slug}", get(curriculum_detail_page))
        .route("/news", get(news_list_page))
        .route("/news/{slug}", get(news_detail_page))
        .route("/units", get(unit_list_page))
        .route("/units/{slug}", get(unit_detail_page))
        .route("/enrollment", get(enrollment_page))
        .route("/search", get(search_page))
}

/// Error page for public routes.
#[derive(Debug)]
pub enum PageError {
    NotFound,
    Internal(String),
}

impl From<DbError> for PageError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(_) => PageError::NotFound,
            other => PageError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, title, message) = match self {
            PageError::NotFound => (
                StatusCode::NOT_FOUND,
                "Página não encontrada",
                "O endereço que você procura não existe ou foi removido.",
            ),
            PageError::Internal(err) => {
                tracing::error!(error = %err, "Page render failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erro inesperado",
                    "Não foi possível carregar esta página. Tente novamente em instantes.",
                )
            }
        };
        let template = ErrorTemplate {
            status: status.as_u16(),
            title,
            message,
        };
        match template.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(_) => (status, title).into_response(),
        }
    }
}

pub async fn not_found() -> PageError {
    PageError::NotFound
}

fn render(template: &impl Template) -> Result<Html<String>, PageError> {
    template
        .render()
        .map(Html)
        .map_err(|e| PageError::Internal(format!("template error: {}", e)))
}

// ============================================================================
// Page handlers
// ============================================================================

async fn home_page(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let banners = state.banner_repo.list_active().await?;
    let (slides, start_position) = carousel_slides(
        banners
            .into_iter()
            .map(|b| SlideView {
                position: 0,
                index: 0,
                is_clone: false,
                title: b.title,
                subtitle: b.subtitle.unwrap_or_default(),
                link_url: b.link_url.unwrap_or_default(),
                image_url: b.image_url,
            })
            .collect(),
    );

    let news = news_cards(&state, state.news_repo.list_published(HOME_NEWS, 0).await?).await?;
    let units = state
        .unit_repo
        .list()
        .await?
        .into_iter()
        .map(unit_card)
        .collect();

    render(&HomeTemplate {
        site_name: state.config.name.clone(),
        slides,
        start_position,
        news,
        units,
    })
}

async fn curriculum_list_page(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let curricula = state
        .curriculum_repo
        .list()
        .await?
        .into_iter()
        .map(curriculum_view)
        .collect();
    render(&CurriculumListTemplate {
        site_name: state.config.name.clone(),
        curricula,
    })
}

async fn curriculum_detail_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, PageError> {
    let curriculum = state.curriculum_repo.get_by_slug(&slug).await?;
    render(&CurriculumDetailTemplate {
        site_name: state.config.name.clone(),
        curriculum: curriculum_view(curriculum),
    })
}

#[derive(Debug, Deserialize)]
struct NewsQuery {
    /// Kept as text so a malformed page falls back to the first one.
    page: Option<String>,
}

async fn news_list_page(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Html<String>, PageError> {
    let total = state.news_repo.count_published().await?;
    let requested = query.page.and_then(|p| p.trim().parse().ok());
    let pagination = Pagination::new(requested, total, NEWS_PER_PAGE);

    let posts = state
        .news_repo
        .list_published(NEWS_PER_PAGE as i64, pagination.offset(NEWS_PER_PAGE))
        .await?;
    let news = news_cards(&state, posts).await?;

    render(&NewsListTemplate {
        site_name: state.config.name.clone(),
        news,
        pagination,
    })
}

async fn news_detail_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, PageError> {
    let post = state.news_repo.get_by_slug(&slug).await?;
    let images = state
        .news_repo
        .list_images(ResourceId::from_uuid(post.id))
        .await?;

    let (slides, start_position) = carousel_slides(
        images
            .iter()
            .map(|image| image_slide(&post.title, &image.url))
            .collect(),
    );
    let body = post.body.clone();
    let card = NewsCard {
        cover_url: images.first().map(|i| i.url.clone()).unwrap_or_default(),
        slug: post.slug,
        title: post.title,
        excerpt: post.excerpt,
        published: format_date(post.published_at),
    };

    render(&NewsDetailTemplate {
        site_name: state.config.name.clone(),
        post: card,
        body,
        slides,
        start_position,
    })
}

async fn unit_list_page(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let units = state
        .unit_repo
        .list()
        .await?
        .into_iter()
        .map(unit_card)
        .collect();
    render(&UnitListTemplate {
        site_name: state.config.name.clone(),
        units,
    })
}

async fn unit_detail_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, PageError> {
    let unit = state.unit_repo.get_by_slug(&slug).await?;
    let unit_id = ResourceId::from_uuid(unit.id);
    let facilities = state.facility_repo.list_by_unit(unit_id).await?;
    let images = state.facility_repo.list_images_for_unit(unit_id).await?;

    let facilities = facilities
        .into_iter()
        .map(|facility| {
            let (slides, start_position) = carousel_slides(
                images
                    .iter()
                    .filter(|image| image.facility_id == facility.id)
                    .map(|image| image_slide(&facility.name, &image.url))
                    .collect(),
            );
            FacilityView {
                name: facility.name,
                description: facility.description,
                slides,
                start_position,
            }
        })
        .collect();

    render(&UnitDetailTemplate {
        site_name: state.config.name.clone(),
        description: unit.description.clone(),
        phone: unit.phone.clone().unwrap_or_default(),
        email: unit.email.clone().unwrap_or_default(),
        map_url: unit.map_url.clone().unwrap_or_default(),
        unit: unit_card(unit),
        facilities,
    })
}

async fn enrollment_page(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let enrollment = state.enrollment_repo.get().await?;
    render(&EnrollmentTemplate {
        site_name: state.config.name.clone(),
        headline: enrollment.headline,
        body: enrollment.body,
        contact_email: enrollment.contact_email.unwrap_or_default(),
        is_open: enrollment.is_open,
    })
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

async fn search_page(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Html<String>, PageError> {
    let query = query.q.unwrap_or_default().trim().to_string();
    let results = if query.is_empty() {
        Vec::new()
    } else {
        state
            .search_repo
            .search(&query, SEARCH_LIMIT)
            .await?
            .into_iter()
            .map(|entry| SearchResultView {
                snippet: snippet(&entry.content, &query, SNIPPET_CHARS),
                url: entry.url,
                title: entry.title,
            })
            .collect()
    };

    render(&SearchTemplate {
        site_name: state.config.name.clone(),
        query,
        results,
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Lay slides out on a looping carousel track.
///
/// Returns the track, clones included, and the position the carousel starts at.
fn carousel_slides(items: Vec<SlideView>) -> (Vec<SlideView>, usize) {
    let carousel = Carousel::new(items.len());
    let track = carousel.track();
    let loops = track.len() > items.len();
    let last = track.len().saturating_sub(1);

    let slides = track
        .iter()
        .enumerate()
        .map(|(position, &index)| SlideView {
            position,
            index,
            is_clone: loops && (position == 0 || position == last),
            ..items[index].clone()
        })
        .collect();
    (slides, carousel.position())
}

fn image_slide(title: &str, url: &str) -> SlideView {
    SlideView {
        position: 0,
        index: 0,
        is_clone: false,
        title: title.to_string(),
        subtitle: String::new(),
        link_url: String::new(),
        image_url: url.to_string(),
    }
}

async fn news_cards(
    state: &AppState,
    posts: Vec<campus_db::NewsPost>,
) -> Result<Vec<NewsCard>, PageError> {
    // The first gallery image doubles as the cover.
    let ids: Vec<ResourceId> = posts.iter().map(|p| ResourceId::from_uuid(p.id)).collect();
    let mut covers: HashMap<Uuid, String> = state
        .news_repo
        .first_images(&ids)
        .await?
        .into_iter()
        .map(|image| (image.news_id, image.url))
        .collect();

    Ok(posts
        .into_iter()
        .map(|post| NewsCard {
            cover_url: covers.remove(&post.id).unwrap_or_default(),
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            published: format_date(post.published_at),
        })
        .collect())
}

fn curriculum_view(c: campus_db::Curriculum) -> CurriculumView {
    CurriculumView {
        slug: c.slug,
        title: c.title,
        summary: c.summary,
        body: c.body,
        cover_url: c.cover_url.unwrap_or_default(),
    }
}

fn unit_card(u: campus_db::Unit) -> UnitCard {
    UnitCard {
        slug: u.slug,
        name: u.name,
        address: u.address,
    }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

/// Excerpt of `content` around the first case-insensitive match of `query`.
fn snippet(content: &str, query: &str, width: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= width {
        return content.to_string();
    }

    let fold = |c: &char| c.to_lowercase().next().unwrap_or(*c);
    let haystack: Vec<char> = chars.iter().map(fold).collect();
    let needle: Vec<char> = query.trim().chars().map(|c| fold(&c)).collect();

    let found = if needle.is_empty() {
        None
    } else {
        haystack.windows(needle.len()).position(|w| w == needle.as_slice())
    };
    let start = found
        .map(|pos| pos.saturating_sub(width / 3))
        .unwrap_or(0)
        .min(chars.len() - width);
    let end = start + width;

    let mut out = String::new();
    if start > 0 {
        out.push('…');
    }
    out.extend(&chars[start..end]);
    if end < chars.len() {
        out.push('…');
    }
    out
}
