//! In-memory repositories for handler tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use campus_core::ResourceId;
use campus_db::{
    DbError, DbResult, Facility, FacilityImage, FacilityInput, FacilityRepo, NewImage, NewsImage,
    NewsInput, NewsPost, NewsRepo, Unit, UnitInput, UnitRepo,
};
use chrono::Utc;
use uuid::Uuid;

#[derive(Default)]
pub struct StubUnitRepo {
    pub units: Mutex<Vec<Unit>>,
}

impl StubUnitRepo {
    pub fn with_unit(name: &str) -> (Self, Uuid) {
        let id = Uuid::now_v7();
        let repo = Self::default();
        repo.units.lock().unwrap().push(Unit {
            id,
            slug: campus_core::slugify(name),
            name: name.to_string(),
            address: String::new(),
            phone: None,
            email: None,
            map_url: None,
            description: String::new(),
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        (repo, id)
    }

    fn find(&self, id: ResourceId) -> DbResult<Unit> {
        self.units
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == *id.as_uuid())
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("unit {}", id)))
    }
}

#[async_trait]
impl UnitRepo for StubUnitRepo {
    async fn list(&self) -> DbResult<Vec<Unit>> {
        Ok(self.units.lock().unwrap().clone())
    }
    async fn get(&self, id: ResourceId) -> DbResult<Unit> {
        self.find(id)
    }
    async fn get_by_slug(&self, slug: &str) -> DbResult<Unit> {
        self.units
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.slug == slug)
            .cloned()
            .ok_or_else(|| DbError::NotFound(slug.to_string()))
    }
    async fn create(&self, _input: &UnitInput) -> DbResult<Unit> {
        Err(DbError::Database(sqlx::Error::PoolTimedOut))
    }
    async fn update(&self, id: ResourceId, _input: &UnitInput) -> DbResult<Unit> {
        self.find(id)
    }
    async fn delete_by_id(&self, id: ResourceId) -> DbResult<Unit> {
        let unit = self.find(id)?;
        self.units.lock().unwrap().retain(|u| u.id != unit.id);
        Ok(unit)
    }
    async fn reorder(&self, _ids: &[ResourceId]) -> DbResult<()> {
        Ok(())
    }
}

/// Facilities and their images. `fail_inserts` makes `add_images` fail.
#[derive(Default)]
pub struct StubFacilityRepo {
    pub facilities: Mutex<Vec<Facility>>,
    pub images: Mutex<Vec<FacilityImage>>,
    pub fail_inserts: bool,
}

impl StubFacilityRepo {
    pub fn add_facility(&self, unit_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.facilities.lock().unwrap().push(Facility {
            id,
            unit_id,
            name: name.to_string(),
            description: String::new(),
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        id
    }

    pub fn add_image(&self, facility_id: Uuid, key: &str) {
        let mut images = self.images.lock().unwrap();
        let position = images.len() as i32;
        images.push(FacilityImage {
            id: Uuid::now_v7(),
            facility_id,
            key: key.to_string(),
            url: format!("https://cdn.example.edu/{}", key),
            position,
            created_at: Utc::now(),
        });
    }

    fn find(&self, id: ResourceId) -> DbResult<Facility> {
        self.facilities
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == *id.as_uuid())
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("facility {}", id)))
    }

    fn facility_ids_of(&self, unit_id: ResourceId) -> Vec<Uuid> {
        self.facilities
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.unit_id == *unit_id.as_uuid())
            .map(|f| f.id)
            .collect()
    }
}

#[async_trait]
impl FacilityRepo for StubFacilityRepo {
    async fn list_by_unit(&self, unit_id: ResourceId) -> DbResult<Vec<Facility>> {
        Ok(self
            .facilities
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.unit_id == *unit_id.as_uuid())
            .cloned()
            .collect())
    }
    async fn get(&self, id: ResourceId) -> DbResult<Facility> {
        self.find(id)
    }
    async fn create(&self, unit_id: ResourceId, input: &FacilityInput) -> DbResult<Facility> {
        let id = self.add_facility(*unit_id.as_uuid(), &input.name);
        self.find(ResourceId::from_uuid(id))
    }
    async fn update(&self, id: ResourceId, _input: &FacilityInput) -> DbResult<Facility> {
        self.find(id)
    }
    async fn delete_by_id(&self, id: ResourceId) -> DbResult<Facility> {
        let facility = self.find(id)?;
        self.facilities.lock().unwrap().retain(|f| f.id != facility.id);
        self.images
            .lock()
            .unwrap()
            .retain(|i| i.facility_id != facility.id);
        Ok(facility)
    }
    async fn list_images(&self, facility_id: ResourceId) -> DbResult<Vec<FacilityImage>> {
        self.find(facility_id)?;
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.facility_id == *facility_id.as_uuid())
            .cloned()
            .collect())
    }
    async fn list_images_for_unit(&self, unit_id: ResourceId) -> DbResult<Vec<FacilityImage>> {
        let ids = self.facility_ids_of(unit_id);
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| ids.contains(&i.facility_id))
            .cloned()
            .collect())
    }
    async fn add_images(
        &self,
        facility_id: ResourceId,
        images: &[NewImage],
    ) -> DbResult<Vec<FacilityImage>> {
        self.find(facility_id)?;
        if self.fail_inserts {
            return Err(DbError::Database(sqlx::Error::PoolTimedOut));
        }
        for image in images {
            self.add_image(*facility_id.as_uuid(), &image.key);
        }
        let keys: Vec<&str> = images.iter().map(|i| i.key.as_str()).collect();
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| keys.contains(&i.key.as_str()))
            .cloned()
            .collect())
    }
    async fn get_image(
        &self,
        facility_id: ResourceId,
        image_id: ResourceId,
    ) -> DbResult<FacilityImage> {
        self.images
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == *image_id.as_uuid() && i.facility_id == *facility_id.as_uuid())
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("facility image {}", image_id)))
    }
    async fn delete_image(
        &self,
        facility_id: ResourceId,
        image_id: ResourceId,
    ) -> DbResult<FacilityImage> {
        let image = self.get_image(facility_id, image_id).await?;
        self.images.lock().unwrap().retain(|i| i.id != image.id);
        Ok(image)
    }
    async fn reorder_images(&self, facility_id: ResourceId, _ids: &[ResourceId]) -> DbResult<()> {
        self.find(facility_id).map(|_| ())
    }
}

/// One post, an image table that can be told to fail.
pub struct StubNewsRepo {
    pub post: NewsPost,
    pub images: Mutex<Vec<NewsImage>>,
    pub fail_inserts: bool,
    /// Image lookups served, to keep page renders to one query.
    pub image_queries: AtomicUsize,
}

impl StubNewsRepo {
    pub fn new(fail_inserts: bool) -> Self {
        Self {
            post: NewsPost {
                id: Uuid::now_v7(),
                slug: "feira-de-ciencias".to_string(),
                title: "Feira de Ciências".to_string(),
                excerpt: String::new(),
                body: String::new(),
                published_at: Some(Utc::now()),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            images: Mutex::new(Vec::new()),
            fail_inserts,
            image_queries: AtomicUsize::new(0),
        }
    }

    fn check(&self, id: ResourceId) -> DbResult<()> {
        if *id.as_uuid() == self.post.id {
            Ok(())
        } else {
            Err(DbError::NotFound(format!("news post {}", id)))
        }
    }
}

#[async_trait]
impl NewsRepo for StubNewsRepo {
    async fn list(&self) -> DbResult<Vec<NewsPost>> {
        Ok(vec![self.post.clone()])
    }
    async fn list_published(&self, _limit: i64, _offset: i64) -> DbResult<Vec<NewsPost>> {
        Ok(vec![self.post.clone()])
    }
    async fn count_published(&self) -> DbResult<i64> {
        Ok(1)
    }
    async fn get(&self, id: ResourceId) -> DbResult<NewsPost> {
        self.check(id)?;
        Ok(self.post.clone())
    }
    async fn get_by_slug(&self, slug: &str) -> DbResult<NewsPost> {
        if slug == self.post.slug {
            Ok(self.post.clone())
        } else {
            Err(DbError::NotFound(slug.to_string()))
        }
    }
    async fn create(&self, _input: &NewsInput) -> DbResult<NewsPost> {
        Ok(self.post.clone())
    }
    async fn update(&self, id: ResourceId, _input: &NewsInput) -> DbResult<NewsPost> {
        self.get(id).await
    }
    async fn delete_by_id(&self, id: ResourceId) -> DbResult<NewsPost> {
        self.check(id)?;
        self.images.lock().unwrap().clear();
        Ok(self.post.clone())
    }
    async fn list_images(&self, id: ResourceId) -> DbResult<Vec<NewsImage>> {
        self.check(id)?;
        self.image_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.images.lock().unwrap().clone())
    }
    async fn first_images(&self, ids: &[ResourceId]) -> DbResult<Vec<NewsImage>> {
        self.image_queries.fetch_add(1, Ordering::SeqCst);
        let wanted = ids.iter().any(|id| *id.as_uuid() == self.post.id);
        let images = self.images.lock().unwrap();
        Ok(images
            .iter()
            .min_by_key(|i| (i.position, i.created_at))
            .filter(|_| wanted)
            .cloned()
            .into_iter()
            .collect())
    }
    async fn add_images(&self, id: ResourceId, images: &[NewImage]) -> DbResult<Vec<NewsImage>> {
        self.check(id)?;
        if self.fail_inserts {
            return Err(DbError::Database(sqlx::Error::PoolTimedOut));
        }
        let rows: Vec<NewsImage> = images
            .iter()
            .enumerate()
            .map(|(i, image)| NewsImage {
                id: Uuid::now_v7(),
                news_id: self.post.id,
                key: image.key.clone(),
                url: image.url.clone(),
                position: i as i32,
                created_at: Utc::now(),
            })
            .collect();
        self.images.lock().unwrap().extend(rows.iter().cloned());
        Ok(rows)
    }
    async fn get_image(&self, id: ResourceId, image_id: ResourceId) -> DbResult<NewsImage> {
        self.check(id)?;
        self.images
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == *image_id.as_uuid())
            .cloned()
            .ok_or_else(|| DbError::NotFound(image_id.to_string()))
    }
    async fn delete_image(&self, id: ResourceId, image_id: ResourceId) -> DbResult<NewsImage> {
        let image = self.get_image(id, image_id).await?;
        self.images.lock().unwrap().retain(|i| i.id != image.id);
        Ok(image)
    }
    async fn reorder_images(&self, id: ResourceId, _ids: &[ResourceId]) -> DbResult<()> {
        self.check(id)
    }
}
