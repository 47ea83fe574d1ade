//! # Store
//!
//! The operations the HTTP layer needs from persistence.
//!
//! [`crate::database::MySqlStore`] is the real thing. [`MemoryStore`] keeps the
//! same rows in a mutex and is what `SCHOOLS_STORE=memory` and the tests run on.
use std::collections::BTreeMap;

use async_trait::async_trait;
use registry::{
    RatingSummary, School, SchoolListing,
    rating::{listing_summary, summarize},
};
use tokio::sync::Mutex;

use crate::utils::CleanInput;

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait SchoolStore: Send + Sync {
    /// Every school with its rating aggregate, newest first.
    async fn list(&self) -> StoreResult<Vec<SchoolListing>>;

    async fn get(&self, id: i32) -> StoreResult<Option<School>>;

    /// Returns the id of the new row.
    async fn create(&self, input: &CleanInput) -> StoreResult<i32>;

    /// Replaces the editable fields. `false` when no such school exists.
    async fn update(&self, id: i32, input: &CleanInput) -> StoreResult<bool>;

    /// Removes the school and its ratings. `false` when no such school exists.
    async fn delete(&self, id: i32) -> StoreResult<bool>;

    /// Records a rating and returns the fresh aggregate, `None` for an
    /// unknown school.
    async fn rate(&self, id: i32, rating: u8) -> StoreResult<Option<RatingSummary>>;

    async fn ping(&self) -> StoreResult<()>;
}

#[derive(Default)]
struct Tables {
    next_id: i32,
    schools: BTreeMap<i32, School>,
    ratings: BTreeMap<i32, Vec<u8>>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchoolStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<SchoolListing>> {
        let tables = self.tables.lock().await;

        Ok(tables
            .schools
            .values()
            .rev()
            .map(|school| {
                let ratings = tables.ratings.get(&school.id).map(Vec::as_slice).unwrap_or(&[]);
                let summary = listing_summary(ratings);

                SchoolListing {
                    school: school.clone(),
                    avg_rating: summary.avg_rating,
                    rating_count: summary.rating_count,
                }
            })
            .collect())
    }

    async fn get(&self, id: i32) -> StoreResult<Option<School>> {
        Ok(self.tables.lock().await.schools.get(&id).cloned())
    }

    async fn create(&self, input: &CleanInput) -> StoreResult<i32> {
        let mut tables = self.tables.lock().await;
        tables.next_id += 1;

        let id = tables.next_id;
        tables.schools.insert(
            id,
            School {
                id,
                name: input.name.clone(),
                address: input.address.clone(),
                city: input.city.clone(),
                state: input.state.clone(),
                contact: input.contact.clone(),
                image: input.image.clone(),
                email_id: input.email_id.clone(),
                description: input.description.clone(),
            },
        );

        Ok(id)
    }

    async fn update(&self, id: i32, input: &CleanInput) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;

        let Some(school) = tables.schools.get_mut(&id) else {
            return Ok(false);
        };

        school.name = input.name.clone();
        school.address = input.address.clone();
        school.city = input.city.clone();
        school.state = input.state.clone();
        school.contact = input.contact.clone();
        school.email_id = input.email_id.clone();
        school.description = input.description.clone();

        Ok(true)
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        tables.ratings.remove(&id);

        Ok(tables.schools.remove(&id).is_some())
    }

    async fn rate(&self, id: i32, rating: u8) -> StoreResult<Option<RatingSummary>> {
        let mut tables = self.tables.lock().await;

        if !tables.schools.contains_key(&id) {
            return Ok(None);
        }

        let ratings = tables.ratings.entry(id).or_default();
        ratings.push(rating);

        Ok(summarize(ratings))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
