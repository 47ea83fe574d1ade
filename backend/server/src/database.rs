//! # MySQL
//!
//! Relational store behind the portal.
//!
//! ## Tables
//!
//! - `schools`: one row per school. Older deployments were created without a
//!   `description` column.
//! - `schools_ratings`: one row per submitted star rating, cascading away with
//!   its school.
//!
//! ## Lazy Schema
//!
//! Nothing runs migrations ahead of time. Before a statement touches
//! `description`, the column is looked up in `information_schema` and added if
//! it is missing. Before a statement touches ratings, the ratings table is
//! created if missing. A failed `ALTER` is tolerated since another connection
//! may have won the race; the lookup simply runs again on the next request.
//! Once a step has succeeded it is skipped for the rest of the process.
//!
//! ## Aggregation
//!
//! Averages always come from `AVG()` over every rating row, rounded to two
//! decimals in SQL. Unrated schools list with an average of 3.
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use registry::{RatingSummary, School, SchoolListing};
use sqlx::{
    FromRow, MySqlPool,
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
};
use tracing::{debug, info};

use crate::{
    config::MySqlConfig,
    store::{SchoolStore, StoreResult},
    utils::CleanInput,
};

const CREATE_SCHOOLS: &str = r#"
    CREATE TABLE IF NOT EXISTS schools (
        id INT AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        address TEXT NOT NULL,
        city VARCHAR(100) NOT NULL,
        state VARCHAR(100) NOT NULL,
        contact VARCHAR(20) NOT NULL,
        image TEXT NULL,
        email_id VARCHAR(255) NOT NULL
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

const FIND_DESCRIPTION: &str = r#"
    SELECT COLUMN_NAME FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = 'schools' AND COLUMN_NAME = 'description'
"#;

const ADD_DESCRIPTION: &str = "ALTER TABLE schools ADD COLUMN description TEXT NULL";

const CREATE_RATINGS: &str = r#"
    CREATE TABLE IF NOT EXISTS schools_ratings (
        id INT AUTO_INCREMENT PRIMARY KEY,
        school_id INT NOT NULL,
        rating TINYINT NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        INDEX (school_id),
        CONSTRAINT fk_schools_ratings_school
            FOREIGN KEY (school_id) REFERENCES schools(id)
            ON DELETE CASCADE
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

const LIST_SCHOOLS: &str = r#"
    SELECT s.id, s.name, s.address, s.city, s.state, s.contact, s.image, s.email_id, s.description,
           CAST(ROUND(COALESCE(AVG(r.rating), 3), 2) AS DOUBLE) AS avg_rating,
           COUNT(r.id) AS rating_count
    FROM schools s
    LEFT JOIN schools_ratings r ON r.school_id = s.id
    GROUP BY s.id, s.name, s.address, s.city, s.state, s.contact, s.image, s.email_id, s.description
    ORDER BY s.id DESC
"#;

const GET_SCHOOL: &str = r#"
    SELECT id, name, address, city, state, contact, image, email_id, description
    FROM schools WHERE id = ?
"#;

const SCHOOL_EXISTS: &str = "SELECT id FROM schools WHERE id = ?";

const INSERT_SCHOOL: &str = r#"
    INSERT INTO schools (name, address, city, state, contact, image, email_id, description)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_SCHOOL: &str = r#"
    UPDATE schools
    SET name = ?, address = ?, city = ?, state = ?, contact = ?, email_id = ?, description = ?
    WHERE id = ?
"#;

const DELETE_SCHOOL: &str = "DELETE FROM schools WHERE id = ?";

const INSERT_RATING: &str = "INSERT INTO schools_ratings (school_id, rating) VALUES (?, ?)";

const AGGREGATE_RATINGS: &str = r#"
    SELECT CAST(ROUND(AVG(rating), 2) AS DOUBLE) AS avg_rating, COUNT(*) AS rating_count
    FROM schools_ratings WHERE school_id = ?
"#;

pub async fn init_mysql(config: &MySqlConfig) -> Result<MySqlPool, sqlx::Error> {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database);

    MySqlPoolOptions::new()
        .max_connections(config.pool_size)
        .idle_timeout(config.idle_timeout)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

#[derive(FromRow)]
struct SchoolRow {
    id: i32,
    name: String,
    address: String,
    city: String,
    state: String,
    contact: String,
    image: Option<String>,
    email_id: String,
    description: Option<String>,
}

impl From<SchoolRow> for School {
    fn from(row: SchoolRow) -> Self {
        School {
            id: row.id,
            name: row.name,
            address: row.address,
            city: row.city,
            state: row.state,
            contact: row.contact,
            image: row.image,
            email_id: row.email_id,
            description: row.description,
        }
    }
}

#[derive(FromRow)]
struct ListingRow {
    #[sqlx(flatten)]
    school: SchoolRow,
    avg_rating: f64,
    rating_count: i64,
}

#[derive(FromRow)]
struct AggregateRow {
    avg_rating: Option<f64>,
    rating_count: i64,
}

#[derive(Default)]
struct Schema {
    description: AtomicBool,
    ratings: AtomicBool,
}

pub struct MySqlStore {
    pool: MySqlPool,
    schema: Schema,
}

impl MySqlStore {
    pub async fn connect(config: &MySqlConfig) -> Result<Self, sqlx::Error> {
        info!(
            "Connecting to MySQL at {}:{}/{}",
            config.host, config.port, config.database
        );
        let pool = init_mysql(config).await?;

        Self::with_pool(pool).await
    }

    /// Wraps an existing pool, creating `schools` if the database has none.
    pub async fn with_pool(pool: MySqlPool) -> Result<Self, sqlx::Error> {
        sqlx::query(CREATE_SCHOOLS).execute(&pool).await?;

        Ok(Self {
            pool,
            schema: Schema::default(),
        })
    }

    async fn ensure_description_column(&self) -> StoreResult<()> {
        if self.schema.description.load(Ordering::Acquire) {
            return Ok(());
        }

        let found = sqlx::query(FIND_DESCRIPTION)
            .fetch_optional(&self.pool)
            .await?;

        if found.is_none() {
            info!("schools.description missing, adding it");

            if let Err(e) = sqlx::query(ADD_DESCRIPTION).execute(&self.pool).await {
                debug!("Adding schools.description failed, likely added concurrently: {e}");
                return Ok(());
            }
        }

        self.schema.description.store(true, Ordering::Release);
        Ok(())
    }

    async fn ensure_ratings_table(&self) -> StoreResult<()> {
        if self.schema.ratings.load(Ordering::Acquire) {
            return Ok(());
        }

        sqlx::query(CREATE_RATINGS).execute(&self.pool).await?;

        self.schema.ratings.store(true, Ordering::Release);
        Ok(())
    }
}

#[async_trait]
impl SchoolStore for MySqlStore {
    async fn list(&self) -> StoreResult<Vec<SchoolListing>> {
        self.ensure_description_column().await?;
        self.ensure_ratings_table().await?;

        let rows: Vec<ListingRow> = sqlx::query_as(LIST_SCHOOLS).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| SchoolListing {
                school: row.school.into(),
                avg_rating: row.avg_rating,
                rating_count: row.rating_count,
            })
            .collect())
    }

    async fn get(&self, id: i32) -> StoreResult<Option<School>> {
        self.ensure_description_column().await?;

        let row: Option<SchoolRow> = sqlx::query_as(GET_SCHOOL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(School::from))
    }

    async fn create(&self, input: &CleanInput) -> StoreResult<i32> {
        self.ensure_description_column().await?;

        let result = sqlx::query(INSERT_SCHOOL)
            .bind(&input.name)
            .bind(&input.address)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.contact)
            .bind(&input.image)
            .bind(&input.email_id)
            .bind(&input.description)
            .execute(&self.pool)
            .await?;

        i32::try_from(result.last_insert_id()).map_err(|e| sqlx::Error::Decode(Box::new(e)))
    }

    async fn update(&self, id: i32, input: &CleanInput) -> StoreResult<bool> {
        self.ensure_description_column().await?;

        let result = sqlx::query(UPDATE_SCHOOL)
            .bind(&input.name)
            .bind(&input.address)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.contact)
            .bind(&input.email_id)
            .bind(&input.description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // unchanged rows report zero affected rows
        let exists = sqlx::query(SCHOOL_EXISTS)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(exists.is_some())
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query(DELETE_SCHOOL)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn rate(&self, id: i32, rating: u8) -> StoreResult<Option<RatingSummary>> {
        self.ensure_ratings_table().await?;

        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query(SCHOOL_EXISTS)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        sqlx::query(INSERT_RATING)
            .bind(id)
            .bind(rating)
            .execute(&mut *tx)
            .await?;

        let aggregate: AggregateRow = sqlx::query_as(AGGREGATE_RATINGS)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(RatingSummary {
            avg_rating: aggregate.avg_rating.unwrap_or_default(),
            rating_count: aggregate.rating_count,
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;

        Ok(())
    }
}
