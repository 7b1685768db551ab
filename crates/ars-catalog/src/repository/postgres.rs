//! PostgreSQL release repository.
//!
//! All queries run against the `app_releases` table created by the embedded
//! migrations in `crates/ars-catalog/migrations`. The `seq` column is an
//! insertion counter used only to break `created_at` ties.

use std::time::Duration;

use ars_core::{Coordinates, LatestFilter, Release, ReleaseId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::ReleaseRepository;
use crate::error::PersistenceError;

const SELECT_COLUMNS: &str = "SELECT id, app_name, app_version, app_build, git_commit, target, arch,
     main_file_name, uploader_ip, download_count, created_at
     FROM app_releases";

/// Release repository backed by a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgReleaseRepository {
    pool: PgPool,
}

impl PgReleaseRepository {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `url` and apply the embedded migrations.
    pub async fn connect(url: &str) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;
        tracing::info!("Connected to PostgreSQL");

        let repo = Self::new(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    /// Apply embedded migrations.
    pub async fn migrate(&self) -> Result<(), PersistenceError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReleaseRepository for PgReleaseRepository {
    async fn insert(&self, release: &Release) -> Result<ReleaseId, PersistenceError> {
        sqlx::query(
            "INSERT INTO app_releases (id, app_name, app_version, app_build, git_commit,
             target, arch, main_file_name, uploader_ip, download_count, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(release.id.as_uuid())
        .bind(&release.app_name)
        .bind(&release.app_version)
        .bind(&release.app_build)
        .bind(&release.git_commit)
        .bind(&release.target)
        .bind(&release.arch)
        .bind(&release.main_file_name)
        .bind(&release.uploader_ip)
        .bind(release.download_count)
        .bind(release.created_at)
        .execute(&self.pool)
        .await?;

        Ok(release.id)
    }

    async fn find_latest_by_app_name(
        &self,
        app_name: &str,
        filter: &LatestFilter,
    ) -> Result<Option<Release>, PersistenceError> {
        let sql = format!(
            "{SELECT_COLUMNS}
             WHERE app_name = $1
               AND ($2::TEXT IS NULL OR target = $2)
               AND ($3::TEXT IS NULL OR arch = $3)
             ORDER BY created_at DESC, seq DESC
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, ReleaseRow>(&sql)
            .bind(app_name)
            .bind(&filter.target)
            .bind(&filter.arch)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ReleaseRow::into_record))
    }

    async fn increment_download_count(&self, id: ReleaseId) -> Result<bool, PersistenceError> {
        let result = sqlx::query(
            "UPDATE app_releases SET download_count = download_count + 1 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_coordinates(
        &self,
        coordinates: &Coordinates,
        file_name: &str,
    ) -> Result<Option<Release>, PersistenceError> {
        let sql = format!(
            "{SELECT_COLUMNS}
             WHERE app_name = $1 AND app_version = $2 AND app_build = $3 AND main_file_name = $4
             ORDER BY created_at DESC, seq DESC
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, ReleaseRow>(&sql)
            .bind(coordinates.app_name())
            .bind(coordinates.app_version())
            .bind(coordinates.app_build())
            .bind(file_name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ReleaseRow::into_record))
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ReleaseRow {
    id: Uuid,
    app_name: String,
    app_version: String,
    app_build: String,
    git_commit: Option<String>,
    target: Option<String>,
    arch: Option<String>,
    main_file_name: String,
    uploader_ip: Option<String>,
    download_count: i64,
    created_at: DateTime<Utc>,
}

impl ReleaseRow {
    fn into_record(self) -> Release {
        Release {
            id: ReleaseId::from_uuid(self.id),
            app_name: self.app_name,
            app_version: self.app_version,
            app_build: self.app_build,
            git_commit: self.git_commit,
            target: self.target,
            arch: self.arch,
            main_file_name: self.main_file_name,
            uploader_ip: self.uploader_ip,
            download_count: self.download_count,
            created_at: self.created_at,
        }
    }
}
