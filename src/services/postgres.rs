use crate::models::{
    AnalyticsDay, AnalyticsMetric, Company, CompanyUpdate, Coordinate, Location, PaymentStatus,
    Promotion, SearchQuery, User,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Turn unique-constraint violations into [`PostgresError::Conflict`]
fn conflict_or(err: sqlx::Error, what: &str) -> PostgresError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PostgresError::Conflict(format!("{} already exists", what))
        }
        _ => PostgresError::SqlxError(err),
    }
}

const COMPANY_SELECT: &str = r#"
    SELECT c.id, c.user_id, c.company_name, c.cnpj, c.description, c.category,
           c.phone, c.whatsapp, c.address, c.city, c.state, c.postal_code,
           c.latitude, c.longitude, c.region, c.rating, c.logo_url,
           c.is_verified, c.is_active, c.created_at, u.email
    FROM companies c
    JOIN users u ON u.id = c.user_id
"#;

const PROMOTION_COLUMNS: &str = r#"
    id, company_id, is_active, start_date, end_date, amount_cents,
    duration_days, payment_status, payment_id, created_at
"#;

fn company_from_row(row: &PgRow) -> Result<Company, sqlx::Error> {
    let latitude: Option<f64> = row.try_get("latitude")?;
    let longitude: Option<f64> = row.try_get("longitude")?;

    Ok(Company {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        company_name: row.try_get("company_name")?,
        cnpj: row.try_get("cnpj")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        phone: row.try_get("phone")?,
        whatsapp: row.try_get("whatsapp")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        postal_code: row.try_get("postal_code")?,
        coordinate: Coordinate::from_parts(latitude, longitude),
        region: row.try_get("region")?,
        rating: row.try_get("rating")?,
        logo_url: row.try_get("logo_url")?,
        is_verified: row.try_get("is_verified")?,
        is_active: row.try_get("is_active")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        full_name: row.try_get("full_name")?,
        document: row.try_get("document")?,
        phone: row.try_get("phone")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn promotion_from_row(row: &PgRow) -> Result<Promotion, sqlx::Error> {
    Ok(Promotion {
        id: row.try_get("id")?,
        company_id: row.try_get("company_id")?,
        is_active: row.try_get("is_active")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        amount_cents: row.try_get("amount_cents")?,
        duration_days: row.try_get("duration_days")?,
        payment_status: row.try_get("payment_status")?,
        payment_id: row.try_get("payment_id")?,
        created_at: row.try_get("created_at")?,
    })
}

/// New individual account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub document: String,
    pub phone: Option<String>,
}

/// New company owner account and its company profile
#[derive(Debug, Clone)]
pub struct NewCompanyAccount {
    pub owner: NewUser,
    pub company_name: String,
    pub whatsapp: Option<String>,
    pub category: Option<String>,
    pub postal_code: Option<String>,
    /// Geocoded postal code, when the lookup succeeded
    pub location: Option<Location>,
}

/// PostgreSQL store for accounts, companies, promotions and analytics
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Wrap an existing pool (migrations are not run)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- Companies ---

    /// Coarse stage of a proximity search
    ///
    /// Listed companies inside the query's bounding box, optionally in one
    /// category, ordered by id. Exact distance filtering is left to the
    /// search pipeline.
    pub async fn search_candidates(&self, query: &SearchQuery) -> Result<Vec<Company>, PostgresError> {
        let sql = format!(
            r#"{}
            WHERE c.is_active AND c.is_verified
              AND c.latitude IS NOT NULL AND c.longitude IS NOT NULL
              AND c.latitude BETWEEN $1 AND $2
              AND c.longitude BETWEEN $3 AND $4
              AND ($5::TEXT IS NULL OR c.category = $5)
            ORDER BY c.id ASC
            "#,
            COMPANY_SELECT
        );

        let bbox = &query.bounding_box;
        let rows = sqlx::query(&sql)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lon)
            .bind(bbox.max_lon)
            .bind(query.category.as_deref())
            .fetch_all(&self.pool)
            .await?;

        let companies = rows
            .iter()
            .map(company_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Fetched {} search candidates", companies.len());

        Ok(companies)
    }

    /// Listed companies with a promotion running at `now`
    pub async fn sponsored_candidates(
        &self,
        region: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Company>, PostgresError> {
        let sql = format!(
            r#"{}
            WHERE c.is_active AND c.is_verified
              AND EXISTS (
                  SELECT 1 FROM promotions p
                  WHERE p.company_id = c.id
                    AND p.is_active
                    AND p.start_date <= $1
                    AND p.end_date >= $1
              )
              AND ($2::TEXT IS NULL OR c.region = $2)
            ORDER BY c.id ASC
            "#,
            COMPANY_SELECT
        );

        let rows = sqlx::query(&sql)
            .bind(now)
            .bind(region)
            .fetch_all(&self.pool)
            .await?;

        let companies = rows
            .iter()
            .map(company_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Fetched {} sponsored candidates", companies.len());

        Ok(companies)
    }

    /// Get a company by id, with its owner's contact email
    pub async fn get_company(&self, company_id: i64) -> Result<Option<Company>, PostgresError> {
        let sql = format!("{} WHERE c.id = $1", COMPANY_SELECT);

        let row = sqlx::query(&sql)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(company_from_row).transpose().map_err(Into::into)
    }

    /// Owner account of a company, if the company exists
    pub async fn company_owner(&self, company_id: i64) -> Result<Option<i64>, PostgresError> {
        let owner = sqlx::query_scalar::<_, i64>("SELECT user_id FROM companies WHERE id = $1")
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(owner)
    }

    /// First company owned by an account
    pub async fn company_id_for_user(&self, user_id: i64) -> Result<Option<i64>, PostgresError> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM companies WHERE user_id = $1 ORDER BY id LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    /// Apply a partial profile update; returns false if the company is gone
    pub async fn update_company(
        &self,
        company_id: i64,
        update: &CompanyUpdate,
    ) -> Result<bool, PostgresError> {
        if update.is_empty() {
            return Err(PostgresError::InvalidInput("No fields to update".to_string()));
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE companies SET ");
        {
            let mut fields = builder.separated(", ");
            let text_fields = [
                ("company_name", &update.company_name),
                ("description", &update.description),
                ("phone", &update.phone),
                ("whatsapp", &update.whatsapp),
                ("address", &update.address),
                ("city", &update.city),
                ("state", &update.state),
                ("postal_code", &update.postal_code),
                ("category", &update.category),
                ("logo_url", &update.logo_url),
                ("region", &update.region),
            ];
            for (column, value) in text_fields {
                if let Some(value) = value {
                    fields.push(format!("{} = ", column));
                    fields.push_bind_unseparated(value.clone());
                }
            }
            if let Some(point) = &update.coordinate {
                fields.push("latitude = ");
                fields.push_bind_unseparated(point.latitude());
                fields.push("longitude = ");
                fields.push_bind_unseparated(point.longitude());
            }
            fields.push("updated_at = NOW()");
        }
        builder.push(" WHERE id = ");
        builder.push_bind(company_id);

        let result = builder.build().execute(&self.pool).await?;

        tracing::debug!("Updated company {} ({} rows)", company_id, result.rows_affected());

        Ok(result.rows_affected() > 0)
    }

    // --- Analytics ---

    /// Add one to a daily counter
    ///
    /// A single INSERT ... ON CONFLICT statement, so concurrent increments
    /// for the same company and day are never lost.
    pub async fn increment_metric(
        &self,
        company_id: i64,
        date: NaiveDate,
        metric: AnalyticsMetric,
    ) -> Result<(), PostgresError> {
        let column = metric.column();
        let query = format!(
            r#"
            INSERT INTO company_analytics (company_id, date, {column})
            VALUES ($1, $2, 1)
            ON CONFLICT (company_id, date)
            DO UPDATE SET
                {column} = company_analytics.{column} + 1,
                updated_at = NOW()
            "#
        );

        sqlx::query(&query)
            .bind(company_id)
            .bind(date)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Incremented {} for company {} on {}", column, company_id, date);

        Ok(())
    }

    /// Daily counters from `since` (inclusive), oldest first
    pub async fn analytics_since(
        &self,
        company_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<AnalyticsDay>, PostgresError> {
        let query = r#"
            SELECT company_id, date, profile_views, whatsapp_clicks
            FROM company_analytics
            WHERE company_id = $1 AND date >= $2
            ORDER BY date ASC
        "#;

        let rows = sqlx::query(query)
            .bind(company_id)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        let days = rows
            .iter()
            .map(|row| {
                Ok(AnalyticsDay {
                    company_id: row.try_get("company_id")?,
                    date: row.try_get("date")?,
                    profile_views: row.try_get("profile_views")?,
                    whatsapp_clicks: row.try_get("whatsapp_clicks")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(days)
    }

    // --- Accounts ---

    /// Whether an email or document is already registered
    pub async fn account_exists(&self, email: &str, document: &str) -> Result<bool, PostgresError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 OR document = $2)",
        )
        .bind(email)
        .bind(document)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, PostgresError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, full_name, document, phone, is_active, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose().map_err(Into::into)
    }

    /// Insert an individual account
    pub async fn create_user(&self, new_user: &NewUser) -> Result<User, PostgresError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, full_name, document, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, full_name, document, phone, is_active, created_at
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.full_name)
        .bind(&new_user.document)
        .bind(&new_user.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "Account"))?;

        let user = user_from_row(&row)?;
        tracing::info!("Registered user {}", user.id);

        Ok(user)
    }

    /// Insert an owner account and its company in one transaction
    ///
    /// Returns the account and the new company id.
    pub async fn create_company_account(
        &self,
        account: &NewCompanyAccount,
    ) -> Result<(User, i64), PostgresError> {
        let mut tx = self.pool.begin().await?;

        let owner = &account.owner;
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, full_name, document, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, full_name, document, phone, is_active, created_at
            "#,
        )
        .bind(&owner.email)
        .bind(&owner.password_hash)
        .bind(&owner.full_name)
        .bind(&owner.document)
        .bind(&owner.phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_or(e, "Account"))?;
        let user = user_from_row(&row)?;

        let location = account.location.as_ref();
        let coordinate = location.and_then(|l| l.coordinate);

        let company_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO companies (
                user_id, company_name, cnpj, phone, whatsapp, category,
                postal_code, address, city, state, region, latitude, longitude
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(user.id)
        .bind(&account.company_name)
        .bind(&owner.document)
        .bind(&owner.phone)
        .bind(&account.whatsapp)
        .bind(&account.category)
        .bind(&account.postal_code)
        .bind(location.and_then(|l| l.address.clone()))
        .bind(location.and_then(|l| l.city.clone()))
        // The directory's UF is both the state and the carousel region
        .bind(location.and_then(|l| l.region.clone()))
        .bind(location.and_then(|l| l.region.clone()))
        .bind(coordinate.map(|c| c.latitude()))
        .bind(coordinate.map(|c| c.longitude()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_or(e, "Company"))?;

        tx.commit().await?;

        tracing::info!("Registered company {} for user {}", company_id, user.id);

        Ok((user, company_id))
    }

    // --- Promotions ---

    /// Record a pending promotion awaiting payment
    pub async fn create_promotion(
        &self,
        company_id: i64,
        amount_cents: i64,
        duration_days: i32,
        payment_id: &str,
    ) -> Result<Promotion, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO promotions (company_id, amount_cents, duration_days, payment_status, payment_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PROMOTION_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(company_id)
            .bind(amount_cents)
            .bind(duration_days)
            .bind(PaymentStatus::Pending)
            .bind(payment_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(promotion_from_row(&row)?)
    }

    pub async fn get_promotion(&self, promotion_id: i64) -> Result<Option<Promotion>, PostgresError> {
        let query = format!("SELECT {} FROM promotions WHERE id = $1", PROMOTION_COLUMNS);

        let row = sqlx::query(&query)
            .bind(promotion_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(promotion_from_row).transpose().map_err(Into::into)
    }

    /// Promotion created for a gateway reference
    pub async fn find_promotion_by_payment(
        &self,
        payment_id: &str,
    ) -> Result<Option<Promotion>, PostgresError> {
        let query = format!(
            "SELECT {} FROM promotions WHERE payment_id = $1 ORDER BY id DESC LIMIT 1",
            PROMOTION_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(promotion_from_row).transpose().map_err(Into::into)
    }

    /// Mark a pending promotion paid, open its window and verify the company
    ///
    /// Returns false when the promotion was not pending (e.g. a repeated
    /// gateway notification).
    pub async fn activate_promotion(
        &self,
        promotion_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, PostgresError> {
        let mut tx = self.pool.begin().await?;

        let company_id = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE promotions
            SET payment_status = $2, is_active = TRUE, start_date = $3, end_date = $4,
                updated_at = NOW()
            WHERE id = $1 AND payment_status = $5
            RETURNING company_id
            "#,
        )
        .bind(promotion_id)
        .bind(PaymentStatus::Approved)
        .bind(start)
        .bind(end)
        .bind(PaymentStatus::Pending)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(company_id) = company_id else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query("UPDATE companies SET is_verified = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(company_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Activated promotion {} for company {}", promotion_id, company_id);

        Ok(true)
    }

    /// Mark a pending promotion as failed
    pub async fn fail_promotion(&self, promotion_id: i64) -> Result<bool, PostgresError> {
        let result = sqlx::query(
            r#"
            UPDATE promotions
            SET payment_status = $2, is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND payment_status = $3
            "#,
        )
        .bind(promotion_id)
        .bind(PaymentStatus::Failed)
        .bind(PaymentStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
