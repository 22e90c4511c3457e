//! PostgreSQL-based metadata store implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::*;
use crate::repos::catalog::CHEMIST_ROLES;
use crate::repos::clients::contains_pattern;
use crate::repos::reports::{PROJECT_HEADER_SELECT, WORKLIST_SQL};
use crate::repos::{CatalogRepo, ClientRepo, IntakeRepo, LifecycleRepo, ReportRepo};
use crate::store::MetadataStore;
use assay_core::config::PgSslMode;
use assay_core::lifecycle::{DEFAULT_ANALYSIS_UNIT, DEFAULT_CONDITIONS};
use assay_core::{
    ClientIdentity, FieldGroup, FieldValue, MethodRef, NewProject, NewSample, Submission,
};
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::query::Query;
use sqlx::{PgConnection, Pool, Postgres};
use std::str::FromStr;
use time::OffsetDateTime;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    ///
    /// Lets the password come from its own environment variable instead of
    /// being embedded in a URL.
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        if let Some(mode) = ssl_mode {
            let sqlx_mode = match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            };
            opts = opts.ssl_mode(sqlx_mode);
        }

        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL with individual parameters"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared statement.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

async fn upsert_client(conn: &mut PgConnection, identity: &ClientIdentity) -> MetadataResult<i64> {
    let client_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO clients (email, name, company) VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name, company = EXCLUDED.company
        RETURNING client_id
        "#,
    )
    .bind(&identity.email)
    .bind(&identity.name)
    .bind(&identity.company)
    .fetch_one(&mut *conn)
    .await?;
    Ok(client_id)
}

async fn ensure_method(conn: &mut PgConnection, method: &MethodRef) -> MetadataResult<()> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM methods WHERE method_number = $1 AND revision_number = $2)",
    )
    .bind(&method.method_number)
    .bind(method.revision_number)
    .fetch_one(&mut *conn)
    .await?;
    if !exists {
        return Err(MetadataError::Reference(format!(
            "method {} revision {} does not exist",
            method.method_number, method.revision_number
        )));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn insert_intake(
    conn: &mut PgConnection,
    client_id: i64,
    sample_count: i32,
    method: &MethodRef,
    project_location: Option<&str>,
    sampled_by: Option<&str>,
    turnaround: Option<&str>,
) -> MetadataResult<i64> {
    let report_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO intakes (
            client_id, sample_count, method_number, revision_number,
            project_location, sampled_by, turnaround, last_sample_seq, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8)
        RETURNING report_id
        "#,
    )
    .bind(client_id)
    .bind(sample_count)
    .bind(&method.method_number)
    .bind(method.revision_number)
    .bind(project_location)
    .bind(sampled_by)
    .bind(turnaround)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(&mut *conn)
    .await?;
    Ok(report_id)
}

/// Claim `samples.len()` sequence numbers from the intake's counter and insert.
///
/// The counter UPDATE takes the intake's row lock and holds it until the
/// enclosing transaction ends, so two batches for one report can never
/// receive overlapping numbers.
async fn insert_samples(
    conn: &mut PgConnection,
    report_id: i64,
    samples: &[NewSample],
) -> MetadataResult<()> {
    if samples.is_empty() {
        return Ok(());
    }
    let count = i32::try_from(samples.len())
        .map_err(|_| MetadataError::Validation("too many samples".to_string()))?;

    let last: i32 = sqlx::query_scalar(
        "UPDATE intakes SET last_sample_seq = last_sample_seq + $1 WHERE report_id = $2 RETURNING last_sample_seq",
    )
    .bind(count)
    .bind(report_id)
    .fetch_one(&mut *conn)
    .await?;
    let first = last - count + 1;

    for (seq, sample) in (first..).zip(samples) {
        sqlx::query(
            r#"
            INSERT INTO samples (
                report_id, sample_seq, label, sample_date, mass, air_volume, surface_area
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(report_id)
        .bind(seq)
        .bind(&sample.label)
        .bind(sample.sample_date)
        .bind(sample.mass)
        .bind(sample.measurement.air_volume())
        .bind(sample.measurement.surface_area())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

fn bind_field<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: FieldValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        FieldValue::Text(v) => query.bind(v),
        FieldValue::Date(v) => query.bind(v),
        FieldValue::Id(v) => query.bind(v),
    }
}

/// Upsert-with-defaults for one field group. Must run inside a transaction.
async fn apply_group(
    conn: &mut PgConnection,
    report_id: i64,
    group: &FieldGroup,
) -> MetadataResult<AnalysisMetadataRow> {
    // Locking the parent intake serializes every lifecycle update of this
    // report, including the first one that seeds the metadata row.
    let declared: Option<i32> =
        sqlx::query_scalar("SELECT sample_count FROM intakes WHERE report_id = $1 FOR UPDATE")
            .bind(report_id)
            .fetch_optional(&mut *conn)
            .await?;
    let Some(declared) = declared else {
        return Err(MetadataError::NotFound(format!(
            "report {report_id} not found"
        )));
    };

    sqlx::query(
        r#"
        INSERT INTO analysis_metadata (
            report_id, sample_count, analysis_unit, arrival_conditions, storage_conditions
        ) VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (report_id) DO NOTHING
        "#,
    )
    .bind(report_id)
    .bind(declared)
    .bind(DEFAULT_ANALYSIS_UNIT)
    .bind(DEFAULT_CONDITIONS)
    .bind(DEFAULT_CONDITIONS)
    .execute(&mut *conn)
    .await?;

    let current = sqlx::query_as::<_, AnalysisMetadataRow>(
        "SELECT * FROM analysis_metadata WHERE report_id = $1",
    )
    .bind(report_id)
    .fetch_one(&mut *conn)
    .await?;

    let assignments = group.assignments(&current.analysis_dates()?)?;
    let set_clause = assignments
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{column} = ${}", i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE analysis_metadata SET {set_clause} WHERE report_id = $1");

    let mut query = sqlx::query(&sql).bind(report_id);
    for (_, value) in assignments {
        query = bind_field(query, value);
    }
    query.execute(&mut *conn).await?;

    let row = sqlx::query_as::<_, AnalysisMetadataRow>(
        "SELECT * FROM analysis_metadata WHERE report_id = $1",
    )
    .bind(report_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

#[async_trait]
impl ClientRepo for PostgresStore {
    async fn resolve_client(&self, identity: &ClientIdentity) -> MetadataResult<i64> {
        let mut tx = self.pool.begin().await?;
        let client_id = upsert_client(&mut tx, identity).await?;
        tx.commit().await?;
        Ok(client_id)
    }

    async fn get_client_by_email(&self, email: &str) -> MetadataResult<Option<ClientRow>> {
        let row = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn search_clients(&self, company: &str) -> MetadataResult<Vec<ClientRow>> {
        let rows = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT * FROM clients
            WHERE LOWER(company) LIKE $1 ESCAPE '\'
            ORDER BY company, name
            "#,
        )
        .bind(contains_pattern(company))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl CatalogRepo for PostgresStore {
    async fn create_method(&self, method: &MethodRow) -> MetadataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO methods (method_number, revision_number, compound_name, air_loq, surface_loq)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&method.method_number)
        .bind(method.revision_number)
        .bind(&method.compound_name)
        .bind(method.air_loq)
        .bind(method.surface_loq)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_methods(&self) -> MetadataResult<Vec<MethodRow>> {
        let rows = sqlx::query_as::<_, MethodRow>(
            "SELECT * FROM methods ORDER BY method_number, revision_number",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_compound_methods(&self, compound_name: &str) -> MetadataResult<Vec<MethodRow>> {
        let rows = sqlx::query_as::<_, MethodRow>(
            r#"
            SELECT * FROM methods WHERE compound_name = $1
            ORDER BY method_number DESC, revision_number DESC
            "#,
        )
        .bind(compound_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_employee(&self, name: &str, role: &str) -> MetadataResult<i64> {
        let employee_id: i64 = sqlx::query_scalar(
            "INSERT INTO employees (name, role) VALUES ($1, $2) RETURNING employee_id",
        )
        .bind(name)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;
        Ok(employee_id)
    }

    async fn find_employee_by_name(&self, name: &str) -> MetadataResult<Option<EmployeeRow>> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT * FROM employees WHERE name = $1 ORDER BY employee_id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_chemists(&self) -> MetadataResult<Vec<EmployeeRow>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            "SELECT * FROM employees WHERE role = ANY($1) ORDER BY name, employee_id",
        )
        .bind(&CHEMIST_ROLES[..])
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl IntakeRepo for PostgresStore {
    async fn submit_intake(&self, submission: &Submission) -> MetadataResult<i64> {
        let header = &submission.header;
        let mut tx = self.pool.begin().await?;

        let client_id = upsert_client(&mut tx, &header.client).await?;
        ensure_method(&mut tx, &header.method).await?;
        let report_id = insert_intake(
            &mut tx,
            client_id,
            header.sample_count,
            &header.method,
            header.project_location.as_deref(),
            header.sampled_by.as_deref(),
            header.turnaround.as_deref(),
        )
        .await?;
        insert_samples(&mut tx, report_id, &submission.samples).await?;

        tx.commit().await?;
        Ok(report_id)
    }

    async fn create_project(&self, project: &NewProject) -> MetadataResult<i64> {
        let mut tx = self.pool.begin().await?;

        let client_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM clients WHERE client_id = $1)")
                .bind(project.client_id)
                .fetch_one(&mut *tx)
                .await?;
        if !client_exists {
            return Err(MetadataError::Reference(format!(
                "client {} does not exist",
                project.client_id
            )));
        }
        ensure_method(&mut tx, &project.method).await?;

        let report_id = insert_intake(
            &mut tx,
            project.client_id,
            project.sample_count,
            &project.method,
            None,
            None,
            None,
        )
        .await?;
        if project.due_date.is_some() {
            apply_group(&mut tx, report_id, &FieldGroup::DueDate(project.due_date)).await?;
        }

        tx.commit().await?;
        Ok(report_id)
    }

    async fn get_intake(&self, report_id: i64) -> MetadataResult<Option<IntakeRow>> {
        let row = sqlx::query_as::<_, IntakeRow>("SELECT * FROM intakes WHERE report_id = $1")
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_samples(&self, report_id: i64) -> MetadataResult<Vec<SampleRow>> {
        let rows = sqlx::query_as::<_, SampleRow>(
            "SELECT * FROM samples WHERE report_id = $1 ORDER BY sample_seq",
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl LifecycleRepo for PostgresStore {
    async fn apply_field_group(
        &self,
        report_id: i64,
        group: &FieldGroup,
    ) -> MetadataResult<AnalysisMetadataRow> {
        let mut tx = self.pool.begin().await?;
        let row = apply_group(&mut tx, report_id, group).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn get_analysis_metadata(
        &self,
        report_id: i64,
    ) -> MetadataResult<Option<AnalysisMetadataRow>> {
        let row = sqlx::query_as::<_, AnalysisMetadataRow>(
            "SELECT * FROM analysis_metadata WHERE report_id = $1",
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl ReportRepo for PostgresStore {
    async fn list_unreported_projects(&self) -> MetadataResult<Vec<WorklistRow>> {
        let rows = sqlx::query_as::<_, WorklistRow>(WORKLIST_SQL)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_project_detail(&self, report_id: i64) -> MetadataResult<ProjectDetail> {
        // One snapshot for header and samples.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let sql = format!("{PROJECT_HEADER_SELECT} WHERE i.report_id = $1");
        let header = sqlx::query_as::<_, ProjectHeaderRow>(&sql)
            .bind(report_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| MetadataError::NotFound(format!("report {report_id} not found")))?;
        let samples = sqlx::query_as::<_, SampleRow>(
            "SELECT * FROM samples WHERE report_id = $1 ORDER BY sample_seq",
        )
        .bind(report_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ProjectDetail { header, samples })
    }
}
