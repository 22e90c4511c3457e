//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{CatalogRepo, ClientRepo, IntakeRepo, LifecycleRepo, ReportRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore:
    ClientRepo + CatalogRepo + IntakeRepo + LifecycleRepo + ReportRepo + Send + Sync
{
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let query_timeout_secs = query_timeout_secs.unwrap_or(30);

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // One connection serializes every transaction. This is what stands in
            // for PostgreSQL's row locks: a read-modify-write inside a transaction
            // never interleaves with another writer.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::warn!(
            query_timeout_secs = query_timeout_secs,
            "SQLite query timeout is advisory only and all requests share one connection. \
             Use PostgreSQL for multi-user deployments."
        );

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Implement all the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use crate::repos::catalog::CHEMIST_ROLES;
    use crate::repos::clients::contains_pattern;
    use crate::repos::reports::{PROJECT_HEADER_SELECT, WORKLIST_SQL};
    use assay_core::lifecycle::{DEFAULT_ANALYSIS_UNIT, DEFAULT_CONDITIONS};
    use assay_core::{
        ClientIdentity, FieldGroup, FieldValue, MethodRef, NewProject, NewSample, Submission,
    };
    use sqlx::SqliteConnection;
    use sqlx::query::Query;
    use sqlx::sqlite::SqliteArguments;
    use time::OffsetDateTime;

    async fn upsert_client(
        conn: &mut SqliteConnection,
        identity: &ClientIdentity,
    ) -> MetadataResult<i64> {
        let client_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO clients (email, name, company) VALUES (?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET name = excluded.name, company = excluded.company
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

    async fn ensure_method(conn: &mut SqliteConnection, method: &MethodRef) -> MetadataResult<()> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM methods WHERE method_number = ? AND revision_number = ?)",
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
        conn: &mut SqliteConnection,
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
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
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
    async fn insert_samples(
        conn: &mut SqliteConnection,
        report_id: i64,
        samples: &[NewSample],
    ) -> MetadataResult<()> {
        if samples.is_empty() {
            return Ok(());
        }
        let count = i32::try_from(samples.len())
            .map_err(|_| MetadataError::Validation("too many samples".to_string()))?;

        let last: i32 = sqlx::query_scalar(
            "UPDATE intakes SET last_sample_seq = last_sample_seq + ? WHERE report_id = ? RETURNING last_sample_seq",
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
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
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
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
        value: FieldValue,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match value {
            FieldValue::Text(v) => query.bind(v),
            FieldValue::Date(v) => query.bind(v),
            FieldValue::Id(v) => query.bind(v),
        }
    }

    /// Upsert-with-defaults for one field group. Must run inside a transaction.
    async fn apply_group(
        conn: &mut SqliteConnection,
        report_id: i64,
        group: &FieldGroup,
    ) -> MetadataResult<AnalysisMetadataRow> {
        let declared: Option<i32> =
            sqlx::query_scalar("SELECT sample_count FROM intakes WHERE report_id = ?")
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
            ) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(report_id) DO NOTHING
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
            "SELECT * FROM analysis_metadata WHERE report_id = ?",
        )
        .bind(report_id)
        .fetch_one(&mut *conn)
        .await?;

        let assignments = group.assignments(&current.analysis_dates()?)?;
        let set_clause = assignments
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE analysis_metadata SET {set_clause} WHERE report_id = ?");

        let mut query = sqlx::query(&sql);
        for (_, value) in assignments {
            query = bind_field(query, value);
        }
        query.bind(report_id).execute(&mut *conn).await?;

        let row = sqlx::query_as::<_, AnalysisMetadataRow>(
            "SELECT * FROM analysis_metadata WHERE report_id = ?",
        )
        .bind(report_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    #[async_trait]
    impl ClientRepo for SqliteStore {
        async fn resolve_client(&self, identity: &ClientIdentity) -> MetadataResult<i64> {
            let mut tx = self.pool.begin().await?;
            let client_id = upsert_client(&mut tx, identity).await?;
            tx.commit().await?;
            Ok(client_id)
        }

        async fn get_client_by_email(&self, email: &str) -> MetadataResult<Option<ClientRow>> {
            let row = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn search_clients(&self, company: &str) -> MetadataResult<Vec<ClientRow>> {
            let rows = sqlx::query_as::<_, ClientRow>(
                r#"
                SELECT * FROM clients
                WHERE LOWER(company) LIKE ? ESCAPE '\'
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
    impl CatalogRepo for SqliteStore {
        async fn create_method(&self, method: &MethodRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO methods (method_number, revision_number, compound_name, air_loq, surface_loq)
                VALUES (?, ?, ?, ?, ?)
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

        async fn get_compound_methods(
            &self,
            compound_name: &str,
        ) -> MetadataResult<Vec<MethodRow>> {
            let rows = sqlx::query_as::<_, MethodRow>(
                r#"
                SELECT * FROM methods WHERE compound_name = ?
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
                "INSERT INTO employees (name, role) VALUES (?, ?) RETURNING employee_id",
            )
            .bind(name)
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
            Ok(employee_id)
        }

        async fn find_employee_by_name(&self, name: &str) -> MetadataResult<Option<EmployeeRow>> {
            let row = sqlx::query_as::<_, EmployeeRow>(
                "SELECT * FROM employees WHERE name = ? ORDER BY employee_id LIMIT 1",
            )
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn list_chemists(&self) -> MetadataResult<Vec<EmployeeRow>> {
            let rows = sqlx::query_as::<_, EmployeeRow>(
                "SELECT * FROM employees WHERE role IN (?, ?) ORDER BY name, employee_id",
            )
            .bind(CHEMIST_ROLES[0])
            .bind(CHEMIST_ROLES[1])
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl IntakeRepo for SqliteStore {
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
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM clients WHERE client_id = ?)")
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
            let row = sqlx::query_as::<_, IntakeRow>("SELECT * FROM intakes WHERE report_id = ?")
                .bind(report_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn list_samples(&self, report_id: i64) -> MetadataResult<Vec<SampleRow>> {
            let rows = sqlx::query_as::<_, SampleRow>(
                "SELECT * FROM samples WHERE report_id = ? ORDER BY sample_seq",
            )
            .bind(report_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl LifecycleRepo for SqliteStore {
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
                "SELECT * FROM analysis_metadata WHERE report_id = ?",
            )
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }
    }

    #[async_trait]
    impl ReportRepo for SqliteStore {
        async fn list_unreported_projects(&self) -> MetadataResult<Vec<WorklistRow>> {
            let rows = sqlx::query_as::<_, WorklistRow>(WORKLIST_SQL)
                .fetch_all(&self.pool)
                .await?;
            Ok(rows)
        }

        async fn get_project_detail(&self, report_id: i64) -> MetadataResult<ProjectDetail> {
            let mut tx = self.pool.begin().await?;
            let sql = format!("{PROJECT_HEADER_SELECT} WHERE i.report_id = ?");
            let header = sqlx::query_as::<_, ProjectHeaderRow>(&sql)
                .bind(report_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| MetadataError::NotFound(format!("report {report_id} not found")))?;
            let samples = sqlx::query_as::<_, SampleRow>(
                "SELECT * FROM samples WHERE report_id = ? ORDER BY sample_seq",
            )
            .bind(report_id)
            .fetch_all(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(ProjectDetail { header, samples })
        }
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    client_id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    company TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_clients_company ON clients (company);

CREATE TABLE IF NOT EXISTS methods (
    method_number TEXT NOT NULL,
    revision_number INTEGER NOT NULL,
    compound_name TEXT NOT NULL,
    air_loq REAL,
    surface_loq REAL,
    PRIMARY KEY (method_number, revision_number)
);

CREATE INDEX IF NOT EXISTS idx_methods_compound ON methods (compound_name);

CREATE TABLE IF NOT EXISTS employees (
    employee_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    role TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_employees_name ON employees (name);

CREATE TABLE IF NOT EXISTS intakes (
    report_id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id INTEGER NOT NULL REFERENCES clients (client_id),
    sample_count INTEGER NOT NULL CHECK (sample_count > 0),
    method_number TEXT NOT NULL,
    revision_number INTEGER NOT NULL,
    project_location TEXT,
    sampled_by TEXT,
    turnaround TEXT,
    last_sample_seq INTEGER NOT NULL DEFAULT 0 CHECK (last_sample_seq >= 0),
    created_at TEXT NOT NULL,
    FOREIGN KEY (method_number, revision_number)
        REFERENCES methods (method_number, revision_number)
);

CREATE TABLE IF NOT EXISTS samples (
    report_id INTEGER NOT NULL REFERENCES intakes (report_id) ON DELETE CASCADE,
    sample_seq INTEGER NOT NULL CHECK (sample_seq > 0),
    label TEXT NOT NULL,
    sample_date DATE NOT NULL,
    mass REAL,
    air_volume REAL,
    surface_area REAL,
    PRIMARY KEY (report_id, sample_seq),
    CHECK ((air_volume IS NULL) <> (surface_area IS NULL))
);

CREATE TABLE IF NOT EXISTS analysis_metadata (
    report_id INTEGER PRIMARY KEY REFERENCES intakes (report_id) ON DELETE CASCADE,
    sample_count INTEGER NOT NULL CHECK (sample_count > 0),
    analysis_unit TEXT NOT NULL,
    arrival_conditions TEXT NOT NULL,
    storage_conditions TEXT NOT NULL,
    project_number TEXT,
    date_received DATE,
    extraction_date DATE,
    analysis_start_date DATE,
    analysis_end_date DATE,
    report_date DATE,
    due_date DATE,
    prepared_by INTEGER REFERENCES employees (employee_id),
    reviewed_by INTEGER REFERENCES employees (employee_id),
    CHECK (extraction_date IS NULL OR analysis_start_date IS NULL
           OR extraction_date <= analysis_start_date),
    CHECK (analysis_start_date IS NULL OR analysis_end_date IS NULL
           OR analysis_start_date <= analysis_end_date)
);

CREATE INDEX IF NOT EXISTS idx_analysis_metadata_unreported
    ON analysis_metadata (due_date) WHERE report_date IS NULL;
"#;
