//! Student roster adapter backed by the Supabase Postgres instance,
//! plus the derived direction/group catalog served to the intake form.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use super::RosterStore;
use crate::config::AppConfig;
use crate::error::Result;
use crate::model::{direction_for_group, Student};

pub struct PgRosterStore {
    pool: PgPool,
}

impl PgRosterStore {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.roster_pool_size)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.roster_database_url)
            .await?;
        info!("roster database pool created");
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct StudentRow {
    name: String,
    group: String,
}

#[async_trait]
impl RosterStore for PgRosterStore {
    async fn students(&self) -> Result<Vec<Student>> {
        let rows: Vec<StudentRow> =
            sqlx::query_as(r#"SELECT name, "group" FROM students ORDER BY name"#)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|row| Student {
                name: row.name,
                group: row.group,
            })
            .collect())
    }

    async fn contains(&self, name: &str, group: &str) -> Result<bool> {
        let found: Option<(i32,)> =
            sqlx::query_as(r#"SELECT 1 FROM students WHERE name = $1 AND "group" = $2 LIMIT 1"#)
                .bind(name)
                .bind(group)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }
}

/// One student as offered to the intake form's picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentOption {
    pub value: String,
    pub label: String,
    pub group: String,
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupOption {
    pub value: String,
    pub label: String,
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionOption {
    pub value: String,
    pub label: String,
}

/// Roster plus the direction/group lookup tables derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct RosterCatalog {
    pub students: Vec<StudentOption>,
    pub directions: Vec<DirectionOption>,
    pub groups: Vec<GroupOption>,
}

/// Derive the catalog from the raw roster. Directions and groups keep
/// first-seen order; each group maps to exactly one direction.
pub fn build_catalog(students: &[Student]) -> RosterCatalog {
    let options: Vec<StudentOption> = students
        .iter()
        .map(|student| StudentOption {
            value: student.name.to_lowercase(),
            label: student.name.clone(),
            group: student.group.clone(),
            direction: direction_for_group(&student.group),
        })
        .collect();

    let mut directions: Vec<DirectionOption> = Vec::new();
    let mut groups: Vec<GroupOption> = Vec::new();

    for option in &options {
        if !directions.iter().any(|d| d.value == option.direction) {
            directions.push(DirectionOption {
                value: option.direction.clone(),
                label: option.direction.clone(),
            });
        }
        if !groups.iter().any(|g| g.value == option.group) {
            groups.push(GroupOption {
                value: option.group.clone(),
                label: option.group.clone(),
                direction: option.direction.clone(),
            });
        }
    }

    RosterCatalog {
        students: options,
        directions,
        groups,
    }
}
