// ============================================================
// PROJECT LIFECYCLE
// ============================================================
// Create, import, reopen and commit: the use cases that tie the
// inference stages to storage, the database and the pipeline runner

use super::import_flow::run_inference;
use super::registry::Registry;
use crate::domain::error::{AppError, Result};
use crate::domain::session::ImportSession;
use crate::domain::staged::StagedAction;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::{metadata, project as project_db};
use crate::infrastructure::fetch::Fetcher;
use crate::infrastructure::pipeline::{run_pipeline, PipelineRun};
use crate::infrastructure::storage;
use crate::interfaces::interaction::Interaction;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Everything an open project needs at runtime. Exactly one context is
/// active at a time; opening another project builds a fresh one.
pub struct ProjectContext {
    pub session: ImportSession,
    pub registry: Registry,
    pub pool: SqlitePool,
    pub directory: PathBuf,
}

impl ProjectContext {
    /// Keep the session's persisted copies in sync with the registry
    /// before saving or rendering the pipeline.
    pub fn sync_registry(&mut self) {
        self.session.created_value_types = self.registry.value_types.clone();
        self.session.created_constraints = self.registry.constraints.clone();
    }

    pub async fn save(&mut self) -> Result<()> {
        self.sync_registry();
        metadata::save_session(&self.pool, &self.session).await
    }
}

fn registry_from_session(session: &ImportSession) -> Registry {
    Registry {
        constraints: session.created_constraints.clone(),
        value_types: session.created_value_types.clone(),
    }
}

/// Create a new project: directory, download, inference, materialization,
/// metadata. Fails with [`crate::domain::error::AppError::ProjectExists`]
/// when the name is taken so the caller can re-prompt.
pub async fn create_project(
    config: &AppConfig,
    name: &str,
    url: &str,
    interaction: &dyn Interaction,
) -> Result<ProjectContext> {
    let directory = storage::create_project_dir(&config.workspace_dir, name).await?;

    let fetcher = Fetcher::new(config.download_timeout_secs)?;
    let validated = fetcher.validate(url).await?;
    let file_name = fetcher.download(&validated, &directory).await?;

    import_file(name, &directory, &file_name, url, interaction).await
}

/// Run the inference pipeline over an already-downloaded file and
/// materialize the result: preamble side file, project table, metadata.
pub async fn import_file(
    name: &str,
    directory: &Path,
    file_name: &str,
    url: &str,
    interaction: &dyn Interaction,
) -> Result<ProjectContext> {
    let mut session = ImportSession::new();
    session.project_name = name.to_string();
    session.directory = directory.to_path_buf();
    session.file_name = file_name.to_string();
    session.url = url.to_string();
    session.database = format!("{}.sqlite", name);
    session.table = name.to_string();

    let bytes = fs::read(directory.join(file_name)).await?;
    let outcome = run_inference(&mut session, &bytes, interaction).await?;
    storage::write_comments_file(directory, file_name, &outcome.preamble).await?;

    let pool = project_db::connect_file(&directory.join(&session.database)).await?;
    let registry = Registry::new();
    project_db::create_table(
        &pool,
        &session.table,
        &session.header,
        &session.value_types,
        |name| registry.value_type(name).map(|v| v.base),
    )
    .await?;

    // Stream through the csv reader when the dialect allows it; exotic
    // delimiters fall back to the rows the inference pass already parsed.
    let streamed = {
        let text = super::encoding::decode_text(&bytes, &session.encoding)?;
        let skip = session.comment_lines + if outcome.header_detected { 1 } else { 0 };
        let body: String = text
            .lines()
            .skip(skip)
            .flat_map(|line| [line, "\n"])
            .collect();
        project_db::import_csv(
            &pool,
            &session.table,
            &session.header,
            &body,
            &session.delimiter,
            &session.enclosing,
        )
        .await
    };
    if streamed.is_err() {
        // start from a clean table so a partial stream leaves nothing behind
        project_db::create_table(
            &pool,
            &session.table,
            &session.header,
            &session.value_types,
            |name| registry.value_type(name).map(|v| v.base),
        )
        .await?;
        project_db::insert_rows(&pool, &session.table, &session.header, &outcome.rows).await?;
    }

    metadata::save_session(&pool, &session).await?;
    info!(project = name, "project imported");

    Ok(ProjectContext {
        session,
        registry,
        pool,
        directory: directory.to_path_buf(),
    })
}

/// Reopen an existing project from its metadata. Builds a fresh session
/// and registry; nothing from a previously open project survives.
pub async fn reopen_project(config: &AppConfig, name: &str) -> Result<ProjectContext> {
    let directory = config.workspace_dir.join(name);
    if !fs::try_exists(&directory).await? {
        return Err(AppError::NotFound(format!("Project \"{}\"", name)));
    }
    // database file name follows the fixed <project>.sqlite convention
    let pool = project_db::connect_file(&directory.join(format!("{}.sqlite", name))).await?;
    let mut session = metadata::load_session(&pool).await?;
    session.directory = directory.clone();
    let registry = registry_from_session(&session);
    info!(project = name, "project reopened");
    Ok(ProjectContext {
        session,
        registry,
        pool,
        directory,
    })
}

/// Fold the staged history into the session, persist it, and commit by
/// regenerating and running the pipeline script. A failed interpreter run
/// leaves the staged state saved so the user can retry.
pub async fn commit_staged(
    context: &mut ProjectContext,
    staged: Vec<StagedAction>,
    interpreter: &str,
) -> Result<PipelineRun> {
    for action in staged {
        match action {
            StagedAction::DeleteColumn { column, .. } => {
                context.session.stage_column_delete(column);
            }
            StagedAction::DeleteRow { row } => {
                context.session.stage_row_delete(row);
            }
            StagedAction::RenameHeader { column, new, .. } => {
                if let Some(slot) = context.session.header.get_mut(column) {
                    *slot = new;
                }
            }
            StagedAction::ChangeValueType { column, new, .. } => {
                if let Some(slot) = context.session.value_types.get_mut(column) {
                    *slot = new;
                }
            }
        }
    }
    context.save().await?;
    run_pipeline(interpreter, &context.directory, &context.session).await
}
