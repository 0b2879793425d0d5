// ============================================================
// PROJECT STORAGE
// ============================================================
// Workspace layout on disk: one directory per project holding the
// downloaded source, generated artifacts, and the project database

use crate::domain::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

static PROJECT_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_()]+$").unwrap());

/// Validate a project name: letters, digits, underscores and parentheses,
/// at most 255 characters.
pub fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 255 || !PROJECT_NAME_PATTERN.is_match(name) {
        return Err(AppError::ValidationError(
            "Project names may only contain letters, digits, underscores and parentheses."
                .to_string(),
        ));
    }
    Ok(())
}

/// Create the project directory under the workspace. A directory that
/// already exists is reported as [`AppError::ProjectExists`] so the caller
/// can re-prompt for a different name.
pub async fn create_project_dir(workspace: &Path, name: &str) -> Result<PathBuf> {
    validate_project_name(name)?;
    let dir = workspace.join(name);
    if fs::try_exists(&dir).await? {
        return Err(AppError::ProjectExists(name.to_string()));
    }
    fs::create_dir_all(&dir).await?;
    info!(project = name, dir = %dir.display(), "project directory created");
    Ok(dir)
}

/// Project names present in the workspace, sorted.
pub async fn list_projects(workspace: &Path) -> Result<Vec<String>> {
    if !fs::try_exists(workspace).await? {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    let mut entries = fs::read_dir(workspace).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

pub async fn remove_project_dir(workspace: &Path, name: &str) -> Result<()> {
    validate_project_name(name)?;
    let dir = workspace.join(name);
    if !fs::try_exists(&dir).await? {
        return Err(AppError::NotFound(format!("Project \"{}\"", name)));
    }
    fs::remove_dir_all(&dir).await?;
    info!(project = name, "project directory removed");
    Ok(())
}

/// Write a generated artifact as UTF-8, replacing any previous content.
pub async fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content.as_bytes()).await?;
    Ok(())
}

/// Append UTF-8 text to an artifact, creating it if missing.
pub async fn append_text(path: &Path, content: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(content.as_bytes()).await?;
    Ok(())
}

/// Persist the extracted preamble next to the source file as
/// `<file>_comments.txt`. An empty preamble removes a stale side file
/// instead of writing one.
pub async fn write_comments_file(dir: &Path, file_name: &str, preamble: &str) -> Result<()> {
    let stem = file_name.rsplit_once('.').map_or(file_name, |(s, _)| s);
    let path = dir.join(format!("{}_comments.txt", stem));
    if preamble.is_empty() {
        if fs::try_exists(&path).await? {
            fs::remove_file(&path).await?;
        }
        return Ok(());
    }
    write_text(&path, preamble).await
}
