//! # Job File I/O
//!
//! Handles job file operations with safety features:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **File locking**: Prevent two people editing the same job on a shared drive
//! - **Version validation**: Ensure schema compatibility
//!
//! ## File Format
//!
//! Jobs are saved as `.vlt` files containing JSON. Lock files use the
//! `.vlt.lock` extension and record who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use calc_core::file_io::{save_project, FileLock};
//! use calc_core::project::Project;
//! use std::path::Path;
//!
//! let project = Project::new("Sam Sparks", "J-1042", "Mrs Patel");
//! let path = Path::new("j-1042.vlt");
//!
//! let lock = FileLock::acquire(path, "sam@sparks.co.uk").unwrap();
//! save_project(&project, path).unwrap();
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{CalcError, CalcResult};
use crate::project::{Project, SCHEMA_VERSION};

/// File extension for job files
pub const JOB_EXTENSION: &str = "vlt";

/// Locks older than this are treated as abandoned
const STALE_LOCK_HOURS: i64 = 24;

/// Lock file metadata stored in .vlt.lock files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

/// File lock guard that releases the lock when dropped.
///
/// Combines an OS-level lock (fs2) with a `.lock` file holding
/// [`LockInfo`] so other users can see who has the job open.
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a job file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired
    /// * `Err(CalcError::FileLocked)` - Someone else holds a live lock
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if lock_path.exists() {
            if let Ok(existing) = read_lock_info(&lock_path) {
                if !is_lock_stale(&existing) {
                    return Err(CalcError::file_locked(
                        path.display().to_string(),
                        format!("{} ({})", existing.user_id, existing.machine),
                        existing.locked_at.to_rfc3339(),
                    ));
                }
                warn!(path = %path.display(), holder = %existing.user_id, "taking over stale lock");
            }
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| CalcError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        // The holder's metadata must survive a failed attempt, so clear only once locked
        lock_file.try_lock_exclusive().map_err(|_| {
            CalcError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;
        lock_file
            .set_len(0)
            .map_err(|e| CalcError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;

        let lock_json = serde_json::to_string_pretty(&info).map_err(CalcError::serialization)?;
        lock_file
            .write_all(lock_json.as_bytes())
            .map_err(|e| CalcError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;
        lock_file
            .sync_all()
            .map_err(|e| CalcError::file_error("sync lock", lock_path.display().to_string(), e.to_string()))?;

        debug!(path = %path.display(), user = %info.user_id, "lock acquired");

        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Check if a file is locked without acquiring the lock.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if !lock_path.exists() {
            return None;
        }
        read_lock_info(&lock_path).ok().filter(|info| !is_lock_stale(info))
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
        debug!(path = %self.project_path.display(), "lock released");
    }
}

/// `job.vlt` -> `job.vlt.<suffix>`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let extension = sibling
        .extension()
        .map(|e| format!("{}.{}", e.to_string_lossy(), suffix))
        .unwrap_or_else(|| suffix.to_string());
    sibling.set_extension(extension);
    sibling
}

fn lock_path_for(project_path: &Path) -> PathBuf {
    sibling_path(project_path, "lock")
}

fn tmp_path_for(project_path: &Path) -> PathBuf {
    sibling_path(project_path, "tmp")
}

fn read_lock_info(lock_path: &Path) -> CalcResult<LockInfo> {
    let mut contents = String::new();
    File::open(lock_path)
        .and_then(|mut f| f.read_to_string(&mut contents))
        .map_err(|e| CalcError::file_error("read lock", lock_path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&contents).map_err(CalcError::serialization)
}

/// A lock is stale when its process is gone (same machine) or it is older
/// than a day.
fn is_lock_stale(info: &LockInfo) -> bool {
    if hostname().is_some_and(|ours| ours == info.machine) && !process_alive(info.pid) {
        return true;
    }
    (Utc::now() - info.locked_at).num_hours() > STALE_LOCK_HOURS
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    fs::metadata(format!("/proc/{}", pid)).is_ok()
}

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    use std::process::Command;
    Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()))
        .unwrap_or(true)
}

#[cfg(not(any(unix, windows)))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Save a job with atomic write semantics.
///
/// Serializes to JSON, writes `<path>.tmp`, syncs it to disk and renames it
/// over `path`.
pub fn save_project(project: &Project, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(project).map_err(CalcError::serialization)?;
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .write_all(json.as_bytes())
        .map_err(|e| CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .sync_all()
        .map_err(|e| CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    info!(path = %path.display(), items = project.item_count(), "job saved");
    Ok(())
}

/// Load a job from a file.
///
/// # Returns
///
/// * `Err(CalcError::VersionMismatch)` - File version is incompatible
/// * `Err(CalcError::SerializationError)` - Invalid JSON
/// * `Err(CalcError::FileError)` - I/O error
pub fn load_project(path: &Path) -> CalcResult<Project> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

    let project: Project = serde_json::from_str(&contents)
        .map_err(|e| CalcError::serialization(format!("Invalid JSON in {}: {}", path.display(), e)))?;

    validate_version(&project.meta.version)?;

    debug!(path = %path.display(), items = project.item_count(), "job loaded");
    Ok(project)
}

/// Load a job along with any live lock another user holds on it.
pub fn load_project_with_lock_check(path: &Path) -> CalcResult<(Project, Option<LockInfo>)> {
    let project = load_project(path)?;
    let lock_info = FileLock::check(path);
    Ok((project, lock_info))
}

/// Major versions must match; within 0.x the file's minor may not be newer.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let parse = |v: &str| -> Option<Vec<u32>> { v.split('.').map(|p| p.parse().ok()).collect() };

    let file_parts = parse(file_version).filter(|p| !p.is_empty()).ok_or_else(mismatch)?;
    let current_parts = parse(SCHEMA_VERSION).ok_or_else(mismatch)?;

    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }
    if current_parts[0] == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::{CalculationItem, VoltageDropInput};
    use tempfile::TempDir;

    fn job_path(dir: &TempDir, name: &str) -> PathBuf {
        dir.path().join(format!("{}.{}", name, JOB_EXTENSION))
    }

    #[test]
    fn test_sibling_paths() {
        let path = Path::new("/jobs/j-1042.vlt");
        assert_eq!(lock_path_for(path), Path::new("/jobs/j-1042.vlt.lock"));
        assert_eq!(tmp_path_for(path), Path::new("/jobs/j-1042.vlt.tmp"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = job_path(&dir, "roundtrip");

        let mut project = Project::new("Sam Sparks", "J-1042", "Mrs Patel");
        project.meta.site_address = "12 High Street".to_string();
        project.add_item(CalculationItem::VoltageDrop(VoltageDropInput {
            mv_per_a_m: Some(18.0),
            length_m: 20.0,
            current_a: 20.0,
            ..VoltageDropInput::new("Kitchen")
        }));
        save_project(&project, &path).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.meta.job_ref, "J-1042");
        assert_eq!(loaded.meta.site_address, "12 High Street");
        assert_eq!(loaded.item_count(), 1);
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let dir = TempDir::new().unwrap();
        let path = job_path(&dir, "bad");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_project(&path).unwrap_err().error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_project(&job_path(&dir, "missing")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_load_rejects_newer_schema() {
        let dir = TempDir::new().unwrap();
        let path = job_path(&dir, "future");
        let mut project = Project::new("Sam Sparks", "J-1", "Client");
        project.meta.version = "0.9.0".to_string();
        save_project(&project, &path).unwrap();
        assert_eq!(load_project(&path).unwrap_err().error_code(), "VERSION_MISMATCH");
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let path = job_path(&dir, "locked");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "sam@sparks.co.uk").unwrap();
        assert_eq!(lock.info.user_id, "sam@sparks.co.uk");
        assert_eq!(lock.project_path(), path.as_path());
        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());

        drop(lock);
        assert!(!lock_path.exists());
    }

    #[test]
    fn test_old_lock_is_stale() {
        let mut info = LockInfo::new("someone");
        info.machine = "another-van".to_string();
        assert!(!is_lock_stale(&info));
        info.locked_at = Utc::now() - chrono::Duration::hours(25);
        assert!(is_lock_stale(&info));
    }

    #[test]
    fn test_live_foreign_lock_blocks() {
        let dir = TempDir::new().unwrap();
        let path = job_path(&dir, "shared");
        let mut info = LockInfo::new("colleague@sparks.co.uk");
        info.machine = "office-pc".to_string();
        fs::write(lock_path_for(&path), serde_json::to_string(&info).unwrap()).unwrap();

        let err = FileLock::acquire(&path, "sam@sparks.co.uk").err().unwrap();
        assert_eq!(err.error_code(), "FILE_LOCKED");
        assert!(err.is_recoverable());
        assert_eq!(FileLock::check(&path).unwrap().user_id, "colleague@sparks.co.uk");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_acquire_keeps_holder_info() {
        let dir = TempDir::new().unwrap();
        let path = job_path(&dir, "held");
        let holder = FileLock::acquire(&path, "sam@sparks.co.uk").unwrap();

        // Holder still has the OS lock but its metadata has aged past the stale window
        let mut aged = holder.info.clone();
        aged.locked_at = Utc::now() - chrono::Duration::hours(25);
        let lock_path = lock_path_for(&path);
        fs::write(&lock_path, serde_json::to_string(&aged).unwrap()).unwrap();

        let err = FileLock::acquire(&path, "colleague@sparks.co.uk").err().unwrap();
        assert_eq!(err.error_code(), "FILE_LOCKED");
        assert_eq!(read_lock_info(&lock_path).unwrap(), aged);
        drop(holder);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("abc").is_err());
    }

    #[test]
    fn test_load_with_lock_check() {
        let dir = TempDir::new().unwrap();
        let path = job_path(&dir, "lock_check");
        save_project(&Project::new("Sam", "J-2", "Client"), &path).unwrap();

        let (loaded, lock_info) = load_project_with_lock_check(&path).unwrap();
        assert_eq!(loaded.meta.job_ref, "J-2");
        assert!(lock_info.is_none());
    }
}
