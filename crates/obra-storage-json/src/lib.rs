use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use obra_core::{
    seed::seed_ledger,
    storage::{BackupInfo, LedgerStorage},
    totals, CoreError, IdGenerator,
};
use obra_domain::{Ledger, CURRENT_SCHEMA_VERSION};
use tracing::{debug, info, warn};

const STATE_STEM: &str = "obra_finance";
const STATE_EXTENSION: &str = "json";
const CORRUPT_SUFFIX: &str = "corrupt";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
const TMP_SUFFIX: &str = "tmp";
pub const DEFAULT_RETENTION: usize = 5;

/// Filesystem layout for the state document and its backups.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    /// `<root>/data` and `<root>/backups`.
    pub fn under(root: &Path) -> Self {
        Self {
            data_root: root.join("data"),
            backup_root: root.join("backups"),
        }
    }
}

/// How the state document came to be in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOrigin {
    Existing,
    Seeded,
    /// The previous file could not be parsed and was moved to the given path.
    RecoveredFromCorrupt(PathBuf),
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub ledger: Ledger,
    pub origin: LoadOrigin,
}

/// Filesystem-backed JSON persistence for the application state and its backups.
#[derive(Clone)]
pub struct JsonLedgerStorage {
    data_root: PathBuf,
    backup_root: PathBuf,
    retention: usize,
}

impl JsonLedgerStorage {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.data_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            data_root: paths.data_root,
            backup_root: paths.backup_root,
            retention: retention.max(1),
        })
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_root
            .join(format!("{}.{}", STATE_STEM, STATE_EXTENSION))
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Loads the state document, falling back to the seed dataset.
    ///
    /// A missing file yields the seed. A file that cannot be decoded, or whose
    /// amounts cannot be totalled, is moved aside with a `.corrupt` suffix and
    /// the seed is returned. A document written by a newer schema is refused.
    /// Line amounts, totals, statuses and identifier counters are always
    /// re-derived from the loaded data.
    pub fn load_or_seed(&self) -> Result<LoadOutcome, CoreError> {
        let path = self.state_path();
        if !path.exists() {
            info!(path = %path.display(), "no saved state, starting from seed data");
            return Ok(LoadOutcome {
                ledger: seeded(),
                origin: LoadOrigin::Seeded,
            });
        }
        match load_ledger_from_path(&path) {
            Ok(mut ledger) => {
                ensure_schema_support(&ledger)?;
                if let Err(err) = totals::recompute_all(&mut ledger) {
                    return self.recover(&path, err.to_string());
                }
                IdGenerator::reseed(&mut ledger);
                debug!(path = %path.display(), entries = ledger.entries.len(), "state loaded");
                Ok(LoadOutcome {
                    ledger,
                    origin: LoadOrigin::Existing,
                })
            }
            Err(CoreError::Serde(reason)) => self.recover(&path, reason),
            Err(err) => Err(err),
        }
    }

    fn recover(&self, path: &Path, reason: String) -> Result<LoadOutcome, CoreError> {
        let quarantine = self.quarantine(path)?;
        warn!(
            path = %path.display(),
            moved_to = %quarantine.display(),
            %reason,
            "saved state is unreadable, starting from seed data"
        );
        Ok(LoadOutcome {
            ledger: seeded(),
            origin: LoadOrigin::RecoveredFromCorrupt(quarantine),
        })
    }

    fn quarantine(&self, path: &Path) -> Result<PathBuf, CoreError> {
        let mut target = path.with_extension(format!("{}.{}", STATE_EXTENSION, CORRUPT_SUFFIX));
        let mut attempt = 1;
        while target.exists() {
            attempt += 1;
            target = path.with_extension(format!(
                "{}.{}{}",
                STATE_EXTENSION, CORRUPT_SUFFIX, attempt
            ));
        }
        fs::rename(path, &target)?;
        Ok(target)
    }

    fn write_backup_file(
        &self,
        ledger: &Ledger,
        note: Option<&str>,
    ) -> Result<BackupInfo, CoreError> {
        fs::create_dir_all(&self.backup_root)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", STATE_STEM, timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let path = unique_path(&self.backup_root, &stem);
        write_atomic(&path, &serialize_ledger(ledger)?)?;
        self.prune_backups()?;
        info!(path = %path.display(), "backup written");
        Ok(BackupInfo {
            id: file_name_of(&path),
            created_at: timestamp,
            path,
        })
    }

    fn backup_existing_file(&self, path: &Path) -> Result<(), CoreError> {
        if !path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.backup_root)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let backup_path = unique_path(&self.backup_root, &format!("{}_{}", STATE_STEM, timestamp));
        fs::copy(path, &backup_path)?;
        self.prune_backups()?;
        Ok(())
    }

    /// Automatic copies and noted backups are pruned separately, each down to `retention`.
    fn prune_backups(&self) -> Result<(), CoreError> {
        let (noted, automatic): (Vec<_>, Vec<_>) = self
            .list_backups()?
            .into_iter()
            .partition(|info| has_note(&info.id));
        for entry in [automatic, noted]
            .into_iter()
            .flat_map(|pool| pool.into_iter().skip(self.retention))
        {
            debug!(path = %entry.path.display(), "pruning backup");
            let _ = fs::remove_file(entry.path);
        }
        Ok(())
    }
}

impl LedgerStorage for JsonLedgerStorage {
    fn save(&self, ledger: &Ledger) -> Result<(), CoreError> {
        let path = self.state_path();
        self.backup_existing_file(&path)?;
        save_ledger_to_path(ledger, &path)
    }

    fn load(&self) -> Result<Ledger, CoreError> {
        let mut ledger = self.load_from_path(&self.state_path())?;
        IdGenerator::reseed(&mut ledger);
        Ok(ledger)
    }

    fn exists(&self) -> bool {
        self.state_path().exists()
    }

    fn save_to_path(&self, ledger: &Ledger, path: &Path) -> Result<(), CoreError> {
        if path == self.state_path() {
            return self.save(ledger);
        }
        save_ledger_to_path(ledger, path)
    }

    fn load_from_path(&self, path: &Path) -> Result<Ledger, CoreError> {
        let mut ledger = load_ledger_from_path(path)?;
        ensure_schema_support(&ledger)?;
        totals::recompute_all(&mut ledger)?;
        Ok(ledger)
    }

    fn backup(&self, ledger: &Ledger, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        self.write_backup_file(ledger, note)
    }

    /// Newest first.
    fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        if !self.backup_root.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backup_root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(STATE_EXTENSION) {
                continue;
            }
            let file_name = file_name_of(&path);
            let Some(created) = parse_backup_timestamp(&file_name) else {
                continue;
            };
            entries.push((
                created,
                BackupInfo {
                    id: file_name,
                    created_at: created.format("%Y-%m-%d %H:%M").to_string(),
                    path,
                },
            ));
        }
        entries.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| duplicate_index(&b.1.id).cmp(&duplicate_index(&a.1.id)))
        });
        Ok(entries.into_iter().map(|(_, info)| info).collect())
    }

    fn restore_backup(&self, backup: &BackupInfo) -> Result<Ledger, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let mut ledger = self.load_from_path(&backup.path)?;
        IdGenerator::reseed(&mut ledger);
        self.save(&ledger)?;
        info!(backup = %backup.id, "state restored from backup");
        Ok(ledger)
    }
}

/// Saves a ledger to an arbitrary path on disk via a temporary file and rename.
pub fn save_ledger_to_path(ledger: &Ledger, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    write_atomic(&tmp, &serialize_ledger(ledger)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a ledger from the provided filesystem path.
///
/// Bytes that are not valid UTF-8 JSON surface as `CoreError::Serde`.
pub fn load_ledger_from_path(path: &Path) -> Result<Ledger, CoreError> {
    let data = fs::read(path)?;
    serde_json::from_slice(&data).map_err(|err| CoreError::Serde(err.to_string()))
}

fn ensure_schema_support(ledger: &Ledger) -> Result<(), CoreError> {
    if ledger.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "state schema v{} is newer than supported v{}",
            ledger.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(())
}

fn seeded() -> Ledger {
    let mut ledger = seed_ledger();
    IdGenerator::reseed(&mut ledger);
    ledger
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Reads `YYYYmmdd_HHMM` following the state stem in a backup file name.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let rest = name.strip_prefix(&format!("{}_", STATE_STEM))?;
    let mut segments = rest.split(['_', '.']);
    let date = segments.next()?;
    let time = segments.next()?;
    let time = time.split('-').next()?;
    if !is_digits(date, 8) || !is_digits(time, 4) {
        return None;
    }
    let raw = format!("{}{}", date, time);
    NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// `true` for `obra_finance_20240301_0930_pre-close.json`.
fn has_note(name: &str) -> bool {
    name.strip_prefix(&format!("{}_", STATE_STEM))
        .is_some_and(|rest| rest.split('_').count() > 2)
}

/// `3` for `..._0930-3.json`; `1` when the name carries no numeric suffix.
fn duplicate_index(name: &str) -> u32 {
    name.strip_suffix(&format!(".{}", STATE_EXTENSION))
        .and_then(|stem| stem.rsplit_once('-'))
        .and_then(|(_, suffix)| suffix.parse().ok())
        .unwrap_or(1)
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

/// `<dir>/<stem>.json`, or `<stem>-2.json`, `<stem>-3.json`... when taken.
fn unique_path(dir: &Path, stem: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{}.{}", stem, STATE_EXTENSION));
    let mut attempt = 1;
    while candidate.exists() {
        attempt += 1;
        candidate = dir.join(format!("{}-{}.{}", stem, attempt, STATE_EXTENSION));
    }
    candidate
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}

fn serialize_ledger(ledger: &Ledger) -> Result<String, CoreError> {
    serde_json::to_string_pretty(ledger).map_err(|err| CoreError::Serde(err.to_string()))
}
