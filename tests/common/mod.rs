#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, sync::Mutex};

use chrono::NaiveDate;
use obra_finance::{core::FixedClock, state::StateManager};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the calling test.
pub fn test_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn march_2024() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
}

/// A state manager over an isolated directory with the clock frozen on 2024-03-01.
pub fn setup_test_env() -> (PathBuf, StateManager) {
    let home = test_home();
    let state = StateManager::open(home.clone(), 3, Arc::new(FixedClock::on(march_2024())))
        .expect("open state in temp dir");
    (home, state)
}
