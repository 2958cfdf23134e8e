#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};

use inventorist::store::{Clock, RecordStore};
use inventorist::view::ItemView;

/// Manually driven clock. Every reading advances it by one second so
/// consecutive mutations get distinct timestamps.
#[derive(Clone)]
pub struct TestClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl TestClock {
    pub fn new() -> Self {
        Self::starting_at(base_time())
    }

    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap() = at;
    }

    pub fn peek(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    pub fn clock(&self) -> Clock {
        let now = self.now.clone();
        Arc::new(move || {
            let mut now = now.lock().unwrap();
            let current = *now;
            *now = current + Duration::seconds(1);
            current
        })
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    base_time() + Duration::seconds(seconds)
}

pub async fn test_store(clock: &TestClock) -> RecordStore {
    RecordStore::in_memory().await.unwrap().with_clock(clock.clock())
}

pub fn names(view: &ItemView) -> Vec<String> {
    view.items.iter().map(|item| item.name.clone()).collect()
}
