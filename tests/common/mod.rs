//! In-memory store fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use passdesk::error::{Error, Result};
use passdesk::model::{PassRequest, Status, Student};
use passdesk::store::{NewPassRequest, RequestFilter, RequestStore, RosterStore};

pub fn request(
    id: &str,
    date: &str,
    fio: &str,
    status: Status,
    group: &str,
    direction: &str,
) -> PassRequest {
    PassRequest {
        id: id.to_string(),
        date: date.to_string(),
        fio: fio.to_string(),
        reason: "Illness".to_string(),
        status,
        group: group.to_string(),
        direction: direction.to_string(),
    }
}

pub struct MockRequestStore {
    records: Mutex<Vec<PassRequest>>,
    created: Mutex<Vec<NewPassRequest>>,
    fail_updates: bool,
    /// Per-student gates: `student_history` blocks on the gate before
    /// responding, letting tests control resolution order. The fake
    /// deliberately ignores the cancellation token, simulating a
    /// transport that cannot abort mid-flight.
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl MockRequestStore {
    pub fn new(records: Vec<PassRequest>) -> Self {
        Self {
            records: Mutex::new(records),
            created: Mutex::new(Vec::new()),
            fail_updates: false,
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn gate(&self, name: &str, notify: Arc<Notify>) {
        self.gates.lock().unwrap().insert(name.to_string(), notify);
    }

    pub fn created(&self) -> Vec<NewPassRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<PassRequest> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestStore for MockRequestStore {
    async fn query(&self, filter: &RequestFilter) -> Result<Vec<PassRequest>> {
        let mut results: Vec<PassRequest> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.group.as_ref().map_or(true, |g| &r.group == g))
            .filter(|r| filter.student.as_ref().map_or(true, |s| r.fio.contains(s.as_str())))
            .filter(|r| filter.statuses.is_empty() || filter.statuses.contains(&r.status))
            .cloned()
            .collect();
        results.sort_by_key(|r| std::cmp::Reverse(r.date_value()));
        Ok(results)
    }

    async fn create(&self, submission: &NewPassRequest) -> Result<String> {
        let mut created = self.created.lock().unwrap();
        created.push(submission.clone());
        Ok(format!("req-{}", created.len()))
    }

    async fn update_status(&self, id: &str, status: Status) -> Result<()> {
        if self.fail_updates {
            return Err(Error::upstream("simulated store failure"));
        }
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.status = status;
                Ok(())
            }
            None => Err(Error::NotFound(format!("no request with id {id}"))),
        }
    }

    async fn student_history(
        &self,
        name: &str,
        _cancel: &CancellationToken,
    ) -> Result<Vec<PassRequest>> {
        let gate = self.gates.lock().unwrap().get(name).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.fio.contains(name))
            .cloned()
            .collect())
    }
}

pub struct MockRosterStore {
    students: Vec<Student>,
}

impl MockRosterStore {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            students: pairs
                .iter()
                .map(|(name, group)| Student {
                    name: name.to_string(),
                    group: group.to_string(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl RosterStore for MockRosterStore {
    async fn students(&self) -> Result<Vec<Student>> {
        Ok(self.students.clone())
    }

    async fn contains(&self, name: &str, group: &str) -> Result<bool> {
        Ok(self
            .students
            .iter()
            .any(|s| s.name == name && s.group == group))
    }
}
