//! In-process change feed.
//!
//! Every successful write in [`crate::db`] publishes a [`ChangeEvent`]. Views
//! register a [`Subscription`] for one table, one event kind and an optional
//! equality filter; dropping the handle unregisters it.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use tokio::sync::broadcast;

use crate::models::{Answer, Question};

const FEED_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Table {
    Questions,
    Answers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    Question(Question),
    Answer(Answer),
}

impl Record {
    pub fn table(&self) -> Table {
        match self {
            Record::Question(_) => Table::Questions,
            Record::Answer(_) => Table::Answers,
        }
    }

    /// Value of an integer column, `None` if the table has no such column.
    fn column(&self, column: Column) -> Option<i32> {
        match (self, column) {
            (Record::Question(q), Column::Id) => Some(q.id),
            (Record::Question(q), Column::StudentId) => Some(q.student_id),
            (Record::Question(q), Column::TeacherId) => Some(q.teacher_id),
            (Record::Question(_), Column::QuestionId) => None,
            (Record::Answer(a), Column::Id) => Some(a.id),
            (Record::Answer(_), Column::StudentId) => None,
            (Record::Answer(a), Column::TeacherId) => Some(a.teacher_id),
            (Record::Answer(a), Column::QuestionId) => Some(a.question_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub record: Record,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    Id,
    StudentId,
    TeacherId,
    QuestionId,
}

/// Equality filter on an integer column, e.g. `student_id = 7`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Filter {
    pub column: Column,
    pub value: i32,
}

impl Filter {
    pub fn eq(column: Column, value: i32) -> Self {
        Self { column, value }
    }

    fn matches(&self, record: &Record) -> bool {
        record.column(self.column) == Some(self.value)
    }
}

#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
    next_id: Arc<AtomicU64>,
    live: Arc<Mutex<HashSet<u64>>>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
            live: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn publish(&self, kind: ChangeKind, record: Record) {
        // No receivers is the normal state when nobody has a dashboard open.
        let _ = self.tx.send(ChangeEvent { kind, record });
    }

    pub fn subscribe(&self, table: Table, kind: ChangeKind, filter: Option<Filter>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry().insert(id);
        tracing::debug!(subscription = id, ?table, ?kind, ?filter, "subscription registered");

        Subscription {
            id,
            table,
            kind,
            filter,
            rx: self.tx.subscribe(),
            live: self.live.clone(),
        }
    }

    /// Explicit counterpart of dropping the handle.
    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    pub fn active_subscriptions(&self) -> usize {
        self.registry().len()
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, HashSet<u64>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct Subscription {
    id: u64,
    table: Table,
    kind: ChangeKind,
    filter: Option<Filter>,
    rx: broadcast::Receiver<ChangeEvent>,
    live: Arc<Mutex<HashSet<u64>>>,
}

impl Subscription {
    fn wants(&self, event: &ChangeEvent) -> bool {
        event.kind == self.kind
            && event.record.table() == self.table
            && self.filter.map_or(true, |f| f.matches(&event.record))
    }

    /// Next matching event, `None` once the feed is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(subscription = self.id, skipped, "change feed lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.live
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.id);
        tracing::debug!(subscription = self.id, "subscription dropped");
    }
}
