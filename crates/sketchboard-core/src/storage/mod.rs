//! Persistence interfaces and the outbox flush.
//!
//! The board never waits on storage: mutations are queued as [`StoreOp`]s
//! and the host drains them into an [`ElementStore`] whenever convenient.
//! A failed write is logged and dropped; local state is never rolled back.

mod memory;

pub use memory::MemoryStore;

use crate::camera::CanvasState;
use crate::elements::{Element, ElementId, ElementPatch};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A persisted session: its name and view state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub canvas_state: CanvasState,
}

impl SessionRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            canvas_state: CanvasState::default(),
        }
    }
}

/// Backend for element and session persistence, keyed by session id.
pub trait ElementStore: Send + Sync {
    fn create_element(&self, session: &str, element: &Element) -> BoxFuture<'_, StorageResult<()>>;

    /// Merge `patch` into a stored element and return the result.
    fn update_element(
        &self,
        session: &str,
        id: ElementId,
        patch: &ElementPatch,
    ) -> BoxFuture<'_, StorageResult<Element>>;

    fn delete_element(&self, session: &str, id: ElementId) -> BoxFuture<'_, StorageResult<()>>;

    /// Elements of a session in stacking order.
    fn list_elements(&self, session: &str) -> BoxFuture<'_, StorageResult<Vec<Element>>>;

    fn get_session(&self, session: &str) -> BoxFuture<'_, StorageResult<SessionRecord>>;

    fn create_session(&self, record: &SessionRecord) -> BoxFuture<'_, StorageResult<()>>;

    fn update_session(
        &self,
        session: &str,
        state: &CanvasState,
    ) -> BoxFuture<'_, StorageResult<SessionRecord>>;
}

/// A queued write.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Create(Element),
    Update { id: ElementId, patch: ElementPatch },
    Delete(ElementId),
    /// Replace the whole element list (undo/redo, import).
    ReplaceAll(Vec<Element>),
    UpdateSession(CanvasState),
}

impl StoreOp {
    fn describe(&self) -> String {
        match self {
            StoreOp::Create(element) => format!("create {}", element.id),
            StoreOp::Update { id, .. } => format!("update {id}"),
            StoreOp::Delete(id) => format!("delete {id}"),
            StoreOp::ReplaceAll(elements) => format!("replace all ({} elements)", elements.len()),
            StoreOp::UpdateSession(_) => "update session".to_string(),
        }
    }
}

async fn apply_op(store: &dyn ElementStore, session: &str, op: &StoreOp) -> StorageResult<()> {
    match op {
        StoreOp::Create(element) => store.create_element(session, element).await,
        StoreOp::Update { id, patch } => store.update_element(session, *id, patch).await.map(|_| ()),
        StoreOp::Delete(id) => store.delete_element(session, *id).await,
        StoreOp::ReplaceAll(elements) => {
            for existing in store.list_elements(session).await? {
                store.delete_element(session, existing.id).await?;
            }
            for element in elements {
                store.create_element(session, element).await?;
            }
            Ok(())
        }
        StoreOp::UpdateSession(state) => store.update_session(session, state).await.map(|_| ()),
    }
}

/// Write queued operations in order. Failures are logged and skipped.
/// Returns the number of operations that failed.
pub async fn flush_outbox(store: &dyn ElementStore, session: &str, ops: Vec<StoreOp>) -> usize {
    let mut failures = 0;
    for op in &ops {
        if let Err(err) = apply_op(store, session, op).await {
            log::warn!("Failed to persist {} in session {}: {}", op.describe(), session, err);
            failures += 1;
        }
    }
    if !ops.is_empty() {
        log::debug!("Flushed {} store ops ({} failed)", ops.len(), failures);
    }
    failures
}

/// Load a session and its elements.
pub async fn load_session(
    store: &dyn ElementStore,
    session: &str,
) -> StorageResult<(SessionRecord, Vec<Element>)> {
    let record = store.get_session(session).await?;
    let elements = store.list_elements(session).await?;
    Ok((record, elements))
}

/// Minimal executor for driving store futures in tests.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, Waker};

    let mut cx = Context::from_waker(Waker::noop());
    let mut f = std::pin::pin!(f);
    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{BoxShape, ElementKind, ElementStyle};
    use kurbo::Point;

    fn rect() -> Element {
        Element::new(
            ElementKind::Rectangle(BoxShape {
                width: 10.0,
                height: 10.0,
                label: None,
            }),
            Point::ZERO,
            ElementStyle::default(),
        )
    }

    #[test]
    fn test_flush_applies_ops_in_order() {
        let store = MemoryStore::new();
        let element = rect();
        let id = element.id;
        let ops = vec![
            StoreOp::Create(element),
            StoreOp::Update {
                id,
                patch: ElementPatch {
                    x: Some(42.0),
                    ..Default::default()
                },
            },
        ];

        assert_eq!(block_on(flush_outbox(&store, "s1", ops)), 0);
        let stored = block_on(store.list_elements("s1")).unwrap();
        assert_eq!(stored.len(), 1);
        assert!((stored[0].x - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_flush_continues_after_failure() {
        let store = MemoryStore::new();
        let ops = vec![
            StoreOp::Delete(ElementId::new_v4()),
            StoreOp::Create(rect()),
        ];
        assert_eq!(block_on(flush_outbox(&store, "s1", ops)), 1);
        assert_eq!(block_on(store.list_elements("s1")).unwrap().len(), 1);
    }

    #[test]
    fn test_replace_all() {
        let store = MemoryStore::new();
        block_on(store.create_element("s1", &rect())).unwrap();
        block_on(store.create_element("s1", &rect())).unwrap();

        let replacement = rect();
        let ops = vec![StoreOp::ReplaceAll(vec![replacement.clone()])];
        assert_eq!(block_on(flush_outbox(&store, "s1", ops)), 0);

        let stored = block_on(store.list_elements("s1")).unwrap();
        assert_eq!(stored, vec![replacement]);
    }

    #[test]
    fn test_load_session() {
        let store = MemoryStore::new();
        block_on(store.create_session(&SessionRecord::new("s1", "Sketch"))).unwrap();
        block_on(store.create_element("s1", &rect())).unwrap();

        let (record, elements) = block_on(load_session(&store, "s1")).unwrap();
        assert_eq!(record.name, "Sketch");
        assert_eq!(elements.len(), 1);

        assert!(matches!(
            block_on(load_session(&store, "missing")),
            Err(StorageError::NotFound(_))
        ));
    }
}
