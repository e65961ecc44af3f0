//! In-memory store implementation.

use super::{BoxFuture, ElementStore, SessionRecord, StorageError, StorageResult};
use crate::camera::CanvasState;
use crate::elements::{Element, ElementId, ElementPatch};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    elements: RwLock<HashMap<String, Vec<Element>>>,
}

fn lock_error(err: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", err))
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ElementStore for MemoryStore {
    fn create_element(&self, session: &str, element: &Element) -> BoxFuture<'_, StorageResult<()>> {
        let session = session.to_string();
        let element = element.clone();
        Box::pin(async move {
            let mut elements = self.elements.write().map_err(lock_error)?;
            let list = elements.entry(session).or_default();
            match list.iter_mut().find(|e| e.id == element.id) {
                Some(existing) => *existing = element,
                None => list.push(element),
            }
            Ok(())
        })
    }

    fn update_element(
        &self,
        session: &str,
        id: ElementId,
        patch: &ElementPatch,
    ) -> BoxFuture<'_, StorageResult<Element>> {
        let session = session.to_string();
        let patch = patch.clone();
        Box::pin(async move {
            let mut elements = self.elements.write().map_err(lock_error)?;
            let element = elements
                .get_mut(&session)
                .and_then(|list| list.iter_mut().find(|e| e.id == id))
                .ok_or_else(|| StorageError::NotFound(format!("element {id}")))?;
            patch.apply(element);
            Ok(element.clone())
        })
    }

    fn delete_element(&self, session: &str, id: ElementId) -> BoxFuture<'_, StorageResult<()>> {
        let session = session.to_string();
        Box::pin(async move {
            let mut elements = self.elements.write().map_err(lock_error)?;
            let list = elements
                .get_mut(&session)
                .ok_or_else(|| StorageError::NotFound(format!("element {id}")))?;
            let before = list.len();
            list.retain(|e| e.id != id);
            if list.len() == before {
                return Err(StorageError::NotFound(format!("element {id}")));
            }
            Ok(())
        })
    }

    fn list_elements(&self, session: &str) -> BoxFuture<'_, StorageResult<Vec<Element>>> {
        let session = session.to_string();
        Box::pin(async move {
            let elements = self.elements.read().map_err(lock_error)?;
            Ok(elements.get(&session).cloned().unwrap_or_default())
        })
    }

    fn get_session(&self, session: &str) -> BoxFuture<'_, StorageResult<SessionRecord>> {
        let session = session.to_string();
        Box::pin(async move {
            let sessions = self.sessions.read().map_err(lock_error)?;
            sessions
                .get(&session)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(format!("session {session}")))
        })
    }

    fn create_session(&self, record: &SessionRecord) -> BoxFuture<'_, StorageResult<()>> {
        let record = record.clone();
        Box::pin(async move {
            let mut sessions = self.sessions.write().map_err(lock_error)?;
            sessions.insert(record.id.clone(), record);
            Ok(())
        })
    }

    /// Creates the session record on first write.
    fn update_session(
        &self,
        session: &str,
        state: &CanvasState,
    ) -> BoxFuture<'_, StorageResult<SessionRecord>> {
        let session = session.to_string();
        let state = state.clone();
        Box::pin(async move {
            let mut sessions = self.sessions.write().map_err(lock_error)?;
            let record = sessions
                .entry(session.clone())
                .or_insert_with(|| SessionRecord::new(session.clone(), session));
            record.canvas_state = state;
            Ok(record.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementKind, ElementStyle, PathShape};
    use crate::storage::block_on;
    use kurbo::Point;

    fn line() -> Element {
        Element::new(
            ElementKind::Line(PathShape {
                points: vec![Point::ZERO, Point::new(5.0, 5.0)],
            }),
            Point::ZERO,
            ElementStyle::default(),
        )
    }

    #[test]
    fn test_create_and_list() {
        let store = MemoryStore::new();
        let element = line();
        block_on(store.create_element("s", &element)).unwrap();

        assert_eq!(block_on(store.list_elements("s")).unwrap(), vec![element]);
        assert!(block_on(store.list_elements("other")).unwrap().is_empty());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = MemoryStore::new();
        block_on(store.create_element("a", &line())).unwrap();
        block_on(store.create_element("b", &line())).unwrap();
        block_on(store.create_element("b", &line())).unwrap();

        assert_eq!(block_on(store.list_elements("a")).unwrap().len(), 1);
        assert_eq!(block_on(store.list_elements("b")).unwrap().len(), 2);
    }

    #[test]
    fn test_update_merges_patch() {
        let store = MemoryStore::new();
        let element = line();
        block_on(store.create_element("s", &element)).unwrap();

        let patch = ElementPatch {
            points: Some(vec![Point::ZERO, Point::new(9.0, 1.0)]),
            ..Default::default()
        };
        let updated = block_on(store.update_element("s", element.id, &patch)).unwrap();
        assert_eq!(updated.points().unwrap()[1], Point::new(9.0, 1.0));
        assert_eq!(updated.style, element.style);
    }

    #[test]
    fn test_not_found() {
        let store = MemoryStore::new();
        let id = ElementId::new_v4();
        assert!(matches!(
            block_on(store.update_element("s", id, &ElementPatch::default())),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            block_on(store.delete_element("s", id)),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            block_on(store.get_session("s")),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::new();
        let element = line();
        block_on(store.create_element("s", &element)).unwrap();
        block_on(store.delete_element("s", element.id)).unwrap();
        assert!(block_on(store.list_elements("s")).unwrap().is_empty());
    }

    #[test]
    fn test_update_session_upserts() {
        let store = MemoryStore::new();
        let state = CanvasState {
            zoom: 2.0,
            ..Default::default()
        };
        let record = block_on(store.update_session("s", &state)).unwrap();
        assert_eq!(record.canvas_state, state);
        assert_eq!(block_on(store.get_session("s")).unwrap().name, "s");
    }
}
