//! Action registration table.
//!
//! Built from a rendered [`Presentation`]: each row or card registers the
//! actions it offers under `(kind, book id)`. Dispatch looks the key up and
//! yields the [`Intent`] to carry out; keys that were never rendered (a stale
//! button, a mistyped id) resolve to nothing.

use core_library::render::{ActionKind, Presentation};
use core_library::BookId;
use std::collections::HashMap;
use tracing::debug;

/// What a dispatched action asks the dashboard to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    ShowDetails(BookId),
    Issue(BookId),
    Return(BookId),
    Delete(BookId),
}

impl Intent {
    fn for_action(kind: ActionKind, id: BookId) -> Self {
        match kind {
            ActionKind::View => Intent::ShowDetails(id),
            ActionKind::Issue => Intent::Issue(id),
            ActionKind::Return => Intent::Return(id),
            ActionKind::Delete => Intent::Delete(id),
        }
    }

    pub fn book_id(&self) -> BookId {
        match self {
            Intent::ShowDetails(id) | Intent::Issue(id) | Intent::Return(id) | Intent::Delete(id) => {
                *id
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    table: HashMap<(ActionKind, BookId), Intent>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every action offered by `presentation`.
    pub fn from_presentation(presentation: &Presentation) -> Self {
        let mut registry = Self::new();
        for (kind, id) in presentation.book_actions() {
            registry.register(kind, id);
        }
        registry
    }

    pub fn register(&mut self, kind: ActionKind, id: BookId) {
        self.table.insert((kind, id), Intent::for_action(kind, id));
    }

    /// The intent registered under `(kind, id)`, if any.
    pub fn dispatch(&self, kind: ActionKind, id: BookId) -> Option<Intent> {
        let intent = self.table.get(&(kind, id)).copied();
        if intent.is_none() {
            debug!(action = %kind, book_id = %id, "No handler registered, ignoring");
        }
        intent
    }

    pub fn contains(&self, kind: ActionKind, id: BookId) -> bool {
        self.table.contains_key(&(kind, id))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::render::render_books;
    use core_library::{Book, BookStatus, ViewMode};

    fn registry() -> ActionRegistry {
        ActionRegistry::from_presentation(&render_books(
            ViewMode::List,
            &[
                Book::new(1, "Zeta", BookStatus::Available),
                Book::new(2, "Alpha", BookStatus::Issued),
            ],
        ))
    }

    #[test]
    fn test_registered_actions_dispatch() {
        let registry = registry();

        assert_eq!(registry.len(), 6);
        assert_eq!(
            registry.dispatch(ActionKind::Issue, BookId(1)),
            Some(Intent::Issue(BookId(1)))
        );
        assert_eq!(
            registry.dispatch(ActionKind::Return, BookId(2)),
            Some(Intent::Return(BookId(2)))
        );
        assert_eq!(
            registry.dispatch(ActionKind::View, BookId(2)).map(|i| i.book_id()),
            Some(BookId(2))
        );
    }

    #[test]
    fn test_unregistered_key_is_a_no_op() {
        let registry = registry();

        assert_eq!(registry.dispatch(ActionKind::Return, BookId(1)), None);
        assert_eq!(registry.dispatch(ActionKind::Issue, BookId(2)), None);
        assert_eq!(registry.dispatch(ActionKind::Delete, BookId(42)), None);
    }

    #[test]
    fn test_placeholders_register_nothing() {
        assert!(ActionRegistry::from_presentation(&Presentation::Loading).is_empty());
        assert!(ActionRegistry::from_presentation(&render_books(ViewMode::Table, &[])).is_empty());
    }
}
