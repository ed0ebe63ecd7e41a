use crate::action::Action;
use crate::reducer::reduce;
use crate::state::AppState;
use std::cell::RefCell;
use std::rc::Rc;

/// Owner of the [`AppState`], mutated only through [`AppStore::dispatch`].
///
/// This struct is cheaply cloneable (via `Rc`) so async tasks on a
/// single-threaded executor can each hold a handle. Borrows are scoped to a
/// single call and never held across an `.await`.
#[derive(Clone, Default)]
pub struct AppStore {
    state: Rc<RefCell<AppState>>,
}

impl AppStore {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn dispatch(&self, action: Action) {
        reduce(&mut self.state.borrow_mut(), action);
    }

    /// Apply a batch of actions under one borrow, so no other dispatch can
    /// land between them.
    pub fn dispatch_all<I: IntoIterator<Item = Action>>(&self, actions: I) {
        let mut state = self.state.borrow_mut();
        for action in actions {
            reduce(&mut state, action);
        }
    }

    /// Run a closure against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }
}
