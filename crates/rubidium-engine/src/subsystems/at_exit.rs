//! At-exit actions.

use parking_lot::Mutex;

use crate::EngineError;

/// A registered exit action. Receives whether the shutdown is a normal
/// exit.
pub type AtExitAction = Box<dyn FnOnce(bool) -> Result<(), EngineError> + Send>;

/// Runs registered actions at shutdown, last-registered first.
///
/// One failing action never prevents the remaining actions from
/// running; failures are collected and returned to the caller for
/// reporting.
#[derive(Default)]
pub struct AtExitManager {
    actions: Mutex<Vec<AtExitAction>>,
}

impl AtExitManager {
    /// New manager with no actions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action.
    pub fn register(&self, action: AtExitAction) {
        self.actions.lock().push(action);
    }

    /// Run all actions in reverse registration order, collecting
    /// failures. The action list is drained; a second call runs
    /// nothing.
    pub fn run(&self, normal_exit: bool) -> Vec<EngineError> {
        let actions = std::mem::take(&mut *self.actions.lock());
        let mut failures = Vec::new();

        for action in actions.into_iter().rev() {
            if let Err(error) = action(normal_exit) {
                failures.push(error);
            }
        }

        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn actions_run_in_reverse_registration_order() {
        let manager = AtExitManager::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            manager.register(Box::new(move |_| {
                order.lock().push(tag);
                Ok(())
            }));
        }

        let failures = manager.run(true);
        assert!(failures.is_empty());
        assert_eq!(*order.lock(), vec!["third", "second", "first"]);
    }

    #[test]
    fn one_failure_does_not_stop_the_rest() {
        let manager = AtExitManager::new();
        let ran = Arc::new(AtomicUsize::new(0));

        for fail in [false, true, false] {
            let ran = ran.clone();
            manager.register(Box::new(move |_| {
                ran.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err(EngineError::Unsupported("boom".to_string()))
                } else {
                    Ok(())
                }
            }));
        }

        let failures = manager.run(false);
        assert_eq!(failures.len(), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn second_run_is_empty() {
        let manager = AtExitManager::new();
        manager.register(Box::new(|_| Ok(())));
        assert!(manager.run(true).is_empty());
        assert!(manager.run(true).is_empty());
    }
}
