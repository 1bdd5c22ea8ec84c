use std::fmt;
use std::sync::Arc;

/// Opaque session state owned by the session/transaction layer. The router
/// only threads it through to the scatter executor.
pub trait SessionState: Send + Sync + fmt::Debug {}

/// Thin nil-guard around an optional session, so downstream code never has
/// to branch on "no session" (plain autocommit statements).
#[derive(Debug, Clone, Default)]
pub struct SafeSession {
    state: Option<Arc<dyn SessionState>>,
}

impl SafeSession {
    pub fn new(state: Option<Arc<dyn SessionState>>) -> Self {
        SafeSession { state }
    }

    pub fn none() -> Self {
        SafeSession::default()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&Arc<dyn SessionState>> {
        self.state.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestSession;

    impl SessionState for TestSession {}

    #[test]
    fn test_nil_guard() {
        let none = SafeSession::none();
        assert!(!none.is_active());
        assert!(none.state().is_none());

        let some = SafeSession::new(Some(Arc::new(TestSession)));
        assert!(some.is_active());
    }
}
