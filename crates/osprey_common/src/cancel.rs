//! Statement cancellation.
//!
//! Every suspension point in the router (topology fetch, vindex callback,
//! scatter dispatch) checks the token before proceeding; once the source
//! fires, in-flight work aborts with `RouterError::Cancelled`.

use tokio::sync::watch;

use crate::error::RouterError;

/// Owning side of a cancellation signal.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        CancelSource { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Fire the signal. All outstanding tokens observe it.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observing side. `CancelToken::never()` is a token that can never fire,
/// for callers without a deadline.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    pub fn never() -> Self {
        CancelToken { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Gate for suspension points: `ctx.check()?`.
    pub fn check(&self) -> Result<(), RouterError> {
        if self.is_cancelled() {
            Err(RouterError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves when the signal fires. Never resolves for `never()` tokens.
    pub async fn cancelled(&self) {
        match &self.rx {
            Some(rx) => {
                let mut rx = rx.clone();
                if *rx.borrow() {
                    return;
                }
                // Source dropped without firing means no cancellation can
                // ever arrive; park forever like a never() token.
                while rx.changed().await.is_ok() {
                    if *rx.borrow() {
                        return;
                    }
                }
                std::future::pending::<()>().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_token() {
        let t = CancelToken::never();
        assert!(!t.is_cancelled());
        assert!(t.check().is_ok());
    }

    #[test]
    fn test_cancel_observed_by_all_tokens() {
        let src = CancelSource::new();
        let t1 = src.token();
        let t2 = src.token();
        assert!(t1.check().is_ok());
        src.cancel();
        assert!(t1.is_cancelled());
        assert!(matches!(t2.check(), Err(RouterError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let src = CancelSource::new();
        let t = src.token();
        let wait = tokio::spawn(async move { t.cancelled().await });
        src.cancel();
        wait.await.unwrap();
    }
}
