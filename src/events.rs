//! Change event dispatch
//!
//! Observers are registered on a collection descriptor and invoked
//! sequentially after a successful mutation. A failing observer propagates
//! its error to the caller; the mutation itself has already been applied.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::document::Document;
use crate::types::Result;

/// Caller-supplied context value forwarded to change observers
pub type Context = Arc<dyn Any + Send + Sync>;

/// Kind of mutation that produced a change event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Document was created
    Create,
    /// Document was updated
    Update,
}

/// A change notification delivered to observers
#[derive(Clone)]
pub struct ChangeEvent<D: Document> {
    /// Mutation kind
    pub kind: EventKind,
    /// Document state after the mutation
    pub document: D,
    /// Context value of the client that performed the mutation
    pub context: Option<Context>,
}

/// Observer callback invoked after create/update mutations.
///
/// Implemented for any `Fn(ChangeEvent<D>) -> impl Future` closure, so
/// handlers are usually registered as async closures.
pub trait ChangeHandler<D: Document>: Send + Sync {
    /// Handle one change event
    fn handle(&self, event: ChangeEvent<D>) -> BoxFuture<'static, Result<()>>;
}

impl<D, F, Fut> ChangeHandler<D> for F
where
    D: Document,
    F: Fn(ChangeEvent<D>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn handle(&self, event: ChangeEvent<D>) -> BoxFuture<'static, Result<()>> {
        Box::pin(self(event))
    }
}

/// Invoke every observer for one event, in registration order
pub(crate) async fn dispatch<D: Document>(
    observers: &[Arc<dyn ChangeHandler<D>>],
    kind: EventKind,
    document: &D,
    context: Option<&Context>,
) -> Result<()> {
    for observer in observers {
        observer
            .handle(ChangeEvent {
                kind,
                document: document.clone(),
                context: context.cloned(),
            })
            .await?;
    }

    Ok(())
}
