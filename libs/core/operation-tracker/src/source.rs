//! The two collaborator operations a tracker depends on.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::BoxError;

/// Status and cancel access to one remote operation.
///
/// The operation id is captured by the implementor, so neither method takes
/// arguments. Implementations are usually thin adapters over the transport
/// client.
#[async_trait]
pub trait OperationSource<S>: Send + Sync {
    /// Fetch the current server-side snapshot
    async fn fetch_status(&self) -> Result<S, BoxError>;

    /// Ask the server to cancel the operation
    async fn request_cancel(&self) -> Result<(), BoxError>;
}

type FetchFn<S> = Box<dyn Fn() -> BoxFuture<'static, Result<S, BoxError>> + Send + Sync>;
type CancelFn = Box<dyn Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// [`OperationSource`] built from two closures.
///
/// ```rust,ignore
/// let source = FnSource::new(
///     move || {
///         let api = api.clone();
///         Box::pin(async move { api.status("backup-1").await.map_err(Into::into) })
///     },
///     || Box::pin(async { Ok(()) }),
/// );
/// ```
pub struct FnSource<S> {
    fetch: FetchFn<S>,
    cancel: CancelFn,
}

impl<S> FnSource<S> {
    pub fn new<F, C>(fetch: F, cancel: C) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<S, BoxError>> + Send + Sync + 'static,
        C: Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync + 'static,
    {
        Self {
            fetch: Box::new(fetch),
            cancel: Box::new(cancel),
        }
    }
}

#[async_trait]
impl<S: Send + 'static> OperationSource<S> for FnSource<S> {
    async fn fetch_status(&self) -> Result<S, BoxError> {
        (self.fetch)().await
    }

    async fn request_cancel(&self) -> Result<(), BoxError> {
        (self.cancel)().await
    }
}
