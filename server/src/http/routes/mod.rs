pub mod direct_delegation;
pub mod overview;
pub mod wallet_calls;

use demo_core::error::DemoError;

use super::error::ApiDemoError;

/// Run an action on its own task. The panel transitions it makes run to the
/// end even if the client disconnects mid-request.
pub(crate) async fn run_detached<T: Send + 'static>(
    action: impl Future<Output = Result<T, ApiDemoError>> + Send + 'static,
) -> Result<T, ApiDemoError> {
    tokio::spawn(action).await.map_err(|e| {
        ApiDemoError(DemoError::InternalError {
            message: format!("Action task failed: {e}"),
        })
    })?
}
