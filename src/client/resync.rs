//! One-shot clock resync for signed calls.
//!
//! ```text
//! sign(local clock) -> send -> ok
//!                           -> timestamp error (151/152)
//!                                -> fetch server time -> sign(server time) -> send -> ok | error
//!                                -> fetch failed      -> ClockSync error
//!                           -> any other error -> returned as is
//! ```

use tracing::{debug, warn};

use super::{SubmailClient, SubmailError};
use crate::signing::{ParameterSet, Signer};
use crate::transport::Method;

impl SubmailClient {
    /// Sign and send `params`, retrying once with the server clock when the
    /// local timestamp is rejected.
    ///
    /// The auth mode is read once, so both attempts use the same mode even if
    /// [`SubmailClient::set_auth_mode`] runs concurrently.
    pub(super) async fn execute(
        &self,
        method: Method,
        path: &'static str,
        params: ParameterSet,
    ) -> Result<String, SubmailError> {
        let mode = self.auth_mode();
        let signer = Signer::new(&self.credential, mode);
        debug!(endpoint = path, auth_mode = ?mode, "signing SUBMAIL request");

        let first = self
            .send_once(method, path, signer.authorize(params.clone(), (self.clock)()))
            .await;
        let original = match first {
            Err(SubmailError::Api(err)) if err.is_timestamp_related() => err,
            other => return other,
        };

        warn!(
            endpoint = path,
            code = original.code.as_i32(),
            "request timestamp rejected; resyncing with server clock"
        );
        let server_time = match self.server_timestamp().await {
            Ok(timestamp) => timestamp,
            Err(source) => {
                return Err(SubmailError::ClockSync {
                    original,
                    source: Box::new(source),
                });
            }
        };

        debug!(endpoint = path, timestamp = server_time.value(), "retrying with server time");
        self.send_once(method, path, signer.authorize(params, server_time))
            .await
    }
}
