//! Failure reporting.
//!
//! Sync failures never reach the end user; they are only discoverable in the
//! logs. Each failure goes to CiviCRM's own debug log and to the local
//! `tracing` error channel with the failing method, its params and a
//! backtrace.

use std::backtrace::Backtrace;

use serde::Serialize;

use crate::civicrm::CiviApi;

/// Report a failure to both log destinations.
///
/// Writing to CiviCRM is best effort: when CiviCRM itself is the thing that
/// failed, the local log is the only record.
pub async fn report_failure<P: Serialize + ?Sized + Sync>(
    civi: &dyn CiviApi,
    method: &'static str,
    message: &str,
    params: &P,
) {
    if let Err(e) = civi.debug_log(message).await {
        tracing::debug!(error = %e, "CiviCRM debug log unavailable");
    }

    let params = serde_json::to_string(params).unwrap_or_else(|e| format!("<unserializable: {e}>"));
    let backtrace = Backtrace::force_capture();

    tracing::error!(
        method,
        params = %params,
        backtrace = %backtrace,
        "{message}"
    );
}
