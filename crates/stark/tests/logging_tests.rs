//! The global subscriber can only be installed once per process, so this
//! lives in its own test binary.

use stark::logging::{self, LogFormat};
use stark::StarkError;

#[test]
fn test_init_installs_once() {
    logging::init("stark=debug", LogFormat::Json).unwrap();
    log::info!("bridged through tracing-log");
    tracing::info!(job_id = "job-1", "native tracing event");

    let err = logging::init("stark=debug", LogFormat::Text).unwrap_err();
    assert!(matches!(err, StarkError::Logging(_)));
}
