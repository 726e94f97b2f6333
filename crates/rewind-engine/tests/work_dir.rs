//! Working-directory handling during `init`.
//!
//! Kept in its own test binary: it changes the process working directory.

use std::env;
use std::sync::Arc;

use rewind_engine::{Session, SessionConfig, SessionError};
use rewind_test_utils::ScriptedPlatform;

#[test]
fn work_dir_is_entered_on_success_and_restored_on_failure() {
    let start = env::current_dir().unwrap();
    let dir = tempfile::tempdir().unwrap();

    // Failed load: the directory switch is undone.
    let mut config = SessionConfig::replay("missing.trace", Arc::new(ScriptedPlatform::new()));
    config.work_dir = Some(dir.path().to_path_buf());
    let session = Session::new();
    let err = session.init(config).unwrap_err();
    assert!(matches!(err, SessionError::LoadTrace { .. }), "{err}");
    assert_eq!(env::current_dir().unwrap(), start);

    // Successful record: relative trace paths resolve against the work dir.
    let mut config = SessionConfig::record("out.trace", Arc::new(ScriptedPlatform::new()));
    config.work_dir = Some(dir.path().to_path_buf());
    session.init(config).unwrap();
    session.update();
    session.quit();
    assert!(dir.path().join("out.trace").exists());

    env::set_current_dir(&start).unwrap();
}
