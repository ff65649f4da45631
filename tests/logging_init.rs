use serial_test::serial;

// The subscriber is process-global, so these must not run concurrently
// with anything else touching it.

#[test]
#[serial]
fn init_is_idempotent() {
    portal_shell::logging::init(false);
    portal_shell::logging::init(true);
    tracing::info!("second init is a no-op");
}
