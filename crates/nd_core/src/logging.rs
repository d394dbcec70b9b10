use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber once. Safe to call from every
/// entry point and from tests.
pub fn init() {
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            tracing_subscriber::fmt().with_max_level(Level::INFO).init();
        });
    }
}
