//! Redirects keyboard and mouse queries to synthetic state
//!
//! Installation is process-wide and permanent: there is no uninstall. Every
//! `TestKeyboard` and `TestMouse` call [`install`] on construction, so it is safe to call
//! from any number of test setups.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static INSTALL: Once = Once::new();
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Route all keyboard and mouse queries to synthetic state from now on
pub fn install() {
    INSTALL.call_once(|| {
        INSTALLED.store(true, Ordering::Release);
        tracing::info!("Input queries now answered from synthetic state");
    });
}

pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::Acquire)
}
