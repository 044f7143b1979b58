//! Test-facing API: synthetic keyboard and mouse, dispatcher draining

mod dispatcher;
mod keyboard;
mod mouse;

pub use dispatcher::DispatcherExt;
pub use keyboard::TestKeyboard;
pub use mouse::{TestMouse, WHEEL_DELTA};
