//! Input model: keys, the keyboard and mouse query surfaces, and the
//! synthetic state behind them

pub mod device;
pub mod interceptor;
pub mod key;
pub mod mouse;
pub mod synthetic;

pub use device::{set_backend, DetachedKeyboard, Keyboard, KeyboardDevice, PrimaryKeyboardDevice};
pub use key::{Key, ModifierKeys};
pub use mouse::{DetachedMouse, Mouse, MouseDevice, PrimaryMouseDevice};
pub use synthetic::{SyntheticKeyState, SyntheticMouseState};
