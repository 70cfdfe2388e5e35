use winit::keyboard::KeyCode;

use crate::{physics::Gear, world::Control};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Input {
    Control(Control),
    Quit,
}

/// Maps a key press or release to what it does in the game.
pub fn on_key(code: KeyCode, pressed: bool) -> Option<Input> {
    use winit::keyboard::KeyCode as Kc;

    let control = match (code, pressed) {
        (Kc::KeyQ | Kc::Escape, true) => return Some(Input::Quit),
        (Kc::ArrowUp, true) => Control::ThrottleUp,
        (Kc::ArrowDown, true) => Control::ThrottleDown,
        (Kc::Digit1 | Kc::Numpad1, true) => Control::Gear(Gear::First),
        (Kc::Digit2 | Kc::Numpad2, true) => Control::Gear(Gear::Second),
        (Kc::Digit3 | Kc::Numpad3, true) => Control::Gear(Gear::Third),
        (Kc::KeyR, true) => Control::Gear(Gear::Reverse),
        (Kc::KeyN, true) => Control::Gear(Gear::Neutral),
        (Kc::Space, held) => Control::Brake(held),
        _ => return None,
    };
    Some(Input::Control(control))
}
