use appcell::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Absence)]
struct Theme {
    dark: bool,
}

#[derive(Clone, Serialize, Deserialize, Absence)]
enum Mode {
    Light,
    Dark,
}

appcell::stored_state!(THEME: Theme = Theme { dark: false });
appcell::stored_state!(MODE: Mode = Mode::Light);

fn main() {
    let container = Container::new();
    container.stored_state(&THEME).set(Theme { dark: true });
    container.stored_state(&MODE).set(Mode::Dark);
    assert!(!Theme { dark: true }.is_absent());
    assert!(container.stored_state(&THEME).value().dark);
    assert!(matches!(container.stored_state(&MODE).value(), Mode::Dark));
}
