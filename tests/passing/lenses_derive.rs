use appcell::*;

#[derive(Clone, Debug, PartialEq, Lenses)]
pub struct Session {
    pub token: Option<String>,
    pub retries: u8,
    r#type: String,
}

#[derive(Clone, Lenses)]
struct Wrapper<T: Clone> {
    inner: Option<T>,
    label: &'static str,
}

appcell::state!(SESSION: Option<Session> = Some(Session {
    token: None,
    retries: 0,
    r#type: "guest".to_string(),
}));

fn main() {
    let container = Container::new();
    let mut token = container.slice(&SESSION, Session::TOKEN);
    let retries = container.constant(&SESSION, Session::RETRIES);
    token.set(Some("abc".to_string()));
    assert_eq!(token.value().as_deref(), Some("abc"));
    assert_eq!(retries.value(), Some(0));
    assert_eq!(Session::TYPE.project(&container.state(&SESSION).value().unwrap()), Some("guest".to_string()));

    let wrapper = Wrapper { inner: Some(1u32), label: "one" };
    assert_eq!(Wrapper::<u32>::INNER.project(&wrapper), Some(1));
    assert_eq!(Wrapper::<u32>::LABEL.project(&wrapper), Some("one"));
}
