/// Builds a `ScopeKey`. Without an explicit id the discriminator is the call site,
/// so each invocation site addresses its own slot.
///
/// ```
/// use appcell::{scope, ScopeKey};
/// struct Session;
/// assert_eq!(scope!(Session, "token"), ScopeKey::of::<Session>("token"));
/// ```
#[macro_export]
macro_rules! scope {
    () => {
        $crate::ScopeKey::new(module_path!(), concat!(file!(), ":", line!(), ":", column!()))
    };
    ($owner:ty) => {
        $crate::ScopeKey::of::<$owner>(concat!(file!(), ":", line!(), ":", column!()))
    };
    ($owner:ty, $id:expr) => {
        $crate::ScopeKey::of::<$owner>($id)
    };
}

/// Declares a transient state accessor owned by the current module.
///
/// ```
/// appcell::state!(pub USERNAME: String = "Leif".to_string());
/// appcell::state!(IS_LOADING: bool = false, id = "loading");
/// assert_eq!(USERNAME.id, "USERNAME");
/// assert_eq!(IS_LOADING.id, "loading");
/// ```
#[macro_export]
macro_rules! state {
    ($vis:vis $name:ident : $ty:ty = $init:expr, id = $id:literal) => {
        $vis const $name: $crate::StateDef<$ty> = $crate::StateDef::new(module_path!(), $id, || $init);
    };
    ($vis:vis $name:ident : $ty:ty = $init:expr) => {
        $vis const $name: $crate::StateDef<$ty> = $crate::StateDef::new(module_path!(), stringify!($name), || $init);
    };
}

/// Declares a persisted state accessor; its storage key is `module_path.id`.
#[macro_export]
macro_rules! stored_state {
    ($vis:vis $name:ident : $ty:ty = $init:expr, id = $id:literal) => {
        $vis const $name: $crate::StoredDef<$ty> = $crate::StoredDef::new(module_path!(), $id, || $init);
    };
    ($vis:vis $name:ident : $ty:ty = $init:expr) => {
        $vis const $name: $crate::StoredDef<$ty> = $crate::StoredDef::new(module_path!(), stringify!($name), || $init);
    };
}

/// Declares a dependency; `|container| expr` may resolve other dependencies.
///
/// ```
/// use std::sync::Arc;
/// appcell::dependency!(pub CLOCK: Arc<u64> = |_container| Arc::new(7));
/// let container = appcell::Container::new();
/// assert_eq!(*container.resolve(&CLOCK), 7);
/// ```
#[macro_export]
macro_rules! dependency {
    ($vis:vis $name:ident : $ty:ty = |$c:pat_param| $init:expr, id = $id:literal) => {
        $vis const $name: $crate::DependencyDef<$ty> = $crate::DependencyDef::new(module_path!(), $id, |$c: &$crate::Container| $init);
    };
    ($vis:vis $name:ident : $ty:ty = |$c:pat_param| $init:expr) => {
        $vis const $name: $crate::DependencyDef<$ty> = $crate::DependencyDef::new(module_path!(), stringify!($name), |$c: &$crate::Container| $init);
    };
}
