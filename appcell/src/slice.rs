use std::marker::PhantomData;
use crate::state::MutableState;
use crate::{debug, State};

/// Projects one field out of a composite `C` and writes it back.
///
/// The slice value is always `Option<Self::Value>`: `None` when the parent is absent,
/// and for optional fields also when the field itself is `None`.
pub trait Lens<C>: Copy {
    type Value: Clone;

    fn project(&self, parent: &C) -> Option<Self::Value>;

    /// Writes `value` into `parent`; returns false when the write is ignored.
    fn assign(&self, parent: &mut C, value: Option<Self::Value>) -> bool;
}

/// Lens onto a non-optional field. Writing `None` is ignored: the field has no absence.
pub struct Field<C, F> {
    get: fn(&C) -> &F,
    get_mut: fn(&mut C) -> &mut F,
}

impl<C, F> Field<C, F> {
    pub const fn new(get: fn(&C) -> &F, get_mut: fn(&mut C) -> &mut F) -> Self {
        Self { get, get_mut }
    }
}

impl<C, F> Clone for Field<C, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, F> Copy for Field<C, F> {}

impl<C, F: Clone> Lens<C> for Field<C, F> {
    type Value = F;

    fn project(&self, parent: &C) -> Option<F> {
        Some((self.get)(parent).clone())
    }

    fn assign(&self, parent: &mut C, value: Option<F>) -> bool {
        match value {
            Some(value) => {
                *(self.get_mut)(parent) = value;
                true
            }
            None => false,
        }
    }
}

/// Lens onto an `Option<F>` field. Writing `None` clears only this field.
pub struct OptionalField<C, F> {
    get: fn(&C) -> &Option<F>,
    get_mut: fn(&mut C) -> &mut Option<F>,
}

impl<C, F> OptionalField<C, F> {
    pub const fn new(get: fn(&C) -> &Option<F>, get_mut: fn(&mut C) -> &mut Option<F>) -> Self {
        Self { get, get_mut }
    }
}

impl<C, F> Clone for OptionalField<C, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, F> Copy for OptionalField<C, F> {}

impl<C, F: Clone> Lens<C> for OptionalField<C, F> {
    type Value = F;

    fn project(&self, parent: &C) -> Option<F> {
        (self.get)(parent).clone()
    }

    fn assign(&self, parent: &mut C, value: Option<F>) -> bool {
        *(self.get_mut)(parent) = value;
        true
    }
}

/// Read/write view of one field of an optional composite held in state.
pub struct Slice<C, L, P = State<Option<C>>> {
    parent: P,
    lens: L,
    _marker: PhantomData<fn() -> C>,
}

impl<C, L, P> Slice<C, L, P>
where
    C: Clone,
    L: Lens<C>,
    P: MutableState<Option<C>>,
{
    pub fn new(parent: P, lens: L) -> Self {
        Self { parent, lens, _marker: PhantomData }
    }

    pub fn value(&self) -> Option<L::Value> {
        self.parent.value().and_then(|parent| self.lens.project(&parent))
    }

    /// Copies the parent, sets the field and writes the whole parent back without
    /// losing a concurrent write to a sibling field. An absent parent is left absent:
    /// there is no composite to write into.
    pub fn set(&mut self, value: Option<L::Value>) {
        let lens = self.lens;
        self.parent.update_with(|parent| {
            let Some(mut parent) = parent else {
                if value.is_some() {
                    debug!("discarding slice write into an absent parent");
                }
                return None;
            };
            if lens.assign(&mut parent, value.clone()) {
                Some(Some(parent))
            } else {
                None
            }
        });
    }

    pub fn parent(&self) -> &P {
        &self.parent
    }
}

/// Read-only counterpart of `Slice`.
pub struct Constant<C, L, P = State<Option<C>>> {
    parent: P,
    lens: L,
    _marker: PhantomData<fn() -> C>,
}

impl<C, L, P> Constant<C, L, P>
where
    C: Clone,
    L: Lens<C>,
    P: MutableState<Option<C>>,
{
    pub fn new(parent: P, lens: L) -> Self {
        Self { parent, lens, _marker: PhantomData }
    }

    pub fn value(&self) -> Option<L::Value> {
        self.parent.value().and_then(|parent| self.lens.project(&parent))
    }
}
