use crate::set::bound::BoundSet;
use crate::set::element::Element;
use crate::store::SetStore;
use std::borrow::Cow;
use std::collections::HashSet;

/// An argument to a set-algebra call.
///
/// Remote operands are merged on the store; local ones are folded in memory.
pub enum Operand<'a, T: Element, S: SetStore> {
    Remote(&'a BoundSet<T, S>),
    Local(Cow<'a, HashSet<T>>),
}

impl<'a, T: Element, S: SetStore> Operand<'a, T, S> {
    /// Collects any sequence of elements into a local operand.
    pub fn local<I: IntoIterator<Item = T>>(elements: I) -> Self {
        Operand::Local(Cow::Owned(elements.into_iter().collect()))
    }
}

impl<T: Element, S: SetStore> Clone for Operand<'_, T, S> {
    fn clone(&self) -> Self {
        match self {
            Operand::Remote(set) => Operand::Remote(set),
            Operand::Local(local) => Operand::Local(local.clone()),
        }
    }
}

impl<T: Element, S: SetStore> std::fmt::Debug for Operand<'_, T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Remote(set) => f.debug_tuple("Remote").field(&set.key()).finish(),
            Operand::Local(local) => f.debug_tuple("Local").field(local).finish(),
        }
    }
}

impl<'a, T: Element, S: SetStore> From<&'a BoundSet<T, S>> for Operand<'a, T, S> {
    fn from(set: &'a BoundSet<T, S>) -> Self {
        Operand::Remote(set)
    }
}

impl<'a, T: Element, S: SetStore> From<&'a HashSet<T>> for Operand<'a, T, S> {
    fn from(set: &'a HashSet<T>) -> Self {
        Operand::Local(Cow::Borrowed(set))
    }
}

impl<T: Element, S: SetStore> From<HashSet<T>> for Operand<'_, T, S> {
    fn from(set: HashSet<T>) -> Self {
        Operand::Local(Cow::Owned(set))
    }
}

impl<T: Element, S: SetStore> From<Vec<T>> for Operand<'_, T, S> {
    fn from(elements: Vec<T>) -> Self {
        Operand::local(elements)
    }
}

impl<T: Element, S: SetStore> From<&[T]> for Operand<'_, T, S> {
    fn from(elements: &[T]) -> Self {
        Operand::local(elements.iter().cloned())
    }
}

impl<T: Element, S: SetStore, const N: usize> From<[T; N]> for Operand<'_, T, S> {
    fn from(elements: [T; N]) -> Self {
        Operand::local(elements)
    }
}

/// Operands split by where they live, each side in call order.
#[derive(Debug)]
pub struct Classified<'b, T: Element> {
    pub remote_keys: Vec<&'b str>,
    pub locals: Vec<&'b HashSet<T>>,
}

impl<T: Element> Classified<'_, T> {
    pub fn has_remotes(&self) -> bool {
        !self.remote_keys.is_empty()
    }
}

pub fn classify<'b, T: Element, S: SetStore>(operands: &'b [Operand<'_, T, S>]) -> Classified<'b, T> {
    let mut remote_keys = Vec::new();
    let mut locals = Vec::new();
    for operand in operands {
        match operand {
            Operand::Remote(set) => remote_keys.push(set.key()),
            Operand::Local(local) => locals.push(local.as_ref()),
        }
    }
    Classified { remote_keys, locals }
}
