//! Copy-on-write shared payloads.
//!
//! [`Shared<T>`] is the handle type behind [`Icon`](crate::Icon) and
//! [`Iconset`](crate::Iconset). Cloning a handle only bumps a reference
//! count; the first mutation through a handle whose payload is aliased makes
//! a private deep copy ("detach") so the other handles keep seeing the old
//! state.
//!
//! ```
//! use iconset::Shared;
//!
//! let a = Shared::new(vec![1, 2, 3]);
//! let mut b = a.clone();
//! assert_eq!(a.ref_count(), 2);
//!
//! b.make_mut().push(4);
//! assert_eq!(*a, vec![1, 2, 3]);
//! assert_eq!(*b, vec![1, 2, 3, 4]);
//! assert_eq!(a.ref_count(), 1);
//! ```

use std::ops::Deref;
use std::sync::{Arc, Weak};

/// A reference-counted handle with copy-on-write mutation.
///
/// The count is atomic, so handles may move between threads. Mutation always
/// goes through `&mut self`, which serializes writers to any one handle.
#[derive(Debug, Default)]
pub struct Shared<T> {
    inner: Arc<T>,
}

impl<T> Shared<T> {
    /// Wrap `value` in a fresh, unshared handle.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Another handle to the same payload.
    pub fn share(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    /// How many handles currently point at this payload.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether this handle is the payload's only owner.
    pub fn is_unique(&self) -> bool {
        self.ref_count() == 1
    }

    /// Whether two handles point at the same payload.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// A weak reference that does not keep the payload alive or count as a
    /// handle. A later [`make_mut`](Self::make_mut) moves the payload, after
    /// which the weak reference no longer upgrades.
    pub fn downgrade(&self) -> Weak<T> {
        Arc::downgrade(&self.inner)
    }

    /// A handle to the payload behind `weak`, if it is still alive.
    pub fn upgrade(weak: &Weak<T>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Drop this handle. Returns `true` if it was the last one, in which
    /// case the payload has been destroyed.
    pub fn release(self) -> bool {
        Arc::into_inner(self.inner).is_some()
    }
}

impl<T: Clone> Shared<T> {
    /// Make this handle the payload's sole owner, copying it if needed.
    ///
    /// Returns `true` if a copy was made.
    pub fn detach(&mut self) -> bool {
        if self.is_unique() {
            return false;
        }
        self.inner = Arc::new(T::clone(&self.inner));
        true
    }

    /// Mutable access to the payload, detaching first.
    pub fn make_mut(&mut self) -> &mut T {
        Arc::make_mut(&mut self.inner)
    }

    /// An independent handle with its own copy of the payload.
    pub fn deep_copy(&self) -> Self {
        Self::new(T::clone(&self.inner))
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        self.share()
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> From<T> for Shared<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}
