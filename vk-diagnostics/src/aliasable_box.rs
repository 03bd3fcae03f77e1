use std::{
    fmt,
    ops::{Deref, DerefMut},
    panic::{RefUnwindSafe, UnwindSafe},
    ptr::NonNull,
};

/// A `Box` replacement that may be moved around while raw-pointer-derived
/// borrows of its contents are live. A regular `Box` asserts unique ownership
/// of its allocation when moved, which invalidates such borrows.
#[repr(transparent)]
pub(crate) struct AliasableBox<T: ?Sized> {
    ptr: NonNull<T>,
}

unsafe impl<T: Send + ?Sized> Send for AliasableBox<T> {}
unsafe impl<T: Sync + ?Sized> Sync for AliasableBox<T> {}

impl<T: UnwindSafe + ?Sized> UnwindSafe for AliasableBox<T> {}
impl<T: RefUnwindSafe + ?Sized> RefUnwindSafe for AliasableBox<T> {}

impl<T: ?Sized> Unpin for AliasableBox<T> {}

impl<T: ?Sized> From<Box<T>> for AliasableBox<T> {
    #[inline]
    fn from(value: Box<T>) -> Self {
        let ptr = Box::into_raw(value);
        let ptr = unsafe { NonNull::new_unchecked(ptr) };

        AliasableBox { ptr }
    }
}

impl<T: fmt::Debug + ?Sized> fmt::Debug for AliasableBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: ?Sized> Deref for AliasableBox<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: ?Sized> DerefMut for AliasableBox<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { self.ptr.as_mut() }
    }
}

impl<T: ?Sized> Drop for AliasableBox<T> {
    #[inline]
    fn drop(&mut self) {
        drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
    }
}
