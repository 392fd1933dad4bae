use std::ops::{Deref, DerefMut};

use super::DecoderSession;

/// Owns an open decoder session and releases it exactly once: either through an explicit
/// `release` or when the guard is dropped, whichever comes first.
pub struct SessionGuard<S: DecoderSession> {
    session: S,
    released: bool,
}

impl<S: DecoderSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            released: false,
        }
    }

    pub fn release(&mut self) {
        if !self.released {
            self.session.release();
            self.released = true;
        }
    }

    #[cfg(test)]
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl<S: DecoderSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: DecoderSession> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: DecoderSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.release();
    }
}
