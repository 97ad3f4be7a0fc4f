// Reentrant read/write lock for component invocations
// Tracks holders by owner token so reentrancy survives explicit call contexts

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Identity of the logical holder of a lock.
///
/// For thread-per-invocation runtimes, [`OwnerToken::current_thread`]
/// derives a stable token from the executing thread. Runtimes that
/// migrate one logical call across threads mint a token with
/// [`OwnerToken::unique`] and carry it through the call context instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerToken(u64);

impl OwnerToken {
    /// Token for the current OS thread
    pub fn current_thread() -> Self {
        thread_local!(static ANCHOR: u8 = const { 0 });
        ANCHOR.with(|anchor| {
            let anchor: *const u8 = anchor;
            OwnerToken(anchor as u64)
        })
    }

    /// A fresh token, distinct from every other token in the process.
    ///
    /// The high bit keeps minted tokens disjoint from thread-derived
    /// tokens, which are user-space addresses.
    pub fn unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        OwnerToken(NEXT.fetch_add(1, Ordering::Relaxed) | 1 << 63)
    }
}

/// Why a lock acquisition did not produce a guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// The deadline passed before the lock became available
    TimedOut,
    /// The owner holds only a read lock and asked for write; upgrading
    /// without releasing first is unsafe, so this fails without waiting
    IllegalLoopback,
}

#[derive(Default)]
struct LockState {
    /// Current exclusive holder and its reentrant depth
    writer: Option<(OwnerToken, u32)>,
    /// Reentrant read hold count per owner
    readers: HashMap<OwnerToken, u32>,
}

impl LockState {
    fn writer_is(&self, owner: OwnerToken) -> bool {
        matches!(self.writer, Some((current, _)) if current == owner)
    }
}

/// A reentrant read/write lock shared by all invocations that target one
/// logical component instance.
///
/// Grant rules:
/// - read: granted when no writer holds, when the caller is the current
///   writer (downgrade), or when the caller already holds read
/// - write: granted when the lock is unheld or the caller is already the
///   writer; an owner holding only read fails fast with
///   [`AcquireError::IllegalLoopback`]
///
/// Both sides take an optional deadline; `None` waits indefinitely.
/// Guards release on drop, so every exit path of a holder restores the
/// lock, including unwinding.
pub struct InvocationLock {
    state: Mutex<LockState>,
    released: Condvar,
}

impl Default for InvocationLock {
    fn default() -> Self {
        Self::new()
    }
}

impl InvocationLock {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            released: Condvar::new(),
        }
    }

    /// Acquire the shared side for `owner`, waiting until `deadline`
    pub fn acquire_read(
        &self,
        owner: OwnerToken,
        deadline: Option<Instant>,
    ) -> Result<ReadGuard<'_>, AcquireError> {
        let mut state = self.state.lock();
        loop {
            if Self::try_grant_read(&mut state, owner) {
                return Ok(ReadGuard { lock: self, owner });
            }
            if self.wait_released(&mut state, deadline) {
                // The notification may have raced the deadline
                if Self::try_grant_read(&mut state, owner) {
                    return Ok(ReadGuard { lock: self, owner });
                }
                return Err(AcquireError::TimedOut);
            }
        }
    }

    /// Acquire the exclusive side for `owner`, waiting until `deadline`
    pub fn acquire_write(
        &self,
        owner: OwnerToken,
        deadline: Option<Instant>,
    ) -> Result<WriteGuard<'_>, AcquireError> {
        let mut state = self.state.lock();
        if state.readers.contains_key(&owner) && !state.writer_is(owner) {
            return Err(AcquireError::IllegalLoopback);
        }
        loop {
            if Self::try_grant_write(&mut state, owner) {
                return Ok(WriteGuard { lock: self, owner });
            }
            if self.wait_released(&mut state, deadline) {
                if Self::try_grant_write(&mut state, owner) {
                    return Ok(WriteGuard { lock: self, owner });
                }
                return Err(AcquireError::TimedOut);
            }
        }
    }

    /// Whether the exclusive side is currently held
    pub fn is_write_locked(&self) -> bool {
        self.state.lock().writer.is_some()
    }

    /// Total read holds across all owners, counting reentrant holds
    pub fn read_holds(&self) -> u64 {
        let state = self.state.lock();
        state.readers.values().map(|count| u64::from(*count)).sum()
    }

    fn try_grant_read(state: &mut MutexGuard<'_, LockState>, owner: OwnerToken) -> bool {
        // An owner already holding read must be granted even while a
        // writer waits, otherwise it would deadlock against itself
        let grantable = match state.writer {
            None => true,
            Some((current, _)) => current == owner,
        } || state.readers.contains_key(&owner);
        if grantable {
            *state.readers.entry(owner).or_insert(0) += 1;
        }
        grantable
    }

    fn try_grant_write(state: &mut MutexGuard<'_, LockState>, owner: OwnerToken) -> bool {
        match state.writer {
            Some((current, _)) if current == owner => {
                if let Some((_, depth)) = state.writer.as_mut() {
                    *depth += 1;
                }
                true
            }
            Some(_) => false,
            None => {
                if state.readers.is_empty() {
                    state.writer = Some((owner, 1));
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Block until a holder releases or the deadline passes.
    /// Returns `true` when the wait timed out.
    fn wait_released(&self, state: &mut MutexGuard<'_, LockState>, deadline: Option<Instant>) -> bool {
        match deadline {
            Some(deadline) => self.released.wait_until(state, deadline).timed_out(),
            None => {
                self.released.wait(state);
                false
            }
        }
    }
}

/// A held shared lock; restores state and wakes waiters on drop
#[must_use = "the read lock is released when the guard is dropped"]
pub struct ReadGuard<'a> {
    lock: &'a InvocationLock,
    owner: OwnerToken,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        if let Some(count) = state.readers.get_mut(&self.owner) {
            *count -= 1;
            if *count == 0 {
                state.readers.remove(&self.owner);
            }
        }
        if state.readers.is_empty() && state.writer.is_none() {
            self.lock.released.notify_all();
        }
    }
}

impl std::fmt::Debug for ReadGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadGuard")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// A held exclusive lock; restores state and wakes waiters on drop
#[must_use = "the write lock is released when the guard is dropped"]
pub struct WriteGuard<'a> {
    lock: &'a InvocationLock,
    owner: OwnerToken,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        debug_assert!(state.writer_is(self.owner));
        if let Some((_, depth)) = state.writer.as_mut() {
            *depth -= 1;
            if *depth == 0 {
                state.writer = None;
                self.lock.released.notify_all();
            }
        }
    }
}

impl std::fmt::Debug for WriteGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteGuard")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
