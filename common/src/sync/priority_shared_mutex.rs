// Writer-preferring, writer-reentrant shared/exclusive lock.
//
// Readers (validators, RPC queries) and the single header-acceptance writer
// interleave through `readers_active`, `writers_waiting` and `writer_active`.
// A reader uses an optimistic increment followed by a double-check so it
// never sneaks in ahead of an announced writer; a writer announces intent
// before spinning, so readers sampling the flags after that point back off.
// Blocking is implemented with a `Condvar`, the std equivalent of the
// futex-style wait/notify primitive the design calls for: every state
// transition that could unblock a waiter notifies the condvar, and waiters
// always re-check the atomics after waking (a notify never carries meaning
// on its own, only the state it's paired with does, so a spurious or
// coalesced wakeup is harmless).

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

const PARK_TIMEOUT: Duration = Duration::from_micros(200);

pub struct PrioritySharedMutex<T> {
    readers_active: AtomicU32,
    writers_waiting: AtomicU32,
    writer_active: AtomicBool,
    owner: Mutex<Option<ThreadId>>,
    recursion_depth: AtomicU32,
    gate: Mutex<()>,
    condvar: Condvar,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for PrioritySharedMutex<T> {}
unsafe impl<T: Send> Sync for PrioritySharedMutex<T> {}

impl<T> PrioritySharedMutex<T> {
    pub fn new(data: T) -> Self {
        Self {
            readers_active: AtomicU32::new(0),
            writers_waiting: AtomicU32::new(0),
            writer_active: AtomicBool::new(false),
            owner: Mutex::new(None),
            recursion_depth: AtomicU32::new(0),
            gate: Mutex::new(()),
            condvar: Condvar::new(),
            data: UnsafeCell::new(data),
        }
    }

    fn park(&self) {
        let guard = self.gate.lock().unwrap();
        let _ = self.condvar.wait_timeout(guard, PARK_TIMEOUT);
    }

    fn wake_all(&self) {
        let _guard = self.gate.lock().unwrap();
        self.condvar.notify_all();
    }

    /// Grants shared access iff no writer is active and no writer is waiting.
    /// Blocks (parking between attempts) otherwise.
    pub fn lock_shared(&self) {
        loop {
            self.readers_active.fetch_add(1, Ordering::Acquire);
            if !self.writer_active.load(Ordering::Acquire)
                && self.writers_waiting.load(Ordering::Acquire) == 0
            {
                return;
            }

            // A writer is active or announced: back off. If we were the last
            // reader to leave, a writer draining readers needs a nudge.
            if self.readers_active.fetch_sub(1, Ordering::Release) == 1 {
                self.wake_all();
            }
            self.park();
        }
    }

    pub fn unlock_shared(&self) {
        if self.readers_active.fetch_sub(1, Ordering::Release) == 1 {
            self.wake_all();
        }
    }

    /// Grants exclusive access. Once called, new shared acquisitions are
    /// blocked immediately (writer preference). A thread that already holds
    /// the exclusive lock may call this again; the Nth matching `unlock`
    /// releases it.
    pub fn lock(&self) {
        let me = thread::current().id();

        {
            let owner = self.owner.lock().unwrap();
            if *owner == Some(me) {
                drop(owner);
                self.recursion_depth.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        self.writers_waiting.fetch_add(1, Ordering::Release);
        self.wake_all();
        log::trace!("writer {:?} announced intent, waiting for active writer to clear", me);

        while self
            .writer_active
            .compare_exchange_weak(false, true, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            self.park();
        }

        while self.readers_active.load(Ordering::Acquire) != 0 {
            self.park();
        }
        log::trace!("writer {:?} acquired exclusive access", me);

        self.writers_waiting.fetch_sub(1, Ordering::Release);
        *self.owner.lock().unwrap() = Some(me);
        self.recursion_depth.store(1, Ordering::Release);
    }

    pub fn unlock(&self) {
        let remaining = self.recursion_depth.fetch_sub(1, Ordering::AcqRel) - 1;
        if remaining == 0 {
            *self.owner.lock().unwrap() = None;
            self.writer_active.store(false, Ordering::Release);
            self.wake_all();
        }
    }

    pub fn read(&self) -> PrioritySharedReadGuard<'_, T> {
        self.lock_shared();
        PrioritySharedReadGuard { lock: self }
    }

    pub fn write(&self) -> PrioritySharedExclusiveGuard<'_, T> {
        self.lock();
        PrioritySharedExclusiveGuard { lock: self }
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

pub struct PrioritySharedReadGuard<'a, T> {
    lock: &'a PrioritySharedMutex<T>,
}

impl<'a, T> Deref for PrioritySharedReadGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> Drop for PrioritySharedReadGuard<'a, T> {
    fn drop(&mut self) {
        self.lock.unlock_shared();
    }
}

pub struct PrioritySharedExclusiveGuard<'a, T> {
    lock: &'a PrioritySharedMutex<T>,
}

impl<'a, T> Deref for PrioritySharedExclusiveGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> DerefMut for PrioritySharedExclusiveGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'a, T> Drop for PrioritySharedExclusiveGuard<'a, T> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
