// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poison-recovering accessors for [`std::sync::Mutex`]/[`std::sync::RwLock`].
//!
//! A poisoned lock here means some prior holder panicked mid-mutation, not
//! that the data is untrustworthy — the registry and broadcaster never leave
//! a guarded value in a torn state across an await point or fallible I/O, so
//! recovering the inner value is safe. Panicking on every caller downstream
//! of one bug would turn a single panic into a cascading outage.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn read<T>(l: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn write<T>(l: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
