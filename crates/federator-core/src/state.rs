// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Driver state tracking and change notification.
//!
//! [`StateNotifier`] is the single authority for a driver's
//! [`DriverState`]. Every assignment goes through [`StateNotifier::set`],
//! which publishes a [`StateChange`] on a broadcast channel only when the
//! value actually changes.
//!
//! Subscribers that fall behind receive `RecvError::Lagged` and simply skip
//! ahead. A driver with no subscribers keeps working.

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::types::{DeviceId, DriverState, StateChange};

/// Default capacity of the state-change channel.
pub const DEFAULT_STATE_CHANNEL_CAPACITY: usize = 64;

/// Holds a driver's current state and broadcasts transitions.
#[derive(Debug)]
pub struct StateNotifier {
    device_id: DeviceId,
    state: RwLock<DriverState>,
    sender: broadcast::Sender<StateChange>,
}

impl StateNotifier {
    /// Creates a notifier in [`DriverState::Disconnected`].
    pub fn new(device_id: DeviceId) -> Self {
        Self::with_capacity(device_id, DEFAULT_STATE_CHANNEL_CAPACITY)
    }

    /// Creates a notifier with a specific channel capacity.
    pub fn with_capacity(device_id: DeviceId, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            device_id,
            state: RwLock::new(DriverState::Disconnected),
            sender,
        }
    }

    /// Returns the current state.
    #[inline]
    pub fn get(&self) -> DriverState {
        *self.state.read()
    }

    /// Returns the device this notifier reports for.
    #[inline]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Sets the state, publishing a change if the value differs.
    ///
    /// Returns `true` if a transition happened.
    pub fn set(&self, next: DriverState) -> bool {
        let previous = {
            let mut state = self.state.write();
            if *state == next {
                return false;
            }
            std::mem::replace(&mut *state, next)
        };

        tracing::debug!(
            device_id = %self.device_id,
            from = %previous,
            to = %next,
            "Driver state changed"
        );

        // No receivers is fine.
        let _ = self.sender.send(StateChange {
            device_id: self.device_id.clone(),
            previous,
            current: next,
            timestamp: Utc::now(),
        });
        true
    }

    /// Returns a new receiver for subsequent state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.sender.subscribe()
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
