//! Device context injection for multi-device logging
//!
//! This module provides thread-local storage for the identity of the device
//! a program is running for, so that simulations running many devices in one
//! process can tell their log entries apart.

use std::cell::RefCell;

use fieldcalc_core::{DeviceId, TierBit};
use uuid::Uuid;

/// Device context data stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceContextData {
    /// Short form of the device id
    pub device_id: String,
    /// Tier the program was instantiated for, once known
    pub tier: Option<TierBit>,
    /// Unique instance ID for this device session
    pub instance_id: Uuid,
}

thread_local! {
    static DEVICE_CONTEXT: RefCell<Option<DeviceContextData>> = const { RefCell::new(None) };
}

/// RAII guard for device context
///
/// When this guard is created, it sets the device context for the current
/// thread. When it's dropped, it restores the previous context (if any).
///
/// # Example
///
/// ```
/// use fieldcalc_core::DeviceId;
/// use fieldcalc_logging::context::DeviceContextGuard;
///
/// let _guard = DeviceContextGuard::new(DeviceId(7));
/// assert_eq!(DeviceContextGuard::current_device_id().as_deref(), Some("d7"));
/// ```
pub struct DeviceContextGuard {
    previous: Option<DeviceContextData>,
}

impl DeviceContextGuard {
    /// Create a new device context guard with no tier
    pub fn new(device: DeviceId) -> Self {
        Self::install(DeviceContextData {
            device_id: device.short_id(),
            tier: None,
            instance_id: Uuid::new_v4(),
        })
    }

    /// Create a guard for a device whose tier has been resolved
    pub fn with_tier(device: DeviceId, tier: TierBit) -> Self {
        Self::install(DeviceContextData {
            device_id: device.short_id(),
            tier: Some(tier),
            instance_id: Uuid::new_v4(),
        })
    }

    /// Create a guard with a specific instance ID
    ///
    /// Useful when you want to maintain a consistent instance ID across restarts.
    pub fn with_instance_id(device: DeviceId, tier: Option<TierBit>, instance_id: Uuid) -> Self {
        Self::install(DeviceContextData {
            device_id: device.short_id(),
            tier,
            instance_id,
        })
    }

    fn install(data: DeviceContextData) -> Self {
        let previous = DEVICE_CONTEXT.with(|ctx| ctx.borrow_mut().replace(data));
        Self { previous }
    }

    /// Get the current device context (if any)
    pub fn current() -> Option<DeviceContextData> {
        DEVICE_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    /// Get the current device ID (if set)
    pub fn current_device_id() -> Option<String> {
        Self::current().map(|ctx| ctx.device_id)
    }

    /// Get the current device tier (if set)
    pub fn current_tier() -> Option<TierBit> {
        Self::current().and_then(|ctx| ctx.tier)
    }

    /// Get the current instance ID (if set)
    pub fn current_instance_id() -> Option<Uuid> {
        Self::current().map(|ctx| ctx.instance_id)
    }
}

impl Drop for DeviceContextGuard {
    fn drop(&mut self) {
        DEVICE_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Convenience macro to create a device context scope
///
/// # Example
///
/// ```
/// use fieldcalc_core::DeviceId;
/// use fieldcalc_logging::with_device_context;
///
/// with_device_context!(DeviceId(3), {
///     tracing::info!("round started");
/// });
/// ```
#[macro_export]
macro_rules! with_device_context {
    ($device:expr, $body:block) => {{
        let _guard = $crate::context::DeviceContextGuard::new($device);
        $body
    }};
}
