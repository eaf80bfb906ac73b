//! The expired state.
//!
//! Once liveness is lost the process must stay alive, keep the watchdog
//! armed, and never kick it again. Parking the calling thread does exactly
//! that without spinning a core.

use crate::scheduler::ExpiryReason;

/// Block the calling thread forever.
pub fn park_forever() -> ! {
    loop {
        std::thread::park();
    }
}

/// Report the expiry and park until the hardware resets the board.
pub fn expire(reason: ExpiryReason) -> ! {
    tracing::error!(reason = %reason, "Boom! Waiting for the hardware watchdog to reset the system");
    park_forever()
}
