use crate::strategy::DriverHandle;

/// Clears browser state through a live driver handle. The request carries a
/// handler to the winning strategy untouched; whether and when to clear is
/// that strategy's business, never the engine's.
pub trait CookieHandler: Send + Sync {
    /// Returns true when all cookies were cleared.
    fn clear_all_cookies(&self, handle: &DriverHandle) -> bool;
}
