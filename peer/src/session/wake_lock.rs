/// Keeps the host from sleeping while a transfer is active.
pub trait WakeLock {
    fn acquire(&mut self);
    fn release(&mut self);
}

/// For hosts without a wake lock.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWakeLock;

impl WakeLock for NoWakeLock {
    fn acquire(&mut self) {}
    fn release(&mut self) {}
}
