/*!
    Connection state machine and host/core communication watchdog.

    The state of the core is a set of independent flags ([Status]). Flags are only changed through [ConnectionState::set] and [ConnectionState::clear] which send a status message each time the flags actually change.

    The watchdog is evaluated by polling a tick counter, it never waits. Tick counters wrap around, all comparisons are done with [is_expired].
*/

use bilge::prelude::*;
use log::info;
use crate::message::{Message, MessageChannel};


/// status flags of the core
#[bitsize(32)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct Status {
    /// a device configuration is active
    pub configured: bool,
    /// the host/core communication is up
    pub connected: bool,
    /// a PLC is connected to the device and exchanging data
    pub running: bool,
    /// the communication watchdog is supervising the host/core exchanges
    pub watchdog: bool,
    reserved: u28,
}
impl Status {
    pub const CONFIGURED: u32 = 1 << 0;
    pub const CONNECTED: u32 = 1 << 1;
    pub const RUNNING: u32 = 1 << 2;
    pub const WATCHDOG: u32 = 1 << 3;
    /// flags that cannot stay set without [Self::CONNECTED]
    pub const CONNECTION_DEPENDENT: u32 = Self::CONNECTED | Self::RUNNING;

    /// raw bitmask
    pub fn bits(self) -> u32  {u32::from(self)}
}

/// selects which cyclic indications are sent to the host
#[bitsize(32)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct EventMask {
    /// send [Message::Avail] each time outputs are received
    pub avail: bool,
    /// send [Message::Sync] each time inputs are requested
    pub sync: bool,
    reserved: u30,
}
impl EventMask {
    /// default mode: the host is only polled
    pub const FREE_RUNNING: u32 = 0;
    /// the host is additionally notified of every I/O cycle
    pub const SYNCHRONOUS: u32 = 0b11;

    pub fn free_running() -> Self  {Self::from(Self::FREE_RUNNING)}
    pub fn synchronous() -> Self  {Self::from(Self::SYNCHRONOUS)}
}


/**
    holds the status flags and reports their changes

    queries are pure bit tests, only [Self::set] and [Self::clear] modify the state
*/
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ConnectionState {
    status: Status,
}
impl ConnectionState {
    pub fn new() -> Self  {Self::default()}

    /// current flags
    pub fn status(&self) -> Status  {self.status}

    /// set the given flags, send a status message and return true if this changed the status
    pub fn set<const N: usize>(&mut self, flags: u32, channel: &mut MessageChannel<N>) -> bool {
        let old = self.status.bits();
        self.update(old | flags, channel)
    }
    /// clear the given flags, send a status message and return true if this changed the status
    pub fn clear<const N: usize>(&mut self, flags: u32, channel: &mut MessageChannel<N>) -> bool {
        let old = self.status.bits();
        self.update(old & !flags, channel)
    }
    fn update<const N: usize>(&mut self, new: u32, channel: &mut MessageChannel<N>) -> bool {
        if new == self.status.bits()  {return false}
        self.status = Status::from(new);
        info!("core status {:#06x} {:?}", new, self.status);
        channel.send(Message::Status(self.status));
        true
    }

    pub fn is_configured(&self) -> bool  {self.status.configured()}
    pub fn is_connected(&self) -> bool  {self.status.connected()}
    pub fn is_running(&self) -> bool  {self.status.running()}
    pub fn is_watchdog_enabled(&self) -> bool  {self.status.watchdog()}
}


/**
    true if at least `timeout` ticks elapsed from `previous` to `current`

    the difference is computed modulo 2^32 so the result is correct even if `current` has wrapped past zero since `previous`
*/
pub fn is_expired(current: u32, previous: u32, timeout: u32) -> bool {
    current.wrapping_sub(previous) >= timeout
}

/// supervision of the delay since the last valid exchange
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Watchdog {
    /// ticks allowed between two valid exchanges
    timeout: u32,
    /// tick of the last valid exchange
    last: u32,
    expired: bool,
}
impl Watchdog {
    pub fn new(timeout: u32, now: u32) -> Self {
        Self {timeout, last: now, expired: false}
    }
    pub fn timeout(&self) -> u32  {self.timeout}
    /// true once the timeout elapsed, until the next [Self::feed]
    pub fn expired(&self) -> bool  {self.expired}

    /// record a valid exchange at `now`, return true if this ends an expiry
    pub fn feed(&mut self, now: u32) -> bool {
        self.last = now;
        core::mem::replace(&mut self.expired, false)
    }
    /// evaluate the timeout at `now`, return true only when the watchdog switches to expired
    pub fn check(&mut self, now: u32) -> bool {
        if self.expired || ! is_expired(now, self.last, self.timeout)
            {return false}
        self.expired = true;
        true
    }
}
