/*!
    Boundaries of the core with the outer world.

    - [Adapter] is implemented by the fieldbus side: it owns the transport and the raw frame buffers exchanged with the fieldbus engine.
    - [Indications] is implemented by the host application: it receives the messages drained by [crate::Core::worker].

    [MockAdapter] is an in-memory adapter, useful to run the core without any fieldbus.
*/

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex, PoisonError,
    };
use crate::{
    alarm::Alarm,
    core::Core,
    error::ErrorCode,
    status::Status,
    };


/**
    trait implementing the access to the fieldbus engine and its transport

    Methods are called with no core lock held, so they can take as long as the transport needs and may call back into the core.
*/
pub trait Adapter: Send + Sync {
    /// hand a freshly packed input frame to the fieldbus engine, its size is the tx frame size of the layout
    fn tx_frame(&self, frame: &[u8]);
    /// fill the given buffer with the last output frame received by the fieldbus engine, its size is the rx frame size of the layout
    fn rx_frame(&self, frame: &mut [u8]);
    /// an asynchronous error was detected by the core
    fn error_ind(&self, code: ErrorCode);
    /**
        process the transport activity signaled by [Core::event_ind]

        This is called from the worker loop, never from the interrupt context. An error means the transport is no longer usable.
    */
    fn service(&self) -> Result<(), ErrorCode>  {Ok(())}
    /// an alarm was raised (`active`) or cleared on the given slot, to be reported on the fieldbus
    #[allow(unused_variables)]
    fn alarm_ind(&self, slot_ix: u16, alarm: Alarm, active: bool)  {}
}

/**
    callbacks of the host application, one per kind of [crate::Message]

    every callback receives the core, so that it can read or write frames and parameters in response
*/
#[allow(unused_variables)]
pub trait Indications {
    /// output data from the PLC is available, see [Core::read_outputs]
    fn avail(&mut self, core: &Core)  {}
    /// input data should be prepared, see [Core::write_inputs]
    fn sync(&mut self, core: &Core)  {}
    /// some parameters were written, drain them with [Core::take_write_request]
    fn param_write_ind(&mut self, core: &Core)  {}
    /// periodic poll
    fn poll_ind(&mut self, core: &Core)  {}
    fn status_ind(&mut self, core: &Core, status: Status)  {}
    fn error_ind(&mut self, core: &Core, code: ErrorCode)  {}
}


/// transport used between host and core
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Transport {
    /// host and core run in the same process
    #[default]
    Mono,
    Usb,
    Spi,
    Uart,
    Tcp,
}
impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mono => "mono",
            Self::Usb => "usb",
            Self::Spi => "spi",
            Self::Uart => "uart",
            Self::Tcp => "tcp",
        }
    }
}


/// adapter keeping frames in memory and recording the errors it is notified of
#[derive(Debug, Default)]
pub struct MockAdapter {
    tx: Mutex<Vec<u8>>,
    rx: Mutex<Vec<u8>>,
    errors: Mutex<Vec<ErrorCode>>,
    failure: Mutex<Option<ErrorCode>>,
    services: AtomicUsize,
    alarms: Mutex<Vec<(u16, Alarm, bool)>>,
}
impl MockAdapter {
    pub fn new() -> Self  {Self::default()}

    /// last frame sent by the core
    pub fn tx(&self) -> Vec<u8> {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
    /// set the frame the core will receive next
    pub fn set_rx(&self, frame: &[u8]) {
        *self.rx.lock().unwrap_or_else(PoisonError::into_inner) = frame.to_vec();
    }
    /// errors indicated so far, oldest first
    pub fn errors(&self) -> Vec<ErrorCode> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
    /// make next calls to [Adapter::service] fail with the given error, or succeed if `None`
    pub fn fail_service(&self, failure: Option<ErrorCode>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = failure;
    }
    /// number of times the core asked for servicing
    pub fn services(&self) -> usize {
        self.services.load(Ordering::Relaxed)
    }
    /// alarm changes indicated so far as `(slot_ix, alarm, active)`, oldest first
    pub fn alarms(&self) -> Vec<(u16, Alarm, bool)> {
        self.alarms.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
impl Adapter for MockAdapter {
    fn tx_frame(&self, frame: &[u8]) {
        let mut tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        tx.clear();
        tx.extend_from_slice(frame);
    }
    fn rx_frame(&self, frame: &mut [u8]) {
        let rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
        // missing bytes read as zero
        let size = rx.len().min(frame.len());
        frame[.. size].copy_from_slice(&rx[.. size]);
        frame[size ..].fill(0);
    }
    fn error_ind(&self, code: ErrorCode) {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner).push(code);
    }
    fn service(&self) -> Result<(), ErrorCode> {
        self.services.fetch_add(1, Ordering::Relaxed);
        match *self.failure.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }
    fn alarm_ind(&self, slot_ix: u16, alarm: Alarm, active: bool) {
        self.alarms.lock().unwrap_or_else(PoisonError::into_inner).push((slot_ix, alarm, active));
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_frames() {
        let adapter = MockAdapter::new();
        adapter.tx_frame(&[1, 2, 3]);
        assert_eq!(adapter.tx(), [1, 2, 3]);
        adapter.set_rx(&[4, 5]);
        let mut frame = [9; 3];
        adapter.rx_frame(&mut frame);
        assert_eq!(frame, [4, 5, 0]);
    }

    #[test]
    fn mock_service() {
        let adapter = MockAdapter::new();
        assert_eq!(adapter.service(), Ok(()));
        adapter.fail_service(Some(ErrorCode::Transport));
        assert_eq!(adapter.service(), Err(ErrorCode::Transport));
        assert_eq!(adapter.services(), 2);
        adapter.error_ind(ErrorCode::Crc);
        assert_eq!(adapter.errors(), [ErrorCode::Crc]);
    }
}
