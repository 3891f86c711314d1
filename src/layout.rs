/*!
    This module computes the layout of the process data frames exchanged with the fieldbus engine.

    There is one frame per [Direction]. For each slot, in declaration order, a frame contains the slot's signals in declaration order, each one taking a whole number of bytes, followed by exactly one status byte for the slot.

    ```text
    | slot 0 signal 0 | slot 0 signal 1 | slot 0 status | slot 1 signal 0 | slot 1 status | ...
    ```

    It highlights
    - [FrameInfo] holding the offsets of one direction, computed once from a [Device]
    - [FrameLayout] gathering both directions

    The placement of the status bytes is decided only here, other modules must always ask [FrameInfo] for offsets.
*/

use core::fmt;
use log::{debug, warn};
use crate::model::{Device, Direction, Signal};


/// total size in bytes of the given signals, each signal rounded up to whole bytes
pub fn summarize_datasizes(signals: &[Signal]) -> usize {
    signals.iter().map(Signal::byte_size).sum()
}

/**
    byte offsets of every slot, slot status and signal in the frame of one direction

    This is computed once from a device model and stays valid until the model is replaced.
*/
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FrameInfo {
    direction: Option<Direction>,
    /// byte size of the whole frame
    total_size: usize,
    /// byte offset of each slot's first signal
    slot_offsets: Vec<usize>,
    /// byte offset of each slot's status byte
    status_offsets: Vec<usize>,
    /// byte offset of each signal, indexed by slot then signal
    signal_offsets: Vec<Vec<usize>>,
}
impl FrameInfo {
    /// compute the frame layout of the given direction
    pub fn compute(device: &Device, direction: Direction) -> Self {
        let mut info = Self {
            direction: Some(direction),
            total_size: 0,
            slot_offsets: Vec::with_capacity(device.slots.len()),
            status_offsets: Vec::with_capacity(device.slots.len()),
            signal_offsets: Vec::with_capacity(device.slots.len()),
        };
        let mut offset = 0;
        for slot in &device.slots {
            info.slot_offsets.push(offset);
            let signals = slot.signals(direction);
            let mut offsets = Vec::with_capacity(signals.len());
            for signal in signals {
                if ! signal.data_type.is_known() {
                    warn!("slot {:?} signal {:?} has {}, counted as 1 bit",
                        slot.name, signal.name, signal.data_type.as_str());
                }
                offsets.push(offset);
                offset += signal.byte_size();
            }
            info.signal_offsets.push(offsets);
            info.status_offsets.push(offset);
            offset += 1;
        }
        info.total_size = offset;
        debug_assert_eq!(
            info.total_size,
            device.slots.iter()
                .map(|slot| summarize_datasizes(slot.signals(direction)) + 1)
                .sum::<usize>(),
            );
        info
    }

    /// direction the layout was computed for
    pub fn direction(&self) -> Option<Direction>  {self.direction}
    /// byte size of the frame
    pub fn total_size(&self) -> usize  {self.total_size}
    /// number of slots in the layout
    pub fn slots(&self) -> usize  {self.slot_offsets.len()}
    /// byte offset of the slot's first signal
    pub fn slot_offset(&self, slot_ix: u16) -> Option<usize> {
        self.slot_offsets.get(usize::from(slot_ix)).copied()
    }
    /// byte offset of the slot's status byte
    pub fn status_offset(&self, slot_ix: u16) -> Option<usize> {
        self.status_offsets.get(usize::from(slot_ix)).copied()
    }
    /// byte offset of the given signal
    pub fn signal_offset(&self, slot_ix: u16, signal_ix: u16) -> Option<usize> {
        self.signal_offsets.get(usize::from(slot_ix))?
            .get(usize::from(signal_ix)).copied()
    }
}


/// frame layouts of both directions of a device
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FrameLayout {
    /// inputs, sent to the PLC
    pub tx: FrameInfo,
    /// outputs, received from the PLC
    pub rx: FrameInfo,
    /// names and sizes kept for display only
    slots: Vec<SlotSummary>,
}
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct SlotSummary {
    name: String,
    tx: Vec<(String, String, usize)>,
    rx: Vec<(String, String, usize)>,
}
impl FrameLayout {
    pub fn compute(device: &Device) -> Self {
        let layout = Self {
            tx: FrameInfo::compute(device, Direction::Tx),
            rx: FrameInfo::compute(device, Direction::Rx),
            slots: device.slots.iter()
                .map(|slot| {
                    let summary = |signals: &[Signal]| signals.iter()
                        .map(|signal| (signal.name.clone(), signal.data_type.to_string(), signal.byte_size()))
                        .collect::<Vec<_>>();
                    SlotSummary {
                        name: slot.name.clone(),
                        tx: summary(slot.signals(Direction::Tx)),
                        rx: summary(slot.signals(Direction::Rx)),
                    }
                })
                .collect(),
        };
        debug!("frame layout of {:?}\n{}", device.name, layout);
        layout
    }
    /// layout of the given direction
    pub fn get(&self, direction: Direction) -> &FrameInfo {
        match direction {
            Direction::Tx => &self.tx,
            Direction::Rx => &self.rx,
        }
    }
}
impl fmt::Display for FrameLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tx frame {} bytes, rx frame {} bytes", self.tx.total_size(), self.rx.total_size())?;
        for (slot_ix, slot) in self.slots.iter().enumerate() {
            writeln!(f, "slot {} {:?}", slot_ix, slot.name)?;
            for (info, signals, label) in [(&self.tx, &slot.tx, "tx"), (&self.rx, &slot.rx, "rx")] {
                for (signal_ix, (name, dtype, size)) in signals.iter().enumerate() {
                    let offset = info.signal_offset(slot_ix as u16, signal_ix as u16).unwrap_or_default();
                    writeln!(f, "  {} {:>5}  {:>3} bytes  {} {:?}", label, offset, size, dtype, name)?;
                }
                if let Some(status) = info.status_offset(slot_ix as u16) {
                    writeln!(f, "  {} {:>5}    1 bytes  status", label, status)?;
                }
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BusType, DataType, Slot};

    fn device() -> Device {
        Device::new("dev", BusType::Mock)
            .slot(Slot::new("s0")
                .input(Signal::new("a", DataType::Uint8))
                .input(Signal::new("b", DataType::Uint16))
                .output(Signal::array("c", DataType::Bool, 9)))
            .slot(Slot::new("empty"))
            .slot(Slot::new("s2")
                .input(Signal::array("d", DataType::Int32, 3))
                .input(Signal::new("e", DataType::Bitfield(4))))
    }

    #[test]
    fn offsets() {
        let device = device();
        let tx = FrameInfo::compute(&device, Direction::Tx);
        assert_eq!(tx.slot_offset(0), Some(0));
        assert_eq!(tx.signal_offset(0, 1), Some(1));
        assert_eq!(tx.status_offset(0), Some(3));
        // empty slots still have a status byte
        assert_eq!(tx.slot_offset(1), Some(4));
        assert_eq!(tx.status_offset(1), Some(4));
        assert_eq!(tx.signal_offset(2, 0), Some(5));
        assert_eq!(tx.signal_offset(2, 1), Some(17));
        assert_eq!(tx.status_offset(2), Some(18));
        assert_eq!(tx.total_size(), 19);
        assert_eq!(tx.status_offset(3), None);
        assert_eq!(tx.signal_offset(0, 2), None);

        let rx = FrameInfo::compute(&device, Direction::Rx);
        assert_eq!(rx.status_offset(0), Some(2));
        assert_eq!(rx.total_size(), 2 + 1 + 1 + 1);
    }

    #[test]
    fn total_size_is_sum_of_slots() {
        let device = device();
        for direction in [Direction::Tx, Direction::Rx] {
            let expected = device.slots.iter()
                .map(|slot| slot.signals(direction).iter()
                    .map(|signal| crate::data::bits_to_bytes(signal.array_length() * signal.bit_length()))
                    .sum::<usize>() + 1)
                .sum::<usize>();
            assert_eq!(FrameInfo::compute(&device, direction).total_size(), expected);
        }
    }

    #[test]
    fn no_slots() {
        let layout = FrameLayout::compute(&Device::new("bare", BusType::Mock));
        assert_eq!(layout.tx.total_size(), 0);
        assert_eq!(layout.rx.total_size(), 0);
        assert_eq!(layout.tx.slots(), 0);
    }

    #[test]
    fn unknown_type_counts_one_bit() {
        let device = Device::new("dev", BusType::Mock)
            .slot(Slot::new("s0").input(Signal::new("x", DataType::Unknown(77))));
        assert_eq!(FrameInfo::compute(&device, Direction::Tx).total_size(), 2);
    }

    #[test]
    fn idempotent() {
        let device = device();
        assert_eq!(FrameLayout::compute(&device), FrameLayout::compute(&device));
    }

    #[test]
    fn display_lists_signals() {
        let text = FrameLayout::compute(&device()).to_string();
        assert!(text.contains("tx frame 19 bytes"));
        assert!(text.contains("\"d\""));
        assert!(text.contains("status"));
    }
}
