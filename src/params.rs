/*!
    Local storage of the device parameters and the write notification protocol.

    All current parameter values live in one flat [ParamFrame], parameters are laid out back to back in slot then parameter order. Each write is signaled to the host with a [Message::ParamWrite] and remembered as pending until the host drains it with [ParameterStore::take_write_request].
*/

use std::collections::VecDeque;
use core::ops::Range;
use log::debug;
use crate::{
    data::{bits_to_bytes, Cursor},
    error::{CoreError, CoreResult},
    message::{Message, MessageChannel},
    model::Device,
    };


/// flat buffer holding the current value of every parameter of a device
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParamFrame {
    data: Vec<u8>,
    /// byte range of each parameter, indexed by slot then parameter
    ranges: Vec<Vec<Range<usize>>>,
}
impl ParamFrame {
    /**
        allocate a zeroed frame sized for all the parameters of the device

        Returns `Ok(None)` if the device has no parameter at all. An allocation failure is reported as [CoreError::Resource].
    */
    pub fn allocate(device: &Device) -> CoreResult<Option<Self>> {
        let mut ranges = Vec::with_capacity(device.slots.len());
        let mut size = 0;
        for slot in &device.slots {
            ranges.push(slot.params.iter()
                .map(|param| {
                    let start = size;
                    size += usize::from(param.byte_length);
                    start .. size
                })
                .collect());
        }
        if device.param_count() == 0
            {return Ok(None)}

        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| CoreError::Resource("cannot allocate parameter frame"))?;
        data.resize(size, 0);
        Ok(Some(Self {data, ranges}))
    }

    /// copy the declared default of every parameter to its place in the frame
    pub fn init_defaults(&mut self, device: &Device) -> CoreResult {
        if device.slots.len() != self.ranges.len()
            {return Err(CoreError::Model("parameter frame was not allocated for this device"))}
        let mut cursor = Cursor::new(self.data.as_mut_slice());
        for (slot, ranges) in device.slots.iter().zip(&self.ranges) {
            if slot.params.len() != ranges.len()
                {return Err(CoreError::Model("parameter frame was not allocated for this device"))}
            for (param, range) in slot.params.iter().zip(ranges) {
                debug_assert_eq!(cursor.position(), range.start);
                if param.default.len() != usize::from(param.byte_length)
                    {return Err(CoreError::Model("parameter default does not match its length"))}
                cursor.write(&param.default)?;
            }
        }
        Ok(())
    }

    /// byte range of the given parameter in [Self::data]
    pub fn locate(&self, slot_ix: u16, param_ix: u16) -> Option<Range<usize>> {
        self.ranges.get(usize::from(slot_ix))?
            .get(usize::from(param_ix))
            .cloned()
    }

    /// number of bytes in the frame
    pub fn len(&self) -> usize  {self.data.len()}
    pub fn is_empty(&self) -> bool  {self.data.is_empty()}
    /// raw content of the frame
    pub fn data(&self) -> &[u8]  {&self.data}
}


/// a pending parameter write, as returned by [ParameterStore::take_write_request]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamWrite {
    pub slot_ix: u16,
    pub param_ix: u16,
    /// current value of the parameter
    pub data: Vec<u8>,
}

/// parameter values of a device and the set of writes not yet seen by the host
#[derive(Clone, Debug, Default)]
pub struct ParameterStore {
    /// `None` when the device has no parameter
    frame: Option<ParamFrame>,
    /// written parameters not yet drained, in order of first write
    pending: VecDeque<(u16, u16)>,
}
impl ParameterStore {
    /// allocate the parameter frame for the device and fill it with defaults
    pub fn new(device: &Device) -> CoreResult<Self> {
        let mut frame = ParamFrame::allocate(device)?;
        if let Some(frame) = frame.as_mut() {
            frame.init_defaults(device)?;
        }
        Ok(Self {frame, pending: VecDeque::new()})
    }

    /// the underlying parameter frame, if the device has parameters
    pub fn frame(&self) -> Option<&ParamFrame>  {self.frame.as_ref()}

    // check indices and length, and return the byte range of the parameter
    fn locate(&self, device: &Device, slot_ix: u16, param_ix: u16, bit_length: usize) -> CoreResult<Range<usize>> {
        let param = device.param(slot_ix, param_ix)?;
        if bits_to_bytes(bit_length) != usize::from(param.byte_length)
            {return Err(CoreError::Size("data length does not match parameter length"))}
        let range = self.frame.as_ref()
            .and_then(|frame| frame.locate(slot_ix, param_ix))
            .ok_or(CoreError::Model("parameter is missing from parameter frame"))?;
        debug_assert_eq!(range.len(), usize::from(param.byte_length));
        Ok(range)
    }

    /**
        store a new value for the given parameter and signal it to the host

        `bit_length` is the length of the value, it must round up to the parameter's byte length and `data` must hold at least that many bytes. On error nothing is written and no message is sent.

        A [Message::ParamWrite] is sent even if the value did not change. The parameter is marked pending once, no matter how many times it is written before being drained.
    */
    pub fn write<const N: usize>(&mut self,
            device: &Device,
            slot_ix: u16,
            param_ix: u16,
            bit_length: usize,
            data: &[u8],
            channel: &mut MessageChannel<N>,
            ) -> CoreResult {
        let range = self.locate(device, slot_ix, param_ix, bit_length)?;
        let data = data.get(.. range.len())
            .ok_or(CoreError::Size("not enough data for parameter"))?;
        let frame = self.frame.as_mut()
            .ok_or(CoreError::Model("parameter is missing from parameter frame"))?;
        frame.data[range].copy_from_slice(data);
        debug!("parameter {}.{} written {:02x?}", slot_ix, param_ix, data);

        if ! self.pending.contains(&(slot_ix, param_ix)) {
            self.pending.push_back((slot_ix, param_ix));
        }
        channel.send(Message::ParamWrite {slot_ix, param_ix});
        Ok(())
    }

    /**
        copy the current value of the given parameter in `out`, returning the number of bytes copied

        The pending writes are not affected.
    */
    pub fn read(&self, device: &Device, slot_ix: u16, param_ix: u16, bit_length: usize, out: &mut [u8]) -> CoreResult<usize> {
        let range = self.locate(device, slot_ix, param_ix, bit_length)?;
        let size = range.len();
        let out = out.get_mut(.. size)
            .ok_or(CoreError::Size("output buffer too small for parameter"))?;
        let frame = self.frame.as_ref()
            .ok_or(CoreError::Model("parameter is missing from parameter frame"))?;
        out.copy_from_slice(&frame.data[range]);
        Ok(size)
    }

    /// current value of a parameter
    pub fn get(&self, slot_ix: u16, param_ix: u16) -> Option<&[u8]> {
        let frame = self.frame.as_ref()?;
        frame.locate(slot_ix, param_ix).map(|range| &frame.data[range])
    }

    /**
        pop the oldest pending parameter write with the current value of its parameter, or `None` if all writes were drained

        The host is expected to call this repeatedly after each [Message::ParamWrite] until it returns `None`.
    */
    pub fn take_write_request(&mut self) -> Option<ParamWrite> {
        while let Some((slot_ix, param_ix)) = self.pending.pop_front() {
            if let Some(data) = self.get(slot_ix, param_ix) {
                return Some(ParamWrite {slot_ix, param_ix, data: data.to_vec()})
            }
        }
        None
    }
    /// number of parameters written and not yet drained
    pub fn pending(&self) -> usize  {self.pending.len()}

    /// position in its slot of the parameter with the given fieldbus parameter number
    pub fn param_ix(device: &Device, slot_ix: u16, index: u32) -> CoreResult<u16> {
        let slot = device.slots.get(usize::from(slot_ix))
            .ok_or(CoreError::Index("slot index out of range"))?;
        let position = slot.params.iter()
            .position(|param| param.index == index)
            .ok_or(CoreError::Index("no parameter with this number in slot"))?;
        u16::try_from(position)
            .map_err(|_| CoreError::Model("too many items in slot"))
    }
}
