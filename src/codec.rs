/*!
    Packing and unpacking of signal values in process data frames.

    [SignalCodec] accesses one signal at a time in a raw frame, using the offsets computed by [crate::layout]. [ProcessImage] holds the current values of all signals of a device on the host side and converts them from/to whole frames.

    Values are handled as raw `u64` bit patterns holding one array element each. [Value] gives a typed view of these bits.
*/

use crate::{
    data::{BitField, ByteOrder, BYTE_ORDER},
    error::{CoreError, CoreResult},
    layout::FrameInfo,
    model::{DataType, Device, Direction},
    };


/// typed value of one signal element
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8), I16(i16), I32(i32), I64(i64),
    U8(u8), U16(u16), U32(u32), U64(u64),
    F32(f32), F64(f64),
    /// bitfields and unknown types
    Raw(u64),
}
impl Value {
    /// interpret the raw bits of an element of the given type
    pub fn from_raw(data_type: DataType, raw: u64) -> Self {
        match data_type {
            DataType::Bool => Self::Bool(raw & 1 != 0),
            DataType::Int8 => Self::I8(raw as u8 as i8),
            DataType::Int16 => Self::I16(raw as u16 as i16),
            DataType::Int32 => Self::I32(raw as u32 as i32),
            DataType::Int64 => Self::I64(raw as i64),
            DataType::Uint8 => Self::U8(raw as u8),
            DataType::Uint16 => Self::U16(raw as u16),
            DataType::Uint32 => Self::U32(raw as u32),
            DataType::Uint64 => Self::U64(raw),
            DataType::Real32 => Self::F32(f32::from_bits(raw as u32)),
            DataType::Real64 => Self::F64(f64::from_bits(raw)),
            DataType::Bitfield(_) | DataType::Unknown(_) => Self::Raw(raw),
        }
    }
    /// raw bits of the value, signed values are not sign extended beyond their width
    pub fn to_raw(&self) -> u64 {
        match *self {
            Self::Bool(v) => u64::from(v),
            Self::I8(v) => u64::from(v as u8),
            Self::I16(v) => u64::from(v as u16),
            Self::I32(v) => u64::from(v as u32),
            Self::I64(v) => v as u64,
            Self::U8(v) => u64::from(v),
            Self::U16(v) => u64::from(v),
            Self::U32(v) => u64::from(v),
            Self::U64(v) => v,
            Self::F32(v) => u64::from(v.to_bits()),
            Self::F64(v) => v.to_bits(),
            Self::Raw(v) => v,
        }
    }
}


/**
    access to individual signals of a frame of one direction

    Every access first checks the frame has exactly the size computed for the layout, so a frame built for another device or direction is rejected instead of being misread.
*/
#[derive(Copy, Clone, Debug)]
pub struct SignalCodec<'a> {
    device: &'a Device,
    info: &'a FrameInfo,
    order: ByteOrder,
}
impl<'a> SignalCodec<'a> {
    /// codec using the build byte order
    pub fn new(device: &'a Device, info: &'a FrameInfo) -> Self {
        Self::with_order(device, info, BYTE_ORDER)
    }
    pub fn with_order(device: &'a Device, info: &'a FrameInfo, order: ByteOrder) -> Self {
        Self {device, info, order}
    }

    fn direction(&self) -> CoreResult<Direction> {
        self.info.direction().ok_or(CoreError::Model("frame layout not computed"))
    }
    fn check(&self, frame: &[u8]) -> CoreResult {
        if frame.len() != self.info.total_size()
            {return Err(CoreError::Size("frame size does not match layout"))}
        Ok(())
    }

    /// location of the given signal in the frame
    pub fn field(&self, slot_ix: u16, signal_ix: u16) -> CoreResult<BitField> {
        let signal = self.device.signal(self.direction()?, slot_ix, signal_ix)?;
        let offset = self.info.signal_offset(slot_ix, signal_ix)
            .ok_or(CoreError::Model("layout does not match device"))?;
        let field = BitField::new(offset * 8, signal.bit_length(), signal.array_length());
        debug_assert!(field.bit + field.len() <= self.info.total_size() * 8);
        Ok(field)
    }

    /// read all elements of a signal
    pub fn unpack(&self, frame: &[u8], slot_ix: u16, signal_ix: u16) -> CoreResult<Vec<u64>> {
        self.check(frame)?;
        Ok(self.field(slot_ix, signal_ix)?.unpack(frame, self.order)?)
    }
    /// write all elements of a signal, `values` must hold exactly one value per element
    pub fn pack(&self, frame: &mut [u8], slot_ix: u16, signal_ix: u16, values: &[u64]) -> CoreResult {
        self.check(frame)?;
        Ok(self.field(slot_ix, signal_ix)?.pack(frame, values, self.order)?)
    }
    /// read one element of a signal as a typed value
    pub fn get(&self, frame: &[u8], slot_ix: u16, signal_ix: u16, element: usize) -> CoreResult<Value> {
        self.check(frame)?;
        let data_type = self.device.signal(self.direction()?, slot_ix, signal_ix)?.data_type;
        let raw = self.field(slot_ix, signal_ix)?.get(frame, element, self.order)?;
        Ok(Value::from_raw(data_type, raw))
    }
    /// write one element of a signal
    pub fn set(&self, frame: &mut [u8], slot_ix: u16, signal_ix: u16, element: usize, value: Value) -> CoreResult {
        self.check(frame)?;
        Ok(self.field(slot_ix, signal_ix)?.set(frame, element, value.to_raw(), self.order)?)
    }

    /// status byte of a slot
    pub fn status(&self, frame: &[u8], slot_ix: u16) -> CoreResult<u8> {
        self.check(frame)?;
        let offset = self.info.status_offset(slot_ix)
            .ok_or(CoreError::Index("slot index out of range"))?;
        Ok(frame[offset])
    }
    pub fn set_status(&self, frame: &mut [u8], slot_ix: u16, status: u8) -> CoreResult {
        self.check(frame)?;
        let offset = self.info.status_offset(slot_ix)
            .ok_or(CoreError::Index("slot index out of range"))?;
        frame[offset] = status;
        Ok(())
    }
}


/// current signal values and status of one slot in one direction
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SlotImage {
    /// elements of each signal
    pub signals: Vec<Vec<u64>>,
    pub status: u8,
}

/**
    host side copy of all the process data of a device

    the tx image is what the host wants to send to the PLC, the rx image is what was last received from the PLC
*/
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProcessImage {
    tx: Vec<SlotImage>,
    rx: Vec<SlotImage>,
}
impl ProcessImage {
    /// all values set to zero
    pub fn new(device: &Device) -> Self {
        let image = |direction| device.slots.iter()
            .map(|slot| SlotImage {
                signals: slot.signals(direction).iter()
                    .map(|signal| vec![0; signal.array_length()])
                    .collect(),
                status: 0,
            })
            .collect();
        Self {
            tx: image(Direction::Tx),
            rx: image(Direction::Rx),
        }
    }

    /// slot images of the given direction
    pub fn slots(&self, direction: Direction) -> &[SlotImage] {
        match direction {
            Direction::Tx => &self.tx,
            Direction::Rx => &self.rx,
        }
    }
    fn slot(&self, direction: Direction, slot_ix: u16) -> CoreResult<&SlotImage> {
        self.slots(direction).get(usize::from(slot_ix))
            .ok_or(CoreError::Index("slot index out of range"))
    }
    fn slot_mut(&mut self, direction: Direction, slot_ix: u16) -> CoreResult<&mut SlotImage> {
        let slots = match direction {
            Direction::Tx => &mut self.tx,
            Direction::Rx => &mut self.rx,
        };
        slots.get_mut(usize::from(slot_ix))
            .ok_or(CoreError::Index("slot index out of range"))
    }

    /// all elements of a signal
    pub fn get(&self, direction: Direction, slot_ix: u16, signal_ix: u16) -> CoreResult<&[u64]> {
        self.slot(direction, slot_ix)?
            .signals.get(usize::from(signal_ix))
            .map(Vec::as_slice)
            .ok_or(CoreError::Index("signal index out of range"))
    }
    /// replace all elements of a signal, `values` must have one value per element
    pub fn set(&mut self, direction: Direction, slot_ix: u16, signal_ix: u16, values: &[u64]) -> CoreResult {
        let signal = self.slot_mut(direction, slot_ix)?
            .signals.get_mut(usize::from(signal_ix))
            .ok_or(CoreError::Index("signal index out of range"))?;
        if signal.len() != values.len()
            {return Err(CoreError::Size("wrong number of elements for signal"))}
        signal.copy_from_slice(values);
        Ok(())
    }

    /// one element of a signal as a typed value
    pub fn value(&self, device: &Device, direction: Direction, slot_ix: u16, signal_ix: u16, element: usize) -> CoreResult<Value> {
        let data_type = device.signal(direction, slot_ix, signal_ix)?.data_type;
        let raw = *self.get(direction, slot_ix, signal_ix)?
            .get(element)
            .ok_or(CoreError::Index("element index out of range"))?;
        Ok(Value::from_raw(data_type, raw))
    }
    /// set one element of a signal
    pub fn set_value(&mut self, direction: Direction, slot_ix: u16, signal_ix: u16, element: usize, value: Value) -> CoreResult {
        let raw = self.slot_mut(direction, slot_ix)?
            .signals.get_mut(usize::from(signal_ix))
            .ok_or(CoreError::Index("signal index out of range"))?
            .get_mut(element)
            .ok_or(CoreError::Index("element index out of range"))?;
        *raw = value.to_raw();
        Ok(())
    }

    pub fn status(&self, direction: Direction, slot_ix: u16) -> CoreResult<u8> {
        Ok(self.slot(direction, slot_ix)?.status)
    }
    pub fn set_status(&mut self, direction: Direction, slot_ix: u16, status: u8) -> CoreResult {
        self.slot_mut(direction, slot_ix)?.status = status;
        Ok(())
    }

    /// write the image of the layout's direction into `frame`
    pub fn pack(&self, device: &Device, info: &FrameInfo, frame: &mut [u8]) -> CoreResult {
        let codec = SignalCodec::new(device, info);
        let direction = codec.direction()?;
        codec.check(frame)?;
        for (slot_ix, slot) in (0 ..).zip(self.slots(direction)) {
            for (signal_ix, values) in (0 ..).zip(&slot.signals) {
                codec.field(slot_ix, signal_ix)?.pack(frame, values, codec.order)?;
            }
            codec.set_status(frame, slot_ix, slot.status)?;
        }
        Ok(())
    }
    /// read `frame` into the image of the layout's direction, the image is left untouched on error
    pub fn unpack(&mut self, device: &Device, info: &FrameInfo, frame: &[u8]) -> CoreResult {
        let codec = SignalCodec::new(device, info);
        let direction = codec.direction()?;
        codec.check(frame)?;
        let mut slots = Vec::with_capacity(info.slots());
        for (slot_ix, slot) in (0 ..).zip(&device.slots) {
            let signals = (0 .. slot.signals(direction).len())
                .map(|signal_ix| -> CoreResult<Vec<u64>> {
                    Ok(codec.field(slot_ix, signal_ix as u16)?.unpack(frame, codec.order)?)
                })
                .collect::<CoreResult<Vec<_>>>()?;
            slots.push(SlotImage {signals, status: codec.status(frame, slot_ix)?});
        }
        match direction {
            Direction::Tx => self.tx = slots,
            Direction::Rx => self.rx = slots,
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        layout::FrameLayout,
        model::{Signal, Slot, BusType},
        };

    fn device() -> Device {
        Device::new("dev", BusType::Mock)
            .slot(Slot::new("s0")
                .input(Signal::new("flag", DataType::Bool))
                .input(Signal::new("speed", DataType::Int16))
                .input(Signal::array("bits", DataType::Bitfield(3), 5))
                .output(Signal::new("setpoint", DataType::Real32)))
            .slot(Slot::new("s1")
                .input(Signal::new("count", DataType::Uint32)))
    }

    #[test]
    fn values() {
        assert_eq!(Value::from_raw(DataType::Int8, 0xff), Value::I8(-1));
        assert_eq!(Value::from_raw(DataType::Int16, 0x8000), Value::I16(i16::MIN));
        assert_eq!(Value::I16(-2).to_raw(), 0xfffe);
        assert_eq!(Value::from_raw(DataType::Real32, 1.5f32.to_bits().into()), Value::F32(1.5));
        assert_eq!(Value::from_raw(DataType::Bool, 3), Value::Bool(true));
        assert_eq!(Value::from_raw(DataType::Bitfield(3), 5), Value::Raw(5));
    }

    #[test]
    fn signals_in_frame() {
        let device = device();
        let layout = FrameLayout::compute(&device);
        let codec = SignalCodec::with_order(&device, &layout.tx, ByteOrder::Little);
        // 1 + 2 + 2 + status, 4 + status
        let mut frame = vec![0; layout.tx.total_size()];
        assert_eq!(frame.len(), 11);

        codec.set(&mut frame, 0, 1, 0, Value::I16(-2)).unwrap();
        codec.pack(&mut frame, 0, 2, &[1, 2, 3, 4, 7]).unwrap();
        codec.set(&mut frame, 1, 0, 0, Value::U32(0x01020304)).unwrap();
        codec.set_status(&mut frame, 1, 0x80).unwrap();
        assert_eq!(frame, [0, 0xfe, 0xff, 0b11_010_001, 0b0_111_100_0, 0, 4, 3, 2, 1, 0x80]);

        assert_eq!(codec.get(&frame, 0, 1, 0).unwrap(), Value::I16(-2));
        assert_eq!(codec.unpack(&frame, 0, 2).unwrap(), [1, 2, 3, 4, 7]);
        assert_eq!(codec.status(&frame, 1).unwrap(), 0x80);
    }

    #[test]
    fn rejects_bad_access() {
        let device = device();
        let layout = FrameLayout::compute(&device);
        let codec = SignalCodec::new(&device, &layout.tx);
        let mut frame = vec![0; layout.tx.total_size()];
        assert!(matches!(codec.unpack(&frame[1 ..], 0, 0), Err(CoreError::Size(_))));
        assert!(matches!(codec.unpack(&frame, 0, 3), Err(CoreError::Index(_))));
        assert!(matches!(codec.unpack(&frame, 2, 0), Err(CoreError::Index(_))));
        assert!(matches!(codec.pack(&mut frame, 0, 2, &[1, 2]), Err(CoreError::Size(_))));
        assert!(matches!(codec.get(&frame, 0, 2, 5), Err(CoreError::Size(_))));
        assert_eq!(frame, vec![0; layout.tx.total_size()]);
    }

    #[test]
    fn image_frames() {
        let device = device();
        let layout = FrameLayout::compute(&device);
        let mut image = ProcessImage::new(&device);
        image.set(Direction::Tx, 0, 2, &[7, 6, 5, 4, 3]).unwrap();
        image.set_value(Direction::Tx, 1, 0, 0, Value::U32(42)).unwrap();
        image.set_status(Direction::Tx, 0, 1).unwrap();
        assert!(image.set(Direction::Tx, 0, 2, &[1]).is_err());

        let mut frame = vec![0; layout.tx.total_size()];
        image.pack(&device, &layout.tx, &mut frame).unwrap();
        let mut copy = ProcessImage::new(&device);
        copy.unpack(&device, &layout.tx, &frame).unwrap();
        assert_eq!(copy.slots(Direction::Tx), image.slots(Direction::Tx));

        let mut frame = vec![0; layout.rx.total_size()];
        SignalCodec::new(&device, &layout.rx).pack(&mut frame, 0, 0, &[u64::from(2.5f32.to_bits())]).unwrap();
        image.unpack(&device, &layout.rx, &frame).unwrap();
        assert_eq!(image.value(&device, Direction::Rx, 0, 0, 0).unwrap(), Value::F32(2.5));

        // wrong size leaves the image intact
        assert!(image.unpack(&device, &layout.rx, &frame[.. 2]).is_err());
        assert_eq!(image.value(&device, Direction::Rx, 0, 0, 0).unwrap(), Value::F32(2.5));
    }
}
