/*!
    Declarative description of a device: its slots, their signals and their parameters.

    A [Device] is usually produced by an external generator from the device description, the core never mutates it. Slots are addressed by their index in [Device::slots], signals and parameters by their index in their slot.

    ## Example

    ```ignore
    let device = Device::new("io-block", BusType::Profinet)
        .slot(Slot::new("digital")
            .input(Signal::new("buttons", DataType::Uint8))
            .output(Signal::array("leds", DataType::Bitfield(1), 8))
            .param(Parameter::new("debounce", 1024, 4, vec![0, 0, 0, 10])));
    ```
*/

use core::fmt;
use crate::{
    data::bits_to_bytes,
    error::{CoreError, CoreResult},
    };


/// direction of the process data in a frame
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    /// data sent by the device to the PLC, aka. inputs
    Tx,
    /// data received by the device from the PLC, aka. outputs
    Rx,
}

/// fieldbus the device is configured for
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum BusType {
    #[default]
    Mock,
    Profinet,
    Ethercat,
    EthernetIp,
}
impl BusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "Mock",
            Self::Profinet => "Profinet",
            Self::Ethercat => "EtherCAT",
            Self::EthernetIp => "EtherNet/IP",
        }
    }
}

/** data type of a signal element

    Each data type has a fixed bit length. Unknown type codes (coming from a newer generator) are kept with their code and report a bit length of 1, so that layouts still progress.
*/
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DataType {
    Bool,
    Int8, Int16, Int32, Int64,
    Uint8, Uint16, Uint32, Uint64,
    Real32, Real64,
    /// raw unsigned field of the given number of bits, from 1 to 64
    Bitfield(u8),
    /// type code not known to this core
    Unknown(u16),
}
impl DataType {
    /// bit length of one element of this type, 1 if the type is not known
    pub fn bit_length(&self) -> u16 {
        match self {
            Self::Bool => 1,
            Self::Int8 | Self::Uint8 => 8,
            Self::Int16 | Self::Uint16 => 16,
            Self::Int32 | Self::Uint32 | Self::Real32 => 32,
            Self::Int64 | Self::Uint64 | Self::Real64 => 64,
            Self::Bitfield(bits) if (1 ..= 64).contains(bits) => u16::from(*bits),
            Self::Bitfield(_) | Self::Unknown(_) => 1,
        }
    }
    /// false for types whose bit length is only a placeholder
    pub fn is_known(&self) -> bool {
        match self {
            Self::Bitfield(bits) => (1 ..= 64).contains(bits),
            Self::Unknown(_) => false,
            _ => true,
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::Int8 => "INT8",
            Self::Int16 => "INT16",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Uint8 => "UINT8",
            Self::Uint16 => "UINT16",
            Self::Uint32 => "UINT32",
            Self::Uint64 => "UINT64",
            Self::Real32 => "REAL32",
            Self::Real64 => "REAL64",
            Self::Bitfield(bits) if (1 ..= 64).contains(bits) => "BITFIELD",
            Self::Bitfield(_) | Self::Unknown(_) => "unknown data type",
        }
    }
}
impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitfield(bits) if self.is_known() => write!(f, "BITFIELD{}", bits),
            _ => f.write_str(self.as_str()),
        }
    }
}


/// a typed process data value
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signal {
    pub name: String,
    pub data_type: DataType,
    /// number of elements for array signals, `None` for scalars
    pub array_length: Option<u16>,
}
impl Signal {
    /// scalar signal
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {name: name.into(), data_type, array_length: None}
    }
    /// array signal of `length` elements
    pub fn array(name: impl Into<String>, data_type: DataType, length: u16) -> Self {
        Self {name: name.into(), data_type, array_length: Some(length)}
    }
    /// bit length of one element
    pub fn bit_length(&self) -> usize  {usize::from(self.data_type.bit_length())}
    /// number of elements, 1 for scalar signals
    pub fn array_length(&self) -> usize  {usize::from(self.array_length.unwrap_or(1))}
    /// bit size of the whole signal
    pub fn bit_size(&self) -> usize  {self.bit_length() * self.array_length()}
    /// byte size taken by the signal in a frame
    pub fn byte_size(&self) -> usize  {bits_to_bytes(self.bit_size())}
}

/// a configuration value with a default
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// parameter number in the fieldbus numbering (eg. a profinet record index), distinct from the parameter position in its slot
    pub index: u32,
    /// size of the parameter value
    pub byte_length: u16,
    /// default value, must be exactly [Self::byte_length] long
    pub default: Vec<u8>,
}
impl Parameter {
    pub fn new(name: impl Into<String>, index: u32, byte_length: u16, default: Vec<u8>) -> Self {
        Self {name: name.into(), index, byte_length, default}
    }
}

/// a connector position of the device, with its process data and parameters
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Slot {
    pub name: String,
    /// signals sent to the PLC
    pub inputs: Vec<Signal>,
    /// signals received from the PLC
    pub outputs: Vec<Signal>,
    pub params: Vec<Parameter>,
}
impl Slot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {name: name.into(), .. Default::default()}
    }
    pub fn input(mut self, signal: Signal) -> Self  {self.inputs.push(signal); self}
    pub fn output(mut self, signal: Signal) -> Self  {self.outputs.push(signal); self}
    pub fn param(mut self, param: Parameter) -> Self  {self.params.push(param); self}

    /// signals of the given direction, in declaration order
    pub fn signals(&self, direction: Direction) -> &[Signal] {
        match direction {
            Direction::Tx => &self.inputs,
            Direction::Rx => &self.outputs,
        }
    }
}

/// the complete device model
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Device {
    pub name: String,
    pub bustype: BusType,
    pub slots: Vec<Slot>,
}
impl Device {
    pub fn new(name: impl Into<String>, bustype: BusType) -> Self {
        Self {name: name.into(), bustype, slots: Vec::new()}
    }
    pub fn slot(mut self, slot: Slot) -> Self  {self.slots.push(slot); self}

    /// parameter at the given indices, or an index error
    pub fn param(&self, slot_ix: u16, param_ix: u16) -> CoreResult<&Parameter> {
        self.slots.get(usize::from(slot_ix))
            .ok_or(CoreError::Index("slot index out of range"))?
            .params.get(usize::from(param_ix))
            .ok_or(CoreError::Index("parameter index out of range"))
    }
    /// signal at the given indices, or an index error
    pub fn signal(&self, direction: Direction, slot_ix: u16, signal_ix: u16) -> CoreResult<&Signal> {
        self.slots.get(usize::from(slot_ix))
            .ok_or(CoreError::Index("slot index out of range"))?
            .signals(direction).get(usize::from(signal_ix))
            .ok_or(CoreError::Index("signal index out of range"))
    }
    /// total number of parameters in all slots
    pub fn param_count(&self) -> usize {
        self.slots.iter().map(|slot| slot.params.len()).sum()
    }

    /// check the model is consistent enough to compute layouts and parameter frames from it
    pub fn validate(&self) -> CoreResult {
        if self.slots.len() > usize::from(u16::MAX)
            {return Err(CoreError::Model("too many slots"))}
        for slot in &self.slots {
            if slot.inputs.len() > usize::from(u16::MAX)
            || slot.outputs.len() > usize::from(u16::MAX)
            || slot.params.len() > usize::from(u16::MAX)
                {return Err(CoreError::Model("too many items in slot"))}
            for signal in slot.inputs.iter().chain(slot.outputs.iter()) {
                if signal.array_length == Some(0)
                    {return Err(CoreError::Model("array signal with no element"))}
            }
            for param in &slot.params {
                if param.default.len() != usize::from(param.byte_length)
                    {return Err(CoreError::Model("parameter default does not match its length"))}
            }
        }
        Ok(())
    }
}
