/*!
    Device-independent core of a fieldbus gateway.

    It turns a declarative [Device] model into the binary layout of the process data frames exchanged with a fieldbus engine, keeps the current parameter values, supervises the host/core communication and delivers indications to the host application.

    The entry point is [Core], see [runtime::run] to drive it with tokio.
*/

pub mod data;
pub mod error;
pub mod model;
pub mod layout;
pub mod codec;
pub mod params;
pub mod status;
pub mod alarm;
pub mod message;
pub mod adapter;
pub mod config;
pub mod core;
pub mod runtime;

pub use crate::data::{BitField, ByteOrder, BYTE_ORDER};
pub use crate::error::{CoreError, CoreResult, ErrorCode};
pub use crate::model::{BusType, DataType, Device, Direction, Parameter, Signal, Slot};
pub use crate::layout::{FrameInfo, FrameLayout};
pub use crate::codec::{ProcessImage, SignalCodec, Value};
pub use crate::params::{ParamFrame, ParamWrite, ParameterStore};
pub use crate::status::{EventMask, Status};
pub use crate::alarm::{Alarm, AlarmLevel};
pub use crate::message::{Message, MessageChannel};
pub use crate::adapter::{Adapter, Indications, MockAdapter, Transport};
pub use crate::config::Config;
pub use crate::core::{Core, VERSION};
