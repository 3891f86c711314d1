/*!
    Diagnostic alarms raised by the host on the slots of a device.

    Each slot holds the set of its active alarms. An alarm is identified by its level and code, the text describing it comes with the device description on the fieldbus side.
*/

use core::fmt;
use crate::{
    error::{CoreError, CoreResult},
    model::Device,
    };


/// severity of an alarm
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AlarmLevel {
    Error,
    Warning,
    Info,
}
impl AlarmLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// a diagnostic alarm
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Alarm {
    pub level: AlarmLevel,
    /// fieldbus specific error code
    pub code: u16,
}
impl Alarm {
    pub fn new(level: AlarmLevel, code: u16) -> Self  {Self {level, code}}
}
impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:#06x}", self.level.as_str(), self.code)
    }
}


/// active alarms of every slot of a device
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AlarmSet {
    slots: Vec<Vec<Alarm>>,
}
impl AlarmSet {
    /// no alarm active on any slot of the device
    pub fn new(device: &Device) -> Self {
        Self {slots: vec![Vec::new(); device.slots.len()]}
    }

    fn slot_mut(&mut self, slot_ix: u16) -> CoreResult<&mut Vec<Alarm>> {
        self.slots.get_mut(usize::from(slot_ix))
            .ok_or(CoreError::Index("slot index out of range"))
    }

    /// activate an alarm on a slot, fails if it is already active
    pub fn add(&mut self, slot_ix: u16, alarm: Alarm) -> CoreResult {
        let active = self.slot_mut(slot_ix)?;
        if active.contains(&alarm)
            {return Err(CoreError::Conflict("alarm already active on slot"))}
        active.push(alarm);
        Ok(())
    }
    /// deactivate an alarm on a slot, fails if it is not active
    pub fn remove(&mut self, slot_ix: u16, alarm: Alarm) -> CoreResult {
        let active = self.slot_mut(slot_ix)?;
        let position = active.iter()
            .position(|other| *other == alarm)
            .ok_or(CoreError::Conflict("alarm not active on slot"))?;
        active.remove(position);
        Ok(())
    }
    /// active alarms of a slot, in activation order
    pub fn get(&self, slot_ix: u16) -> CoreResult<&[Alarm]> {
        self.slots.get(usize::from(slot_ix))
            .map(Vec::as_slice)
            .ok_or(CoreError::Index("slot index out of range"))
    }
    /// total number of active alarms
    pub fn len(&self) -> usize  {self.slots.iter().map(Vec::len).sum()}
    pub fn is_empty(&self) -> bool  {self.len() == 0}
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BusType, Slot};

    fn set() -> AlarmSet {
        let device = Device::new("dev", BusType::Profinet)
            .slot(Slot::new("s0"))
            .slot(Slot::new("s1"));
        AlarmSet::new(&device)
    }

    #[test]
    fn add_and_remove() {
        let mut alarms = set();
        let overheat = Alarm::new(AlarmLevel::Error, 0x21);
        let low = Alarm::new(AlarmLevel::Warning, 0x21);
        alarms.add(1, overheat).unwrap();
        alarms.add(1, low).unwrap();
        alarms.add(0, overheat).unwrap();
        assert_eq!(alarms.get(1), Ok(&[overheat, low][..]));
        assert_eq!(alarms.len(), 3);

        alarms.remove(1, overheat).unwrap();
        assert_eq!(alarms.get(1), Ok(&[low][..]));
        assert_eq!(alarms.get(0), Ok(&[overheat][..]));
    }

    #[test]
    fn invalid_changes_are_rejected() {
        let mut alarms = set();
        let alarm = Alarm::new(AlarmLevel::Info, 7);
        assert_eq!(alarms.add(2, alarm), Err(CoreError::Index("slot index out of range")));
        assert_eq!(alarms.remove(2, alarm), Err(CoreError::Index("slot index out of range")));
        assert!(alarms.get(2).is_err());

        let missing = alarms.remove(0, alarm).unwrap_err();
        assert!(matches!(missing, CoreError::Conflict(_)));
        assert!(missing.code() < 0);
        alarms.add(0, alarm).unwrap();
        assert!(matches!(alarms.add(0, alarm), Err(CoreError::Conflict(_))));
        assert_eq!(alarms.len(), 1);
    }

    #[test]
    fn display() {
        assert_eq!(Alarm::new(AlarmLevel::Warning, 0x1f).to_string(), "warning 0x001f");
    }
}
