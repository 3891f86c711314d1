use std::{sync::Arc, time::Duration};
use futures_concurrency::future::Race;
use gatecore::{
    Alarm, AlarmLevel, BusType, Config, Core, CoreError, CoreResult, DataType, Device, Direction, ErrorCode, EventMask,
    Indications, MockAdapter, Parameter, Signal, Slot, Status, Value,
    };

/// host application mirroring outputs to inputs
struct Loopback;
impl Indications for Loopback {
    fn avail(&mut self, core: &Core) {
        if let Err(err) = core.read_outputs()
            {log::error!("cannot read outputs: {}", err)}
    }
    fn sync(&mut self, core: &Core) {
        let Ok(value) = core.value(Direction::Rx, 0, 0, 0)  else {return};
        let echo = match value {
            Value::U16(v) => Value::U16(v.wrapping_add(1)),
            other => other,
        };
        if let Err(err) = core.set_value(0, 0, 0, echo).and_then(|_| core.write_inputs())
            {log::error!("cannot write inputs: {}", err)}
    }
    fn param_write_ind(&mut self, core: &Core) {
        while let Some(write) = core.take_write_request() {
            println!("parameter {}.{} = {:02x?}", write.slot_ix, write.param_ix, write.data);
        }
    }
    fn status_ind(&mut self, _core: &Core, status: Status) {
        println!("status {:?}", status);
    }
    fn error_ind(&mut self, _core: &Core, code: ErrorCode) {
        println!("error: {}", code);
    }
}

#[tokio::main]
async fn main() -> CoreResult {
    env_logger::init();

    let device = Device::new("loopback", BusType::Mock)
        .slot(Slot::new("counter")
            .input(Signal::new("count", DataType::Uint16))
            .output(Signal::new("setpoint", DataType::Uint16))
            .param(Parameter::new("step", 0x2000, 2, vec![0, 1])))
        .slot(Slot::new("leds")
            .output(Signal::array("state", DataType::Bool, 8)));
    let adapter = Arc::new(MockAdapter::new());
    let core = Arc::new(Core::new(device, adapter.clone(), Config {
        event_mask: EventMask::synchronous(),
        watchdog: true,
        .. Default::default()
    })?);
    println!("{}", core.layout());

    (
        // fieldbus side: a PLC incrementing the setpoint every cycle
        async {
            let mut setpoint = 0u16;
            let mut frame = vec![0; core.frame_info(Direction::Rx).total_size()];
            for cycle in 0u32 .. 500 {
                setpoint = setpoint.wrapping_add(1);
                frame[.. 2].copy_from_slice(&setpoint.to_le_bytes());
                adapter.set_rx(&frame);
                core.avail();
                core.sync();
                core.event_ind();
                if cycle % 100 == 0 {
                    core.write_param(0, 0, 16, &cycle.to_le_bytes()[.. 2])?;
                }
                // a diagnostic on the leds slot for a while
                let blink = Alarm::new(AlarmLevel::Warning, 0x0101);
                match cycle {
                    200 => core.add_alarm(1, blink)?,
                    300 => core.remove_alarm(1, blink)?,
                    _ => {},
                }
                tokio::time::sleep(Duration::from_millis(4)).await;
            }
            println!("last input frame {:02x?}", adapter.tx());
            Ok::<_, CoreError>(())
        },
        gatecore::runtime::run(core.clone(), &mut Loopback),
    ).race().await
}
