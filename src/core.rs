/*!
    The gateway core: one context object gathering the device model, its frame layouts, the parameter store, the connection state and the message channel.

    [Core] is shared between several execution contexts:

    - the timer calling [Core::tick] at a fixed period
    - the transport reporting RPC exchanges ([Core::avail], [Core::sync], [Core::rpc_activity]), link loss ([Core::disconnected]) and interrupts ([Core::event_ind])
    - the host worker loop calling [Core::worker] and, from the indications, the frame and parameter operations

    All mutable state sits behind one mutex. The lock is never held while calling the [Adapter] or the host [Indications], so both may call back into the core.
*/

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
    };
use log::{info, warn, debug};
use tokio::sync::Notify;
use crate::{
    adapter::{Adapter, Indications, Transport},
    alarm::{Alarm, AlarmSet},
    codec::{ProcessImage, SignalCodec, Value},
    config::Config,
    error::{CoreResult, ErrorCode},
    layout::{FrameInfo, FrameLayout},
    message::{Message, MessageChannel},
    model::{Device, Direction},
    params::{ParamWrite, ParameterStore},
    status::{is_expired, ConnectionState, EventMask, Status, Watchdog},
    };


/// crate version, reported to peers
pub const VERSION: &str = env!("CARGO_PKG_VERSION");


/**
    gateway core context

    Create it with [Core::new] from a device model and an adapter, share it (eg. in an [Arc]) with the transport and timer contexts, and call [Core::worker] in a loop from the host side (see [crate::runtime::run] for a ready-made loop).
*/
pub struct Core {
    config: Config,
    adapter: Arc<dyn Adapter>,
    // set by interrupts, consumed by the worker
    interrupt: AtomicBool,
    event: Notify,
    state: Mutex<State>,
}
struct State {
    device: Device,
    layout: FrameLayout,
    params: ParameterStore,
    image: ProcessImage,
    alarms: AlarmSet,
    channel: MessageChannel,
    connection: ConnectionState,
    watchdog: Watchdog,
    event_mask: EventMask,
    /// current tick count, wraps around
    tick: u32,
    last_poll: u32,
    transport: Transport,
    transport_failed: bool,
    last_error: Option<ErrorCode>,
    crc_errors: u32,
}

impl State {
    // a valid RPC exchange happened
    fn valid_exchange(&mut self) {
        let now = self.tick;
        if self.watchdog.feed(now) {
            info!("host communication recovered");
        }
        if self.transport_failed {
            info!("transport recovered");
            self.transport_failed = false;
        }
        self.last_error = None;
        self.connection.set(Status::CONNECTED, &mut self.channel);
    }
}

impl Core {
    /**
        initialize the core for the given device

        The device model is validated, the frame layouts are computed and the parameter frame is filled with defaults. The returned core is [Status::configured], and not yet connected.
    */
    pub fn new(device: Device, adapter: Arc<dyn Adapter>, config: Config) -> CoreResult<Self> {
        device.validate()?;
        let layout = FrameLayout::compute(&device);
        let params = ParameterStore::new(&device)?;
        let image = ProcessImage::new(&device);
        let alarms = AlarmSet::new(&device);
        info!("core {} for {:?} on {}: {} slots, {} parameters, tx {} bytes, rx {} bytes",
            VERSION,
            device.name,
            device.bustype.as_str(),
            device.slots.len(),
            device.param_count(),
            layout.tx.total_size(),
            layout.rx.total_size(),
            );

        let mut channel = MessageChannel::new();
        let mut connection = ConnectionState::new();
        connection.set(Status::CONFIGURED, &mut channel);
        if config.watchdog {
            connection.set(Status::WATCHDOG, &mut channel);
        }
        let watchdog = Watchdog::new(config.ticks(config.watchdog_timeout), 0);

        Ok(Self {
            config,
            adapter,
            interrupt: AtomicBool::new(false),
            event: Notify::new(),
            state: Mutex::new(State {
                device,
                layout,
                params,
                image,
                alarms,
                channel,
                connection,
                watchdog,
                event_mask: config.event_mask,
                tick: 0,
                last_poll: 0,
                transport: Transport::default(),
                transport_failed: false,
                last_error: None,
                crc_errors: 0,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &Config  {&self.config}
    /// copy of the current device model
    pub fn device(&self) -> Device  {self.state().device.clone()}
    /// copy of the current frame layouts
    pub fn layout(&self) -> FrameLayout  {self.state().layout.clone()}
    /// frame layout of the given direction
    pub fn frame_info(&self, direction: Direction) -> FrameInfo {
        self.state().layout.get(direction).clone()
    }

    /**
        replace the device model

        Layouts, parameter frame and process image are rebuilt from the new model, pending parameter writes and active alarms are forgotten. If the new model is invalid, the current configuration is kept and an error is returned.
    */
    pub fn reconfigure(&self, device: Device) -> CoreResult {
        if let Err(err) = device.validate() {
            warn!("rejected configuration {:?}: {}", device.name, err);
            self.set_error(ErrorCode::Configuration);
            return Err(err)
        }
        let layout = FrameLayout::compute(&device);
        let params = ParameterStore::new(&device)?;
        let image = ProcessImage::new(&device);
        let alarms = AlarmSet::new(&device);
        info!("reconfigured for {:?}, tx {} bytes, rx {} bytes",
            device.name, layout.tx.total_size(), layout.rx.total_size());

        let mut state = self.state();
        let state = &mut *state;
        state.device = device;
        state.layout = layout;
        state.params = params;
        state.image = image;
        state.alarms = alarms;
        state.connection.set(Status::CONFIGURED, &mut state.channel);
        Ok(())
    }


    // timing

    /**
        advance the tick counter, to be called every [Config::tick]

        This evaluates the watchdog and sends the periodic poll message. It never blocks.
    */
    pub fn tick(&self) {
        let expired = {
            let mut state = self.state();
            let state = &mut *state;
            state.tick = state.tick.wrapping_add(1);
            let now = state.tick;

            if is_expired(now, state.last_poll, self.config.ticks(self.config.poll_interval)) {
                state.last_poll = now;
                // one pending poll is enough to wake the host
                if ! state.channel.iter().any(|message| *message == Message::Poll) {
                    state.channel.send(Message::Poll);
                }
            }
            let expired = state.connection.is_watchdog_enabled() && state.watchdog.check(now);
            if expired {
                warn!("no valid exchange with host for {} ticks", state.watchdog.timeout());
                state.connection.clear(Status::CONNECTED, &mut state.channel);
            }
            expired
        };
        if expired {
            self.set_error(ErrorCode::CoreCommunication);
        }
    }
    /// current tick count
    pub fn ticks(&self) -> u32  {self.state().tick}


    // transport side

    /// output data was received from the PLC
    pub fn avail(&self) {
        let mut state = self.state();
        state.valid_exchange();
        if state.event_mask.avail() {
            state.channel.send(Message::Avail);
        }
    }
    /// input data will be sent to the PLC
    pub fn sync(&self) {
        let mut state = self.state();
        state.valid_exchange();
        if state.event_mask.sync() {
            state.channel.send(Message::Sync);
        }
    }
    /// any other valid exchange with the host
    pub fn rpc_activity(&self) {
        let mut state = self.state();
        state.valid_exchange();
    }
    /// the transport lost its link, reported as a [ErrorCode::Transport] error. This does nothing if already disconnected
    pub fn disconnected(&self) {
        let lost = {
            let mut state = self.state();
            let state = &mut *state;
            state.connection.clear(Status::CONNECTION_DEPENDENT, &mut state.channel)
        };
        if lost {
            warn!("host disconnected");
            self.set_error(ErrorCode::Transport);
        }
    }
    /**
        signal transport activity, to be called from the transport interrupt handler

        This only marks work pending and wakes the worker, the work itself is done by the next [Self::worker] call.
    */
    pub fn event_ind(&self) {
        self.interrupt.store(true, Ordering::Release);
        self.event.notify_one();
    }
    /// wait for the next call to [Self::event_ind]
    pub async fn event(&self) {
        self.event.notified().await
    }


    // errors

    /// report an asynchronous error to the host and the adapter
    pub fn set_error(&self, code: ErrorCode) {
        {
            let mut state = self.state();
            state.last_error = Some(code);
            state.channel.send(Message::Error(code));
        }
        warn!("{}", code);
        self.adapter.error_ind(code);
    }
    /// last error reported, cleared by the next valid exchange
    pub fn last_error(&self) -> Option<ErrorCode>  {self.state().last_error}
    /// count a frame received with a bad checksum
    pub fn add_crc_error(&self) {
        let mut state = self.state();
        state.crc_errors = state.crc_errors.wrapping_add(1);
        debug!("crc error, {} so far", state.crc_errors);
    }
    pub fn crc_errors(&self) -> u32  {self.state().crc_errors}
    /// number of messages lost because the host did not drain the channel fast enough
    pub fn dropped_messages(&self) -> u32  {self.state().channel.dropped()}

    pub fn set_transport(&self, transport: Transport) {
        info!("transport {}", transport.as_str());
        self.state().transport = transport;
    }
    pub fn transport(&self) -> Transport  {self.state().transport}


    // status

    /// current status flags
    pub fn status(&self) -> Status  {self.state().connection.status()}
    pub fn is_configured(&self) -> bool  {self.state().connection.is_configured()}
    pub fn is_connected(&self) -> bool  {self.state().connection.is_connected()}
    pub fn is_running(&self) -> bool  {self.state().connection.is_running()}
    pub fn is_watchdog_enabled(&self) -> bool  {self.state().connection.is_watchdog_enabled()}
    /// false once the transport failed, until the next valid exchange
    pub fn is_operable(&self) -> bool  {! self.state().transport_failed}

    /**
        set status flags, a status message is sent if this changes the status

        Setting [Status::WATCHDOG] while it is not set starts the watchdog like [Self::enable_watchdog].
    */
    pub fn set_status(&self, flags: u32) {
        let mut state = self.state();
        let state = &mut *state;
        if flags & Status::WATCHDOG != 0 && ! state.connection.is_watchdog_enabled() {
            state.watchdog = Watchdog::new(self.config.ticks(self.config.watchdog_timeout), state.tick);
        }
        state.connection.set(flags, &mut state.channel);
    }
    /// clear status flags, a status message is sent if this changes the status
    pub fn clear_status(&self, flags: u32) {
        let mut state = self.state();
        let state = &mut *state;
        state.connection.clear(flags, &mut state.channel);
    }
    /// start or stop supervising the host/core exchanges, the timeout counts from now
    pub fn enable_watchdog(&self, enable: bool) {
        let mut state = self.state();
        let state = &mut *state;
        if enable {
            state.watchdog = Watchdog::new(self.config.ticks(self.config.watchdog_timeout), state.tick);
            state.connection.set(Status::WATCHDOG, &mut state.channel);
        }
        else {
            state.connection.clear(Status::WATCHDOG, &mut state.channel);
        }
    }
    pub fn write_event_mask(&self, mask: EventMask) {
        debug!("event mask {:?}", mask);
        self.state().event_mask = mask;
    }
    pub fn event_mask(&self) -> EventMask  {self.state().event_mask}


    // alarms

    /// raise an alarm on a slot and report it to the adapter, fails if it is already active
    pub fn add_alarm(&self, slot_ix: u16, alarm: Alarm) -> CoreResult {
        self.state().alarms.add(slot_ix, alarm)?;
        info!("alarm {} raised on slot {}", alarm, slot_ix);
        self.adapter.alarm_ind(slot_ix, alarm, true);
        Ok(())
    }
    /// clear an alarm previously raised with [Self::add_alarm] and report it to the adapter
    pub fn remove_alarm(&self, slot_ix: u16, alarm: Alarm) -> CoreResult {
        self.state().alarms.remove(slot_ix, alarm)?;
        info!("alarm {} cleared on slot {}", alarm, slot_ix);
        self.adapter.alarm_ind(slot_ix, alarm, false);
        Ok(())
    }
    /// active alarms of a slot
    pub fn alarms(&self, slot_ix: u16) -> CoreResult<Vec<Alarm>> {
        self.state().alarms.get(slot_ix).map(<[Alarm]>::to_vec)
    }


    // messages

    /// pop the oldest indication
    pub fn receive(&self) -> Option<Message>  {self.state().channel.receive()}
    /// number of indications waiting in the channel
    pub fn pending_messages(&self) -> usize  {self.state().channel.len()}

    /**
        host worker entry point, to be called in a loop at least every [Config::poll_interval]

        Services the transport if an interrupt was signaled or a poll is due, then dispatches the messages pending at call time to `app`. Returns false if the core is no longer operable because the transport failed, the host must then restart the transport.
    */
    pub fn worker<A: Indications + ?Sized>(&self, app: &mut A) -> bool {
        let mut serviced = false;
        if self.interrupt.swap(false, Ordering::AcqRel) {
            self.service();
            serviced = true;
        }
        // messages sent by callbacks are left for next call
        for _ in 0 .. self.pending_messages() {
            let Some(message) = self.receive()  else {break};
            match message {
                Message::Avail => app.avail(self),
                Message::Sync => app.sync(self),
                Message::ParamWrite {..} => app.param_write_ind(self),
                Message::Poll => {
                    if ! serviced {
                        self.service();
                        serviced = true;
                    }
                    app.poll_ind(self)
                },
                Message::Status(status) => app.status_ind(self, status),
                Message::Error(code) => app.error_ind(self, code),
            }
        }
        self.is_operable()
    }
    fn service(&self) {
        if let Err(code) = self.adapter.service() {
            {
                let mut state = self.state();
                let state = &mut *state;
                state.transport_failed = true;
                state.connection.clear(Status::CONNECTION_DEPENDENT, &mut state.channel);
            }
            self.set_error(code);
        }
    }


    // parameters

    /// store a new parameter value and signal it to the host, see [ParameterStore::write]
    pub fn write_param(&self, slot_ix: u16, param_ix: u16, bit_length: usize, data: &[u8]) -> CoreResult {
        let mut state = self.state();
        let state = &mut *state;
        state.params.write(&state.device, slot_ix, param_ix, bit_length, data, &mut state.channel)
    }
    /// copy a parameter value into `out`, see [ParameterStore::read]
    pub fn read_param(&self, slot_ix: u16, param_ix: u16, bit_length: usize, out: &mut [u8]) -> CoreResult<usize> {
        let state = self.state();
        state.params.read(&state.device, slot_ix, param_ix, bit_length, out)
    }
    /// pop the next pending parameter write, see [ParameterStore::take_write_request]
    pub fn take_write_request(&self) -> Option<ParamWrite>  {self.state().params.take_write_request()}
    /// translate a fieldbus parameter number into a parameter index in its slot
    pub fn param_ix(&self, slot_ix: u16, index: u32) -> CoreResult<u16> {
        ParameterStore::param_ix(&self.state().device, slot_ix, index)
    }
    /// copy of the whole parameter frame, empty if the device has no parameter
    pub fn param_frame(&self) -> Vec<u8> {
        self.state().params.frame()
            .map(|frame| frame.data().to_vec())
            .unwrap_or_default()
    }


    // process data

    /// set all elements of an input signal in the process image
    pub fn set_signal(&self, slot_ix: u16, signal_ix: u16, values: &[u64]) -> CoreResult {
        self.state().image.set(Direction::Tx, slot_ix, signal_ix, values)
    }
    /// elements of a signal in the process image
    pub fn signal(&self, direction: Direction, slot_ix: u16, signal_ix: u16) -> CoreResult<Vec<u64>> {
        self.state().image.get(direction, slot_ix, signal_ix).map(<[u64]>::to_vec)
    }
    /// set one element of an input signal in the process image
    pub fn set_value(&self, slot_ix: u16, signal_ix: u16, element: usize, value: Value) -> CoreResult {
        self.state().image.set_value(Direction::Tx, slot_ix, signal_ix, element, value)
    }
    /// one element of a signal in the process image
    pub fn value(&self, direction: Direction, slot_ix: u16, signal_ix: u16, element: usize) -> CoreResult<Value> {
        let state = self.state();
        state.image.value(&state.device, direction, slot_ix, signal_ix, element)
    }
    /// set the status byte sent with an input slot
    pub fn set_slot_status(&self, slot_ix: u16, status: u8) -> CoreResult {
        self.state().image.set_status(Direction::Tx, slot_ix, status)
    }
    pub fn slot_status(&self, direction: Direction, slot_ix: u16) -> CoreResult<u8> {
        self.state().image.status(direction, slot_ix)
    }

    /// pack the input process image into `frame`, which must have the tx frame size
    pub fn pack_inputs(&self, frame: &mut [u8]) -> CoreResult {
        let state = self.state();
        state.image.pack(&state.device, &state.layout.tx, frame)
    }
    /// unpack `frame`, which must have the rx frame size, into the output process image
    pub fn unpack_outputs(&self, frame: &[u8]) -> CoreResult {
        let mut state = self.state();
        let state = &mut *state;
        state.image.unpack(&state.device, &state.layout.rx, frame)
    }
    /// read one signal directly from a frame of the given direction
    pub fn decode(&self, direction: Direction, frame: &[u8], slot_ix: u16, signal_ix: u16) -> CoreResult<Vec<u64>> {
        let state = self.state();
        SignalCodec::new(&state.device, state.layout.get(direction)).unpack(frame, slot_ix, signal_ix)
    }

    /// pack the input process image and hand it to the adapter
    pub fn write_inputs(&self) -> CoreResult {
        let frame = {
            let state = self.state();
            let mut frame = vec![0; state.layout.tx.total_size()];
            state.image.pack(&state.device, &state.layout.tx, &mut frame)?;
            frame
        };
        self.adapter.tx_frame(&frame);
        Ok(())
    }
    /// fetch the output frame from the adapter and unpack it into the output process image
    pub fn read_outputs(&self) -> CoreResult {
        let mut frame = vec![0; self.state().layout.rx.total_size()];
        self.adapter.rx_frame(&mut frame);
        // a reconfiguration may have happened meanwhile, the size check catches it
        self.unpack_outputs(&frame)
    }
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Core")
            .field("device", &state.device.name)
            .field("status", &state.connection.status())
            .field("tick", &state.tick)
            .field("channel", &state.channel)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapter::MockAdapter,
        alarm::AlarmLevel,
        error::CoreError,
        model::{BusType, DataType, Parameter, Signal, Slot},
        };

    fn device() -> Device {
        Device::new("dev", BusType::Mock)
            .slot(Slot::new("s0")
                .input(Signal::new("a", DataType::Uint8))
                .output(Signal::new("b", DataType::Uint16))
                .param(Parameter::new("p", 1, 2, vec![5, 6])))
    }
    fn core(config: Config) -> (Core, Arc<MockAdapter>) {
        let adapter = Arc::new(MockAdapter::new());
        let core = Core::new(device(), adapter.clone(), config).unwrap();
        // forget initialization messages
        while core.receive().is_some() {}
        (core, adapter)
    }

    #[test]
    fn initial_state() {
        let adapter = Arc::new(MockAdapter::new());
        let core = Core::new(device(), adapter, Config::default()).unwrap();
        assert!(core.is_configured());
        assert!(!core.is_connected());
        assert!(!core.is_watchdog_enabled());
        assert_eq!(core.receive(), Some(Message::Status(Status::from(Status::CONFIGURED))));
        assert_eq!(core.param_frame(), [5, 6]);
    }

    #[test]
    fn invalid_device() {
        let device = Device::new("dev", BusType::Mock)
            .slot(Slot::new("s0").param(Parameter::new("p", 1, 2, vec![5])));
        let result = Core::new(device, Arc::new(MockAdapter::new()), Config::default());
        assert!(matches!(result, Err(CoreError::Model(_))));
    }

    #[test]
    fn watchdog_expiry_and_recovery() {
        let (core, adapter) = core(Config {watchdog: true, .. Default::default()});
        core.rpc_activity();
        assert!(core.is_connected());
        while core.receive().is_some() {}

        let timeout = core.config().ticks(core.config().watchdog_timeout);
        for _ in 0 .. timeout - 1 {
            core.tick();
        }
        assert!(core.is_connected());
        core.tick();
        assert!(!core.is_connected());
        assert_eq!(core.last_error(), Some(ErrorCode::CoreCommunication));
        assert_eq!(adapter.errors(), [ErrorCode::CoreCommunication]);
        let messages = std::iter::from_fn(|| core.receive()).collect::<Vec<_>>();
        assert!(messages.contains(&Message::Error(ErrorCode::CoreCommunication)));

        // expiry is reported once
        core.tick();
        assert_eq!(adapter.errors().len(), 1);

        core.sync();
        assert!(core.is_connected());
        assert_eq!(core.last_error(), None);
    }

    #[test]
    fn no_expiry_without_watchdog() {
        let (core, adapter) = core(Config::default());
        core.rpc_activity();
        for _ in 0 .. 1000 {
            core.tick();
        }
        assert!(core.is_connected());
        assert!(adapter.errors().is_empty());
    }

    #[test]
    fn disconnection() {
        let (core, adapter) = core(Config::default());
        core.rpc_activity();
        core.set_status(Status::RUNNING);
        while core.receive().is_some() {}
        core.disconnected();
        assert!(!core.is_connected());
        assert!(!core.is_running());
        assert!(core.is_configured());
        assert_eq!(core.receive(), Some(Message::Status(Status::from(Status::CONFIGURED))));
        assert_eq!(core.receive(), Some(Message::Error(ErrorCode::Transport)));
        assert_eq!(adapter.errors(), [ErrorCode::Transport]);
        assert_eq!(core.last_error(), Some(ErrorCode::Transport));

        // only the loss of link is reported
        core.disconnected();
        assert_eq!(core.receive(), None);
        assert_eq!(adapter.errors(), [ErrorCode::Transport]);
    }

    #[test]
    fn watchdog_started_by_status_flag() {
        let (core, adapter) = core(Config::default());
        core.rpc_activity();
        let timeout = core.config().ticks(core.config().watchdog_timeout);
        for _ in 0 .. 2 * timeout {
            core.tick();
        }
        core.set_status(Status::WATCHDOG);
        assert!(core.is_watchdog_enabled());
        core.tick();
        assert!(core.is_connected());
        assert!(adapter.errors().is_empty());

        // the timeout counts from the moment the flag was set
        for _ in 1 .. timeout {
            core.tick();
        }
        assert!(!core.is_connected());
        assert_eq!(adapter.errors(), [ErrorCode::CoreCommunication]);
    }

    #[test]
    fn oversized_parameter_length() {
        let (core, _) = core(Config::default());
        assert!(matches!(core.write_param(0, 0, usize::MAX, &[0, 0]), Err(CoreError::Size(_))));
        assert!(matches!(core.read_param(0, 0, usize::MAX, &mut [0; 2]), Err(CoreError::Size(_))));
        assert_eq!(core.param_frame(), [5, 6]);
        assert_eq!(core.receive(), None);
    }

    #[test]
    fn alarms() {
        let (core, adapter) = core(Config::default());
        let alarm = Alarm::new(AlarmLevel::Warning, 0x8001);
        core.add_alarm(0, alarm).unwrap();
        assert_eq!(core.alarms(0), Ok(vec![alarm]));
        assert!(matches!(core.add_alarm(0, alarm), Err(CoreError::Conflict(_))));
        assert_eq!(core.add_alarm(1, alarm), Err(CoreError::Index("slot index out of range")));
        assert_eq!(adapter.alarms(), [(0, alarm, true)]);

        core.remove_alarm(0, alarm).unwrap();
        assert!(core.remove_alarm(0, alarm).unwrap_err().code() < 0);
        assert_eq!(core.alarms(0), Ok(vec![]));
        assert_eq!(adapter.alarms(), [(0, alarm, true), (0, alarm, false)]);

        // a new configuration starts without alarms
        core.add_alarm(0, alarm).unwrap();
        core.reconfigure(device()).unwrap();
        assert_eq!(core.alarms(0), Ok(vec![]));
    }

    #[test]
    fn event_mask() {
        let (core, _) = core(Config::default());
        core.rpc_activity();
        while core.receive().is_some() {}
        core.avail();
        core.sync();
        assert_eq!(core.receive(), None);

        core.write_event_mask(EventMask::synchronous());
        core.avail();
        core.sync();
        assert_eq!(core.receive(), Some(Message::Avail));
        assert_eq!(core.receive(), Some(Message::Sync));
    }

    #[test]
    fn poll_is_not_repeated() {
        let (core, _) = core(Config::default());
        for _ in 0 .. 50 {
            core.tick();
        }
        assert_eq!(core.receive(), Some(Message::Poll));
        assert_eq!(core.receive(), None);
        assert_eq!(core.dropped_messages(), 0);
    }

    #[test]
    fn frames_through_adapter() {
        let (core, adapter) = core(Config::default());
        core.set_value(0, 0, 0, Value::U8(0x42)).unwrap();
        core.set_slot_status(0, 0x80).unwrap();
        core.write_inputs().unwrap();
        assert_eq!(adapter.tx(), [0x42, 0x80]);

        adapter.set_rx(&0x1234u16.to_le_bytes().into_iter().chain([1]).collect::<Vec<_>>());
        core.read_outputs().unwrap();
        assert_eq!(core.slot_status(Direction::Rx, 0), Ok(1));
        let expected = match crate::data::BYTE_ORDER {
            crate::data::ByteOrder::Little => 0x1234,
            crate::data::ByteOrder::Big => 0x3412,
        };
        assert_eq!(core.signal(Direction::Rx, 0, 0), Ok(vec![expected]));
    }

    #[test]
    fn reconfiguration() {
        let (core, _) = core(Config::default());
        core.write_param(0, 0, 16, &[1, 1]).unwrap();
        let device = Device::new("other", BusType::Ethercat)
            .slot(Slot::new("s0").input(Signal::array("x", DataType::Bool, 12)))
            .slot(Slot::new("s1").param(Parameter::new("q", 3, 1, vec![7])));
        core.reconfigure(device).unwrap();
        assert_eq!(core.frame_info(Direction::Tx).total_size(), 2 + 1 + 1);
        assert_eq!(core.param_frame(), [7]);
        assert_eq!(core.take_write_request(), None);
        assert_eq!(core.param_ix(1, 3), Ok(0));

        let broken = Device::new("broken", BusType::Mock)
            .slot(Slot::new("s0").input(Signal::array("x", DataType::Bool, 0)));
        assert!(core.reconfigure(broken).is_err());
        assert_eq!(core.device().name, "other");
        assert_eq!(core.last_error(), Some(ErrorCode::Configuration));
    }

    #[test]
    fn counters() {
        let (core, _) = core(Config::default());
        core.add_crc_error();
        core.add_crc_error();
        assert_eq!(core.crc_errors(), 2);
        core.set_transport(Transport::Spi);
        assert_eq!(core.transport(), Transport::Spi);
        for i in 0 .. 12 {
            core.set_status(if i % 2 == 0 {Status::RUNNING} else {0});
            core.clear_status(Status::RUNNING);
        }
        assert_eq!(core.pending_messages(), 10);
        assert_eq!(core.dropped_messages(), 2);
    }
}
