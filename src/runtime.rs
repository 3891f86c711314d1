/*!
    Ready-made async driver for a [Core], using tokio.

    It runs two loops concurrently on the current task:
    - the ticker, calling [Core::tick] every [Config::tick](crate::Config::tick)
    - the host worker, waiting for an interrupt ([Core::event_ind]) or at most [Config::poll_interval](crate::Config::poll_interval), then calling [Core::worker]

    The transport side keeps calling [Core::avail], [Core::sync] and [Core::event_ind] from its own tasks or threads.
*/

use std::sync::Arc;
use futures_concurrency::future::Race;
use log::{info, warn};
use tokio::time::{self, MissedTickBehavior};
use crate::{
    adapter::Indications,
    core::Core,
    error::{CoreError, CoreResult, ErrorCode},
    };


/**
    drive the core until its transport fails

    This never returns in normal operation. When the worker reports the core is no longer operable, the last error is returned as [CoreError::Communication] and the host should restart its transport before running again.
*/
pub async fn run<A: Indications + ?Sized>(core: Arc<Core>, app: &mut A) -> CoreResult {
    info!("core running, tick {:?}, poll {:?}", core.config().tick, core.config().poll_interval);
    (ticker(&core), worker(&core, app)).race().await
}

async fn ticker(core: &Core) -> CoreResult {
    let mut interval = time::interval(core.config().tick);
    // late ticks are not caught up, the watchdog only needs a monotonic count
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        core.tick();
    }
}

async fn worker<A: Indications + ?Sized>(core: &Core, app: &mut A) -> CoreResult {
    let poll = core.config().poll_interval;
    loop {
        // a timeout only means there was no interrupt during the poll period
        let _ = time::timeout(poll, core.event()).await;
        if ! core.worker(app) {
            let code = core.last_error().unwrap_or(ErrorCode::Transport);
            warn!("core stopped: {}", code);
            return Err(CoreError::Communication(code))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::{
        adapter::MockAdapter,
        config::Config,
        model::{BusType, DataType, Device, Signal, Slot},
        status::Status,
        };

    #[derive(Default)]
    struct Counter {
        polls: usize,
        statuses: Vec<Status>,
    }
    impl Indications for Counter {
        fn poll_ind(&mut self, _core: &Core)  {self.polls += 1}
        fn status_ind(&mut self, _core: &Core, status: Status)  {self.statuses.push(status)}
    }

    fn core(adapter: Arc<MockAdapter>) -> Arc<Core> {
        let device = Device::new("dev", BusType::Mock)
            .slot(Slot::new("s0").input(Signal::new("x", DataType::Uint8)));
        let config = Config {
            tick: Duration::from_millis(1),
            poll_interval: Duration::from_millis(2),
            .. Default::default()
        };
        Arc::new(Core::new(device, adapter, config).unwrap())
    }

    #[tokio::test]
    async fn polls_while_running() {
        let core = core(Arc::new(MockAdapter::new()));
        let mut app = Counter::default();
        let result = time::timeout(Duration::from_millis(100), run(core.clone(), &mut app)).await;
        // still running when the timeout cancels it
        assert!(result.is_err());
        assert!(app.polls > 0);
        assert!(core.ticks() > 0);
        assert_eq!(app.statuses.first().map(|status| status.configured()), Some(true));
    }

    #[tokio::test]
    async fn stops_on_transport_failure() {
        let adapter = Arc::new(MockAdapter::new());
        let core = core(adapter.clone());
        adapter.fail_service(Some(ErrorCode::Transport));
        core.event_ind();
        let mut app = Counter::default();
        let result = time::timeout(Duration::from_secs(5), run(core.clone(), &mut app)).await;
        assert_eq!(result, Ok(Err(CoreError::Communication(ErrorCode::Transport))));
        assert_eq!(adapter.errors(), [ErrorCode::Transport]);
        assert!(!core.is_operable());
    }
}
