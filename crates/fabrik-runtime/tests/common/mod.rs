#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use smol_str::SmolStr;

use fabrik_runtime::engine::EngineHandle;
use fabrik_runtime::fb::{
    ComResponse, CommLayer, DataPortSpec, EventEntry, FbInterfaceSpec, FunctionBlock, PortId,
};
use fabrik_runtime::ua::UaVariant;
use fabrik_runtime::value::IecType;
use fabrik_runtime::RuntimeConfig;

/// Delivery order shared by every block in a test network.
pub type DispatchLog = Arc<Mutex<Vec<(SmolStr, PortId)>>>;

pub fn dispatch_log() -> DispatchLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn logged(log: &DispatchLog) -> Vec<(SmolStr, PortId)> {
    log.lock().unwrap().clone()
}

/// Expected log entry.
pub fn entry(name: &str, port: PortId) -> (SmolStr, PortId) {
    (SmolStr::new(name), port)
}

pub fn config_with_cycle(cycle_time_ms: u16) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.cycle_time_ms = cycle_time_ms;
    config
}

/// Poll a condition until it holds or the timeout elapses.
pub fn wait_for(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Function block that records every received event and optionally chains
/// a follow-up entry.
pub struct RecordingFb {
    name: SmolStr,
    interface: FbInterfaceSpec,
    log: DispatchLog,
    next: Mutex<Option<EventEntry>>,
}

impl RecordingFb {
    pub fn new(name: &str, log: DispatchLog) -> Arc<Self> {
        Arc::new(Self {
            name: SmolStr::new(name),
            interface: FbInterfaceSpec {
                event_inputs: vec![SmolStr::new("REQ")],
                event_outputs: vec![SmolStr::new("CNF")],
                data_inputs: Vec::new(),
                data_outputs: vec![
                    DataPortSpec {
                        name: SmolStr::new("Out"),
                        ty: IecType::DInt,
                    },
                    DataPortSpec {
                        name: SmolStr::new("State"),
                        ty: IecType::Bool,
                    },
                ],
            },
            log,
            next: Mutex::new(None),
        })
    }

    /// Chain the given entry after every received event.
    pub fn chain_to(&self, entry: EventEntry) {
        *self.next.lock().unwrap() = Some(entry);
    }
}

impl FunctionBlock for RecordingFb {
    fn receive_input_event(&self, port_id: PortId, engine: &EngineHandle) {
        self.log.lock().unwrap().push((self.name.clone(), port_id));
        if let Some(next) = self.next.lock().unwrap().clone() {
            engine.add_event_entry(next);
        }
    }

    fn instance_name(&self) -> &SmolStr {
        &self.name
    }

    fn interface_spec(&self) -> &FbInterfaceSpec {
        &self.interface
    }
}

/// Communication layer answering every write with a scripted response.
pub struct ScriptedCommLayer {
    response: ComResponse,
    received: Mutex<Vec<UaVariant>>,
    fb: Arc<RecordingFb>,
}

impl ScriptedCommLayer {
    pub fn new(response: ComResponse, fb: Arc<RecordingFb>) -> Arc<Self> {
        Arc::new(Self {
            response,
            received: Mutex::new(Vec::new()),
            fb,
        })
    }

    pub fn received(&self) -> Vec<UaVariant> {
        self.received.lock().unwrap().clone()
    }
}

impl CommLayer for ScriptedCommLayer {
    fn recv_data(&self, data: &UaVariant) -> ComResponse {
        self.received.lock().unwrap().push(data.clone());
        self.response
    }

    fn comm_fb(&self) -> EventEntry {
        EventEntry::new(&self.fb, 0)
    }
}
