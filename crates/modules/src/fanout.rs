//! FanOutModule - redistributes one input queue across many output queues
//!
//! Configuration keys:
//!
//! | key | meaning | default |
//! |---|---|---|
//! | `fanout_mode` | `Broadcast`, `FirstAvailable` or `RoundRobin` (substring, any case) | RoundRobin |
//! | `wait_interval` | microseconds to sleep when no progress can be made | 1000000 |
//! | `queue_timeout_ms` | timeout of each individual push/pop | 100 |
//! | `input` | source queue alias | required |
//! | `outputs` | ordered sink queue aliases | required |

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use contracts::{Command, CommandResult, Module, ModuleConfig, ModuleError, SUCCESS};
use metrics::counter;
use parking_lot::Mutex;
use queues::{QueueRegistry, QueueSink, QueueSource};
use tracing::{debug, info, instrument, trace, warn};

use crate::registry::ModuleInit;
use crate::worker::{RunFlag, WorkerThread};

/// Default sleep between retries, in microseconds
pub const DEFAULT_WAIT_INTERVAL_US: u64 = 1_000_000;

/// Default timeout for a single push or pop, in milliseconds
pub const DEFAULT_QUEUE_TIMEOUT_MS: u64 = 100;

/// Element types a fan-out can carry
pub trait FanOutValue: Clone + Send + 'static {}

impl<T: Clone + Send + 'static> FanOutValue for T {}

/// Routing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanOutMode {
    /// Every value to every output
    Broadcast,
    /// Each value to the first output with room
    FirstAvailable,
    /// Values rotate over the outputs
    #[default]
    RoundRobin,
}

impl FanOutMode {
    /// Parse a mode string by case-insensitive substring; anything
    /// unrecognised selects RoundRobin.
    pub fn from_config_str(mode: &str) -> Self {
        let mode = mode.to_ascii_lowercase();
        if mode.contains("broadcast") {
            Self::Broadcast
        } else if mode.contains("first") {
            Self::FirstAvailable
        } else {
            Self::RoundRobin
        }
    }
}

impl fmt::Display for FanOutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Broadcast => "Broadcast",
            Self::FirstAvailable => "FirstAvailable",
            Self::RoundRobin => "RoundRobin",
        };
        f.write_str(s)
    }
}

/// Typed settings parsed at `configure`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutSettings {
    pub mode: FanOutMode,
    pub wait_interval: Duration,
    pub queue_timeout: Duration,
    pub input: String,
    pub outputs: Vec<String>,
}

impl FanOutSettings {
    /// Read settings from the opaque configuration
    pub fn from_config(config: &ModuleConfig) -> Result<Self, String> {
        let mode = config
            .optional::<String>("fanout_mode")
            .map_err(|e| e.to_string())?
            .map(|m| FanOutMode::from_config_str(&m))
            .unwrap_or_default();
        let wait_interval_us = config
            .value_or("wait_interval", DEFAULT_WAIT_INTERVAL_US)
            .map_err(|e| e.to_string())?;
        let queue_timeout_ms = config
            .value_or("queue_timeout_ms", DEFAULT_QUEUE_TIMEOUT_MS)
            .map_err(|e| e.to_string())?;
        let input: String = config.require("input").map_err(|e| e.to_string())?;
        let outputs: Vec<String> = config.require("outputs").map_err(|e| e.to_string())?;

        if outputs.is_empty() {
            return Err("'outputs' must list at least one queue".to_string());
        }

        Ok(Self {
            mode,
            wait_interval: Duration::from_micros(wait_interval_us),
            queue_timeout: Duration::from_millis(queue_timeout_ms),
            input,
            outputs,
        })
    }
}

/// Resolved queue handles plus settings, shared with the worker thread
struct FanOutPlan<T> {
    settings: FanOutSettings,
    input: QueueSource<T>,
    outputs: Vec<QueueSink<T>>,
}

impl<T: Send + 'static> FanOutPlan<T> {
    fn resolve(settings: FanOutSettings, queues: &QueueRegistry) -> Result<Self, String> {
        let input = queues
            .source::<T>(&settings.input)
            .map_err(|e| format!("input: {e}"))?;
        let outputs = settings
            .outputs
            .iter()
            .map(|alias| queues.sink::<T>(alias))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("outputs: {e}"))?;
        Ok(Self {
            settings,
            input,
            outputs,
        })
    }
}

type SharedPlan<T> = Arc<Mutex<Option<Arc<FanOutPlan<T>>>>>;

/// Module reading one queue and redistributing to many
pub struct FanOutModule<T> {
    name: String,
    config: ModuleConfig,
    queues: Arc<QueueRegistry>,
    plan: SharedPlan<T>,
    /// Serializes configure/start/stop
    commands: Mutex<()>,
    worker: WorkerThread,
}

impl<T: FanOutValue> FanOutModule<T> {
    pub fn new(init: ModuleInit) -> Self {
        let plan: SharedPlan<T> = Arc::new(Mutex::new(None));
        let worker_plan = Arc::clone(&plan);
        let worker_name = init.name.clone();

        let worker = WorkerThread::new(format!("{}-fanout", init.name), move |flag| {
            let current = worker_plan.lock().clone();
            match current {
                Some(plan) => FanOutLoop::new(&worker_name, &plan).run(flag),
                None => warn!(module = %worker_name, "worker started without configuration"),
            }
        });

        Self {
            name: init.name,
            config: init.config,
            queues: init.queues,
            plan,
            commands: Mutex::new(()),
            worker,
        }
    }

    /// Settings applied by the last successful `configure`
    pub fn settings(&self) -> Option<FanOutSettings> {
        self.plan.lock().as_ref().map(|p| p.settings.clone())
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }
}

impl<T: FanOutValue> Module for FanOutModule<T> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "fanout_configure", skip(self, _args), fields(module = %self.name))]
    fn configure(&self, _args: &[String]) -> CommandResult {
        let _serial = self.commands.lock();
        if self.worker.is_running() {
            return Err(ModuleError::command_failed(
                Command::Configure.as_str(),
                "cannot reconfigure while running",
            ));
        }

        let settings = FanOutSettings::from_config(&self.config)
            .map_err(|reason| ModuleError::command_failed(Command::Configure.as_str(), reason))?;
        debug!(
            module = %self.name,
            input = %settings.input,
            outputs = ?settings.outputs,
            "resolving queues"
        );
        let plan = FanOutPlan::<T>::resolve(settings, &self.queues)
            .map_err(|reason| ModuleError::command_failed(Command::Configure.as_str(), reason))?;

        info!(
            module = %self.name,
            mode = %plan.settings.mode,
            outputs = plan.outputs.len(),
            wait_interval_us = plan.settings.wait_interval.as_micros() as u64,
            "fan-out configured"
        );
        *self.plan.lock() = Some(Arc::new(plan));
        Ok(SUCCESS.to_string())
    }

    #[instrument(name = "fanout_start", skip(self, _args), fields(module = %self.name))]
    fn start(&self, _args: &[String]) -> CommandResult {
        let _serial = self.commands.lock();
        if self.plan.lock().is_none() {
            return Err(ModuleError::command_failed(
                Command::Start.as_str(),
                "module has not been configured",
            ));
        }
        self.worker
            .start()
            .map_err(|e| ModuleError::command_failed(Command::Start.as_str(), e.to_string()))?;
        Ok(SUCCESS.to_string())
    }

    #[instrument(name = "fanout_stop", skip(self, _args), fields(module = %self.name))]
    fn stop(&self, _args: &[String]) -> CommandResult {
        let _serial = self.commands.lock();
        self.worker.stop();
        Ok(SUCCESS.to_string())
    }
}

/// One run of the work loop, from `start` to `stop`
struct FanOutLoop<'a, T> {
    name: &'a str,
    plan: &'a FanOutPlan<T>,
    cursor: usize,
    routed: u64,
}

impl<'a, T: FanOutValue> FanOutLoop<'a, T> {
    fn new(name: &'a str, plan: &'a FanOutPlan<T>) -> Self {
        Self {
            name,
            plan,
            cursor: 0,
            routed: 0,
        }
    }

    fn run(mut self, flag: &RunFlag) {
        let plan = self.plan;
        let settings = &plan.settings;
        debug!(module = %self.name, mode = %settings.mode, "fan-out loop started");

        while flag.is_running() {
            if !plan.input.can_pop() {
                trace!(module = %self.name, "waiting for data");
                flag.sleep(settings.wait_interval);
                continue;
            }

            let Some(value) = plan.input.pop(settings.queue_timeout) else {
                warn!(
                    module = %self.name,
                    input = %plan.input.name(),
                    "tried but failed to pop a value from the input queue"
                );
                continue;
            };

            match settings.mode {
                FanOutMode::Broadcast => self.broadcast(value),
                FanOutMode::FirstAvailable => self.first_available(value, flag),
                FanOutMode::RoundRobin => self.round_robin(value, flag),
            }
        }

        info!(module = %self.name, routed = self.routed, "fan-out loop stopped");
    }

    fn broadcast(&mut self, value: T) {
        let plan = self.plan;
        let timeout = plan.settings.queue_timeout;
        let (last, rest) = match plan.outputs.split_last() {
            Some(split) => split,
            None => return,
        };

        for output in rest {
            self.push_or_drop(output, value.clone(), timeout);
        }
        self.push_or_drop(last, value, timeout);
    }

    fn first_available(&mut self, mut value: T, flag: &RunFlag) {
        let plan = self.plan;
        let timeout = plan.settings.queue_timeout;
        loop {
            for output in &plan.outputs {
                if !output.can_push() {
                    continue;
                }
                match output.push(value, timeout) {
                    Ok(()) => {
                        self.record_routed(output);
                        return;
                    }
                    Err(rejected) => {
                        warn!(
                            module = %self.name,
                            output = %output.name(),
                            "push timed out on an output that reported space, trying next output"
                        );
                        value = rejected.into_inner();
                    }
                }
            }

            if !flag.is_running() {
                self.record_dropped("stop requested while no output had space");
                return;
            }
            flag.sleep(plan.settings.wait_interval);
        }
    }

    fn round_robin(&mut self, value: T, flag: &RunFlag) {
        let plan = self.plan;
        let timeout = plan.settings.queue_timeout;
        loop {
            let output = &plan.outputs[self.cursor];
            if output.can_push() {
                self.push_or_drop(output, value, timeout);
                self.cursor = (self.cursor + 1) % plan.outputs.len();
                return;
            }

            if !flag.is_running() {
                self.record_dropped("stop requested while the next output was full");
                return;
            }
            trace!(module = %self.name, output = %output.name(), "next output full, waiting");
            flag.sleep(plan.settings.wait_interval);
        }
    }

    fn push_or_drop(&mut self, output: &QueueSink<T>, value: T, timeout: Duration) {
        match output.push(value, timeout) {
            Ok(()) => self.record_routed(output),
            Err(_) => {
                warn!(
                    module = %self.name,
                    output = %output.name(),
                    "a timeout occurred trying to push data onto an output queue; data has been lost"
                );
                counter!("daq_values_dropped_total", "module" => self.name.to_string()).increment(1);
            }
        }
    }

    fn record_routed(&mut self, output: &QueueSink<T>) {
        self.routed += 1;
        counter!(
            "daq_values_routed_total",
            "module" => self.name.to_string(),
            "output" => output.name().to_string()
        )
        .increment(1);
    }

    fn record_dropped(&self, reason: &str) {
        warn!(module = %self.name, reason, "value dropped");
        counter!("daq_values_dropped_total", "module" => self.name.to_string()).increment(1);
    }
}
