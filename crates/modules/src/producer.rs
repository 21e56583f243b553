//! FakeDataProducer - emits vectors of a cycling integer sequence
//!
//! Used to exercise a module graph without real hardware. Each vector holds
//! `nIntsPerVector` consecutive integers; the sequence wraps from
//! `ending_int` back to `starting_int` and continues across vectors.

use std::sync::Arc;
use std::time::Duration;

use contracts::{Command, CommandResult, Module, ModuleConfig, ModuleError, SUCCESS};
use metrics::counter;
use parking_lot::Mutex;
use queues::{QueueRegistry, QueueSink};
use tracing::{debug, info, instrument, warn};

use crate::registry::ModuleInit;
use crate::worker::{RunFlag, WorkerThread};

/// Settings shared by the fake producer and consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceSettings {
    pub ints_per_vector: usize,
    pub starting_int: i64,
    pub ending_int: i64,
}

impl SequenceSettings {
    pub(crate) fn from_config(config: &ModuleConfig) -> Result<Self, String> {
        let ints_per_vector: usize = config
            .value_or("nIntsPerVector", 10)
            .map_err(|e| e.to_string())?;
        let starting_int: i64 = config
            .value_or("starting_int", -4)
            .map_err(|e| e.to_string())?;
        let ending_int: i64 = config
            .value_or("ending_int", 14)
            .map_err(|e| e.to_string())?;

        if starting_int > ending_int {
            return Err(format!(
                "starting_int ({starting_int}) must not exceed ending_int ({ending_int})"
            ));
        }
        Ok(Self {
            ints_per_vector,
            starting_int,
            ending_int,
        })
    }

    /// Value following `current` in the cycle
    pub(crate) fn next(&self, current: i64) -> i64 {
        if current >= self.ending_int {
            self.starting_int
        } else {
            current + 1
        }
    }
}

struct ProducerPlan {
    sequence: SequenceSettings,
    wait_between_sends: Duration,
    queue_timeout: Duration,
    output: QueueSink<Vec<i64>>,
}

/// Module generating fake data vectors on its worker thread
pub struct FakeDataProducer {
    name: String,
    config: ModuleConfig,
    queues: Arc<QueueRegistry>,
    plan: Arc<Mutex<Option<Arc<ProducerPlan>>>>,
    commands: Mutex<()>,
    worker: WorkerThread,
}

impl FakeDataProducer {
    pub fn new(init: ModuleInit) -> Self {
        let plan: Arc<Mutex<Option<Arc<ProducerPlan>>>> = Arc::new(Mutex::new(None));
        let worker_plan = Arc::clone(&plan);
        let worker_name = init.name.clone();

        let worker = WorkerThread::new(format!("{}-producer", init.name), move |flag| {
            let current = worker_plan.lock().clone();
            if let Some(plan) = current {
                produce(&worker_name, &plan, flag);
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

    fn resolve(&self) -> Result<ProducerPlan, String> {
        let sequence = SequenceSettings::from_config(&self.config)?;
        let wait_ms: u64 = self
            .config
            .value_or("wait_between_sends_ms", 1000)
            .map_err(|e| e.to_string())?;
        let timeout_ms: u64 = self
            .config
            .value_or("queue_timeout_ms", 100)
            .map_err(|e| e.to_string())?;
        let output: String = self.config.require("output").map_err(|e| e.to_string())?;
        let output = self
            .queues
            .sink::<Vec<i64>>(&output)
            .map_err(|e| format!("output: {e}"))?;

        Ok(ProducerPlan {
            sequence,
            wait_between_sends: Duration::from_millis(wait_ms),
            queue_timeout: Duration::from_millis(timeout_ms),
            output,
        })
    }
}

fn produce(name: &str, plan: &ProducerPlan, flag: &RunFlag) {
    let sequence = plan.sequence;
    let mut current = sequence.starting_int;
    let mut sent: u64 = 0;

    while flag.is_running() {
        let mut vector = Vec::with_capacity(sequence.ints_per_vector);
        for _ in 0..sequence.ints_per_vector {
            vector.push(current);
            current = sequence.next(current);
        }

        debug!(module = %name, size = vector.len(), "pushing vector onto output queue");
        match plan.output.push(vector, plan.queue_timeout) {
            Ok(()) => sent += 1,
            Err(_) => {
                warn!(
                    module = %name,
                    output = %plan.output.name(),
                    "a timeout occurred trying to push data onto the output queue; data has been lost"
                );
                counter!("daq_values_dropped_total", "module" => name.to_string()).increment(1);
            }
        }

        flag.sleep(plan.wait_between_sends);
    }

    info!(module = %name, sent, "producer stopped");
}

impl Module for FakeDataProducer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "producer_configure", skip(self, _args), fields(module = %self.name))]
    fn configure(&self, _args: &[String]) -> CommandResult {
        let _serial = self.commands.lock();
        if self.worker.is_running() {
            return Err(ModuleError::command_failed(
                Command::Configure.as_str(),
                "cannot reconfigure while running",
            ));
        }
        let plan = self
            .resolve()
            .map_err(|reason| ModuleError::command_failed(Command::Configure.as_str(), reason))?;
        debug!(module = %self.name, sequence = ?plan.sequence, "producer configured");
        *self.plan.lock() = Some(Arc::new(plan));
        Ok(SUCCESS.to_string())
    }

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

    fn stop(&self, _args: &[String]) -> CommandResult {
        let _serial = self.commands.lock();
        self.worker.stop();
        Ok(SUCCESS.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;

    #[test]
    fn test_sequence_wraps() {
        let seq = SequenceSettings {
            ints_per_vector: 3,
            starting_int: -1,
            ending_int: 1,
        };
        assert_eq!(seq.next(-1), 0);
        assert_eq!(seq.next(0), 1);
        assert_eq!(seq.next(1), -1);
    }

    #[test]
    fn test_invalid_range_fails_configure() {
        let mut queues = QueueRegistry::new();
        queues.create::<Vec<i64>>("out", 2).unwrap();
        let producer = FakeDataProducer::new(ModuleInit::new(
            "p",
            ModuleConfig::new(json!({ "output": "out", "starting_int": 5, "ending_int": 1 })),
            Arc::new(queues),
        ));

        let err = producer.execute_command("configure", &[]).unwrap_err();
        assert!(matches!(err, ModuleError::CommandFailed { .. }));
    }

    #[test]
    fn test_produces_continuous_vectors() {
        let mut queues = QueueRegistry::new();
        let out = queues.create::<Vec<i64>>("out", 4).unwrap();
        let producer = FakeDataProducer::new(ModuleInit::new(
            "p",
            ModuleConfig::new(json!({
                "output": "out",
                "nIntsPerVector": 4,
                "starting_int": 0,
                "ending_int": 5,
                "wait_between_sends_ms": 1,
            })),
            Arc::new(queues),
        ));

        producer.execute_command("configure", &[]).unwrap();
        producer.execute_command("start", &[]).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while out.len() < 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        producer.execute_command("stop", &[]).unwrap();

        assert_eq!(out.pop(Duration::ZERO), Some(vec![0, 1, 2, 3]));
        assert_eq!(out.pop(Duration::ZERO), Some(vec![4, 5, 0, 1]));
    }
}
