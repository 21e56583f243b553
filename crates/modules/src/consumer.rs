//! FakeDataConsumer - checks vectors produced by `FakeDataProducer`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{Command, CommandResult, Module, ModuleConfig, ModuleError, SUCCESS};
use parking_lot::Mutex;
use queues::{QueueRegistry, QueueSource};
use tracing::{debug, info, instrument, warn};

use crate::producer::SequenceSettings;
use crate::registry::ModuleInit;
use crate::worker::{RunFlag, WorkerThread};

/// Running totals of a consumer
#[derive(Debug, Default)]
pub struct ConsumerStats {
    vectors: AtomicU64,
    failures: AtomicU64,
}

impl ConsumerStats {
    /// Vectors received
    pub fn vectors(&self) -> u64 {
        self.vectors.load(Ordering::Relaxed)
    }

    /// Vectors containing an unexpected value past the first position
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

struct ConsumerPlan {
    sequence: SequenceSettings,
    wait_interval: Duration,
    queue_timeout: Duration,
    input: QueueSource<Vec<i64>>,
}

/// Module validating a cycling integer sequence on its worker thread
pub struct FakeDataConsumer {
    name: String,
    config: ModuleConfig,
    queues: Arc<QueueRegistry>,
    plan: Arc<Mutex<Option<Arc<ConsumerPlan>>>>,
    stats: Arc<ConsumerStats>,
    commands: Mutex<()>,
    worker: WorkerThread,
}

impl FakeDataConsumer {
    pub fn new(init: ModuleInit) -> Self {
        let plan: Arc<Mutex<Option<Arc<ConsumerPlan>>>> = Arc::new(Mutex::new(None));
        let stats = Arc::new(ConsumerStats::default());
        let worker_plan = Arc::clone(&plan);
        let worker_stats = Arc::clone(&stats);
        let worker_name = init.name.clone();

        let worker = WorkerThread::new(format!("{}-consumer", init.name), move |flag| {
            let current = worker_plan.lock().clone();
            if let Some(plan) = current {
                consume(&worker_name, &plan, &worker_stats, flag);
            }
        });

        Self {
            name: init.name,
            config: init.config,
            queues: init.queues,
            plan,
            stats,
            commands: Mutex::new(()),
            worker,
        }
    }

    pub fn stats(&self) -> &ConsumerStats {
        &self.stats
    }

    fn resolve(&self) -> Result<ConsumerPlan, String> {
        let sequence = SequenceSettings::from_config(&self.config)?;
        let wait_ms: u64 = self
            .config
            .value_or("wait_interval_ms", 1000)
            .map_err(|e| e.to_string())?;
        let timeout_ms: u64 = self
            .config
            .value_or("queue_timeout_ms", 100)
            .map_err(|e| e.to_string())?;
        let input: String = self.config.require("input").map_err(|e| e.to_string())?;
        let input = self
            .queues
            .source::<Vec<i64>>(&input)
            .map_err(|e| format!("input: {e}"))?;

        Ok(ConsumerPlan {
            sequence,
            wait_interval: Duration::from_millis(wait_ms),
            queue_timeout: Duration::from_millis(timeout_ms),
            input,
        })
    }
}

/// Walks one vector, returning true if it broke the sequence after position 0
fn check_vector(
    name: &str,
    counter: u64,
    sequence: &SequenceSettings,
    current: &mut i64,
    vector: &[i64],
) -> bool {
    let mut failed = false;
    for (position, &point) in vector.iter().enumerate() {
        if point != *current {
            if position != 0 {
                warn!(
                    module = %name,
                    vector = counter,
                    position,
                    expected = *current,
                    received = point,
                    "error in received vector"
                );
                failed = true;
            } else {
                info!(module = %name, vector = counter, "jump detected");
            }
            *current = point;
        }
        *current = sequence.next(*current);
    }
    failed
}

fn consume(name: &str, plan: &ConsumerPlan, stats: &ConsumerStats, flag: &RunFlag) {
    let mut current = plan.sequence.starting_int;

    while flag.is_running() {
        if !plan.input.can_pop() {
            flag.sleep(plan.wait_interval);
            continue;
        }

        let Some(vector) = plan.input.pop(plan.queue_timeout) else {
            warn!(module = %name, "tried but failed to pop a value from the input queue");
            continue;
        };

        let counter = stats.vectors();
        debug!(module = %name, vector = counter, size = vector.len(), "received vector");
        if check_vector(name, counter, &plan.sequence, &mut current, &vector) {
            stats.failures.fetch_add(1, Ordering::Relaxed);
        }
        stats.vectors.fetch_add(1, Ordering::Relaxed);
    }

    info!(
        module = %name,
        vectors = stats.vectors(),
        failures = stats.failures(),
        "consumer stopped"
    );
}

impl Module for FakeDataConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "consumer_configure", skip(self, _args), fields(module = %self.name))]
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

    const SEQ: SequenceSettings = SequenceSettings {
        ints_per_vector: 4,
        starting_int: 0,
        ending_int: 5,
    };

    #[test]
    fn test_check_vector_accepts_continuation() {
        let mut current = 0;
        assert!(!check_vector("c", 0, &SEQ, &mut current, &[0, 1, 2, 3]));
        assert!(!check_vector("c", 1, &SEQ, &mut current, &[4, 5, 0, 1]));
        assert_eq!(current, 2);
    }

    #[test]
    fn test_check_vector_jump_versus_error() {
        let mut current = 0;
        // Discontinuity at the first position is a jump, not a failure
        assert!(!check_vector("c", 0, &SEQ, &mut current, &[3, 4, 5, 0]));
        // Discontinuity further in is a failure
        assert!(check_vector("c", 1, &SEQ, &mut current, &[1, 2, 5, 0]));
    }

    #[test]
    fn test_consumer_counts_vectors() {
        let mut queues = QueueRegistry::new();
        let input = queues.create::<Vec<i64>>("in", 4).unwrap();
        let consumer = FakeDataConsumer::new(ModuleInit::new(
            "c",
            ModuleConfig::new(json!({
                "input": "in",
                "starting_int": 0,
                "ending_int": 5,
                "wait_interval_ms": 1,
            })),
            Arc::new(queues),
        ));

        consumer.execute_command("configure", &[]).unwrap();
        consumer.execute_command("start", &[]).unwrap();
        input.push(vec![0, 1, 2, 3], Duration::ZERO).unwrap();
        input.push(vec![4, 9, 0, 1], Duration::ZERO).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while consumer.stats().vectors() < 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        consumer.execute_command("stop", &[]).unwrap();

        assert_eq!(consumer.stats().vectors(), 2);
        assert_eq!(consumer.stats().failures(), 1);
    }
}
