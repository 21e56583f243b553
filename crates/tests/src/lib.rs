//! # Integration Tests
//!
//! Cross-crate scenarios:
//! - graph file -> queues + modules -> coordinator
//! - ordered command dispatch over real modules
//! - end-to-end data flow through fan-out

#[cfg(test)]
mod support {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use contracts::{
        Command, CommandResult, GraphBlueprint, Module, ModuleError, QueueValueType, SUCCESS,
    };
    use coordinator::ModuleGraph;
    use modules::{ModuleInit, ModuleRegistry, WorkerThread};
    use parking_lot::Mutex;
    use queues::{QueueRegistry, QueueSink};

    /// Pushes 0..count into `output` once per start, waiting for space
    pub struct CountingProducer {
        name: String,
        queues: Arc<QueueRegistry>,
        output: Arc<Mutex<Option<QueueSink<i64>>>>,
        commands: Mutex<()>,
        worker: WorkerThread,
    }

    impl CountingProducer {
        pub fn new(init: ModuleInit) -> Self {
            let count: i64 = init.config.value_or("count", 10).unwrap_or(10);
            let output: Arc<Mutex<Option<QueueSink<i64>>>> = Arc::new(Mutex::new(None));
            let worker_output = Arc::clone(&output);
            let worker = WorkerThread::new(format!("{}-counter", init.name), move |flag| {
                let Some(sink) = worker_output.lock().clone() else {
                    return;
                };
                let mut next = 0;
                while flag.is_running() && next < count {
                    if sink.push(next, Duration::from_millis(10)).is_ok() {
                        next += 1;
                    }
                }
            });
            Self {
                name: init.name,
                queues: init.queues,
                output,
                commands: Mutex::new(()),
                worker,
            }
        }
    }

    impl Module for CountingProducer {
        fn name(&self) -> &str {
            &self.name
        }

        fn configure(&self, _args: &[String]) -> CommandResult {
            let _serial = self.commands.lock();
            let sink = self.queues.sink::<i64>("Q").map_err(|e| {
                ModuleError::command_failed(Command::Configure.as_str(), e.to_string())
            })?;
            *self.output.lock() = Some(sink);
            Ok(SUCCESS.to_string())
        }

        fn start(&self, _args: &[String]) -> CommandResult {
            let _serial = self.commands.lock();
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

    pub fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::with_builtins();
        registry
            .register("CountingProducer", |init: ModuleInit| -> Arc<dyn Module> {
                Arc::new(CountingProducer::new(init))
            })
            .unwrap();
        registry
    }

    /// Queues + modules + order from a blueprint
    pub fn build(blueprint: &GraphBlueprint, registry: &ModuleRegistry) -> ModuleGraph {
        let mut queues = QueueRegistry::new();
        for spec in &blueprint.queues {
            match spec.value_type {
                QueueValueType::Int => queues.create::<i64>(&spec.name, spec.capacity).map(drop),
                QueueValueType::IntVector => queues
                    .create::<Vec<i64>>(&spec.name, spec.capacity)
                    .map(drop),
                QueueValueType::Text => queues
                    .create::<String>(&spec.name, spec.capacity)
                    .map(drop),
            }
            .unwrap();
        }
        let queues = Arc::new(queues);

        let mut graph = ModuleGraph::new(Arc::clone(&queues));
        for spec in &blueprint.modules {
            let init = ModuleInit::new(&spec.name, spec.config.clone(), Arc::clone(&queues));
            let module = registry.create(&spec.plugin, init).unwrap();
            graph.add_module(module).unwrap();
        }
        graph.with_command_order(blueprint.command_order.clone())
    }

    pub fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        done()
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use coordinator::ProcessCoordinator;

    use crate::support::{build, registry, wait_until};

    const ROUND_ROBIN_GRAPH: &str = r#"
[[queues]]
name = "Q"
value_type = "int"
capacity = 4

[[queues]]
name = "R"
value_type = "int"
capacity = 10

[[queues]]
name = "S"
value_type = "int"
capacity = 10

[[modules]]
name = "producer"
plugin = "CountingProducer"
[modules.config]
count = 10

[[modules]]
name = "fanout"
plugin = "FanOutInt"
[modules.config]
input = "Q"
outputs = ["R", "S"]
fanout_mode = "RoundRobin"
wait_interval = 1000
queue_timeout_ms = 10

[command_order]
start = ["fanout", "producer"]
stop = ["producer", "fanout"]
"#;

    fn drain(coordinator: &ProcessCoordinator, queue: &str) -> Vec<i64> {
        let queue = coordinator
            .graph()
            .unwrap()
            .queues()
            .get::<i64>(queue)
            .unwrap();
        std::iter::from_fn(|| queue.pop(Duration::ZERO)).collect()
    }

    #[test]
    fn test_demo_graph_builds_and_registers() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../config/fanout_demo.toml");
        let blueprint = ConfigLoader::load_from_path(&path).unwrap();
        let coordinator = ProcessCoordinator::new();
        coordinator.register(build(&blueprint, &registry())).unwrap();

        let graph = coordinator.graph().unwrap();
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.queues().len(), 3);
        assert_eq!(
            graph.command_order().modules_for("start"),
            ["consumer1", "consumer2", "fanout", "producer"]
        );
        coordinator.execute_command("configure", &[]).unwrap();
    }

    /// Producer pushes 0..9 into Q (capacity 4); round robin over R and S
    #[test]
    fn test_e2e_round_robin_distribution() {
        let blueprint = ConfigLoader::load_from_str(ROUND_ROBIN_GRAPH, ConfigFormat::Toml).unwrap();
        let coordinator = ProcessCoordinator::new();
        coordinator.register(build(&blueprint, &registry())).unwrap();

        coordinator.execute_command("configure", &[]).unwrap();
        coordinator.execute_command("start", &[]).unwrap();

        let queues = Arc::clone(coordinator.graph().unwrap().queues());
        let r = queues.get::<i64>("R").unwrap();
        let s = queues.get::<i64>("S").unwrap();
        assert!(wait_until(Duration::from_secs(10), || r.len() + s.len() == 10));

        coordinator.execute_command("stop", &[]).unwrap();

        assert_eq!(drain(&coordinator, "R"), vec![0, 2, 4, 6, 8]);
        assert_eq!(drain(&coordinator, "S"), vec![1, 3, 5, 7, 9]);
        assert!(queues.get::<i64>("Q").unwrap().is_empty());
    }

    #[test]
    fn test_stop_twice_and_unknown_command_through_coordinator() {
        let blueprint = ConfigLoader::load_from_str(ROUND_ROBIN_GRAPH, ConfigFormat::Toml).unwrap();
        let coordinator = ProcessCoordinator::new();
        coordinator.register(build(&blueprint, &registry())).unwrap();

        coordinator.execute_command("Configure", &[]).unwrap();
        // Rejected by every module, configuration stays in place
        assert!(coordinator.execute_command("pause", &[]).is_err());
        coordinator.execute_command("START", &[]).unwrap();

        let r = Arc::clone(coordinator.graph().unwrap().queues())
            .get::<i64>("R")
            .unwrap();
        assert!(wait_until(Duration::from_secs(10), || r.len() == 5));

        let first = coordinator.execute_command("stop", &[]).unwrap();
        let second = coordinator.execute_command("stop", &[]).unwrap();
        assert_eq!(first.outcomes, second.outcomes);
        assert_eq!(drain(&coordinator, "R"), vec![0, 2, 4, 6, 8]);
    }
}

#[cfg(test)]
mod sequence_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{CommandOrderTable, Module, ModuleConfig};
    use coordinator::{ModuleGraph, ProcessCoordinator};
    use modules::{FakeDataConsumer, FakeDataProducer, FanOutModule, ModuleInit};
    use queues::QueueRegistry;
    use serde_json::json;

    use crate::support::wait_until;

    /// Producer -> broadcast fan-out -> two consumers verifying the sequence
    #[test]
    fn test_broadcast_feeds_every_consumer_a_valid_sequence() {
        let mut queues = QueueRegistry::new();
        for name in ["raw", "c1_in", "c2_in"] {
            queues.create::<Vec<i64>>(name, 8).unwrap();
        }
        let queues = Arc::new(queues);
        let init = |name: &str, config: ModuleConfig| ModuleInit::new(name, config, Arc::clone(&queues));

        let producer = Arc::new(FakeDataProducer::new(init(
            "producer",
            ModuleConfig::new(json!({
                "output": "raw",
                "wait_between_sends_ms": 2,
                "starting_int": 0,
                "ending_int": 7,
            })),
        )));
        let fanout = Arc::new(FanOutModule::<Vec<i64>>::new(init(
            "fanout",
            ModuleConfig::new(json!({
                "input": "raw",
                "outputs": ["c1_in", "c2_in"],
                "fanout_mode": "broadcast",
                "wait_interval": 1000,
            })),
        )));
        let c1 = Arc::new(FakeDataConsumer::new(init(
            "c1",
            ModuleConfig::new(json!({
                "input": "c1_in",
                "wait_interval_ms": 1,
                "starting_int": 0,
                "ending_int": 7,
            })),
        )));
        let c2 = Arc::new(FakeDataConsumer::new(init(
            "c2",
            ModuleConfig::new(json!({
                "input": "c2_in",
                "wait_interval_ms": 1,
                "starting_int": 0,
                "ending_int": 7,
            })),
        )));

        let modules: [Arc<dyn Module>; 4] = [
            producer.clone(),
            fanout.clone(),
            c1.clone(),
            c2.clone(),
        ];
        let mut graph = ModuleGraph::new(Arc::clone(&queues));
        for module in modules {
            graph.add_module(module).unwrap();
        }
        let graph = graph.with_command_order(
            CommandOrderTable::new()
                .with("start", ["c1", "c2", "fanout", "producer"])
                .with("stop", ["producer", "fanout", "c1", "c2"]),
        );

        let coordinator = ProcessCoordinator::new();
        coordinator.register(graph).unwrap();
        coordinator.execute_command("configure", &[]).unwrap();
        coordinator.execute_command("start", &[]).unwrap();

        assert!(wait_until(Duration::from_secs(10), || {
            c1.stats().vectors() >= 5 && c2.stats().vectors() >= 5
        }));
        coordinator.execute_command("stop", &[]).unwrap();

        assert!(!fanout.is_running());
        assert_eq!(c1.stats().failures(), 0);
        assert_eq!(c2.stats().failures(), 0);
    }
}
