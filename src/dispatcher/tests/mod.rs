//! Test modules for the dispatcher
//!
//! All tests run against a real task store in a temporary directory with
//! scripted receivers and scanners that record every call into a shared
//! journal.


use crate::core::config::Configuration;
use crate::dispatcher::api::{Dispatcher, TaskRunner, TaskSubmitter};
use crate::receiver::api::{EngineError, ReceiverError, ReceiverResult, TargetReceiver};
use crate::registry::api::{ReceiverRegistry, ScannerRegistry};
use crate::scanner::api::{ScanError, ScanResult, Scanner};
use crate::store::api::{Area, Task, TaskStore};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub(super) const SCRIPTED: &str = "scripted";
pub(super) const MARKER: &str = "marker";

pub(super) type Journal = Arc<Mutex<Vec<String>>>;

fn record(journal: &Journal, entry: String) {
    journal.lock().unwrap().push(entry);
}

/// Receiver whose behaviour is chosen by its target string
struct ScriptedReceiver {
    target: String,
    output_dir: PathBuf,
    journal: Journal,
}

#[async_trait::async_trait]
impl TargetReceiver for ScriptedReceiver {
    async fn fetch(&mut self) -> ReceiverResult<()> {
        record(&self.journal, "fetch".to_string());
        if self.target == "fail-fetch" {
            return Err(ReceiverError::Fetch {
                target: self.target.clone(),
                source: EngineError::api("image pull", "network unreachable"),
            });
        }
        Ok(())
    }

    async fn snapshot(&mut self) -> ReceiverResult<()> {
        record(&self.journal, "snapshot".to_string());
        if self.target == "fail-snapshot" {
            return Err(ReceiverError::Snapshot {
                target: self.target.clone(),
                source: Box::new(ReceiverError::Engine(EngineError::api(
                    "container export",
                    "export interrupted",
                ))),
            });
        }
        std::fs::create_dir_all(&self.output_dir)
            .and_then(|_| std::fs::write(self.output_dir.join(MARKER), "x"))
            .map_err(ReceiverError::io("write", &self.output_dir))
    }

    async fn cleanup(&mut self) -> ReceiverResult<()> {
        record(&self.journal, "cleanup".to_string());
        match std::fs::remove_dir_all(&self.output_dir) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(ReceiverError::io("remove", &self.output_dir)(e))
            }
            _ => Ok(()),
        }
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Tracks how many slow scanners run at the same time
#[derive(Debug, Default)]
pub(super) struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    pub(super) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

enum Behaviour {
    Succeed,
    Fail,
    Slow(Arc<Gauge>),
}

struct ScriptedScanner {
    name: String,
    behaviour: Behaviour,
    journal: Journal,
}

#[async_trait::async_trait]
impl Scanner for ScriptedScanner {
    async fn run(&self, directory: &Path) -> ScanResult<()> {
        record(&self.journal, format!("scan {}", self.name));
        if !directory.join(MARKER).exists() {
            return Err(ScanError::MissingDirectory(directory.to_path_buf()));
        }
        match &self.behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail => Err(ScanError::Failed {
                message: "rule engine crashed".to_string(),
            }),
            Behaviour::Slow(gauge) => {
                let now = gauge.current.fetch_add(1, Ordering::SeqCst) + 1;
                gauge.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(60)).await;
                gauge.current.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}

pub(super) struct Harness {
    _temp_dir: TempDir,
    pub(super) config: Arc<Configuration>,
    pub(super) store: TaskStore,
    pub(super) journal: Journal,
    pub(super) gauge: Arc<Gauge>,
    pub(super) receivers: Arc<ReceiverRegistry>,
    pub(super) scanners: Arc<ScannerRegistry>,
}

impl Harness {
    pub(super) fn new() -> Self {
        Self::with_concurrency(4)
    }

    pub(super) fn with_concurrency(max_concurrent: usize) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut config = Configuration::with_storage_root(temp_dir.path().join("storage"));
        config.tasks.max_concurrent = max_concurrent;
        config.tasks.poll_interval_secs = 0;

        let store = TaskStore::from_config(&config);
        store.init().expect("init store");

        let journal: Journal = Arc::default();
        let gauge = Arc::new(Gauge::default());

        let mut receivers = ReceiverRegistry::receivers();
        let receiver_journal = journal.clone();
        receivers
            .register_receiver(
                SCRIPTED,
                move |_config: &Configuration,
                      target: &str,
                      output_dir: &Path|
                      -> ReceiverResult<Box<dyn TargetReceiver>> {
                    if target == "reject" {
                        return Err(ReceiverError::InvalidReference {
                            reference: target.to_string(),
                            reason: "rejected by constructor".to_string(),
                        });
                    }
                    Ok(Box::new(ScriptedReceiver {
                        target: target.to_string(),
                        output_dir: output_dir.to_path_buf(),
                        journal: receiver_journal.clone(),
                    }))
                },
            )
            .expect("register receiver");

        let mut scanners = ScannerRegistry::scanners();
        for name in ["ok-a", "ok-b", "broken", "slow"] {
            let journal = journal.clone();
            let gauge = gauge.clone();
            scanners
                .register_scanner(
                    name,
                    move |_config: &Configuration| -> ScanResult<Box<dyn Scanner>> {
                        let behaviour = match name {
                            "broken" => Behaviour::Fail,
                            "slow" => Behaviour::Slow(gauge.clone()),
                            _ => Behaviour::Succeed,
                        };
                        Ok(Box::new(ScriptedScanner {
                            name: name.to_string(),
                            behaviour,
                            journal: journal.clone(),
                        }))
                    },
                )
                .expect("register scanner");
        }

        Self {
            _temp_dir: temp_dir,
            config: Arc::new(config),
            store,
            journal,
            gauge,
            receivers: Arc::new(receivers),
            scanners: Arc::new(scanners),
        }
    }

    pub(super) fn runner(&self) -> TaskRunner {
        TaskRunner::new(
            self.config.clone(),
            self.store.clone(),
            self.receivers.clone(),
            self.scanners.clone(),
        )
    }

    pub(super) fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.config.clone(),
            self.store.clone(),
            self.receivers.clone(),
            self.scanners.clone(),
        )
    }

    pub(super) fn submitter(&self) -> TaskSubmitter {
        TaskSubmitter::new(
            self.store.clone(),
            self.receivers.clone(),
            self.scanners.clone(),
        )
    }

    /// Create and publish a task directly through the store
    pub(super) fn enqueue(&self, target_type: &str, target: &str, scanners: &[&str]) -> Task {
        let task = Task::new(
            target_type,
            target,
            scanners.iter().map(|s| s.to_string()).collect(),
        );
        self.store.create(&task).expect("create task");
        self.store.publish(&task.id).expect("publish task");
        task
    }

    pub(super) fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    /// Every lifecycle area holding `id`
    pub(super) fn areas_of(&self, id: &str) -> Vec<Area> {
        [Area::New, Area::Queue, Area::Processing, Area::Done, Area::Failed]
            .into_iter()
            .filter(|area| self.store.task_path(*area, id).unwrap().is_dir())
            .collect()
    }

    /// Poll until `id` reaches `area` or give up after five seconds
    pub(super) async fn wait_for(&self, id: &str, area: Area) -> bool {
        for _ in 0..500 {
            if self.areas_of(id) == vec![area] {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}
