//! In-memory stand-in for an inspector protocol client.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use session::{Connection, Connector, EventSink, ProcessSignaller, Target, protocol};

type RegisterHook = Arc<dyn Fn(EventSink) + Send + Sync>;

#[derive(Default)]
struct Script {
    calls: Vec<String>,
    fail_connect: Option<String>,
    fail_step: Option<(String, String)>,
    sinks: Vec<EventSink>,
    on_register: Option<RegisterHook>,
    next_id: usize,
}

/// Records every call made through it and hands out [`MockConnection`]s
#[derive(Clone, Default)]
pub struct MockConnector {
    script: Arc<Mutex<Script>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    /// The next `connect` fails with `message`
    pub fn fail_next_connect(&self, message: impl Into<String>) {
        self.lock().fail_connect = Some(message.into());
    }

    /// Every call whose name starts with `step` fails with `message`
    pub fn fail_step(&self, step: impl Into<String>, message: impl Into<String>) {
        self.lock().fail_step = Some((step.into(), message.into()));
    }

    /// Run `hook` with each sink as soon as it is registered, before the
    /// connect call returns
    pub fn on_register(&self, hook: impl Fn(EventSink) + Send + Sync + 'static) {
        self.lock().on_register = Some(Arc::new(hook));
    }

    pub fn clear_failures(&self) {
        let mut script = self.lock();
        script.fail_connect = None;
        script.fail_step = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Sink registered by the most recent connection
    pub fn sink(&self) -> EventSink {
        self.lock()
            .sinks
            .last()
            .cloned()
            .expect("no listeners registered")
    }

    pub fn sinks(&self) -> Vec<EventSink> {
        self.lock().sinks.clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, target: &Target) -> eyre::Result<Box<dyn Connection>> {
        let mut script = self.lock();
        script.calls.push(format!("connect {target}"));
        if let Some(message) = script.fail_connect.take() {
            eyre::bail!("{message}");
        }
        script.next_id += 1;
        Ok(Box::new(MockConnection {
            id: script.next_id,
            script: Arc::clone(&self.script),
        }))
    }
}

pub struct MockConnection {
    id: usize,
    script: Arc<Mutex<Script>>,
}

impl MockConnection {
    fn step(&self, name: String) -> eyre::Result<()> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(name.clone());
        match &script.fail_step {
            Some((step, message)) if name.starts_with(step.as_str()) => {
                eyre::bail!("{message}")
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn enable_debugger(&mut self) -> eyre::Result<()> {
        self.step("Debugger.enable".to_string())
    }

    async fn enable_runtime(&mut self) -> eyre::Result<()> {
        self.step("Runtime.enable".to_string())
    }

    async fn set_pause_on_exceptions(
        &mut self,
        state: protocol::PauseOnExceptions,
    ) -> eyre::Result<()> {
        self.step(format!("Debugger.setPauseOnExceptions {state}"))
    }

    async fn set_async_call_stack_depth(&mut self, max_depth: u32) -> eyre::Result<()> {
        self.step(format!("Debugger.setAsyncCallStackDepth {max_depth}"))
    }

    fn register_listeners(&mut self, sink: EventSink) -> eyre::Result<()> {
        // the sink is handed out even when registration then reports failure
        let hook = {
            let mut script = self.script.lock().unwrap();
            script.sinks.push(sink.clone());
            script.on_register.clone()
        };
        if let Some(hook) = hook {
            hook(sink);
        }
        self.step("register".to_string())
    }

    async fn close(&mut self) -> eyre::Result<()> {
        self.step(format!("close {}", self.id))
    }
}

/// Records which pids were signalled, optionally failing
#[derive(Clone, Default)]
pub struct FakeSignaller {
    signalled: Arc<Mutex<Vec<i32>>>,
    failure: Option<String>,
}

impl FakeSignaller {
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn signalled(&self) -> Vec<i32> {
        self.signalled.lock().unwrap().clone()
    }
}

impl ProcessSignaller for FakeSignaller {
    fn signal_ready(&self, pid: i32) -> eyre::Result<()> {
        self.signalled.lock().unwrap().push(pid);
        match &self.failure {
            Some(message) => eyre::bail!("{message}"),
            None => Ok(()),
        }
    }
}

pub fn console_log(args: Vec<protocol::RemoteObject>, timestamp: f64, context: i64) -> protocol::ConsoleApiCalled {
    protocol::ConsoleApiCalled {
        kind: "log".to_string(),
        args,
        execution_context_id: context,
        timestamp,
        stack_trace: None,
    }
}
