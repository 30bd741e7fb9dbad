//! Spawn workers and collect what each one sees about itself.

use std::sync::mpsc;

use anyhow::{anyhow, Context, Result};
use mthread::thread::sys;
use mthread::{Builder, Thread};

pub struct SpawnOptions {
    pub count: usize,
    pub prefix: String,
    pub detach: bool,
    pub stack_size: Option<usize>,
}

/// What a worker observed from inside its own callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub index: usize,
    pub name: String,
    pub os_name: Option<String>,
    pub os_id: u64,
    /// `Thread::current()` resolved to a managed handle with a matching id.
    pub registered: bool,
}

impl WorkerReport {
    fn observe(index: usize) -> Self {
        let os_id = sys::current_thread_id();
        WorkerReport {
            index,
            name: Thread::current_name(),
            os_name: sys::current_os_name(),
            os_id,
            registered: Thread::current().is_some_and(|me| me.id() == os_id),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{:>3}  tid={:<8} name={:<24} os_name={:<16} registered={}",
            self.index,
            self.os_id,
            self.name,
            self.os_name.as_deref().unwrap_or("-"),
            self.registered
        )
    }
}

pub fn spawn_workers(options: &SpawnOptions) -> Result<Vec<WorkerReport>> {
    let (tx, rx) = mpsc::channel();
    let mut threads = Vec::with_capacity(options.count);

    for index in 0..options.count {
        let tx = tx.clone();
        let mut builder = Builder::new().name(format!("{}-{}", options.prefix, index));
        if let Some(size) = options.stack_size {
            builder = builder.stack_size(size);
        }

        let thread = builder
            .spawn(move || {
                let _ = tx.send(WorkerReport::observe(index));
            })
            .with_context(|| format!("spawning worker {}", index))?;

        tracing::debug!(index, thread_id = thread.id(), name = %thread.name(), "worker started");
        threads.push(thread);
    }
    drop(tx);

    if options.detach {
        // Workers keep running on their own; the channel still tells us when
        // each one has reported.
        drop(threads);
    } else {
        for thread in &mut threads {
            thread.join()?;
        }
    }

    let mut reports: Vec<WorkerReport> = rx.iter().collect();
    if reports.len() != options.count {
        return Err(anyhow!(
            "expected {} worker reports, got {}",
            options.count,
            reports.len()
        ));
    }
    reports.sort_by_key(|report| report.index);
    Ok(reports)
}

pub fn run_spawn(options: &SpawnOptions) -> Result<Vec<String>> {
    let reports = spawn_workers(options)?;
    Ok(reports.iter().map(WorkerReport::render).collect())
}

pub fn run_current() -> Result<Vec<String>> {
    let handle = match Thread::current() {
        Some(me) => format!("managed (tid={})", me.id()),
        None => "unmanaged".to_string(),
    };
    Ok(vec![
        format!("name:   {}", Thread::current_name()),
        format!("tid:    {}", sys::current_thread_id()),
        format!("handle: {}", handle),
    ])
}
