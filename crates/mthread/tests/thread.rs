//! Integration tests for managed threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};

use mthread::{current_thread_id, Semaphore, Thread, ThreadRef, UNKNOWN_NAME};

/// Spawn `name`, run `probe` inside it, join, and return what the probe saw.
fn observe<T, F>(name: &str, probe: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let mut thread = Thread::new(move || tx.send(probe()).unwrap(), name).unwrap();
    thread.join().unwrap();
    rx.recv().unwrap()
}

#[test]
fn test_current_name_inside_callback() {
    assert_eq!(observe("io", Thread::current_name), "io");
}

#[test]
fn test_long_name_not_truncated_in_context() {
    let name = "a-thread-name-well-past-fifteen-bytes";
    assert_eq!(observe(name, Thread::current_name), name);

    let (tx, rx) = mpsc::channel();
    let mut thread = Thread::new(move || tx.send(()).unwrap(), name).unwrap();
    assert_eq!(thread.name(), name);
    rx.recv().unwrap();
    thread.join().unwrap();
}

#[cfg(target_os = "linux")]
#[test]
fn test_os_name_is_truncated() {
    let os_name = observe("a-thread-name-well-past-fifteen-bytes", || {
        mthread::thread::sys::current_os_name()
    });
    assert_eq!(os_name.as_deref(), Some("a-thread-name-w"));
}

#[test]
fn test_id_ready_when_constructor_returns() {
    let gate = Arc::new(Semaphore::new(0));
    let (tx, rx) = mpsc::channel();

    let mut thread = {
        let gate = Arc::clone(&gate);
        Thread::new(
            move || {
                // Hold the callback until the owner has inspected the id.
                gate.wait();
                tx.send(current_thread_id()).unwrap();
            },
            "handshake",
        )
        .unwrap()
    };

    let id = thread.id();
    assert_ne!(id, 0);
    assert_ne!(id, current_thread_id());

    gate.notify();
    assert_eq!(rx.recv().unwrap(), id);
    thread.join().unwrap();
}

#[test]
fn test_current_is_spawning_object() {
    let (tx, rx) = mpsc::channel::<Option<ThreadRef>>();
    let mut thread = Thread::new(move || tx.send(Thread::current()).unwrap(), "self").unwrap();

    let seen = rx.recv().unwrap().expect("managed thread has a handle");
    assert!(seen.is(&thread));
    assert_eq!(seen, thread);
    assert_eq!(seen, thread.handle());
    assert_eq!(seen.id(), thread.id());
    thread.join().unwrap();
}

#[test]
fn test_current_on_foreign_thread_is_none() {
    let seen = std::thread::spawn(Thread::current).join().unwrap();
    assert!(seen.is_none());
}

#[test]
fn test_distinct_threads_are_not_equal() {
    let mut a = Thread::new(|| {}, "a").unwrap();
    let mut b = Thread::new(|| {}, "b").unwrap();
    assert_ne!(a.handle(), b.handle());
    assert!(!a.handle().is(&b));
    assert_ne!(a.id(), b.id());
    a.join().unwrap();
    b.join().unwrap();
}

#[test]
fn test_join_twice() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut thread = {
        let runs = Arc::clone(&runs);
        Thread::new(
            move || {
                runs.fetch_add(1, Ordering::SeqCst);
            },
            "twice",
        )
        .unwrap()
    };

    thread.join().unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!thread.is_joinable());

    thread.join().unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_drop_without_join_detaches() {
    let (tx, rx) = mpsc::channel();
    for i in 0..32 {
        let tx = tx.clone();
        let thread = Thread::new(move || tx.send(i).unwrap(), format!("detached-{}", i)).unwrap();
        drop(thread);
    }
    drop(tx);

    let mut seen: Vec<i32> = rx.iter().collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..32).collect::<Vec<_>>());
}

#[test]
fn test_drop_while_callback_running() {
    let gate = Arc::new(Semaphore::new(0));
    let (tx, rx) = mpsc::channel();

    let thread = {
        let gate = Arc::clone(&gate);
        Thread::new(
            move || {
                gate.wait();
                tx.send(Thread::current_name()).unwrap();
            },
            "outlives-owner",
        )
        .unwrap()
    };
    drop(thread);

    gate.notify();
    assert_eq!(rx.recv().unwrap(), "outlives-owner");
}

#[test]
fn test_empty_name_defaults_to_unknown() {
    let (tx, rx) = mpsc::channel();
    let mut thread = Thread::new(move || tx.send(Thread::current_name()).unwrap(), "").unwrap();

    assert_eq!(thread.name(), UNKNOWN_NAME);
    assert_eq!(rx.recv().unwrap(), UNKNOWN_NAME);
    thread.join().unwrap();
}

#[test]
fn test_set_current_name() {
    let (before, ignored, after) = observe("original", || {
        let before = Thread::current_name();
        Thread::set_current_name("");
        let ignored = Thread::current_name();
        Thread::set_current_name("worker");
        (before, ignored, Thread::current_name())
    });

    assert_eq!(before, "original");
    assert_eq!(ignored, "original");
    assert_eq!(after, "worker");
}

#[test]
fn test_set_current_name_updates_stored_name() {
    let (tx, rx) = mpsc::channel();
    let mut thread = Thread::new(
        move || {
            Thread::set_current_name("renamed");
            let me = Thread::current().unwrap();
            tx.send(me.name()).unwrap();
        },
        "before",
    )
    .unwrap();

    assert_eq!(rx.recv().unwrap(), "renamed");
    thread.join().unwrap();
    assert_eq!(thread.name(), "renamed");
}

#[test]
fn test_callback_runs_once_on_spawned_thread() {
    let runs = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();

    let mut thread = {
        let runs = Arc::clone(&runs);
        Thread::new(
            move || {
                runs.fetch_add(1, Ordering::SeqCst);
                tx.send(current_thread_id()).unwrap();
            },
            "once",
        )
        .unwrap()
    };
    thread.join().unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    let ran_on = rx.recv().unwrap();
    assert_eq!(ran_on, thread.id());
    assert_ne!(ran_on, current_thread_id());
}

#[test]
fn test_nested_spawn() {
    let (outer, inner) = observe("outer", || {
        let (tx, rx) = mpsc::channel();
        let mut child = Thread::new(move || tx.send(Thread::current_name()).unwrap(), "inner").unwrap();
        child.join().unwrap();
        (Thread::current_name(), rx.recv().unwrap())
    });

    assert_eq!(outer, "outer");
    assert_eq!(inner, "inner");
}

#[test]
fn test_thread_can_be_joined_from_another_thread() {
    let mut thread = Thread::new(|| {}, "handed-off").unwrap();
    let joiner = std::thread::spawn(move || {
        thread.join().unwrap();
        thread.is_joinable()
    });
    assert!(!joiner.join().unwrap());
}
