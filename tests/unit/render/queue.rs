use super::*;
use std::sync::{Arc, Mutex};

#[test]
fn jobs_run_fifo_on_named_worker() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done_rx) = mpsc::channel();
    {
        let q = SerialQueue::new("mixplay.test").unwrap();
        assert_eq!(q.label(), "mixplay.test");
        for i in 0..32 {
            let seen = Arc::clone(&seen);
            q.dispatch(move || {
                let name = std::thread::current().name().map(str::to_owned);
                seen.lock().unwrap().push((i, name));
            })
            .unwrap();
        }
        q.dispatch(move || done_tx.send(()).unwrap()).unwrap();
        done_rx.recv().unwrap();
    }

    let seen = seen.lock().unwrap();
    let order: Vec<_> = seen.iter().map(|(i, _)| *i).collect();
    assert_eq!(order, (0..32).collect::<Vec<_>>());
    assert!(seen.iter().all(|(_, n)| n.as_deref() == Some("mixplay.test")));
}

#[test]
fn drop_drains_queued_jobs() {
    let count = Arc::new(Mutex::new(0));
    {
        let q = SerialQueue::new("mixplay.drain").unwrap();
        for _ in 0..10 {
            let count = Arc::clone(&count);
            q.dispatch(move || *count.lock().unwrap() += 1).unwrap();
        }
    }
    assert_eq!(*count.lock().unwrap(), 10);
}

#[test]
fn panicking_job_does_not_stop_the_worker() {
    let q = SerialQueue::new("mixplay.panic").unwrap();
    q.dispatch(|| panic!("job blew up")).unwrap();
    let (tx, rx) = mpsc::channel();
    q.dispatch(move || tx.send(7).unwrap()).unwrap();
    assert_eq!(rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap(), 7);
}

#[test]
fn panic_messages_are_extracted() {
    let payload = std::panic::catch_unwind(|| -> u8 { panic!("static text") }).unwrap_err();
    assert_eq!(panic_message(payload.as_ref()), "static text");
    let payload = std::panic::catch_unwind(|| -> u8 { panic!("{} text", "formatted") }).unwrap_err();
    assert_eq!(panic_message(payload.as_ref()), "formatted text");
}
