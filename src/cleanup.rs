//! Signal & Cleanup Coordinator
//!
//! Process-wide bookkeeping of live runners. While at least one runner
//! is live an interrupt listener forwards Ctrl-C to every runner (and
//! its process group); when the set drains the listener is removed so
//! user handlers are not shadowed. An atexit hook hard-kills any child
//! group still alive when the process ends.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::spawn::{SIGINT, SIGKILL};

/// A second interrupt inside this window escalates to SIGKILL.
const INTERRUPT_GRACE: Duration = Duration::from_secs(2);

struct ActiveEntry {
    kill_tx: watch::Sender<Option<i32>>,
}

lazy_static::lazy_static! {
    static ref ACTIVE: Mutex<HashMap<u64, ActiveEntry>> = Mutex::new(HashMap::new());
    static ref SIGINT_TASK: Mutex<Option<JoinHandle<()>>> = Mutex::new(None);
    static ref LAST_INTERRUPT: Mutex<Option<Instant>> = Mutex::new(None);
    /// Process-group ids of live external children, for the atexit hook.
    static ref LIVE_GROUPS: Mutex<HashSet<i32>> = Mutex::new(HashSet::new());
}

/// Add a runner to the live set. Installs the interrupt listener on the
/// first insertion.
pub(crate) fn register_runner(id: u64, kill_tx: watch::Sender<Option<i32>>) {
    let install = {
        let mut active = ACTIVE.lock().unwrap();
        active.insert(id, ActiveEntry { kill_tx });
        active.len() == 1
    };
    if install {
        install_interrupt_listener();
    }
}

/// Remove a runner from the live set. Uninstalls the interrupt listener
/// when the set drains.
pub(crate) fn deregister_runner(id: u64) {
    let drained = {
        let mut active = ACTIVE.lock().unwrap();
        active.remove(&id);
        active.is_empty()
    };
    if drained {
        if let Some(task) = SIGINT_TASK.lock().unwrap().take() {
            task.abort();
        }
    }
}

/// Number of live runners.
pub fn active_count() -> usize {
    ACTIVE.lock().unwrap().len()
}

fn install_interrupt_listener() {
    let mut slot = SIGINT_TASK.lock().unwrap();
    if slot.is_some() {
        return;
    }
    *slot = Some(tokio::spawn(async {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            forward_interrupt();
        }
    }));
}

/// Forward an interrupt to every live runner. Re-entrant safe: a second
/// interrupt within the grace window escalates to SIGKILL.
pub(crate) fn forward_interrupt() {
    let escalate = {
        let mut last = LAST_INTERRUPT.lock().unwrap();
        let now = Instant::now();
        let escalate = matches!(*last, Some(prev) if now.duration_since(prev) < INTERRUPT_GRACE);
        *last = Some(now);
        escalate
    };
    let signal = if escalate { SIGKILL } else { SIGINT };

    for entry in ACTIVE.lock().unwrap().values() {
        entry.kill_tx.send_replace(Some(signal));
    }
    for pgid in LIVE_GROUPS.lock().unwrap().iter() {
        crate::spawn::kill_group(*pgid, signal);
    }
}

/// Kill every active runner synchronously.
pub fn force_cleanup_all() {
    for entry in ACTIVE.lock().unwrap().values() {
        entry.kill_tx.send_replace(Some(SIGKILL));
    }
    for pgid in LIVE_GROUPS.lock().unwrap().iter() {
        crate::spawn::kill_group(*pgid, SIGKILL);
    }
}

/// Record a live child group; installs the atexit hard-kill hook once.
pub(crate) fn track_group(pgid: i32) {
    ensure_atexit_hook();
    LIVE_GROUPS.lock().unwrap().insert(pgid);
}

/// Forget a reaped child group.
pub(crate) fn untrack_group(pgid: i32) {
    LIVE_GROUPS.lock().unwrap().remove(&pgid);
}

pub(crate) fn reset_interrupt_window() {
    *LAST_INTERRUPT.lock().unwrap() = None;
}

#[cfg(unix)]
fn ensure_atexit_hook() {
    use std::sync::Once;
    static HOOK: Once = Once::new();
    HOOK.call_once(|| unsafe {
        libc::atexit(atexit_kill_groups);
    });
}

#[cfg(not(unix))]
fn ensure_atexit_hook() {}

#[cfg(unix)]
extern "C" fn atexit_kill_groups() {
    // Only a best-effort pass; never block inside atexit.
    if let Ok(groups) = LIVE_GROUPS.try_lock() {
        for pgid in groups.iter() {
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_deregister_tracks_count() {
        let _guard = crate::test_util::lock_global();
        let before = active_count();
        let (tx, _rx) = watch::channel(None);
        register_runner(u64::MAX, tx);
        assert_eq!(active_count(), before + 1);
        deregister_runner(u64::MAX);
        assert_eq!(active_count(), before);
    }

    #[tokio::test]
    async fn test_forward_interrupt_sends_kill_request() {
        let _guard = crate::test_util::lock_global();
        reset_interrupt_window();
        let (tx, rx) = watch::channel(None);
        register_runner(u64::MAX - 1, tx);
        forward_interrupt();
        assert_eq!(*rx.borrow(), Some(SIGINT));
        deregister_runner(u64::MAX - 1);
        reset_interrupt_window();
    }

    #[tokio::test]
    async fn test_second_interrupt_escalates() {
        let _guard = crate::test_util::lock_global();
        reset_interrupt_window();
        let (tx, rx) = watch::channel(None);
        register_runner(u64::MAX - 2, tx);
        forward_interrupt();
        forward_interrupt();
        assert_eq!(*rx.borrow(), Some(SIGKILL));
        deregister_runner(u64::MAX - 2);
        reset_interrupt_window();
    }

    #[test]
    fn test_group_tracking() {
        let fake = i32::MAX - 7;
        track_group(fake);
        assert!(LIVE_GROUPS.lock().unwrap().contains(&fake));
        untrack_group(fake);
        assert!(!LIVE_GROUPS.lock().unwrap().contains(&fake));
    }
}
