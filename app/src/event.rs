//! Manual-reset events. A `Latch` stays set until somebody clears it;
//! waiters see the level, not the edge, so a transition observed late is
//! still observed. All the call/registration events and the DTMF notifier
//! are instances of this one primitive.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct Latch {
    flag: Mutex<bool>,
    cv: Condvar,
}

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        let mut flag = self.flag.lock().unwrap();
        *flag = true;
        self.cv.notify_all();
    }

    pub fn clear(&self) {
        let mut flag = self.flag.lock().unwrap();
        *flag = false;
    }

    pub fn is_set(&self) -> bool {
        *self.flag.lock().unwrap()
    }

    /// Wait until set. `None` waits forever. Returns whether the latch was
    /// set; a timeout returns `false`, it never panics or errors.
    pub fn wait_timeout(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut flag = self.flag.lock().unwrap();
        while !*flag {
            match deadline {
                None => flag = self.cv.wait(flag).unwrap(),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    let (guard, _) = self.cv.wait_timeout(flag, deadline - now).unwrap();
                    flag = guard;
                }
            }
        }
        true
    }
}

/// FIFO of collected DTMF digits with a notify latch for waiters.
#[derive(Default)]
pub struct DtmfBuffer {
    buf: Mutex<VecDeque<char>>,
    notify: Latch,
}

impl DtmfBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, ch: char) {
        self.buf.lock().unwrap().push_back(ch);
        self.notify.set();
    }

    pub fn try_pop(&self) -> Option<char> {
        let mut buf = self.buf.lock().unwrap();
        let ch = buf.pop_front();
        if buf.is_empty() {
            self.notify.clear();
        }
        ch
    }

    pub fn clear(&self) {
        self.buf.lock().unwrap().clear();
        self.notify.clear();
    }

    /// Wait for one digit in small slices so a stop latch is honored
    /// promptly. `None` timeout waits forever.
    pub fn wait_digit(&self, timeout: Option<Duration>, stop: Option<&Latch>) -> Option<char> {
        const SLICE: Duration = Duration::from_millis(100);
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(stop) = stop {
                if stop.is_set() {
                    return None;
                }
            }
            if let Some(ch) = self.try_pop() {
                return Some(ch);
            }
            let mut slice = SLICE;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return None;
                }
                slice = slice.min(deadline - now);
            }
            self.notify.wait_timeout(Some(slice));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn latch_level_semantics() {
        let latch = Latch::new();
        assert!(!latch.is_set());
        latch.set();
        assert!(latch.is_set());
        // already set: wait returns immediately
        assert!(latch.wait_timeout(Some(Duration::from_millis(1))));
        latch.clear();
        assert!(!latch.wait_timeout(Some(Duration::from_millis(10))));
    }

    #[test]
    fn latch_wakes_waiter() {
        let latch = Arc::new(Latch::new());
        let waiter = {
            let latch = latch.clone();
            thread::spawn(move || latch.wait_timeout(Some(Duration::from_secs(5))))
        };
        thread::sleep(Duration::from_millis(20));
        latch.set();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn dtmf_fifo_order_and_notify_reset() {
        let dtmf = DtmfBuffer::new();
        dtmf.push('1');
        dtmf.push('2');
        assert_eq!(dtmf.try_pop(), Some('1'));
        assert_eq!(dtmf.try_pop(), Some('2'));
        assert_eq!(dtmf.try_pop(), None);
        // notify cleared once drained
        assert_eq!(dtmf.wait_digit(Some(Duration::from_millis(20)), None), None);
    }

    #[test]
    fn wait_digit_respects_stop() {
        let dtmf = DtmfBuffer::new();
        let stop = Latch::new();
        stop.set();
        assert_eq!(dtmf.wait_digit(None, Some(&stop)), None);
    }

    #[test]
    fn wait_digit_gets_digit_from_other_thread() {
        let dtmf = Arc::new(DtmfBuffer::new());
        let pusher = {
            let dtmf = dtmf.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                dtmf.push('#');
            })
        };
        assert_eq!(dtmf.wait_digit(Some(Duration::from_secs(2)), None), Some('#'));
        pusher.join().unwrap();
    }
}
