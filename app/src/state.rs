//! Phone state. One struct of typed fields (plus a small string kv table
//! for macros) behind a read/write lock; the receive thread is the only
//! mutator, everyone else reads snapshots. Observable transitions are
//! republished through manual-reset latches, set only after the state
//! change is visible.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use sccp_core::messages::{CallInfo, CallStateMsg};
use sccp_core::{keyset_name, CallState, CallType};

use crate::event::{DtmfBuffer, Latch};

/// Observable call-lifecycle events.
#[derive(Default)]
pub struct CallEvents {
    pub call_ringing: Latch,
    pub call_connected: Latch,
    pub media_started: Latch,
    pub call_ended: Latch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneEvent {
    Ring,
    Connected,
    Media,
    Ended,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LineEntry {
    pub dir_number: String,
    pub fully_qualified_name: String,
    pub text_label: String,
    pub display_options: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SpeedDialEntry {
    pub dir_number: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ForwardEntry {
    pub forward_all_active: u32,
    pub forward_all_number: String,
    pub forward_busy_active: u32,
    pub forward_busy_number: String,
    pub forward_no_answer_active: u32,
    pub forward_no_answer_number: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ButtonEntry {
    pub instance: u32,
    pub button_type: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SoftKeyEntry {
    pub label: String,
    pub event: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SoftKeySetEntry {
    pub template_index: u32,
    pub info_index: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectedSoftKeys {
    pub line: u32,
    pub softkey_set_index: u32,
    pub softkey_set_name: String,
    pub valid_key_mask: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RingerState {
    pub mode: u32,
    pub duration: u32,
    pub line: u32,
    pub call_reference: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LampEntry {
    pub stimulus_name: String,
    pub stimulus_instance: u32,
    pub mode: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerTime {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub day_of_week: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub system_time: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DialedNumberEntry {
    pub number: String,
    pub line: u32,
    pub call_reference: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MediaSessionInfo {
    pub remote_ip: String,
    pub remote_port: u32,
    pub ptime_ms: u32,
    pub payload_type: u8,
}

/// Everything known about one call leg. Records accumulate for the life of
/// the client; they are never deleted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallRecord {
    pub line: u32,
    pub call_reference: u32,
    pub call_state: u32,
    pub call_state_name: String,
    pub call_type: u32,
    pub call_type_name: String,
    pub calling_party: String,
    pub calling_party_name: String,
    pub called_party: String,
    pub called_party_name: String,
    pub original_called_party: String,
    pub original_called_party_name: String,
    pub last_redirecting_party: String,
    pub last_redirecting_party_name: String,
    pub privacy: u32,
    pub party_pi_restriction_bits: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_change: Option<DateTime<Utc>>,
}

impl CallRecord {
    fn new(line: u32, call_reference: u32) -> Self {
        Self {
            line,
            call_reference,
            call_state: CallState::Idle.as_u32(),
            call_state_name: CallState::Idle.name().into(),
            ..Default::default()
        }
    }

    pub fn state(&self) -> CallState {
        CallState::from_u32(self.call_state)
    }
}

/// The lock-guarded portion of the phone state. Fields mirror what CUCM
/// has downloaded or reported; all of it serializes into the snapshot.
#[derive(Default, Serialize)]
pub struct StateInner {
    // RegisterAck
    pub keepalive_interval: u32,
    pub second_keepalive_interval: u32,
    pub date_template: String,
    pub feature_flags: u16,

    // ConfigStatRes
    pub line_count: u32,
    pub speed_dial_count: u32,
    pub instance: u32,
    pub user_name: String,
    pub server_name: String,

    // TimeDateRes
    pub server_time: Option<ServerTime>,

    // Templates and per-line downloads
    pub button_template: BTreeMap<u32, ButtonEntry>,
    pub softkey_template: BTreeMap<u32, SoftKeyEntry>,
    pub softkey_sets: BTreeMap<u32, BTreeMap<u32, SoftKeySetEntry>>,
    pub selected_softkeys: BTreeMap<u32, SelectedSoftKeys>,
    pub selected_softkey_set: u32,
    pub lines: BTreeMap<u32, LineEntry>,
    pub speed_dials: BTreeMap<u32, SpeedDialEntry>,
    pub call_forward: BTreeMap<u32, ForwardEntry>,
    pub active_forward: u32,

    // Calls
    pub calls: BTreeMap<u32, CallRecord>,
    pub active_calls: Vec<u32>,
    pub active_call_line: u32,
    pub last_call_epoch: u64,

    // Display and peripherals
    pub prompt: String,
    pub prompt_line: u32,
    pub prompt_call_reference: u32,
    pub ringer: RingerState,
    pub speaker_mode: u32,
    pub lamps: BTreeMap<u32, LampEntry>,
    pub dialed_number: Option<DialedNumberEntry>,

    // Media
    pub media: Option<MediaSessionInfo>,
}

pub struct PhoneState {
    inner: RwLock<StateInner>,
    pub events: CallEvents,
    pub is_registered: Latch,
    pub is_unregistered: Latch,
    pub dtmf: DtmfBuffer,
    kv: Mutex<HashMap<String, String>>,
    prompt_version: AtomicU64,
}

impl Default for PhoneState {
    fn default() -> Self {
        Self::new()
    }
}

impl PhoneState {
    pub fn new() -> Self {
        let inner = StateInner {
            keepalive_interval: 30,
            second_keepalive_interval: 30,
            line_count: 2,
            ..Default::default()
        };
        Self {
            inner: RwLock::new(inner),
            events: CallEvents::default(),
            is_registered: Latch::new(),
            is_unregistered: Latch::new(),
            dtmf: DtmfBuffer::new(),
            kv: Mutex::new(HashMap::new()),
            prompt_version: AtomicU64::new(0),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, StateInner> {
        self.inner.read().unwrap()
    }

    /// Only the receive thread writes; see the concurrency contract in the
    /// session module.
    pub fn write(&self) -> RwLockWriteGuard<'_, StateInner> {
        self.inner.write().unwrap()
    }

    // ---- calls ----------------------------------------------------------

    /// Apply a CallState transition and republish it through the latches.
    pub fn apply_call_state(&self, msg: &CallStateMsg) {
        let now = Utc::now();
        let mut ring = false;
        let mut connected = false;
        let mut ended = false;
        let mut deactivated = false;

        {
            let mut inner = self.write();
            let rec = inner
                .calls
                .entry(msg.call_reference)
                .or_insert_with(|| CallRecord::new(msg.line, msg.call_reference));
            rec.line = msg.line;
            rec.call_state = msg.state.as_u32();
            rec.call_state_name = msg.state.name().into();
            rec.privacy = msg.privacy;
            rec.last_change = Some(now);

            match msg.state {
                CallState::Idle | CallState::OnHook => {
                    if rec.ended_at.is_none() {
                        rec.ended_at = Some(now);
                    }
                    inner.active_calls.retain(|&r| r != msg.call_reference);
                    deactivated = true;
                    ended = msg.state == CallState::OnHook;
                }
                state => {
                    if state == CallState::Connected && rec.started_at.is_none() {
                        rec.started_at = Some(now);
                    }
                    if !inner.active_calls.contains(&msg.call_reference) {
                        inner.active_calls.push(msg.call_reference);
                    }
                    if state.is_ringing() {
                        inner.last_call_epoch += 1;
                        ring = true;
                    }
                    connected = state == CallState::Connected;
                }
            }
        }

        // latches fire after the state update is visible
        if deactivated {
            self.events.call_ringing.clear();
            self.events.call_connected.clear();
            self.events.media_started.clear();
            if ended {
                self.events.call_ended.set();
            } else {
                self.events.call_ended.clear();
            }
        }
        if ring {
            self.events.call_ringing.set();
            self.events.call_ended.clear();
        }
        if connected {
            self.events.call_connected.set();
            self.events.call_ended.clear();
        }
    }

    /// Merge a CallInfo record into the call it describes.
    pub fn merge_call_info(&self, info: &CallInfo) {
        let mut inner = self.write();
        let rec = inner
            .calls
            .entry(info.call_reference)
            .or_insert_with(|| CallRecord::new(info.line, info.call_reference));
        rec.line = info.line;
        rec.call_type = info.call_type;
        rec.call_type_name = CallType::from_u32(info.call_type).name().into();
        rec.calling_party = info.calling_party.clone();
        rec.calling_party_name = info.calling_party_name.clone();
        rec.called_party = info.called_party.clone();
        rec.called_party_name = info.called_party_name.clone();
        rec.original_called_party = info.original_called_party.clone();
        rec.original_called_party_name = info.original_called_party_name.clone();
        rec.last_redirecting_party = info.last_redirecting_party.clone();
        rec.last_redirecting_party_name = info.last_redirecting_party_name.clone();
        rec.party_pi_restriction_bits = info.party_pi_restriction_bits;
    }

    pub fn has_active_call(&self) -> bool {
        !self.read().active_calls.is_empty()
    }

    /// Line and reference of the most recent active call, if any.
    pub fn active_call(&self) -> Option<(u32, u32)> {
        let inner = self.read();
        let reference = *inner.active_calls.last()?;
        let line = inner.calls.get(&reference).map(|c| c.line).unwrap_or(1);
        Some((line, reference))
    }

    // ---- softkeys -------------------------------------------------------

    /// Resolve a softkey label to its event code via the downloaded
    /// template.
    pub fn find_softkey_event(&self, name: &str) -> Option<u32> {
        let inner = self.read();
        inner
            .softkey_template
            .values()
            .find(|k| k.label.eq_ignore_ascii_case(name))
            .map(|k| k.event)
    }

    /// The labels currently on screen: the selected set's positions
    /// resolved through the template.
    pub fn current_softkeys(&self) -> Vec<(String, u32)> {
        let inner = self.read();
        let set = match inner.softkey_sets.get(&inner.selected_softkey_set) {
            Some(set) => set,
            None => return Vec::new(),
        };
        set.values()
            .filter(|entry| entry.template_index != 0)
            .filter_map(|entry| inner.softkey_template.get(&entry.template_index))
            .map(|k| (k.label.clone(), k.event))
            .collect()
    }

    // ---- prompt ---------------------------------------------------------

    /// Set the display prompt. A transient prompt (`timeout > 0`) reverts
    /// to the previous text after `timeout` seconds unless a newer prompt
    /// arrived in the meantime; the version counter decides.
    pub fn update_prompt(
        self: &Arc<Self>,
        text: &str,
        timeout_secs: u32,
        line: u32,
        call_reference: u32,
        stop: &Arc<Latch>,
    ) {
        let previous;
        let version;
        {
            let mut inner = self.write();
            previous = inner.prompt.clone();
            inner.prompt = text.to_string();
            inner.prompt_line = line;
            inner.prompt_call_reference = call_reference;
            version = self.prompt_version.fetch_add(1, Ordering::SeqCst) + 1;
        }
        if text != previous {
            log::info!("[PROMPT] '{text}'");
        }

        if timeout_secs > 0 {
            let state = self.clone();
            let stop = stop.clone();
            let _ = std::thread::Builder::new()
                .name("prompt-restore".into())
                .spawn(move || {
                    if stop.wait_timeout(Some(Duration::from_secs(timeout_secs as u64))) {
                        return; // shutting down
                    }
                    let mut inner = state.write();
                    if state.prompt_version.load(Ordering::SeqCst) == version {
                        inner.prompt = previous;
                    }
                });
        }
    }

    pub fn current_prompt(&self) -> String {
        self.read().prompt.clone()
    }

    // ---- kv store -------------------------------------------------------

    pub fn kv_set(&self, key: &str, value: &str) {
        self.kv.lock().unwrap().insert(key.into(), value.into());
    }

    pub fn kv_get(&self, key: &str) -> Option<String> {
        self.kv.lock().unwrap().get(key).cloned()
    }

    // ---- waiting --------------------------------------------------------

    pub fn wait_for(&self, event: PhoneEvent, timeout: Option<Duration>) -> bool {
        let latch = match event {
            PhoneEvent::Ring => &self.events.call_ringing,
            PhoneEvent::Connected => &self.events.call_connected,
            PhoneEvent::Media => &self.events.media_started,
            PhoneEvent::Ended => &self.events.call_ended,
        };
        latch.wait_timeout(timeout)
    }

    /// Collect up to `max_len` digits. Stops early on a terminator digit,
    /// the overall deadline, a quiet `interdigit` gap, or the stop latch.
    pub fn read_digits(
        &self,
        max_len: usize,
        timeout: Option<Duration>,
        interdigit: Option<Duration>,
        terminators: &str,
        stop: Option<&Latch>,
    ) -> String {
        let deadline = timeout.map(|t| std::time::Instant::now() + t);
        let mut out = String::new();
        while out.len() < max_len {
            if let Some(stop) = stop {
                if stop.is_set() {
                    break;
                }
            }
            let mut slice = interdigit;
            if let Some(deadline) = deadline {
                let now = std::time::Instant::now();
                if now >= deadline {
                    break;
                }
                let remain = deadline - now;
                slice = Some(slice.map_or(remain, |s| s.min(remain)));
            }
            match self.dtmf.wait_digit(slice, stop) {
                None => {
                    // interdigit gap elapsed or overall deadline hit
                    if deadline.is_some_and(|d| std::time::Instant::now() >= d) {
                        break;
                    }
                    if interdigit.is_some() {
                        break;
                    }
                }
                Some(ch) if terminators.contains(ch) => break,
                Some(ch) => out.push(ch),
            }
        }
        out
    }

    // ---- snapshot -------------------------------------------------------

    /// Stable JSON export: primitive fields only, latches as booleans,
    /// datetimes ISO-8601.
    pub fn snapshot(&self) -> serde_json::Value {
        let mut value = {
            let inner = self.read();
            serde_json::to_value(&*inner).unwrap_or_else(|_| serde_json::json!({}))
        };
        let kv: BTreeMap<String, String> = self
            .kv
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let map = value.as_object_mut().expect("state serializes to an object");
        map.insert(
            "events".into(),
            serde_json::json!({
                "call_ringing": self.events.call_ringing.is_set(),
                "call_connected": self.events.call_connected.is_set(),
                "media_started": self.events.media_started.is_set(),
                "call_ended": self.events.call_ended.is_set(),
            }),
        );
        map.insert(
            "is_registered".into(),
            serde_json::json!(self.is_registered.is_set()),
        );
        map.insert(
            "is_unregistered".into(),
            serde_json::json!(self.is_unregistered.is_set()),
        );
        map.insert("kv_store".into(), serde_json::json!(kv));
        value
    }

    /// Selected-softkeys bookkeeping shares the keyset name table.
    pub fn select_softkeys(&self, line: u32, call_reference: u32, set_index: u32, mask: u32) {
        let mut inner = self.write();
        inner.selected_softkeys.insert(
            call_reference,
            SelectedSoftKeys {
                line,
                softkey_set_index: set_index,
                softkey_set_name: keyset_name(set_index).into(),
                valid_key_mask: mask,
            },
        );
        inner.selected_softkey_set = set_index;
    }
}
