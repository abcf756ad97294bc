//! A small line-oriented interpreter that drives the phone: labels, jumps,
//! waits keyed to the call-event latches, DTMF collection, and softkey
//! presses. Every wait polls in short slices so the stop latch and the
//! disconnect policy are honored promptly.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::event::Latch;
use crate::phone::Phone;
use crate::state::PhoneEvent;

const POLL_SLICE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    Ring,
    Connected,
    Media,
}

impl CallTarget {
    fn event(&self) -> PhoneEvent {
        match self {
            CallTarget::Ring => PhoneEvent::Ring,
            CallTarget::Connected => PhoneEvent::Connected,
            CallTarget::Media => PhoneEvent::Media,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisconnectPolicy {
    None,
    Exit,
    Goto(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Wait(f64),
    WaitCall { secs: f64, target: CallTarget },
    WaitDigit(f64),
    GetDigits { var: String, max_len: usize, secs: f64, terminators: String },
    Switch { var: String, cases: Vec<(String, String)>, default: Option<String> },
    IfEq { var: String, value: String, label: String },
    IfCall { active: bool, label: String },
    SoftKey(String),
    Dial { digits: String, new_call: bool },
    Hold,
    Resume,
    End,
    Play(String),
    Set { key: String, value: String },
    OnDisconnect(DisconnectPolicy),
    Goto(String),
    Exit,
    Invalid { line: String, reason: String },
}

#[derive(Debug, Default)]
pub struct Program {
    pub ops: Vec<Op>,
    pub labels: HashMap<String, usize>,
}

fn strip_comment(line: &str) -> &str {
    let mut cut = line.len();
    if line.trim_start().starts_with('#') || line.trim_start().starts_with("//") {
        return "";
    }
    if let Some(pos) = line.find(" //") {
        cut = cut.min(pos);
    }
    if let Some(pos) = line.find(" #") {
        cut = cut.min(pos);
    }
    &line[..cut]
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 {
        let bytes = s.as_bytes();
        if (bytes[0] == b'"' && bytes[s.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[s.len() - 1] == b'\'')
        {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Parse a program. Commas are alternate line separators so a whole macro
/// fits on one command line. Parsing never fails; lines that make no sense
/// become `Op::Invalid` and are reported when (and if) they execute.
pub fn parse(script: &str) -> Program {
    let mut program = Program::default();

    let normalized = script.replace(',', "\n");
    for raw in normalized.lines() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(label) = line.strip_suffix(':') {
            if !label.trim().is_empty() && !label.contains(' ') {
                program
                    .labels
                    .insert(label.trim().to_uppercase(), program.ops.len());
                continue;
            }
        }

        program.ops.push(parse_line(line));
    }
    program
}

fn parse_line(line: &str) -> Op {
    let invalid = |reason: &str| Op::Invalid {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return invalid("empty");
    };
    let args: Vec<&str> = parts.collect();

    match command.to_uppercase().as_str() {
        "WAIT" | "SLEEP" => match args.first().and_then(|a| a.parse().ok()) {
            Some(secs) => Op::Wait(secs),
            None => invalid("WAIT needs seconds"),
        },
        "WAIT_CALL" => {
            let Some(secs) = args.first().and_then(|a| a.parse().ok()) else {
                return invalid("WAIT_CALL needs seconds");
            };
            let target = match args.get(1).map(|t| t.to_uppercase()) {
                None => CallTarget::Ring,
                Some(t) if t == "RING" => CallTarget::Ring,
                Some(t) if t == "CONNECTED" => CallTarget::Connected,
                Some(t) if t == "MEDIA" => CallTarget::Media,
                Some(t) => return invalid(&format!("unknown wait target {t}")),
            };
            Op::WaitCall { secs, target }
        }
        "WAIT_DIGIT" => match args.first().and_then(|a| a.parse().ok()) {
            Some(secs) => Op::WaitDigit(secs),
            None => invalid("WAIT_DIGIT needs seconds"),
        },
        "GETDIGITS" => {
            if args.len() < 3 {
                return invalid("GETDIGITS <var> <max_len> <secs> [terminators]");
            }
            let (Some(max_len), Some(secs)) =
                (args[1].parse().ok(), args[2].parse().ok())
            else {
                return invalid("GETDIGITS needs numeric max_len and secs");
            };
            Op::GetDigits {
                var: args[0].to_string(),
                max_len,
                secs,
                terminators: strip_quotes(args.get(3).copied().unwrap_or("#")).to_string(),
            }
        }
        "SWITCH" => {
            if args.len() < 2 {
                return invalid("SWITCH <var> k1:L1;k2:L2;DEFAULT:L");
            }
            let var = args[0].to_string();
            let spec = args[1..].join(" ");
            let mut cases = Vec::new();
            let mut default = None;
            for token in spec.split(';') {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                let Some((key, label)) = token.split_once(':') else {
                    return invalid(&format!("bad SWITCH case {token}"));
                };
                if key.trim().eq_ignore_ascii_case("DEFAULT") {
                    default = Some(label.trim().to_uppercase());
                } else {
                    cases.push((key.trim().to_string(), label.trim().to_uppercase()));
                }
            }
            Op::Switch { var, cases, default }
        }
        "IF_EQ" => {
            if args.len() < 3 {
                return invalid("IF_EQ <var> <value> <label>");
            }
            Op::IfEq {
                var: args[0].to_string(),
                value: strip_quotes(&args[1..args.len() - 1].join(" ")).to_string(),
                label: args[args.len() - 1].to_uppercase(),
            }
        }
        "IF" => {
            if args.len() < 2 {
                return invalid("IF <CALL_ACTIVE|NO_CALL> <label>");
            }
            let active = match args[0].to_uppercase().as_str() {
                "CALL_ACTIVE" => true,
                "NO_CALL" => false,
                other => return invalid(&format!("unknown condition {other}")),
            };
            Op::IfCall {
                active,
                label: args[1].to_uppercase(),
            }
        }
        "SOFTKEY" => {
            if args.is_empty() {
                return invalid("SOFTKEY <name>");
            }
            Op::SoftKey(args.join(" "))
        }
        "CALL" | "DIAL" => {
            if args.is_empty() {
                return invalid("DIAL <digits>");
            }
            Op::Dial {
                digits: args.join(""),
                new_call: command.eq_ignore_ascii_case("CALL"),
            }
        }
        "HOLD" => Op::Hold,
        "RESUME" => Op::Resume,
        "END" => Op::End,
        "PLAY" => match args.first() {
            Some(path) => Op::Play(path.to_string()),
            None => invalid("PLAY <path>"),
        },
        "SET" => {
            let pair = args.join(" ");
            match pair.split_once('=') {
                Some((key, value)) => Op::Set {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                },
                None => invalid("SET k=v"),
            }
        }
        "ON_DISCONNECT" => match args.first().map(|a| a.to_uppercase()) {
            Some(mode) if mode == "EXIT" => Op::OnDisconnect(DisconnectPolicy::Exit),
            Some(mode) if mode == "GOTO" => match args.get(1) {
                Some(label) => Op::OnDisconnect(DisconnectPolicy::Goto(label.to_uppercase())),
                None => invalid("ON_DISCONNECT GOTO requires a label"),
            },
            _ => Op::OnDisconnect(DisconnectPolicy::None),
        },
        "GOTO" => match args.first() {
            Some(label) => Op::Goto(label.to_uppercase()),
            None => invalid("GOTO <label>"),
        },
        "EXIT" => Op::Exit,
        other => invalid(&format!("unknown instruction {other}")),
    }
}

/// Type-coerced equality: numbers compare as numbers, booleans
/// case-insensitively, everything else as strings.
fn values_equal(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    if let (Ok(x), Ok(y)) = (a.parse::<f64>(), b.parse::<f64>()) {
        return x == y;
    }
    a.eq_ignore_ascii_case(b)
}

enum Flow {
    JumpedTo(usize),
    Stop,
}

/// Run a program against a phone until it exits, hits a fatal error, or
/// the stop latch fires.
pub fn run(phone: &Phone, program: &Program, stop: &Latch) {
    let state = phone.state().clone();
    let mut policy = DisconnectPolicy::None;
    let mut pc: usize = 0;

    // true if execution should stop; jump target handled inline
    let resolve = |label: &str| -> Option<usize> { program.labels.get(label).copied() };

    let handle_disconnect = |policy: &DisconnectPolicy| -> Option<Flow> {
        if !state.events.call_ended.is_set() {
            return None;
        }
        // consume the event so we react once per hangup
        state.events.call_ended.clear();
        log::debug!("disconnect detected: {policy:?}");
        match policy {
            DisconnectPolicy::None => None,
            DisconnectPolicy::Exit => Some(Flow::Stop),
            DisconnectPolicy::Goto(label) => match resolve(label) {
                Some(target) => Some(Flow::JumpedTo(target)),
                None => {
                    log::error!("ON_DISCONNECT label '{label}' not found");
                    Some(Flow::Stop)
                }
            },
        }
    };

    let ended = || state.events.call_ended.is_set();

    // interruptible sleep; false when cut short by stop or hangup
    let sleep = |secs: f64| -> bool {
        let deadline = Instant::now() + Duration::from_secs_f64(secs.max(0.0));
        loop {
            if stop.is_set() || ended() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(POLL_SLICE.min(deadline - now).min(Duration::from_millis(100)));
        }
    };

    while pc < program.ops.len() && !stop.is_set() {
        match handle_disconnect(&policy) {
            Some(Flow::Stop) => break,
            Some(Flow::JumpedTo(target)) => {
                pc = target;
                continue;
            }
            _ => {}
        }

        let op = &program.ops[pc];
        log::debug!("executing {op:?}");

        match op {
            Op::Wait(secs) => {
                sleep(*secs);
            }
            Op::WaitCall { secs, target } => {
                let deadline =
                    (*secs > 0.0).then(|| Instant::now() + Duration::from_secs_f64(*secs));
                let mut got = false;
                while !stop.is_set() && !ended() {
                    let mut slice = POLL_SLICE;
                    if let Some(deadline) = deadline {
                        let now = Instant::now();
                        if now >= deadline {
                            break;
                        }
                        slice = slice.min(deadline - now);
                    }
                    if state.wait_for(target.event(), Some(slice)) {
                        got = true;
                        break;
                    }
                }
                if !got && !stop.is_set() && !ended() {
                    log::warn!("WAIT_CALL timed out ({secs}s) waiting for {target:?}");
                }
            }
            Op::WaitDigit(secs) => {
                let deadline =
                    (*secs > 0.0).then(|| Instant::now() + Duration::from_secs_f64(*secs));
                let mut digit = None;
                while !stop.is_set() && !ended() {
                    let mut slice = POLL_SLICE;
                    if let Some(deadline) = deadline {
                        let now = Instant::now();
                        if now >= deadline {
                            break;
                        }
                        slice = slice.min(deadline - now);
                    }
                    if let Some(ch) = state.dtmf.wait_digit(Some(slice), Some(stop)) {
                        digit = Some(ch);
                        break;
                    }
                }
                match digit {
                    Some(ch) => state.kv_set("last_digit", &ch.to_string()),
                    None => log::warn!("WAIT_DIGIT timeout"),
                }
            }
            Op::GetDigits { var, max_len, secs, terminators } => {
                let deadline =
                    (*secs > 0.0).then(|| Instant::now() + Duration::from_secs_f64(*secs));
                let mut collected = String::new();
                while collected.len() < *max_len && !stop.is_set() && !ended() {
                    let mut slice = POLL_SLICE;
                    if let Some(deadline) = deadline {
                        let now = Instant::now();
                        if now >= deadline {
                            break;
                        }
                        slice = slice.min(deadline - now);
                    }
                    match state.dtmf.wait_digit(Some(slice), Some(stop)) {
                        Some(ch) if terminators.contains(ch) => break,
                        Some(ch) => collected.push(ch),
                        None => continue,
                    }
                }
                state.kv_set(var, &collected);
            }
            Op::Switch { var, cases, default } => {
                let value = state.kv_get(var).unwrap_or_default();
                let target = cases
                    .iter()
                    .find(|(k, _)| values_equal(k, &value))
                    .map(|(_, l)| l.clone())
                    .or_else(|| default.clone());
                match target {
                    Some(label) => match resolve(&label) {
                        Some(dest) => {
                            pc = dest;
                            continue;
                        }
                        None => {
                            log::error!("SWITCH label '{label}' not found");
                            break;
                        }
                    },
                    None => log::error!("SWITCH no match for '{value}' and no DEFAULT"),
                }
            }
            Op::IfEq { var, value, label } => {
                let actual = state.kv_get(var).unwrap_or_default();
                if values_equal(&actual, value) {
                    match resolve(label) {
                        Some(dest) => {
                            pc = dest;
                            continue;
                        }
                        None => {
                            log::error!("label '{label}' not found");
                            break;
                        }
                    }
                }
            }
            Op::IfCall { active, label } => {
                if state.has_active_call() == *active {
                    match resolve(label) {
                        Some(dest) => {
                            pc = dest;
                            continue;
                        }
                        None => {
                            log::error!("label '{label}' not found");
                            break;
                        }
                    }
                }
            }
            Op::SoftKey(name) => {
                phone.press_softkey(name);
                sleep(0.5);
            }
            Op::Dial { digits, new_call } => {
                if *new_call {
                    phone.press_softkey("NewCall");
                    sleep(0.5);
                }
                for ch in digits.chars() {
                    if stop.is_set() || ended() {
                        break;
                    }
                    phone.send_digit(ch);
                    phone.play_beep();
                    sleep(0.5);
                }
            }
            Op::Hold => phone.press_softkey("Hold"),
            Op::Resume => phone.press_softkey("Resume"),
            Op::End => phone.press_softkey("EndCall"),
            Op::Play(path) => match phone.session() {
                Some(session) => {
                    let media = session.media.lock().unwrap();
                    match &media.sender {
                        Some(sender) => {
                            if let Err(e) = sender.send_wav(std::path::Path::new(path), false) {
                                log::error!("PLAY {path}: {e}");
                            }
                        }
                        None => log::warn!("PLAY {path}: no media session"),
                    }
                }
                None => log::warn!("PLAY {path}: not connected"),
            },
            Op::Set { key, value } => state.kv_set(key, value),
            Op::OnDisconnect(new_policy) => policy = new_policy.clone(),
            Op::Goto(label) => match resolve(label) {
                Some(dest) => {
                    pc = dest;
                    continue;
                }
                None => {
                    log::error!("label '{label}' not found");
                    break;
                }
            },
            Op::Exit => break,
            Op::Invalid { line, reason } => {
                log::warn!("skipping bad instruction '{line}': {reason}");
            }
        }

        pc += 1;

        match handle_disconnect(&policy) {
            Some(Flow::Stop) => break,
            Some(Flow::JumpedTo(target)) => pc = target,
            _ => {}
        }
    }
}
