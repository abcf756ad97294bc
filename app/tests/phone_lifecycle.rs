//! End-to-end lifecycle against a scripted CallManager peer: registration
//! handshake, an inbound call answered and hung up, DTMF collection, the
//! media path, and a clean unregister. The peer drives real TCP/UDP
//! sockets; assertions on the peer side propagate through the join.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, UdpSocket};
use std::path::Path;
use std::time::{Duration, Instant};

use app::config::PhoneConfig;
use app::phone::Phone;
use app::state::PhoneEvent;
use rtp_audio::RtpPacket;
use sccp_core::{encode_frame, ids, FieldWriter, FrameHeader, FRAME_HEADER_LEN};

fn read_frame(stream: &mut TcpStream) -> (u32, Vec<u8>) {
    let mut header = [0u8; FRAME_HEADER_LEN];
    stream.read_exact(&mut header).expect("peer read header");
    let header = FrameHeader::parse(&header).unwrap();
    let mut payload = vec![0u8; header.payload_len().unwrap()];
    stream.read_exact(&mut payload).expect("peer read payload");
    (header.message_id, payload)
}

/// Read frames until `expected` shows up, skipping keepalives.
fn expect_frame(stream: &mut TcpStream, expected: u32) -> Vec<u8> {
    loop {
        let (id, payload) = read_frame(stream);
        if id == expected {
            return payload;
        }
        assert_eq!(
            id,
            ids::KEEP_ALIVE_REQ,
            "unexpected frame 0x{id:04X} while waiting for 0x{expected:04X}"
        );
    }
}

fn send_frame(stream: &mut TcpStream, message_id: u32, body: &[u8]) {
    stream
        .write_all(&encode_frame(message_id, body))
        .expect("peer send");
}

fn register_ack_body() -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.u32(30).ascii("M/D/YA", 6).u16(0).u32(30);
    w.finish()
}

fn button_template_body() -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.u32(0).u32(2).u32(2);
    w.u16(0x0901); // line 1
    w.u16(0x0201); // speed dial 1
    w.finish()
}

fn softkey_template_body() -> Vec<u8> {
    let keys: &[(&str, u32)] = &[("Redial", 1), ("NewCall", 2), ("Answer", 11), ("EndCall", 9)];
    let mut w = FieldWriter::new();
    w.u32(0).u32(keys.len() as u32).u32(keys.len() as u32);
    for (label, event) in keys {
        w.ascii(label, 16).u32(*event);
    }
    w.finish()
}

fn softkey_set_body() -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.u32(0).u32(1).u32(1);
    let mut template = [0u8; 16];
    template[0] = 3; // Answer
    template[1] = 4; // EndCall
    for b in template {
        w.u8(b);
    }
    for i in 0..16u16 {
        w.u16(if i < 2 { 311 + i } else { 0 });
    }
    w.finish()
}

fn config_stat_body() -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.ascii("SEP001122334455", 16)
        .u32(0)
        .u32(1)
        .ascii("tester", 40)
        .ascii("cucm-test", 40)
        .u32(1)
        .u32(1);
    w.finish()
}

fn line_stat_body() -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.u32(1)
        .ascii("2000", 24)
        .ascii("2000 Lobby", 40)
        .ascii("Lobby", 40)
        .u32(0);
    w.finish()
}

fn forward_stat_body() -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.u32(0).u32(1).u32(0).ascii("", 24).u32(0).ascii("", 24).u32(0).ascii("", 24);
    w.finish()
}

fn time_date_body() -> Vec<u8> {
    let mut w = FieldWriter::new();
    for v in [2024u32, 6, 6, 15, 10, 30, 0, 0, 1718447400] {
        w.u32(v);
    }
    w.finish()
}

fn call_info_body(reference: u32) -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.ascii("Alice", 40)
        .ascii("5551234", 24)
        .ascii("Lobby", 40)
        .ascii("2000", 24)
        .u32(1)
        .u32(reference)
        .u32(1);
    w.ascii("", 40).ascii("", 24).ascii("", 40).ascii("", 24);
    w.u32(0).u32(0);
    w.ascii("", 24).ascii("", 24).ascii("", 24).ascii("", 24);
    w.u32(1).u32(0).u32(0);
    w.finish()
}

fn call_state_body(state: u32, line: u32, reference: u32) -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.u32(state).u32(line).u32(reference).u32(0).u32(0).u32(0);
    w.finish()
}

fn keypad_body(button: u32) -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.u32(button).u32(1).u32(1001);
    w.finish()
}

fn open_receive_channel_body(reference: u32) -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.u32(7)
        .u32(0x0101_0001)
        .u32(20)
        .u32(4) // ulaw
        .u32(0)
        .u32(0)
        .u32(reference)
        .u32(0)
        .u16(0)
        .u16(0)
        .raw(&[0u8; 32]);
    w.finish()
}

fn start_media_body(rtp_port: u16, reference: u32) -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.u32(7)
        .u32(0x0101_0001)
        .raw(&[127, 0, 0, 1])
        .u32(rtp_port as u32)
        .u32(20)
        .u32(4) // ulaw
        .u32(0)
        .u32(0)
        .u16(1)
        .u16(0)
        .u32(0)
        .u32(reference)
        .u32(0)
        .u16(0)
        .u16(0)
        .raw(&[0u8; 32]);
    w.finish()
}

fn write_tone_wav(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..800 {
        let s = (8000.0 * (i as f32 * 0.33).sin()) as i16;
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

#[test]
fn full_lifecycle_against_scripted_peer() {
    let _ = env_logger::builder().is_test(true).try_init();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let tones_dir = std::env::temp_dir().join(format!("skinny_tones_{port}"));
    std::fs::create_dir_all(&tones_dir).unwrap();
    write_tone_wav(&tones_dir.join("key_beep.wav"));
    write_tone_wav(&tones_dir.join("inside_dial_tone.wav"));

    // the peer's RTP sink for S4
    let rtp_sink = UdpSocket::bind("127.0.0.1:0").unwrap();
    rtp_sink
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let rtp_port = rtp_sink.local_addr().unwrap().port();

    let peer = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();

        // --- S1: registration -------------------------------------------
        let register = expect_frame(&mut stream, ids::REGISTER_REQ);
        assert_eq!(register.len(), 64);
        assert_eq!(&register[..15], b"SEP001122334455");
        assert_eq!(&register[48..52], &[0xFF, 0xFF, 0xFF, 0xFF]);

        send_frame(&mut stream, ids::REGISTER_ACK, &register_ack_body());
        send_frame(&mut stream, ids::CAPABILITIES_REQ, &[]);

        let caps = expect_frame(&mut stream, ids::CAPABILITIES_RES);
        // length word counts msg id + payload: 8 + 18 * 16
        assert_eq!(caps.len() + 4, 296);
        assert_eq!(&caps[..4], &7u32.to_le_bytes());

        for expected in [
            ids::BUTTON_TEMPLATE_REQ,
            ids::SOFT_KEY_TEMPLATE_REQ,
            ids::SOFT_KEY_SET_REQ,
            ids::CONFIG_STAT_REQ,
            ids::LINE_STAT_REQ,
            ids::FORWARD_STAT_REQ,
            ids::REGISTER_AVAILABLE_LINES,
        ] {
            let (id, _) = read_frame(&mut stream);
            assert_eq!(id, expected, "post-registration request order");
        }

        send_frame(&mut stream, ids::BUTTON_TEMPLATE_RES, &button_template_body());
        send_frame(&mut stream, ids::SOFT_KEY_TEMPLATE_RES, &softkey_template_body());
        send_frame(&mut stream, ids::SOFT_KEY_SET_RES, &softkey_set_body());
        send_frame(&mut stream, ids::LINE_STAT_RES, &line_stat_body());
        send_frame(&mut stream, ids::FORWARD_STAT_RES, &forward_stat_body());
        send_frame(&mut stream, ids::CONFIG_STAT_RES, &config_stat_body());

        // the coalesced stat burst driven by the button template
        for expected in [
            ids::REGISTER_AVAILABLE_LINES,
            ids::LINE_STAT_REQ,
            ids::SPEED_DIAL_STAT_REQ,
            ids::TIME_DATE_REQ,
        ] {
            let (id, _) = read_frame(&mut stream);
            assert_eq!(id, expected, "stat burst order");
        }
        send_frame(&mut stream, ids::TIME_DATE_RES, &time_date_body());

        // --- S2: inbound call -------------------------------------------
        send_frame(&mut stream, ids::CALL_INFO, &call_info_body(1001));
        send_frame(&mut stream, ids::SET_RINGER, &{
            let mut w = FieldWriter::new();
            w.u32(2).u32(1).u32(1).u32(1001);
            w.finish()
        });
        send_frame(&mut stream, ids::START_TONE, &{
            let mut w = FieldWriter::new();
            w.u32(33).u32(0).u32(1).u32(1001);
            w.finish()
        });
        send_frame(&mut stream, ids::CALL_STATE, &call_state_body(4, 1, 1001)); // RingIn

        // the client answers
        let softkey = expect_frame(&mut stream, ids::SOFT_KEY_EVENT);
        assert_eq!(&softkey[..4], &11u32.to_le_bytes()); // Answer
        assert_eq!(&softkey[8..12], &1001u32.to_le_bytes());

        send_frame(&mut stream, ids::STOP_TONE, &{
            let mut w = FieldWriter::new();
            w.u32(1).u32(1001);
            w.finish()
        });
        send_frame(&mut stream, ids::CALL_STATE, &call_state_body(5, 1, 1001)); // Connected
        send_frame(&mut stream, ids::DISPLAY_PROMPT_STATUS, &{
            let mut w = FieldWriter::new();
            w.u32(0).ascii("Connected", 32).u32(1).u32(1001);
            w.finish()
        });

        // --- S3: DTMF ----------------------------------------------------
        for button in [1u32, 2, 3, 0x0F] {
            send_frame(&mut stream, ids::KEYPAD_BUTTON, &keypad_body(button));
        }

        // --- S4: media ---------------------------------------------------
        send_frame(&mut stream, ids::OPEN_RECEIVE_CHANNEL, &open_receive_channel_body(1001));
        let ack = expect_frame(&mut stream, ids::OPEN_RECEIVE_CHANNEL_ACK);
        assert_eq!(&ack[..4], &0u32.to_le_bytes()); // status ok
        let advertised_port = u32::from_le_bytes(ack[8..12].try_into().unwrap());
        assert!(advertised_port > 0);
        assert_eq!(&ack[16..20], &1001u32.to_le_bytes());

        // prove the advertised socket is live
        let probe = UdpSocket::bind("127.0.0.1:0").unwrap();
        probe
            .send_to(&[0u8; 4], ("127.0.0.1", advertised_port as u16))
            .unwrap();

        send_frame(&mut stream, ids::START_MEDIA_TRANSMISSION, &start_media_body(rtp_port, 1001));

        let mut buf = [0u8; 1500];
        let mut packets = Vec::new();
        while packets.len() < 5 {
            let (len, _) = rtp_sink.recv_from(&mut buf).expect("rtp packet");
            packets.push(RtpPacket::unpack(&buf[..len]).unwrap());
        }
        for pair in packets.windows(2) {
            assert_eq!(
                pair[1].header.sequence_number,
                pair[0].header.sequence_number.wrapping_add(1)
            );
            assert_eq!(
                pair[1].header.timestamp,
                pair[0].header.timestamp.wrapping_add(160)
            );
        }
        for packet in &packets {
            assert_eq!(packet.header.version, 2);
            assert_eq!(packet.header.payload_type, 0);
            assert_eq!(packet.payload.len(), 160);
        }

        send_frame(&mut stream, ids::STOP_MEDIA_TRANSMISSION, &{
            let mut w = FieldWriter::new();
            w.u32(7).u32(0x0101_0001).u32(1001);
            w.finish()
        });
        send_frame(&mut stream, ids::CLOSE_RECEIVE_CHANNEL, &{
            let mut w = FieldWriter::new();
            w.u32(7).u32(0x0101_0001).u32(1001);
            w.finish()
        });

        // --- hangup ------------------------------------------------------
        send_frame(&mut stream, ids::CALL_STATE, &call_state_body(2, 1, 1001)); // OnHook

        // --- unregister --------------------------------------------------
        expect_frame(&mut stream, ids::UNREGISTER_REQ);
        send_frame(&mut stream, ids::UNREGISTER_ACK, &0u32.to_le_bytes());

        // drain until the client hangs up the TCP side
        loop {
            let mut scratch = [0u8; 256];
            match stream.read(&mut scratch) {
                Ok(0) | Err(_) => break,
                Ok(_) => continue,
            }
        }
    });

    let mut config = PhoneConfig::new("127.0.0.1", "001122334455", "7940").unwrap();
    config.port = port;
    config.tones_dir = tones_dir;
    let mut phone = Phone::new(config);
    phone.start().expect("phone start");

    // S1: registered within 2 s
    assert!(
        phone.state().is_registered.wait_timeout(Some(Duration::from_secs(2))),
        "registration did not complete"
    );
    {
        let inner = phone.state().read();
        assert_eq!(inner.keepalive_interval, 30);
        assert_eq!(inner.date_template, "M/D/YA");
        assert_eq!(inner.lines[&1].dir_number, "2000");
        assert_eq!(inner.user_name, "tester");
        assert_eq!(inner.server_time.as_ref().unwrap().year, 2024);
    }

    // S2: ring, answer, connect
    assert!(phone.wait_for(PhoneEvent::Ring, Some(Duration::from_secs(2))));
    assert_eq!(phone.state().read().active_calls, vec![1001]);
    assert_eq!(phone.state().read().calls[&1001].calling_party, "5551234");

    phone.press_softkey("Answer");
    assert!(phone.wait_for(PhoneEvent::Connected, Some(Duration::from_secs(2))));
    assert!(phone.state().read().calls[&1001].started_at.is_some());
    assert!(wait_until(Duration::from_secs(2), || {
        phone.state().current_prompt() == "Connected"
    }));

    // S3: GETDIGITS-style collection stops at '#'
    let digits = phone.read_digits(10, Some(Duration::from_secs(5)), None, "#");
    assert_eq!(digits, "123");

    // S4: media started
    assert!(phone.wait_for(PhoneEvent::Media, Some(Duration::from_secs(2))));
    assert!(wait_until(Duration::from_secs(3), || {
        !phone.state().events.media_started.is_set()
    }));

    // hangup lands after the media teardown
    assert!(phone.wait_for(PhoneEvent::Ended, Some(Duration::from_secs(2))));
    assert!(phone.state().read().active_calls.is_empty());
    let record = phone.state().read().calls[&1001].clone();
    assert!(record.ended_at.is_some());
    assert!(record.started_at.unwrap() <= record.ended_at.unwrap());

    // snapshot is primitive JSON with event booleans
    let snapshot = phone.snapshot();
    assert_eq!(snapshot["is_registered"], true);
    assert_eq!(snapshot["events"]["call_ended"], true);
    assert_eq!(snapshot["lines"]["1"]["dir_number"], "2000");
    assert_eq!(snapshot["calls"]["1001"]["call_state_name"], "OnHook");

    phone.stop();
    peer.join().unwrap();
}

#[test]
fn macro_reenters_label_after_disconnect() {
    // S6: ON_DISCONNECT GOTO TOP; after one ring->connect->hangup cycle the
    // interpreter waits for the next ring instead of exiting.
    let _ = env_logger::builder().is_test(true).try_init();

    let config = PhoneConfig::new("127.0.0.1", "001122334455", "7940").unwrap();
    let phone = std::sync::Arc::new(Phone::new(config));
    let program = app::macro_engine::parse(
        "ON_DISCONNECT GOTO TOP\nTOP:\nWAIT_CALL 0 RING\nSOFTKEY Answer\nWAIT 60\nEXIT",
    );
    let stop = std::sync::Arc::new(app::Latch::new());

    let runner = {
        let phone = phone.clone();
        let stop = stop.clone();
        std::thread::spawn(move || {
            app::macro_engine::run(&phone, &program, &stop);
        })
    };

    let ring = |reference: u32| sccp_core::messages::CallStateMsg {
        state: sccp_core::CallState::RingIn,
        line: 1,
        call_reference: reference,
        privacy: 0,
        precedence_level: 0,
        precedence_domain: 0,
    };
    let onhook = |reference: u32| sccp_core::messages::CallStateMsg {
        state: sccp_core::CallState::OnHook,
        line: 1,
        call_reference: reference,
        privacy: 0,
        precedence_level: 0,
        precedence_domain: 0,
    };

    let state = phone.state().clone();
    std::thread::sleep(Duration::from_millis(200));
    state.apply_call_state(&ring(1));
    std::thread::sleep(Duration::from_millis(800));
    state.apply_call_state(&onhook(1));

    // the macro is back in WAIT_CALL: it must still be running
    std::thread::sleep(Duration::from_millis(800));
    assert!(!runner.is_finished(), "macro exited instead of re-entering TOP");

    // second cycle proves the label jump actually armed the wait again
    state.apply_call_state(&ring(2));
    std::thread::sleep(Duration::from_millis(800));
    assert!(!runner.is_finished());

    stop.set();
    runner.join().unwrap();
}
