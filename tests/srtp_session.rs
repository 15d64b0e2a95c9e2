#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use byteorder::{BigEndian, WriteBytesExt};
use rustysrtp::srtp::{
    CryptoPolicy, EventRecord, KeyLimit, PacketKind, SecurityServices, Session, SrtpError,
    SrtpEvent, SrtpProfile, SsrcSelector, StreamPolicy, init,
};

const SSRC: u32 = 0x0102_0304;
const KEY: [u8; 30] = [0x5a; 30];

fn rtp(ssrc: u32, seq: u16, payload: &[u8]) -> Vec<u8> {
    let mut p = Vec::new();
    p.write_u8(0x80).unwrap(); // V=2
    p.write_u8(96).unwrap(); // PT
    p.write_u16::<BigEndian>(seq).unwrap();
    p.write_u32::<BigEndian>(u32::from(seq) * 160).unwrap();
    p.write_u32::<BigEndian>(ssrc).unwrap();
    p.extend_from_slice(payload);
    p
}

fn rtcp_sr(ssrc: u32) -> Vec<u8> {
    let mut p = Vec::new();
    p.write_u8(0x80).unwrap();
    p.write_u8(200).unwrap(); // SR
    p.write_u16::<BigEndian>(6).unwrap();
    p.write_u32::<BigEndian>(ssrc).unwrap();
    p.extend_from_slice(&[0x11; 20]);
    p
}

fn policy(ssrc: SsrcSelector) -> StreamPolicy {
    StreamPolicy::new(
        ssrc,
        CryptoPolicy::rtp_default(),
        CryptoPolicy::rtcp_default(),
        &KEY,
    )
}

fn create(policies: &[StreamPolicy]) -> Session {
    init(false).unwrap();
    Session::create(policies).unwrap()
}

fn pair(p: StreamPolicy) -> (Session, Session) {
    (create(std::slice::from_ref(&p)), create(&[p]))
}

fn recorder(session: &mut Session) -> Arc<Mutex<Vec<SrtpEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session.install_event_handler(Some(Arc::new(move |r: &EventRecord| {
        sink.lock().unwrap().push(r.event);
    })));
    seen
}

fn protect(tx: &mut Session, seq: u16) -> Vec<u8> {
    let mut p = rtp(SSRC, seq, b"some media payload");
    tx.protect_vec(&mut p).unwrap();
    p
}

#[test]
fn round_trip_reconstructs_packet() {
    let (mut tx, mut rx) = pair(policy(SsrcSelector::Specific(SSRC)));
    for seq in [1u16, 2, 3, 10, 7] {
        let plain = rtp(SSRC, seq, b"payload bytes");
        let mut p = plain.clone();
        tx.protect_vec(&mut p).unwrap();
        rx.unprotect_vec(&mut p).unwrap();
        assert_eq!(p, plain);
    }
}

#[test]
fn second_unprotect_is_replay() {
    let (mut tx, mut rx) = pair(policy(SsrcSelector::Specific(SSRC)));
    let protected = protect(&mut tx, 42);

    let mut first = protected.clone();
    rx.unprotect_vec(&mut first).unwrap();
    let mut second = protected;
    assert!(matches!(
        rx.unprotect_vec(&mut second),
        Err(SrtpError::ReplayFail { too_old: false, .. })
    ));
}

#[test]
fn window_boundary_is_32768_packets() {
    let (mut tx, mut rx) = pair(policy(SsrcSelector::Specific(SSRC)));
    let old = protect(&mut tx, 7232);
    let oldest_ok = protect(&mut tx, 7233);
    let _ = protect(&mut tx, 20000);
    let newest = protect(&mut tx, 40000);

    rx.unprotect_vec(&mut newest.clone()).unwrap();
    assert!(matches!(
        rx.unprotect_vec(&mut old.clone()),
        Err(SrtpError::ReplayFail { too_old: true, .. })
    ));
    rx.unprotect_vec(&mut oldest_ok.clone()).unwrap();
}

#[test]
fn tampering_fails_auth_without_poisoning_window() {
    let (mut tx, mut rx) = pair(policy(SsrcSelector::Specific(SSRC)));
    let protected = protect(&mut tx, 100);

    let mut body_flip = protected.clone();
    body_flip[14] ^= 0x01;
    assert_eq!(rx.unprotect_vec(&mut body_flip), Err(SrtpError::AuthFail(SSRC)));

    let mut tag_flip = protected.clone();
    let last = tag_flip.len() - 1;
    tag_flip[last] ^= 0x80;
    assert_eq!(rx.unprotect_vec(&mut tag_flip), Err(SrtpError::AuthFail(SSRC)));

    let mut original = protected;
    rx.unprotect_vec(&mut original).unwrap();
}

#[test]
fn wildcard_exclusivity() {
    init(false).unwrap();
    assert!(
        Session::create(&[
            policy(SsrcSelector::AnyInbound),
            policy(SsrcSelector::AnyOutbound)
        ])
        .is_ok()
    );
    assert!(matches!(
        Session::create(&[
            policy(SsrcSelector::AnyInbound),
            policy(SsrcSelector::AnyInbound)
        ]),
        Err(SrtpError::BadParameter(_))
    ));

    // An inbound wildcard never keys outbound traffic.
    let mut rx_only = create(&[policy(SsrcSelector::AnyInbound)]);
    let mut p = rtp(SSRC, 1, b"x");
    assert_eq!(rx_only.protect_vec(&mut p), Err(SrtpError::NoSuchStream(SSRC)));
}

#[test]
fn wildcards_spawn_streams_on_demand() {
    let mut tx = create(&[policy(SsrcSelector::AnyOutbound)]);
    let mut rx = create(&[policy(SsrcSelector::AnyInbound)]);

    for ssrc in [0xaaaa_0001u32, 0xaaaa_0002] {
        let plain = rtp(ssrc, 1, b"hello");
        let mut p = plain.clone();
        tx.protect_vec(&mut p).unwrap();
        rx.unprotect_vec(&mut p).unwrap();
        assert_eq!(p, plain);
    }
    assert_eq!(tx.stream_count(), 2);
    assert_eq!(rx.stream_count(), 2);
    rx.remove_stream(0xaaaa_0001u32).unwrap();
    assert_eq!(rx.stream_count(), 1);
}

#[test]
fn hard_limit_expires_after_k_packets() {
    const K: u64 = 5;
    let p = policy(SsrcSelector::Specific(SSRC)).with_key_limit(KeyLimit::new(K).unwrap());
    let mut tx = create(&[p]);
    let seen = recorder(&mut tx);

    for seq in 1..=K as u16 {
        protect(&mut tx, seq);
        let hard = seen
            .lock()
            .unwrap()
            .iter()
            .filter(|e| **e == SrtpEvent::KeyHardLimit)
            .count();
        assert_eq!(hard, usize::from(u64::from(seq) == K));
    }

    let mut p = rtp(SSRC, K as u16 + 1, b"late");
    assert_eq!(tx.protect_vec(&mut p), Err(SrtpError::KeyExpired(SSRC)));
    let events = seen.lock().unwrap();
    assert_eq!(
        events.iter().filter(|e| **e == SrtpEvent::KeyHardLimit).count(),
        1
    );
    assert_eq!(events[0], SrtpEvent::KeySoftLimit);
}

#[test]
fn reusing_a_stream_both_ways_is_a_collision() {
    let mut s = create(&[policy(SsrcSelector::Specific(SSRC))]);
    let seen = recorder(&mut s);

    let mut p = protect(&mut s, 9);
    assert!(matches!(
        s.unprotect_vec(&mut p),
        Err(SrtpError::ReplayFail { .. })
    ));
    assert_eq!(*seen.lock().unwrap(), vec![SrtpEvent::SsrcCollision]);

    s.install_event_handler(None);
    assert!(!s.has_event_handler());
}

#[test]
fn unknown_ssrc_is_no_such_stream() {
    let (_, mut rx) = pair(policy(SsrcSelector::Specific(SSRC)));
    let mut p = rtp(0xdead_beef, 1, b"??????????????");
    assert_eq!(rx.unprotect_vec(&mut p), Err(SrtpError::NoSuchStream(0xdead_beef)));
}

#[test]
fn remove_and_dealloc_errors() {
    let mut s = create(&[policy(SsrcSelector::Specific(SSRC))]);
    assert!(matches!(
        s.remove_stream(SsrcSelector::AnyOutbound),
        Err(SrtpError::BadParameter(_))
    ));
    assert_eq!(s.remove_stream(SSRC + 1), Err(SrtpError::NotFound(SSRC + 1)));
    s.dealloc().unwrap();
    assert!(matches!(s.dealloc(), Err(SrtpError::DeallocationFailure(_))));
    let mut p = rtp(SSRC, 1, b"x");
    assert!(matches!(
        s.protect_vec(&mut p),
        Err(SrtpError::DeallocationFailure(_))
    ));
}

#[test]
fn rollover_carries_across_sequence_wrap() {
    let (mut tx, mut rx) = pair(policy(SsrcSelector::Specific(SSRC)));
    let sent: Vec<_> = [65534u16, 0, 65535, 1]
        .into_iter()
        .map(|seq| (seq, protect(&mut tx, seq)))
        .collect();
    assert_eq!(tx.stream_roc(SSRC).unwrap(), 1);

    for (seq, mut p) in sent {
        rx.unprotect_vec(&mut p).unwrap();
        assert_eq!(rtp(SSRC, seq, b"some media payload"), p);
    }
    assert_eq!(rx.stream_roc(SSRC).unwrap(), 1);
}

#[test]
fn receiver_can_join_with_known_roc() {
    let (mut tx, mut rx) = pair(policy(SsrcSelector::Specific(SSRC)));
    tx.set_stream_roc(SSRC, 3).unwrap();
    let mut p = protect(&mut tx, 500);

    assert_eq!(rx.unprotect_vec(&mut p.clone()), Err(SrtpError::AuthFail(SSRC)));
    rx.set_stream_roc(SSRC, 3).unwrap();
    rx.unprotect_vec(&mut p).unwrap();
}

#[test]
fn srtcp_round_trip_and_replay() {
    let (mut tx, mut rx) = pair(policy(SsrcSelector::Specific(SSRC)));
    assert_eq!(tx.protect_rtcp_trailer_length(SSRC).unwrap(), 14);

    let plain = rtcp_sr(SSRC);
    let mut p = plain.clone();
    tx.protect_rtcp_vec(&mut p).unwrap();
    let protected = p.clone();
    rx.unprotect_rtcp_vec(&mut p).unwrap();
    assert_eq!(p, plain);

    let mut again = protected;
    assert!(matches!(
        rx.unprotect_rtcp_vec(&mut again),
        Err(SrtpError::ReplayFail { index: 1, .. })
    ));
    let h = rx.stream_handle(SSRC).unwrap();
    assert_eq!(rx.stream(h).unwrap().highest_rtcp_index(), Some(1));
}

#[test]
fn null_auth_policy_appends_nothing() {
    let mut p = policy(SsrcSelector::Specific(SSRC));
    p.rtp = CryptoPolicy::aes_cm_128_null_auth();
    let (mut tx, mut rx) = pair(p);

    let plain = rtp(SSRC, 3, b"encrypted only");
    let mut pkt = plain.clone();
    tx.protect_vec(&mut pkt).unwrap();
    assert_eq!(pkt.len(), plain.len());
    assert_ne!(pkt, plain);
    rx.unprotect_vec(&mut pkt).unwrap();
    assert_eq!(pkt, plain);
}

#[test]
fn auth_only_profile_keeps_payload_clear() {
    let p = StreamPolicy::from_profile(
        SsrcSelector::Specific(SSRC),
        SrtpProfile::NullSha1_80,
        &KEY,
    )
    .unwrap();
    let (mut tx, mut rx) = pair(p);

    let plain = rtp(SSRC, 3, b"signed only");
    let mut pkt = plain.clone();
    tx.protect_vec(&mut pkt).unwrap();
    assert_eq!(&pkt[..plain.len()], plain.as_slice());
    assert_eq!(pkt.len(), plain.len() + 10);
    rx.unprotect_vec(&mut pkt).unwrap();
    assert_eq!(pkt, plain);
}

#[test]
fn aes_256_round_trip() {
    let key = [0x3c; 46];
    let p = StreamPolicy::from_profile(
        SsrcSelector::Specific(SSRC),
        SrtpProfile::Aes256CmSha1_32,
        &key,
    )
    .unwrap();
    let (mut tx, mut rx) = pair(p);
    assert_eq!(tx.protect_trailer_length(SSRC).unwrap(), 4);

    let plain = rtp(SSRC, 77, b"a longer payload to cover more than one block");
    let mut pkt = plain.clone();
    tx.protect_vec(&mut pkt).unwrap();
    rx.unprotect_vec(&mut pkt).unwrap();
    assert_eq!(pkt, plain);
}

#[test]
fn profile_mapping() {
    let rtp = CryptoPolicy::from_profile(SrtpProfile::Aes128CmSha1_80, PacketKind::Rtp).unwrap();
    assert_eq!(rtp.cipher_key_len, 16);
    assert_eq!(rtp.auth_tag_len, 10);

    let null = CryptoPolicy::from_profile(SrtpProfile::NullSha1_80, PacketKind::Rtp).unwrap();
    assert_eq!(null.sec_serv, SecurityServices::Authentication);

    assert!(matches!(
        CryptoPolicy::from_profile(SrtpProfile::Reserved, PacketKind::Rtp),
        Err(SrtpError::BadParameter(_))
    ));
}

#[test]
fn rtp_index_exhaustion_expires_stream() {
    let mut tx = create(&[policy(SsrcSelector::Specific(SSRC))]);
    let seen = recorder(&mut tx);
    tx.set_stream_roc(SSRC, u32::MAX).unwrap();

    protect(&mut tx, 0xfffe);
    assert!(seen.lock().unwrap().is_empty());
    protect(&mut tx, 0xffff);
    assert_eq!(*seen.lock().unwrap(), vec![SrtpEvent::PacketIndexLimit]);

    let h = tx.stream_handle(SSRC).unwrap();
    assert!(tx.stream(h).unwrap().is_expired());
    let mut p = rtp(SSRC, 0, b"one too many");
    assert_eq!(tx.protect_vec(&mut p), Err(SrtpError::KeyExpired(SSRC)));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn sequence_jump_of_half_a_cycle_is_out_of_range() {
    let (mut tx, mut rx) = pair(policy(SsrcSelector::Specific(SSRC)));
    let mut first = protect(&mut tx, 100);
    rx.unprotect_vec(&mut first).unwrap();

    let mut p = rtp(SSRC, 100 + 0x8000, b"too far ahead");
    assert_eq!(
        tx.protect_vec(&mut p),
        Err(SrtpError::SequenceOutOfRange {
            ssrc: SSRC,
            seq: 100 + 0x8000
        })
    );

    // Built on a sender that never saw seq 100, so it protects cleanly.
    let (mut fresh_tx, _) = pair(policy(SsrcSelector::Specific(SSRC)));
    let mut far = protect(&mut fresh_tx, 100 + 0x8000);
    assert_eq!(
        rx.unprotect_vec(&mut far),
        Err(SrtpError::SequenceOutOfRange {
            ssrc: SSRC,
            seq: 100 + 0x8000
        })
    );
    assert!(SrtpError::SequenceOutOfRange { ssrc: SSRC, seq: 0 }.is_per_packet());

    let mut next = protect(&mut tx, 101);
    rx.unprotect_vec(&mut next).unwrap();
}
