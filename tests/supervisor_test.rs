//! Async runner scenarios: the supervisor owns the tunnel and is driven by
//! tokio against an in-memory adapter.
mod helpers;

use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};
use embedded_can::StandardId;
use helpers::{
    adapter_addr, can_packet, frame_in, host_addr, packet_tag, ping_reply, MemorySocket,
    TokioTimer,
};
use korri_can_udp::error::TunnelRunError;
use korri_can_udp::infra::ring::ByteRing;
use korri_can_udp::protocol::link::{
    config::TunnelConfig,
    health::{LinkState, LinkStatusCell},
    supervisor::{TunnelSupervisor, TunnelSupervisorParts},
    CanTunnel,
};
use korri_can_udp::protocol::transport::{
    can_frame::{CanFrame, ReceivedFrame},
    packet::PacketType,
};
use tokio::time::{sleep, timeout, Duration};

fn fast_config() -> TunnelConfig {
    TunnelConfig::builder()
        .with_tick_interval_ms(10)
        .with_heartbeat_ticks(5)
        .build()
        .expect("valid config")
}

/// Wait for the next CAN data datagram, skipping heartbeat pings.
async fn next_can_datagram(adapter: &mut MemorySocket) -> Vec<u8> {
    loop {
        let datagram = adapter.recv().await.expect("host socket alive");
        if packet_tag(&datagram) == PacketType::CAN_DATA {
            return datagram;
        }
    }
}

#[tokio::test]
async fn supervisor_forwards_frames_both_ways() {
    let (socket, mut adapter) = MemorySocket::create_pair(host_addr(), adapter_addr());
    let mut ring = ByteRing::<4096>::new();
    let pending = Channel::<NoopRawMutex, CanFrame, 16>::new();
    let received = Channel::<NoopRawMutex, ReceivedFrame, 16>::new();
    let status = LinkStatusCell::new();

    let tunnel = CanTunnel::new(
        socket,
        adapter_addr(),
        fast_config(),
        &mut ring,
        &pending,
        &status,
    );
    let supervisor = TunnelSupervisor::open(tunnel, TokioTimer::new(), Some(&received))
        .expect("tunnel opens");
    let TunnelSupervisorParts {
        handle,
        frames,
        mut runner,
    } = supervisor.into_parts();
    let mut frames = frames.expect("frame channel was provided");

    let scenario = async {
        let initial = adapter.recv().await.expect("initial ping");
        assert_eq!(packet_tag(&initial), PacketType::PING);

        adapter.send(&ping_reply(Some(0x00)));
        while handle.link_state() != LinkState::Good {
            sleep(Duration::from_millis(2)).await;
        }

        let inbound = CanFrame::data_frame(StandardId::new(0x0C1).unwrap(), &[1, 2, 3]).unwrap();
        adapter.send(&can_packet(&inbound));
        assert_eq!(frames.recv().await.frame, inbound);

        let outbound = CanFrame::data_frame(StandardId::new(0x3A0).unwrap(), &[0xCA, 0xFE]).unwrap();
        handle.send_frame(outbound).await;
        let datagram = next_can_datagram(&mut adapter).await;
        assert_eq!(frame_in(&datagram), outbound);
    };

    tokio::select! {
        result = runner.drive() => panic!("runner ended unexpectedly: {:?}", result),
        outcome = timeout(Duration::from_secs(2), scenario) => outcome.expect("scenario timed out"),
    }

    assert_eq!(runner.stats().frames_received, 1);
    assert_eq!(runner.stats().frames_sent, 1);
    assert_eq!(runner.dropped_frames(), 0);
}

#[tokio::test]
async fn silent_adapter_drops_link_state_to_unknown() {
    let (socket, mut adapter) = MemorySocket::create_pair(host_addr(), adapter_addr());
    let mut ring = ByteRing::<1024>::new();
    let pending = Channel::<NoopRawMutex, CanFrame, 4>::new();
    let status = LinkStatusCell::new();

    let tunnel = CanTunnel::new(
        socket,
        adapter_addr(),
        fast_config(),
        &mut ring,
        &pending,
        &status,
    );
    let supervisor =
        TunnelSupervisor::<_, _, _, 1024, 4, 1>::open(tunnel, TokioTimer::new(), None)
            .expect("tunnel opens");
    let TunnelSupervisorParts { handle, mut runner, .. } = supervisor.into_parts();

    let scenario = async {
        adapter.recv().await.expect("initial ping");
        adapter.send(&ping_reply(Some(0x04)));
        while handle.link_state() != LinkState::BusOff {
            sleep(Duration::from_millis(2)).await;
        }

        // The reply counts for the first window only; the second one is silent.
        while handle.link_state() != LinkState::Unknown {
            sleep(Duration::from_millis(5)).await;
        }
    };

    tokio::select! {
        result = runner.drive() => panic!("runner ended unexpectedly: {:?}", result),
        outcome = timeout(Duration::from_secs(2), scenario) => outcome.expect("scenario timed out"),
    }
    assert!(runner.stats().pings_sent >= 2);
}

#[tokio::test]
async fn full_frame_channel_counts_drops() {
    let (socket, adapter) = MemorySocket::create_pair(host_addr(), adapter_addr());
    let mut ring = ByteRing::<4096>::new();
    let pending = Channel::<NoopRawMutex, CanFrame, 4>::new();
    let received = Channel::<NoopRawMutex, ReceivedFrame, 2>::new();
    let status = LinkStatusCell::new();

    let tunnel = CanTunnel::new(
        socket,
        adapter_addr(),
        fast_config(),
        &mut ring,
        &pending,
        &status,
    );
    let supervisor = TunnelSupervisor::open(tunnel, TokioTimer::new(), Some(&received))
        .expect("tunnel opens");
    let TunnelSupervisorParts {
        frames, mut runner, ..
    } = supervisor.into_parts();
    let mut frames = frames.expect("frame channel was provided");

    let mut burst = Vec::new();
    for n in 0..5u16 {
        burst.extend(can_packet(
            &CanFrame::data_frame(StandardId::new(n).unwrap(), &[n as u8]).unwrap(),
        ));
    }
    adapter.send(&burst);

    let _ = timeout(Duration::from_millis(100), runner.drive()).await;

    assert_eq!(runner.stats().frames_received, 5);
    assert_eq!(runner.dropped_frames(), 3);
    assert_eq!(frames.try_recv().map(|r| r.frame.raw_id()), Some(0));
    assert_eq!(frames.try_recv().map(|r| r.frame.raw_id()), Some(1));
    assert!(frames.try_recv().is_none());
}

#[tokio::test]
async fn runner_reports_socket_failure_and_closed_tunnel() {
    let (socket, adapter) = MemorySocket::create_pair(host_addr(), adapter_addr());
    let mut ring = ByteRing::<1024>::new();
    let pending = Channel::<NoopRawMutex, CanFrame, 4>::new();
    let status = LinkStatusCell::new();

    let tunnel = CanTunnel::new(
        socket,
        adapter_addr(),
        fast_config(),
        &mut ring,
        &pending,
        &status,
    );
    let supervisor =
        TunnelSupervisor::<_, _, _, 1024, 4, 1>::open(tunnel, TokioTimer::new(), None)
            .expect("tunnel opens");
    let mut runner = supervisor.into_parts().runner;

    drop(adapter);
    let result = timeout(Duration::from_secs(1), runner.drive())
        .await
        .expect("runner stops on socket failure");
    assert!(matches!(result, Err(TunnelRunError::Receive(()))));

    runner.close().expect("tunnel was open");
    assert!(matches!(runner.drive().await, Err(TunnelRunError::Closed)));
}
