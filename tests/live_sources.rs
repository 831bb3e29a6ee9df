//! End-to-end: real sampler and probes against an in-process HTTP server,
//! applied to a monitor the way the dashboard does it.

use std::time::{Duration, Instant};

use drainwatch::{
    Channel, DeviceStatus, Endpoints, FlowMonitor, ReadingOrigin, Rounding, SamplerConfig,
    SourceControl, SourceEvent, SourceHub, SourceTiming, ThresholdPolicy,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn serve(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{}/api/data", addr)
}

fn timing() -> SourceTiming {
    SourceTiming {
        update_interval: Duration::from_millis(50),
        request_timeout: Duration::from_millis(500),
        settle_delay: Duration::from_millis(100),
    }
}

/// Poll the hub into the monitor until `done` holds or two seconds pass.
async fn drive_until(
    hub: &mut SourceHub,
    monitor: &mut FlowMonitor,
    done: impl Fn(&FlowMonitor) -> bool,
) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        while let Some(event) = hub.poll() {
            monitor.apply(event, Instant::now());
        }
        if done(monitor) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_live_flow_raises_warning() {
    let url = serve("200 OK", r#"{"flowRate": 175.5, "totalVolume": 12.0}"#).await;
    let endpoints = Endpoints {
        flow_url: url.clone(),
        ..Endpoints::default()
    };
    let mut monitor =
        FlowMonitor::new(endpoints, 150.0, ThresholdPolicy::immediate(), Rounding::OnRecord)
            .unwrap();
    let mut hub = SourceHub::start(timing(), SamplerConfig::new(url, 0)).unwrap();

    assert!(drive_until(&mut hub, &mut monitor, |m| m.current_flow().is_some()).await);

    assert_eq!(monitor.current_flow(), Some(175.5));
    assert_eq!(monitor.total_volume(), Some(12.0));
    assert_eq!(monitor.latest().unwrap().origin, ReadingOrigin::Live);
    assert!(monitor.warning_active());
    assert_eq!(
        monitor.device(Channel::FlowMeter),
        DeviceStatus {
            using_real_data: true,
            connected: true
        }
    );
}

#[tokio::test]
async fn test_switching_to_a_dead_endpoint_disconnects() {
    let mut monitor = FlowMonitor::new(
        Endpoints::default(),
        150.0,
        ThresholdPolicy::immediate(),
        Rounding::OnRecord,
    )
    .unwrap();
    let mut hub = SourceHub::start(timing(), SamplerConfig::new("", 0)).unwrap();

    assert!(drive_until(&mut hub, &mut monitor, |m| !m.history().is_empty()).await);
    assert_eq!(monitor.device(Channel::FlowMeter), DeviceStatus::default());

    let dead = serve("503 Service Unavailable", "busy").await;
    let generation = monitor.reconfigure(Endpoints {
        flow_url: dead.clone(),
        ..Endpoints::default()
    });
    hub.reconfigure(&dead, generation);

    let disconnected = DeviceStatus {
        using_real_data: true,
        connected: false,
    };
    assert!(
        drive_until(&mut hub, &mut monitor, |m| m.device(Channel::FlowMeter) == disconnected)
            .await
    );
    // No synthetic fallback once an endpoint is configured.
    assert!(monitor.history().is_empty());
    assert_eq!(monitor.last_error().unwrap().error.kind(), "http");
}

#[tokio::test]
async fn test_camera_and_bot_probes() {
    let camera = serve("200 OK", "frame").await;
    let bot = serve("200 OK", "<html></html>").await;
    let mut monitor = FlowMonitor::new(
        Endpoints {
            camera_url: camera,
            bot_url: bot,
            ..Endpoints::default()
        },
        150.0,
        ThresholdPolicy::immediate(),
        Rounding::OnRecord,
    )
    .unwrap();
    let mut hub = SourceHub::start(timing(), SamplerConfig::new("", 0)).unwrap();

    for request in monitor.probe_requests() {
        hub.probe(request);
    }
    let camera_up = |m: &FlowMonitor| m.device(Channel::DrainCamera).connected;
    assert!(drive_until(&mut hub, &mut monitor, camera_up).await);

    // Docked: no bot probe, interface stays disconnected.
    assert!(monitor.bot_probe().is_none());
    assert!(!monitor.device(Channel::BotCamera).connected);

    assert!(monitor.deploy_bot());
    hub.probe(monitor.bot_probe().unwrap());
    let bot_up = |m: &FlowMonitor| m.device(Channel::BotCamera).connected;
    assert!(drive_until(&mut hub, &mut monitor, bot_up).await);
}

#[tokio::test]
async fn test_stale_samples_after_reconfigure_are_ignored() {
    let mut monitor = FlowMonitor::new(
        Endpoints::default(),
        150.0,
        ThresholdPolicy::immediate(),
        Rounding::OnRecord,
    )
    .unwrap();
    monitor.reconfigure(Endpoints::default());

    // Generation 0 predates the reconfigure.
    let events = monitor.apply(
        SourceEvent::Sample {
            generation: 0,
            outcome: Ok(drainwatch::Reading::new(99.0, None, ReadingOrigin::Synthetic)),
        },
        Instant::now(),
    );
    assert!(events.is_empty());
    assert!(monitor.history().is_empty());
}
