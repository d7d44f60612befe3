use {
    std::{collections::BTreeSet, thread},
    usage_atlas::{
        Atlas,
        AtlasBuilder,
        AtlasConfig,
        ClusterReport,
        Node,
        RenderSpan,
        ResourceSpan,
        UsageError,
    },
};

const CAPTURED: &str = r#"{
    "nodes": [
        {"rack": "/r0", "nodeId": "rr329.narwhal.pdl.cmu.edu:52702"},
        {"rack": "/r0", "nodeId": "rr369.narwhal.pdl.cmu.edu:54246"},
        {"rack": "/r1", "nodeId": "rr266.narwhal.pdl.cmu.edu:53903"},
        {"rack": "/r1", "nodeId": "rr319.narwhal.pdl.cmu.edu:49253"}
    ],
    "apps": [
        {
            "appName": "sort",
            "applicationId": "application_0010",
            "startTime": 1000,
            "finishTime": 0,
            "state": "RUNNING",
            "containers": [
                {"node": "rr329.narwhal.pdl.cmu.edu:52702", "creationTime": 1000, "finishTime": 0},
                {"node": "rr266.narwhal.pdl.cmu.edu:53903", "creationTime": 1500, "finishTime": 0}
            ]
        },
        {
            "appName": "grep",
            "applicationId": "application_0012",
            "startTime": 1200,
            "finishTime": 0,
            "state": "RUNNING",
            "containers": [
                {"node": "rr329.narwhal.pdl.cmu.edu:52702", "creationTime": 1500, "finishTime": 0},
                {"node": "rr999.narwhal.pdl.cmu.edu:1", "creationTime": 1500, "finishTime": 0}
            ]
        },
        {
            "appName": "old",
            "applicationId": "application_0001",
            "startTime": 10,
            "finishTime": 20,
            "state": "FINISHED"
        }
    ]
}"#;

fn captured() -> (Atlas, ClusterReport) {
    let report: ClusterReport = serde_json::from_str(CAPTURED).expect("Failed to parse report");
    let atlas = AtlasBuilder::new(report.nodes.iter().map(|node| node.to_node()))
        .with_slice_width(100)
        .build()
        .expect("Failed to create atlas");
    (atlas, report)
}

fn spans(spans: &[ResourceSpan]) -> Vec<(usize, u64, u64)> {
    spans
        .iter()
        .map(|ResourceSpan { resource, span: RenderSpan { from, to } }| (*resource, *from, *to))
        .collect()
}

#[test]
fn atlas_builder() {
    let nodes = vec![
        Node::new("n1.example.com", Some("/r0")),
        Node::new("n2.example.com", Some("/r0")),
    ];

    assert!(AtlasBuilder::new(nodes.clone()).build().is_ok());
    assert!(Atlas::new(nodes.clone()).is_ok());

    assert_eq!(
        AtlasBuilder::new(nodes.clone()).with_slice_width(0).build().err(),
        Some(UsageError::ZeroSliceWidth)
    );
    assert_eq!(
        AtlasBuilder::new(nodes.clone()).with_chart_width(0).build().err(),
        Some(UsageError::InvalidChartWidth)
    );
    assert_eq!(
        AtlasBuilder::new(nodes.clone())
            .with_config(AtlasConfig {
                pixels_per_slice: 0,
                ..Default::default()
            })
            .build()
            .err(),
        Some(UsageError::ZeroSliceWidth)
    );

    let mut duplicated = nodes.clone();
    duplicated.push(Node::new("n1.other.com", Some("/r1")));
    assert_eq!(
        AtlasBuilder::new(duplicated).build().err(),
        Some(UsageError::DuplicateNode("n1".to_string()))
    );

    let atlas = AtlasBuilder::new(nodes)
        .with_pixels_per_slice(5)
        .with_chart_width(500)
        .build()
        .unwrap();
    assert_eq!(atlas.config().pixels_per_slice, 5);
    assert_eq!(atlas.config().chart_width_px, 500);
    assert_eq!(atlas.pool().len(), 2);
}

#[test]
fn refresh_cycle() {
    let (atlas, report) = captured();

    // Nothing published yet.
    let initial = atlas.snapshot();
    assert_eq!(initial.slice_width(), None);
    assert!(atlas.spans("application_0010").is_empty());

    let snapshot = atlas.refresh(&report.apps, 2000).unwrap();
    assert_eq!(snapshot.now(), 2000);
    assert_eq!(snapshot.window(), Some(&(1000..2000)));
    assert_eq!(snapshot.slice_width(), Some(100));
    // Claim on rr999 is outside of the pool.
    assert_eq!(snapshot.skipped(), 1);
    assert_eq!(
        snapshot.redraw(),
        &BTreeSet::from(["application_0010".to_string(), "application_0012".to_string()])
    );

    let rr329 = snapshot.usage().node("rr329").unwrap();
    let segments = rr329
        .iter()
        .map(|s| (s.from, s.to, s.payload.len()))
        .collect::<Vec<_>>();
    assert_eq!(segments, vec![(1000, 1500, 1), (1500, 2000, 2)]);
    assert!(snapshot.usage().node("rr369").unwrap().is_empty());

    let r0 = snapshot.usage().rack("r0").unwrap();
    assert_eq!(r0.occupied_fraction(1200), 0.5);
    let load = r0.load().iter().map(|s| (s.from, s.to, s.payload.0)).collect::<Vec<_>>();
    assert_eq!(load, vec![(1000, 1500, 1), (1500, 2000, 2)]);

    // Resource indexes: r0 = [rr329, rr369], r1 = [rr266, rr319].
    assert_eq!(
        spans(&atlas.spans("application_0010")),
        vec![
            (0, 1000, 1500),
            (0, 1500, 1600),
            (0, 1700, 1800),
            (0, 1900, 2000),
            (2, 1500, 2000),
        ]
    );
    assert_eq!(
        spans(&atlas.spans("application_0012")),
        vec![(0, 1600, 1700), (0, 1800, 1900)]
    );
    assert!(atlas.spans("application_0001").is_empty());

    // Readers keep the snapshot they hold while the atlas moves on.
    let held = atlas.snapshot();
    let next = atlas.refresh(&report.apps, 3000).unwrap();
    assert_eq!(held.now(), 2000);
    assert_eq!(next.now(), 3000);
    assert_eq!(next.window(), Some(&(1000..3000)));
    assert_eq!(atlas.snapshot().now(), 3000);
}

#[test]
fn finished_apps_keep_last_usage() {
    let (atlas, mut report) = captured();
    atlas.refresh(&report.apps, 2000).unwrap();

    report.apps.retain(|app| app.application_id == "application_0012");
    report.apps[0].state = usage_atlas::AppState::Finished;
    report.apps[0].finish_time = 2100;
    let snapshot = atlas.refresh(&report.apps, 3000).unwrap();

    // application_0010 is not reported any more, so its usage stays as last
    // seen; application_0012 is frozen at its last running refresh.
    let rr329 = snapshot.usage().node("rr329").unwrap();
    assert_eq!(rr329.span(), Some(1000..2000));
    assert_eq!(
        snapshot.redraw(),
        &BTreeSet::from(["application_0010".to_string(), "application_0012".to_string()])
    );
}

#[test]
fn concurrent_readers() {
    let (atlas, report) = captured();
    thread::scope(|scope| {
        scope.spawn(|| {
            for now in (2000..2100).step_by(10) {
                atlas.refresh(&report.apps, now).unwrap();
            }
        });
        for _ in 0..2 {
            scope.spawn(|| {
                for _ in 0..100 {
                    let snapshot = atlas.snapshot();
                    for (_, usage) in snapshot.usage().nodes() {
                        assert_eq!(usage.check_invariants(), Ok(()));
                        if let Some(window) = snapshot.window() {
                            assert!(usage.iter().all(|s| s.to <= window.end));
                        }
                    }
                }
            });
        }
    });
    assert_eq!(atlas.snapshot().now(), 2090);
}
