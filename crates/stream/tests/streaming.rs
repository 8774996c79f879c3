use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use cellstream_stream::{
    CellCoord, PartitionError, PartitionSink, PartitionSource, Placement, RefreshPolicy,
    StreamConfig, StreamingCache, partition_key,
};
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Call {
    Load(CellCoord),
    Deregister(u64),
}

/// Shared record of every call the cache makes to its collaborators.
#[derive(Default)]
struct CallLog {
    calls: Vec<Call>,
    loads: Vec<CellCoord>,
    registered: HashMap<u64, CellCoord>,
    deregistered: Vec<u64>,
}

impl CallLog {
    fn live(&self) -> usize {
        self.registered.len() - self.deregistered.len()
    }

    fn deregistered_cells(&self) -> HashSet<CellCoord> {
        self.deregistered
            .iter()
            .map(|id| self.registered[id])
            .collect()
    }
}

struct FakeSource {
    log: Rc<RefCell<CallLog>>,
    missing: Rc<RefCell<HashSet<CellCoord>>>,
}

impl PartitionSource for FakeSource {
    type Data = CellCoord;

    fn load(&mut self, coord: CellCoord, namespace: &str) -> Result<CellCoord, PartitionError> {
        let mut log = self.log.borrow_mut();
        log.loads.push(coord);
        log.calls.push(Call::Load(coord));
        drop(log);
        if self.missing.borrow().contains(&coord) {
            return Err(PartitionError::not_found(partition_key(namespace, coord)));
        }
        Ok(coord)
    }
}

/// Handle that is deliberately neither `Clone` nor `Copy`.
struct Token(u64);

struct FakeSink {
    log: Rc<RefCell<CallLog>>,
    next: u64,
}

impl PartitionSink for FakeSink {
    type Data = CellCoord;
    type Handle = Token;

    fn register(&mut self, data: CellCoord, _placement: Placement) -> Token {
        self.next += 1;
        self.log.borrow_mut().registered.insert(self.next, data);
        Token(self.next)
    }

    fn deregister(&mut self, handle: Token) {
        let mut log = self.log.borrow_mut();
        assert!(
            !log.deregistered.contains(&handle.0),
            "handle {} deregistered twice",
            handle.0
        );
        log.deregistered.push(handle.0);
        log.calls.push(Call::Deregister(handle.0));
    }
}

struct Harness {
    log: Rc<RefCell<CallLog>>,
    missing: Rc<RefCell<HashSet<CellCoord>>>,
    pos: Rc<Cell<Vec3>>,
}

type FakeCache = StreamingCache<FakeSource, FakeSink, Box<dyn Fn() -> Vec3>>;

fn harness(config: StreamConfig, start: Vec3) -> (Harness, FakeCache) {
    harness_with_holes(config, start, &[])
}

fn harness_with_holes(
    config: StreamConfig,
    start: Vec3,
    holes: &[CellCoord],
) -> (Harness, FakeCache) {
    let log = Rc::new(RefCell::new(CallLog::default()));
    let missing = Rc::new(RefCell::new(holes.iter().copied().collect()));
    let pos = Rc::new(Cell::new(start));
    let reader = pos.clone();
    let tracker: Box<dyn Fn() -> Vec3> = Box::new(move || reader.get());
    let cache = StreamingCache::start(
        config,
        FakeSource {
            log: log.clone(),
            missing: missing.clone(),
        },
        FakeSink {
            log: log.clone(),
            next: 0,
        },
        Some(tracker),
    )
    .unwrap();
    (Harness { log, missing, pos }, cache)
}

fn column(x: i32) -> HashSet<CellCoord> {
    (-1..=1).map(|z| CellCoord::new(x, z)).collect()
}

#[test]
fn second_refresh_without_movement_does_nothing() {
    let (h, mut cache) = harness(StreamConfig::default(), Vec3::new(25.0, 0.0, 25.0));
    assert_eq!(h.log.borrow().loads.len(), 9);

    let report = cache.refresh();
    assert!(report.is_noop());
    assert_eq!(h.log.borrow().loads.len(), 9);
    assert!(h.log.borrow().deregistered.is_empty());
}

#[test]
fn moving_one_cell_swaps_one_column() {
    let (h, mut cache) = harness(StreamConfig::default(), Vec3::new(25.0, 0.0, 25.0));
    let before: HashSet<CellCoord> = cache.registry().cells().collect();

    h.pos.set(Vec3::new(75.0, 0.0, 25.0));
    let report = cache.refresh();

    let unloaded: HashSet<CellCoord> = report.unloaded.iter().copied().collect();
    let loaded: HashSet<CellCoord> = report.loaded.iter().copied().collect();
    assert_eq!(unloaded, column(-1));
    assert_eq!(loaded, column(2));

    let log = h.log.borrow();
    assert_eq!(log.loads.len(), 12);
    assert_eq!(log.deregistered_cells(), column(-1));

    let kept: HashSet<CellCoord> = before.difference(&column(-1)).copied().collect();
    assert_eq!(kept.len(), 6);
    for cell in &kept {
        assert_eq!(log.loads.iter().filter(|c| *c == cell).count(), 1);
        assert!(cache.is_active(*cell));
    }
}

#[test]
fn refresh_unloads_before_loading() {
    let (h, mut cache) = harness(StreamConfig::default(), Vec3::new(25.0, 0.0, 25.0));
    let before = h.log.borrow().calls.len();

    // Diagonal move: five cells leave the window and five enter.
    h.pos.set(Vec3::new(75.0, 0.0, 75.0));
    let report = cache.refresh();
    assert_eq!(report.unloaded.len(), 5);
    assert_eq!(report.loaded.len(), 5);

    let log = h.log.borrow();
    let calls = &log.calls[before..];
    assert_eq!(calls.len(), 10);
    let last_deregister = calls
        .iter()
        .rposition(|c| matches!(c, Call::Deregister(_)))
        .unwrap();
    let first_load = calls
        .iter()
        .position(|c| matches!(c, Call::Load(_)))
        .unwrap();
    assert!(last_deregister < first_load, "calls out of order: {calls:?}");
}

#[test]
fn missing_partition_is_skipped_and_retried() {
    let config = StreamConfig {
        refresh_interval_seconds: 0.0,
        refresh_policy: RefreshPolicy::EveryInterval,
        ..StreamConfig::default()
    };
    let hole = CellCoord::new(1, 0);
    let (h, mut cache) = harness_with_holes(config, Vec3::new(25.0, 0.0, 25.0), &[hole]);

    assert!(!cache.is_active(hole));
    assert_eq!(cache.registry().len(), 8);
    assert_eq!(cache.last_report().missing, vec![hole]);

    let report = cache.tick(Duration::from_millis(16)).unwrap();
    assert_eq!(report.missing, vec![hole]);
    assert!(report.loaded.is_empty());
    let hole_loads = h.log.borrow().loads.iter().filter(|c| **c == hole).count();
    assert_eq!(hole_loads, 2);

    h.missing.borrow_mut().clear();
    cache.tick(Duration::from_millis(16));
    assert!(cache.is_active(hole));
}

#[test]
fn missing_partition_leaving_window_is_forgotten() {
    let (h, mut cache) = harness(StreamConfig::default(), Vec3::new(25.0, 0.0, 25.0));
    let far_hole = CellCoord::new(3, 0);
    h.missing.borrow_mut().insert(far_hole);

    h.pos.set(Vec3::new(125.0, 0.0, 25.0));
    assert_eq!(cache.refresh().missing, vec![far_hole]);

    h.pos.set(Vec3::new(25.0, 0.0, 25.0));
    let report = cache.refresh();
    assert!(report.missing.is_empty());
    assert_eq!(cache.registry().len(), 9);
}

#[test]
fn teardown_releases_each_handle_exactly_once() {
    let (h, mut cache) = harness(StreamConfig::default(), Vec3::new(25.0, 0.0, 25.0));
    h.pos.set(Vec3::new(75.0, 0.0, 75.0));
    cache.refresh();
    let active = cache.registry().len();
    assert_eq!(h.log.borrow().live(), active);

    assert_eq!(cache.shutdown(), active);
    let log = h.log.borrow();
    assert_eq!(log.live(), 0);
    assert_eq!(log.deregistered.len(), log.registered.len());
}

#[test]
fn dropping_cache_tears_down() {
    let (h, cache) = harness(StreamConfig::default(), Vec3::ZERO);
    drop(cache);
    assert_eq!(h.log.borrow().live(), 0);
}

#[test]
fn throttled_ticks_follow_walking_tracker() {
    let config = StreamConfig {
        refresh_interval_seconds: 0.25,
        ..StreamConfig::default()
    };
    let (h, mut cache) = harness(config, Vec3::new(25.0, 0.0, 25.0));
    let dt = Duration::from_millis(50);
    let mut refreshes = 0;
    for step in 0..100 {
        h.pos.set(Vec3::new(25.0 + step as f32 * 2.0, 0.0, 25.0));
        if cache.tick(dt).is_some() {
            refreshes += 1;
        }
        assert!(h.log.borrow().live() <= 9);
    }
    // 200 units walked at cell size 50: the tracker crossed into cells 1..=4.
    assert!(refreshes >= 4);
    assert!(refreshes <= 20);
    assert_eq!(cache.center(), Some(CellCoord::new(4, 0)));
    assert_eq!(h.log.borrow().live(), 9);
}
