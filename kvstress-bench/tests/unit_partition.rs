use kvstress_bench::partition::{partition, RemainderPolicy, WorkPartition};

fn assert_contiguous(parts: &[WorkPartition]) {
    let mut expected_start = 0;
    for p in parts {
        assert_eq!(p.start, expected_start, "gap or overlap at {p:?}");
        expected_start = p.start + p.count;
    }
}

#[test]
fn test_even_split() {
    let p = partition(10, 2, RemainderPolicy::Drop);
    assert_eq!(
        p.parts,
        vec![WorkPartition { start: 0, count: 5 }, WorkPartition { start: 5, count: 5 }]
    );
    assert_eq!(p.dropped, 0);
    assert_eq!(p.parts[1].indices(), 5..10);
}

#[test]
fn test_remainder_is_dropped() {
    let p = partition(7, 3, RemainderPolicy::Drop);
    let ranges: Vec<_> = p.parts.iter().map(|w| w.indices()).collect();
    assert_eq!(ranges, vec![0..2, 2..4, 4..6]);
    assert_eq!(p.assigned(), 6);
    assert_eq!(p.dropped, 1);
}

#[test]
fn test_remainder_is_spread_over_first_workers() {
    let p = partition(7, 3, RemainderPolicy::Spread);
    let ranges: Vec<_> = p.parts.iter().map(|w| w.indices()).collect();
    assert_eq!(ranges, vec![0..3, 3..5, 5..7]);
    assert_eq!(p.assigned(), 7);
    assert_eq!(p.dropped, 0);
}

#[test]
fn test_fewer_requests_than_workers() {
    let p = partition(2, 5, RemainderPolicy::Drop);
    assert_eq!(p.parts.len(), 5);
    assert!(p.parts.iter().all(|w| w.count == 0));
    assert_eq!(p.dropped, 2);

    let p = partition(2, 5, RemainderPolicy::Spread);
    let counts: Vec<u64> = p.parts.iter().map(|w| w.count).collect();
    assert_eq!(counts, vec![1, 1, 0, 0, 0]);
}

#[test]
fn test_assigned_plus_dropped_covers_total() {
    for total in [0u64, 1, 9, 100, 997, 200_000] {
        for concurrency in [1usize, 2, 3, 7, 20, 64] {
            let drop = partition(total, concurrency, RemainderPolicy::Drop);
            let c = concurrency as u64;
            assert_eq!(drop.parts.len(), concurrency);
            assert_eq!(drop.assigned(), (total / c) * c);
            assert_eq!(drop.dropped, total % c);
            assert_contiguous(&drop.parts);

            let spread = partition(total, concurrency, RemainderPolicy::Spread);
            assert_eq!(spread.assigned(), total);
            assert_contiguous(&spread.parts);
        }
    }
}
