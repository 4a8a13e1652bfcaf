#[cfg(test)]
mod tests {
    use keyed_pool::{Config, Executor, GroupManager};
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        thread,
        time::{Duration, Instant},
    };

    fn measure<F, T>(name: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let result = f();
        println!("✓ {}: {:?}", name, start.elapsed());
        result
    }

    /// Records the last sequence number seen per key and counts violations.
    #[derive(Default)]
    struct OrderCheck {
        last: Mutex<HashMap<String, u64>>,
        violations: AtomicUsize,
    }

    impl OrderCheck {
        fn observe(&self, key: &str, seq: u64) {
            let mut last = self.last.lock().unwrap();
            if let Some(prev) = last.insert(key.to_owned(), seq) {
                if prev + 1 != seq {
                    self.violations.fetch_add(1, Ordering::Relaxed);
                }
            } else if seq != 0 {
                self.violations.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn load_test_1_many_keys_small_jobs() {
        println!("\n=== LOAD TEST 1: 100k jobs over 1000 keys ===");
        let check = Arc::new(OrderCheck::default());
        let exec = {
            let check = check.clone();
            Executor::new(8, 64, move |key: &str, seq: u64| check.observe(key, seq)).unwrap()
        };

        measure("100k jobs", || {
            for seq in 0..100u64 {
                for k in 0..1_000 {
                    exec.submit(format!("key-{k}"), seq).unwrap();
                }
            }
            exec.wait_all();
        });

        assert_eq!(exec.total_counts(), (100_000, 100_000));
        assert_eq!(check.violations.load(Ordering::Relaxed), 0);
        let metrics = exec.metrics();
        assert_eq!(metrics.failed, 0);
        println!("  per worker: {:?}", exec.snapshot_counts());
    }

    #[test]
    fn load_test_2_concurrent_submitters() {
        println!("\n=== LOAD TEST 2: 8 submitter threads ===");
        let check = Arc::new(OrderCheck::default());
        let exec = {
            let check = check.clone();
            Executor::with_config(Config::io_bound(), move |key: &str, seq: u64| {
                check.observe(key, seq)
            })
            .unwrap()
        };

        measure("8 x 10k jobs", || {
            thread::scope(|s| {
                for t in 0..8 {
                    let exec = &exec;
                    s.spawn(move || {
                        for seq in 0..1_000u64 {
                            for k in 0..10 {
                                exec.submit(format!("t{t}-k{k}"), seq).unwrap();
                            }
                        }
                    });
                }
            });
            exec.wait_all();
        });

        assert_eq!(exec.total_counts(), (80_000, 80_000));
        assert_eq!(check.violations.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn load_test_3_slow_jobs_with_backpressure() {
        println!("\n=== LOAD TEST 3: 2k jobs @ 1ms, shallow queues ===");
        let done = Arc::new(AtomicUsize::new(0));
        let exec = {
            let done = done.clone();
            Executor::new(16, 2, move |_: &str, _: u32| {
                thread::sleep(Duration::from_millis(1));
                done.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap()
        };

        measure("2k slow jobs", || {
            for i in 0..2_000u32 {
                exec.submit(format!("session-{}", i % 64), i).unwrap();
            }
            exec.wait_all();
        });

        assert_eq!(done.load(Ordering::Relaxed), 2_000);
        exec.shutdown();
    }

    #[test]
    fn load_test_4_groups_in_parallel() {
        println!("\n=== LOAD TEST 4: 4 groups, 25k jobs each ===");
        let manager = GroupManager::with_config(Config::new(4, 32)).unwrap();
        let checks: Vec<Arc<OrderCheck>> = (0..4).map(|_| Arc::default()).collect();
        let groups: Vec<_> = checks
            .iter()
            .map(|check| {
                let check = check.clone();
                manager.new_group(move |key: &str, seq: u64| check.observe(key, seq))
            })
            .collect();

        measure("4 x 25k jobs", || {
            thread::scope(|s| {
                for group in &groups {
                    s.spawn(move || {
                        for seq in 0..250u64 {
                            for k in 0..100 {
                                group.submit(format!("k{k}"), seq).unwrap();
                            }
                        }
                    });
                }
            });
            manager.wait_all();
        });

        for (group, check) in groups.iter().zip(&checks) {
            assert_eq!(group.total_counts(), (25_000, 25_000));
            assert_eq!(check.violations.load(Ordering::Relaxed), 0);
        }
        manager.stop_all();
    }
}
