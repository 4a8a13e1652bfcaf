use keyed_pool::{Config, GroupManager};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Instant,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let now = Instant::now();
    let manager = match GroupManager::with_config(Config::cpu_bound()) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = %e, "invalid config");
            return;
        }
    };

    let orders = Arc::new(AtomicUsize::new(0));
    let group = {
        let orders = orders.clone();
        manager.new_group(move |_key: &str, amount: u64| {
            orders.fetch_add(amount as usize, Ordering::Relaxed);
        })
    };

    for i in 0..1_000_000u64 {
        let key = format!("account-{}", i % 1_000);
        if let Err(e) = group.submit(key, 1) {
            tracing::error!(error = %e, "submit failed");
            break;
        }
    }

    group.wait_all();
    let (submitted, done) = group.total_counts();
    manager.stop_all();

    println!(
        "processed {done}/{submitted} jobs ({} total) in {:?}",
        orders.load(Ordering::Relaxed),
        now.elapsed()
    );
}
