use std::collections::HashMap;
use std::time::Duration;

use quaero_core::test_support::{FailingWorker, FakeWorker};
use quaero_core::{FakeClock, JobStatus};
use quaero_eventbus::EventBus;
use quaero_queue::MemoryQueue;
use quaero_store::MemoryJobStore;

use super::*;

fn setup(workers: WorkerRegistry) -> (Arc<JobManager<FakeClock>>, WorkerPool<FakeClock>, Arc<MemoryQueue>) {
    let store = Arc::new(MemoryJobStore::new());
    let queue = Arc::new(MemoryQueue::new(3));
    let bus = EventBus::new();
    let manager = Arc::new(JobManager::new(
        Arc::clone(&store) as Arc<dyn quaero_store::JobStore>,
        Arc::clone(&queue) as Arc<dyn Queue>,
        bus,
        FakeClock::new(),
    ));
    let pool = WorkerPool::new(
        Arc::clone(&manager),
        Arc::clone(&queue) as Arc<dyn Queue>,
        workers,
        2,
        Duration::from_secs(30),
        Duration::from_millis(50),
    );
    (manager, pool, queue)
}

#[tokio::test]
async fn successful_worker_completes_the_job() {
    let mut workers: WorkerRegistry = HashMap::new();
    workers.insert("crawler_url".into(), Arc::new(FakeWorker::new()));
    let (manager, pool, _queue) = setup(workers);

    let job = manager
        .create_parent_job("crawler_url", None, Vec::new(), HashMap::new(), true)
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let mut tasks = pool.spawn(cancel.clone());
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if manager.get_job(&job.id).await.unwrap().status == JobStatus::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    cancel.cancel();
    while tasks.join_next().await.is_some() {}
}

#[tokio::test]
async fn failing_worker_fails_the_job_and_deletes_the_message() {
    let mut workers: WorkerRegistry = HashMap::new();
    workers.insert("crawler_url".into(), Arc::new(FailingWorker::new("boom")));
    let (manager, pool, _queue) = setup(workers);

    let job = manager
        .create_parent_job("crawler_url", None, Vec::new(), HashMap::new(), true)
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let mut tasks = pool.spawn(cancel.clone());
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if manager.get_job(&job.id).await.unwrap().status == JobStatus::Failed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    let fetched = manager.get_job(&job.id).await.unwrap();
    assert_eq!(fetched.error.as_deref(), Some("boom"));
    cancel.cancel();
    while tasks.join_next().await.is_some() {}
}

#[tokio::test]
async fn unroutable_job_type_fails_immediately() {
    let (manager, pool, _queue) = setup(HashMap::new());
    let job = manager
        .create_parent_job("mystery_type", None, Vec::new(), HashMap::new(), true)
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let mut tasks = pool.spawn(cancel.clone());
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if manager.get_job(&job.id).await.unwrap().status == JobStatus::Failed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    cancel.cancel();
    while tasks.join_next().await.is_some() {}
}

#[tokio::test]
async fn reap_dead_letters_fails_jobs_past_the_redelivery_limit() {
    let queue = Arc::new(MemoryQueue::new(1));
    let store = Arc::new(MemoryJobStore::new());
    let bus = EventBus::new();
    let manager = Arc::new(JobManager::new(
        Arc::clone(&store) as Arc<dyn quaero_store::JobStore>,
        Arc::clone(&queue) as Arc<dyn Queue>,
        bus,
        FakeClock::new(),
    ));
    let pool = WorkerPool::new(
        Arc::clone(&manager),
        Arc::clone(&queue) as Arc<dyn Queue>,
        HashMap::new(),
        1,
        Duration::from_millis(20),
        Duration::from_millis(50),
    );

    let job = manager
        .create_parent_job("crawler_url", None, Vec::new(), HashMap::new(), true)
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    // redelivery_limit=1: first receive succeeds, second exceeds the limit
    // and dead-letters the message without ever running a worker.
    for _ in 0..2 {
        match queue.receive(Duration::from_millis(5), &cancel).await.unwrap() {
            Received::Message(_, _) => {}
            Received::Cancelled => panic!("unexpected cancellation"),
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    pool.reap_dead_letters(queue.as_ref()).await.unwrap();
    assert_eq!(manager.get_job(&job.id).await.unwrap().status, JobStatus::Failed);
}
