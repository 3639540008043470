use std::collections::HashMap;
use std::time::Duration;

use quaero_core::{Event, FakeClock, JobId};
use quaero_eventbus::EventBus;
use quaero_queue::MemoryQueue;
use quaero_store::MemoryJobStore;

use super::*;

fn setup() -> (Arc<JobManager<FakeClock>>, Arc<EventBus>) {
    let store = Arc::new(MemoryJobStore::new());
    let queue = Arc::new(MemoryQueue::new(3));
    let bus = EventBus::new();
    let manager = Arc::new(JobManager::new(
        Arc::clone(&store) as Arc<dyn quaero_store::JobStore>,
        Arc::clone(&queue) as Arc<dyn quaero_queue::Queue>,
        Arc::clone(&bus),
        FakeClock::new(),
    ));
    (manager, bus)
}

#[tokio::test]
async fn document_saved_events_increment_the_parents_document_count() {
    let (manager, bus) = setup();
    let parent = manager
        .create_parent_job("parent", Some("crawl".into()), Vec::new(), HashMap::new(), false)
        .await
        .unwrap();

    let listener = DocumentCountListener::spawn(Arc::clone(&manager), Arc::clone(&bus));

    for _ in 0..3 {
        bus.publish(Event::DocumentSaved { job_id: JobId::new(), parent_id: parent.id, document_id: "doc".into() });
    }

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if manager.get_job(&parent.id).await.unwrap().document_count() == 3 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    listener.stop();
}

#[tokio::test]
async fn events_for_unrelated_topics_are_ignored() {
    let (manager, bus) = setup();
    let parent = manager
        .create_parent_job("parent", Some("crawl".into()), Vec::new(), HashMap::new(), false)
        .await
        .unwrap();
    let listener = DocumentCountListener::spawn(Arc::clone(&manager), Arc::clone(&bus));

    bus.publish(Event::JobProgress { parent_id: parent.id, total: 1, completed: 0, failed: 0 });
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(manager.get_job(&parent.id).await.unwrap().document_count(), 0);
    listener.stop();
}
