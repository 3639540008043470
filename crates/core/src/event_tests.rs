// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn topic_names_match_variant() {
    let ev = Event::JobCreated {
        job_id: JobId::new(),
        parent_id: JobId::empty(),
        job_type: "crawler_url".into(),
        status: JobStatus::Pending,
    };
    assert_eq!(ev.topic(), "job_created");
}

#[test]
fn job_progress_reports_parent_as_job_id() {
    let parent = JobId::new();
    let ev = Event::JobProgress { parent_id: parent.clone(), total: 3, completed: 1, failed: 0 };
    assert_eq!(ev.job_id(), &parent);
}

#[test]
fn serializes_with_internally_tagged_type_field() {
    let ev = Event::DocumentSaved {
        job_id: JobId::new(),
        parent_id: JobId::new(),
        document_id: "doc-1".into(),
    };
    let json = serde_json::to_value(&ev).unwrap();
    assert_eq!(json["type"], "document_saved");
}
