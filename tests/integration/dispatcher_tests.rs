//! End-to-end dispatcher scenarios against the in-memory store

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use bulkchange_rs::core::types::{
    AbortReason, ChangeType, Integration, JobStatus, RecordStatus, RunOutcome,
};
use bulkchange_rs::queue::ContinuationMessage;

use crate::common::fixtures::{DeviceFactory, JobFactory, RecordFactory};
use crate::common::{ScriptedCarrier, fast_worker, harness, harness_without_carrier};

#[tokio::test]
async fn scenario_a_all_records_succeed() {
    let h = harness(ScriptedCarrier::new(Integration::Jasper), fast_worker());
    h.store
        .insert_job(JobFactory::new_job(
            1,
            Integration::Jasper,
            ChangeType::StatusUpdate,
            3,
        ))
        .await;
    for (i, iccid) in ["8901", "8902", "8903"].iter().enumerate() {
        h.store
            .insert_record(RecordFactory::status_update(
                100 + i as i64,
                1,
                iccid,
                "deactive",
            ))
            .await;
        h.store
            .insert_device(DeviceFactory::with_iccid(i as i64 + 1, iccid, "active"))
            .await;
    }

    let outcome = h.engine.run(&ContinuationMessage::new(1)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed);

    let job = h.store.job(1).await;
    assert_eq!(job.status, JobStatus::Processed);
    assert_eq!(job.processed_count, 3);
    assert_eq!(job.error_count, 0);
    assert!(job.processed_date.is_some());
    assert_eq!(job.processed_by.as_deref(), Some("engine-test"));

    for record_id in [100, 101, 102] {
        let record = h.store.record(record_id).await;
        assert!(record.processed);
        assert_eq!(record.status, RecordStatus::Processed);
        assert!(!record.has_errors);

        let entries = h.store.audit_entries_for(record_id).await;
        assert!(!entries.is_empty());
        assert!(entries.iter().all(|entry| !entry.has_errors));
        assert!(
            entries
                .iter()
                .any(|entry| entry.response_status == "PROCESSED")
        );
    }

    // each device got exactly one carrier call, devices moved to the target
    assert_eq!(h.carrier.call_count(), 3);
    assert_eq!(h.store.device(1).await.status, "deactive");

    let summaries = h.sink.summaries.lock().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].success_count, 3);
    assert_eq!(summaries[0].failure_count, 0);
}

#[tokio::test]
async fn scenario_b_identifier_collision_isolates_the_record() {
    let h = harness(ScriptedCarrier::new(Integration::ThingSpace), fast_worker());
    h.store
        .insert_job(JobFactory::new_job(
            2,
            Integration::ThingSpace,
            ChangeType::IdentifierSwap,
            2,
        ))
        .await;
    // record A wants 8950 which is already carried by another device
    h.store
        .insert_record(RecordFactory::identifier_swap(201, 2, "8901", "8950"))
        .await;
    h.store
        .insert_record(RecordFactory::identifier_swap(202, 2, "8902", "8960"))
        .await;
    h.store
        .insert_device(DeviceFactory::with_iccid(1, "8901", "active"))
        .await;
    h.store
        .insert_device(DeviceFactory::with_iccid(2, "8902", "active"))
        .await;
    h.store
        .insert_device(DeviceFactory::with_iccid(3, "8950", "active"))
        .await;

    let outcome = h.engine.run(&ContinuationMessage::new(2)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed);

    let record_a = h.store.record(201).await;
    assert_eq!(record_a.status, RecordStatus::Error);
    assert!(record_a.has_errors);
    assert!(
        record_a
            .status_details
            .as_deref()
            .unwrap()
            .contains("already in use")
    );

    let record_b = h.store.record(202).await;
    assert_eq!(record_b.status, RecordStatus::Processed);
    assert!(!record_b.has_errors);
    assert_eq!(h.store.device(2).await.iccid.as_deref(), Some("8960"));

    let job = h.store.job(2).await;
    assert_eq!(job.status, JobStatus::Processed);
    assert_eq!(job.error_count, 1);

    // the colliding record never reached the carrier
    assert_eq!(h.carrier.calls(), vec!["8902".to_string()]);
}

#[tokio::test]
async fn scenario_c_budget_interruption_resumes_on_the_tail() {
    let mut worker = fast_worker();
    worker.time_budget_ms = 800;
    worker.cutoff_ms = 350;

    let h = harness(
        ScriptedCarrier::new(Integration::Jasper).with_delay(Duration::from_millis(300)),
        worker,
    );
    h.store
        .insert_job(JobFactory::new_job(
            3,
            Integration::Jasper,
            ChangeType::StatusUpdate,
            5,
        ))
        .await;
    for i in 0..5i64 {
        let iccid = format!("89{i:02}");
        h.store
            .insert_record(RecordFactory::status_update(300 + i, 3, &iccid, "deactive"))
            .await;
        h.store
            .insert_device(DeviceFactory::with_iccid(i + 1, &iccid, "active"))
            .await;
    }

    let first = h.engine.run(&ContinuationMessage::new(3)).await.unwrap();
    let mut message = match first {
        RunOutcome::Continued(continuation) => continuation,
        other => panic!("expected a continuation, got {other:?}"),
    };
    assert_eq!(message.retry_count, 1);

    let job = h.store.job(3).await;
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.processed_count, 2);
    let first_pass = h.carrier.calls();
    assert_eq!(first_pass, vec!["8900".to_string(), "8901".to_string()]);

    // counters never run backwards across invocations
    let mut previous_processed = job.processed_count;
    let mut completed = false;
    for _ in 0..4 {
        match h.engine.run(&message).await.unwrap() {
            RunOutcome::Continued(next) => {
                let job = h.store.job(3).await;
                assert!(job.processed_count >= previous_processed);
                assert!(job.processed_count <= job.total_count);
                previous_processed = job.processed_count;
                message = next;
            }
            RunOutcome::Completed => {
                completed = true;
                break;
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert!(completed);

    let job = h.store.job(3).await;
    assert_eq!(job.status, JobStatus::Processed);
    assert_eq!(job.processed_count, 5);
    assert!(job.processed_count >= previous_processed);

    // the second invocation touched exactly the untouched tail, in order
    let all_calls = h.carrier.calls();
    assert_eq!(
        all_calls,
        vec!["8900", "8901", "8902", "8903", "8904"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn scenario_d_credential_failure_leaves_the_job_reattemptable() {
    let h = harness(
        ScriptedCarrier::new(Integration::Jasper).failing_auth(),
        fast_worker(),
    );
    let mut job = JobFactory::new_job(4, Integration::Jasper, ChangeType::StatusUpdate, 2);
    job.status = JobStatus::Processing;
    h.store.insert_job(job).await;
    h.store
        .insert_record(RecordFactory::status_update(401, 4, "8901", "deactive"))
        .await;
    h.store
        .insert_record(RecordFactory::status_update(402, 4, "8902", "deactive"))
        .await;
    h.store
        .insert_device(DeviceFactory::with_iccid(1, "8901", "active"))
        .await;
    h.store
        .insert_device(DeviceFactory::with_iccid(2, "8902", "active"))
        .await;

    let outcome = h.engine.run(&ContinuationMessage::new(4)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Aborted(AbortReason::AuthenticationFailed));
    assert!(!outcome.is_success());

    // zero records touched, job status unchanged
    assert!(!h.store.record(401).await.processed);
    assert!(!h.store.record(402).await.processed);
    assert_eq!(h.store.job(4).await.status, JobStatus::Processing);
    assert_eq!(h.carrier.call_count(), 0);

    // exactly one job-level audit entry, anchored to the first record
    assert_eq!(h.store.audit_entry_count().await, 1);
    let entries = h.store.audit_entries_for(401).await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].has_errors);
    assert!(entries[0].response_text.contains("credential acquisition"));
}

#[tokio::test]
async fn rerunning_a_terminal_job_changes_nothing() {
    let h = harness(ScriptedCarrier::new(Integration::Jasper), fast_worker());
    let mut job = JobFactory::new_job(5, Integration::Jasper, ChangeType::StatusUpdate, 1);
    job.status = JobStatus::Processed;
    job.processed_count = 1;
    job.processed_by = Some("engine-test".to_string());
    job.processed_date = Some(chrono::Utc::now());
    h.store.insert_job(job).await;

    let mut record = RecordFactory::status_update(501, 5, "8901", "deactive");
    record.processed = true;
    record.status = RecordStatus::Processed;
    record.processed_by = Some("engine-test".to_string());
    record.processed_date = Some(chrono::Utc::now());
    h.store.insert_record(record).await;

    let before = h.store.snapshot().await;
    let outcome = h.engine.run(&ContinuationMessage::new(5)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed);

    let after = h.store.snapshot().await;
    assert_eq!(before, after);
    assert_eq!(h.carrier.call_count(), 0);
    assert_eq!(h.carrier.auth_count(), 0);
    assert!(h.sink.summaries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn second_invocation_mid_run_is_a_no_op() {
    use bulkchange_rs::storage::BulkChangeStore;

    let hold = Arc::new(Semaphore::new(0));
    let h = harness(
        ScriptedCarrier::new(Integration::Jasper).with_hold(hold.clone()),
        fast_worker(),
    );
    h.store
        .insert_job(JobFactory::new_job(
            6,
            Integration::Jasper,
            ChangeType::StatusUpdate,
            1,
        ))
        .await;
    h.store
        .insert_record(RecordFactory::status_update(601, 6, "8901", "deactive"))
        .await;
    h.store
        .insert_device(DeviceFactory::with_iccid(1, "8901", "active"))
        .await;

    let crate::common::TestHarness {
        store: engine_store,
        carrier,
        sink: _,
        engine,
    } = h;
    let first = tokio::spawn(async move { engine.run(&ContinuationMessage::new(6)).await });

    // wait for the first run to register itself and block inside the carrier
    let mut waited = 0;
    loop {
        if engine_store.active_run_count(6).await.unwrap() > 0 && carrier.call_count() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        waited += 1;
        assert!(waited < 1000, "first run never started");
    }

    // a fresh engine over the same store must skip without side effects
    let sink = Arc::new(crate::common::CollectingSink::default());
    let mut registry = bulkchange_rs::carriers::CarrierRegistry::new();
    registry.register(Arc::new(ScriptedCarrier::new(Integration::Jasper)));
    let second_engine = bulkchange_rs::Engine::new(
        engine_store.clone(),
        registry,
        sink.clone(),
        sink.clone(),
        fast_worker(),
        bulkchange_rs::RetryPolicies::default(),
    );
    let second = second_engine
        .run(&ContinuationMessage::new(6))
        .await
        .unwrap();
    assert_eq!(second, RunOutcome::SkippedActiveRun);
    assert!(!engine_store.record(601).await.processed);

    hold.add_permits(10);
    let first = first.await.unwrap().unwrap();
    assert_eq!(first, RunOutcome::Completed);
    assert!(engine_store.record(601).await.processed);
}

#[tokio::test]
async fn terminal_failure_does_not_disturb_neighbors() {
    let h = harness(
        ScriptedCarrier::new(Integration::Jasper).rejecting("8902"),
        fast_worker(),
    );
    h.store
        .insert_job(JobFactory::new_job(
            7,
            Integration::Jasper,
            ChangeType::StatusUpdate,
            3,
        ))
        .await;
    for (i, iccid) in ["8901", "8902", "8903"].iter().enumerate() {
        h.store
            .insert_record(RecordFactory::status_update(
                700 + i as i64,
                7,
                iccid,
                "deactive",
            ))
            .await;
        h.store
            .insert_device(DeviceFactory::with_iccid(i as i64 + 1, iccid, "active"))
            .await;
    }

    let outcome = h.engine.run(&ContinuationMessage::new(7)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed);

    assert_eq!(h.store.record(700).await.status, RecordStatus::Processed);
    assert_eq!(h.store.record(701).await.status, RecordStatus::Error);
    assert_eq!(h.store.record(702).await.status, RecordStatus::Processed);

    let job = h.store.job(7).await;
    assert_eq!(job.status, JobStatus::Processed);
    assert_eq!(job.processed_count, 3);
    assert_eq!(job.error_count, 1);

    // rejected record shows an error audit entry with the carrier's message
    let entries = h.store.audit_entries_for(701).await;
    assert!(
        entries
            .iter()
            .any(|entry| entry.has_errors && entry.response_text.contains("scripted rejection"))
    );
}

#[tokio::test]
async fn transient_failures_are_retried_within_one_record() {
    let h = harness(
        ScriptedCarrier::new(Integration::Jasper).with_transient_failures("8901", 2),
        fast_worker(),
    );
    h.store
        .insert_job(JobFactory::new_job(
            8,
            Integration::Jasper,
            ChangeType::StatusUpdate,
            1,
        ))
        .await;
    h.store
        .insert_record(RecordFactory::status_update(801, 8, "8901", "deactive"))
        .await;
    h.store
        .insert_device(DeviceFactory::with_iccid(1, "8901", "active"))
        .await;

    let outcome = h.engine.run(&ContinuationMessage::new(8)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed);

    // two transient failures then success, all inside one record
    assert_eq!(h.carrier.call_count(), 3);
    let record = h.store.record(801).await;
    assert_eq!(record.status, RecordStatus::Processed);
    assert_eq!(h.store.job(8).await.error_count, 0);
}

#[tokio::test]
async fn exhausted_retries_become_a_record_error() {
    let h = harness(
        ScriptedCarrier::new(Integration::Jasper).with_transient_failures("8901", 10),
        fast_worker(),
    );
    h.store
        .insert_job(JobFactory::new_job(
            9,
            Integration::Jasper,
            ChangeType::StatusUpdate,
            1,
        ))
        .await;
    h.store
        .insert_record(RecordFactory::status_update(901, 9, "8901", "deactive"))
        .await;
    h.store
        .insert_device(DeviceFactory::with_iccid(1, "8901", "active"))
        .await;

    let outcome = h.engine.run(&ContinuationMessage::new(9)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed);

    // attempt cap is 3 in the test profile
    assert_eq!(h.carrier.call_count(), 3);
    let record = h.store.record(901).await;
    assert_eq!(record.status, RecordStatus::Error);
    assert_eq!(h.store.job(9).await.error_count, 1);
}

#[tokio::test]
async fn unsupported_pair_errors_records_without_halting() {
    // ThingSpace has no username surface; the pair is never registered
    let carrier = ScriptedCarrier::new(Integration::ThingSpace).with_supported(&[
        ChangeType::StatusUpdate,
        ChangeType::IdentifierSwap,
    ]);
    let h = harness(carrier, fast_worker());
    h.store
        .insert_job(JobFactory::new_job(
            10,
            Integration::ThingSpace,
            ChangeType::UsernameUpdate,
            2,
        ))
        .await;
    h.store
        .insert_record(RecordFactory::username_update(1001, 10, "8901", "Ops"))
        .await;
    h.store
        .insert_record(RecordFactory::username_update(1002, 10, "8902", "Ops"))
        .await;

    let outcome = h.engine.run(&ContinuationMessage::new(10)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed);

    for record_id in [1001, 1002] {
        let record = h.store.record(record_id).await;
        assert_eq!(record.status, RecordStatus::Error);
        assert!(
            record
                .status_details
                .as_deref()
                .unwrap()
                .contains("Unsupported operation")
        );
    }
    let job = h.store.job(10).await;
    assert_eq!(job.status, JobStatus::Processed);
    assert_eq!(job.error_count, 2);
    assert_eq!(h.carrier.call_count(), 0);
}

#[tokio::test]
async fn missing_carrier_client_fails_records_closed() {
    let (store, _sink, engine) = harness_without_carrier(fast_worker());
    store
        .insert_job(JobFactory::new_job(
            11,
            Integration::Telegence,
            ChangeType::StatusUpdate,
            1,
        ))
        .await;
    store
        .insert_record(RecordFactory::status_update(1101, 11, "8901", "deactive"))
        .await;

    let outcome = engine.run(&ContinuationMessage::new(11)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed);

    let record = store.record(1101).await;
    assert_eq!(record.status, RecordStatus::Error);
    assert!(record.processed);
}

#[tokio::test]
async fn page_limit_defers_the_tail_to_a_continuation() {
    let mut worker = fast_worker();
    worker.page_size = 2;
    let h = harness(ScriptedCarrier::new(Integration::Jasper), worker);
    h.store
        .insert_job(JobFactory::new_job(
            12,
            Integration::Jasper,
            ChangeType::StatusUpdate,
            5,
        ))
        .await;
    for i in 0..5i64 {
        let iccid = format!("88{i:02}");
        h.store
            .insert_record(RecordFactory::status_update(1200 + i, 12, &iccid, "deactive"))
            .await;
        h.store
            .insert_device(DeviceFactory::with_iccid(i + 1, &iccid, "active"))
            .await;
    }

    let mut message = ContinuationMessage::new(12);
    let mut completed = false;
    for _ in 0..5 {
        match h.engine.run(&message).await.unwrap() {
            RunOutcome::Continued(next) => message = next,
            RunOutcome::Completed => {
                completed = true;
                break;
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert!(completed);

    let job = h.store.job(12).await;
    assert_eq!(job.status, JobStatus::Processed);
    assert_eq!(job.processed_count, 5);
    assert_eq!(h.carrier.call_count(), 5);
    assert_eq!(h.sink.continuations.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn retry_cap_stops_continuation_emission() {
    let mut worker = fast_worker();
    worker.page_size = 1;
    worker.max_retry_count = 1;
    let h = harness(ScriptedCarrier::new(Integration::Jasper), worker);
    h.store
        .insert_job(JobFactory::new_job(
            13,
            Integration::Jasper,
            ChangeType::StatusUpdate,
            3,
        ))
        .await;
    for i in 0..3i64 {
        let iccid = format!("87{i:02}");
        h.store
            .insert_record(RecordFactory::status_update(1300 + i, 13, &iccid, "deactive"))
            .await;
        h.store
            .insert_device(DeviceFactory::with_iccid(i + 1, &iccid, "active"))
            .await;
    }

    let mut message = ContinuationMessage::new(13);
    message.retry_count = 1;
    let outcome = h.engine.run(&message).await.unwrap();

    // the cap suppresses the continuation even though a tail remains
    assert_eq!(outcome, RunOutcome::Completed);
    assert!(h.sink.continuations.lock().unwrap().is_empty());
    assert_eq!(h.store.job(13).await.status, JobStatus::Processing);
}

#[tokio::test]
async fn writes_disabled_aborts_before_any_record() {
    let h = harness(
        ScriptedCarrier::new(Integration::Jasper).writes_disabled(),
        fast_worker(),
    );
    let mut job = JobFactory::new_job(14, Integration::Jasper, ChangeType::StatusUpdate, 1);
    job.status = JobStatus::Processing;
    h.store.insert_job(job).await;
    h.store
        .insert_record(RecordFactory::status_update(1401, 14, "8901", "deactive"))
        .await;

    let outcome = h.engine.run(&ContinuationMessage::new(14)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Aborted(AbortReason::WritesDisabled));
    assert!(!h.store.record(1401).await.processed);
    assert_eq!(h.carrier.auth_count(), 0);
    assert_eq!(h.store.audit_entry_count().await, 1);
}
