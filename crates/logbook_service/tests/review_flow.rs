use serde_json::{json, Value};
use std::sync::Arc;
use time::OffsetDateTime;

use logbook_core::catalog::LogKind;
use logbook_core::lifecycle::RejectOutcome;
use logbook_core::models::{
    Batch, EntryFields, EntryStatus, EntryUpdate, NewEntry, Role, User, UserId,
};
use logbook_core::{LogbookError, RequestContext};
use logbook_db::{LogbookStore, MemoryStore};
use logbook_service::{IdentityEvent, IdentityOutcome, ListQuery, LogbookService, RejectRequest};

const KIND: LogKind = LogKind::CasePresentation;

fn fields(value: Value) -> EntryFields {
    value.as_object().cloned().expect("object literal")
}

fn complete_case() -> NewEntry {
    NewEntry {
        category: "neuroradiology".to_string(),
        fields: fields(json!({
            "date": "2026-02-11",
            "patient_id": "MRN-2231",
            "findings": "Restricted diffusion in left MCA territory",
            "diagnosis": "Acute infarct",
        })),
        submit: false,
    }
}

fn student_user(id: &str, batch_id: Option<uuid::Uuid>) -> User {
    let now = OffsetDateTime::now_utc();
    User {
        id: UserId::new(id),
        role: Role::Student,
        email: None,
        full_name: None,
        batch_id,
        semester: Some(3),
        banned: false,
        created_at: now,
        updated_at: now,
    }
}

/// Two batches; faculty `f1` reviews batch A, which holds student `s1`.
/// Student `s2` sits in batch B with nobody assigned.
async fn department() -> (LogbookService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let batch_a = Batch::new("MD 2024", 2024);
    let batch_b = Batch::new("MD 2025", 2025);
    store.create_batch(&batch_a).await.unwrap();
    store.create_batch(&batch_b).await.unwrap();
    store.upsert_user(&student_user("s1", Some(batch_a.id))).await.unwrap();
    store.upsert_user(&student_user("s2", Some(batch_b.id))).await.unwrap();
    store.assign_batch(&UserId::new("f1"), batch_a.id).await.unwrap();

    (LogbookService::new(store.clone()), store)
}

#[tokio::test]
async fn test_sign_then_owner_edit_conflicts() {
    let (service, store) = department().await;
    let student = RequestContext::student("s1");
    let faculty = RequestContext::faculty("f1");

    let draft = service.create_entry(&student, KIND, complete_case()).await.unwrap();
    assert_eq!(draft.status, EntryStatus::Draft);

    let submitted = service.submit_entry(&student, KIND, draft.id).await.unwrap();
    assert_eq!(submitted.status, EntryStatus::Submitted);
    assert!(submitted.submitted_at.is_some());

    let outcome = service.sign_entry(&faculty, KIND, draft.id).await.unwrap();
    assert_eq!(outcome.entry.status, EntryStatus::Signed);
    assert_eq!(outcome.entry.signer_id, Some(UserId::new("f1")));
    assert_eq!(outcome.signature.entity_id, draft.id);
    assert_eq!(outcome.signature.entity_type, KIND);

    let update = EntryUpdate {
        category: Some("chest".to_string()),
        ..Default::default()
    };
    let err = service.update_entry(&student, KIND, draft.id, update).await.unwrap_err();
    match err {
        LogbookError::Conflict(msg) => assert_eq!(msg, "cannot edit signed entry"),
        other => panic!("expected conflict, got {:?}", other),
    }

    let delete = service.delete_entry(&student, KIND, draft.id).await;
    assert!(matches!(delete, Err(LogbookError::Conflict(_))));
    assert_eq!(store.signatures_for(KIND, draft.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_second_sign_fails_without_new_signature() {
    let (service, store) = department().await;
    let student = RequestContext::student("s1");
    let mut input = complete_case();
    input.submit = true;
    let entry = service.create_entry(&student, KIND, input).await.unwrap();

    service.sign_entry(&RequestContext::faculty("f1"), KIND, entry.id).await.unwrap();
    let again = service.sign_entry(&RequestContext::hod("h1"), KIND, entry.id).await;

    assert!(matches!(again, Err(LogbookError::Conflict(_))));
    let signatures = store.signatures_for(KIND, entry.id).await.unwrap();
    assert_eq!(signatures.len(), 1);
    assert_eq!(signatures[0].signer_id, UserId::new("f1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_signs_produce_one_signature() {
    let (service, store) = department().await;
    let mut input = complete_case();
    input.submit = true;
    let entry = service.create_entry(&RequestContext::student("s1"), KIND, input).await.unwrap();

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.sign_entry(&RequestContext::faculty("f1"), KIND, entry.id).await })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.sign_entry(&RequestContext::hod("h1"), KIND, entry.id).await })
    };
    let (first, second) = tokio::join!(first, second);
    let results = [first.unwrap(), second.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(LogbookError::Conflict(_))))
            .count(),
        1
    );
    assert_eq!(store.signatures_for(KIND, entry.id).await.unwrap().len(), 1);

    let stored = store.get_entry(KIND, entry.id).await.unwrap().unwrap();
    assert_eq!(stored.status, EntryStatus::Signed);
}

#[tokio::test]
async fn test_revision_round_trip() {
    let (service, _) = department().await;
    let student = RequestContext::student("s1");
    let faculty = RequestContext::faculty("f1");

    let mut input = complete_case();
    input.submit = true;
    let entry = service.create_entry(&student, KIND, input).await.unwrap();

    let request = RejectRequest {
        remark: "incomplete diagnosis".to_string(),
        outcome: RejectOutcome::NeedsRevision,
    };
    let returned = service.reject_entry(&faculty, KIND, entry.id, request).await.unwrap();
    assert_eq!(returned.status, EntryStatus::NeedsRevision);
    assert_eq!(returned.remark.as_deref(), Some("incomplete diagnosis"));
    assert!(returned.signer_id.is_none());

    let update = EntryUpdate {
        category: None,
        fields: fields(json!({ "diagnosis": "Acute left MCA infarct with haemorrhagic transformation" })),
    };
    let edited = service.update_entry(&student, KIND, entry.id, update).await.unwrap();
    assert_eq!(edited.status, EntryStatus::NeedsRevision);
    assert_eq!(edited.fields["patient_id"], "MRN-2231");

    let resubmitted = service.submit_entry(&student, KIND, entry.id).await.unwrap();
    assert_eq!(resubmitted.status, EntryStatus::Submitted);
}

#[tokio::test]
async fn test_reject_needs_remark_and_is_final() {
    let (service, _) = department().await;
    let student = RequestContext::student("s1");
    let hod = RequestContext::hod("h1");

    let mut input = complete_case();
    input.submit = true;
    let entry = service.create_entry(&student, KIND, input).await.unwrap();

    let blank = RejectRequest {
        remark: "   ".to_string(),
        outcome: RejectOutcome::Rejected,
    };
    let err = service.reject_entry(&hod, KIND, entry.id, blank).await.unwrap_err();
    assert!(matches!(err, LogbookError::Validation(ref issues) if issues[0].field == "remark"));

    let request = RejectRequest {
        remark: "Duplicate of an earlier case".to_string(),
        outcome: RejectOutcome::Rejected,
    };
    let rejected = service.reject_entry(&hod, KIND, entry.id, request).await.unwrap();
    assert_eq!(rejected.status, EntryStatus::Rejected);

    let resubmit = service.submit_entry(&student, KIND, entry.id).await;
    assert!(matches!(resubmit, Err(LogbookError::Conflict(_))));
    let sign = service.sign_entry(&hod, KIND, entry.id).await;
    assert!(matches!(sign, Err(LogbookError::Conflict(_))));
}

#[tokio::test]
async fn test_student_can_never_sign() {
    let (service, store) = department().await;
    let student = RequestContext::student("s1");

    let mut input = complete_case();
    input.submit = true;
    let entry = service.create_entry(&student, KIND, input).await.unwrap();

    let own = service.sign_entry(&student, KIND, entry.id).await;
    assert!(matches!(own, Err(LogbookError::Forbidden(_))));

    let bulk = service.bulk_sign(&student, KIND, &[entry.id]).await;
    assert!(matches!(bulk, Err(LogbookError::Forbidden(_))));

    let stored = store.get_entry(KIND, entry.id).await.unwrap().unwrap();
    assert_eq!(stored.status, EntryStatus::Submitted);
    assert!(store.signatures_for(KIND, entry.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_faculty_scope_is_limited_to_assigned_students() {
    let (service, _) = department().await;
    let faculty = RequestContext::faculty("f1");

    let mut input = complete_case();
    input.submit = true;
    let mine = service
        .create_entry(&RequestContext::student("s1"), KIND, input.clone())
        .await
        .unwrap();
    let other = service
        .create_entry(&RequestContext::student("s2"), KIND, input)
        .await
        .unwrap();

    assert!(service.get_entry(&faculty, KIND, mine.id).await.is_ok());
    let view = service.get_entry(&faculty, KIND, other.id).await;
    assert!(matches!(view, Err(LogbookError::Forbidden(_))));
    let sign = service.sign_entry(&faculty, KIND, other.id).await;
    assert!(matches!(sign, Err(LogbookError::Forbidden(_))));

    let listed = service.list_entries(&faculty, KIND, ListQuery::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, mine.id);

    let narrowed = ListQuery {
        student_id: Some(UserId::new("s2")),
        status: None,
    };
    let cross = service.list_entries(&faculty, KIND, narrowed).await;
    assert!(matches!(cross, Err(LogbookError::Forbidden(_))));

    let progress = service.student_progress(&faculty, &UserId::new("s2")).await;
    assert!(matches!(progress, Err(LogbookError::Forbidden(_))));

    let pending = service.pending_counts(&faculty).await.unwrap();
    assert_eq!(pending.total, 1);
    assert_eq!(pending.by_kind[&KIND], 1);

    let global = service.pending_counts(&RequestContext::hod("h1")).await.unwrap();
    assert_eq!(global.total, 2);

    let student = service.pending_counts(&RequestContext::student("s1")).await;
    assert!(matches!(student, Err(LogbookError::Forbidden(_))));
}

#[tokio::test]
async fn test_students_only_touch_their_own_entries() {
    let (service, _) = department().await;
    let entry = service
        .create_entry(&RequestContext::student("s1"), KIND, complete_case())
        .await
        .unwrap();
    let intruder = RequestContext::student("s2");

    let view = service.get_entry(&intruder, KIND, entry.id).await;
    assert!(matches!(view, Err(LogbookError::Forbidden(_))));
    let submit = service.submit_entry(&intruder, KIND, entry.id).await;
    assert!(matches!(submit, Err(LogbookError::Forbidden(_))));
    let delete = service.delete_entry(&intruder, KIND, entry.id).await;
    assert!(matches!(delete, Err(LogbookError::Forbidden(_))));

    let hod_create = service
        .create_entry(&RequestContext::hod("h1"), KIND, complete_case())
        .await;
    assert!(matches!(hod_create, Err(LogbookError::Forbidden(_))));
}

#[tokio::test]
async fn test_submission_requires_complete_fields() {
    let (service, _) = department().await;
    let student = RequestContext::student("s1");

    let mut input = complete_case();
    input.fields.remove("diagnosis");
    let draft = service.create_entry(&student, KIND, input).await.unwrap();

    let err = service.submit_entry(&student, KIND, draft.id).await.unwrap_err();
    match err {
        LogbookError::Validation(issues) => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].field, "diagnosis");
        }
        other => panic!("expected validation failure, got {:?}", other),
    }

    let bad_category = NewEntry {
        category: "cardiology".to_string(),
        ..complete_case()
    };
    let err = service.create_entry(&student, KIND, bad_category).await.unwrap_err();
    assert!(matches!(err, LogbookError::Validation(_)));
}

#[tokio::test]
async fn test_draft_delete_and_missing_entry() {
    let (service, _) = department().await;
    let student = RequestContext::student("s1");
    let entry = service.create_entry(&student, KIND, complete_case()).await.unwrap();

    service.delete_entry(&student, KIND, entry.id).await.unwrap();
    let gone = service.get_entry(&student, KIND, entry.id).await;
    assert!(matches!(gone, Err(LogbookError::NotFound(_))));
}

#[tokio::test]
async fn test_bulk_sign_reports_each_id() {
    let (service, store) = department().await;
    let student = RequestContext::student("s1");

    let mut input = complete_case();
    input.submit = true;
    let first = service.create_entry(&student, KIND, input.clone()).await.unwrap();
    let second = service.create_entry(&student, KIND, input).await.unwrap();
    let draft = service.create_entry(&student, KIND, complete_case()).await.unwrap();
    let missing = uuid::Uuid::new_v4();

    let report = service
        .bulk_sign(
            &RequestContext::faculty("f1"),
            KIND,
            &[first.id, draft.id, second.id, missing],
        )
        .await
        .unwrap();

    assert_eq!(report.signed, vec![first.id, second.id]);
    let failed: Vec<_> = report.failed.iter().map(|f| f.id).collect();
    assert_eq!(failed, vec![draft.id, missing]);

    assert_eq!(store.signatures_for(KIND, first.id).await.unwrap().len(), 1);
    assert_eq!(store.signatures_for(KIND, second.id).await.unwrap().len(), 1);
    assert!(store.signatures_for(KIND, draft.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_progress_counts_every_status() {
    let (service, _) = department().await;
    let student = RequestContext::student("s1");

    let mut input = complete_case();
    input.submit = true;
    let signed = service.create_entry(&student, KIND, input).await.unwrap();
    service.create_entry(&student, KIND, complete_case()).await.unwrap();
    service.sign_entry(&RequestContext::faculty("f1"), KIND, signed.id).await.unwrap();

    let progress = service.student_progress(&student, &UserId::new("s1")).await.unwrap();
    assert_eq!(progress.total, 2);
    assert_eq!(progress.signed, 1);

    let case = progress.kinds.iter().find(|k| k.kind == KIND).unwrap();
    assert_eq!(case.by_status[&EntryStatus::Draft], 1);
    assert_eq!(case.by_status[&EntryStatus::Signed], 1);
    assert_eq!(case.by_status[&EntryStatus::Rejected], 0);
}

#[tokio::test]
async fn test_export_writes_manifest_for_signed_entries() {
    let (service, _) = department().await;
    let student = RequestContext::student("s1");

    let mut input = complete_case();
    input.submit = true;
    let entry = service.create_entry(&student, KIND, input).await.unwrap();
    service.create_entry(&student, KIND, complete_case()).await.unwrap();
    service.sign_entry(&RequestContext::faculty("f1"), KIND, entry.id).await.unwrap();

    let dir = std::env::temp_dir().join(format!("logbook-export-{}", uuid::Uuid::new_v4()));
    let summary = service
        .export_logbook(&RequestContext::hod("h1"), &UserId::new("s1"), &dir)
        .await
        .unwrap();

    assert_eq!(summary.entries, 1);
    let manifest = std::fs::read_to_string(dir.join("sha256.txt")).unwrap();
    let names: Vec<&str> = manifest.lines().filter_map(|l| l.split("  ").nth(1)).collect();
    assert_eq!(names, vec!["logbook.csv", "logbook.pdf"]);

    let csv = std::fs::read_to_string(dir.join("logbook.csv")).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains(&entry.id.to_string()));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_identity_events_maintain_shadow_user() {
    let (service, store) = department().await;

    let created: IdentityEvent = serde_json::from_value(json!({
        "type": "user.created",
        "data": {
            "id": "user_new",
            "first_name": "Asha",
            "last_name": "Rao",
            "email_addresses": [{ "email_address": "asha@example.org" }],
            "public_metadata": {}
        }
    }))
    .unwrap();
    let outcome = service.apply_identity_event(created).await.unwrap();
    assert_eq!(outcome, IdentityOutcome::Upserted(UserId::new("user_new")));

    let user = store.get_user(&UserId::new("user_new")).await.unwrap().unwrap();
    assert_eq!(user.role, Role::Student);
    assert_eq!(user.full_name.as_deref(), Some("Asha Rao"));
    assert_eq!(user.email.as_deref(), Some("asha@example.org"));

    let promoted: IdentityEvent = serde_json::from_value(json!({
        "type": "user.updated",
        "data": { "id": "user_new", "public_metadata": { "role": "faculty" } }
    }))
    .unwrap();
    service.apply_identity_event(promoted).await.unwrap();
    let user = store.get_user(&UserId::new("user_new")).await.unwrap().unwrap();
    assert_eq!(user.role, Role::Faculty);

    let bad_role: IdentityEvent = serde_json::from_value(json!({
        "type": "user.updated",
        "data": { "id": "user_new", "public_metadata": { "role": "dean" } }
    }))
    .unwrap();
    let err = service.apply_identity_event(bad_role).await.unwrap_err();
    assert!(matches!(err, LogbookError::Validation(_)));

    let session: IdentityEvent = serde_json::from_value(json!({
        "type": "session.created",
        "data": { "id": "sess_1" }
    }))
    .unwrap();
    let ignored = service.apply_identity_event(session).await.unwrap();
    assert_eq!(ignored, IdentityOutcome::Ignored("session.created".to_string()));

    let deleted: IdentityEvent = serde_json::from_value(json!({
        "type": "user.deleted",
        "data": { "id": "user_new", "deleted": true }
    }))
    .unwrap();
    service.apply_identity_event(deleted).await.unwrap();
    assert!(store.get_user(&UserId::new("user_new")).await.unwrap().is_none());
}
