// Racing commands against one submission
// The store holds both writers at the compare-and-swap until both have read

use async_trait::async_trait;
use chrono::NaiveDate;
use ip_portal::lifecycle::types::{Precondition, Submission, SubmissionKey};
use ip_portal::lifecycle::{
    Actor, ErrorKind, IpType, LifecycleCommand, LifecycleService, MissingItems, SubmissionDraft,
    SubmissionId, SubmissionStatus, Triage, TriageUpdate,
};
use ip_portal::store::{InMemorySubmissionStore, StoreError, SubmissionFilter, SubmissionStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;

const IP: IpType = IpType::Trademark;

/// Delegates to the in-memory store, but the first two swaps wait for each
/// other so both writers act on the same pre-state.
struct RacingStore {
    inner: InMemorySubmissionStore,
    gate: Barrier,
    gated_swaps: AtomicUsize,
}

impl RacingStore {
    fn new() -> Self {
        Self {
            inner: InMemorySubmissionStore::new(),
            gate: Barrier::new(2),
            gated_swaps: AtomicUsize::new(0),
        }
    }

    fn arm(&self) {
        self.gated_swaps.store(2, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubmissionStore for RacingStore {
    async fn insert(&self, submission: Submission) -> Result<Submission, StoreError> {
        self.inner.insert(submission).await
    }

    async fn get(&self, key: &SubmissionKey) -> Result<Option<Submission>, StoreError> {
        self.inner.get(key).await
    }

    async fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, StoreError> {
        self.inner.list(filter).await
    }

    async fn compare_and_swap(
        &self,
        expected: &Precondition,
        next: Submission,
    ) -> Result<Submission, StoreError> {
        let gated = self
            .gated_swaps
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if gated {
            self.gate.wait().await;
        }
        self.inner.compare_and_swap(expected, next).await
    }
}

async fn under_review(service: &LifecycleService) -> SubmissionId {
    let draft = SubmissionDraft {
        ip_type: IP,
        title: "Bluefin".to_string(),
        description: "Word mark for the bluefin range".to_string(),
        delivery_unit: "Brand".to_string(),
        filing_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        official_form_ref: Some("forms/bluefin.pdf".to_string()),
        design_representation_ref: None,
    };
    let id = service
        .file(&Actor::inventor("ines"), draft)
        .await
        .unwrap()
        .submission
        .id;
    service
        .execute(IP, &id, &Actor::consultant("carl"), LifecycleCommand::Receive)
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn test_approve_and_reject_race_has_one_winner() {
    let store = Arc::new(RacingStore::new());
    let service = LifecycleService::new(store.clone());
    let id = under_review(&service).await;
    service
        .execute(
            IP,
            &id,
            &Actor::consultant("carl"),
            LifecycleCommand::UpdateTriage(Triage::all_checked().into()),
        )
        .await
        .unwrap();

    store.arm();
    let alice = Actor::consultant("alice");
    let bob = Actor::consultant("bob");
    let (approved, rejected) = futures::join!(
        service.execute(IP, &id, &alice, LifecycleCommand::Approve),
        service.execute(
            IP,
            &id,
            &bob,
            LifecycleCommand::reject("Conflicts with an earlier mark", MissingItems::default())
        ),
    );

    let outcomes = [approved.is_ok(), rejected.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    let loser = approved.as_ref().err().or(rejected.as_ref().err()).unwrap();
    assert_eq!(loser.kind(), ErrorKind::Conflict);

    // Re-read: exactly one of the two decisions is recorded.
    let view = service.get(IP, &id).await.unwrap();
    let decided: Vec<_> = view
        .submission
        .status_history
        .iter()
        .filter(|change| {
            matches!(
                change.to,
                SubmissionStatus::ApprovedForFiling | SubmissionStatus::Rejected
            )
        })
        .collect();
    assert_eq!(decided.len(), 1);
    assert_eq!(view.submission.revision, 3);

    // Retrying the losing decision now meets a state it no longer applies to.
    let retry = if approved.is_ok() {
        service
            .execute(
                IP,
                &id,
                &bob,
                LifecycleCommand::reject("Conflicts with an earlier mark", MissingItems::default()),
            )
            .await
    } else {
        service
            .execute(IP, &id, &alice, LifecycleCommand::Approve)
            .await
    };
    assert_eq!(retry.unwrap_err().kind(), ErrorKind::InvalidTransition);
}

#[tokio::test]
async fn test_concurrent_triage_updates_are_not_lost() {
    let store = Arc::new(RacingStore::new());
    let service = LifecycleService::new(store.clone());
    let id = under_review(&service).await;

    let identified = TriageUpdate {
        inventor_identified: Some(true),
        ..TriageUpdate::default()
    };
    let clear = TriageUpdate {
        description_clear: Some(true),
        ..TriageUpdate::default()
    };

    store.arm();
    let alice = Actor::consultant("alice");
    let bob = Actor::consultant("bob");
    let (first, second) = futures::join!(
        service.execute(IP, &id, &alice, LifecycleCommand::UpdateTriage(identified)),
        service.execute(IP, &id, &bob, LifecycleCommand::UpdateTriage(clear)),
    );
    assert!(first.is_ok() != second.is_ok());

    // The loser re-reads and retries; both checks end up recorded.
    if first.is_err() {
        assert_eq!(first.unwrap_err().kind(), ErrorKind::Conflict);
        service
            .execute(IP, &id, &alice, LifecycleCommand::UpdateTriage(identified))
            .await
            .unwrap();
    } else {
        assert_eq!(second.unwrap_err().kind(), ErrorKind::Conflict);
        service
            .execute(IP, &id, &bob, LifecycleCommand::UpdateTriage(clear))
            .await
            .unwrap();
    }

    let triage = service.get(IP, &id).await.unwrap().submission.triage;
    assert!(triage.inventor_identified);
    assert!(triage.description_clear);
    assert!(!triage.design_views_complete);
}

#[tokio::test]
async fn test_stale_precondition_is_rejected_by_every_store() {
    let dir = tempfile::tempdir().unwrap();
    let stores: Vec<Arc<dyn SubmissionStore>> = vec![
        Arc::new(InMemorySubmissionStore::new()),
        Arc::new(ip_portal::store::FileSubmissionStore::new(
            dir.path().join("submissions.json"),
        )),
    ];

    for store in stores {
        let service = LifecycleService::new(store.clone());
        let id = under_review(&service).await;
        let key = SubmissionKey::new(IP, id.clone());
        let current = store.get(&key).await.unwrap().unwrap();

        service
            .execute(
                IP,
                &id,
                &Actor::consultant("carl"),
                LifecycleCommand::reject("Descriptive mark", MissingItems::default()),
            )
            .await
            .unwrap();

        let mut stale_write = current.clone();
        stale_write.status = SubmissionStatus::ApprovedForFiling;
        stale_write.revision += 1;
        let err = store
            .compare_and_swap(&current.precondition(), stale_write)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let stored = store.get(&key).await.unwrap().unwrap();
        assert_eq!(stored.status, SubmissionStatus::Rejected);
    }
}
