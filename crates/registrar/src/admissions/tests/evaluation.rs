use super::common::*;
use crate::admissions::AdmissionStatus;
use crate::notifications::NotifiableKind;
use crate::store::Store;

#[test]
fn posting_every_criterion_above_threshold_accepts() {
    let fixture = fixture();
    let application = submit(&fixture);

    let sheet = fixture
        .service
        .upsert_scores(
            application,
            vec![
                score(&fixture, fixture.interview, 90.0, true),
                score(&fixture, fixture.exam, 45.0, true),
            ],
        )
        .expect("scores saved");

    assert!(sheet.evaluation.is_complete);
    assert!(sheet.evaluation.is_passing);
    assert!((sheet.evaluation.percent - 90.0).abs() < 1e-9);
    assert_eq!(sheet.evaluation.total_weight, 100.0);
    assert_eq!(sheet.evaluation.contributions.len(), 2);

    let logs = fixture.service.logs(application).expect("logs");
    let accepted = logs
        .iter()
        .find(|log| log.status == AdmissionStatus::Accepted)
        .expect("accepted log");
    assert_eq!(accepted.user_id, fixture.evaluator);
    assert_eq!(
        accepted.note.as_deref(),
        Some("Automatically accepted with score: 90.00%")
    );

    let view = fixture.service.application(application).expect("view");
    assert_eq!(view.latest_status_label, "Ready for Enrollment");

    let notifications = fixture
        .store
        .read(|db| {
            Ok::<_, crate::store::StoreError>(
                db.notifications
                    .filter(|row| row.user_id == fixture.applicant)
                    .cloned()
                    .collect::<Vec<_>>(),
            )
        })
        .expect("notifications");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].notifiable.kind, NotifiableKind::AdmissionApplication);
    assert_eq!(notifications[0].notifiable.id, application.0);
}

#[test]
fn incomplete_or_failing_scores_do_not_accept() {
    let fixture = fixture();
    let application = submit(&fixture);

    let partial = fixture
        .service
        .upsert_scores(application, vec![score(&fixture, fixture.interview, 100.0, true)])
        .expect("partial scores");
    assert!(!partial.evaluation.is_complete);
    assert_eq!(partial.evaluation.posted_count, 1);
    assert_eq!(partial.evaluation.criteria_count, 2);

    let failing = fixture
        .service
        .upsert_scores(
            application,
            vec![
                score(&fixture, fixture.interview, 50.0, true),
                score(&fixture, fixture.exam, 25.0, true),
            ],
        )
        .expect("failing scores");
    assert!(failing.evaluation.is_complete);
    assert!(!failing.evaluation.is_passing);
    assert!((failing.evaluation.percent - 50.0).abs() < 1e-9);

    let logs = fixture.service.logs(application).expect("logs");
    assert!(logs.iter().all(|log| log.status != AdmissionStatus::Accepted));
}

#[test]
fn lowering_a_posted_score_revokes_acceptance() {
    let fixture = fixture();
    let application = submit(&fixture);

    fixture
        .service
        .upsert_scores(
            application,
            vec![
                score(&fixture, fixture.interview, 80.0, true),
                score(&fixture, fixture.exam, 40.0, true),
            ],
        )
        .expect("passing scores");
    assert_eq!(
        fixture.service.application(application).expect("view").latest_status,
        AdmissionStatus::Accepted
    );

    fixture
        .service
        .upsert_scores(application, vec![score(&fixture, fixture.exam, 5.0, true)])
        .expect("lowered exam");

    let view = fixture.service.application(application).expect("view");
    assert_eq!(view.latest_status, AdmissionStatus::Submitted);
}

#[test]
fn a_new_draft_score_revokes_acceptance() {
    let fixture = fixture();
    let application = submit(&fixture);

    fixture
        .service
        .upsert_scores(
            application,
            vec![
                score(&fixture, fixture.interview, 100.0, true),
                score(&fixture, fixture.exam, 50.0, true),
            ],
        )
        .expect("passing scores");

    let mut second_opinion = score(&fixture, fixture.interview, 95.0, false);
    second_opinion.user_id = fixture.chair;
    fixture
        .service
        .upsert_scores(application, vec![second_opinion])
        .expect("draft from second evaluator");

    let logs = fixture.service.logs(application).expect("logs");
    assert!(logs.iter().all(|log| log.status != AdmissionStatus::Accepted));
}

#[test]
fn threshold_comes_from_policy() {
    let fixture = fixture();
    let application = submit(&fixture);
    fixture
        .service
        .upsert_scores(
            application,
            vec![
                score(&fixture, fixture.interview, 75.0, true),
                score(&fixture, fixture.exam, 37.5, true),
            ],
        )
        .expect("scores at the threshold");

    let evaluation = fixture.service.evaluation(application).expect("evaluation");
    assert_eq!(evaluation.threshold, 75.0);
    assert!(evaluation.is_passing);
}
