use super::common::*;
use crate::academics::{RequirementId, SchoolYearId};
use crate::admissions::{
    AdmissionStatus, ApplicationFormInput, CriteriaFileInput, DecisionInput, SubmissionFile,
    UniversityAdmissionInput, UniversityCriteriaInput,
};
use crate::academics::{Requirement, RequirementType};
use crate::service::{RuleViolation, ServiceError};
use crate::store::{Store, StoreError};

fn requirement(fixture: &Fixture) -> RequirementId {
    fixture
        .store
        .write(|db| {
            Ok::<_, StoreError>(
                db.requirements
                    .insert_with(|id| Requirement {
                        id,
                        requirement_name: "Form 138".to_string(),
                        description: None,
                        requirement_type: RequirementType::Admission,
                        is_mandatory: true,
                        is_active: true,
                    })
                    .id,
            )
        })
        .expect("requirement")
}

fn criteria_input(requirement: RequirementId, title: &str) -> UniversityCriteriaInput {
    UniversityCriteriaInput {
        requirement_id: requirement,
        title: title.to_string(),
        description: None,
        max_score: 100.0,
        min_score: 0.0,
        weight: 50.0,
        is_active: true,
        file_suffix: Some("pdf".to_string()),
    }
}

fn form(fixture: &Fixture, submissions: Vec<CriteriaFileInput>) -> ApplicationFormInput {
    ApplicationFormInput {
        user_id: fixture.applicant,
        university_schedule_id: None,
        year: None,
        submissions,
    }
}

fn file(name: &str) -> Option<SubmissionFile> {
    Some(SubmissionFile {
        name: name.to_string(),
        storage_key: format!("submissions/{name}"),
    })
}

#[test]
fn application_form_stores_submissions_together() {
    let fixture = fixture();
    let requirement = requirement(&fixture);
    let report_card = fixture
        .university
        .add_criteria(fixture.admission, criteria_input(requirement, "Report Card"))
        .expect("criteria");

    let view = fixture
        .university
        .submit_application_form(
            fixture.admission,
            form(
                &fixture,
                vec![CriteriaFileInput {
                    university_criteria_id: report_card.id,
                    file: file("report-card.pdf"),
                }],
            ),
        )
        .expect("application");

    assert_eq!(view.temporary_id, "2025000001");
    assert_eq!(view.latest_status, Some(AdmissionStatus::Submitted));
    assert_eq!(view.submissions.len(), 1);
    assert_eq!(view.submissions[0].file.name, "report-card.pdf");

    let duplicate = fixture
        .university
        .submit_application_form(fixture.admission, form(&fixture, Vec::new()))
        .expect_err("one application per admission");
    assert!(matches!(duplicate, ServiceError::Store(StoreError::Conflict(_))));
}

#[test]
fn missing_file_rolls_back_the_whole_form() {
    let fixture = fixture();
    let requirement = requirement(&fixture);
    let report_card = fixture
        .university
        .add_criteria(fixture.admission, criteria_input(requirement, "Report Card"))
        .expect("criteria");
    let essay = fixture
        .university
        .add_criteria(fixture.admission, criteria_input(requirement, "Essay"))
        .expect("criteria");

    let err = fixture
        .university
        .submit_application_form(
            fixture.admission,
            form(
                &fixture,
                vec![
                    CriteriaFileInput {
                        university_criteria_id: report_card.id,
                        file: file("report-card.pdf"),
                    },
                    CriteriaFileInput {
                        university_criteria_id: essay.id,
                        file: None,
                    },
                ],
            ),
        )
        .expect_err("essay file missing");

    match err {
        ServiceError::Rule(RuleViolation::MissingSubmissionFile { title }) => {
            assert_eq!(title, "Essay")
        }
        other => panic!("expected missing file, got {other:?}"),
    }
    assert!(fixture
        .university
        .applications(fixture.admission)
        .expect("applications")
        .is_empty());
}

#[test]
fn closed_admissions_refuse_applications_unless_overridden() {
    let fixture = fixture();
    fixture.clock.set(
        date(2025, 10, 15)
            .and_hms_opt(9, 0, 0)
            .expect("valid time"),
    );

    let err = fixture
        .university
        .submit_application_form(fixture.admission, form(&fixture, Vec::new()))
        .expect_err("window closed");
    assert!(matches!(
        err,
        ServiceError::Rule(RuleViolation::AdmissionNotOngoing)
    ));

    fixture
        .university
        .update_admission(
            fixture.admission,
            UniversityAdmissionInput {
                school_year_id: fixture.school_year,
                open_date: date(2025, 8, 4),
                close_date: date(2025, 9, 30),
                is_open_override: true,
            },
        )
        .expect("override");
    fixture
        .university
        .submit_application_form(fixture.admission, form(&fixture, Vec::new()))
        .expect("override accepts applications");
}

#[test]
fn one_admission_per_school_year_within_its_dates() {
    let fixture = fixture();
    let duplicate = fixture
        .university
        .create_admission(UniversityAdmissionInput {
            school_year_id: fixture.school_year,
            open_date: date(2025, 10, 1),
            close_date: date(2025, 10, 31),
            is_open_override: false,
        })
        .expect_err("school year already has an admission");
    assert!(matches!(duplicate, ServiceError::Store(StoreError::Conflict(_))));

    let outside = fixture
        .university
        .create_admission(UniversityAdmissionInput {
            school_year_id: fixture.school_year,
            open_date: date(2025, 7, 1),
            close_date: date(2025, 8, 31),
            is_open_override: false,
        })
        .expect_err("opens before the school year");
    assert!(matches!(
        outside,
        ServiceError::Rule(RuleViolation::OutsideSchoolYear { what: "open date" })
    ));

    let missing = fixture
        .university
        .create_admission(UniversityAdmissionInput {
            school_year_id: SchoolYearId(99),
            open_date: date(2025, 10, 1),
            close_date: date(2025, 10, 31),
            is_open_override: false,
        })
        .expect_err("unknown school year");
    assert!(matches!(missing, ServiceError::Store(StoreError::NotFound { .. })));
}

#[test]
fn invitation_disappears_after_applying() {
    let fixture = fixture();
    let invitation = fixture
        .university
        .invitation(fixture.applicant)
        .expect("invitation")
        .expect("open admission");
    assert_eq!(invitation.admission.id, fixture.admission);
    assert!(invitation.is_ongoing);

    let application = fixture
        .university
        .submit_application_form(fixture.admission, form(&fixture, Vec::new()))
        .expect("application");
    assert!(fixture
        .university
        .invitation(fixture.applicant)
        .expect("invitation")
        .is_none());

    let log = fixture
        .university
        .record_decision(
            application.application.id,
            DecisionInput {
                status: AdmissionStatus::Approved,
                user_id: fixture.chair,
                note: None,
            },
        )
        .expect("approval");
    assert_eq!(log.status, AdmissionStatus::Approved);
}
