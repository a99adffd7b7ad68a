//! Grade book setup and the score, period, and final sheets for an approved roster.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{campus, send, Campus};
use registrar::designations::{UserId, UserInput};
use registrar::enrollment::{EnrollmentAction, EnrollmentId, EnrollmentInput, EnrollmentLogInput};

fn enroll(world: &Campus, student: UserId, approve: bool) -> EnrollmentId {
    let enrollment = world
        .registrar
        .enrollment
        .enroll(EnrollmentInput {
            user_id: student,
            section_id: world.section,
        })
        .expect("enroll")
        .enrollment
        .id;
    if approve {
        for action in [
            EnrollmentAction::ProgramChairApproved,
            EnrollmentAction::RegistrarApproved,
        ] {
            world
                .registrar
                .enrollment
                .record(
                    enrollment,
                    EnrollmentLogInput {
                        action,
                        logged_by: world.staff,
                    },
                )
                .expect("approval");
        }
    }
    enrollment
}

fn gradebook_payload(world: &Campus, section: Option<u64>, is_template: bool) -> Value {
    json!({
        "section_id": section,
        "academic_program_id": world.program,
        "is_template": is_template,
        "title": "Lecture Grade Book",
        "periods": [
            {
                "title": "Midterm",
                "weight": 50,
                "items": [{
                    "title": "Exams",
                    "weight": 100,
                    "details": [{ "title": "Midterm Exam", "max_score": 50, "weight": 100 }]
                }]
            },
            {
                "title": "Finals",
                "weight": 50,
                "items": [{
                    "title": "Exams",
                    "weight": 100,
                    "details": [{ "title": "Final Exam", "max_score": 100, "weight": 100 }]
                }]
            }
        ]
    })
}

fn detail_id(gradebook: &Value, period: usize) -> Value {
    gradebook["periods"][period]["items"][0]["details"][0]["id"].clone()
}

fn period_id(gradebook: &Value, period: usize) -> Value {
    gradebook["periods"][period]["id"].clone()
}

#[tokio::test]
async fn sheets_flow_from_scores_to_final_grades() {
    let world = campus();
    let enrollment = enroll(&world, world.student, true);
    let section = world.section.0;

    let (status, gradebook) = send(
        world.app(),
        "POST",
        "/api/v1/gradebooks",
        Some(gradebook_payload(&world, Some(section), false)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(gradebook["fully_setup"], Value::Bool(true));

    let scores = json!([
        { "enrollment_id": enrollment, "detail_id": detail_id(&gradebook, 0), "score": 40 },
        { "enrollment_id": enrollment, "detail_id": detail_id(&gradebook, 1), "score": 90 }
    ]);
    let (status, sheet) = send(
        world.app(),
        "PUT",
        &format!("/api/v1/sections/{section}/scores"),
        Some(scores),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sheet["rows"][0]["student_name"], "Mara Villanueva");
    assert_eq!(sheet["rows"][0]["scores"][0]["score"], json!(40.0));

    let (_, periods) = send(
        world.app(),
        "GET",
        &format!("/api/v1/sections/{section}/period-grades"),
        None,
    )
    .await;
    let cells = &periods["rows"][0]["periods"];
    assert_eq!(cells[0]["recommended_grade"], json!(80.0));
    assert_eq!(cells[1]["recommended_grade"], json!(90.0));

    let (_, finals) = send(
        world.app(),
        "GET",
        &format!("/api/v1/sections/{section}/final-grades"),
        None,
    )
    .await;
    assert_eq!(finals["rows"][0]["recommended_grade"], json!(0.0));

    let posted = json!([
        { "enrollment_id": enrollment, "grading_period_id": period_id(&gradebook, 0), "grade": 80, "is_posted": true },
        { "enrollment_id": enrollment, "grading_period_id": period_id(&gradebook, 1), "grade": 90, "is_posted": true }
    ]);
    let (status, _) = send(
        world.app(),
        "PUT",
        &format!("/api/v1/sections/{section}/period-grades"),
        Some(posted),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, finals) = send(
        world.app(),
        "GET",
        &format!("/api/v1/sections/{section}/final-grades"),
        None,
    )
    .await;
    let row = &finals["rows"][0];
    assert_eq!(row["recommended_grade"], json!(85.0));
    assert_eq!(row["is_passed"], Value::Bool(true));
    assert_eq!(row["credited_units"], json!(3.0));
    assert_eq!(row["is_overridden"], Value::Bool(false));

    let (status, finals) = send(
        world.app(),
        "PUT",
        &format!("/api/v1/sections/{section}/final-grades"),
        Some(json!([{ "enrollment_id": enrollment, "grade": 70, "is_posted": true }])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let row = &finals["rows"][0];
    assert_eq!(row["is_passed"], Value::Bool(false));
    assert_eq!(row["credited_units"], json!(0.0));
    assert_eq!(row["is_overridden"], Value::Bool(true));
}

#[tokio::test]
async fn scores_are_checked_against_roster_and_maximum() {
    let world = campus();
    let approved = enroll(&world, world.student, true);
    let pending_student = world
        .registrar
        .designations
        .create_user(UserInput {
            name: "Iris Tan".to_string(),
            email: "iris@example.edu".to_string(),
            is_admin: false,
        })
        .expect("user")
        .id;
    let pending = enroll(&world, pending_student, false);
    let section = world.section.0;

    let (_, gradebook) = send(
        world.app(),
        "POST",
        "/api/v1/gradebooks",
        Some(gradebook_payload(&world, Some(section), false)),
    )
    .await;
    let uri = format!("/api/v1/sections/{section}/scores");

    let (status, _) = send(
        world.app(),
        "PUT",
        &uri,
        Some(json!([{ "enrollment_id": approved, "detail_id": detail_id(&gradebook, 0), "score": 60 }])),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        world.app(),
        "PUT",
        &uri,
        Some(json!([{ "enrollment_id": pending, "detail_id": detail_id(&gradebook, 0), "score": 10 }])),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]
        .as_str()
        .expect("message")
        .contains("not on the section roster"));

    let (_, sheet) = send(world.app(), "GET", &uri, None).await;
    assert_eq!(sheet["rows"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn templates_are_copied_onto_sections_once() {
    let world = campus();
    let section = world.section.0;

    let (status, template) = send(
        world.app(),
        "POST",
        "/api/v1/gradebooks",
        Some(gradebook_payload(&world, None, true)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let instantiate = format!("/api/v1/gradebooks/{}/instantiate", template["id"]);

    let (status, copy) = send(
        world.app(),
        "POST",
        &instantiate,
        Some(json!({ "section_id": section })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(copy["is_template"], Value::Bool(false));
    assert_eq!(copy["section_id"], json!(section));
    assert_eq!(copy["periods"].as_array().map(Vec::len), Some(2));
    assert_ne!(detail_id(&copy, 0), detail_id(&template, 0));

    let (status, _) = send(
        world.app(),
        "POST",
        &instantiate,
        Some(json!({ "section_id": section })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, templates) = send(world.app(), "GET", "/api/v1/gradebooks?is_template=true", None).await;
    assert_eq!(templates.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn sections_without_a_grade_book_have_no_sheets() {
    let world = campus();
    let (status, body) = send(
        world.app(),
        "GET",
        &format!("/api/v1/sections/{}/scores", world.section.0),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "section has no grade book");
}
