//! School years, catalog, sections, and rooms driven through the academic services.

mod common;

use axum::http::StatusCode;
use chrono::NaiveTime;
use serde_json::json;

use common::{campus, date, send, Campus};
use registrar::academics::{
    BuildingInput, CourseInput, CourseRequisiteInput, CurriculumDetailInput, GenerateSectionsInput,
    RequisiteType, RoomInput, ScheduleAssignmentInput, SchoolYearId, SchoolYearInput, SectionId,
    Weekday,
};
use registrar::designations::{UserId, UserInput};
use registrar::enrollment::{EnrollmentAction, EnrollmentId, EnrollmentInput, EnrollmentLogInput};
use registrar::gradebook::GradeBookInput;
use registrar::service::{RuleViolation, ServiceError};
use registrar::store::{Store, StoreError};

fn course(code: &str) -> CourseInput {
    CourseInput {
        course_code: code.to_string(),
        course_title: format!("Course {code}"),
        course_description: String::new(),
        with_laboratory: false,
        is_specialize: false,
        lecture_units: 3.0,
        laboratory_units: 0.0,
        credit_units: 3.0,
    }
}

fn next_year() -> SchoolYearInput {
    SchoolYearInput {
        school_year_code: "2026-2027".to_string(),
        name: "School Year 2026-2027".to_string(),
        start_date: date(2026, 8, 3),
        end_date: date(2027, 5, 28),
        is_active: false,
    }
}

fn active_year(world: &Campus) -> SchoolYearId {
    world
        .registrar
        .academics
        .active_school_year()
        .expect("read")
        .expect("active year")
        .school_year
        .id
}

fn student(world: &Campus, name: &str) -> UserId {
    world
        .registrar
        .designations
        .create_user(UserInput {
            name: name.to_string(),
            email: format!("{}@example.edu", name.to_lowercase().replace(' ', ".")),
            is_admin: false,
        })
        .expect("user")
        .id
}

fn enroll(world: &Campus, user: UserId) -> EnrollmentId {
    world
        .registrar
        .enrollment
        .enroll(EnrollmentInput {
            user_id: user,
            section_id: world.section,
        })
        .expect("enroll")
        .enrollment
        .id
}

fn record(world: &Campus, enrollment: EnrollmentId, action: EnrollmentAction) -> Result<(), ServiceError> {
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
        .map(|_| ())
}

fn cap_section(world: &Campus, section: SectionId, max_students: u32) {
    world
        .store
        .write(|db| {
            db.sections.require_mut(section)?.max_students = max_students;
            Ok::<_, StoreError>(())
        })
        .expect("section capped");
}

#[test]
fn creating_a_school_year_persists_its_standard_calendar() {
    let world = campus();
    let year = world
        .registrar
        .academics
        .create_school_year(next_year())
        .expect("school year")
        .school_year;

    let calendar = world.registrar.academics.calendar(year.id).expect("calendar");
    assert_eq!(calendar.len(), 35);
    assert_eq!(
        calendar.iter().map(|entry| entry.order).collect::<Vec<_>>(),
        (1..=35).collect::<Vec<_>>()
    );
    assert!(calendar
        .iter()
        .all(|entry| entry.start_date >= year.start_date && entry.end_date <= year.end_date));
}

#[test]
fn padded_school_year_codes_are_duplicates() {
    let world = campus();
    let mut input = next_year();
    input.school_year_code = " 2025-2026 ".to_string();

    let err = world
        .registrar
        .academics
        .create_school_year(input)
        .expect_err("code already taken");
    assert!(matches!(err, ServiceError::Store(StoreError::Conflict(_))));
}

#[test]
fn referenced_school_years_cannot_be_deleted() {
    let world = campus();
    let academics = &world.registrar.academics;

    let err = academics
        .delete_school_year(active_year(&world))
        .expect_err("the fixture section uses the year");
    assert!(matches!(err, ServiceError::Store(StoreError::Conflict(_))));

    let spare = academics
        .create_school_year(next_year())
        .expect("school year")
        .school_year
        .id;
    academics.delete_school_year(spare).expect("unreferenced year");

    let leftover = world
        .store
        .read(|db| {
            Ok::<_, StoreError>(db.calendar.filter(|entry| entry.school_year_id == spare).count())
        })
        .expect("read");
    assert_eq!(leftover, 0);
    assert!(matches!(
        academics.school_year(spare),
        Err(ServiceError::Store(StoreError::NotFound { .. }))
    ));
}

#[test]
fn courses_cannot_require_themselves() {
    let world = campus();
    let academics = &world.registrar.academics;
    let data = academics.create_course(course("CS102")).expect("course").course.id;
    let other = academics.create_course(course("CS103")).expect("course").course.id;

    let err = academics
        .add_requisite(
            data,
            CourseRequisiteInput {
                requisite_course_id: data,
                requisite_type: RequisiteType::PreRequisite,
            },
        )
        .expect_err("self requisite");
    assert!(matches!(err, ServiceError::Rule(RuleViolation::SelfRequisite)));

    academics
        .add_requisite(
            other,
            CourseRequisiteInput {
                requisite_course_id: data,
                requisite_type: RequisiteType::PreRequisite,
            },
        )
        .expect("requisite");
}

#[test]
fn catalog_import_skips_existing_codes() {
    let world = campus();
    let summary = world
        .registrar
        .academics
        .import_courses(vec![course("CS101"), course("MATH101"), course("ENG101")])
        .expect("import");

    assert_eq!(summary.created, vec!["MATH101".to_string(), "ENG101".to_string()]);
    assert_eq!(summary.skipped, vec!["CS101".to_string()]);
    assert_eq!(world.registrar.academics.courses().expect("courses").len(), 3);
}

#[test]
fn generation_continues_after_the_last_suffix() {
    let world = campus();
    let academics = &world.registrar.academics;
    let lab = academics.create_course(course("CS101L")).expect("course").course.id;
    academics
        .add_curriculum_detail(
            world.curriculum,
            CurriculumDetailInput {
                course_id: lab,
                year_order: 1,
                term_order: 1,
                term_alias: "First Semester".to_string(),
                is_include_gwa: true,
            },
        )
        .expect("second course in the term");

    let generate = |count| {
        world
            .registrar
            .sections
            .generate(GenerateSectionsInput {
                curriculum_id: world.curriculum,
                year_order: 1,
                term_order: 1,
                auto_post: false,
                number_of_section: count,
                school_year_id: None,
            })
            .expect("sections")
    };

    let first = generate(2);
    let names: Vec<_> = first.iter().map(|view| view.section.section_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "BSCS-2025_section_1B",
            "BSCS-2025_section_1B",
            "BSCS-2025_section_1C",
            "BSCS-2025_section_1C",
        ]
    );
    assert_eq!(first[0].section.section_code, first[1].section.section_code);
    assert_ne!(first[0].section.section_code, first[2].section.section_code);

    let second = generate(1);
    assert_eq!(second.len(), 2);
    assert!(second
        .iter()
        .all(|view| view.section.section_name == "BSCS-2025_section_1D"));
    assert!(second.iter().all(|view| !view.section.is_posted));
}

#[test]
fn full_sections_refuse_enrollment_and_registrar_approval() {
    let world = campus();
    cap_section(&world, world.section, 1);

    let first = enroll(&world, world.student);
    let second = enroll(&world, student(&world, "Lia Ramos"));
    for action in [
        EnrollmentAction::ProgramChairApproved,
        EnrollmentAction::RegistrarApproved,
    ] {
        record(&world, first, action).expect("first student approved");
    }

    record(&world, second, EnrollmentAction::ProgramChairApproved).expect("chair approval");
    let err = record(&world, second, EnrollmentAction::RegistrarApproved)
        .expect_err("no slot left");
    assert!(matches!(err, ServiceError::Rule(RuleViolation::SectionFull)));

    let err = world
        .registrar
        .enrollment
        .enroll(EnrollmentInput {
            user_id: student(&world, "Noel Cruz"),
            section_id: world.section,
        })
        .expect_err("section full");
    assert!(matches!(err, ServiceError::Rule(RuleViolation::SectionFull)));
}

#[test]
fn rooms_cannot_be_double_booked() {
    let world = campus();
    let academics = &world.registrar.academics;
    let building = academics
        .create_building(BuildingInput {
            campus_id: world.campus,
            name: "Science Hall".to_string(),
            short_name: "SH".to_string(),
            latitude: None,
            longitude: None,
        })
        .expect("building")
        .id;
    let room = academics
        .create_room(RoomInput {
            building_id: building,
            name: "Lecture Room 1".to_string(),
            short_name: "LR1".to_string(),
            floor: 1,
            room_code: "SH-101".to_string(),
            is_lab: false,
            room_capacity: 40,
        })
        .expect("room")
        .id;

    let time = |hour| NaiveTime::from_hms_opt(hour, 0, 0).expect("valid time");
    let slot = |day, start, end| ScheduleAssignmentInput {
        room_id: room,
        day_schedule: day,
        start_time: time(start),
        end_time: time(end),
    };
    let sections = &world.registrar.sections;
    sections
        .add_schedule(world.section, slot(Weekday::Monday, 8, 10))
        .expect("first slot");

    let err = sections
        .add_schedule(world.section, slot(Weekday::Monday, 9, 11))
        .expect_err("overlap");
    assert!(matches!(
        err,
        ServiceError::Rule(RuleViolation::RoomDoubleBooked { .. })
    ));

    sections
        .add_schedule(world.section, slot(Weekday::Monday, 10, 12))
        .expect("back to back");
    sections
        .add_schedule(world.section, slot(Weekday::Tuesday, 9, 11))
        .expect("other day");
}

#[test]
fn deleting_a_section_code_removes_its_grade_book() {
    let world = campus();
    let code = world
        .registrar
        .sections
        .section(world.section)
        .expect("section")
        .section
        .section_code;
    world
        .registrar
        .gradebooks
        .create(GradeBookInput {
            section_id: Some(world.section),
            academic_program_id: world.program,
            is_template: false,
            title: "Lecture Grade Book".to_string(),
            periods: Vec::new(),
        })
        .expect("grade book");

    let removed = world.registrar.sections.delete_by_code(&code).expect("deleted");
    assert_eq!(removed, 1);

    let left = world
        .store
        .read(|db| Ok::<_, StoreError>(db.gradebooks.len()))
        .expect("read");
    assert_eq!(left, 0);
}

#[tokio::test]
async fn reference_records_are_served_by_id() {
    let world = campus();

    let (status, body) = send(world.app(), "GET", &format!("/api/v1/campuses/{}", world.campus), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["short_name"], json!("MAIN"));

    let (status, body) = send(world.app(), "GET", &format!("/api/v1/programs/{}", world.program), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["short_name"], json!("BSCS"));

    let (status, _) = send(world.app(), "GET", "/api/v1/buildings/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
