//! Shared seed data for the HTTP integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::Value;
use tower::ServiceExt;

use registrar::academics::{
    AcademicProgramId, AcademicProgramInput, AcademicTermInput, CampusId, CampusInput, CollegeInput, CourseInput,
    CurriculumDetailInput, CurriculumId, CurriculumInput, CurriculumStatus, GenerateSectionsInput,
    ProgramTypeInput, SchoolYearInput, SectionId,
};
use registrar::clock::FixedClock;
use registrar::config::PolicyConfig;
use registrar::designations::{UserId, UserInput};
use registrar::store::InMemoryStore;
use registrar::Registrar;

pub struct Campus {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    pub registrar: Registrar<InMemoryStore>,
    pub student: UserId,
    pub staff: UserId,
    pub teacher: UserId,
    pub campus: CampusId,
    pub program: AcademicProgramId,
    pub curriculum: CurriculumId,
    pub section: SectionId,
}

impl Campus {
    pub fn app(&self) -> Router {
        self.registrar.router()
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn user(registrar: &Registrar<InMemoryStore>, name: &str, email: &str) -> UserId {
    registrar
        .designations
        .create_user(UserInput {
            name: name.to_string(),
            email: email.to_string(),
            is_admin: false,
        })
        .expect("user")
        .id
}

/// One campus, one active school year, and a posted first-year section of CS101.
pub fn campus() -> Campus {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::on(date(2025, 8, 15)));
    let registrar =
        Registrar::with_store_notifications(Arc::clone(&store), clock.clone(), PolicyConfig::default());

    let student = user(&registrar, "Mara Villanueva", "mara@example.edu");
    let staff = user(&registrar, "Registrar Office", "registrar@example.edu");
    let teacher = user(&registrar, "Paolo Reyes", "paolo@example.edu");

    let academics = &registrar.academics;
    let campus = academics
        .create_campus(CampusInput {
            name: "Main Campus".to_string(),
            short_name: "MAIN".to_string(),
            address: None,
        })
        .expect("campus")
        .id;
    let college = academics
        .create_college(CollegeInput {
            campus_id: campus,
            college_name: "College of Computing".to_string(),
            college_shortname: "CC".to_string(),
        })
        .expect("college")
        .id;
    let program_type = academics
        .create_program_type(ProgramTypeInput {
            name: "Undergraduate".to_string(),
            description: None,
        })
        .expect("program type")
        .id;
    let program = academics
        .create_program(AcademicProgramInput {
            college_id: college,
            program_type_id: program_type,
            program_name: "BS Computer Science".to_string(),
            short_name: "BSCS".to_string(),
            year_first_implemented: date(2010, 6, 1),
        })
        .expect("program")
        .id;
    let term = academics
        .create_academic_term(AcademicTermInput {
            name: "Semester".to_string(),
            suffix: "SEM".to_string(),
            description: None,
            number_of_terms: 2,
        })
        .expect("term")
        .id;
    academics
        .create_school_year(SchoolYearInput {
            school_year_code: "2025-2026".to_string(),
            name: "School Year 2025-2026".to_string(),
            start_date: date(2025, 8, 4),
            end_date: date(2026, 5, 29),
            is_active: true,
        })
        .expect("school year");
    let course = academics
        .create_course(CourseInput {
            course_code: "CS101".to_string(),
            course_title: "Introduction to Computing".to_string(),
            course_description: String::new(),
            with_laboratory: true,
            is_specialize: false,
            lecture_units: 2.0,
            laboratory_units: 1.0,
            credit_units: 3.0,
        })
        .expect("course")
        .course
        .id;
    let curriculum = academics
        .create_curriculum(CurriculumInput {
            academic_program_id: program,
            academic_term_id: term,
            curriculum_code: "BSCS-2025".to_string(),
            curriculum_name: "BSCS Curriculum 2025".to_string(),
            description: None,
            effective_year: 2025,
            total_units: 0,
            total_hours: 0,
            status: CurriculumStatus::Active,
            approved_date: None,
            approved_by: None,
        })
        .expect("curriculum")
        .curriculum
        .id;
    academics
        .add_curriculum_detail(
            curriculum,
            CurriculumDetailInput {
                course_id: course,
                year_order: 1,
                term_order: 1,
                term_alias: "First Semester".to_string(),
                is_include_gwa: true,
            },
        )
        .expect("curriculum detail");
    let section = registrar
        .sections
        .generate(GenerateSectionsInput {
            curriculum_id: curriculum,
            year_order: 1,
            term_order: 1,
            auto_post: true,
            number_of_section: 1,
            school_year_id: None,
        })
        .expect("sections")
        .first()
        .expect("one section")
        .section
        .id;

    Campus {
        store,
        clock,
        registrar,
        student,
        staff,
        teacher,
        campus,
        program,
        curriculum,
        section,
    }
}

pub async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(payload) => builder
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}
