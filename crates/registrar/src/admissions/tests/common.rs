use std::sync::Arc;

use chrono::NaiveDate;

use crate::academics::{
    AcademicProgram, AcademicProgramId, Campus, College, ProgramType, SchoolYear, SchoolYearId,
};
use crate::admissions::{
    AdmissionApplicationId, AdmissionApplicationInput, AdmissionScheduleId, AdmissionService,
    ProgramCriteria, ProgramCriteriaId, ScoreInput, UniversityAdmission, UniversityAdmissionId,
    UniversityAdmissionService,
};
use crate::clock::{Clock, FixedClock};
use crate::config::PolicyConfig;
use crate::designations::{User, UserId};
use crate::notifications::{NotificationPublisher, StoreNotificationPublisher};
use crate::service::ServiceContext;
use crate::store::{Database, InMemoryStore, Store, StoreError};

pub(super) struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    pub service: Arc<AdmissionService<InMemoryStore>>,
    pub university: Arc<UniversityAdmissionService<InMemoryStore>>,
    pub applicant: UserId,
    pub evaluator: UserId,
    pub chair: UserId,
    pub program: AcademicProgramId,
    pub other_program: AcademicProgramId,
    pub school_year: SchoolYearId,
    pub admission: UniversityAdmissionId,
    pub schedule: AdmissionScheduleId,
    pub interview: ProgramCriteriaId,
    pub exam: ProgramCriteriaId,
}

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn user(db: &mut Database, name: &str) -> UserId {
    db.users
        .insert_with(|id| User {
            id,
            name: name.to_string(),
            email: format!("{}@example.edu", name.to_lowercase()),
            is_admin: false,
        })
        .id
}

fn seed_program(db: &mut Database, name: &str, short_name: &str) -> AcademicProgramId {
    let campus = db.campuses.insert_with(|id| Campus {
        id,
        name: "Main Campus".to_string(),
        short_name: "MAIN".to_string(),
        address: None,
    });
    let college = db.colleges.insert_with(|id| College {
        id,
        campus_id: campus.id,
        college_name: "College of Computing".to_string(),
        college_shortname: "CCS".to_string(),
    });
    let program_type = db.program_types.insert_with(|id| ProgramType {
        id,
        name: "Undergraduate".to_string(),
        description: None,
    });
    db.programs
        .insert_with(|id| AcademicProgram {
            id,
            college_id: college.id,
            program_type_id: program_type.id,
            program_name: name.to_string(),
            short_name: short_name.to_string(),
            year_first_implemented: date(2010, 6, 1),
        })
        .id
}

fn criteria(
    db: &mut Database,
    program: AcademicProgramId,
    school_year: SchoolYearId,
    title: &str,
    max_score: f64,
    weight: f64,
) -> ProgramCriteriaId {
    db.program_criteria
        .insert_with(|id| ProgramCriteria {
            id,
            academic_program_id: program,
            school_year_id: school_year,
            title: title.to_string(),
            description: None,
            max_score,
            min_score: 0.0,
            weight,
            is_active: true,
        })
        .id
}

/// School year 2025-2026 with an admission window from August 4 to September 30 and the
/// clock pinned to August 15, 2025.
pub(super) fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::on(date(2025, 8, 15)));

    let seeded = store
        .write(|db| {
            let applicant = user(db, "Applicant");
            let evaluator = user(db, "Evaluator");
            let chair = user(db, "Chair");
            let program = seed_program(db, "Bachelor of Science in Computer Science", "BSCS");
            let other_program = seed_program(db, "Bachelor of Science in Nursing", "BSN");
            let school_year = db
                .school_years
                .insert_with(|id| SchoolYear {
                    id,
                    school_year_code: "SY2025-2026".to_string(),
                    name: "School Year 2025-2026".to_string(),
                    start_date: date(2025, 8, 4),
                    end_date: date(2026, 5, 29),
                    is_active: true,
                })
                .id;
            let admission = db
                .university_admissions
                .insert_with(|id| UniversityAdmission {
                    id,
                    school_year_id: school_year,
                    open_date: date(2025, 8, 4),
                    close_date: date(2025, 9, 30),
                    is_open_override: false,
                })
                .id;
            let schedule = db
                .admission_schedules
                .insert_with(|id| crate::admissions::AdmissionSchedule {
                    id,
                    university_admission_id: admission,
                    academic_program_id: program,
                    start_date: date(2025, 8, 10),
                    end_date: date(2025, 9, 15),
                })
                .id;
            let interview = criteria(db, program, school_year, "Interview", 100.0, 60.0);
            let exam = criteria(db, program, school_year, "Written Exam", 50.0, 40.0);
            criteria(db, other_program, school_year, "Clinical Aptitude", 100.0, 100.0);
            Ok::<_, StoreError>((
                applicant,
                evaluator,
                chair,
                program,
                other_program,
                school_year,
                admission,
                schedule,
                interview,
                exam,
            ))
        })
        .expect("seed database");

    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let publisher: Arc<dyn NotificationPublisher> = Arc::new(StoreNotificationPublisher::new(
        Arc::clone(&store),
        Arc::clone(&dyn_clock),
    ));
    let ctx = ServiceContext::new(
        Arc::clone(&store),
        dyn_clock,
        publisher,
        PolicyConfig::default(),
    );

    let (applicant, evaluator, chair, program, other_program, school_year, admission, schedule, interview, exam) =
        seeded;
    Fixture {
        service: Arc::new(AdmissionService::new(ctx.clone())),
        university: Arc::new(UniversityAdmissionService::new(ctx)),
        store,
        clock,
        applicant,
        evaluator,
        chair,
        program,
        other_program,
        school_year,
        admission,
        schedule,
        interview,
        exam,
    }
}

pub(super) fn application_input(fixture: &Fixture) -> AdmissionApplicationInput {
    AdmissionApplicationInput {
        user_id: fixture.applicant,
        admission_schedule_id: fixture.schedule,
        year: None,
        first_name: "Maria".to_string(),
        last_name: "Santos".to_string(),
        middle_name: Some("Reyes".to_string()),
        email: "maria.santos@example.com".to_string(),
        phone: None,
        address: None,
    }
}

pub(super) fn submit(fixture: &Fixture) -> AdmissionApplicationId {
    fixture
        .service
        .submit_application(application_input(fixture))
        .expect("application submitted")
        .application
        .id
}

pub(super) fn score(
    fixture: &Fixture,
    criteria: ProgramCriteriaId,
    value: f64,
    is_posted: bool,
) -> ScoreInput {
    ScoreInput {
        criteria_id: criteria,
        user_id: fixture.evaluator,
        score: value,
        comments: None,
        is_posted,
    }
}
