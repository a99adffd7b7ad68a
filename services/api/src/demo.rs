use crate::infra::{live_registrar, open_store, parse_date};
use chrono::{Duration, NaiveDate};
use clap::Args;
use registrar::academics::{
    AcademicCalendarBlueprint, AcademicProgramInput, AcademicTermInput, CampusInput,
    CollegeInput, CourseCatalog, CourseInput, CurriculumDetailInput, CurriculumInput,
    CurriculumStatus, GenerateSectionsInput, ProgramTypeInput, SchoolYearInput,
};
use registrar::admissions::{
    AdmissionApplicationInput, AdmissionScheduleInput, ProgramCriteriaInput, ScoreInput,
    UniversityAdmissionInput,
};
use registrar::clock::FixedClock;
use registrar::config::{AppConfig, PolicyConfig};
use registrar::designations::{UserId, UserInput};
use registrar::enrollment::{EnrollmentAction, EnrollmentInput, EnrollmentLogInput};
use registrar::error::AppError;
use registrar::store::{InMemoryStore, StoreError};
use registrar::Registrar;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CalendarArgs {
    /// First day of the school year (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: NaiveDate,
    /// Last day of the school year (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) end: NaiveDate,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Course catalog CSV export
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// JSON snapshot receiving the courses (overrides REGISTRAR_SNAPSHOT_PATH)
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// First day of the demo school year (YYYY-MM-DD). Defaults to 2025-08-04.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Print the report as JSON instead of the step listing.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_calendar(args: CalendarArgs) -> Result<(), AppError> {
    let CalendarArgs { start, end } = args;
    let planned = AcademicCalendarBlueprint::standard().plan(start, end);

    println!("Academic calendar {start} to {end}");
    for event in planned {
        println!(
            "{:>2}. {} .. {}  {:<30} {}",
            event.order,
            event.start_date,
            event.end_date,
            event.event.label(),
            event.name
        );
    }
    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let snapshot = args.snapshot.or(config.storage.snapshot_path);
    let store = open_store(snapshot.as_deref())?;
    let registrar = live_registrar(store, config.policy);

    let courses = CourseCatalog::from_path(&args.csv)?;
    let summary = registrar.academics.import_courses(courses)?;

    println!(
        "Imported {} course(s) from {}",
        summary.created.len(),
        args.csv.display()
    );
    if !summary.skipped.is_empty() {
        println!("Skipped existing codes: {}", summary.skipped.join(", "));
    }
    if snapshot.is_none() {
        println!("No snapshot configured; the catalog was not persisted.");
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let report = build_demo(args.start.unwrap_or_else(default_start))?;
    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("Failed to serialize demo report: {err}"),
        }
    } else {
        render_demo(&report);
    }
    Ok(())
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 4).unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub(crate) struct DemoReport {
    pub(crate) school_year: String,
    pub(crate) calendar_events: usize,
    pub(crate) application_trail: Vec<String>,
    pub(crate) evaluation_percent: f64,
    pub(crate) threshold: f64,
    pub(crate) section_name: String,
    pub(crate) enrollment_trail: Vec<String>,
    pub(crate) curriculum_tagging: Option<String>,
    pub(crate) notifications: Vec<String>,
}

fn user(registrar: &Registrar<InMemoryStore>, name: &str, email: &str) -> Result<UserId, AppError> {
    Ok(registrar
        .designations
        .create_user(UserInput {
            name: name.to_string(),
            email: email.to_string(),
            is_admin: false,
        })?
        .id)
}

/// Seeds one school year and walks an applicant from admission to official enrollment.
pub(crate) fn build_demo(start: NaiveDate) -> Result<DemoReport, AppError> {
    let today = start + Duration::days(11);
    let store = Arc::new(InMemoryStore::new());
    let registrar = Registrar::with_store_notifications(
        store,
        Arc::new(FixedClock::on(today)),
        PolicyConfig::default(),
    );
    let academics = &registrar.academics;

    let applicant = user(&registrar, "Maria Santos", "maria.santos@example.edu")?;
    let evaluator = user(&registrar, "Admissions Evaluator", "admissions@example.edu")?;
    let staff = user(&registrar, "Registrar Office", "registrar@example.edu")?;

    let campus = academics
        .create_campus(CampusInput {
            name: "Main Campus".to_string(),
            short_name: "MAIN".to_string(),
            address: None,
        })?
        .id;
    let college = academics
        .create_college(CollegeInput {
            campus_id: campus,
            college_name: "College of Computing Studies".to_string(),
            college_shortname: "CCS".to_string(),
        })?
        .id;
    let program_type = academics
        .create_program_type(ProgramTypeInput {
            name: "Undergraduate".to_string(),
            description: None,
        })?
        .id;
    let program = academics
        .create_program(AcademicProgramInput {
            college_id: college,
            program_type_id: program_type,
            program_name: "Bachelor of Science in Computer Science".to_string(),
            short_name: "BSCS".to_string(),
            year_first_implemented: start,
        })?
        .id;
    let term = academics
        .create_academic_term(AcademicTermInput {
            name: "Semester".to_string(),
            suffix: "SEM".to_string(),
            description: None,
            number_of_terms: 2,
        })?
        .id;

    let end = start + Duration::days(298);
    let school_year = academics.create_school_year(SchoolYearInput {
        school_year_code: format!("{}-{}", start.format("%Y"), end.format("%Y")),
        name: format!("School Year {}-{}", start.format("%Y"), end.format("%Y")),
        start_date: start,
        end_date: end,
        is_active: true,
    })?;
    let school_year_id = school_year.school_year.id;
    let calendar_events = academics.calendar(school_year_id)?.len();

    let admission = registrar
        .university
        .create_admission(UniversityAdmissionInput {
            school_year_id,
            open_date: start,
            close_date: start + Duration::days(57),
            is_open_override: false,
        })?
        .admission
        .id;
    let schedule = registrar
        .admissions
        .create_schedule(AdmissionScheduleInput {
            university_admission_id: admission,
            academic_program_id: program,
            start_date: start + Duration::days(6),
            end_date: start + Duration::days(42),
        })?
        .id;
    let mut criteria = Vec::new();
    for (title, max_score, weight, score) in [("Interview", 100.0, 60.0, 90.0), ("Written Exam", 50.0, 40.0, 45.0)] {
        let row = registrar.admissions.create_criteria(ProgramCriteriaInput {
            academic_program_id: program,
            school_year_id,
            title: title.to_string(),
            description: None,
            max_score,
            min_score: 0.0,
            weight,
            is_active: true,
        })?;
        criteria.push(ScoreInput {
            criteria_id: row.id,
            user_id: evaluator,
            score,
            comments: None,
            is_posted: true,
        });
    }

    let application = registrar
        .admissions
        .submit_application(AdmissionApplicationInput {
            user_id: applicant,
            admission_schedule_id: schedule,
            year: None,
            first_name: "Maria".to_string(),
            last_name: "Santos".to_string(),
            middle_name: None,
            email: "maria.santos@example.edu".to_string(),
            phone: None,
            address: None,
        })?
        .application
        .id;
    let scoring = registrar.admissions.upsert_scores(application, criteria)?;
    let application_trail = registrar
        .admissions
        .logs(application)?
        .into_iter()
        .map(|log| format!("{} ({})", log.status.label(), log.note.unwrap_or_default()))
        .collect();

    let course = academics
        .create_course(CourseInput {
            course_code: "CS101".to_string(),
            course_title: "Introduction to Computing".to_string(),
            course_description: "Foundations of computing and problem solving.".to_string(),
            with_laboratory: true,
            is_specialize: false,
            lecture_units: 2.0,
            laboratory_units: 1.0,
            credit_units: 3.0,
        })?
        .course
        .id;
    let curriculum = academics
        .create_curriculum(CurriculumInput {
            academic_program_id: program,
            academic_term_id: term,
            curriculum_code: "BSCS".to_string(),
            curriculum_name: "BSCS Curriculum".to_string(),
            description: None,
            effective_year: 2025,
            total_units: 3,
            total_hours: 54,
            status: CurriculumStatus::Active,
            approved_date: None,
            approved_by: None,
        })?
        .curriculum
        .id;
    academics.add_curriculum_detail(
        curriculum,
        CurriculumDetailInput {
            course_id: course,
            year_order: 1,
            term_order: 1,
            term_alias: "First Semester".to_string(),
            is_include_gwa: true,
        },
    )?;
    let sections = registrar.sections.generate(GenerateSectionsInput {
        curriculum_id: curriculum,
        year_order: 1,
        term_order: 1,
        auto_post: true,
        number_of_section: 1,
        school_year_id: Some(school_year_id),
    })?;
    let section = sections
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::NotFound {
            entity: "section",
            id: format!("curriculum {curriculum}"),
        })?;

    let enrollment = registrar
        .enrollment
        .enroll(EnrollmentInput {
            user_id: applicant,
            section_id: section.section.id,
        })?
        .enrollment
        .id;
    for action in [
        EnrollmentAction::ProgramChairApproved,
        EnrollmentAction::RegistrarApproved,
    ] {
        registrar.enrollment.record(
            enrollment,
            EnrollmentLogInput {
                action,
                logged_by: staff,
            },
        )?;
    }
    let enrollment_trail = registrar
        .enrollment
        .logs(enrollment)?
        .into_iter()
        .map(|log| log.action.label().to_string())
        .collect();

    let curriculum_tagging = registrar
        .academics
        .curriculum_taggings(applicant)?
        .into_iter()
        .find(|tagging| tagging.tagging.is_active)
        .map(|tagging| tagging.curriculum_code);
    let notifications = registrar
        .notifications
        .unread_for(applicant)?
        .into_iter()
        .map(|notification| notification.title)
        .collect();

    Ok(DemoReport {
        school_year: school_year.school_year.school_year_code,
        calendar_events,
        application_trail,
        evaluation_percent: scoring.evaluation.percent,
        threshold: scoring.evaluation.threshold,
        section_name: section.section.section_name,
        enrollment_trail,
        curriculum_tagging,
        notifications,
    })
}

fn render_demo(report: &DemoReport) {
    println!("=== School year {} ===", report.school_year);
    println!("Standard calendar generated with {} events", report.calendar_events);

    println!("\n=== Admission application ===");
    println!(
        "Evaluation: {:.2}% against a {:.2}% threshold",
        report.evaluation_percent, report.threshold
    );
    for (step, entry) in report.application_trail.iter().enumerate() {
        println!("{:>2}. {}", step + 1, entry);
    }

    println!("\n=== Enrollment in {} ===", report.section_name);
    for (step, entry) in report.enrollment_trail.iter().enumerate() {
        println!("{:>2}. {}", step + 1, entry);
    }
    match &report.curriculum_tagging {
        Some(code) => println!("Curriculum tagging: {code}"),
        None => println!("Curriculum tagging: none"),
    }

    println!("\n=== Unread notifications ===");
    for title in &report.notifications {
        println!("- {title}");
    }
}
