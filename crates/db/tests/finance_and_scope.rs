//! Repository-level tests for project scoping, crew payroll and the finance
//! and progress aggregates built on top of them.

use std::str::FromStr;

use assert_matches::assert_matches;
use dreamlight_core::access::ProjectScopeBinds;
use dreamlight_db::models::finance::{CreateFinance, UpdateFinance};
use dreamlight_db::models::milestone::{CreateMilestone, UpdateMilestone};
use dreamlight_db::models::project::{CreateProject, Project, ProjectParties};
use dreamlight_db::models::user::{CreateUser, User};
use dreamlight_db::repositories::{
    FinanceRepo, MilestoneRepo, PayCrewOutcome, ProjectCrewRepo, ProjectRepo, UserRepo,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn money(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

async fn new_user(pool: &PgPool, name: &str, role: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            name: name.to_string(),
            email: format!("{}@test.com", name.to_lowercase()),
            password_hash: "not-a-real-hash".to_string(),
            role: role.to_string(),
        },
    )
    .await
    .unwrap()
}

async fn new_project(
    pool: &PgPool,
    title: &str,
    producer: Option<&User>,
    client: Option<&User>,
) -> Project {
    let input = CreateProject {
        title: title.to_string(),
        client_id: client.map(|u| u.id),
        investor_id: None,
        producer_id: producer.map(|u| u.id),
        project_type: "Movie".to_string(),
        total_budget_plan: Some(money("5000")),
        target_income: None,
        start_date: None,
        deadline_date: None,
        description: None,
        global_status: None,
    };
    let parties = ProjectParties {
        client_name: client.map(|u| u.name.clone()),
        investor_name: None,
        producer_name: producer.map(|u| u.name.clone()),
    };
    ProjectRepo::create(pool, &input, &parties).await.unwrap()
}

fn task(project_id: i64, user_id: i64, phase: &str, status: &str, honor: &str) -> CreateMilestone {
    CreateMilestone {
        project_id,
        episode_id: None,
        user_id,
        task_name: format!("{phase} task"),
        phase_category: phase.to_string(),
        work_status: Some(status.to_string()),
        honor_amount: Some(money(honor)),
        payment_status: None,
    }
}

fn transaction(project_id: i64, kind: &str, amount: &str, status: &str) -> CreateFinance {
    CreateFinance {
        project_id,
        finance_type: kind.to_string(),
        category: "General".to_string(),
        amount: money(amount),
        transaction_date: None,
        description: None,
        status: Some(status.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Scoping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_scope_limits_projects_per_party(pool: PgPool) {
    let producer = new_user(&pool, "Producer", "producer").await;
    let client = new_user(&pool, "Client", "broadcaster").await;
    let crew = new_user(&pool, "Grip", "crew").await;

    let owned = new_project(&pool, "Owned", Some(&producer), None).await;
    let commissioned = new_project(&pool, "Commissioned", None, Some(&client)).await;
    ProjectCrewRepo::assign(&pool, commissioned.id, crew.id, Some("Grip"), producer.id)
        .await
        .unwrap();

    let everything = ProjectRepo::scoped_ids(&pool, &ProjectScopeBinds::default())
        .await
        .unwrap();
    assert_eq!(everything, vec![owned.id, commissioned.id]);

    let by_producer = ProjectScopeBinds {
        producer_id: Some(producer.id),
        ..Default::default()
    };
    assert_eq!(
        ProjectRepo::scoped_ids(&pool, &by_producer).await.unwrap(),
        vec![owned.id]
    );

    let by_client = ProjectScopeBinds {
        client_id: Some(client.id),
        ..Default::default()
    };
    assert_eq!(
        ProjectRepo::scoped_ids(&pool, &by_client).await.unwrap(),
        vec![commissioned.id]
    );

    let by_crew = ProjectScopeBinds {
        crew_user_id: Some(crew.id),
        ..Default::default()
    };
    let crewed = ProjectRepo::list_all_scoped(&pool, &by_crew).await.unwrap();
    assert_eq!(crewed.len(), 1);
    assert_eq!(crewed[0].client_name.as_deref(), Some("Client"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_crew_assignment_violates_unique(pool: PgPool) {
    let producer = new_user(&pool, "Producer", "producer").await;
    let crew = new_user(&pool, "Gaffer", "crew").await;
    let project = new_project(&pool, "Lights", Some(&producer), None).await;

    ProjectCrewRepo::assign(&pool, project.id, crew.id, None, producer.id)
        .await
        .unwrap();
    let err = ProjectCrewRepo::assign(&pool, project.id, crew.id, None, producer.id)
        .await
        .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(ref db) if db.is_unique_violation());

    let inserted = ProjectCrewRepo::assign_many(&pool, project.id, &[crew.id], None, producer.id)
        .await
        .unwrap();
    assert!(inserted.is_empty());
}

// ---------------------------------------------------------------------------
// Payroll and totals
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_pay_crew_marks_paid_and_records_expense(pool: PgPool) {
    let producer = new_user(&pool, "Producer", "producer").await;
    let crew = new_user(&pool, "Editor", "crew").await;
    let project = new_project(&pool, "Cutroom", Some(&producer), None).await;
    let milestone = MilestoneRepo::create(
        &pool,
        &task(project.id, crew.id, "Post-Production", "Done", "450.00"),
    )
    .await
    .unwrap();

    let outcome = FinanceRepo::pay_crew(&pool, milestone.id).await.unwrap();
    let (paid, finance) = match outcome {
        PayCrewOutcome::Paid { milestone, finance } => (milestone, finance),
        other => panic!("expected Paid, got {other:?}"),
    };
    assert_eq!(paid.payment_status, "Paid");
    assert_eq!(finance.finance_type, "Expense");
    assert_eq!(finance.status, "Paid");
    assert_eq!(finance.amount, money("450.00"));
    assert_eq!(finance.category, "Honor Crew: Editor - Post-Production task");
    assert_eq!(finance.milestone_id, Some(milestone.id));

    assert_matches!(
        FinanceRepo::pay_crew(&pool, milestone.id).await.unwrap(),
        PayCrewOutcome::AlreadyPaid
    );
    assert_matches!(
        FinanceRepo::pay_crew(&pool, milestone.id + 1000).await.unwrap(),
        PayCrewOutcome::NotFound
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_totals_count_crew_honors_once(pool: PgPool) {
    let producer = new_user(&pool, "Producer", "producer").await;
    let crew = new_user(&pool, "Sound", "crew").await;
    let project = new_project(&pool, "Mix", Some(&producer), None).await;

    for input in [
        transaction(project.id, "Expense", "100.00", "Paid"),
        transaction(project.id, "Expense", "50.00", "Pending"),
        transaction(project.id, "Income", "900.00", "Received"),
        transaction(project.id, "Income", "300.00", "Pending"),
    ] {
        FinanceRepo::create(&pool, &input).await.unwrap();
    }
    let milestone = MilestoneRepo::create(&pool, &task(project.id, crew.id, "Production", "Done", "200.00"))
        .await
        .unwrap();
    FinanceRepo::pay_crew(&pool, milestone.id).await.unwrap();

    let (totals, crew_paid) = FinanceRepo::totals(&pool, &[project.id]).await.unwrap();
    assert_eq!(totals.expense, money("150.00"));
    assert_eq!(totals.income_received, money("900.00"));
    assert_eq!(totals.income_pending, money("300.00"));
    assert_eq!(crew_paid, money("200.00"));

    let per_project = FinanceRepo::totals_by_project(&pool, &[project.id, project.id + 1000])
        .await
        .unwrap();
    assert_eq!(per_project.len(), 2);
    assert_eq!(per_project[0].crew_paid, money("200.00"));
    assert_eq!(per_project[1].expense, Decimal::ZERO);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_totals_ignore_category_text_when_matching_payouts(pool: PgPool) {
    let producer = new_user(&pool, "Producer", "producer").await;
    let crew = new_user(&pool, "Colorist", "crew").await;
    let project = new_project(&pool, "Grade", Some(&producer), None).await;

    let manual = CreateFinance {
        category: "Honor Crew: Freelance driver".to_string(),
        ..transaction(project.id, "Expense", "80.00", "Paid")
    };
    FinanceRepo::create(&pool, &manual).await.unwrap();

    let milestone = MilestoneRepo::create(&pool, &task(project.id, crew.id, "Master", "Done", "120.00"))
        .await
        .unwrap();
    let payout = match FinanceRepo::pay_crew(&pool, milestone.id).await.unwrap() {
        PayCrewOutcome::Paid { finance, .. } => finance,
        other => panic!("expected Paid, got {other:?}"),
    };
    let renamed = UpdateFinance {
        category: Some("Color grading".to_string()),
        ..Default::default()
    };
    FinanceRepo::update(&pool, payout.id, &renamed).await.unwrap();

    let (totals, crew_paid) = FinanceRepo::totals(&pool, &[project.id]).await.unwrap();
    assert_eq!(totals.expense, money("80.00"));
    assert_eq!(crew_paid, money("120.00"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_payout_survives_crew_deletion_and_unpaid_reset(pool: PgPool) {
    let producer = new_user(&pool, "Producer", "producer").await;
    let gone = new_user(&pool, "Runner", "crew").await;
    let stays = new_user(&pool, "Boom", "crew").await;
    let project = new_project(&pool, "Ledger", Some(&producer), None).await;

    let first = MilestoneRepo::create(&pool, &task(project.id, gone.id, "Production", "Done", "300.00"))
        .await
        .unwrap();
    let second = MilestoneRepo::create(&pool, &task(project.id, stays.id, "Production", "Done", "40.00"))
        .await
        .unwrap();
    FinanceRepo::pay_crew(&pool, first.id).await.unwrap();
    FinanceRepo::pay_crew(&pool, second.id).await.unwrap();

    assert!(UserRepo::delete(&pool, gone.id).await.unwrap());
    let reset = UpdateMilestone {
        payment_status: Some("Unpaid".to_string()),
        ..Default::default()
    };
    MilestoneRepo::update(&pool, second.id, &reset).await.unwrap();

    let (totals, crew_paid) = FinanceRepo::totals(&pool, &[project.id]).await.unwrap();
    assert_eq!(totals.expense, money("340.00"));
    assert_eq!(crew_paid, Decimal::ZERO);

    let per_project = FinanceRepo::totals_by_project(&pool, &[project.id]).await.unwrap();
    assert_eq!(per_project[0].expense, money("340.00"));
}

// ---------------------------------------------------------------------------
// Progress aggregates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_phase_counts_group_by_project_and_phase(pool: PgPool) {
    let producer = new_user(&pool, "Producer", "producer").await;
    let crew = new_user(&pool, "Camera", "crew").await;
    let first = new_project(&pool, "First", Some(&producer), None).await;
    let second = new_project(&pool, "Second", Some(&producer), None).await;

    for input in [
        task(first.id, crew.id, "Production", "Done", "0"),
        task(first.id, crew.id, "Production", "Pending", "0"),
        task(first.id, crew.id, "Master", "Done", "0"),
    ] {
        MilestoneRepo::create(&pool, &input).await.unwrap();
    }

    let counts = MilestoneRepo::phase_counts_for_projects(&pool, &[first.id, second.id])
        .await
        .unwrap();
    assert!(!counts.contains_key(&second.id));

    let mut rows = counts[&first.id].clone();
    rows.sort_by(|a, b| a.phase_category.cmp(&b.phase_category));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].phase_category, "Master");
    assert_eq!((rows[0].total, rows[0].done), (1, 1));
    assert_eq!(rows[1].phase_category, "Production");
    assert_eq!((rows[1].total, rows[1].done), (2, 1));

    let stats = MilestoneRepo::payment_stats(&pool, crew.id).await.unwrap();
    assert_eq!(stats.active_task_count, 1);
}
