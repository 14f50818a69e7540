//! Warden insurance dashboard reference: demo CLI
//!
//! Runs the reference scenarios against the built-in insurance policy, or
//! loads a policy document and answers a single access question.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- scenario company-scope
//!   cargo run -p demo -- check --role risk_analyst --resource assessments \
//!       --action create --target '{"companyId":"acme"}'
//!   cargo run -p demo -- check --policy path/to/policy.toml

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use warden_contracts::{
    context::{PermissionContext, Target},
    error::{WardenError, WardenResult},
    user::UserAuth,
};
use warden_core::AccessGuard;
use warden_policy::PolicyDocument;
use warden_ref_insurance::{
    policy::insurance_document,
    scenarios::{assessment_workflow, company_scope, custom_roles, missing_permission, system_roles},
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Warden permission evaluation engine demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Warden insurance dashboard reference demo",
    long_about = "Runs Warden demo scenarios showing company and ownership scope,\n\
                  field conditions, role inheritance, and system role protection."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all five scenarios in sequence.
    RunAll,
    /// Run a single scenario.
    Scenario {
        #[arg(value_enum)]
        name: ScenarioName,
    },
    /// Load a policy document and optionally decide one request.
    Check(CheckArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum ScenarioName {
    /// Scenario 1: company-scoped assessment creation.
    CompanyScope,
    /// Scenario 2: permission outside the effective set.
    MissingPermission,
    /// Scenario 3: built-in roles are immutable.
    SystemRoles,
    /// Scenario 4: custom role chains.
    CustomRoles,
    /// Scenario 5: assessment workflow.
    AssessmentWorkflow,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Policy document to load. Defaults to the built-in insurance policy.
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Additional documents (custom roles) layered on top, in order.
    #[arg(long)]
    overlay: Vec<PathBuf>,

    /// Acting user id.
    #[arg(long, default_value = "u-cli")]
    user: String,

    /// Acting user's company id.
    #[arg(long, default_value = "acme")]
    company: String,

    /// Role ids assigned to the user. Repeatable.
    #[arg(long)]
    role: Vec<String>,

    /// Permission ids granted directly to the user. Repeatable.
    #[arg(long)]
    grant: Vec<String>,

    #[arg(long, requires = "action")]
    resource: Option<String>,

    #[arg(long, requires = "resource")]
    action: Option<String>,

    /// Target record as JSON.
    #[arg(long)]
    target: Option<String>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug to see every decision.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::RunAll => {
            print_banner();
            run_all()
        }
        Command::Scenario { name } => {
            print_banner();
            run_one(name)
        }
        Command::Check(args) => run_check(args),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> WardenResult<()> {
    for name in ScenarioName::value_variants() {
        run_one(*name)?;
    }
    println!("All scenarios completed successfully.");
    Ok(())
}

fn run_one(name: ScenarioName) -> WardenResult<()> {
    match name {
        ScenarioName::CompanyScope => company_scope::run_scenario(),
        ScenarioName::MissingPermission => missing_permission::run_scenario(),
        ScenarioName::SystemRoles => system_roles::run_scenario(),
        ScenarioName::CustomRoles => custom_roles::run_scenario(),
        ScenarioName::AssessmentWorkflow => assessment_workflow::run_scenario(),
    }
}

// ── Check ─────────────────────────────────────────────────────────────────────

fn run_check(args: CheckArgs) -> WardenResult<()> {
    let mut document = match &args.policy {
        Some(path) => PolicyDocument::from_file(path)?,
        None => insurance_document()?,
    };
    for path in &args.overlay {
        document.extend(PolicyDocument::from_file(path)?);
    }

    let (engine, report) = document.into_engine()?;
    info!(snapshot_id = %report.snapshot_id, "policy loaded");
    println!(
        "Loaded {} permission(s) and {} role(s).",
        report.permissions, report.roles
    );
    for problem in &report.quarantined {
        println!("  quarantined: {}", problem);
    }

    let (Some(resource), Some(action)) = (&args.resource, &args.action) else {
        return Ok(());
    };

    let user = UserAuth::new(args.user.as_str(), args.company.as_str())
        .with_roles(args.role.iter().map(String::as_str))
        .with_direct_permissions(args.grant.iter().map(String::as_str));

    let target = args
        .target
        .as_deref()
        .map(|raw| {
            serde_json::from_str::<serde_json::Value>(raw)
                .map(Target::new)
                .map_err(|e| WardenError::InvalidTarget {
                    reason: format!("target is not valid JSON: {}", e),
                })
        })
        .transpose()?;

    let guard = engine.guard(&user);
    let result = guard.can_access_resource(resource, action, target.as_ref());

    println!();
    println!("{} {} {}:", user.id, action, resource);
    println!("  allowed: {}", result.allowed);
    println!("  reason:  {}", result.reason);
    println!("  detail:  {}", result.message);
    if !result.failed_checks.is_empty() {
        let failures = serde_json::to_string_pretty(&result.failed_checks).unwrap_or_default();
        println!("  failed checks: {}", failures);
    }

    let ctx = PermissionContext {
        target,
        ..PermissionContext::default()
    };
    let ids: Vec<String> = guard.permission_ids().iter().map(ToString::to_string).collect();
    let held: Vec<&str> = ids
        .iter()
        .map(String::as_str)
        .filter(|id| guard.has_permission(id, &ctx))
        .collect();
    println!("  passing for this target: {}", held.join(", "));
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Warden — Permission Evaluation Engine");
    println!("Insurance Risk Dashboard Reference Demo");
    println!("=======================================");
    println!();
    println!("Evaluation pipeline per check:");
    println!("  [1] Resolve the user's effective permissions (roles + inheritance + direct grants)");
    println!("  [2] Keep the entries matching (resource, action); none → NoMatchingPermission");
    println!("  [3] Try each in catalog order: scope check, then every condition");
    println!("  [4] First entry passing both grants access; otherwise ScopeOrConditionFailed");
    println!();
}
