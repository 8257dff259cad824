use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use calc_core::inspection::{InspectionItem, InspectionSchedule};
use calc_core::project::ItemRun;
use calc_core::{file_io, CalcError, CalculationItem, FileLock, Project};
use serde::Serialize;
use tracing::info;

use super::{json_arg, pass_fail, Report};
use crate::cli::JobCommand;
use crate::config::CliConfig;

const FALLBACK_USER: &str = "voltline";

#[derive(Debug, Serialize)]
struct AddedItem {
    id: uuid::Uuid,
    label: String,
    calc_type: String,
    item_count: usize,
}

#[derive(Debug, Serialize)]
struct JobRun {
    job_ref: String,
    passed: usize,
    failed: usize,
    errors: usize,
    runs: Vec<ItemRun>,
}

fn lock_user(user: &Option<String>) -> String {
    user.clone()
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| FALLBACK_USER.to_string())
}

pub fn run_job(action: &JobCommand, config: &CliConfig) -> Result<Report> {
    match action {
        JobCommand::New {
            path,
            electrician,
            job_ref,
            client,
            site,
        } => new_job(path, electrician, job_ref, client, site, config),
        JobCommand::Add { path, item, user } => add_item(path, item, &lock_user(user)),
        JobCommand::Show { path } => show_job(path),
        JobCommand::Run { path } => run_items(path),
        JobCommand::Inspect {
            path,
            item,
            outcome,
            description,
            clause,
            notes,
            certificate,
            user,
        } => {
            let _lock = FileLock::acquire(path, lock_user(user))?;
            let mut project = file_io::load_project(path)?;
            let schedule = project
                .inspection
                .get_or_insert_with(|| InspectionSchedule::new(*certificate));

            if schedule.items.iter().any(|i| &i.item_number == item) {
                schedule.set_outcome(item, *outcome, notes.clone())?;
            } else {
                let description = description
                    .clone()
                    .ok_or_else(|| CalcError::missing_field("description"))?;
                let mut new_item = InspectionItem::new(item.clone(), description, clause.clone());
                new_item.outcome = *outcome;
                new_item.notes = notes.clone();
                schedule.add_item(new_item);
            }
            let summary = schedule.summary();
            let assessment = schedule.overall_assessment();
            project.touch();
            file_io::save_project(&project, path)?;

            let text = format!(
                "Item {} recorded as {} ({} items, installation {:?})",
                item,
                outcome.code(),
                summary.total,
                assessment
            );
            Report::new(&summary, text)
        }
    }
}

fn new_job(path: &Path, electrician: &str, job_ref: &str, client: &str, site: &str, config: &CliConfig) -> Result<Report> {
    if path.exists() {
        return Err(CalcError::file_error("create", path.display().to_string(), "file already exists").into());
    }
    let mut project = Project::new(electrician, job_ref, client);
    project.meta.site_address = site.to_string();
    project.settings.nominal_voltage_v = config.supply.nominal_voltage_v;
    project.settings.lighting_vdrop_percent = config.design.lighting_vdrop_percent;
    project.settings.other_vdrop_percent = config.design.other_vdrop_percent;
    file_io::save_project(&project, path)?;
    info!(path = %path.display(), job_ref, "job created");

    let text = format!("Created job {} at {}", job_ref, path.display());
    Report::new(&project.meta, text)
}

fn add_item(path: &Path, item_arg: &str, user: &str) -> Result<Report> {
    let item: CalculationItem = serde_json::from_str(&json_arg(item_arg)?)
        .map_err(|e| CalcError::serialization(format!("invalid calculation item: {}", e)))?;

    let _lock = FileLock::acquire(path, user)?;
    let mut project = file_io::load_project(path).with_context(|| format!("loading {}", path.display()))?;
    let label = item.label().to_string();
    let calc_type = item.calc_type().to_string();
    let id = project.add_item(item);
    file_io::save_project(&project, path)?;

    let text = format!("Added {} '{}' ({} items)", calc_type, label, project.item_count());
    Report::new(
        &AddedItem {
            id,
            label,
            calc_type,
            item_count: project.item_count(),
        },
        text,
    )
}

fn show_job(path: &Path) -> Result<Report> {
    let (project, lock) = file_io::load_project_with_lock_check(path)?;
    let meta = &project.meta;

    let mut text = String::new();
    writeln!(text, "Job {} for {}", meta.job_ref, meta.client)?;
    writeln!(text, "  Electrician: {}", meta.electrician)?;
    if !meta.site_address.is_empty() {
        writeln!(text, "  Site:        {}", meta.site_address)?;
    }
    writeln!(
        text,
        "  Settings:    {}, {}, {} V",
        project.settings.regulation_edition, project.settings.earthing_system, project.settings.nominal_voltage_v
    )?;
    if let Some(lock) = &lock {
        writeln!(text, "  Locked by {} on {} since {}", lock.user_id, lock.machine, lock.locked_at)?;
    }

    let mut items: Vec<(&uuid::Uuid, &CalculationItem)> = project.items.iter().collect();
    items.sort_by(|a, b| a.1.label().cmp(b.1.label()));
    writeln!(text, "  Items ({}):", items.len())?;
    for (id, item) in &items {
        writeln!(text, "    {:<16} {:<24} {}", item.calc_type(), item.label(), id)?;
    }

    if let Some(schedule) = &project.inspection {
        let summary = schedule.summary();
        write!(text, "  {}: {} items", schedule.certificate_type.title(), summary.total)?;
        if schedule.certificate_type.uses_classification_codes() {
            write!(
                text,
                ", C1 {} C2 {} C3 {} FI {}",
                summary.c1, summary.c2, summary.c3, summary.fi
            )?;
        }
        writeln!(text, ", {:?}", schedule.overall_assessment())?;
        for item in schedule.items_requiring_action() {
            writeln!(text, "    {} {} {}", item.outcome.code(), item.item_number, item.description)?;
        }
    }

    Report::new(&project, text.trim_end().to_string())
}

fn run_items(path: &Path) -> Result<Report> {
    let project = file_io::load_project(path)?;
    let runs = project.run_all();

    let mut text = String::new();
    writeln!(text, "Job {}: {} calculations", project.meta.job_ref, runs.len())?;
    for run in &runs {
        match &run.error {
            Some(err) => writeln!(text, "  ERROR {:<24} {}", run.label, err)?,
            None => writeln!(text, "  {:<5} {:<24} {}", pass_fail(run.passes()), run.label, run.calc_type)?,
        }
    }

    let errors = runs.iter().filter(|r| r.error.is_some()).count();
    let passed = runs.iter().filter(|r| r.passes()).count();
    let report = JobRun {
        job_ref: project.meta.job_ref.clone(),
        passed,
        failed: runs.len() - passed - errors,
        errors,
        runs,
    };
    write!(
        text,
        "  {} passed, {} failed, {} errors",
        report.passed, report.failed, report.errors
    )?;
    Report::new(&report, text)
}
