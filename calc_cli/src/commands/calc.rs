use std::fmt::Write as _;

use anyhow::{Context, Result};
use calc_core::cables::ConductorMaterial;
use calc_core::calculations::earth_fault_loop::{self, EarthFaultLoopInput, ProtectiveDevice};
use calc_core::calculations::max_demand::{self, Load, MaxDemandInput};
use calc_core::calculations::min_charge::{self, MinChargeInput};
use calc_core::calculations::voltage_drop::{self, CircuitUse, VoltageDropInput};
use calc_core::calculations::{cable_sizing, CableSizingInput, SupplyPhase};
use calc_core::CalcError;

use super::{json_arg, pass_fail, Report};
use crate::cli::{CableSizeArgs, MaxDemandArgs, MinChargeArgs, VoltageDropArgs, ZsArgs};
use crate::config::CliConfig;

fn phase(three_phase: bool) -> SupplyPhase {
    if three_phase {
        SupplyPhase::Three
    } else {
        SupplyPhase::Single
    }
}

fn circuit_use(lighting: bool) -> CircuitUse {
    if lighting {
        CircuitUse::Lighting
    } else {
        CircuitUse::Other
    }
}

fn supply_voltage(explicit: Option<f64>, phase: SupplyPhase, config: &CliConfig) -> f64 {
    explicit.unwrap_or(match phase {
        SupplyPhase::Single => config.supply.nominal_voltage_v,
        SupplyPhase::Three => config.supply.three_phase_voltage_v,
    })
}

pub fn run_voltage_drop(args: &VoltageDropArgs, config: &CliConfig) -> Result<Report> {
    let phase = phase(args.three_phase);
    let input = VoltageDropInput {
        cable_type: args.cable,
        size_mm2: args.size,
        mv_per_a_m: args.mv,
        length_m: args.length,
        current_a: args.current,
        power_factor: args.pf,
        material: if args.aluminium {
            ConductorMaterial::Aluminium
        } else {
            ConductorMaterial::Copper
        },
        phase,
        supply_voltage_v: Some(supply_voltage(args.voltage, phase, config)),
        circuit_use: circuit_use(args.lighting),
        limit_percent: Some(
            args.limit
                .unwrap_or_else(|| config.design.vdrop_limit_percent(circuit_use(args.lighting))),
        ),
        ..VoltageDropInput::new(args.label.clone())
    };
    let result = voltage_drop::calculate(&input)?;

    let mut text = String::new();
    writeln!(text, "Voltage drop: {}", input.label)?;
    writeln!(text, "  mV/A/m (effective): {:.2}", result.mv_per_a_m_effective)?;
    writeln!(
        text,
        "  Drop:               {:.2} V ({:.2} %, limit {:.1} %)",
        result.voltage_drop_v, result.voltage_drop_percent, result.limit_percent
    )?;
    writeln!(text, "  Voltage at load:    {:.1} V", result.voltage_at_load_v)?;
    writeln!(text, "  Max run length:     {:.1} m", result.max_length_m)?;
    write!(text, "  Status:             {}", pass_fail(result.passes()))?;
    Report::new(&result, text)
}

pub fn run_max_demand(args: &MaxDemandArgs, config: &CliConfig) -> Result<Report> {
    let loads: Vec<Load> = serde_json::from_str(&json_arg(&args.loads)?)
        .map_err(|e| CalcError::serialization(format!("invalid loads JSON: {}", e)))?;
    let phase = phase(args.three_phase);
    let input = MaxDemandInput {
        loads,
        phase,
        supply_voltage_v: Some(supply_voltage(args.voltage, phase, config)),
        ..MaxDemandInput::new(args.label.clone())
    };
    let result = max_demand::calculate(&input)?;

    let mut text = String::new();
    writeln!(text, "Maximum demand: {}", input.label)?;
    for line in &result.breakdown {
        writeln!(
            text,
            "  {:<24} {:>7.2} kW x {:.2} = {:>7.2} kW",
            line.description, line.connected_kw, line.diversity, line.demand_kw
        )?;
    }
    writeln!(text, "  Connected load: {:.2} kW", result.connected_kw)?;
    writeln!(
        text,
        "  Demand:         {:.2} kW ({:.1} A, diversity {:.2})",
        result.demand_kw, result.current_a, result.overall_diversity
    )?;
    write!(
        text,
        "  Service:        {} ({:.1} A per phase, {:.0} % utilised)",
        result.recommended_service, result.service_current_a, result.utilisation_percent
    )?;
    Report::new(&result, text)
}

pub fn run_min_charge(args: &MinChargeArgs, config: &CliConfig) -> Result<Report> {
    let b = &config.business;
    let input = MinChargeInput {
        hourly_rate_gbp: args.rate.unwrap_or(b.hourly_rate_gbp),
        minimum_hours: args.hours.unwrap_or(b.minimum_hours),
        overhead_gbp: args.overhead.unwrap_or(b.overhead_gbp),
        travel_minutes: args.travel.unwrap_or(b.travel_minutes),
        admin_minutes: args.admin.unwrap_or(b.admin_minutes),
        materials_gbp: args.materials,
        uplift_percent: args.uplift.unwrap_or(b.uplift_percent),
        rounding_step_gbp: args.step.unwrap_or(b.rounding_step_gbp),
        vat_registered: args.vat_override().unwrap_or(b.vat_registered),
        ..MinChargeInput::new(args.label.clone())
    };
    let result = min_charge::calculate(&input)?;

    let mut text = String::new();
    writeln!(text, "Minimum charge: {}", input.label)?;
    writeln!(text, "  Labour:          {}", result.labour_gbp)?;
    writeln!(text, "  Travel/admin:    {}", result.time_cost_gbp)?;
    writeln!(text, "  Overhead:        {}", result.overhead_gbp)?;
    writeln!(text, "  Materials:       {}", result.materials_gbp)?;
    writeln!(text, "  Base cost:       {}", result.base_gbp)?;
    writeln!(text, "  Uplift {:>5.1} %:  {}", result.uplift_percent, result.uplifted_gbp)?;
    writeln!(text, "  Net price:       {}", result.net_gbp)?;
    if input.vat_registered {
        writeln!(text, "  VAT:             {}", result.vat_gbp)?;
        writeln!(text, "  Total:           {}", result.gross_gbp)?;
    }
    write!(text, "  Effective rate:  {}/h", result.effective_hourly_gbp)?;
    Report::new(&result, text)
}

pub fn run_cable_size(args: &CableSizeArgs, config: &CliConfig) -> Result<Report> {
    let phase = phase(args.three_phase);
    let input = CableSizingInput {
        cable_type: args.cable,
        method: args.method,
        design_current_a: args.current,
        device_rating_a: args.device,
        length_m: args.length,
        ambient_factor: args.ca,
        grouping_factor: args.cg,
        insulation_factor: args.ci,
        power_factor: args.pf,
        phase,
        circuit_use: circuit_use(args.lighting),
        supply_voltage_v: Some(supply_voltage(args.voltage, phase, config)),
        limit_percent: Some(
            args.limit
                .unwrap_or_else(|| config.design.vdrop_limit_percent(circuit_use(args.lighting))),
        ),
        ..CableSizingInput::new(args.label.clone())
    };
    let result = cable_sizing::calculate(&input).context("cable sizing")?;

    let mut text = String::new();
    writeln!(text, "Cable sizing: {} ({}, method {})", input.label, args.cable, args.method)?;
    for check in &result.checks {
        match &check.rejection {
            Some(reason) => writeln!(text, "  {:>6} mm²  rejected: {}", check.size_mm2, reason)?,
            None => writeln!(text, "  {:>6} mm²  selected", check.size_mm2)?,
        }
    }
    writeln!(
        text,
        "  Iz = {:.1} A x {:.2} = {:.1} A >= In {:.0} A",
        result.tabulated_a, result.correction_factor, result.derated_a, result.device_rating_a
    )?;
    write!(
        text,
        "  Voltage drop {:.2} V ({:.2} %)",
        result.voltage_drop_v, result.voltage_drop_percent
    )?;
    Report::new(&result, text)
}

pub fn run_zs(args: &ZsArgs, config: &CliConfig) -> Result<Report> {
    let device = ProtectiveDevice {
        device_type: args.device_type,
        rating_a: args.rating,
    };
    let input = EarthFaultLoopInput {
        ze_ohms: Some(args.ze.unwrap_or(config.supply.ze_ohms)),
        r1_r2_ohms: args.r1r2,
        line_size_mm2: args.line,
        cpc_size_mm2: args.cpc,
        length_m: args.length,
        ..EarthFaultLoopInput::new(args.label.clone(), device)
    };
    let result = earth_fault_loop::calculate(&input)?;

    let mut text = String::new();
    writeln!(text, "Earth fault loop: {}", input.label)?;
    writeln!(text, "  Ze:      {:.3} Ω", result.ze_ohms.value())?;
    writeln!(text, "  R1+R2:   {:.3} Ω", result.r1_r2_ohms.value())?;
    writeln!(
        text,
        "  Zs:      {:.3} Ω (max {:.3} Ω, 80 % {:.3} Ω)",
        result.zs_ohms.value(),
        result.max_zs_ohms.value(),
        result.max_measured_zs_ohms.value()
    )?;
    writeln!(text, "  PFC:     {:.0} A", result.prospective_fault_current_a)?;
    write!(text, "  Status:  {}", pass_fail(result.passes()))?;
    Report::new(&result, text)
}
