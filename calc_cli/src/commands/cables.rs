use std::fmt::Write as _;

use anyhow::Result;
use calc_core::cables::{
    all_cable_types, bulk_price, cables_by_current_rating, cables_by_installation_method, cost_effective_alternatives,
    get_cable_data, CableType,
};
use serde::Serialize;

use super::Report;
use crate::cli::CablesCommand;

#[derive(Debug, Serialize)]
struct CableSummary {
    cable_type: CableType,
    name: String,
    sizes_mm2: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct PriceReport {
    quote: calc_core::cables::BulkQuote,
    alternatives: Vec<calc_core::cables::Alternative>,
}

fn summaries(types: &[CableType]) -> Result<Vec<CableSummary>> {
    types
        .iter()
        .map(|t| {
            let data = get_cable_data(*t)?;
            Ok(CableSummary {
                cable_type: *t,
                name: data.name.clone(),
                sizes_mm2: data.standard_sizes_mm2.clone(),
            })
        })
        .collect()
}

fn summary_text(title: &str, summaries: &[CableSummary]) -> Result<String> {
    let mut text = String::new();
    writeln!(text, "{}", title)?;
    for s in summaries {
        let sizes: Vec<String> = s.sizes_mm2.iter().map(|v| v.to_string()).collect();
        writeln!(text, "  {:<16} {:<28} {} mm²", s.cable_type.key(), s.name, sizes.join(", "))?;
    }
    Ok(text.trim_end().to_string())
}

pub fn run_cables(action: &CablesCommand) -> Result<Report> {
    match action {
        CablesCommand::List => {
            let list = summaries(&all_cable_types()?)?;
            let text = summary_text("Cable types", &list)?;
            Report::new(&list, text)
        }
        CablesCommand::Show { cable } => {
            let data = get_cable_data(*cable)?;
            let mut text = String::new();
            writeln!(text, "{} ({})", data.name, data.cable_type.key())?;
            writeln!(text, "  {}", data.description)?;
            writeln!(
                text,
                "  Rated {} °C, {} V, bend radius {}D, fire {:?}",
                data.temperature_rating_c, data.voltage_rating_v, data.min_bend_radius, data.fire_performance
            )?;
            let methods: Vec<&str> = data.installation_methods.iter().map(|m| m.code()).collect();
            writeln!(text, "  Methods: {}", methods.join(", "))?;
            writeln!(text, "  {:>6}  {:>8}  {:>8}  {:>8}", "mm²", "mV/A/m", "C (A)", "£/m")?;
            for rating in &data.ratings {
                let mv = data.voltage_drop_for(rating.size_mm2).map(|v| v.mv_per_a_m);
                let price = data.pricing_for(rating.size_mm2).map(|p| p.retail_gbp_per_m);
                writeln!(
                    text,
                    "  {:>6}  {:>8}  {:>8}  {:>8}",
                    rating.size_mm2,
                    mv.map_or("-".to_string(), |v| format!("{:.2}", v)),
                    rating.c,
                    price.map_or("-".to_string(), |v| format!("{:.2}", v)),
                )?;
            }
            for limitation in &data.limitations {
                writeln!(text, "  ! {}", limitation)?;
            }
            Report::new(data, text.trim_end().to_string())
        }
        CablesCommand::ForMethod { method, min_current } => {
            let types = match min_current {
                Some(amps) => cables_by_current_rating(*amps, *method)?,
                None => cables_by_installation_method(*method)?,
            };
            let list = summaries(&types)?;
            let text = summary_text(&format!("Cables for method {} ({})", method, method.description()), &list)?;
            Report::new(&list, text)
        }
        CablesCommand::Price {
            cable,
            size,
            metres,
            budget,
        } => {
            let quote = bulk_price(*cable, *size, *metres)?;
            let alternatives = match budget {
                Some(max) => cost_effective_alternatives(*cable, *size, *max)?,
                None => Vec::new(),
            };
            let mut text = String::new();
            writeln!(
                text,
                "{} m of {} {} mm² at £{:.2}/m less {:.0} %: £{:.2}",
                quote.metres, cable, quote.size_mm2, quote.retail_gbp_per_m, quote.discount_percent, quote.total_gbp
            )?;
            for alt in &alternatives {
                writeln!(
                    text,
                    "  alternative {:<16} £{:.2}/m (saves £{:.2}/m)",
                    alt.cable_type.key(),
                    alt.retail_gbp_per_m,
                    alt.savings_gbp_per_m
                )?;
            }
            Report::new(&PriceReport { quote, alternatives }, text.trim_end().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calc_core::cables::InstallationMethod;

    #[test]
    fn test_list_has_every_type() {
        let report = run_cables(&CablesCommand::List).unwrap();
        assert_eq!(report.json.as_array().unwrap().len(), CableType::ALL.len());
        assert!(report.text.contains("pvc-twin-earth"));
    }

    #[test]
    fn test_buried_cables() {
        let report = run_cables(&CablesCommand::ForMethod {
            method: InstallationMethod::D2,
            min_current: None,
        })
        .unwrap();
        let keys: Vec<&str> = report
            .json
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|c| c["cable_type"].as_str())
            .collect();
        assert!(keys.contains(&"swa-xlpe"));
        assert!(!keys.contains(&"pvc-twin-earth"));
    }

    #[test]
    fn test_price_with_discount() {
        let report = run_cables(&CablesCommand::Price {
            cable: CableType::PvcTwinEarth,
            size: 2.5,
            metres: 100.0,
            budget: None,
        })
        .unwrap();
        // 100 m × £2.25 less 8 %
        let total = report.json["quote"]["total_gbp"].as_f64().unwrap();
        assert!((total - 207.0).abs() < 1e-9);
    }
}
