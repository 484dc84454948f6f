use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use crate::logic::aggregate::StrategyAggregate;
use crate::logic::simulation::RunRecord;

#[derive(Serialize)]
struct JsonReport<'a> {
    records: &'a [RunRecord],
    aggregates: &'a [StrategyAggregate],
    violations: usize,
}

fn total_violations(records: &[RunRecord]) -> usize {
    records.iter().map(|r| r.violations.len()).sum()
}

pub fn generate_console_report(
    writer: &mut dyn Write,
    records: &[RunRecord],
    aggregates: &[StrategyAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Balance Run Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "======================".cyan())?;
    writeln!(writer, "Total runs: {}", records.len())?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for aggregate in aggregates {
        let rate = aggregate.win_rate * 100.0;
        let rate_label = format!("{rate:.1}%");
        let rate_label = if rate >= 50.0 {
            rate_label.green()
        } else {
            rate_label.yellow()
        };
        writeln!(writer, "{}", aggregate.strategy.label().bold())?;
        writeln!(
            writer,
            "   Runs: {} ({} won, {} lost, {} unfinished)",
            aggregate.runs, aggregate.victories, aggregate.defeats, aggregate.unfinished
        )?;
        writeln!(writer, "   Win rate: {rate_label}")?;
        writeln!(
            writer,
            "   Days: {:.1} ± {:.1}   Distance: {:.0} km   Upgrades: {:.1}",
            aggregate.mean_days, aggregate.std_days, aggregate.mean_distance, aggregate.mean_upgrades
        )?;
        writeln!(
            writer,
            "   Narrator fallback rate: {:.1}%",
            aggregate.fallback_rate * 100.0
        )?;
        for (label, count) in &aggregate.outcomes {
            writeln!(writer, "     • {label}: {count}")?;
        }
        writeln!(writer)?;
    }

    let violations = total_violations(records);
    if violations == 0 {
        writeln!(writer, "{}", "✅ No invariant violations".green())?;
    } else {
        writeln!(
            writer,
            "{}",
            format!("❌ {violations} invariant violations").red().bold()
        )?;
        for record in records.iter().filter(|r| !r.violations.is_empty()) {
            for violation in &record.violations {
                writeln!(
                    writer,
                    "     • [{} {} seed {}] {}",
                    record.city,
                    record.strategy,
                    record.seed,
                    violation.red()
                )?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report(
    writer: &mut dyn Write,
    records: &[RunRecord],
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    let report = JsonReport {
        records,
        aggregates,
        violations: total_violations(records),
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report(
    writer: &mut dyn Write,
    records: &[RunRecord],
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    writeln!(writer, "# RV Trail Balance Results\n")?;
    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Total runs**: {}", records.len())?;
    writeln!(
        writer,
        "- **Invariant violations**: {}\n",
        total_violations(records)
    )?;

    writeln!(writer, "## Strategies\n")?;
    writeln!(
        writer,
        "| Strategy | Runs | Win rate | Mean days | Mean distance | Fallback rate |"
    )?;
    writeln!(writer, "|---|---|---|---|---|---|")?;
    for aggregate in aggregates {
        writeln!(
            writer,
            "| {} | {} | {:.1}% | {:.1} | {:.0} km | {:.1}% |",
            aggregate.strategy.label(),
            aggregate.runs,
            aggregate.win_rate * 100.0,
            aggregate.mean_days,
            aggregate.mean_distance,
            aggregate.fallback_rate * 100.0
        )?;
    }
    writeln!(writer)?;

    writeln!(writer, "## Runs\n")?;
    for record in records {
        let status = if !record.violations.is_empty() {
            "❌"
        } else if record.is_victory() {
            "🏁"
        } else if record.is_defeat() {
            "💀"
        } else {
            "⏳"
        };
        let code = record.run_code.as_deref().unwrap_or("-");
        writeln!(
            writer,
            "- {status} **{} / {}** seed {} ({code}): {} on day {}, {} of {} km ({}%)",
            record.city,
            record.strategy.label(),
            record.seed,
            record.outcome_label(),
            record.days,
            record.distance,
            record.total_distance,
            record.progress_pct
        )?;
        for violation in &record.violations {
            writeln!(writer, "  - {violation}")?;
        }
    }
    Ok(())
}
