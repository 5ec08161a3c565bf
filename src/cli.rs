//! CLI definition and command dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, DEFAULT_STARTING_CASH};
use crate::domain::config_validation::{validate_backtest_config, validate_strategy_config};
use crate::domain::error::SigtraderError;
use crate::domain::expr_parser;
use crate::domain::indicator::{IndicatorKind, IndicatorSpec};
use crate::domain::ohlcv::PriceField;
use crate::domain::strategy::{split_conditions, Strategy};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Signal-based strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV, overriding [backtest] data
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Earnings date CSV, overriding [backtest] earnings
        #[arg(short, long)]
        earnings: Option<PathBuf>,
        /// Write the annotated bar table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            earnings,
            output,
        } => run_backtest(&config, data, earnings, output.as_deref()),
        Command::Validate { strategy } => run_validate(&strategy),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SigtraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_backtest(
    config_path: &Path,
    data_override: Option<PathBuf>,
    earnings_override: Option<PathBuf>,
    output_path: Option<&Path>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate
    if let Err(e) =
        validate_backtest_config(&adapter).and_then(|_| validate_strategy_config(&adapter))
    {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 3: Build config, strategy and indicator list
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let strategy = build_strategy(&adapter);
    eprintln!("Loading strategy: {}", strategy.name);

    let indicators = match build_indicator_specs(&adapter) {
        Ok(specs) => specs,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Resolve data sources
    let data_path = match data_override
        .or_else(|| adapter.get_string("backtest", "data").map(PathBuf::from))
    {
        Some(p) => p,
        None => {
            let err = SigtraderError::ConfigMissing {
                section: "backtest".into(),
                key: "data".into(),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    };
    let earnings_path = earnings_override
        .or_else(|| adapter.get_string("backtest", "earnings").map(PathBuf::from));

    let data_port = CsvAdapter::new(data_path, earnings_path);

    run_backtest_pipeline(
        &data_port,
        &CsvReportAdapter,
        &strategy,
        &indicators,
        &bt_config,
        output_path,
    )
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SigtraderError> {
    let config = BacktestConfig {
        starting_cash: adapter.get_double("backtest", "starting_cash", DEFAULT_STARTING_CASH),
    };
    config.validate()?;
    Ok(config)
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Strategy {
    let name = adapter
        .get_string("strategy", "name")
        .unwrap_or_else(|| "Unnamed".to_string());
    let description = adapter
        .get_string("strategy", "description")
        .unwrap_or_default();

    Strategy {
        name,
        description,
        buy_conditions: split_conditions(
            &adapter.get_string("strategy", "buy").unwrap_or_default(),
        ),
        sell_conditions: split_conditions(
            &adapter.get_string("strategy", "sell").unwrap_or_default(),
        ),
    }
}

/// Indicators from the `[indicators]` section, in sorted column order.
pub fn build_indicator_specs(adapter: &dyn ConfigPort) -> Result<Vec<IndicatorSpec>, SigtraderError> {
    adapter
        .keys("indicators")
        .into_iter()
        .map(|column| {
            let raw = adapter.get_string("indicators", &column).unwrap_or_default();
            let kind = raw
                .parse::<IndicatorKind>()
                .map_err(|source| SigtraderError::IndicatorParse {
                    input: raw.clone(),
                    source,
                })?;
            Ok(IndicatorSpec::new(column, kind))
        })
        .collect()
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    strategy: &Strategy,
    indicators: &[IndicatorSpec],
    bt_config: &BacktestConfig,
    output_path: Option<&Path>,
) -> ExitCode {
    // Stage 5: Fetch data
    let table = match data_port.fetch_table() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let earnings_dates = if indicators.iter().any(|s| s.kind.needs_earnings_dates()) {
        match data_port.fetch_earnings_dates() {
            Ok(dates) => {
                if dates.is_empty() {
                    warn!("DAYS_TO_EARNINGS requested but no earnings dates are available");
                }
                dates
            }
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    } else {
        Vec::new()
    };

    // Stage 6: Compute indicators
    let table = match table.with_indicators(indicators, &earnings_dates) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Running backtest: {} bars, {} indicators",
        table.len(),
        indicators.len()
    );

    // Stage 7: Run backtest
    let result = match backtest_engine::run_backtest(&table, strategy, bt_config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }

    // Stage 8: Print console summary to stderr
    let metrics = &result.metrics;
    eprintln!("\n=== Strategy: {} ===", strategy.name);
    eprintln!("Final Value:      {:.2}", result.final_value);
    eprintln!("Total Return:     {:.2}%", result.pct_change * 100.0);
    eprintln!("Total Trades:     {}", result.num_trades);
    eprintln!("Win Rate:         {:.1}%", result.win_rate * 100.0);
    eprintln!("Avg Trade:        {:.2}%", metrics.avg_trade_return * 100.0);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);

    eprintln!("\n=== Buy and Hold ===");
    eprintln!("Final Value:      {:.2}", result.baseline.final_value);
    eprintln!("Total Return:     {:.2}%", result.baseline.pct_change * 100.0);
    eprintln!("Win Rate:         {:.1}%", result.baseline.win_rate * 100.0);

    // Stage 9: Write report
    if let Some(output) = output_path {
        if let Err(e) = report_port.write(&result, output) {
            eprintln!("error: failed to write report: {e}");
            return (&e).into();
        }
        eprintln!("\nReport written to: {}", output.display());
    }

    ExitCode::SUCCESS
}

fn run_validate(strategy_path: &Path) -> ExitCode {
    eprintln!("Validating strategy: {}", strategy_path.display());
    let adapter = match load_config(strategy_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_strategy_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let indicators = match build_indicator_specs(&adapter) {
        Ok(specs) => specs,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if !indicators.is_empty() {
        eprintln!("\nIndicators:");
        for spec in &indicators {
            eprintln!("  {} = {}", spec.column, spec.kind);
        }
    }

    let strategy = build_strategy(&adapter);
    let known = |name: &str| {
        PriceField::from_name(name).is_some() || indicators.iter().any(|s| s.column == name)
    };

    let mut failed = false;
    for (label, conditions) in [
        ("Buy", &strategy.buy_conditions),
        ("Sell", &strategy.sell_conditions),
    ] {
        if conditions.is_empty() {
            continue;
        }
        eprintln!("\n{} Conditions:", label);
        for condition in conditions {
            match expr_parser::parse(condition) {
                Ok(expr) => {
                    eprintln!("  Parsed: {}", expr);
                    eprintln!("  Raw:    {}", condition);
                    for column in expr.columns().iter().filter(|c| !known(c.as_str())) {
                        eprintln!(
                            "  note:   '{}' is not a price field or configured indicator; it must come from the data file",
                            column
                        );
                    }
                }
                Err(e) => {
                    eprintln!("  error: {}", e.display_with_context(condition));
                    failed = true;
                }
            }
        }
    }

    if failed {
        eprintln!("\nStrategy configuration has invalid conditions.");
        return ExitCode::from(4);
    }

    eprintln!("\nStrategy configuration is valid.");
    ExitCode::SUCCESS
}
