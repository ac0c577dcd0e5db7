//! Margin Engine Binary
//!
//! Evaluates a configured account: resolves its position groups, logs the buying
//! power reserved against each group, and sizes every configured request.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin margin-engine -- margin-engine.yaml
//! ```
//!
//! Each sizing request prints one JSON line on stdout. A fatal error prints one
//! `ErrorReport` JSON line and exits with its status.
//!
//! # Environment Variables
//!
//! - `MARGIN_ENGINE_CONFIG`: Config path when none is given (default: margin-engine.yaml)
//! - `RUST_LOG`: Log level, overrides `observability.logging.level`

use margin_engine::config::{Config, load_config};
use margin_engine::infrastructure::Container;
use margin_engine::telemetry::init_tracing;
use margin_engine::{EngineError, ErrorCode};

fn main() {
    let path = std::env::args().nth(1);

    let result = load_config(path.as_deref())
        .map_err(EngineError::from)
        .and_then(|config| {
            init_tracing(&config.observability.logging);
            run(&config)
        });

    if let Err(err) = result {
        tracing::error!(code = %err.code(), error = %err, "Margin engine failed");
        let report = err.to_report();
        match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(_) => eprintln!("{err}"),
        }
        std::process::exit(report.exit_code);
    }
}

fn run(config: &Config) -> Result<(), EngineError> {
    let Some(account) = &config.account else {
        return Err(EngineError::new(
            ErrorCode::InvalidConfig,
            "Config has no account section to evaluate",
        ));
    };

    tracing::info!(
        currency = %account.account_currency,
        reserve = %config.buying_power.required_free_buying_power_percent,
        "Starting margin engine"
    );

    let container = Container::from_config(&config.buying_power, account)?;
    let manager = container.manager();
    manager.resolve_position_groups();

    let engine = container.engine();
    for group in manager.snapshot().iter().filter(|group| !group.is_empty()) {
        tracing::info!(
            group = %group,
            reserved = %engine.get_reserved_buying_power_for_group(group),
            initial = %engine.get_initial_margin_requirement(group),
            "Position group"
        );
    }
    tracing::info!(free_margin = %engine.free_margin(), "Free margin");

    for request in &account.sizing {
        let outcome = container.run_sizing(request)?;
        let line = serde_json::to_string(&outcome)
            .map_err(|e| EngineError::internal(format!("Failed to serialize result: {e}")))?;
        println!("{line}");
    }

    Ok(())
}
