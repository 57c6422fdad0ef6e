use clap::Parser;
use dhondt_calc::app::{ElectionReport, GridRenderer, OutputFormat};
use dhondt_calc::config::parse_vote_spec;
use dhondt_calc::config::toml_config::CalculatorConfig;
use dhondt_calc::domain::ports::ConfigProvider;
use dhondt_calc::utils::error::ErrorSeverity;
use dhondt_calc::utils::{logger, validation::Validate};
use dhondt_calc::{CliConfig, DhondtError, LocalStorage, Result, SessionStore, Settings};

fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(&config) {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Seat calculation failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        // 輸出用戶友好的錯誤信息
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

fn run(config: &CliConfig) -> Result<()> {
    config.validate()?;

    // 載入 TOML 配置
    let file_config = match &config.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let file_config = CalculatorConfig::from_file(path)?;
            file_config.validate()?;
            Some(file_config)
        }
        None => None,
    };
    let settings = Settings::resolve(config, file_config.as_ref())?;

    let storage = LocalStorage::new(".");
    let mut store = SessionStore::new(settings.initial_session());

    if let Some(input) = &config.input {
        if config.strict {
            store.load_strict(&storage, input)?;
        } else {
            let issues = store.load(&storage, input)?;
            if !issues.is_empty() {
                eprintln!(
                    "⚠️ {} field(s) in {} were missing or malformed and have been defaulted",
                    issues.len(),
                    input
                );
            }
        }
    }

    apply_overrides(config, &settings, &mut store)?;

    if config.sort {
        store.sort_by_votes_descending();
    }

    store.recompute()?;

    match config.format {
        OutputFormat::Table => {
            if !settings.color {
                colored::control::set_override(false);
            }
            // NO_COLOR 或非終端機時改用 * / + 標記
            let color = settings.color && colored::control::SHOULD_COLORIZE.should_colorize();
            let renderer = GridRenderer::new(settings.theme, settings.precision, color);
            print!("{}", renderer.render(store.session(), store.result()));
        }
        OutputFormat::Json => {
            let report = ElectionReport::build(store.session(), store.result());
            println!("{}", report.to_json()?);
        }
        OutputFormat::Csv => print!("{}", store.serialize()?),
    }

    if let Some(path) = &config.save {
        store.save(&storage, path)?;
        println!("📁 Election saved to: {}", path);
    }

    Ok(())
}

/// CLI 上的名稱、席次與票數優先於載入的紀錄
fn apply_overrides(config: &CliConfig, settings: &Settings, store: &mut SessionStore) -> Result<()> {
    if let Some(name) = &config.name {
        store.set_election_name(name.clone());
    }
    if let Some(seats) = config.seats {
        store.set_seats(settings.checked_seats(seats)? as i64);
    }

    let slots = store.session().party_slots();
    if config.votes.len() > slots {
        return Err(DhondtError::invalid_input(
            "vote",
            config.votes.len(),
            format!("only {} party slots available", slots),
        ));
    }
    for (slot, spec) in config.votes.iter().enumerate() {
        let (name, votes) = parse_vote_spec(spec)?;
        let votes = settings.checked_votes(&format!("votes[{}]", slot), votes)?;
        store.set_name(slot, name);
        store.set_votes(slot, votes);
    }
    Ok(())
}
