//! desk-runner: headless runner for the banking back-office desk.
//!
//! Usage:
//!   desk-runner --data data/customers.json --export-dir out/
//!   desk-runner --synthetic 200 --seed 42 --db desk.db
//!   desk-runner --data data/customers.json --ipc-mode

use anyhow::Result;
use bankdesk_core::{
    admin::AdminDesk,
    config::DeskConfig,
    export::{write_csv, ExportView},
    generator::generate_payload,
    ingest::{JsonFileSource, JsonSliceSource, RowSource},
    overrides::{KycStatus, LoanDecision, OverrideStore, ViewModel},
    pipeline::{CustomerPipeline, DeskSummary},
    store::DeskStore,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Freeze { customer_id: String, frozen: bool },
    Flag { customer_id: String, flagged: bool },
    Kyc { customer_id: String, status: String },
    Loan { customer_id: String, status: String },
    CardBlock { customer_id: String, blocked: bool },
    Remark { customer_id: String, remark: String },
    Export { dir: String },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    summary: DeskSummary,
    customers: Vec<ViewModel>,
    recent_audit: Vec<bankdesk_core::audit::AuditLogEntry>,
}

type Desk = AdminDesk<DeskStore, DeskStore>;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let synthetic = parse_arg(&args, "--synthetic", 0usize);
    let seed = parse_arg(&args, "--seed", 42u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data = str_arg(&args, "--data").unwrap_or("./data/customers.json");
    let config_path = str_arg(&args, "--config").unwrap_or("./data/desk_config.json");
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let export_dir = str_arg(&args, "--export-dir");
    let actor = str_arg(&args, "--actor").unwrap_or("admin");

    let config = if Path::new(config_path).exists() {
        DeskConfig::load(config_path)?
    } else {
        log::warn!("config {config_path} not found, using defaults");
        DeskConfig::default()
    };

    if !ipc_mode {
        println!("Bank Desk: desk-runner");
        if synthetic > 0 {
            println!("  source:    synthetic ({synthetic} customers, seed {seed})");
        } else {
            println!("  source:    {data}");
        }
        println!("  db:        {db}");
        println!();
    }

    // For :memory: use SQLite shared-memory URI so the override store and
    // the audit sink connections share the same in-memory database.
    let db_effective: String = if db == ":memory:" {
        format!("file:desk_{}?mode=memory&cache=shared", unix_secs())
    } else {
        db.to_string()
    };
    let overrides = DeskStore::open(&db_effective)?;
    overrides.migrate()?;
    let audit = overrides.reopen()?;
    let mut desk: Desk = AdminDesk::new(actor, overrides, audit);

    let source: Box<dyn RowSource> = if synthetic > 0 {
        let payload = generate_payload(seed, synthetic);
        Box::new(JsonSliceSource::from_value(
            format!("synthetic-{seed}"),
            &payload,
            config.ingestion.clone(),
        )?)
    } else {
        Box::new(JsonFileSource::new(data, config.ingestion.clone()))
    };

    let mut pipeline = CustomerPipeline::new(config);
    pipeline.refresh(source.as_ref())?;

    if ipc_mode {
        run_ipc_loop(&mut pipeline, &mut desk)?;
    } else {
        let views = pipeline.view_models(&desk.overrides().snapshot()?);
        print_summary(&views);
        if let Some(dir) = export_dir {
            export_all(&pipeline, &views, dir)?;
        }
    }

    Ok(())
}

fn run_ipc_loop(pipeline: &mut CustomerPipeline, desk: &mut Desk) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        if let IpcCommand::Quit = cmd {
            break;
        }
        match handle_command(pipeline, desk, cmd) {
            Ok(()) => {
                let state = build_ui_state(pipeline, desk)?;
                writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
            }
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(pipeline: &CustomerPipeline, desk: &mut Desk, cmd: IpcCommand) -> Result<()> {
    let known = |id: &str| -> Result<()> {
        if pipeline.record(id).is_none() {
            anyhow::bail!("Unknown customer: {id}");
        }
        Ok(())
    };
    match cmd {
        IpcCommand::GetState | IpcCommand::Quit => {}
        IpcCommand::Freeze { customer_id, frozen } => {
            known(&customer_id)?;
            desk.set_frozen(&customer_id, frozen)?;
        }
        IpcCommand::Flag { customer_id, flagged } => {
            known(&customer_id)?;
            desk.set_flagged(&customer_id, flagged)?;
        }
        IpcCommand::Kyc { customer_id, status } => {
            known(&customer_id)?;
            desk.set_kyc_status(&customer_id, status.parse::<KycStatus>()?)?;
        }
        IpcCommand::Loan { customer_id, status } => {
            known(&customer_id)?;
            desk.set_loan_status(&customer_id, status.parse::<LoanDecision>()?)?;
        }
        IpcCommand::CardBlock { customer_id, blocked } => {
            known(&customer_id)?;
            desk.set_card_blocked(&customer_id, blocked)?;
        }
        IpcCommand::Remark { customer_id, remark } => {
            known(&customer_id)?;
            desk.set_remark(&customer_id, &remark)?;
        }
        IpcCommand::Export { dir } => {
            let views = pipeline.view_models(&desk.overrides().snapshot()?);
            export_all(pipeline, &views, &dir)?;
        }
    }
    Ok(())
}

fn build_ui_state(pipeline: &CustomerPipeline, desk: &Desk) -> Result<UiState> {
    let customers = pipeline.view_models(&desk.overrides().snapshot()?);
    Ok(UiState {
        summary: DeskSummary::from_views(&customers),
        recent_audit: desk.audit().recent_audit(20)?,
        customers,
    })
}

fn export_all(pipeline: &CustomerPipeline, views: &[ViewModel], dir: &str) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for view in ExportView::ALL_VIEWS {
        let path = Path::new(dir).join(view.file_name());
        let file = std::fs::File::create(&path)?;
        let rows = write_csv(file, views, view, &pipeline.config().export)?;
        log::info!("export: {} rows → {}", rows, path.display());
    }
    Ok(())
}

fn print_summary(views: &[ViewModel]) {
    let s = DeskSummary::from_views(views);
    println!("=== DESK SUMMARY ===");
    println!("  customers:      {}", s.total_customers);
    println!("  high risk:      {}", s.high_risk);
    println!("  frozen:         {}", s.frozen);
    println!("  flagged:        {}", s.flagged);
    println!("  inactive:       {}", s.inactive);
    println!("  cards blocked:  {}", s.cards_blocked);
    println!("  loans:          {}", s.loan_count);
    println!("  total balance:  ₹{:.2}", s.total_balance);
    println!("  avg CIBIL:      {:.0}", s.average_cibil);

    println!();
    println!("=== HIGH-RISK CUSTOMERS (first 10) ===");
    let high_risk: Vec<_> = views.iter().filter(|v| v.record.is_high_risk).take(10).collect();
    if high_risk.is_empty() {
        println!("  (none)");
    }
    for v in high_risk {
        let r = &v.record;
        println!(
            "  {} | {} | CIBIL {} | delay {}d | {}",
            r.customer_id, r.full_name, r.cibil_score, r.payment_delay_days, r.risk_level
        );
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn unix_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
