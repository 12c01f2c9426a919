// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use subtrack::{
    count_subscriptions, dashboard, get_all_subscriptions, import_csv, mark_as_paid,
    setup_database, Config, Subscription, TrackerError,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => {
            let csv_path = args.get(2).context("usage: subtrack import <file.csv>")?;
            run_import(&config, Path::new(csv_path))
        }
        Some("list") => run_list(&config),
        Some("summary") => run_summary(&config),
        Some("reminders") => run_reminders(&config),
        Some("pay") => {
            let id = args.get(2).context("usage: subtrack pay <id> [method]")?;
            run_pay(&config, id, args.get(3).map(String::as_str))
        }
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            print_usage();
            bail!("unknown command '{}'", other)
        }
        // UI mode (default)
        None => run_ui_mode(&config),
    }
}

fn print_usage() {
    println!("subtrack {}", subtrack::VERSION);
    println!();
    println!("USAGE:");
    println!("  subtrack                    open the terminal dashboard");
    println!("  subtrack import <file.csv>  import subscriptions from CSV");
    println!("  subtrack list               list subscriptions");
    println!("  subtrack summary            monthly/yearly totals");
    println!("  subtrack reminders          charges inside their reminder window");
    println!("  subtrack pay <id> [method]  record a payment");
}

fn open_db(config: &Config) -> Result<Connection> {
    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path.display()))?;
    setup_database(&conn).context("initializing schema")?;
    Ok(conn)
}

fn run_import(config: &Config, csv_path: &Path) -> Result<()> {
    println!("🗄️  Import - CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let conn = open_db(config)?;
    println!("✓ Database ready: {}", config.db_path.display());

    println!("\n📂 Importing {}...", csv_path.display());
    let report = import_csv(&conn, csv_path, Utc::now())
        .with_context(|| format!("importing {}", csv_path.display()))?;

    println!("✓ Inserted:   {}", report.inserted);
    println!("✓ Duplicates: {} (skipped)", report.duplicates);
    if !report.rejected.is_empty() {
        println!("⚠️  Rejected:   {}", report.rejected.len());
        for (line, errors) in &report.rejected {
            let reasons: Vec<String> = errors.iter().map(ToString::to_string).collect();
            println!("   line {}: {}", line, reasons.join("; "));
        }
    }

    println!("\n🔍 Database contains {} subscriptions", count_subscriptions(&conn)?);
    Ok(())
}

fn run_list(config: &Config) -> Result<()> {
    let conn = open_db(config)?;
    let subs = get_all_subscriptions(&conn)?;

    if subs.is_empty() {
        println!("No subscriptions yet. Run: subtrack import <file.csv>");
        return Ok(());
    }

    println!(
        "{:<36}  {:<24} {:>10} {:<9} {:>10} {:<11} {:<9}",
        "ID", "NAME", "PRICE", "CYCLE", "MONTHLY", "NEXT", "STATUS"
    );
    for sub in &subs {
        println!(
            "{:<36}  {:<24} {:>10.2} {:<9} {:>10.2} {:<11} {:<9}",
            sub.id,
            sub.name.chars().take(24).collect::<String>(),
            sub.price,
            sub.billing_cycle,
            sub.monthly_equivalent(),
            sub.upcoming_charge_date().map(|d| d.to_string()).unwrap_or_default(),
            sub.status,
        );
    }
    println!("\n{} subscriptions", subs.len());
    Ok(())
}

fn active_only(subs: Vec<Subscription>) -> Vec<Subscription> {
    subs.into_iter().filter(Subscription::is_active).collect()
}

fn run_summary(config: &Config) -> Result<()> {
    let conn = open_db(config)?;
    let active = active_only(get_all_subscriptions(&conn)?);
    let summary = dashboard::summarize(&active, Utc::now());
    let cur = &config.currency;

    println!("📊 Subscription Summary ({} active)", summary.total_subscriptions);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Monthly: {:>10.2} {}", summary.total_monthly, cur);
    println!("Yearly:  {:>10.2} {}", summary.total_yearly, cur);

    println!("\n🏷️  By category (monthly)");
    for (category, monthly) in &summary.category_breakdown {
        println!("   {:<22} {:>10.2}", category, monthly);
    }

    println!("\n💸 Most expensive");
    for (i, ranked) in summary.top_subscriptions.iter().enumerate() {
        println!("   {}. {:<24} {:>10.2}/mo", i + 1, ranked.subscription.name, ranked.monthly_cost);
    }

    println!("\n📅 Upcoming");
    for upcoming in &summary.upcoming_payments {
        println!(
            "   {}  {:<24} {:>10.2}  (in {} days)",
            upcoming.charge_date, upcoming.subscription.name, upcoming.subscription.price, upcoming.days_until
        );
    }
    Ok(())
}

fn run_reminders(config: &Config) -> Result<()> {
    let conn = open_db(config)?;
    let subs = get_all_subscriptions(&conn)?;
    let due = dashboard::due_reminders(&subs, Utc::now().date_naive());

    if due.is_empty() {
        println!("✅ Nothing due inside its reminder window");
        return Ok(());
    }

    println!("🔔 {} charge(s) coming up", due.len());
    for reminder in &due {
        let when = match reminder.days_until {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {} days", n),
        };
        println!(
            "   {}  {:<24} {:>10.2} {}  {}",
            reminder.charge_date, reminder.subscription.name, reminder.subscription.price,
            reminder.subscription.currency, when
        );
    }
    Ok(())
}

fn run_pay(config: &Config, id: &str, method: Option<&str>) -> Result<()> {
    let mut conn = open_db(config)?;

    match mark_as_paid(&mut conn, id, method, Utc::now()) {
        Ok((sub, payment)) => {
            println!("✅ Recorded {:.2} {} for {} ({})", payment.amount, sub.currency, sub.name, payment.payment_method);
            if let Some(next) = sub.next_billing_date {
                println!("   Next billing date: {}", next);
            }
            println!("   Payments so far: {} ({:.2} total)", sub.payment_count, sub.total_spent);
            Ok(())
        }
        Err(TrackerError::PaymentRejected(reason)) => {
            println!("⚠️  {}", reason);
            Ok(())
        }
        Err(e) => Err(e).context("recording payment"),
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    println!("🖥️  Loading Subtrack UI...\n");

    if !config.db_path.exists() {
        eprintln!("❌ Database not found at {}", config.db_path.display());
        eprintln!("   Run: subtrack import <file.csv>");
        eprintln!("   to import subscriptions first.");
        std::process::exit(1);
    }

    let conn = open_db(config)?;
    let subs = get_all_subscriptions(&conn)?;
    println!("✓ Loaded {} subscriptions\n", subs.len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(subs, &config.currency, Utc::now());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin subtrack-server --features server");
    std::process::exit(1);
}
