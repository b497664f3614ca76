use anyhow::{bail, Context, Result};
use saldo::Session;
use saldo_core::{MonthBucket, FALLBACK_CATEGORY};
use saldo_import::ColumnMapping;
use saldo_storage::{default_config_path, Config, JsonFileStore};
use std::path::{Path, PathBuf};

/// Resolved configuration plus where the ruleset file lives.
pub struct AppContext {
    pub config: Config,
    pub rules_path: PathBuf,
}

impl AppContext {
    /// Uses `config_path` when given, else the per-user config file, else
    /// the defaults with paths relative to the working directory.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };
        let (config, base_dir) = match path {
            Some(path) => {
                let config = Config::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?;
                let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
                (config, base)
            }
            None => (Config::default(), PathBuf::new()),
        };
        let rules_path = config.resolve_rules_path(&base_dir);
        tracing::debug!(rules = %rules_path.display(), "resolved configuration");
        Ok(Self { config, rules_path })
    }

    fn open_session(&self) -> Result<Session> {
        Session::from_config(&self.config, JsonFileStore::new(&self.rules_path))
            .with_context(|| format!("failed to open ruleset {}", self.rules_path.display()))
    }
}

// ── summary ───────────────────────────────────────────────────────────────────

pub struct SummaryArgs {
    pub file: PathBuf,
    pub mapping: ColumnMapping,
    /// `YYYY-MM=AMOUNT` pairs.
    pub income: Vec<String>,
    pub month: Option<String>,
}

pub fn summary(ctx: &AppContext, args: SummaryArgs) -> Result<()> {
    let mut session = ctx.open_session()?;
    session
        .read_upload(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let mapped = session.confirm_mapping(args.mapping)?;

    let income = args
        .income
        .iter()
        .map(String::as_str)
        .map(parse_income_arg)
        .collect::<Result<Vec<_>>>()?;
    session.set_incomes(income.iter().map(|(m, v)| (*m, v.as_str())))?;

    let month = args
        .month
        .as_deref()
        .map(|m| m.parse::<MonthBucket>())
        .transpose()
        .context("invalid --month, expected YYYY-MM")?;

    if !session.has_data() {
        println!("No transactions in {}.", args.file.display());
        return Ok(());
    }
    println!(
        "{} rows mapped, {} transactions kept.\n",
        mapped,
        session.transactions().len()
    );

    println!("{:<8} {:>12} {:>12} {:>12}", "Month", "Income", "Expense", "Balance");
    for row in session.monthly_summary() {
        println!(
            "{:<8} {:>12} {:>12} {:>12}",
            row.month.to_string(),
            row.total_income.to_string(),
            row.total_expense.to_string(),
            row.balance.to_string()
        );
    }
    let totals = session.period_totals();
    println!(
        "{:<8} {:>12} {:>12} {:>12}\n",
        "Total",
        totals.total_income.to_string(),
        totals.total_expense.to_string(),
        totals.balance.to_string()
    );

    match month {
        Some(m) => println!("Spending by category, {m}:"),
        None => println!("Spending by category:"),
    }
    for total in session.category_totals(month) {
        println!("  {:<20} {:>12}", total.category, total.total.to_string());
    }
    Ok(())
}

fn parse_income_arg(entry: &str) -> Result<(MonthBucket, String)> {
    let Some((month, value)) = entry.split_once('=') else {
        bail!("invalid --income '{entry}', expected YYYY-MM=AMOUNT");
    };
    let month = month
        .trim()
        .parse::<MonthBucket>()
        .with_context(|| format!("invalid month in --income '{entry}'"))?;
    Ok((month, value.to_string()))
}

// ── categorize ────────────────────────────────────────────────────────────────

pub fn categorize(ctx: &AppContext, text: &str) -> Result<()> {
    let session = ctx.open_session()?;
    println!("{}", session.categorize(text));
    Ok(())
}

// ── categories ────────────────────────────────────────────────────────────────

pub fn categories_list(ctx: &AppContext) -> Result<()> {
    let session = ctx.open_session()?;
    for rule in session.ruleset().iter() {
        if rule.is_fallback() {
            println!("{:<16} (fallback)", rule.name);
        } else {
            println!("{:<16} {}", rule.name, rule.keywords.join(", "));
        }
    }
    Ok(())
}

pub fn categories_add(ctx: &AppContext, name: &str, keywords: &str) -> Result<()> {
    let mut session = ctx.open_session()?;
    session.add_category(name, keywords)?;
    let rule = session.ruleset().get(name.trim());
    let count = rule.map_or(0, |r| r.keywords.len());
    println!("Saved '{}' with {count} keyword(s) to {}", name.trim(), ctx.rules_path.display());
    Ok(())
}

pub fn categories_remove(ctx: &AppContext, name: &str) -> Result<()> {
    if name == FALLBACK_CATEGORY {
        bail!("'{FALLBACK_CATEGORY}' is the fallback category and cannot be removed");
    }
    let mut session = ctx.open_session()?;
    session.remove_category(name)?;
    println!("Removed '{name}'");
    Ok(())
}
