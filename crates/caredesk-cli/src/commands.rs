// Command implementations; generic ones take the record type of the collection
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use caredesk_api::notifications::unread_count;
use caredesk_api::{ApiClient, NotificationFilters};
use caredesk_core::auth::Authenticator;
use caredesk_core::config::Config;
use caredesk_core::ledger::{self, LedgerGrid};
use caredesk_core::models::Sponsor;
use caredesk_core::reports::{self, ReportType};
use caredesk_core::session::SessionFile;
use caredesk_core::sms::SmsDraft;
use caredesk_core::{
    dashboard, CollectionSource, Error, Exporter, ListView, LoadOutcome, Record, RecordStore,
    SessionContext, SortDirection, SortKey, StatsSnapshot, ViewKind,
};
use caredesk_tui::App;
use tracing::{info, warn};

/// Widest a column gets in plain-text tables
const MAX_CELL_WIDTH: usize = 32;

#[derive(clap::Args, Debug, Default)]
pub struct ListArgs {
    /// Category to show, e.g. `active` or `waiting`
    #[arg(long)]
    pub view: Option<String>,
    /// Case-insensitive substring over the searchable fields
    #[arg(short, long)]
    pub search: Option<String>,
    /// Column key or 1-based column number
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long, requires = "sort")]
    pub desc: bool,
    /// Write the rows to a .json, .csv or .md file instead of printing
    #[arg(short, long)]
    pub export: Option<std::path::PathBuf>,
    /// Rows to print; defaults to `ui.page_size`
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Everything a command needs: settings, a client and the session
pub struct Context {
    pub config: Config,
    pub client: ApiClient,
    pub auth: Authenticator,
}

impl Context {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let mut client = config.api_client()?;
        let auth = Authenticator::new(SessionContext::global().clone(), &config.session)
            .with_file(SessionFile::default_location()?);
        // A saved login replaces any configured token
        auth.restore(&mut client);
        Ok(Self { config, client, auth })
    }

    fn source(&self) -> CollectionSource {
        CollectionSource::new(Arc::new(self.client.clone()))
    }
}

pub async fn login(ctx: &mut Context, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt("Password: ")?,
    };
    let session = ctx.auth.login(&mut ctx.client, email, &password).await?;
    println!(
        "Signed in as {} ({}), session valid for {} days",
        session.display_name(),
        session.role,
        session.days_remaining()
    );
    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn logout(ctx: &mut Context) -> anyhow::Result<()> {
    ctx.auth.logout(&mut ctx.client)?;
    println!("Signed out");
    Ok(())
}

pub fn whoami(ctx: &Context) -> anyhow::Result<()> {
    let Some(session) = ctx.auth.context().current() else {
        println!("Not signed in. Run `caredesk login --email <address>`");
        return Ok(());
    };
    println!("{}", session.display_name());
    if let Some(email) = &session.user.email {
        println!("  email:   {}", email);
    }
    println!("  role:    {}", session.role);
    println!("  expires: {} ({} days)", session.expires_at.format("%Y-%m-%d %H:%M UTC"), session.days_remaining());
    let views: Vec<&str> = session.role.accessible_views().into_iter().map(ViewKind::label).collect();
    println!("  access:  {}", views.join(", "));
    Ok(())
}

/// Fetch a collection into a view, failing with the view's error text
async fn load_view<R: Record>(ctx: &Context, query: Option<&str>) -> anyhow::Result<ListView<R>> {
    let mut view = ListView::<R>::from_query(query);
    if view.load(&ctx.source()).await != LoadOutcome::Ready {
        let reason = view.error().map(ToString::to_string).unwrap_or_default();
        bail!("Could not load {}: {}", R::KIND.label().to_lowercase(), reason);
    }
    Ok(view)
}

/// `3` means the third column, anything else a column key
fn parse_sort_key(raw: &str) -> SortKey {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => SortKey::Index(n - 1),
        _ => SortKey::Named(raw.trim().to_string()),
    }
}

pub async fn list<R: Record>(ctx: &Context, args: &ListArgs) -> anyhow::Result<()> {
    ctx.auth.require(R::KIND)?;
    let mut view = load_view::<R>(ctx, args.view.as_deref()).await?;

    if let Some(term) = &args.search {
        view.set_search(term.as_str());
    }
    if let Some(raw) = &args.sort {
        let key = parse_sort_key(raw);
        if view.config().resolve_column(&key).is_none() {
            let keys: Vec<&str> = view.config().columns.iter().map(|c| c.key).collect();
            bail!("Unknown column '{}'. Available: {}", raw, keys.join(", "));
        }
        let direction = if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        view.sort_by(key, direction);
    }

    if let Some(path) = &args.export {
        let count = Exporter::export_view(&view, path)?;
        println!("Exported {} rows to {}", count, path.display());
        return Ok(());
    }

    print_table(&view, args.limit.unwrap_or(ctx.config.ui.page_size));
    if ctx.config.ui.show_stats {
        if let Some(stats) = view.stats() {
            println!();
            print_stats(stats);
        }
    }
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn print_table<R: Record>(view: &ListView<R>, limit: usize) {
    let columns = &view.config().columns;
    let rows = view.rows();
    let shown: Vec<Vec<String>> = rows
        .iter()
        .take(limit)
        .map(|record| {
            columns
                .iter()
                .map(|c| truncate(&c.value(record).as_text(), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            shown
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.title.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let titles: Vec<&str> = columns.iter().map(|c| c.title).collect();
    let rules: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    println!("{}", table_line(&titles, &widths));
    println!("{}", table_line(&rules, &widths));
    for row in &shown {
        println!("{}", table_line(row, &widths));
    }

    let total = view.store().map_or(0, |s| s.len());
    if shown.len() < rows.len() {
        println!("\n{} of {} matching rows shown ({} loaded)", shown.len(), rows.len(), total);
    } else {
        println!("\n{} of {} rows", rows.len(), total);
    }
}

fn table_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn print_stats(stats: &StatsSnapshot) {
    println!("Total: {}", stats.total);
    for card in &stats.categories {
        println!("  {:<24} {}", card.label, card.count);
    }
    let points = stats.chart_points();
    if !points.is_empty() {
        println!("Breakdown:");
        for point in points {
            println!("  {:<24} {}", point.name, point.value);
        }
    }
}

pub async fn stats<R: Record>(ctx: &Context) -> anyhow::Result<()> {
    ctx.auth.require(R::KIND)?;
    let view = load_view::<R>(ctx, None).await?;
    println!("{}", R::KIND);
    if let Some(stats) = view.stats() {
        print_stats(stats);
    }
    if let Some(note) = view.store().and_then(server_total_note) {
        println!("{}", note);
    }
    Ok(())
}

/// Mention the server's own total when it disagrees with what was sent
fn server_total_note<R>(store: &RecordStore<R>) -> Option<String> {
    store
        .reported_total()
        .filter(|total| *total != store.len() as u64)
        .map(|total| format!("Server reports {} in total; {} were received", total, store.len()))
}

pub async fn overview(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.auth.context().current().ok_or(Error::Unauthenticated)?;
    let board = dashboard::load(&ctx.client, session.role).await;

    for summary in &board.summaries {
        println!("{}", summary.kind);
        print_stats(&summary.stats);
        println!();
    }
    for (kind, reason) in &board.failures {
        eprintln!("{} unavailable: {}", kind, reason);
    }
    Ok(())
}

pub async fn show<R: Record>(ctx: &Context, id: u64) -> anyhow::Result<()> {
    ctx.auth.require(R::KIND)?;
    let record: R = ctx
        .client
        .get(R::COLLECTION, id)
        .await
        .with_context(|| format!("Could not fetch {} #{}", R::COLLECTION, id))?;

    println!("{} (#{})", record.display_name(), record.id());
    for column in &R::list_config().columns {
        println!("  {:<20} {}", column.title, column.value(&record).as_text());
    }
    Ok(())
}

pub async fn tui<R: Record>(ctx: &Context, view: Option<&str>) -> anyhow::Result<()> {
    let session = ctx.auth.require(R::KIND)?;
    let app = App::new(ListView::<R>::from_query(view))
        .with_session_label(format!("{} ({})", session.display_name(), session.role));
    caredesk_tui::run_tui(app, &ctx.source()).await
}

pub async fn notifications(
    ctx: &Context,
    unread: bool,
    limit: Option<usize>,
    mark_read: Option<u64>,
) -> anyhow::Result<()> {
    ctx.auth.context().current().ok_or(Error::Unauthenticated)?;

    if let Some(id) = mark_read {
        ctx.client.mark_notification_read(id).await?;
        println!("Marked notification #{} read", id);
        return Ok(());
    }

    let mut filters = NotificationFilters::new();
    if unread {
        filters = filters.unread_only();
    }
    if let Some(limit) = limit {
        filters = filters.limit(limit);
    }

    let all = ctx.client.notifications(&NotificationFilters::new()).await?;
    println!("{} unread", unread_count(&all));
    for n in filters.apply(all) {
        let marker = if n.read { " " } else { "•" };
        let kind = n.kind.map(|k| k.to_string()).unwrap_or_default();
        let when = n.created_at.map(|t| t.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default();
        println!(
            "{} #{:<5} {:<17} {:<16} {}: {}",
            marker,
            n.id,
            kind,
            when,
            n.title.as_deref().unwrap_or(""),
            n.message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// A draft addressed to everyone with a phone number in the list
pub async fn draft_from_list<R: Record>(
    ctx: &Context,
    view: Option<&str>,
    message: &str,
) -> anyhow::Result<SmsDraft> {
    ctx.auth.require(R::KIND)?;
    let view = load_view::<R>(ctx, view).await?;
    let draft = SmsDraft::from_records(view.rows(), message);
    info!("{} recipients from {}", draft.recipients().len(), R::COLLECTION);
    Ok(draft)
}

pub async fn send_sms(
    ctx: &Context,
    draft: &mut SmsDraft,
    extra: &[String],
    dry_run: bool,
) -> anyhow::Result<()> {
    ctx.auth.require(ViewKind::Sms)?;
    for phone in extra {
        if !draft.add_recipient(phone) {
            warn!("Skipping '{}': not a valid number or already added", phone);
        }
    }

    let errors = draft.validate();
    if !errors.is_empty() {
        return Err(Error::Validation(errors).into());
    }

    println!(
        "{} recipients, {} segments ({:?})",
        draft.recipients().len(),
        draft.segments(),
        draft.encoding()
    );
    if dry_run {
        for phone in draft.recipients() {
            println!("  {}", phone);
        }
        return Ok(());
    }

    let receipt = draft.send(&ctx.client).await?;
    println!("Sent {}", receipt.sent);
    if !receipt.failed.is_empty() {
        println!("Failed: {}", receipt.failed.join(", "));
    }
    Ok(())
}

pub async fn report_upload(
    ctx: &Context,
    file: &Path,
    title: &str,
    report_type: ReportType,
) -> anyhow::Result<()> {
    ctx.auth.require(ViewKind::Reports)?;
    let report = reports::upload(&ctx.client, file, title, report_type).await?;
    println!("Uploaded report #{}: {}", report.id, report.display_name());
    Ok(())
}

pub async fn report_download(ctx: &Context, id: u64, dest: &Path) -> anyhow::Result<()> {
    ctx.auth.require(ViewKind::Reports)?;
    let bytes = reports::download(&ctx.client, id, dest).await?;
    println!("Saved {} bytes to {}", bytes, dest.display());
    Ok(())
}

pub async fn show_ledger(ctx: &Context, sponsor_id: u64, through: Option<&str>) -> anyhow::Result<()> {
    ctx.auth.require(ViewKind::Sponsors)?;
    let today = chrono::Local::now().date_naive();
    let end = match through {
        Some(raw) => ledger::parse_date(raw).with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))?,
        None => today,
    };

    let sponsor: Sponsor = ctx.client.get(Sponsor::COLLECTION, sponsor_id).await?;
    let grid = ledger::sponsor_ledger(&ctx.client, &sponsor, end, today).await?;

    println!("{}", sponsor.display_name());
    print_ledger(&grid);
    Ok(())
}

fn print_ledger(grid: &LedgerGrid) {
    println!("{:<8} {:>10} {:>10} {:>10}  {}", "Month", "Due", "Paid", "Balance", "Status");
    for row in &grid.rows {
        println!(
            "{:<8} {:>10.2} {:>10.2} {:>10.2}  {}",
            row.month.format("%Y-%m"),
            row.due,
            row.paid,
            row.balance,
            row.status.label()
        );
    }
    println!(
        "{:<8} {:>10.2} {:>10.2} {:>10.2}",
        "Total",
        grid.total_due,
        grid.total_paid,
        grid.balance()
    );
}

pub fn config_show() -> anyhow::Result<()> {
    let config = Config::load()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn config_path() -> anyhow::Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}

pub fn config_set(key: &str, value: &str) -> anyhow::Result<()> {
    let path = Config::config_path()?;
    let mut config = Config::load_from(&path)?;
    apply_setting(&mut config, key, value)?;
    config.save_to(&path)?;
    println!("Set {} = {}", key, value);
    Ok(())
}

fn apply_setting(config: &mut Config, key: &str, value: &str) -> anyhow::Result<()> {
    let value = value.trim();
    match key {
        "api.base_url" => config.api.base_url = value.trim_end_matches('/').to_string(),
        "api.timeout_secs" => {
            config.api.timeout_secs = match value {
                "" | "none" => None,
                secs => Some(secs.parse().context("timeout must be a whole number of seconds")?),
            }
        }
        "api.token" => config.api.token = (!value.is_empty()).then(|| value.to_string()),
        "ui.page_size" => config.ui.page_size = value.parse().context("page size must be a number")?,
        "ui.show_stats" => config.ui.show_stats = value.parse().context("show_stats must be true or false")?,
        "session.valid_for_days" => {
            config.session.valid_for_days = value.parse().context("valid_for_days must be a number")?
        }
        other => bail!(
            "Unknown setting '{}'. Known: api.base_url, api.timeout_secs, api.token, ui.page_size, ui.show_stats, session.valid_for_days",
            other
        ),
    }
    Ok(())
}
