//! Reskrim - case register client for criminal investigation units
//!
//! Aggregates reports, units, personnel, stolen vehicles and status
//! history from the hosted case store, renders the listings and the
//! analytics dashboard, and runs the case workflows.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (configuration, sign-in, store or validation failure)

mod analysis;
mod cli;
mod config;
mod forms;
mod listing;
mod models;
mod preferences;
mod regions;
mod report;
mod store;
mod workflow;

use analysis::dashboard::{build_crime_data, build_dashboard, DashboardInput};
use analysis::summary::DateRange;
use analysis::{calendar, ranking, AnalyticsOptions};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, Command, ExportKind, OutputFormat};
use config::Config;
use forms::{OperatorDraft, PersonnelDraft, ReportDraft, ReportForm};
use indicatif::{ProgressBar, ProgressStyle};
use listing::personnel::{list_personnel, PersonnelQuery};
use listing::reports::{list_reports, ReportQuery};
use listing::vehicles::{list_vehicles, VehicleQuery};
use listing::paginate;
use preferences::Preferences;
use report::spreadsheet;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use store::{RestStore, Session};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use workflow::CaseCache;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    init_logging(&args);

    debug!("Reskrim v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args.command);

    if let Err(e) = run(args).await {
        error!("Command failed: {}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .reskrim.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Set [store] url and anon_key before signing in.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("⚠️  Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            debug!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Everything a command needs besides its own arguments.
struct Invocation<'a> {
    args: &'a Args,
    config: &'a Config,
    options: AnalyticsOptions,
}

async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    let state_file = config.general.state_file.clone();
    let mut prefs = Preferences::load(&state_file)?;

    let Some(command) = args.command.clone() else {
        bail!("No command given");
    };

    match command {
        Command::Theme { theme } => {
            prefs.theme = theme.unwrap_or_else(|| prefs.theme.toggled());
            prefs.save(&state_file)?;
            println!("🎨 Tema: {}", prefs.theme);
            Ok(())
        }
        Command::Login { email, password } => {
            let email = email
                .or_else(|| config.auth.email.clone())
                .context("Email required: pass --email, set RESKRIM_EMAIL or add [auth] email")?;
            let password =
                password.context("Password required: pass --password or set RESKRIM_PASSWORD")?;

            let (url, anon_key) = config.store_endpoint()?;
            let store = RestStore::new(url, anon_key, config.store.timeout_seconds)?;
            let session = store
                .sign_in(&email, &password)
                .await
                .context("Login gagal. Periksa email dan kata sandi")?;

            println!("✅ Masuk sebagai {}", session.email);
            prefs.session = Some(session);
            prefs.save(&state_file)
        }
        Command::Logout => {
            match prefs.sign_out() {
                Some(session) => {
                    revoke(&config, &session).await;
                    prefs.save(&state_file)?;
                    println!("👋 Keluar dari {}", session.email);
                }
                None => println!("Tidak ada sesi aktif."),
            }
            Ok(())
        }
        command => {
            let session = active_session(&prefs)?;
            let (url, anon_key) = config.store_endpoint()?;
            let store =
                RestStore::new(url, anon_key, config.store.timeout_seconds)?.with_session(&session);
            let mut cache = load_cache(&store, &session, args.quiet).await?;

            let ctx = Invocation {
                args: &args,
                config: &config,
                options: config.analytics.options(),
            };
            execute(command, &ctx, &store, &mut cache).await
        }
    }
}

/// The stored session, if it is still valid.
fn active_session(prefs: &Preferences) -> Result<Session> {
    match &prefs.session {
        None => bail!("Belum masuk. Jalankan `reskrim login` terlebih dahulu."),
        Some(session) if session.is_expired(Utc::now()) => {
            bail!("Sesi berakhir. Jalankan `reskrim login` kembali.")
        }
        Some(session) => Ok(session.clone()),
    }
}

/// Best-effort server-side sign-out; the local session is dropped either way.
async fn revoke(config: &Config, session: &Session) {
    let Ok((url, anon_key)) = config.store_endpoint() else {
        return;
    };
    match RestStore::new(url, anon_key, config.store.timeout_seconds) {
        Ok(store) => {
            if let Err(e) = store.with_session(session).sign_out().await {
                warn!("Sign-out request failed: {}", e);
            }
        }
        Err(e) => warn!("Sign-out request failed: {}", e),
    }
}

/// Aggregate the register behind a spinner.
async fn load_cache(store: &RestStore, session: &Session, quiet: bool) -> Result<CaseCache> {
    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };
    spinner.set_message("Memuat data kasus...");

    let result = CaseCache::load(store, &session.user_id).await;
    spinner.finish_and_clear();

    let cache = result.context(
        "Gagal memuat data. Coba keluar (`reskrim logout`) lalu masuk kembali",
    )?;
    info!(
        "Loaded {} reports, {} units, {} personnel",
        cache.reports.len(),
        cache.units.len(),
        cache.personnel.len()
    );
    if !cache.failed_lookups.is_empty() {
        warn!(
            "Personnel of {} report(s) could not be loaded; their assignments show unit only",
            cache.failed_lookups.len()
        );
    }
    Ok(cache)
}

/// Print the view or write it to `--output`.
fn emit<T: Serialize + ?Sized>(
    ctx: &Invocation<'_>,
    view: &T,
    markdown: impl FnOnce() -> String,
) -> Result<()> {
    let content = match ctx.args.format {
        OutputFormat::Json => report::generate_json(view)?,
        OutputFormat::Markdown => markdown(),
    };

    match &ctx.args.output {
        Some(path) => {
            report::write_output(&content, path)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            println!("✅ Disimpan ke: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn read_form(path: &Path) -> Result<ReportForm> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read draft file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse draft file: {}", path.display()))
}

async fn execute(
    command: Command,
    ctx: &Invocation<'_>,
    store: &RestStore,
    cache: &mut CaseCache,
) -> Result<()> {
    let now = Utc::now();

    match command {
        // === Views ===
        Command::Dashboard => {
            let input = DashboardInput {
                reports: &cache.reports,
                units: &cache.units,
                personnel: &cache.personnel,
                profile: &cache.profile,
            };
            let dashboard = build_dashboard(&input, now, &ctx.options);
            emit(ctx, &dashboard, || report::generate_dashboard(&dashboard))
        }

        Command::Reports { id: Some(id), .. } => {
            let found = cache.visible_report(&id)?;
            emit(ctx, found, || {
                report::generate_report_detail(found, &cache.units, &cache.personnel)
            })
        }

        Command::Reports {
            id: None,
            status,
            search,
            sort,
            direction,
            page,
        } => {
            let query = ReportQuery {
                status,
                search,
                sort: sort.map(|key| (key, direction)),
            };
            let rows = list_reports(
                &cache.reports,
                &cache.personnel,
                &cache.units,
                &cache.scope(),
                &query,
            );
            let page = paginate(rows, page, ctx.config.listing.reports_per_page);
            emit(ctx, &page, || report::generate_report_list(&page, &cache.units))
        }

        Command::CrimeData {
            start,
            end,
            export,
            export_dir,
        } => {
            let range = start.zip(end).map(|(start, end)| DateRange::new(start, end));
            let data = build_crime_data(&cache.reports, &cache.profile, range, now, &ctx.options);

            match export {
                Some(kind) => {
                    let sheet = match kind {
                        ExportKind::Summary => {
                            spreadsheet::summary_sheet(&data.summary, data.range.as_ref())
                        }
                        ExportKind::Trend => spreadsheet::trend_sheet(&data.trend),
                    };
                    let dir = export_dir.unwrap_or_else(|| ctx.config.export.output_dir.clone());
                    let path = spreadsheet::export(&sheet, &dir).context("Gagal mengekspor data")?;
                    println!("✅ {} diekspor ke: {}", sheet.name, path.display());
                    Ok(())
                }
                None => emit(ctx, &data, || report::generate_crime_data(&data)),
            }
        }

        Command::Vehicles {
            search,
            sort,
            direction,
            page,
        } => {
            cache.require_admin("melihat data kendaraan")?;
            let query = VehicleQuery {
                search,
                sort: sort.map(|key| (key, direction)),
            };
            let rows = list_vehicles(&cache.reports, &cache.units, &query);
            let top_types = ranking::top_vehicle_types(
                cache.reports.iter().flat_map(|r| r.stolen_vehicles.iter()),
                ctx.options.top_n,
            );
            let page = paginate(rows, page, ctx.config.listing.vehicles_per_page);
            emit(ctx, &page, || {
                report::generate_vehicle_list(&page, &cache.units, &top_types)
            })
        }

        Command::Personnel {
            unit,
            search,
            sort,
            direction,
            page,
        } => {
            cache.require_admin("melihat data personil")?;
            let query = PersonnelQuery {
                unit_id: unit,
                search,
                sort: sort.map(|key| (key, direction)),
            };
            let rows = list_personnel(&cache.personnel, &cache.units, &query);
            let page = paginate(rows, page, ctx.config.listing.personnel_per_page);
            emit(ctx, &page, || {
                report::generate_personnel_list(&page, &cache.units)
            })
        }

        Command::Units => {
            cache.require_admin("melihat data unit")?;
            emit(ctx, &cache.units, || {
                report::generate_unit_list(&cache.units, &cache.personnel)
            })
        }

        // === Reports ===
        Command::CreateReport { file } => {
            let mut draft = ReportDraft::new(calendar::local_date(now, ctx.options.utc_offset));
            read_form(&file)?.apply_to(&mut draft);
            let created = cache
                .create_report(store, &draft, now)
                .await
                .context("Gagal menyimpan data")?;
            println!(
                "✅ Laporan {} dibuat (ID: {})",
                created.full_number(),
                created.id
            );
            Ok(())
        }

        Command::EditReport { id, file } => {
            let mut draft = ReportDraft::from_report(cache.report(&id)?);
            read_form(&file)?.apply_to(&mut draft);
            let edited = cache
                .edit_report(store, &id, &draft)
                .await
                .context("Gagal menyimpan data")?;
            println!("✅ Laporan {} diperbarui.", edited.full_number());
            Ok(())
        }

        Command::DeleteReport { id } => {
            let removed = cache
                .soft_delete_report(store, &id)
                .await
                .context("Gagal menghapus laporan")?;
            println!("🗑️  Laporan {} dihapus.", removed.full_number());
            Ok(())
        }

        Command::UpdateStatus {
            id,
            status,
            detail,
            description,
        } => {
            let updated = cache
                .update_status(store, &id, status, detail, &description)
                .await
                .context("Gagal memperbarui status")?;
            println!(
                "✅ Status laporan {} menjadi {} / {}.",
                updated.full_number(),
                updated.status,
                detail
            );
            Ok(())
        }

        Command::AssignUnit { id, unit } => {
            let number = cache
                .assign_unit(store, &id, &unit)
                .await
                .context("Gagal menunjuk unit")?
                .full_number();
            println!(
                "✅ Laporan {} ditunjuk ke {}.",
                number,
                listing::unit_name(&cache.units, Some(unit.as_str()))
            );
            Ok(())
        }

        Command::AssignPersonnel {
            id,
            personnel,
            clear,
        } => {
            let ids = if clear { Vec::new() } else { personnel };
            let assigned = cache
                .assign_personnel(store, &id, &ids)
                .await
                .context("Gagal menunjuk personil")?;
            println!(
                "✅ {} personil ditunjuk untuk laporan {}.",
                assigned.assigned_personnel_ids().len(),
                assigned.full_number()
            );
            Ok(())
        }

        // === Units ===
        Command::CreateUnit { name } => {
            let unit = cache
                .create_unit(store, &name)
                .await
                .context("Gagal menyimpan data")?;
            println!("✅ Unit {} dibuat (ID: {})", unit.name, unit.id);
            Ok(())
        }

        Command::RenameUnit { id, name } => {
            let unit = cache
                .rename_unit(store, &id, &name)
                .await
                .context("Gagal menyimpan data")?;
            println!("✅ Unit diganti nama menjadi {}.", unit.name);
            Ok(())
        }

        Command::DeleteUnit { id } => {
            let unit = cache
                .delete_unit(store, &id)
                .await
                .context("Gagal menghapus unit")?;
            println!("🗑️  Unit {} dihapus.", unit.name);
            Ok(())
        }

        // === Personnel ===
        Command::CreatePersonnel { name, rank, unit } => {
            let draft = PersonnelDraft {
                name,
                rank,
                unit_id: unit,
            };
            let member = cache
                .create_personnel(store, &draft)
                .await
                .context("Gagal menyimpan data")?;
            println!("✅ Personil {} dibuat (ID: {})", member.display_name(), member.id);
            Ok(())
        }

        Command::EditPersonnel {
            id,
            name,
            rank,
            unit,
        } => {
            let current = cache
                .personnel
                .iter()
                .find(|p| p.id == id)
                .with_context(|| format!("Personil {} tidak ditemukan", id))?;
            let draft = PersonnelDraft {
                name: name.unwrap_or_else(|| current.name.clone()),
                rank: rank.unwrap_or_else(|| current.rank.clone()),
                unit_id: unit.unwrap_or_else(|| current.unit_id.clone()),
            };
            let member = cache
                .edit_personnel(store, &id, &draft)
                .await
                .context("Gagal menyimpan data")?;
            println!("✅ Personil {} diperbarui.", member.display_name());
            Ok(())
        }

        Command::DeletePersonnel { id } => {
            let member = cache
                .delete_personnel(store, &id)
                .await
                .context("Gagal menghapus personil")?;
            println!("🗑️  Personil {} dihapus.", member.display_name());
            Ok(())
        }

        Command::CreateOperator {
            personnel,
            email,
            password,
        } => {
            let draft = OperatorDraft {
                personnel_id: personnel,
                email,
                password,
            };
            let member = cache
                .create_operator(store, &draft)
                .await
                .context("Gagal membuat akun operator")?;
            println!(
                "✅ Akun {} dibuat untuk {}.",
                member.user_email.as_deref().unwrap_or("-"),
                member.display_name()
            );
            Ok(())
        }

        // Handled before the session is opened.
        Command::Login { .. } | Command::Logout | Command::Theme { .. } => Ok(()),
    }
}
