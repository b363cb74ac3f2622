use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::backend::{
    Backend, ExportRequest, ImportValidationReport, LocalBackend, SessionCountFilter,
};
use crate::cli::{
    Cli, Commands, DaemonCommands, ImportCommands, RangeCommands, SettingsCommands,
};
use crate::config::Config;
use crate::consts::{IMPORT_DIR_NAME, SETTINGS_FILE_NAME};
use crate::error::{AppError, ImportError};
use crate::import::{ImportWorkflow, pending_imports};
use crate::output::{
    RangeView, WatchSnapshot, format_snapshot_line, output_count_json, output_export_json,
    output_import_json, output_pending_json, output_range_json, output_rebuild_json,
    output_settings_json, output_snapshot_json, output_status_json, output_validation_json,
    print_count, print_export, print_import_summary, print_pending, print_range_table,
    print_rebuild, print_settings_table, print_status_table, print_validation_report,
    to_pretty_json,
};
use crate::range::{DateRange, DateRangeController, Direction, all_time_start};
use crate::refresh::{DaemonMonitor, IntervalPoller, ThrottledRefreshBus};
use crate::settings::{self, DashboardViewSettings, FileStore, SessionSettings};
use crate::utils::{Timezone, parse_date};

pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) config: &'a Config,
    pub(crate) data_dir: PathBuf,
    pub(crate) timezone: Timezone,
    pub(crate) today: NaiveDate,
    /// `--today` was given; the day never rolls over
    pub(crate) today_pinned: bool,
}

impl CommandContext<'_> {
    fn json(&self) -> bool {
        self.cli.json
    }

    fn use_color(&self) -> bool {
        self.cli.use_color()
    }

    fn open_backend(&self) -> Result<LocalBackend, AppError> {
        Ok(LocalBackend::open(&self.data_dir)?)
    }

    fn open_settings(&self) -> FileStore {
        FileStore::open(&self.data_dir.join(SETTINGS_FILE_NAME))
    }
}

/// Dispatch a parsed command. Without a subcommand the current range is shown.
pub(crate) fn run(command: Option<&Commands>, ctx: &CommandContext<'_>) -> Result<(), AppError> {
    match command {
        None => handle_range(None, ctx),
        Some(Commands::Range { command }) => handle_range(command.as_ref(), ctx),
        Some(Commands::Status) => handle_status(ctx),
        Some(Commands::Daemon { command }) => handle_daemon(*command, ctx),
        Some(Commands::Import { command }) => handle_import(command, ctx),
        Some(Commands::Export {
            output,
            project,
            since,
            until,
        }) => handle_export(output, *project, since.as_deref(), until.as_deref(), ctx),
        Some(Commands::Rebuild { gap_fill }) => handle_rebuild(*gap_fill, ctx),
        Some(Commands::Count {
            since,
            until,
            unassigned,
            min_duration,
        }) => handle_count(
            since.as_deref(),
            until.as_deref(),
            *unassigned,
            *min_duration,
            ctx,
        ),
        Some(Commands::Settings { command }) => handle_settings(command.as_ref(), ctx),
        Some(Commands::Watch { iterations }) => handle_watch(*iterations, ctx),
    }
}

fn handle_range(command: Option<&RangeCommands>, ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let store = ctx.open_settings();
    let today = ctx.today;
    let view: DashboardViewSettings = settings::load(&store);
    let mut controller = DateRangeController::from_view(&view, today);

    let changed = match command {
        None | Some(RangeCommands::Show) => false,
        Some(RangeCommands::Set { preset }) => {
            controller.set_preset(*preset, today);
            true
        }
        Some(RangeCommands::Custom { from, to }) => {
            let range = DateRange::new(parse_date(from)?, parse_date(to)?)?;
            controller.set_range(range, today);
            true
        }
        Some(RangeCommands::Prev) => shift_or_note(&mut controller, Direction::Backward, ctx),
        Some(RangeCommands::Next) => shift_or_note(&mut controller, Direction::Forward, ctx),
    };

    if changed {
        let saved = settings::save(&store, &controller.to_view());
        debug!(
            event = "dashboard.range.saved",
            preset = saved.preset.as_str(),
            custom = saved.custom,
        );
    }

    let view = RangeView::new(&controller, today);
    if ctx.json() {
        println!("{}", output_range_json(&view));
    } else {
        print_range_table(&view, ctx.use_color());
    }
    Ok(())
}

fn shift_or_note(
    controller: &mut DateRangeController,
    direction: Direction,
    ctx: &CommandContext<'_>,
) -> bool {
    let moved = controller.shift(direction, ctx.today);
    if !moved && !ctx.json() {
        eprintln!("Range unchanged: no earlier or later period is available for this preset.");
    }
    moved
}

fn handle_status(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let backend = ctx.open_backend()?;
    let status = backend.daemon_status()?;
    if ctx.json() {
        println!("{}", output_status_json(&status));
    } else {
        print_status_table(&status, ctx.use_color());
    }
    Ok(())
}

fn handle_daemon(command: DaemonCommands, ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let backend = ctx.open_backend()?;
    let done = match command {
        DaemonCommands::Start => backend.start_daemon().map(|()| "started"),
        DaemonCommands::Stop => backend.stop_daemon().map(|()| "stopped"),
        DaemonCommands::Restart => backend.restart_daemon().map(|()| "restarted"),
    }?;
    info!(event = "dashboard.daemon.control", action = done);
    println!("Daemon {done}");
    Ok(())
}

fn handle_import(command: &ImportCommands, ctx: &CommandContext<'_>) -> Result<(), AppError> {
    match command {
        ImportCommands::Pending => {
            let dir = ctx.data_dir.join(IMPORT_DIR_NAME);
            let files = pending_imports(&dir);
            if ctx.json() {
                println!("{}", output_pending_json(&files));
            } else {
                print_pending(&dir, &files);
            }
            Ok(())
        }
        ImportCommands::Validate { path } => {
            let backend = ctx.open_backend()?;
            let mut workflow = ImportWorkflow::new();
            validate_and_show(&mut workflow, &backend, path, ctx, true)?;
            workflow.cancel()?;
            Ok(())
        }
        ImportCommands::Run { path } => {
            let backend = ctx.open_backend()?;
            let mut workflow = ImportWorkflow::new();
            let report = validate_and_show(&mut workflow, &backend, path, ctx, !ctx.json())?;
            workflow.commit(&backend)?;
            debug!(event = "dashboard.import.state", state = workflow.state().name());
            let summary = workflow.acknowledge()?;
            if ctx.json() {
                println!("{}", output_import_json(path, &report, &summary));
            } else {
                print_import_summary(path, &summary, ctx.use_color());
            }
            Ok(())
        }
    }
}

/// A failed check is always shown before the error is returned
fn validate_and_show(
    workflow: &mut ImportWorkflow,
    backend: &dyn Backend,
    path: &Path,
    ctx: &CommandContext<'_>,
    show_valid: bool,
) -> Result<ImportValidationReport, AppError> {
    match workflow.validate(backend, path) {
        Ok(report) => {
            if show_valid {
                show_report(path, &report, ctx);
            }
            Ok(report)
        }
        Err(ImportError::ValidationFailed { report }) => {
            show_report(path, &report, ctx);
            Err(ImportError::ValidationFailed { report }.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn show_report(path: &Path, report: &ImportValidationReport, ctx: &CommandContext<'_>) {
    if ctx.json() {
        println!("{}", output_validation_json(path, report));
    } else {
        print_validation_report(path, report, ctx.use_color());
    }
}

/// Inclusive day bounds from optional `--since` / `--until`
fn parse_bounds(
    since: Option<&str>,
    until: Option<&str>,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), AppError> {
    let since = since.map(parse_date).transpose()?;
    let until = until.map(parse_date).transpose()?;
    if let (Some(start), Some(end)) = (since, until) {
        DateRange::new(start, end)?;
    }
    Ok((since, until))
}

fn handle_export(
    output: &Path,
    project: Option<i64>,
    since: Option<&str>,
    until: Option<&str>,
    ctx: &CommandContext<'_>,
) -> Result<(), AppError> {
    let (date_start, date_end) = parse_bounds(since, until)?;
    let backend = ctx.open_backend()?;
    let summary = backend.export_data(&ExportRequest {
        project_id: project,
        date_start,
        date_end,
        output: output.to_path_buf(),
    })?;
    if ctx.json() {
        println!("{}", output_export_json(&summary));
    } else {
        print_export(&summary, ctx.use_color());
    }
    Ok(())
}

fn handle_rebuild(gap_fill: Option<u32>, ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let gap = match gap_fill {
        Some(gap) => gap,
        None => settings::load::<SessionSettings>(&ctx.open_settings()).gap_fill_minutes,
    };
    let backend = ctx.open_backend()?;
    let merged = backend.rebuild_sessions(gap)?;
    if ctx.json() {
        println!("{}", output_rebuild_json(gap, merged));
    } else {
        print_rebuild(gap, merged);
    }
    Ok(())
}

fn handle_count(
    since: Option<&str>,
    until: Option<&str>,
    unassigned: bool,
    min_duration: Option<u64>,
    ctx: &CommandContext<'_>,
) -> Result<(), AppError> {
    let store = ctx.open_settings();
    let range = match parse_bounds(since, until)? {
        (None, None) => {
            let view: DashboardViewSettings = settings::load(&store);
            DateRangeController::from_view(&view, ctx.today).range()
        }
        (start, end) => DateRange::new(
            start.unwrap_or_else(all_time_start),
            end.unwrap_or(ctx.today),
        )?,
    };
    let min_duration = min_duration.or_else(|| {
        let min = settings::load::<SessionSettings>(&store).min_duration_seconds;
        (min > 0).then_some(u64::from(min))
    });

    let backend = ctx.open_backend()?;
    let count = backend.session_count(&SessionCountFilter {
        date_range: Some(range),
        unassigned,
        min_duration,
    })?;
    if ctx.json() {
        println!("{}", output_count_json(Some(range), unassigned, min_duration, count));
    } else {
        print_count(Some(range), unassigned, min_duration, count);
    }
    Ok(())
}

fn handle_settings(
    command: Option<&SettingsCommands>,
    ctx: &CommandContext<'_>,
) -> Result<(), AppError> {
    let store = ctx.open_settings();
    let (name, value) = match command {
        None | Some(SettingsCommands::Show { name: None }) => {
            let all = settings::show_all(&store);
            if ctx.json() {
                println!("{}", output_settings_json(&all));
            } else {
                print_settings_table(&all, ctx.use_color());
            }
            return Ok(());
        }
        Some(SettingsCommands::Show { name: Some(name) }) => {
            (name, settings::show(&store, name)?)
        }
        Some(SettingsCommands::Set { name, value }) => (name, settings::set(&store, name, value)?),
        Some(SettingsCommands::Reset { name }) => (name, settings::reset(&store, name)?),
    };

    if ctx.json() {
        println!("{}", to_pretty_json(&value));
    } else {
        print_settings_table(&[(name.as_str(), value)], ctx.use_color());
    }
    Ok(())
}

/// Event loop: pollers feed the refresh bus, and every fire prints a snapshot.
fn handle_watch(iterations: Option<u64>, ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let backend = ctx.open_backend()?;
    let store = ctx.open_settings();

    let sessions_settings: SessionSettings = settings::load(&store);
    if sessions_settings.rebuild_on_startup {
        let merged = backend.rebuild_sessions(sessions_settings.gap_fill_minutes)?;
        info!(event = "dashboard.watch.startup_rebuild", merged = merged);
    }

    let view: DashboardViewSettings = settings::load(&store);
    let mut today = ctx.today;
    let mut controller = DateRangeController::from_view(&view, today);

    let mut bus = ThrottledRefreshBus::new(ctx.config.refresh_throttle());
    let mut cursor = bus.subscribe();
    let mut status_poll = IntervalPoller::new(ctx.config.status_poll());
    let mut count_poll = IntervalPoller::new(ctx.config.session_count_poll());
    let mut monitor = DaemonMonitor::default();
    let mut sessions: Option<u64> = None;
    let mut printed = 0u64;

    info!(
        event = "dashboard.watch.started",
        data_dir = %ctx.data_dir.display(),
        range = %controller.range(),
    );

    loop {
        let now = Instant::now();

        if status_poll.due(now) && monitor.record(backend.daemon_status()) {
            let outcome = bus.trigger(now);
            debug!(event = "dashboard.watch.status_changed", outcome = ?outcome);
        }

        if count_poll.due(now) {
            if !ctx.today_pinned {
                let current = ctx.timezone.today();
                if current != today {
                    today = current;
                    controller.refresh_for(today);
                    debug!(event = "dashboard.watch.day_rolled", range = %controller.range());
                }
            }
            let filter = SessionCountFilter {
                date_range: Some(controller.range()),
                ..SessionCountFilter::default()
            };
            match backend.session_count(&filter) {
                Ok(count) if sessions != Some(count) => {
                    sessions = Some(count);
                    let outcome = bus.trigger(now);
                    debug!(event = "dashboard.watch.count_changed", count = count, outcome = ?outcome);
                }
                Ok(_) => {}
                Err(e) => warn!(event = "dashboard.watch.count_failed", error = %e),
            }
        }

        bus.poll(now);
        if cursor.observe(&bus) {
            let snapshot = WatchSnapshot {
                refresh: bus.counter(),
                range: controller.range(),
                sessions,
                status: monitor.status(),
                stale: monitor.consecutive_failures() > 0,
            };
            if ctx.json() {
                println!("{}", output_snapshot_json(&snapshot));
            } else {
                println!("{}", format_snapshot_line(&snapshot));
            }
            printed += 1;
            if iterations.is_some_and(|limit| printed >= limit) {
                break;
            }
        }

        let next = [
            bus.next_deadline(),
            status_poll.next_deadline(),
            count_poll.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min();
        let Some(next) = next else {
            break;
        };
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        }
    }

    bus.shutdown();
    status_poll.cancel();
    count_poll.cancel();
    info!(event = "dashboard.watch.stopped", refreshes = bus.counter());
    Ok(())
}
