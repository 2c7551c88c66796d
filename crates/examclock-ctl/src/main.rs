//! examclock-ctl - Command-line control for examclockd
//!
//! Sends operator commands to the service and prints what the exam room
//! display would show.

mod render;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use examclock_api::{ClientCommand, Command, Exam, ResponsePayload, SessionMode, SessionState};
use examclock_config::{Policy, load_config_or_default};
use examclock_ipc::{IpcClient, unexpected};
use examclock_store::import_session_file;
use examclock_util::{ExamId, auto_start_target_today, default_config_path, default_socket_path};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::render::{render_event, render_view};

/// examclock-ctl - Control the exam room countdown
#[derive(Parser, Debug)]
#[command(name = "examclock-ctl")]
#[command(about = "Control the examclockd countdown service", long_about = None)]
struct Args {
    /// Socket path for examclockd (or set EXAMCLOCK_SOCKET env var)
    #[arg(short, long, env = "EXAMCLOCK_SOCKET")]
    socket: Option<PathBuf>,

    /// Configuration file, for presets and import defaults
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Show clock times in 24-hour format
    #[arg(long)]
    clock_24h: bool,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Start the live session for every exam
    Begin,

    /// Leave the live session
    End {
        /// Also reset settings and exams to factory defaults
        #[arg(long)]
        reset: bool,
    },

    /// Pause one exam, or the whole session without --exam
    Pause {
        #[arg(long)]
        exam: Option<String>,
        /// Recorded in the session log
        justification: String,
    },

    /// Resume one exam, or the whole session without --exam
    Resume {
        #[arg(long)]
        exam: Option<String>,
    },

    /// Start or end a rest break
    Rest { exam: String },

    /// Start or end reader/writer time
    ReaderWriter { exam: String },

    /// Abandon an exam
    Abandon { exam: String, justification: String },

    /// Begin automatically at HH:MM today
    AutoStart { time: String },

    CancelAutoStart,

    /// Add an exam from the preset catalogue or from explicit durations
    Add {
        /// Catalogue exam name
        #[arg(long, conflicts_with = "name")]
        preset: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, default_value_t = 0)]
        read_mins: u32,

        #[arg(long, default_value_t = 0)]
        write_hrs: u32,

        #[arg(long, default_value_t = 0)]
        write_mins: u32,

        /// Extra writing time in minutes
        #[arg(long, default_value_t = 0)]
        extra_time: u32,

        /// Rest break allowance in minutes
        #[arg(long, default_value_t = 0)]
        rest_breaks: u32,

        /// Reader/writer allowance in minutes
        #[arg(long, default_value_t = 0)]
        reader_writer: u32,

        #[arg(long)]
        student: Option<String>,

        #[arg(long)]
        access_code: Option<String>,
    },

    /// Change an exam's configuration, live or in setup
    Update {
        exam: String,
        #[command(flatten)]
        edits: ExamEdits,
    },

    Delete { exam: String },

    /// Move the exam at one position to another (0-based)
    Reorder { from: usize, to: usize },

    /// Apply a session preset by title
    Preset {
        title: String,
        #[arg(long)]
        clear_exams: bool,
    },

    /// Switch between examinations and standardised tests
    Mode {
        #[arg(value_parser = parse_mode)]
        mode: SessionMode,
    },

    /// Show the exam page without going live
    Preview,

    /// Load a session file
    Import { file: PathBuf },

    /// Save the current setup as a session file
    Export {
        /// Directory to write into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// List session presets and catalogue exams
    Presets,

    /// Print the current display
    Status {
        /// Raw JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Follow events until the service shuts down
    Watch,
}

/// Exam fields to change; anything left out stays as it is
#[derive(clap::Args, Debug)]
struct ExamEdits {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    read_mins: Option<u32>,

    #[arg(long)]
    write_hrs: Option<u32>,

    #[arg(long)]
    write_mins: Option<u32>,

    #[arg(long)]
    extra_time: Option<u32>,

    #[arg(long)]
    rest_breaks: Option<u32>,

    #[arg(long)]
    reader_writer: Option<u32>,

    #[arg(long)]
    info: Option<String>,

    /// Shown on the display when special provisions are on; empty to clear
    #[arg(long)]
    student: Option<String>,

    /// Empty to remove the access code
    #[arg(long)]
    access_code: Option<String>,
}

impl ExamEdits {
    fn apply_to(&self, exam: &mut Exam) {
        if let Some(name) = &self.name {
            exam.name = name.clone();
        }
        if let Some(mins) = self.read_mins {
            exam.read_mins = mins;
        }
        if let Some(hrs) = self.write_hrs {
            exam.write_hrs = hrs;
        }
        if let Some(mins) = self.write_mins {
            exam.write_mins = mins;
        }
        if let Some(mins) = self.extra_time {
            exam.sp.extra_time = mins;
        }
        if let Some(mins) = self.rest_breaks {
            exam.sp.rest_breaks = mins;
        }
        if let Some(mins) = self.reader_writer {
            exam.sp.reader_writer_time = mins;
        }
        if let Some(info) = &self.info {
            exam.optional_info = info.clone();
        }
        if let Some(student) = &self.student {
            exam.sp.student_name = student.clone();
            exam.sp.show_student_name = !student.is_empty();
        }
        if let Some(code) = &self.access_code {
            exam.has_access_code = !code.is_empty();
            exam.access_code = code.clone();
        }
    }
}

/// `UpdateExam` for `exam_id` with `edits` applied to its current record
fn update_command(state: &SessionState, exam_id: &str, edits: &ExamEdits) -> Result<Command> {
    let mut exam = state
        .exam(&ExamId::new(exam_id))
        .cloned()
        .with_context(|| format!("No exam with id '{}'", exam_id))?;
    edits.apply_to(&mut exam);
    Ok(Command::UpdateExam { exam })
}

fn parse_mode(value: &str) -> Result<SessionMode, String> {
    match value {
        "examinations" | "exams" => Ok(SessionMode::Examinations),
        "standardised" | "standardized" => Ok(SessionMode::Standardised),
        other => Err(format!("unknown session mode '{}'", other)),
    }
}

fn exam_id(value: Option<String>) -> Option<ExamId> {
    value.map(ExamId::new)
}

/// The command an operator action maps to, for actions that are plain commands
fn command_for(action: &Action, policy: &Policy) -> Result<Option<Command>> {
    let now = examclock_util::now();

    let command = match action {
        Action::Begin => Command::BeginLiveSession,
        Action::End { reset } => Command::EndSession {
            should_reset: *reset,
        },
        Action::Pause {
            exam,
            justification,
        } => Command::Pause {
            exam_id: exam_id(exam.clone()),
            justification: justification.clone(),
        },
        Action::Resume { exam } => Command::Resume {
            exam_id: exam_id(exam.clone()),
        },
        Action::Rest { exam } => Command::ToggleRest {
            exam_id: ExamId::new(exam.clone()),
        },
        Action::ReaderWriter { exam } => Command::ToggleReaderWriter {
            exam_id: ExamId::new(exam.clone()),
        },
        Action::Abandon {
            exam,
            justification,
        } => Command::AbandonExam {
            exam_id: ExamId::new(exam.clone()),
            justification: justification.clone(),
        },
        Action::AutoStart { time } => Command::SetAutoStart {
            target: auto_start_target_today(time, now)?,
        },
        Action::CancelAutoStart => Command::CancelAutoStart,
        Action::Add {
            preset,
            name,
            read_mins,
            write_hrs,
            write_mins,
            extra_time,
            rest_breaks,
            reader_writer,
            student,
            access_code,
        } => {
            let mut exam = match (preset, name) {
                (Some(preset), _) => policy
                    .exam_from_preset(preset)
                    .with_context(|| format!("No catalogue exam named '{}'", preset))?,
                (None, Some(name)) => Exam::new(name.clone(), *read_mins, *write_hrs, *write_mins),
                (None, None) => bail!("Either --preset or --name is required"),
            };
            exam.sp.extra_time = *extra_time;
            exam.sp.rest_breaks = *rest_breaks;
            exam.sp.reader_writer_time = *reader_writer;
            if let Some(student) = student {
                exam.sp.student_name = student.clone();
                exam.sp.show_student_name = true;
            }
            if let Some(code) = access_code {
                exam.has_access_code = true;
                exam.access_code = code.clone();
            }
            Command::AddExam { exam }
        }
        Action::Delete { exam } => Command::DeleteExam {
            exam_id: ExamId::new(exam.clone()),
        },
        Action::Reorder { from, to } => Command::ReorderExams {
            old_index: *from,
            new_index: *to,
        },
        Action::Preset { title, clear_exams } => Command::ApplySessionPreset {
            title: title.clone(),
            clear_exams: *clear_exams,
        },
        Action::Mode { mode } => Command::SetSessionMode { mode: *mode },
        Action::Preview => Command::PreviewExams,
        Action::Import { file } => {
            let json = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read session file {:?}", file))?;
            let file = import_session_file(&json, &policy.defaults.settings, now)?;
            Command::ImportSession { file }
        }
        Action::Update { .. }
        | Action::Export { .. }
        | Action::Presets
        | Action::Status { .. }
        | Action::Watch => {
            return Ok(None);
        }
    };

    Ok(Some(command))
}

async fn run(args: Args) -> Result<()> {
    let socket_path = args.socket.clone().unwrap_or_else(default_socket_path);
    let policy = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    debug!(path = %socket_path.display(), "Connecting to examclockd");
    let mut client = IpcClient::connect(&socket_path)
        .await
        .with_context(|| format!("Failed to connect to examclockd at {:?}", socket_path))?;

    if let Some(command) = command_for(&args.action, &policy)? {
        let name = command.name();
        let changed = client.apply(command).await?;
        info!(command = name, changed, "Command sent");
        if !changed {
            println!("Nothing changed ({} does not apply right now)", name);
        }
        return Ok(());
    }

    match args.action {
        Action::Update { exam, edits } => {
            let state = match client.request(ClientCommand::GetState).await? {
                ResponsePayload::State(state) => state,
                other => return Err(unexpected(&other).into()),
            };
            let changed = client.apply(update_command(&state, &exam, &edits)?).await?;
            info!(exam = %exam, changed, "Exam update sent");
            if !changed {
                println!("Nothing changed for exam '{}'", exam);
            }
        }

        Action::Export { out } => {
            let (file_name, contents) = match client.request(ClientCommand::ExportSession).await? {
                ResponsePayload::Exported {
                    file_name,
                    contents,
                } => (file_name, contents),
                other => return Err(unexpected(&other).into()),
            };
            let path = out.join(file_name);
            std::fs::write(&path, contents)
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("{}", path.display());
        }

        Action::Presets => {
            let catalogue = match client.request(ClientCommand::ListPresets).await? {
                ResponsePayload::Presets(catalogue) => catalogue,
                other => return Err(unexpected(&other).into()),
            };
            println!("Session presets:");
            for preset in &catalogue.session_presets {
                println!("  {} ({:?})", preset.title, preset.mode);
            }
            println!("Exams:");
            for exam in &catalogue.exam_presets {
                println!(
                    "  [{}] {} / {}: {} min reading, {}h {}m writing",
                    exam.catalogue,
                    exam.category,
                    exam.name,
                    exam.read_mins,
                    exam.write_hrs,
                    exam.write_mins
                );
            }
        }

        Action::Status { json } => {
            let view = match client.request(ClientCommand::GetView).await? {
                ResponsePayload::View(view) => view,
                other => return Err(unexpected(&other).into()),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", render_view(&view, args.clock_24h));
            }
        }

        Action::Watch => {
            let mut events = client.subscribe().await?;
            loop {
                let event = events.next().await?;
                if let Some(line) = render_event(&event.payload, args.clock_24h) {
                    println!("{}", line);
                }
                if matches!(event.payload, examclock_api::EventPayload::Shutdown) {
                    break;
                }
            }
        }

        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    run(args).await
}
