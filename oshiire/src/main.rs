mod app;
mod core;
mod ipc;
mod wm;

use anyhow::Result;
use argh::FromArgs;
use ipc::IpcClient;
use oshiire_ipc::{Command, Response};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Oshiire - named scratchpad daemon for i3 and sway
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    Show(ShowCmd),
    Hide(HideCmd),
    Next(NextCmd),
    Toggle(ToggleCmd),
    HideCurrent(HideCurrentCmd),
    Run(RunCmd),
    Dialog(DialogCmd),
    GeomRestore(GeomRestoreCmd),
    GeomDump(GeomDumpCmd),
    GeomSave(GeomSaveCmd),
    GeomAutosaveMode(GeomAutosaveModeCmd),
    ListTags(ListTagsCmd),
    GetState(GetStateCmd),
    Reload(ReloadCmd),
    Quit(QuitCmd),
}

/// Start the oshiire daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Bring a tag's windows to the current workspace
#[derive(FromArgs)]
#[argh(subcommand, name = "show")]
struct ShowCmd {
    /// tag name
    #[argh(positional)]
    tag: String,
}

/// Hide a tag's windows on the scratchpad layer
#[derive(FromArgs)]
#[argh(subcommand, name = "hide")]
struct HideCmd {
    /// tag name
    #[argh(positional)]
    tag: String,
}

/// Cycle focus to the next window of the focused tag
#[derive(FromArgs)]
#[argh(subcommand, name = "next")]
struct NextCmd {}

/// Toggle a tag between hidden and visible, launching its program when empty
#[derive(FromArgs)]
#[argh(subcommand, name = "toggle")]
struct ToggleCmd {
    /// tag name
    #[argh(positional)]
    tag: String,
}

/// Hide the tag owning the focused window
#[derive(FromArgs)]
#[argh(subcommand, name = "hide-current")]
struct HideCurrentCmd {}

/// Focus or launch a sub-program of a tag
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
struct RunCmd {
    /// tag name
    #[argh(positional)]
    tag: String,
    /// sub-program name from the tag's configuration
    #[argh(positional)]
    app: String,
}

/// Surface dialog windows on the current workspace
#[derive(FromArgs)]
#[argh(subcommand, name = "dialog")]
struct DialogCmd {}

/// Re-apply the saved geometry of the focused tag
#[derive(FromArgs)]
#[argh(subcommand, name = "geom-restore")]
struct GeomRestoreCmd {}

/// Save the focused window's geometry and persist the configuration
#[derive(FromArgs)]
#[argh(subcommand, name = "geom-dump")]
struct GeomDumpCmd {}

/// Save the focused window's geometry in memory
#[derive(FromArgs)]
#[argh(subcommand, name = "geom-save")]
struct GeomSaveCmd {}

/// Toggle periodic geometry autosave
#[derive(FromArgs)]
#[argh(subcommand, name = "geom-autosave-mode")]
struct GeomAutosaveModeCmd {}

/// List tags and their windows
#[derive(FromArgs)]
#[argh(subcommand, name = "list-tags")]
struct ListTagsCmd {}

/// Show daemon state
#[derive(FromArgs)]
#[argh(subcommand, name = "get-state")]
struct GetStateCmd {}

/// Reload the configuration and re-classify all windows
#[derive(FromArgs)]
#[argh(subcommand, name = "reload")]
struct ReloadCmd {}

/// Quit the oshiire daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["oshiire", "--help"];
            match Cli::from_args(&args[..1], &args[1..]) {
                Ok(_) => {}
                Err(e) => {
                    println!("{}", e.output);
                }
            }
            Ok(())
        }
        Some(SubCommand::Start(_)) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            tracing::info!("oshiire starting");
            app::App::run()
        }
        Some(SubCommand::Version(_)) => {
            println!("oshiire {}", VERSION);
            Ok(())
        }
        Some(subcmd) => run_cli(subcmd),
    }
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd);
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::Tags { tags } => {
            for t in tags {
                println!(
                    "{}: {} window(s) [{}] geom={}",
                    t.name,
                    t.window_count,
                    t.classes.join(", "),
                    t.geom.as_deref().unwrap_or("-")
                );
            }
        }
        Response::State { state } => {
            println!("Tags: {}", state.tag_count);
            println!("Windows: {}", state.window_count);
            println!("Transients: {}", state.transient_count);
            println!("Geometry autosave: {}", state.autosave);
        }
    }

    Ok(())
}

fn to_command(subcmd: SubCommand) -> Command {
    match subcmd {
        SubCommand::Start(_) | SubCommand::Version(_) => {
            unreachable!("handled in main")
        }
        SubCommand::Show(cmd) => Command::Show { tag: cmd.tag },
        SubCommand::Hide(cmd) => Command::Hide { tag: cmd.tag },
        SubCommand::Next(_) => Command::Next,
        SubCommand::Toggle(cmd) => Command::Toggle { tag: cmd.tag },
        SubCommand::HideCurrent(_) => Command::HideCurrent,
        SubCommand::Run(cmd) => Command::Run {
            tag: cmd.tag,
            app: cmd.app,
        },
        SubCommand::Dialog(_) => Command::Dialog,
        SubCommand::GeomRestore(_) => Command::GeomRestore,
        SubCommand::GeomDump(_) => Command::GeomDump,
        SubCommand::GeomSave(_) => Command::GeomSave,
        SubCommand::GeomAutosaveMode(_) => Command::GeomAutosaveMode,
        SubCommand::ListTags(_) => Command::ListTags,
        SubCommand::GetState(_) => Command::GetState,
        SubCommand::Reload(_) => Command::Reload,
        SubCommand::Quit(_) => Command::Quit,
    }
}
