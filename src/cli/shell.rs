use crate::camera::CameraBackend;
use crate::cli::ascii_preview::{check_for_escape, clear_screen, AsciiRenderer};
use crate::common::config::PreviewConfig;
use crate::common::{DevMode, Result};
use crate::core::{CommandOutcome, EnrollmentController};
use crate::service::EnrollmentApi;
use crossterm::terminal;
use std::io::{self, BufRead, Write};
use std::time::Duration;

pub const DELETE_PROMPT: &str =
    "Delete your face registration? You will need to enroll again to use face sign-in.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    StartCamera,
    Capture,
    StopCamera,
    Preview,
    Delete,
    Refresh,
    Quit,
}

pub fn parse_command(line: &str) -> Option<ShellCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "s" | "start" => Some(ShellCommand::StartCamera),
        "c" | "capture" => Some(ShellCommand::Capture),
        "x" | "stop" => Some(ShellCommand::StopCamera),
        "p" | "preview" => Some(ShellCommand::Preview),
        "d" | "delete" => Some(ShellCommand::Delete),
        "r" | "refresh" => Some(ShellCommand::Refresh),
        "q" | "quit" | "exit" => Some(ShellCommand::Quit),
        _ => None,
    }
}

/// Reads a yes/no answer; anything but `y`/`yes` is a no.
pub fn confirm(prompt: &str, input: &mut impl BufRead) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Interactive face section: each key maps onto one controller command.
pub fn run_enroll_shell<A: EnrollmentApi, C: CameraBackend>(
    controller: &mut EnrollmentController<A, C>,
    preview: &PreviewConfig,
    dev_mode: &DevMode,
) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    controller.enter_section();

    loop {
        let view = controller.view();
        println!("\n{}", view.render());
        println!("{}", view.actions().join("  "));
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            controller.leave_section();
            break;
        }

        let Some(command) = parse_command(&line) else {
            println!("Unknown command: {}", line.trim());
            continue;
        };

        let outcome = match command {
            ShellCommand::StartCamera => {
                println!("Starting camera...");
                controller.start_camera()
            }
            ShellCommand::Capture => {
                println!("Capturing and uploading...");
                let outcome = controller.capture_face();
                if outcome.is_applied() {
                    save_capture(controller, dev_mode);
                }
                outcome
            }
            ShellCommand::StopCamera => controller.stop_camera(),
            ShellCommand::Preview => {
                if preview.enable_ascii_preview {
                    if let Err(e) = show_preview(controller, preview) {
                        tracing::warn!("Preview failed: {}", e);
                        println!("Preview failed: {}", e.user_message());
                    }
                } else {
                    println!("ASCII preview is disabled in the config");
                }
                CommandOutcome::Applied
            }
            ShellCommand::Delete => {
                if view.delete_visible && !confirm(DELETE_PROMPT, &mut input)? {
                    continue;
                }
                controller.delete_face_registration()
            }
            ShellCommand::Refresh => {
                controller.refresh_status();
                CommandOutcome::Applied
            }
            ShellCommand::Quit => {
                controller.leave_section();
                break;
            }
        };

        if let CommandOutcome::Ignored { phase } = outcome {
            println!("Not available while {}", phase);
        }
    }

    Ok(())
}

fn save_capture<A: EnrollmentApi, C: CameraBackend>(controller: &EnrollmentController<A, C>, dev_mode: &DevMode) {
    let (Some(frame), Some(path)) = (controller.last_capture(), dev_mode.get_capture_path("face")) else {
        return;
    };
    match frame.save(&path) {
        Ok(()) => tracing::debug!("Saved capture to {}", path.display()),
        Err(e) => tracing::warn!("Failed to save capture: {}", e),
    }
}

fn show_preview<A: EnrollmentApi, C: CameraBackend>(
    controller: &mut EnrollmentController<A, C>,
    preview: &PreviewConfig,
) -> Result<()> {
    let renderer = AsciiRenderer::new(preview.ascii_width, preview.ascii_height);

    terminal::enable_raw_mode()?;
    let result = preview_loop(controller, &renderer);
    terminal::disable_raw_mode()?;
    println!();
    result
}

fn preview_loop<A: EnrollmentApi, C: CameraBackend>(
    controller: &mut EnrollmentController<A, C>,
    renderer: &AsciiRenderer,
) -> Result<()> {
    loop {
        let Some(frame) = controller.preview_frame()? else {
            println!("Start the camera first\r");
            return Ok(());
        };

        clear_screen()?;
        print!("{}", renderer.render_frame(&frame, "Center your face - Esc to close"));
        io::stdout().flush()?;

        if check_for_escape()? {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(33));
    }
}
