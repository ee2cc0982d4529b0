use face_enroll::{
    camera::{CameraBackend, V4lCamera, VideoConstraints, VideoStream},
    cli::{confirm, read_password, run_enroll_shell, shell::DELETE_PROMPT},
    core::{ControllerSettings, EnrollmentController, FaceSectionView, Notices, Phase},
    storage::{Session, SessionStore},
    Config, CapturedFrame, DevMode, EnrollError, EnrollmentApi, Paths, ServiceClient,
};

use clap::{Parser, Subcommand};
use anyhow::Result;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "face-enroll")]
#[command(about = "Face enrollment client for the attendance backend")]
struct Cli {
    /// Enable development mode (keeps config, session and captures in ./dev_data)
    #[arg(long, global = true)]
    dev: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the access token
    Login {
        #[arg(short, long)]
        email: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored access token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show the face enrollment status
    Status,
    /// Interactive camera capture and enrollment
    Enroll,
    /// Delete the face registration
    Delete {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List cameras and show which one would be auto-detected
    DetectCamera,
    /// Open the camera, grab one frame and save it
    TestCamera {
        #[arg(short, long, default_value = "camera_test.jpg")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.dev);

    let dev_mode = DevMode::new(cli.dev)?;
    let paths = Paths::new(&dev_mode)?;
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_or_default(&paths.config_file())?,
    };
    let sessions = SessionStore::new(paths.session_file());

    match cli.command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password("Password: ")?,
            };
            let client = ServiceClient::new(&config.server)?;
            let response = client.login(&email, &password)?;
            sessions.save(&Session {
                access_token: response.tokens.access_token,
                token_type: response.tokens.token_type,
                email: Some(response.user.email.clone()),
            })?;
            println!("✅ Signed in as {} ({})", response.user.full_name(), response.user.email);
        }
        Commands::Logout => {
            if sessions.clear()? {
                println!("Signed out");
            } else {
                println!("No stored session");
            }
        }
        Commands::Whoami => {
            let client = authorized_client(&config, &sessions)?;
            match client.me() {
                Ok(user) => {
                    println!("{} <{}>", user.full_name(), user.email);
                    println!("  Employee ID: {}", user.employee_id);
                    println!("  Role:        {}", user.role.map(|r| r.name).unwrap_or_else(|| "-".into()));
                    println!("  Department:  {}", user.department.map(|d| d.name).unwrap_or_else(|| "-".into()));
                    println!("  Shift:       {}", user.shift.map(|s| s.name).unwrap_or_else(|| "-".into()));
                }
                Err(e) if e.is_unauthorized() => {
                    sessions.clear()?;
                    return Err(EnrollError::NotLoggedIn.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Status => {
            let client = authorized_client(&config, &sessions)?;
            let status = client.face_status()?;
            let view = FaceSectionView::derive(Phase::Idle, Some(&status), &Notices::default(), Instant::now());
            print!("{}", view.render());
        }
        Commands::Enroll => {
            let client = authorized_client(&config, &sessions)?;
            let camera = V4lCamera::new(&config.camera);
            let mut controller = EnrollmentController::new(
                client,
                camera,
                ControllerSettings::from_config(&config),
            );
            run_enroll_shell(&mut controller, &config.preview, &dev_mode)?;
        }
        Commands::Delete { yes } => {
            let client = authorized_client(&config, &sessions)?;
            let status = client.face_status()?;
            if !status.has_face_registered() {
                println!("No face registration to delete");
                return Ok(());
            }
            if !yes && !confirm(DELETE_PROMPT, &mut io::stdin().lock())? {
                println!("Cancelled");
                return Ok(());
            }
            let detail = client.delete_face()?;
            println!("✅ {}", detail);
        }
        Commands::DetectCamera => {
            println!("🔍 Detecting available cameras...\n");

            let cameras = V4lCamera::list_all_cameras()?;
            if cameras.is_empty() {
                println!("❌ No cameras found!");
                println!("\nTroubleshooting:");
                println!("  1. Check if cameras are connected");
                println!("  2. Ensure you have permission to access /dev/video*");
                println!("  3. Make sure your user is in the 'video' group");
                return Ok(());
            }

            for camera in &cameras {
                println!("📷 /dev/video{}: {}", camera.index, camera.name);
                println!("   capture: {}  formats: {}",
                         if camera.video_capture { "yes" } else { "no" },
                         camera.formats.join(", "));
            }

            println!("\n✅ Auto-detect picks: /dev/video{}", V4lCamera::detect_front_camera()?);
            println!("\n📝 To pin a camera, set in {}:", paths.config_file().display());
            println!("   [camera]");
            println!("   device_index = <NUMBER>");
        }
        Commands::TestCamera { output } => {
            let mut camera = V4lCamera::new(&config.camera);
            let constraints = VideoConstraints::enrollment(config.camera.width, config.camera.height);
            let mut stream = camera.acquire(&constraints)?;
            let frame = stream.grab_frame()?;
            stream.stop();

            let captured = CapturedFrame::encode(&frame, config.capture.jpeg_quality)?;
            captured.save(&output)?;
            println!("Captured {}x{} frame to {}", captured.width, captured.height, output.display());
        }
    }

    Ok(())
}

fn authorized_client(config: &Config, sessions: &SessionStore) -> face_enroll::Result<ServiceClient> {
    let token = sessions.require_token()?;
    Ok(ServiceClient::new(&config.server)?.with_token(token))
}

fn setup_logging(dev_mode: bool) {
    if dev_mode {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_file(true)
            .with_line_number(true)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(io::stderr)
            .init();
    }
}
