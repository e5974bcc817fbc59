//! iclass-signin - sign in to iClass through the campus SSO
//!
//! This CLI lets a student:
//! - Sign in (weak-password notice included) and write a `config.json` profile
//! - List check-in records of every enrolled course with their QR sign URLs
//! - Print the QR sign URL of a single class meeting

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use dialoguer::{Input, Password};
use iclassauth::{
    sign_in, AuthConfig, AuthError, CasHandshake, Credentials, SessionBootstrapper, SignedIn,
};
use iclassapp::{qr, AppError, Endpoints, IclassClient, Result, SigninProfile};
use tracing_subscriber::EnvFilter;

/// iclass-signin - iClass attendance from the command line
#[derive(Parser)]
#[command(name = "iclass-signin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Skip TLS certificate verification (only for a broken campus proxy)
    #[arg(long, global = true)]
    insecure: bool,

    /// Seconds to wait on the weak-password notice before continuing
    #[arg(long, global = true)]
    wait_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, discover this semester's courses and write the profile file
    Login(LoginArgs),

    /// Sign in and list check-in records with QR sign URLs
    Records(RecordsArgs),

    /// Print the QR sign URL for one class meeting
    Qr(QrArgs),
}

#[derive(Args)]
struct AccountArgs {
    /// Student ID (prompted for when absent)
    #[arg(long, env = "ICLASS_USERNAME")]
    username: Option<String>,

    /// SSO password (prompted for when absent)
    #[arg(long, env = "ICLASS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Args)]
struct LoginArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// Where to write the profile
    #[arg(long, short, default_value = "config.json")]
    output: PathBuf,
}

#[derive(Args)]
struct RecordsArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// Timestamp (ms) to put in QR URLs; defaults to now
    #[arg(long)]
    timestamp: Option<i64>,

    /// Show at most this many records per course
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct QrArgs {
    /// courseSchedId of the class meeting
    #[arg(long)]
    sched_id: String,

    /// Timestamp (ms); defaults to now
    #[arg(long)]
    timestamp: Option<i64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,iclassauth=info,iclassapp=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if let AppError::Auth(auth) = &err {
                eprintln!("{}", hint(auth));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login(args) => {
            let (signed_in, student_id) =
                authenticate(cli.insecure, cli.wait_secs, &args.account).await?;
            login(signed_in, &student_id, &args.output).await
        }
        Commands::Records(args) => {
            let (signed_in, _) = authenticate(cli.insecure, cli.wait_secs, &args.account).await?;
            records(signed_in, args.timestamp, args.limit).await
        }
        Commands::Qr(args) => {
            let url = qr::sign_url(
                &Endpoints::default(),
                &args.sched_id,
                args.timestamp.unwrap_or_else(now_millis),
            )?;
            println!("{url}");
            Ok(())
        }
    }
}

async fn login(signed_in: SignedIn, student_id: &str, output: &Path) -> Result<()> {
    let login_name = signed_in
        .http
        .login_name()
        .unwrap_or_else(|| student_id.to_string());
    println!("Signed in as {}", signed_in.app.display_name);

    let client = IclassClient::new(&signed_in.http, signed_in.app, Endpoints::default());
    let semester = client.current_semester().await?;
    println!("Semester: {} ({})", semester.name, semester.code);

    let courses = client.courses(&semester.code).await?;
    for course in &courses {
        println!("  - {} (ID: {})", course.name, course.id);
    }

    SigninProfile::from_courses(login_name, &courses).save(output)?;
    println!("Profile written to {}", output.display());
    Ok(())
}

async fn records(signed_in: SignedIn, timestamp: Option<i64>, limit: Option<usize>) -> Result<()> {
    println!("Signed in as {}", signed_in.app.display_name);
    let client = IclassClient::new(&signed_in.http, signed_in.app, Endpoints::default());
    let semester = client.current_semester().await?;
    let courses = client.courses(&semester.code).await?;
    let timestamp = timestamp.unwrap_or_else(now_millis);

    for course in &courses {
        let records = client.sign_records(course).await?;
        println!("{} ({})", course.name, course.id);
        if records.is_empty() {
            println!("  no check-in records");
        }
        for record in records.iter().take(limit.unwrap_or(usize::MAX)) {
            let url = qr::sign_url(client.endpoints(), &record.course_sched_id, timestamp)?;
            println!("  {}  {}", record.date, url);
        }
    }
    Ok(())
}

async fn authenticate(
    insecure: bool,
    wait_secs: Option<u64>,
    account: &AccountArgs,
) -> Result<(SignedIn, String)> {
    let mut config =
        AuthConfig::from_env().map_err(|e| AuthError::InvalidConfig(e.to_string()))?;
    if insecure {
        config.verify_certificates = false;
    }
    if let Some(secs) = wait_secs {
        config.interstitial_wait = Duration::from_secs(secs);
    }

    let credentials = credentials(account)?;
    if !credentials.is_complete() {
        return Err(
            AuthError::InvalidConfig("student ID and password are required".into()).into(),
        );
    }

    let handshake = CasHandshake::new(config)?;
    let bootstrapper = SessionBootstrapper::new(handshake.config());
    println!("Signing in through SSO...");
    let signed_in = sign_in(&handshake, &bootstrapper, &credentials).await?;
    Ok((signed_in, credentials.identifier().to_string()))
}

fn credentials(account: &AccountArgs) -> Result<Credentials> {
    let username = match &account.username {
        Some(username) => username.clone(),
        None => Input::<String>::new()
            .with_prompt("Student ID")
            .interact_text()
            .map_err(prompt_error)?,
    };
    let password = match &account.password {
        Some(password) => password.clone(),
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(prompt_error)?,
    };
    Ok(Credentials::new(username, password))
}

fn prompt_error(err: dialoguer::Error) -> AppError {
    AppError::Io(std::io::Error::other(err.to_string()))
}

fn hint(err: &AuthError) -> &'static str {
    if err.is_rejection() {
        "hint: check your student ID and password"
    } else if err.is_protocol_drift() {
        "hint: the SSO pages changed shape; this tool may need an update"
    } else {
        "hint: check your network connection (try --insecure only for certificate problems)"
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}
