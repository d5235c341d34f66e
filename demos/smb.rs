#[macro_use]
extern crate log;

use std::io::{self, Write};

use argh::FromArgs;

use smbc_client::{AuthResponse, SmbContext, SmbDirentType, SmbOptions};

#[derive(FromArgs)]
#[argh(description = "
Show the content of a smb directory or file.

Paths are either full smb://server/share/path uris or paths below the server.")]
struct Args {
    #[argh(option, description = "smb://path/to/dir style directory")]
    show_dir: Option<String>,
    #[argh(option, description = "smb://path/to/file style file")]
    show_file: Option<String>,
    #[argh(option, short = 'P', description = "specify password")]
    password: Option<String>,
    #[argh(
        option,
        short = 'u',
        default = r#""guest".to_string()"#,
        description = "specify username"
    )]
    username: String,
    #[argh(
        option,
        short = 'w',
        default = r#""WORKGROUP".to_string()"#,
        description = "specify workgroup"
    )]
    workgroup: String,
    #[argh(
        option,
        short = 's',
        default = r#""smb://localhost".to_string()"#,
        description = "smb://address[:port] paths are relative to"
    )]
    server: String,
}

fn main() -> anyhow::Result<()> {
    assert!(env_logger::builder().try_init().is_ok());
    let args: Args = argh::from_env();

    let mut context = init_context(&args)?;
    if let Some(dir) = &args.show_dir {
        show_dir(&context, dir)?;
    } else if let Some(file) = &args.show_file {
        show_file(&context, file)?;
    } else {
        warn!("nothing to show; use --show-dir or --show-file");
    }

    info!("destroying context...");
    context.destroy()?;
    info!("context destroyed");

    Ok(())
}

fn init_context(args: &Args) -> anyhow::Result<SmbContext<smbc_client::NativeBackend>> {
    info!(
        "initializing context with server {}, with username {} and workgroup {}",
        args.server, args.username, args.workgroup
    );
    let workgroup = args.workgroup.clone();
    let username = args.username.clone();
    let password = args.password.clone();
    let context = SmbContext::native(
        SmbOptions::default()
            .server(&args.server)
            .workgroup(&args.workgroup)
            .user(&args.username)
            .auth_resolver(move |req| {
                let password = match &password {
                    Some(p) => p.clone(),
                    None => read_secret_from_tty(&format!(
                        "auth for {} {}: ",
                        req.server, req.share
                    ))
                    .unwrap_or_default(),
                };
                AuthResponse::new(workgroup.as_str(), username.as_str(), password.as_str())
            }),
    )?;

    Ok(context)
}

fn show_dir(context: &SmbContext<smbc_client::NativeBackend>, uri: &str) -> anyhow::Result<()> {
    info!("listing entries at {}", uri);
    let mut dir = context.open_dir(uri)?;
    for entry in dir.by_ref() {
        let entry = entry?;
        let kind = match entry.get_type() {
            SmbDirentType::Dir => "dir",
            SmbDirentType::File => "file",
            SmbDirentType::Link => "link",
            SmbDirentType::FileShare => "share",
            SmbDirentType::Server => "server",
            SmbDirentType::Workgroup => "workgroup",
            _ => "other",
        };
        if entry.comment().is_empty() {
            println!("{:<10} {}", kind, entry.name());
        } else {
            println!("{:<10} {} ({})", kind, entry.name(), entry.comment());
        }
    }
    dir.close()?;
    Ok(())
}

fn show_file(context: &SmbContext<smbc_client::NativeBackend>, uri: &str) -> anyhow::Result<()> {
    info!("reading file at {}", uri);
    let mut file = context.open(uri)?;
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    io::copy(&mut file, &mut stdout)?;
    stdout.flush()?;
    file.close()?;
    Ok(())
}

/// Read a secret from tty with customisable prompt
fn read_secret_from_tty(prompt: &str) -> io::Result<String> {
    rpassword::prompt_password(prompt)
}
