use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::{Args, Subcommand};

use crate::cli::common::{ConnectionArgs, print_user};

#[derive(Debug, Args)]
pub(crate) struct AuthCommand {
    #[command(subcommand)]
    subcmd: AuthSubcommand,
}

#[derive(Debug, Subcommand)]
enum AuthSubcommand {
    /// Sign in and persist the session.
    Login(LoginCommand),

    /// Show what the stored session holds, without contacting the backend.
    Status,

    /// Fetch the signed-in user's profile from the backend.
    Whoami,

    /// Exchange the refresh token for a new access token now.
    Refresh,

    /// Revoke the refresh token and forget the stored session.
    Logout,
}

impl AuthCommand {
    pub(crate) async fn run(&self, conn: &ConnectionArgs) -> anyhow::Result<()> {
        match &self.subcmd {
            AuthSubcommand::Login(cmd) => cmd.run(conn).await,
            AuthSubcommand::Status => status(conn),
            AuthSubcommand::Whoami => whoami(conn).await,
            AuthSubcommand::Refresh => refresh(conn).await,
            AuthSubcommand::Logout => logout(conn).await,
        }
    }
}

#[derive(Debug, Args)]
struct LoginCommand {
    #[arg(long)]
    username: Option<String>,

    /// Prompted for when omitted.
    #[arg(long)]
    password: Option<String>,
}

impl LoginCommand {
    async fn run(&self, conn: &ConnectionArgs) -> anyhow::Result<()> {
        let client = conn.client()?;

        let username = match &self.username {
            Some(username) => username.clone(),
            None => prompt_line("Username: ")?,
        };
        let password = match &self.password {
            Some(password) => password.clone(),
            None => rpassword::prompt_password("Password: ").context("failed to read password")?,
        };

        match client.login(username.trim(), &password).await? {
            Some(user) => {
                println!("Signed in as {}.", user.display_name());
                if !user.is_approved() {
                    println!("This account is still waiting for administrator approval.");
                }
            }
            None => println!("Signed in as {}.", username.trim()),
        }
        Ok(())
    }
}

fn status(conn: &ConnectionArgs) -> anyhow::Result<()> {
    let session = conn.session()?;
    let snapshot = session.snapshot()?;

    if snapshot.access_token.is_none() {
        println!("Not signed in.");
    } else {
        println!("Signed in.");
        println!(
            "Refresh token: {}",
            if snapshot.refresh_token.is_some() {
                "stored"
            } else {
                "missing"
            }
        );
    }
    if let Some(user) = &snapshot.user {
        print_user(user);
    }
    println!(
        "Institution: {}",
        session
            .institution()?
            .unwrap_or_else(|| "<none>".to_owned())
    );
    Ok(())
}

async fn whoami(conn: &ConnectionArgs) -> anyhow::Result<()> {
    let client = conn.client()?;
    let user = client.current_user().await?;
    print_user(&user);
    Ok(())
}

async fn refresh(conn: &ConnectionArgs) -> anyhow::Result<()> {
    let client = conn.client()?;
    client.refresh_session().await?;
    println!("Access token refreshed.");
    Ok(())
}

async fn logout(conn: &ConnectionArgs) -> anyhow::Result<()> {
    let client = conn.client()?;
    client.logout().await?;
    println!("Cleared stored session.");
    Ok(())
}

fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}");
    io::stdout().flush().context("failed to flush prompt")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end().to_owned())
}
