use biogas_core::{UserId, UserProfile};
use clap::{Args, Subcommand};

use crate::cli::common::ConnectionArgs;

#[derive(Debug, Args)]
pub(crate) struct UsersCommand {
    #[command(subcommand)]
    subcmd: UsersSubcommand,
}

#[derive(Debug, Subcommand)]
enum UsersSubcommand {
    /// Accounts that can sign in.
    Approved,

    /// Accounts waiting for approval.
    Pending,

    /// Approve a pending account.
    Approve {
        id: u64,
    },
}

impl UsersCommand {
    pub(crate) async fn run(&self, conn: &ConnectionArgs) -> anyhow::Result<()> {
        let client = conn.client()?;
        match &self.subcmd {
            UsersSubcommand::Approved => {
                let approved = client.approved_users().await?;
                print_users(&approved.users);
                println!("{} approved", approved.total);
            }
            UsersSubcommand::Pending => {
                let pending = client.pending_users().await?;
                print_users(&pending.users);
                println!("{} pending", pending.total);
            }
            UsersSubcommand::Approve { id } => {
                let approved = client.approve_user(UserId(*id)).await?;
                match approved.message {
                    Some(message) => println!("{message}"),
                    None => println!("Approved user {id}."),
                }
            }
        }
        Ok(())
    }
}

fn print_users(users: &[UserProfile]) {
    for user in users {
        println!(
            "{:>5}  {:<20} {:<30} {}",
            user.id,
            user.username,
            user.email,
            user.display_name()
        );
    }
}
