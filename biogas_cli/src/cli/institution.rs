use clap::{Args, Subcommand};

use crate::cli::common::ConnectionArgs;

#[derive(Debug, Args)]
pub(crate) struct InstitutionCommand {
    #[command(subcommand)]
    subcmd: InstitutionSubcommand,
}

#[derive(Debug, Subcommand)]
enum InstitutionSubcommand {
    /// Remember the institution slug used by resource commands.
    Set { slug: String },

    /// Print the selected institution.
    Show,

    /// Forget the selected institution.
    Clear,
}

impl InstitutionCommand {
    pub(crate) fn run(&self, conn: &ConnectionArgs) -> anyhow::Result<()> {
        let session = conn.session()?;
        match &self.subcmd {
            InstitutionSubcommand::Set { slug } => {
                let slug = slug.trim();
                if slug.is_empty() {
                    anyhow::bail!("institution slug must not be empty");
                }
                session.set_institution(slug)?;
                println!("Selected institution {slug}.");
            }
            InstitutionSubcommand::Show => match session.institution()? {
                Some(slug) => println!("{slug}"),
                None => println!("No institution selected."),
            },
            InstitutionSubcommand::Clear => {
                session.clear_institution()?;
                println!("Cleared selected institution.");
            }
        }
        Ok(())
    }
}
