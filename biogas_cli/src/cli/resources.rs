use std::{fs, path::PathBuf};

use anyhow::Context;
use biogas_client::api::{AccessLevel, NewResource, Resource};
use biogas_core::ResourceId;
use bytes::Bytes;
use clap::{Args, Subcommand};

use crate::cli::common::ConnectionArgs;

#[derive(Debug, Args)]
pub(crate) struct ResourcesCommand {
    #[command(subcommand)]
    subcmd: ResourcesSubcommand,
}

#[derive(Debug, Subcommand)]
enum ResourcesSubcommand {
    /// Resources visible in the selected institution.
    List {
        /// Only the ones you uploaded.
        #[arg(long)]
        mine: bool,
    },

    /// Upload a file.
    Upload {
        file: PathBuf,

        /// Display name; defaults to the file name.
        #[arg(long)]
        name: Option<String>,

        /// public or private.
        #[arg(long, default_value = "publico")]
        access: AccessLevel,
    },

    /// Print a download link.
    Link { id: u64 },

    /// Delete a resource.
    Delete { id: u64 },
}

impl ResourcesCommand {
    pub(crate) async fn run(&self, conn: &ConnectionArgs) -> anyhow::Result<()> {
        let client = conn.client()?;
        match &self.subcmd {
            ResourcesSubcommand::List { mine } => {
                let resources = if *mine {
                    client.my_resources().await?
                } else {
                    client.resources().await?
                };
                for resource in &resources {
                    print_resource(resource);
                }
            }
            ResourcesSubcommand::Upload { file, name, access } => {
                let contents = fs::read(file)
                    .with_context(|| format!("failed to read {}", file.display()))?;
                let file_name = file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .context("upload path has no file name")?;

                let created = client
                    .upload_resource(&NewResource {
                        name: name.clone().unwrap_or_else(|| file_name.clone()),
                        access: *access,
                        file_name,
                        mime: None,
                        contents: Bytes::from(contents),
                    })
                    .await?;
                print_resource(&created);
            }
            ResourcesSubcommand::Link { id } => {
                let link = client.resource_download_link(ResourceId(*id)).await?;
                println!("{} ({}, {} bytes)", link.name, link.file_type, link.size);
                println!("{}", link.download_url);
            }
            ResourcesSubcommand::Delete { id } => {
                client.delete_resource(ResourceId(*id)).await?;
                println!("Deleted resource {id}.");
            }
        }
        Ok(())
    }
}

fn print_resource(resource: &Resource) {
    println!(
        "{:>4}  {:<32} {:<8} {}  {}",
        resource.id,
        resource.name,
        resource.access,
        resource.uploaded_at,
        resource.uploaded_by_username
    );
}
