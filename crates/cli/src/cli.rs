use std::path::PathBuf;

use clap::{Parser, Subcommand};

use formforge_engine::config::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(name = "formforge", version, about = "Form definition admin tool")]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create the database schema
    Init,
    /// List stored forms
    Forms,
    /// Print a stored form's materialized fields as JSON
    Show { form_id: i64 },
    /// Manage select fields
    Select {
        #[command(subcommand)]
        action: SelectCmd,
    },
    /// Manage stored forms
    Form {
        #[command(subcommand)]
        action: FormCmd,
    },
    /// Probe the document service
    HealthCheck,
}

#[derive(Subcommand, Debug)]
pub enum SelectCmd {
    /// Create a select field
    Add {
        label: String,
        #[arg(required = true)]
        choices: Vec<String>,
    },
    Delete { label: String },
    List,
}

#[derive(Subcommand, Debug)]
pub enum FormCmd {
    Delete { label: String },
    /// Write a form's document template to a file
    Template { label: String, out: PathBuf },
}
