mod cli;

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

use formforge_core::{FormId, SessionId};
use formforge_engine::{Config, Engine, HttpDocumentService, MemorySessionStore};
use formforge_storage::{Database, FormRepository};

use crate::cli::{Cli, Cmd, FormCmd, SelectCmd};

type AppEngine = Engine<Database, MemorySessionStore, HttpDocumentService>;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn build_engine(config: &Config) -> Result<AppEngine, Box<dyn Error>> {
    let database = Database::initialize(&config.database.path)?;
    let documents = HttpDocumentService::new(
        &config.document_service.url,
        config.document_service.timeout(),
    )?;
    Ok(Engine::new(database, MemorySessionStore::new(), documents))
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let config = Config::load(&cli.config)?;
    let mut engine = build_engine(&config)?;
    // Each invocation acts as a fresh editor session.
    let session = SessionId::new();

    match cli.cmd {
        Cmd::Init => {
            println!("database ready at {}", config.database.path.display());
        }
        Cmd::Forms => {
            for (label, form_id) in engine.forms_index()? {
                println!("{form_id}\t{label}");
            }
        }
        Cmd::Show { form_id } => {
            let rendered = engine.render_form(FormId::new(form_id))?;
            let out = serde_json::json!({
                "id": rendered.form_id,
                "label": rendered.label,
                "fields": rendered.instance,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Cmd::Select { action } => match action {
            SelectCmd::Add { label, choices } => {
                let mut editor = engine.select_editor(session);
                for choice in &choices {
                    editor.add_choice(choice)?;
                }
                let select_id = editor.commit(&label)?;
                println!("created select field {select_id} '{label}'");
            }
            SelectCmd::Delete { label } => {
                if engine.select_editor(session).delete(&label)? {
                    println!("deleted select field '{label}'");
                } else {
                    println!("no select field '{label}'");
                }
            }
            SelectCmd::List => {
                for label in engine.repository().get_select_labels()? {
                    let choices = engine.repository().get_choices(&label)?;
                    println!("{label}\t{}", choices.join(", "));
                }
            }
        },
        Cmd::Form { action } => match action {
            FormCmd::Delete { label } => {
                if engine.form_editor(session).delete_form(&label)? {
                    println!("deleted form '{label}'");
                } else {
                    println!("no form '{label}'");
                }
            }
            FormCmd::Template { label, out } => {
                let template = engine.repository().get_doc_form(&label)?;
                std::fs::write(&out, &template)?;
                println!("wrote {} bytes to {}", template.len(), out.display());
            }
        },
        Cmd::HealthCheck => {
            if engine.document_service_available() {
                println!("document service at {} is up", config.document_service.url);
            } else {
                println!("document service at {} is unreachable", config.document_service.url);
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
