//! Interactive command-line front end for the brandboard wizard.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use brandboard::config::GenerationConfig;
use brandboard::generation::HttpGenerationClient;
use brandboard::storage::{Identity, MemoryIdentity, MemoryStore};
use brandboard::wizard::{
    CompanyForm, ConfirmOptions, IdeaForm, WizardMode, WizardSession, WizardStage,
};

#[derive(Parser)]
#[command(name = "brandboard", about = "Guided brand marketingboard generation")]
struct Args {
    /// Run the grounded deep analysis after company validation
    #[arg(long)]
    deep_analysis: bool,

    /// Reference (URL or path) to a logo to analyze during validation
    #[arg(long)]
    logo: Option<String>,

    /// Identity used when saving the finished project
    #[arg(long, default_value = "local")]
    user: String,
}

fn ask(prompt: &str) -> Result<String> {
    print!("{}: ", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read input")?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = GenerationConfig::from_env()?;
    let client = Arc::new(HttpGenerationClient::new(config));
    let session = WizardSession::new(client);

    session.begin()?;
    loop {
        if let Some(message) = session.last_error() {
            println!("\n{}", message);
        }
        let mode = loop {
            match ask("Modo (1 = empresa existente, 2 = nova ideia)")?.as_str() {
                "1" => break WizardMode::ExistingCompany,
                "2" => break WizardMode::NewIdea,
                _ => println!("Escolha 1 ou 2."),
            }
        };
        session.choose_mode(mode)?;

        let outcome = match mode {
            WizardMode::ExistingCompany => {
                let form = CompanyForm {
                    name: ask("Nome da empresa")?,
                    city: ask("Cidade")?,
                };
                session.submit_company_form(form).await
            }
            WizardMode::NewIdea => {
                let form = IdeaForm {
                    name: ask("Nome do negócio")?,
                    description: ask("Descreva a ideia")?,
                    target_audience: ask("Público-alvo")?,
                };
                session.submit_idea_form(form).await
            }
        };
        if let Err(e) = outcome {
            tracing::warn!(error = %e, "validation attempt failed");
            continue;
        }

        if session.stage() == WizardStage::SelectingCandidate {
            println!("\nEncontrei mais de uma correspondência:");
            for candidate in session.candidates() {
                println!(
                    "  [{}] {} — {}",
                    candidate.id, candidate.company_name, candidate.address
                );
            }
            let id = ask("Qual delas? (id)")?;
            if let Err(e) = session.select_candidate(&id).await {
                tracing::warn!(error = %e, "candidate selection failed");
                continue;
            }
        }

        if confirm_flow(&session, &args).await.is_ok() {
            break;
        }
    }

    review_loop(&session).await?;
    final_display(&session, &args).await
}

/// Review the validated identity (or generated concept) and launch part
/// generation.
async fn confirm_flow(session: &WizardSession, args: &Args) -> Result<(), ()> {
    let stage = session.stage();
    if let Some(validation) = session.validation() {
        println!("\n=== {} ===", validation.company_name);
        if !validation.description.is_empty() {
            println!("{}", validation.description);
        }
        if !validation.address.is_empty() {
            println!("Endereço: {}", validation.address);
        }
    }

    let result = match stage {
        WizardStage::ConfirmValidation => {
            session
                .confirm_validation(ConfirmOptions {
                    run_deep_analysis: args.deep_analysis,
                    logo_reference: args.logo.clone(),
                })
                .await
        }
        WizardStage::ConfirmConcept => session.confirm_concept().await,
        _ => return Err(()),
    };
    if let Err(e) = result {
        tracing::warn!(error = %e, "confirmation failed");
        return Err(());
    }

    if session.stage() == WizardStage::ConfirmAnalysis {
        if let Some(validation) = session.validation() {
            if let Some(analysis) = validation.deep_analysis {
                println!("\n=== Análise aprofundada ===\n{}", analysis.text);
                for source in &analysis.sources {
                    println!("  fonte: {} ({})", source.title, source.uri);
                }
            }
        }
        if let Err(e) = session.confirm_analysis().await {
            tracing::warn!(error = %e, "analysis confirmation failed");
            return Err(());
        }
    }
    Ok(())
}

/// Per-part approval loop: approve, comment, regenerate or edit topics
/// until each part is confirmed.
async fn review_loop(session: &WizardSession) -> Result<()> {
    while session.stage() == WizardStage::ConfirmStep {
        let Some((kind, data)) = session.current_part() else {
            break;
        };
        println!("\n=== Parte {}: {} ===", kind.number(), kind.title());
        for topic in kind.topics() {
            if let Some(value) = data.get(topic.key) {
                println!("\n[{}] {}\n{}", topic.key, topic.label, render(value));
            }
        }
        println!(
            "\nComandos: a <campo> aprovar | A aprovar tudo | c <campo> <texto> comentar | \
             r <campo> regenerar | v voltar | ok confirmar"
        );

        let line = ask(">")?;
        let mut words = line.splitn(3, ' ');
        let result = match (words.next(), words.next(), words.next()) {
            (Some("a"), Some(key), _) => session.approve(key).map(|_| ()),
            (Some("A"), ..) => session.approve_all(),
            (Some("c"), Some(key), Some(text)) => session.set_comment(key, text),
            (Some("r"), Some(key), _) => session.regenerate(key).await,
            (Some("v"), ..) => session.go_back(),
            (Some("ok"), ..) => session.confirm_part().await,
            _ => {
                println!("Comando não reconhecido.");
                Ok(())
            }
        };
        if let Err(e) = result {
            println!("{}", e);
        }
    }
    Ok(())
}

async fn final_display(session: &WizardSession, args: &Args) -> Result<()> {
    println!("\n=== Marketingboard final ===");
    let store = MemoryStore::new();
    let identity = MemoryIdentity::signed_in(Identity {
        user_id: args.user.clone(),
        display_name: args.user.clone(),
    });
    let project = session.save_project(&identity, &store).await?;
    println!("{}", serde_json::to_string_pretty(&project.brandboard_data)?);
    println!("\nProjeto salvo como {} em {}", project.id, project.created_at);
    Ok(())
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
