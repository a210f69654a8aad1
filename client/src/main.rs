use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::CoordinatorStatus;
use reqwest::Client;
use std::{env, time::Duration};

/// Igual que en el worker:
/// - En Docker: MASTER_URL=http://master:8080
/// - Local: default http://localhost:8080
fn master_base_url() -> String {
    env::var("MASTER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para consultar el master")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Muestra la fase y el avance del job
    Status,
    /// Espera hasta que el job termine
    Wait {
        /// Segundos entre consultas
        #[arg(long, default_value_t = 1)]
        interval_secs: u64,
    },
}

async fn fetch_status(client: &Client, base_url: &str) -> Result<CoordinatorStatus> {
    let url = format!("{}/api/v1/status", base_url);
    let resp = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("no se pudo contactar al master en {}", url))?
        .error_for_status()?;
    Ok(resp.json().await?)
}

fn print_status(status: &CoordinatorStatus) {
    println!("Job:");
    println!("  fase: {:?}", status.phase);
    println!("  terminado: {}", status.done);
    println!(
        "  tareas: {} total, {} idle, {} en curso, {} completadas ({} en cola)",
        status.total_tasks,
        status.idle_tasks,
        status.in_progress_tasks,
        status.completed_tasks,
        status.queued_tasks
    );
    println!("  reencoladas por timeout: {}", status.requeued_tasks);
    println!("  inicio: {}", status.started_at);
    if let Some(fin) = status.finished_at {
        println!("  fin: {}", fin);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = master_base_url();

    match cli.command {
        Commands::Status => {
            let status = fetch_status(&client, &base_url).await?;
            print_status(&status);
        }
        Commands::Wait { interval_secs } => loop {
            let status = fetch_status(&client, &base_url).await?;
            if status.done {
                print_status(&status);
                break;
            }
            println!(
                "fase {:?}: {}/{} tareas completadas",
                status.phase, status.completed_tasks, status.total_tasks
            );
            tokio::time::sleep(Duration::from_secs(interval_secs.max(1))).await;
        },
    }

    Ok(())
}
