//! Console adapter: drives a form session over stdin/stdout.
//!
//! Usage: `console [schema-file]` (defaults to the bundled accident
//! report). Answers are read a line at a time; type "change answer" at
//! any prompt to revise a previous reply.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use formwalk::schema::QuestionGraph;
use formwalk::session::{Session, SubmitOutcome};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("schemas/accident_report.json"));

    let graph = QuestionGraph::from_file(&path)
        .with_context(|| format!("loading form schema from {}", path.display()))?;

    println!("=== {} ===", graph.title());
    println!("Answer each question in turn. Type \"change answer\" to revise a previous reply.\n");

    let mut session = Session::new(graph);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    if let Some(prompt) = session.current_prompt() {
        println!("{}\n", prompt.render());
    }

    for line in stdin.lock().lines() {
        let line = line.context("reading from stdin")?;
        match session.submit_answer(&line) {
            Ok(SubmitOutcome::Accepted { prompt }) => {
                println!("\n{}\n", prompt.render());
            }
            Ok(SubmitOutcome::Retry { error, prompt }) => {
                println!("\nSorry, {}\n", error);
                println!("{}\n", prompt.render());
            }
            Ok(SubmitOutcome::EditMenu { menu }) => {
                println!("\n{}\n", menu.render());
            }
            Ok(SubmitOutcome::Complete { form }) => {
                println!("\nAll done. Here is your completed report:\n");
                println!("{}", serde_json::to_string_pretty(&form.to_json())?);
                println!("\nType \"change answer\" to revise anything, or press Ctrl-D to exit.");
            }
            Err(e) => {
                println!("\n{}", e);
            }
        }
        stdout.flush().context("flushing stdout")?;
    }

    Ok(())
}
