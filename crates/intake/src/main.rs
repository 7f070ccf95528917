//! Interactive project intake in the terminal.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use intake::core::{AgentRegistry, AnalyzerBuilder, Error, ModelClient};
use intake::{Interview, QuestionStyle, ROUNDS, default_panel, specialist_panel};
use intake_model::ModelMessage;
use intake_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};

const BAR_CHAR: &str = "▎";
const RULE: &str = "==================================================";

#[derive(Parser)]
#[command(name = "intake", version, about = "Turns a short project description into a complete brief")]
struct Cli {
    /// Model to ask.
    #[arg(long, global = true, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Base URL of the chat-completion API.
    #[arg(long, global = true, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// Sampling temperature.
    #[arg(long, global = true, default_value_t = 0.7)]
    temperature: f32,

    /// Seconds to wait for each completion.
    #[arg(long, global = true, default_value_t = 60)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Asks follow-up questions about a summary, then summarizes (default).
    Interview {
        /// Show questions exactly as the model wrote them.
        #[arg(long)]
        raw_questions: bool,
    },
    /// Lets a panel of agents question one project description.
    Panel {
        /// Use the UI/UX, backend, security and data panel.
        #[arg(long)]
        specialists: bool,
    },
    /// Sends a single greeting to check credentials and connectivity.
    Ping,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match OpenAIConfigBuilder::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }
    let config = config.build();
    debug!("using {config:?}");

    let model_client = ModelClient::new(OpenAIProvider::new(config))
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let mut input = Input::new();

    match cli.command.unwrap_or(Command::Interview {
        raw_questions: false,
    }) {
        Command::Interview { raw_questions } => {
            let style = if raw_questions {
                QuestionStyle::Raw
            } else {
                QuestionStyle::Normalized
            };
            let analyzer = AnalyzerBuilder::with_model_client(model_client)
                .with_temperature(cli.temperature)
                .build();
            run_interview(Interview::new(analyzer, style), &mut input).await;
            ExitCode::SUCCESS
        }
        Command::Panel { specialists } => {
            let panel = if specialists {
                specialist_panel(model_client, Some(cli.temperature))
            } else {
                default_panel(model_client, Some(cli.temperature))
            };
            match panel {
                Ok(registry) => {
                    run_panel(&registry, &mut input).await;
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("{err}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Ping => ping(&model_client).await,
    }
}

async fn run_interview(mut interview: Interview, input: &mut Input) {
    println!("Welcome to the project intake assistant!");
    println!(
        "Enter your initial summary and I'll ask follow-up questions one by one."
    );
    println!("Type 'quit' to exit or 'reset' to start a new conversation.");

    loop {
        let Some(line) = input
            .prompt("\nEnter your summary (or 'quit'/'reset'): ")
            .await
        else {
            break;
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") {
            println!("\nGoodbye!");
            break;
        }
        if line.eq_ignore_ascii_case("reset") {
            interview.reset();
            println!("\nConversation reset. Starting fresh!");
            continue;
        }
        if line.is_empty() {
            println!("Please enter a summary or use 'quit' to exit.");
            continue;
        }

        let mut question = match spin(interview.start(line)).await {
            Ok(result) => {
                print_analysis(&result.analysis);
                result.follow_up_question
            }
            Err(err) => {
                print_failure(&err);
                print_analysis("");
                String::new()
            }
        };

        if question.is_empty() {
            println!(
                "No follow-up question to ask, please enter a new summary."
            );
            continue;
        }

        for round in 1..=ROUNDS {
            println!("\n{}", format!("Follow-up Question {round}:").bold());
            println!("{}", question.bright_white());

            let Some(answer) = input.prompt("\nYour answer: ").await else {
                return;
            };
            match spin(interview.answer(&question, &answer)).await {
                Ok(Some(result)) => question = result.follow_up_question,
                Ok(None) => println!("Skipping empty answer..."),
                Err(err) => print_failure(&err),
            }
        }

        println!("\nGenerating final updated summary...");
        match spin(interview.summarize()).await {
            Ok(summary) => {
                println!("\n{}", "UPDATED SUMMARY:".bold());
                println!("{RULE}");
                println!("{summary}");
                println!("{RULE}");
            }
            Err(err) => print_failure(&err),
        }

        let count = interview.analyzer().transcript().len();
        println!("\nMessages in conversation: {count}");
    }
}

async fn run_panel(registry: &AgentRegistry, input: &mut Input) {
    let Some(description) = input.prompt("Describe your project: ").await
    else {
        return;
    };

    println!("\n=== Getting questions from different agents ===");
    for name in registry.agent_names() {
        println!("\n--- {} ---", title(&name).bright_cyan());
        let result = spin(registry.analyze_with(&name, &description, false));
        print_turn(result.await);
    }

    let Some(response) = input.prompt("\nYour response: ").await else {
        return;
    };

    println!("\n=== Getting follow-up questions from different agents ===");
    for name in registry.agent_names() {
        println!("\n--- {} ---", title(&name).bright_cyan());
        let result = spin(registry.analyze_with(&name, &response, false));
        print_turn(result.await);
    }

    println!("\n=== Final Summaries from Each Agent ===");
    for name in registry.agent_names() {
        println!("\n--- {} Summary ---", title(&name).bright_cyan());
        match spin(registry.analyze_with(&name, &response, true)).await {
            Ok(result) => println!("{}", result.analysis),
            Err(err) => print_failure(&err),
        }
    }

    println!("\n=== Using All Agents at Once ===");
    for (name, result) in spin(registry.analyze_with_all(&response, false)).await
    {
        println!("\n--- {} ---", title(&name).bright_cyan());
        match result {
            Ok(result) => println!("Question: {}", result.follow_up_question),
            Err(err) => print_failure(&err),
        }
    }

    println!(
        "\nMessages in conversation: {}",
        registry.transcript().len()
    );
}

async fn ping(model_client: &ModelClient) -> ExitCode {
    let messages = vec![ModelMessage::User("Hello!".to_owned())];
    match spin(model_client.complete(messages, None)).await {
        Ok(reply) => {
            println!("API call successful!");
            println!("Response: {reply}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("{}", "Error occurred:".bright_red());
            println!("{err}");
            if let Some(status) = err.status() {
                println!("Status: {status}");
            }
            if let Some(body) = err.body() {
                println!("Body: {body}");
            }
            ExitCode::FAILURE
        }
    }
}

fn print_analysis(analysis: &str) {
    println!("\n{RULE}");
    println!("{}", "Analysis:".bold());
    println!("{analysis}");
    println!("{RULE}");
}

fn print_turn(result: Result<intake::core::AnalysisResult, Error>) {
    match result {
        Ok(result) => {
            println!("Analysis: {}", result.analysis);
            println!("Question: {}", result.follow_up_question.bright_white());
        }
        Err(err) => print_failure(&err),
    }
}

fn print_failure(err: &Error) {
    println!(
        "{}{}",
        BAR_CHAR.bright_yellow(),
        format!("⚠️  Request failed: {err}").yellow()
    );
}

/// Runs `fut` behind a spinner.
async fn spin<F: Future>(fut: F) -> F::Output {
    let progress_bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {wide_msg}") {
        progress_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    progress_bar.set_message("🤔 Thinking...");
    progress_bar.enable_steady_tick(Duration::from_millis(100));

    let output = fut.await;
    progress_bar.finish_and_clear();
    output
}

/// `project_analyst` -> `Project Analyst`.
fn title(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    fn new() -> Self {
        Self {
            lines: BufReader::new(io::stdin()).lines(),
        }
    }

    async fn prompt(&mut self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        std::io::stdout().flush().ok();

        match self.lines.next_line().await {
            Ok(line) => line,
            Err(err) => {
                error!("error reading input: {}", err);
                None
            }
        }
    }
}
