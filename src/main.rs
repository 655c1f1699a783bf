use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

mod logging;

use ragchat_cli::{
    ChatCommand, display_banner, handle_input_with_history, print_help, print_history,
    print_ingest_report, print_reply, print_sources, print_status, token_notice,
};
use ragchat_core::{AnswerMode, ChatSession, EmbeddingProvider, LLMProvider};
use ragchat_hf::{HuggingFaceClient, HuggingFaceConfig};
use ragchat_rag::{EmbeddingBackend, HashingEmbedder, Ingestor, QueryEngine, RagConfig};

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(about = "Chat with a PDF or text document", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding the vector index
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    /// Number of chunks retrieved per question
    #[arg(long, global = true)]
    top_k: Option<usize>,

    /// Embedding backend: local or huggingface
    #[arg(long, global = true, value_parser = parse_backend)]
    embeddings: Option<EmbeddingBackend>,

    /// Answer without retrieving from the document
    #[arg(long, global = true)]
    no_context: bool,

    /// Feed earlier turns back into the prompt
    #[arg(long, global = true)]
    memory: bool,

    /// Print answers as they are generated
    #[arg(long, global = true)]
    stream: bool,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a PDF or text file, replacing the current index
    Ingest { file: PathBuf },
    /// Ask a single question and exit
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Start an interactive chat (the default)
    Chat {
        /// Document to index before the first question
        file: Option<PathBuf>,
    },
}

fn parse_backend(s: &str) -> std::result::Result<EmbeddingBackend, String> {
    EmbeddingBackend::from_str(s).ok_or_else(|| format!("unknown embedding backend '{}'", s))
}

impl Cli {
    fn apply(&self, config: &mut RagConfig) {
        if let Some(dir) = &self.index_dir {
            config.index_dir = dir.clone();
        }
        if let Some(k) = self.top_k {
            config.top_k = k;
        }
        if let Some(backend) = self.embeddings {
            config.embedding_backend = backend;
        }
        if self.memory {
            config.memory = true;
        }
    }

    fn mode(&self) -> AnswerMode {
        if self.no_context {
            AnswerMode::WithoutContext
        } else {
            AnswerMode::WithContext
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = RagConfig::from_env()?;
    cli.apply(&mut config);
    config.validate()?;

    // Initialize providers
    let hf_config = HuggingFaceConfig::from_env()?;
    if let Some(notice) = token_notice(hf_config.has_token()) {
        println!("{}", notice.yellow());
    }
    let client = HuggingFaceClient::new(hf_config)?;
    let generation = client.config().generation_config();

    let embedder: Arc<dyn EmbeddingProvider> = match config.embedding_backend {
        EmbeddingBackend::Local => Arc::new(HashingEmbedder::new()),
        EmbeddingBackend::HuggingFace => Arc::new(client.embeddings()),
    };
    info!(
        embeddings = embedder.model_id(),
        generation = %generation.model_id,
        index_dir = %config.index_dir.display(),
        "providers ready"
    );
    let llm: Arc<dyn LLMProvider> = Arc::new(client);

    let ingestor = Ingestor::new(config.clone(), embedder.clone())?;
    let engine = QueryEngine::new(&config, embedder, llm).with_generation_config(generation);

    match cli.command {
        Some(Commands::Ingest { ref file }) => {
            match ingestor.ingest(file).await {
                Ok(report) => print_ingest_report(&report),
                Err(e) => {
                    eprintln!("{}", e.user_message().red());
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Ask { ref question }) => {
            let question = question.join(" ");
            ask_once(&engine, &question, cli.mode(), cli.stream).await?;
        }
        Some(Commands::Chat { ref file }) => {
            let mut session = new_session(&cli, &config, &ingestor);
            if let Some(file) = file {
                ingest_into_session(&ingestor, &mut session, file).await;
            }
            run_chat(&ingestor, &engine, &mut session, cli.stream, &config.index_dir).await?;
        }
        None => {
            let mut session = new_session(&cli, &config, &ingestor);
            run_chat(&ingestor, &engine, &mut session, cli.stream, &config.index_dir).await?;
        }
    }

    Ok(())
}

fn new_session(cli: &Cli, config: &RagConfig, ingestor: &Ingestor) -> ChatSession {
    let mut session = ChatSession::new(cli.mode(), config.memory);
    // An index left by an earlier run is usable straight away
    if ingestor.store().exists() {
        session.mark_indexed();
    }
    session
}

async fn ask_once(engine: &QueryEngine, question: &str, mode: AnswerMode, stream: bool) -> Result<()> {
    let result = if stream {
        let mut sink = |token: &str| {
            print!("{}", token);
            let _ = io::stdout().flush();
        };
        let answer = engine.answer_streaming(question, &[], mode, &mut sink).await;
        println!();
        answer
    } else {
        engine.answer(question, &[], mode).await
    };

    match result {
        Ok(answer) => {
            if !stream {
                println!("{}", answer.text);
            }
            print_sources(&answer.sources);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message().yellow());
            std::process::exit(1);
        }
    }
}

async fn ingest_into_session(ingestor: &Ingestor, session: &mut ChatSession, file: &Path) {
    println!("{} Indexing {}...", "📄".blue(), file.display());
    match ingestor.ingest_for(session, file).await {
        Ok(report) => print_ingest_report(&report),
        Err(e) => println!("{}", e.user_message().red()),
    }
}

async fn run_chat(
    ingestor: &Ingestor,
    engine: &QueryEngine,
    session: &mut ChatSession,
    stream: bool,
    index_dir: &Path,
) -> Result<()> {
    display_banner();

    let mut history = Vec::new();

    loop {
        let label = match session.mode() {
            AnswerMode::WithContext => "rag",
            AnswerMode::WithoutContext => "chat",
        };
        let Some(input) = handle_input_with_history(label, &mut history).await? else {
            println!("{}", "👋 Goodbye!".green());
            break;
        };

        match ChatCommand::parse(&input) {
            ChatCommand::Empty => continue,
            ChatCommand::Exit => {
                println!("{}", "👋 Goodbye!".green());
                break;
            }
            ChatCommand::Help => print_help(),
            ChatCommand::Ingest(path) => ingest_into_session(ingestor, session, &path).await,
            ChatCommand::SetMode(mode) => {
                session.set_mode(mode);
                println!("{} Answering {}", "✅".green(), mode);
            }
            ChatCommand::SetMemory(enabled) => {
                session.set_memory(enabled);
                println!(
                    "{} Conversation memory {}",
                    "✅".green(),
                    if enabled { "on" } else { "off" }
                );
            }
            ChatCommand::History => print_history(session.turns()),
            ChatCommand::Clear => {
                session.clear_history();
                println!("{} Conversation cleared", "✅".green());
            }
            ChatCommand::ResetIndex => match ingestor.clear_index(session) {
                Ok(true) => println!("{} Index removed", "✅".green()),
                Ok(false) => println!("{}", "No index to remove.".dimmed()),
                Err(e) => println!("{}", e.user_message().red()),
            },
            ChatCommand::Status => print_status(
                session,
                &index_dir.display().to_string(),
                ingestor.store().exists(),
            ),
            ChatCommand::Invalid(message) => println!("{} {}", "⚠️".yellow(), message),
            ChatCommand::Ask(question) => {
                if stream {
                    let mut sink = |token: &str| {
                        print!("{}", token);
                        let _ = io::stdout().flush();
                    };
                    let reply = engine.respond(session, &question, Some(&mut sink)).await;
                    if !reply.is_error {
                        println!();
                    }
                    print_reply(&reply, true);
                } else {
                    println!("{}", "🤔 Thinking...".dimmed());
                    let reply = engine.respond(session, &question, None).await;
                    print_reply(&reply, false);
                }
            }
        }
    }

    Ok(())
}
